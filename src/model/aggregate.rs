use crate::model::FieldValue;
use serde::Serialize;
use std::collections::BTreeMap;

/// One deduplicated child record inside a child group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildEntity {
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl ChildEntity {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// A folded parent: its own fields, one ordered deduplicated list per child
/// group, and the optional sorted distinct-value list.
///
/// Entities are built incrementally during the folding pass and finalized
/// only once the row stream is exhausted; the emitted vector carries them in
/// parent first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateEntity {
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(flatten)]
    pub children: BTreeMap<String, Vec<ChildEntity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distinct_values: Option<Vec<FieldValue>>,
}

impl AggregateEntity {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Children of a declared group, empty for a group no row populated.
    pub fn group(&self, name: &str) -> &[ChildEntity] {
        self.children.get(name).map_or(&[], Vec::as_slice)
    }
}
