use crate::model::FieldValue;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::HashMap;

/// One flat tuple from a join/unnest query: named positional fields holding
/// fully resolved scalars and collections.
///
/// A row has no identity beyond its position in the stream and lives only for
/// the duration of one folding pass. A field that is absent from the row is a
/// different thing than a field present with a null value: the former is a
/// contract violation the folder reports, the latter models an outer-join
/// branch that matched nothing.
#[derive(Debug, Clone, Default)]
pub struct FlatRow {
    fields: HashMap<String, FieldValue>,
}

impl FlatRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field assignment, used by row sources and tests.
    #[must_use]
    pub fn set(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}

/// Read-only projection of the entity reachable through a reference field,
/// with resolution already performed by the store collaborator.
///
/// The folder never sees resolution mechanics: a view either carries the
/// target entity's scalar/collection fields in full, or the collaborator
/// skips the branch entirely (null fields). Partially resolved views do not
/// exist.
#[derive(Debug, Clone)]
pub struct ReferenceView {
    fields: Vec<(String, FieldValue)>,
}

impl ReferenceView {
    /// Project a resolved entity into flat-row fields under the entity's own
    /// field names. Nested objects are not projected; the collaborator
    /// dereferences those through their own views.
    pub fn of<T: Serialize>(entity: &T) -> Result<Self> {
        let value = serde_json::to_value(entity)?;
        let object = value
            .as_object()
            .ok_or_else(|| anyhow!("reference target did not resolve to an object"))?;

        let fields = object
            .iter()
            .filter_map(|(name, value)| {
                FieldValue::from_json(value).map(|field| (name.clone(), field))
            })
            .collect();

        Ok(Self { fields })
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Flatten the dereferenced fields into a row, the way DEREF columns land
    /// in a join result.
    #[must_use]
    pub fn splice_into(&self, mut row: FlatRow) -> FlatRow {
        for (name, value) in &self.fields {
            row = row.set(name.clone(), value.clone());
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Target {
        target_id: i64,
        target_name: String,
        target_tags: Vec<String>,
    }

    #[test]
    fn projects_scalars_and_collections_of_a_resolved_entity() {
        let view = ReferenceView::of(&Target {
            target_id: 7,
            target_name: "liver".into(),
            target_tags: vec!["vital".into()],
        })
        .unwrap();

        assert_eq!(view.field("target_id"), Some(&FieldValue::Int(7)));

        let row = view.splice_into(FlatRow::new().set("row_marker", 1_i64));
        assert_eq!(row.get("row_marker"), Some(&FieldValue::Int(1)));
        assert_eq!(row.get("target_name"), Some(&FieldValue::Text("liver".into())));
        assert_eq!(
            row.get("target_tags"),
            Some(&FieldValue::List(vec![FieldValue::Text("vital".into())]))
        );
    }

    #[test]
    fn absent_field_differs_from_null_field() {
        let row = FlatRow::new().set("present", FieldValue::Null);
        assert!(row.contains("present"));
        assert_eq!(row.get("present"), Some(&FieldValue::Null));
        assert_eq!(row.get("missing"), None);
    }
}
