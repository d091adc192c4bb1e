use crate::model::{AggregateEntity, ChildEntity, CompositeKey, FieldValue, FlatRow};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FoldError {
    #[error("row {row} is missing field '{field}' required by the fold spec")]
    SchemaMismatch { row: usize, field: String },
}

/// One repeating child branch of a join fan-out: where its key lives in the
/// row, and which row fields make up the child payload.
#[derive(Debug, Clone)]
pub struct ChildGroupSpec {
    pub name: String,
    pub key: Vec<String>,
    pub fields: Vec<String>,
}

impl ChildGroupSpec {
    pub fn new(name: &str, key: &[&str], fields: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            key: key.iter().map(ToString::to_string).collect(),
            fields: fields.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Per-operation folding descriptor: parent key and payload fields, any
/// number of independently deduplicated child groups, and an optional
/// distinct-accumulation field.
///
/// A spec is built fresh for each invocation; the folder keeps no state
/// between calls.
#[derive(Debug, Clone)]
pub struct FoldKeySpec {
    pub parent_key: Vec<String>,
    pub parent_fields: Vec<String>,
    pub children: Vec<ChildGroupSpec>,
    pub distinct_collect: Option<String>,
}

impl FoldKeySpec {
    pub fn new(parent_key: &[&str], parent_fields: &[&str]) -> Self {
        Self {
            parent_key: parent_key.iter().map(ToString::to_string).collect(),
            parent_fields: parent_fields.iter().map(ToString::to_string).collect(),
            children: Vec::new(),
            distinct_collect: None,
        }
    }

    #[must_use]
    pub fn child_group(mut self, name: &str, key: &[&str], fields: &[&str]) -> Self {
        self.children.push(ChildGroupSpec::new(name, key, fields));
        self
    }

    #[must_use]
    pub fn distinct_collect(mut self, field: &str) -> Self {
        self.distinct_collect = Some(field.to_string());
        self
    }
}

/// Accumulator for one parent while its rows are still arriving.
struct InProgress {
    fields: BTreeMap<String, FieldValue>,
    groups: Vec<Vec<ChildEntity>>,
    seen_child_keys: Vec<HashSet<CompositeKey>>,
    distinct: BTreeSet<FieldValue>,
}

impl InProgress {
    fn new(spec: &FoldKeySpec) -> Self {
        Self {
            fields: BTreeMap::new(),
            groups: spec.children.iter().map(|_| Vec::new()).collect(),
            seen_child_keys: spec.children.iter().map(|_| HashSet::new()).collect(),
            distinct: BTreeSet::new(),
        }
    }

    fn finalize(self, spec: &FoldKeySpec) -> AggregateEntity {
        let children = spec
            .children
            .iter()
            .map(|group| group.name.clone())
            .zip(self.groups)
            .collect();

        AggregateEntity {
            fields: self.fields,
            children,
            // A set during accumulation; a deterministically sorted list once
            // the entity is frozen.
            distinct_values: spec
                .distinct_collect
                .as_ref()
                .map(|_| self.distinct.into_iter().collect()),
        }
    }
}

/// The denormalized result-folding engine.
///
/// A single forward pass over the row stream groups rows by parent key in
/// first-seen order and deduplicates each declared child group by its child
/// key, also in first-seen order. Grouping is key-based, not
/// contiguity-based, so a parent whose rows arrive in interleaved batches
/// still folds into one entity. Amortized O(n): hash lookups for parents and
/// per-parent-per-group seen-key sets.
pub struct ResultFolder;

impl ResultFolder {
    pub fn fold(
        rows: impl IntoIterator<Item = FlatRow>,
        spec: &FoldKeySpec,
    ) -> Result<Vec<AggregateEntity>, FoldError> {
        let mut first_seen: Vec<CompositeKey> = Vec::new();
        let mut parents: HashMap<CompositeKey, InProgress> = HashMap::new();

        for (row_index, row) in rows.into_iter().enumerate() {
            let parent_key = Self::key_of(&row, row_index, &spec.parent_key)?;

            let parent = match parents.entry(parent_key) {
                Entry::Occupied(occupied) => occupied.into_mut(),
                Entry::Vacant(vacant) => {
                    first_seen.push(vacant.key().clone());
                    vacant.insert(InProgress::new(spec))
                }
            };

            for field in &spec.parent_fields {
                let value = Self::require(&row, row_index, field)?;
                match parent.fields.get(field) {
                    None => {
                        parent.fields.insert(field.clone(), value.clone());
                    }
                    // A first-seen row can carry nulls in parent fields when
                    // an outer-joined branch was absent; a later non-null
                    // value backfills them. Non-null values are never
                    // overwritten.
                    Some(FieldValue::Null) if !value.is_null() => {
                        parent.fields.insert(field.clone(), value.clone());
                    }
                    Some(_) => {}
                }
            }

            for (group_index, group) in spec.children.iter().enumerate() {
                let child_key = Self::key_of(&row, row_index, &group.key)?;

                let mut child_fields = BTreeMap::new();
                for field in &group.fields {
                    let value = Self::require(&row, row_index, field)?;
                    child_fields.insert(field.clone(), value.clone());
                }

                // An all-null key means this join branch matched nothing for
                // the row; it must not become a phantom child.
                if child_key.is_null() {
                    continue;
                }

                if parent.seen_child_keys[group_index].insert(child_key) {
                    parent.groups[group_index].push(ChildEntity {
                        fields: child_fields,
                    });
                }
            }

            if let Some(field) = &spec.distinct_collect {
                match Self::require(&row, row_index, field)? {
                    FieldValue::Null => {}
                    // A collection-typed cell contributes its elements, the
                    // way an unnested array column does.
                    FieldValue::List(items) => {
                        for item in items {
                            if !item.is_null() {
                                parent.distinct.insert(item.clone());
                            }
                        }
                    }
                    value => {
                        parent.distinct.insert(value.clone());
                    }
                }
            }
        }

        let mut entities = Vec::with_capacity(first_seen.len());
        for key in first_seen {
            if let Some(parent) = parents.remove(&key) {
                entities.push(parent.finalize(spec));
            }
        }
        Ok(entities)
    }

    fn key_of(
        row: &FlatRow,
        row_index: usize,
        fields: &[String],
    ) -> Result<CompositeKey, FoldError> {
        let mut parts = Vec::with_capacity(fields.len());
        for field in fields {
            parts.push(Self::require(row, row_index, field)?.clone());
        }
        Ok(CompositeKey::new(parts))
    }

    fn require<'a>(
        row: &'a FlatRow,
        row_index: usize,
        field: &str,
    ) -> Result<&'a FieldValue, FoldError> {
        row.get(field).ok_or_else(|| FoldError::SchemaMismatch {
            row: row_index,
            field: field.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with_one_group() -> FoldKeySpec {
        FoldKeySpec::new(&["parent_id"], &["parent_id", "parent_name"]).child_group(
            "items",
            &["item_id"],
            &["item_id", "item_label"],
        )
    }

    fn row(parent: i64, name: &str, item: Option<i64>, label: Option<&str>) -> FlatRow {
        FlatRow::new()
            .set("parent_id", parent)
            .set("parent_name", name)
            .set("item_id", item)
            .set("item_label", label.map(ToString::to_string))
    }

    #[test]
    fn deduplicates_children_in_first_seen_order() {
        let rows = vec![
            row(1, "p1", Some(10), Some("c1")),
            row(1, "p1", Some(20), Some("c2")),
            row(1, "p1", Some(10), Some("c1")),
        ];

        let folded = ResultFolder::fold(rows, &spec_with_one_group()).unwrap();
        assert_eq!(folded.len(), 1);

        let items = folded[0].group("items");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].field("item_id"), Some(&FieldValue::Int(10)));
        assert_eq!(items[1].field("item_id"), Some(&FieldValue::Int(20)));
    }

    #[test]
    fn parents_emerge_in_first_seen_order_even_when_interleaved() {
        let rows = vec![
            row(2, "p2", Some(10), Some("a")),
            row(1, "p1", Some(11), Some("b")),
            row(2, "p2", Some(12), Some("c")),
            row(1, "p1", Some(13), Some("d")),
        ];

        let folded = ResultFolder::fold(rows, &spec_with_one_group()).unwrap();
        let ids: Vec<_> = folded
            .iter()
            .map(|entity| entity.field("parent_id").cloned())
            .collect();
        assert_eq!(
            ids,
            vec![Some(FieldValue::Int(2)), Some(FieldValue::Int(1))]
        );
        assert_eq!(folded[0].group("items").len(), 2);
        assert_eq!(folded[1].group("items").len(), 2);
    }

    #[test]
    fn folding_is_deterministic() {
        let rows = || {
            vec![
                row(1, "p1", Some(10), Some("c1")),
                row(2, "p2", Some(10), Some("c1")),
                row(1, "p1", Some(20), Some("c2")),
            ]
        };
        let spec = spec_with_one_group();

        let first = ResultFolder::fold(rows(), &spec).unwrap();
        let second = ResultFolder::fold(rows(), &spec).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn independent_groups_deduplicate_separately() {
        let spec = FoldKeySpec::new(&["parent_id"], &["parent_id"])
            .child_group("a", &["a_id"], &["a_id"])
            .child_group("b", &["b_id"], &["b_id"]);

        // Group A and group B rows interleave; each row carries one branch.
        let rows = vec![
            FlatRow::new()
                .set("parent_id", 1_i64)
                .set("a_id", 10_i64)
                .set("b_id", FieldValue::Null),
            FlatRow::new()
                .set("parent_id", 1_i64)
                .set("a_id", FieldValue::Null)
                .set("b_id", 10_i64),
            FlatRow::new()
                .set("parent_id", 1_i64)
                .set("a_id", 11_i64)
                .set("b_id", FieldValue::Null),
            FlatRow::new()
                .set("parent_id", 1_i64)
                .set("a_id", 10_i64)
                .set("b_id", 11_i64),
        ];

        let folded = ResultFolder::fold(rows, &spec).unwrap();
        assert_eq!(folded.len(), 1);

        let a_ids: Vec<_> = folded[0]
            .group("a")
            .iter()
            .map(|child| child.field("a_id").cloned())
            .collect();
        let b_ids: Vec<_> = folded[0]
            .group("b")
            .iter()
            .map(|child| child.field("b_id").cloned())
            .collect();
        assert_eq!(
            a_ids,
            vec![Some(FieldValue::Int(10)), Some(FieldValue::Int(11))]
        );
        assert_eq!(
            b_ids,
            vec![Some(FieldValue::Int(10)), Some(FieldValue::Int(11))]
        );
    }

    #[test]
    fn distinct_collect_is_sorted_and_deduplicated() {
        let spec = FoldKeySpec::new(&["parent_id"], &["parent_id"])
            .child_group("items", &["item_id"], &["item_id"])
            .distinct_collect("tag");

        let tags = ["x", "y", "x", "z"];
        let rows: Vec<_> = tags
            .iter()
            .enumerate()
            .map(|(i, tag)| {
                FlatRow::new()
                    .set("parent_id", 1_i64)
                    .set("item_id", i as i64)
                    .set("tag", *tag)
            })
            .collect();

        let folded = ResultFolder::fold(rows, &spec).unwrap();
        assert_eq!(
            folded[0].distinct_values,
            Some(vec![
                FieldValue::Text("x".into()),
                FieldValue::Text("y".into()),
                FieldValue::Text("z".into()),
            ])
        );
    }

    #[test]
    fn distinct_collect_unnests_list_values_and_sees_redundant_rows() {
        let spec = FoldKeySpec::new(&["parent_id"], &["parent_id"])
            .child_group("items", &["item_id"], &["item_id"])
            .distinct_collect("tags");

        // The second row repeats item 10 (dropped by the group dedup) but
        // still contributes a new tag.
        let rows = vec![
            FlatRow::new()
                .set("parent_id", 1_i64)
                .set("item_id", 10_i64)
                .set("tags", vec!["b".to_string(), "a".to_string()]),
            FlatRow::new()
                .set("parent_id", 1_i64)
                .set("item_id", 10_i64)
                .set("tags", vec!["c".to_string(), "a".to_string()]),
        ];

        let folded = ResultFolder::fold(rows, &spec).unwrap();
        assert_eq!(folded[0].group("items").len(), 1);
        assert_eq!(
            folded[0].distinct_values,
            Some(vec![
                FieldValue::Text("a".into()),
                FieldValue::Text("b".into()),
                FieldValue::Text("c".into()),
            ])
        );
    }

    #[test]
    fn empty_stream_folds_to_empty_output() {
        let folded = ResultFolder::fold(Vec::new(), &spec_with_one_group()).unwrap();
        assert!(folded.is_empty());
    }

    #[test]
    fn null_child_branch_adds_no_phantom_child() {
        let rows = vec![row(1, "p1", None, None)];

        let folded = ResultFolder::fold(rows, &spec_with_one_group()).unwrap();
        assert_eq!(folded.len(), 1);
        assert!(folded[0].group("items").is_empty());
        assert_eq!(
            folded[0].field("parent_name"),
            Some(&FieldValue::Text("p1".into()))
        );
    }

    #[test]
    fn missing_declared_field_is_a_schema_mismatch() {
        let rows = vec![
            row(1, "p1", Some(10), Some("c1")),
            FlatRow::new().set("parent_id", 1_i64).set("parent_name", "p1"),
        ];

        let err = ResultFolder::fold(rows, &spec_with_one_group()).unwrap_err();
        assert_eq!(
            err,
            FoldError::SchemaMismatch {
                row: 1,
                field: "item_id".to_string(),
            }
        );
    }

    #[test]
    fn later_non_null_values_backfill_null_parent_fields() {
        let rows = vec![
            FlatRow::new()
                .set("parent_id", 1_i64)
                .set("parent_name", FieldValue::Null)
                .set("item_id", FieldValue::Null)
                .set("item_label", FieldValue::Null),
            row(1, "p1", Some(10), Some("c1")),
            row(1, "other-name-ignored", Some(11), Some("c2")),
        ];

        let folded = ResultFolder::fold(rows, &spec_with_one_group()).unwrap();
        assert_eq!(
            folded[0].field("parent_name"),
            Some(&FieldValue::Text("p1".into()))
        );
    }
}
