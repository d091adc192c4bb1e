use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Sequence-allocated integer identifier, shared by every entity table.
pub type Id = i64;

/// A single resolved cell of a flat result row.
///
/// Reference-typed columns are dereferenced by the row source before they
/// reach the folding engine, so a `FieldValue` is always a plain scalar or an
/// already-materialized list of scalars.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Map a JSON value onto the row value space. Nested objects have no
    /// flat-row representation; the row source dereferences those separately.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(Self::Null),
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Int(i))
                } else {
                    n.as_f64().map(Self::Float)
                }
            }
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Option<Vec<_>>>()
                .map(Self::List),
            serde_json::Value::Object(_) => None,
        }
    }

    // Variant rank used by the total order; keep in sync with the enum.
    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) => 2,
            Self::Float(_) => 3,
            Self::Text(_) => 4,
            Self::Date(_) => 5,
            Self::List(_) => 6,
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            // Compare by bit pattern so the value is usable as a hash key
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for FieldValue {}

impl Hash for FieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::Text(s) => s.hash(state),
            Self::Date(d) => d.hash(state),
            Self::List(items) => items.hash(state),
        }
    }
}

impl Ord for FieldValue {
    /// Deterministic total order: variant rank first, then value. Distinct
    /// sets are sorted with this order at finalization so output never
    /// depends on row arrival order.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a
                .partial_cmp(b)
                .unwrap_or_else(|| a.to_bits().cmp(&b.to_bits())),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for FieldValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items.into_iter().map(Self::Text).collect())
    }
}

/// Ordered tuple of field values acting as a parent or child grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey(Vec<FieldValue>);

impl CompositeKey {
    pub fn new(parts: Vec<FieldValue>) -> Self {
        Self(parts)
    }

    /// True when every component is null, i.e. the joined branch this key
    /// comes from was absent for the row.
    pub fn is_null(&self) -> bool {
        self.0.iter().all(FieldValue::is_null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_values_are_usable_as_keys() {
        let a = FieldValue::Float(1.25);
        let b = FieldValue::Float(1.25);
        assert_eq!(a, b);

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn total_order_is_deterministic_across_variants() {
        let mut values = vec![
            FieldValue::Text("b".into()),
            FieldValue::Int(2),
            FieldValue::Null,
            FieldValue::Text("a".into()),
            FieldValue::Int(1),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                FieldValue::Null,
                FieldValue::Int(1),
                FieldValue::Int(2),
                FieldValue::Text("a".into()),
                FieldValue::Text("b".into()),
            ]
        );
    }

    #[test]
    fn composite_key_null_detection() {
        let null_key = CompositeKey::new(vec![FieldValue::Null, FieldValue::Null]);
        assert!(null_key.is_null());

        let mixed = CompositeKey::new(vec![FieldValue::Null, FieldValue::Int(3)]);
        assert!(!mixed.is_null());
    }

    #[test]
    fn json_mapping_covers_scalars_and_lists() {
        assert_eq!(
            FieldValue::from_json(&serde_json::json!(42)),
            Some(FieldValue::Int(42))
        );
        assert_eq!(
            FieldValue::from_json(&serde_json::json!(["a", "b"])),
            Some(FieldValue::List(vec![
                FieldValue::Text("a".into()),
                FieldValue::Text("b".into()),
            ]))
        );
        assert_eq!(FieldValue::from_json(&serde_json::json!({"x": 1})), None);
    }
}
