use serde::{Deserialize, Serialize};
use thiserror::Error;

/// VARRAY bound on allergy lists: at most 50 entries.
pub const ALLERGY_MAX_ITEMS: usize = 50;
/// VARRAY bound on allergy lists: at most 200 characters per entry.
pub const ALLERGY_MAX_ITEM_LENGTH: usize = 200;

/// The collection shape used by drug allergy lists throughout the system.
pub type AllergyList = BoundedCollection<String, ALLERGY_MAX_ITEMS, ALLERGY_MAX_ITEM_LENGTH>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    #[error("collection has {len} items, at most {max} are allowed")]
    CardinalityExceeded { len: usize, max: usize },
    #[error("item at index {index} is {len} characters long, at most {max} are allowed")]
    ItemTooLong { index: usize, len: usize, max: usize },
}

/// Per-item size measurement for bounded collections.
///
/// Items without a meaningful length (numbers, dates) stay unmeasured and
/// never fail the length check.
pub trait BoundedItem {
    fn bounded_len(&self) -> Option<usize> {
        None
    }
}

impl BoundedItem for String {
    fn bounded_len(&self) -> Option<usize> {
        Some(self.chars().count())
    }
}

impl BoundedItem for i64 {}
impl BoundedItem for f64 {}

/// Fixed-capacity, fixed-item-length collection backing store-side array
/// columns.
///
/// Constructed from the external unbounded list at the moment a write is
/// prepared, and reconstructed fresh from store output on every read. There
/// is no mutation API; any change goes through a new `new` call so the bounds
/// are re-checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<T>",
    into = "Vec<T>",
    bound(
        serialize = "T: Serialize + Clone",
        deserialize = "T: Deserialize<'de> + BoundedItem"
    )
)]
pub struct BoundedCollection<T, const MAX_ITEMS: usize, const MAX_ITEM_LENGTH: usize>
where
    T: BoundedItem,
{
    items: Vec<T>,
}

impl<T, const MAX_ITEMS: usize, const MAX_ITEM_LENGTH: usize>
    BoundedCollection<T, MAX_ITEMS, MAX_ITEM_LENGTH>
where
    T: BoundedItem,
{
    /// Validate an external list against both bounds. The empty list is
    /// valid and yields a zero-length collection.
    pub fn new(items: Vec<T>) -> Result<Self, CollectionError> {
        if items.len() > MAX_ITEMS {
            return Err(CollectionError::CardinalityExceeded {
                len: items.len(),
                max: MAX_ITEMS,
            });
        }

        for (index, item) in items.iter().enumerate() {
            if let Some(len) = item.bounded_len() {
                if len > MAX_ITEM_LENGTH {
                    return Err(CollectionError::ItemTooLong {
                        index,
                        len,
                        max: MAX_ITEM_LENGTH,
                    });
                }
            }
        }

        Ok(Self { items })
    }

    /// Rebuild the collection from store output. A store-side absent value
    /// and a stored empty list are indistinguishable to callers: both come
    /// back as the zero-length collection.
    pub fn from_stored(stored: Option<Vec<T>>) -> Result<Self, CollectionError> {
        Self::new(stored.unwrap_or_default())
    }

    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Exact inverse of `new` for any value that passed validation.
    pub fn to_external_list(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.items.clone()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T, const MAX_ITEMS: usize, const MAX_ITEM_LENGTH: usize> Default
    for BoundedCollection<T, MAX_ITEMS, MAX_ITEM_LENGTH>
where
    T: BoundedItem,
{
    fn default() -> Self {
        Self::empty()
    }
}

impl<T, const MAX_ITEMS: usize, const MAX_ITEM_LENGTH: usize> TryFrom<Vec<T>>
    for BoundedCollection<T, MAX_ITEMS, MAX_ITEM_LENGTH>
where
    T: BoundedItem,
{
    type Error = CollectionError;

    fn try_from(items: Vec<T>) -> Result<Self, Self::Error> {
        Self::new(items)
    }
}

impl<T, const MAX_ITEMS: usize, const MAX_ITEM_LENGTH: usize>
    From<BoundedCollection<T, MAX_ITEMS, MAX_ITEM_LENGTH>> for Vec<T>
where
    T: BoundedItem,
{
    fn from(collection: BoundedCollection<T, MAX_ITEMS, MAX_ITEM_LENGTH>) -> Self {
        collection.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allergy(label: &str) -> String {
        label.to_string()
    }

    #[test]
    fn round_trips_any_valid_external_list() {
        let external = vec![allergy("penicillin"), allergy("latex"), allergy("nickel")];
        let collection = AllergyList::new(external.clone()).unwrap();
        assert_eq!(collection.to_external_list(), external);
    }

    #[test]
    fn accepts_exactly_max_items_and_rejects_one_more() {
        let at_limit: Vec<String> = (0..ALLERGY_MAX_ITEMS).map(|i| format!("a{i}")).collect();
        assert!(AllergyList::new(at_limit).is_ok());

        let over: Vec<String> = (0..=ALLERGY_MAX_ITEMS).map(|i| format!("a{i}")).collect();
        assert_eq!(
            AllergyList::new(over),
            Err(CollectionError::CardinalityExceeded {
                len: ALLERGY_MAX_ITEMS + 1,
                max: ALLERGY_MAX_ITEMS,
            })
        );
    }

    #[test]
    fn accepts_max_length_item_and_rejects_one_longer() {
        let at_limit = "x".repeat(ALLERGY_MAX_ITEM_LENGTH);
        assert!(AllergyList::new(vec![at_limit]).is_ok());

        let too_long = "x".repeat(ALLERGY_MAX_ITEM_LENGTH + 1);
        assert_eq!(
            AllergyList::new(vec![allergy("dust"), too_long]),
            Err(CollectionError::ItemTooLong {
                index: 1,
                len: ALLERGY_MAX_ITEM_LENGTH + 1,
                max: ALLERGY_MAX_ITEM_LENGTH,
            })
        );
    }

    #[test]
    fn empty_list_and_store_side_absence_are_equivalent() {
        let from_empty = AllergyList::new(Vec::new()).unwrap();
        let from_absent = AllergyList::from_stored(None).unwrap();
        assert_eq!(from_empty, from_absent);
        assert!(from_absent.is_empty());
    }

    #[test]
    fn serde_uses_the_plain_external_list() {
        let collection = AllergyList::new(vec![allergy("latex")]).unwrap();
        let json = serde_json::to_string(&collection).unwrap();
        assert_eq!(json, r#"["latex"]"#);

        let parsed: AllergyList = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, collection);

        let over: Vec<String> = (0..=ALLERGY_MAX_ITEMS).map(|i| format!("a{i}")).collect();
        let json = serde_json::to_string(&over).unwrap();
        assert!(serde_json::from_str::<AllergyList>(&json).is_err());
    }
}
