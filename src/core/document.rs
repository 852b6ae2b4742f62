use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::error::RecordError;
use crate::core::record::{BudgetGroup, Purchase};

/// Everything the tracker stores: both collections, in insertion order.
///
/// Stored records that can't be read are kept aside, untouched, and
/// written back at their original positions.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Document {
    pub purchases: Vec<Purchase>,
    pub budget_groups: Vec<BudgetGroup>,
    unreadable_purchases: Vec<(usize, Value)>,
    unreadable_budget_groups: Vec<(usize, Value)>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Collection {
    Purchases,
    BudgetGroups,
}

impl Collection {
    /// Name of the collection's array in the stored document.
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Purchases => "zakupy",
            Collection::BudgetGroups => "grupy",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A stored record left out of the typed view.
#[derive(Clone, PartialEq, Debug)]
pub struct SkippedRecord {
    pub collection: Collection,
    pub index: usize,
    pub reason: RecordError,
}

impl std::fmt::Display for SkippedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} record #{}: {}", self.collection, self.index, self.reason)
    }
}

/// Result of reading a stored document.
///
/// A collection that is missing or not an array is replaced with an
/// empty one instead of failing the whole read, and a record that can't
/// be read is skipped. `Repaired` lists both.
#[derive(Debug, PartialEq)]
pub enum Decoded {
    Valid(Document),
    Repaired {
        document: Document,
        corrupt: Vec<Collection>,
        skipped: Vec<SkippedRecord>,
    },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Decoded {
    pub fn document(&self) -> &Document {
        match self {
            Decoded::Valid(document) => document,
            Decoded::Repaired { document, .. } => document,
        }
    }

    pub fn into_document(self) -> Document {
        match self {
            Decoded::Valid(document) => document,
            Decoded::Repaired { document, .. } => document,
        }
    }
}

impl Document {
    pub fn decode(text: &str) -> Result<Decoded, DecodeError> {
        let mut root = match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let mut corrupt = Vec::new();
        let mut skipped = Vec::new();
        let (purchases, unreadable_purchases) =
            decode_collection(&mut root, Collection::Purchases, &mut corrupt, &mut skipped);
        let (budget_groups, unreadable_budget_groups) =
            decode_collection(&mut root, Collection::BudgetGroups, &mut corrupt, &mut skipped);
        let document = Document { purchases, budget_groups, unreadable_purchases, unreadable_budget_groups };

        if corrupt.is_empty() && skipped.is_empty() {
            Ok(Decoded::Valid(document))
        } else {
            Ok(Decoded::Repaired { document, corrupt, skipped })
        }
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Number of readable records.
    pub fn len(&self) -> usize {
        self.purchases.len() + self.budget_groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored records kept only in their raw form.
    pub fn unreadable(&self) -> usize {
        self.unreadable_purchases.len() + self.unreadable_budget_groups.len()
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(Collection::Purchases.key(),
            &Interleaved { records: &self.purchases, unreadable: &self.unreadable_purchases })?;
        map.serialize_entry(Collection::BudgetGroups.key(),
            &Interleaved { records: &self.budget_groups, unreadable: &self.unreadable_budget_groups })?;
        map.end()
    }
}

/// Writes raw records back at the index they were read from, filling
/// the gaps with readable records in order.
struct Interleaved<'a, T> {
    records: &'a [T],
    unreadable: &'a [(usize, Value)],
}

impl<T: Serialize> Serialize for Interleaved<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.records.len() + self.unreadable.len()))?;
        let mut records = self.records.iter();
        let mut unreadable = self.unreadable.iter().peekable();

        let mut position = 0;
        loop {
            if let Some((_, raw)) = unreadable.next_if(|(index, _)| *index <= position) {
                seq.serialize_element(raw)?;
            } else if let Some(record) = records.next() {
                seq.serialize_element(record)?;
            } else if let Some((_, raw)) = unreadable.next() {
                seq.serialize_element(raw)?;
            } else {
                break;
            }
            position += 1;
        }
        seq.end()
    }
}

fn decode_collection<T>(
    root: &mut Map<String, Value>,
    collection: Collection,
    corrupt: &mut Vec<Collection>,
    skipped: &mut Vec<SkippedRecord>,
) -> (Vec<T>, Vec<(usize, Value)>)
where
    T: TryFrom<Map<String, Value>, Error = RecordError>,
{
    let Some(Value::Array(elements)) = root.remove(collection.key()) else {
        corrupt.push(collection);
        return (Vec::new(), Vec::new());
    };

    let mut records = Vec::with_capacity(elements.len());
    let mut unreadable = Vec::new();
    for (index, element) in elements.into_iter().enumerate() {
        let decoded = match &element {
            Value::Object(map) => T::try_from(map.clone()),
            _ => Err(RecordError::NotAnObject),
        };
        match decoded {
            Ok(record) => records.push(record),
            Err(reason) => {
                skipped.push(SkippedRecord { collection, index, reason });
                unreadable.push((index, element));
            }
        }
    }
    (records, unreadable)
}
