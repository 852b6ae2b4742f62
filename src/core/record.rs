use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::core::amount::Amount;
use crate::core::error::RecordError;
use crate::core::normalize::{
    AmountKey, CATEGORY_FIELD, GROUP_AMOUNT, MONTH_FIELD, PURCHASE_AMOUNT, STORE_FIELD};

pub type RecordId = String;

const ID_FIELD: &str = "uuid";
const DATE_FIELD: &str = "data";

/// A validated purchase that has not been stored yet.
#[derive(Clone, PartialEq, Debug)]
pub struct NewPurchase {
    pub store: String,
    pub category: String,
    pub amount: Amount,
}

/// A validated budget group that has not been stored yet.
#[derive(Clone, PartialEq, Debug)]
pub struct NewBudgetGroup {
    pub month: String,
    pub category: String,
    pub amount: Amount,
}

/// A stored purchase.
///
/// Keys the tracker doesn't know about are kept in `extra` and written
/// back unchanged.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Purchase {
    #[serde(rename = "sklep")]
    pub store: String,
    #[serde(rename = "kategoria")]
    pub category: String,
    #[serde(rename = "wartość")]
    pub amount: Amount,
    #[serde(rename = "uuid")]
    pub id: RecordId,
    /// Entry date, `YYYY-MM-DD` for every record this crate creates.
    /// Empty when the stored record has no usable date.
    #[serde(rename = "data", skip_serializing_if = "String::is_empty")]
    pub entry_date: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A stored monthly allocation for one category.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct BudgetGroup {
    pub month: String,
    #[serde(rename = "kategoria")]
    pub category: String,
    #[serde(rename = "kwota")]
    pub amount: Amount,
    #[serde(rename = "uuid")]
    pub id: RecordId,
    #[serde(rename = "data", skip_serializing_if = "String::is_empty")]
    pub entry_date: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Purchase {
    pub fn new(purchase: NewPurchase, id: RecordId, entry_date: String) -> Purchase {
        Purchase {
            store: purchase.store,
            category: purchase.category,
            amount: purchase.amount,
            id,
            entry_date,
            extra: Map::new(),
        }
    }
}

impl BudgetGroup {
    pub fn new(group: NewBudgetGroup, id: RecordId, entry_date: String) -> BudgetGroup {
        BudgetGroup {
            month: group.month,
            category: group.category,
            amount: group.amount,
            id,
            entry_date,
            extra: Map::new(),
        }
    }
}

fn take_text(map: &mut Map<String, Value>, field: &'static str) -> Result<String, RecordError> {
    match map.remove(field) {
        Some(Value::String(text)) => Ok(text),
        _ => Err(RecordError::MissingField(field)),
    }
}

/// Takes the entry date if it is non-empty text. Anything else stays
/// among the extra keys so it is written back as it was.
fn take_date(map: &mut Map<String, Value>) -> String {
    match map.get(DATE_FIELD) {
        Some(Value::String(text)) if !text.is_empty() => take_text(map, DATE_FIELD).unwrap_or_default(),
        _ => String::new(),
    }
}

/// Removes every spelling of the amount field and keeps the first
/// readable value.
fn take_amount(map: &mut Map<String, Value>, key: &AmountKey) -> Result<Amount, RecordError> {
    let spellings: Vec<String> = map.keys()
        .filter(|spelling| key.matches(spelling))
        .cloned()
        .collect();
    if spellings.is_empty() {
        return Err(RecordError::MissingField(key.canonical));
    }

    let values: Vec<Value> = spellings.iter()
        .filter_map(|spelling| map.remove(spelling))
        .collect();
    values.iter()
        .find_map(Amount::coerce)
        .ok_or(RecordError::InvalidAmount(key.canonical))
}

impl TryFrom<Map<String, Value>> for Purchase {
    type Error = RecordError;

    fn try_from(mut map: Map<String, Value>) -> Result<Self, Self::Error> {
        Ok(Purchase {
            amount: take_amount(&mut map, &PURCHASE_AMOUNT)?,
            store: take_text(&mut map, STORE_FIELD)?,
            category: take_text(&mut map, CATEGORY_FIELD)?,
            id: take_text(&mut map, ID_FIELD)?,
            entry_date: take_date(&mut map),
            extra: map,
        })
    }
}

impl TryFrom<Map<String, Value>> for BudgetGroup {
    type Error = RecordError;

    fn try_from(mut map: Map<String, Value>) -> Result<Self, Self::Error> {
        Ok(BudgetGroup {
            amount: take_amount(&mut map, &GROUP_AMOUNT)?,
            month: take_text(&mut map, MONTH_FIELD)?,
            category: take_text(&mut map, CATEGORY_FIELD)?,
            id: take_text(&mut map, ID_FIELD)?,
            entry_date: take_date(&mut map),
            extra: map,
        })
    }
}

impl<'de> Deserialize<'de> for Purchase {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::deserialize(deserializer)?;
        Purchase::try_from(map).map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for BudgetGroup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::deserialize(deserializer)?;
        BudgetGroup::try_from(map).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Purchase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} [{}] {}", self.entry_date, self.store, self.category, self.amount)
    }
}

impl std::fmt::Display for BudgetGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}", self.month, self.category, self.amount)
    }
}
