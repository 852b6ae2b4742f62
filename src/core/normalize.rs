//! Turns loosely typed payloads into canonical records.
//!
//! Amount fields reach us in several spellings of the same Polish word
//! (`wartość`, `wartosc`, and a few mangled by an old encoding bug), and
//! their values may be numbers or text with a comma decimal separator.
//! Everything here works on plain `serde_json` maps so the same rules
//! apply to HTTP payloads, stored records and the legacy migration.

use serde_json::{Map, Value};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::core::amount::{Amount, MAX_AMOUNT};
use crate::core::error::ValidationError;
use crate::core::record::{NewBudgetGroup, NewPurchase};

pub const STORE_FIELD: &str = "sklep";
pub const CATEGORY_FIELD: &str = "kategoria";
pub const MONTH_FIELD: &str = "month";

/// Identifies an amount field by its canonical token rather than its
/// exact spelling.
#[derive(Debug, Clone, Copy)]
pub struct AmountKey {
    /// Spelling used when writing the field.
    pub canonical: &'static str,
    token: &'static str,
    legacy: &'static [&'static str],
}

pub const PURCHASE_AMOUNT: AmountKey = AmountKey {
    canonical: "wartość",
    token: "wartosc",
    legacy: &["warto\u{fffd}", "warto\u{fffd}\u{fffd}", "warto\u{fffd}>\u{fffd}\u{fffd}"],
};

pub const GROUP_AMOUNT: AmountKey = AmountKey {
    canonical: "kwota",
    token: "kwota",
    legacy: &[],
};

impl AmountKey {
    pub fn matches(&self, key: &str) -> bool {
        canonical_key(key) == self.token || self.legacy.iter().any(|legacy| *legacy == key)
    }

    /// First key of `map` naming this amount field, if any.
    pub fn find<'a>(&self, map: &'a Map<String, Value>) -> Option<&'a str> {
        map.keys().map(String::as_str).find(|key| self.matches(key))
    }
}

/// Strips diacritics and everything that is not an ASCII letter, then
/// lowercases. `"Wartość"` and `"wartosc"` both become `"wartosc"`.
pub fn canonical_key(key: &str) -> String {
    key.nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn required_text(map: &Map<String, Value>, field: &'static str) -> Result<String, ValidationError> {
    match map.get(field) {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text.trim().to_owned()),
        _ => Err(ValidationError::MissingField(field)),
    }
}

fn required_amount(map: &Map<String, Value>, key: &AmountKey) -> Result<Amount, ValidationError> {
    let field = key.canonical;
    let amount = key.find(map)
        .and_then(|found| map.get(found))
        .and_then(Amount::coerce)
        .ok_or(ValidationError::InvalidAmount(field))?;

    if !amount.is_positive() {
        return Err(ValidationError::NonPositiveAmount(field));
    }
    if amount.value() > MAX_AMOUNT {
        return Err(ValidationError::AmountTooLarge(field));
    }
    Ok(amount)
}

pub fn normalize_purchase(payload: &Value) -> Result<NewPurchase, ValidationError> {
    let map = payload.as_object().ok_or(ValidationError::NotAnObject)?;
    Ok(NewPurchase {
        store: required_text(map, STORE_FIELD)?,
        category: required_text(map, CATEGORY_FIELD)?,
        amount: required_amount(map, &PURCHASE_AMOUNT)?,
    })
}

pub fn normalize_budget_group(payload: &Value) -> Result<NewBudgetGroup, ValidationError> {
    let map = payload.as_object().ok_or(ValidationError::NotAnObject)?;
    Ok(NewBudgetGroup {
        month: required_text(map, MONTH_FIELD)?,
        category: required_text(map, CATEGORY_FIELD)?,
        amount: required_amount(map, &GROUP_AMOUNT)?,
    })
}
