//! One-shot rewrite of amounts stored as text (`"12,34"`) into numbers.
//!
//! Works on the raw JSON so records the typed model can't read yet are
//! still fixed where possible. Running it again changes nothing.

use std::path::Path;

use serde_json::{Number, Value};

use crate::backend::interface::{BackendError, Result};
use crate::backend::json_store::replace_file;
use crate::core::{Amount, Collection};
use crate::core::document::DecodeError;
use crate::core::normalize::{AmountKey, GROUP_AMOUNT, PURCHASE_AMOUNT};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MigrationReport {
    pub purchases: usize,
    pub budget_groups: usize,
    /// Amount fields that could not be read as a number and were left alone.
    pub skipped: usize,
}

impl MigrationReport {
    pub fn converted(&self) -> usize {
        self.purchases + self.budget_groups
    }
}

impl std::fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "purchases={}, budget groups={}, skipped={}",
            self.purchases, self.budget_groups, self.skipped)
    }
}

fn is_canonical(value: &Value, amount: Amount) -> bool {
    value.as_f64() == Some(amount.value())
}

/// Returns (converted, skipped) for one collection.
fn migrate_collection(items: Option<&mut Value>, key: &AmountKey) -> (usize, usize) {
    let Some(Value::Array(items)) = items else {
        return (0, 0);
    };

    let (mut converted, mut skipped) = (0, 0);
    for record in items.iter_mut().filter_map(Value::as_object_mut) {
        for (field, value) in record.iter_mut().filter(|(field, _)| key.matches(field)) {
            let Some(amount) = Amount::coerce(value) else {
                log::warn!("cannot read amount {} in field \"{}\", leaving it", value, field);
                skipped += 1;
                continue;
            };
            if is_canonical(value, amount) {
                continue;
            }
            if let Some(number) = Number::from_f64(amount.value()) {
                *value = Value::Number(number);
                converted += 1;
            }
        }
    }
    (converted, skipped)
}

pub fn migrate_document(document: &mut Value) -> MigrationReport {
    let Some(root) = document.as_object_mut() else {
        return MigrationReport::default();
    };

    let (purchases, skipped_purchases) =
        migrate_collection(root.get_mut(Collection::Purchases.key()), &PURCHASE_AMOUNT);
    let (budget_groups, skipped_groups) =
        migrate_collection(root.get_mut(Collection::BudgetGroups.key()), &GROUP_AMOUNT);

    MigrationReport { purchases, budget_groups, skipped: skipped_purchases + skipped_groups }
}

/// Migrates the data file in place. Unlike loading the store, a missing
/// file is an error here; the file is only rewritten when something changed.
pub async fn migrate_file(path: &Path) -> Result<MigrationReport> {
    let text = tokio::fs::read_to_string(path).await
        .map_err(|source| BackendError::Io { path: path.to_owned(), source })?;
    let mut document: Value = serde_json::from_str(&text)
        .map_err(|err| BackendError::Corrupt { path: path.to_owned(), source: DecodeError::Json(err) })?;

    let report = migrate_document(&mut document);
    if report.converted() > 0 {
        replace_file(path, &serde_json::to_string_pretty(&document)?).await?;
    }
    log::info!("migrated {}: {}", path.display(), report);
    Ok(report)
}
