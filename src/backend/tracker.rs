use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::backend::interface::{BackendError, DocumentStore};
use crate::backend::json_store::JsonStore;
use crate::backend::write_queue::WriteQueue;
use crate::core::filter::DATE_FORMAT;
use crate::core::normalize::{normalize_budget_group, normalize_purchase};
use crate::core::{BudgetGroup, DateRange, Purchase, RecordId, Summary, ValidationError};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] BackendError),
}

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;

/// Typed access to purchases and budget groups.
///
/// Reads go straight to the store and may miss a write that is still in
/// flight. Appends go through the write queue.
pub struct Tracker<S = JsonStore> {
    queue: WriteQueue<S>,
}

impl<S> Clone for Tracker<S> {
    fn clone(&self) -> Self {
        Tracker { queue: self.queue.clone() }
    }
}

impl Tracker<JsonStore> {
    /// Opens the tracker on a JSON data file. The file is created on
    /// first access.
    pub fn open(path: impl Into<PathBuf>) -> Tracker<JsonStore> {
        Tracker::new(JsonStore::new(path))
    }
}

impl<S: DocumentStore> Tracker<S> {
    pub fn new(store: S) -> Tracker<S> {
        Tracker { queue: WriteQueue::spawn(store) }
    }

    pub fn store(&self) -> &S {
        self.queue.store()
    }

    pub async fn list_purchases(&self, range: &DateRange) -> TrackerResult<Vec<Purchase>> {
        let document = self.store().load().await?;
        Ok(document.purchases.into_iter()
            .filter(|purchase| range.contains(&purchase.entry_date))
            .collect())
    }

    pub async fn list_budget_groups(&self) -> TrackerResult<Vec<BudgetGroup>> {
        Ok(self.store().load().await?.budget_groups)
    }

    pub async fn summary(&self, range: &DateRange) -> TrackerResult<Summary> {
        let purchases = self.list_purchases(range).await?;
        Ok(Summary::of(&purchases))
    }

    pub async fn append_purchase(&self, payload: &Value) -> TrackerResult<Purchase> {
        let purchase = Purchase::new(normalize_purchase(payload)?, new_id(), today());
        log::info!("adding purchase {}", purchase);

        let stored = self.queue.enqueue(move |document| {
            document.purchases.push(purchase.clone());
            Ok(purchase)
        }).await?;
        Ok(stored)
    }

    pub async fn append_budget_group(&self, payload: &Value) -> TrackerResult<BudgetGroup> {
        let group = BudgetGroup::new(normalize_budget_group(payload)?, new_id(), today());
        log::info!("adding budget group {}", group);

        let stored = self.queue.enqueue(move |document| {
            document.budget_groups.push(group.clone());
            Ok(group)
        }).await?;
        Ok(stored)
    }
}

fn new_id() -> RecordId {
    Uuid::new_v4().to_string()
}

fn today() -> String {
    chrono::Local::now().format(DATE_FORMAT).to_string()
}


#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::backend::{DocumentStore, JsonStore, Tracker, TrackerError};
    use crate::core::{DateRange, Document, Purchase, ValidationError};
    use crate::core::normalize::normalize_purchase;

    use rstest::{fixture, rstest};
    use serde_json::json;
    use tempfile::TempDir;

    struct Fixture {
        // keeps the directory alive
        _dir: TempDir,
        tracker: Tracker,
    }

    #[fixture]
    fn fx() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Tracker::open(dir.path().join("zakupy.json"));
        Fixture { _dir: dir, tracker }
    }

    fn purchase_payload(store: &str, amount: serde_json::Value) -> serde_json::Value {
        json!({"sklep": store, "kategoria": "Jedzenie", "wartość": amount})
    }

    #[rstest]
    #[tokio::test]
    async fn empty_store_self_initializes(fx: Fixture) {
        assert!(fx.tracker.list_purchases(&DateRange::all()).await.unwrap().is_empty());
        assert!(fx.tracker.list_budget_groups().await.unwrap().is_empty());

        let stored: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(fx.tracker.store().path()).unwrap()).unwrap();
        assert_eq!(stored, json!({"zakupy": [], "grupy": []}));
    }

    #[rstest]
    #[tokio::test]
    async fn append_assigns_id_and_date(fx: Fixture) {
        let purchase = fx.tracker.append_purchase(&purchase_payload("Lidl", json!("12,34"))).await.unwrap();

        assert_eq!(purchase.amount.value(), 12.34);
        assert_eq!(purchase.id.len(), 36);
        assert!(crate::core::filter::parse_date(&purchase.entry_date).is_some());

        let listed = fx.tracker.list_purchases(&DateRange::all()).await.unwrap();
        assert_eq!(listed, vec![purchase]);
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_keep_every_record(fx: Fixture) {
        const N: usize = 30;
        let tasks: Vec<_> = (0..N)
            .map(|i| {
                let tracker = fx.tracker.clone();
                tokio::spawn(async move {
                    tracker.append_purchase(&purchase_payload(&format!("sklep {}", i), json!(i + 1))).await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let purchases = fx.tracker.list_purchases(&DateRange::all()).await.unwrap();
        let ids: HashSet<_> = purchases.iter().map(|p| p.id.clone()).collect();
        assert_eq!(purchases.len(), N);
        assert_eq!(ids.len(), N);
    }

    #[rstest]
    #[tokio::test]
    async fn appends_keep_submission_order(fx: Fixture) {
        let (a, b) = (purchase_payload("A", json!(1)), purchase_payload("B", json!(2)));
        let first = fx.tracker.append_purchase(&a);
        let second = fx.tracker.append_purchase(&b);
        let (first, second) = tokio::join!(first, second);
        first.unwrap();
        second.unwrap();

        let stores: Vec<_> = fx.tracker.list_purchases(&DateRange::all()).await.unwrap()
            .into_iter().map(|p| p.store).collect();
        assert_eq!(stores, vec!["A", "B"]);
    }

    #[rstest]
    #[tokio::test]
    async fn comma_and_dot_store_the_same_amount(fx: Fixture) {
        let comma = fx.tracker.append_purchase(&purchase_payload("Lidl", json!("12,34"))).await.unwrap();
        let dot = fx.tracker.append_purchase(&purchase_payload("Lidl", json!("12.34"))).await.unwrap();

        assert_eq!(comma.amount, dot.amount);
        assert_eq!((comma.store, comma.category), (dot.store, dot.category));
    }

    #[rstest]
    #[tokio::test]
    async fn amounts_are_rounded(fx: Fixture) {
        let purchase = fx.tracker.append_purchase(&purchase_payload("Lidl", json!(19.999))).await.unwrap();
        assert_eq!(purchase.amount.value(), 20.0);

        let rejected = fx.tracker.append_purchase(&purchase_payload("Lidl", json!(0.004))).await;
        assert!(matches!(rejected, Err(TrackerError::Validation(ValidationError::NonPositiveAmount(_)))));
        assert_eq!(fx.tracker.list_purchases(&DateRange::all()).await.unwrap().len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn blank_store_is_rejected_without_writing(fx: Fixture) {
        fx.tracker.append_purchase(&purchase_payload("Lidl", json!(5))).await.unwrap();

        let result = fx.tracker.append_purchase(&purchase_payload("", json!(5))).await;

        assert!(matches!(result, Err(TrackerError::Validation(ValidationError::MissingField("sklep")))));
        assert_eq!(fx.tracker.list_purchases(&DateRange::all()).await.unwrap().len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn range_filter_keeps_stored_order(fx: Fixture) {
        let mut document = Document::default();
        for (id, date) in [("x", "2024-04-15"), ("y", "2024-05-01"), ("z", "2024-05-31"), ("w", "")] {
            document.purchases.push(Purchase::new(
                normalize_purchase(&purchase_payload("Lidl", json!(1))).unwrap(),
                id.to_owned(),
                date.to_owned()));
        }
        fx.tracker.store().persist(&document).await.unwrap();

        let range = DateRange::parse(Some("2024-05-01"), Some("2024-05-31")).unwrap();
        let ids: Vec<_> = fx.tracker.list_purchases(&range).await.unwrap()
            .into_iter().map(|p| p.id).collect();

        assert_eq!(ids, vec!["y", "z"]);
    }

    #[rstest]
    #[tokio::test]
    async fn budget_groups(fx: Fixture) {
        let group = fx.tracker.append_budget_group(&json!({
            "month": "maj-2024",
            "kategoria": "Dom",
            "kwota": "1200,50"
        })).await.unwrap();

        assert_eq!(group.amount.value(), 1200.5);
        assert_eq!(fx.tracker.list_budget_groups().await.unwrap(), vec![group]);
        assert!(fx.tracker.list_purchases(&DateRange::all()).await.unwrap().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn summary_of_stored_purchases(fx: Fixture) {
        fx.tracker.append_purchase(&purchase_payload("Lidl", json!("10,25"))).await.unwrap();
        fx.tracker.append_purchase(&purchase_payload("Biedronka", json!(4.75))).await.unwrap();

        let summary = fx.tracker.summary(&DateRange::all()).await.unwrap();

        assert_eq!(summary.total.value(), 15.0);
        assert_eq!(summary.by_category.len(), 1);
        assert_eq!(summary.by_month.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn unreadable_record_does_not_block_the_store(fx: Fixture) {
        let path = fx.tracker.store().path().to_owned();
        let unreadable = json!({"sklep": "Żabka", "kategoria": "Jedzenie", "wartość": "dużo", "uuid": "d"});
        let stored = json!({
            "zakupy": [
                {"sklep": "Lidl", "kategoria": "Jedzenie", "wartość": 5, "uuid": "a", "data": "2024-05-01"},
                unreadable.clone()
            ],
            "grupy": []
        });
        std::fs::write(&path, stored.to_string()).unwrap();

        let ids: Vec<_> = fx.tracker.list_purchases(&DateRange::all()).await.unwrap()
            .into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["a"]);
        assert!(fx.tracker.list_budget_groups().await.unwrap().is_empty());
        fx.tracker.append_budget_group(&json!({"month": "maj-2024", "kategoria": "Dom", "kwota": 100}))
            .await.unwrap();

        let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["zakupy"][1], unreadable);
        assert_eq!(written["grupy"].as_array().unwrap().len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn numeric_date_survives_later_appends(fx: Fixture) {
        let path = fx.tracker.store().path().to_owned();
        let first = json!({"sklep": "Lidl", "kategoria": "Jedzenie", "wartość": 5, "uuid": "a", "data": 20240501});
        std::fs::write(&path, json!({"zakupy": [first.clone()], "grupy": []}).to_string()).unwrap();

        fx.tracker.append_purchase(&purchase_payload("Biedronka", json!(2))).await.unwrap();

        let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["zakupy"][0], first);
    }

    #[rstest]
    #[tokio::test]
    async fn corrupt_file_fails_appends_without_touching_it(fx: Fixture) {
        let path = fx.tracker.store().path().to_owned();
        std::fs::write(&path, "nie json").unwrap();

        let result = fx.tracker.append_purchase(&purchase_payload("Lidl", json!(1))).await;

        assert!(matches!(result, Err(TrackerError::Storage(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "nie json");
    }

    #[tokio::test]
    async fn independent_trackers_do_not_share_state() {
        let (a, b) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let first = Tracker::new(JsonStore::new(a.path().join("zakupy.json")));
        let second = Tracker::new(JsonStore::new(b.path().join("zakupy.json")));

        first.append_purchase(&purchase_payload("Lidl", json!(1))).await.unwrap();

        assert_eq!(first.list_purchases(&DateRange::all()).await.unwrap().len(), 1);
        assert!(second.list_purchases(&DateRange::all()).await.unwrap().is_empty());
    }
}
