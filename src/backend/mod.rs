mod interface;
mod json_store;
mod write_queue;
mod tracker;
pub mod migrate;

pub use interface::{BackendError, DocumentStore, Result};
pub use json_store::JsonStore;
pub use write_queue::WriteQueue;
pub use tracker::{Tracker, TrackerError, TrackerResult};
pub use migrate::{migrate_file, MigrationReport};
