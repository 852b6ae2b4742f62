use std::future::Future;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::Document;
use crate::core::document::DecodeError;

/// Failures of the storage layer. None of these are retried.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("corrupt data file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: DecodeError,
    },
    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
    /// A queued mutation panicked or was cancelled before finishing.
    #[error("queued write aborted: {0}")]
    MutationAborted(String),
    /// The write queue worker is no longer running.
    #[error("write queue is closed")]
    QueueClosed,
}

pub type Result<T> = std::result::Result<T, BackendError>;

/// Something that can hold the whole document.
///
/// `load` must never fail because the document does not exist yet: a
/// fresh store reads as an empty document.
pub trait DocumentStore: Send + Sync + 'static {
    fn load(&self) -> impl Future<Output = Result<Document>> + Send;
    fn persist(&self, document: &Document) -> impl Future<Output = Result<()>> + Send;
}
