use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::backend::interface::{BackendError, DocumentStore, Result};
use crate::core::{Decoded, Document};

/// The whole document kept in a single pretty-printed JSON file.
///
/// Every write replaces the file through a rename, so readers see
/// either the old or the new document and never a partial one.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> JsonStore {
        JsonStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decode(&self, text: &str) -> Result<Document> {
        let decoded = Document::decode(text)
            .map_err(|source| BackendError::Corrupt { path: self.path.clone(), source })?;

        if let Decoded::Repaired { corrupt, skipped, .. } = &decoded {
            for collection in corrupt {
                log::warn!("{}: collection \"{}\" is missing or malformed, reading it as empty",
                    self.path.display(), collection);
            }
            for record in skipped {
                log::warn!("{}: skipping {}, it is kept in the file as is", self.path.display(), record);
            }
        }
        Ok(decoded.into_document())
    }

    async fn read_existing(&self) -> Result<Document> {
        let text = fs::read_to_string(&self.path).await
            .map_err(|source| io_error(&self.path, source))?;
        self.decode(&text)
    }

    /// Creates the file with empty collections unless somebody else got
    /// there first, in which case their document is read instead.
    async fn initialize(&self) -> Result<Document> {
        let document = Document::default();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|source| io_error(parent, source))?;
        }

        let staged = write_staged(&self.path, &document.to_pretty_json()?).await?;
        let linked = fs::hard_link(&staged, &self.path).await;
        let _ = fs::remove_file(&staged).await;

        match linked {
            Ok(()) => {
                log::info!("created empty data file {}", self.path.display());
                Ok(document)
            },
            Err(err) if err.kind() == ErrorKind::AlreadyExists => self.read_existing().await,
            Err(source) => Err(io_error(&self.path, source)),
        }
    }
}

impl DocumentStore for JsonStore {
    async fn load(&self) -> Result<Document> {
        match fs::read_to_string(&self.path).await {
            Ok(text) => self.decode(&text),
            Err(err) if err.kind() == ErrorKind::NotFound => self.initialize().await,
            Err(source) => Err(io_error(&self.path, source)),
        }
    }

    async fn persist(&self, document: &Document) -> Result<()> {
        replace_file(&self.path, &document.to_pretty_json()?).await
    }
}

fn io_error(path: &Path, source: std::io::Error) -> BackendError {
    BackendError::Io { path: path.to_owned(), source }
}

/// Writes `contents` to a fresh sibling of `path` and returns its name.
async fn write_staged(path: &Path, contents: &str) -> Result<PathBuf> {
    let file_name = path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staged = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));

    let written = async {
        let mut file = fs::File::create(&staged).await?;
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await
    }.await;

    match written {
        Ok(()) => Ok(staged),
        Err(source) => {
            let _ = fs::remove_file(&staged).await;
            Err(io_error(&staged, source))
        }
    }
}

/// Replaces `path` with `contents` in one rename.
pub(crate) async fn replace_file(path: &Path, contents: &str) -> Result<()> {
    let staged = write_staged(path, contents).await?;
    if let Err(source) = fs::rename(&staged, path).await {
        let _ = fs::remove_file(&staged).await;
        return Err(io_error(path, source));
    }
    Ok(())
}
