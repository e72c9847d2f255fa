use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use camquote_core::domain::extraction::ExtractionResult;
use camquote_core::domain::inventory::{InventoryItem, InventoryItemId};

pub mod extraction_result;
pub mod inventory;
pub mod memory;

pub use extraction_result::JsonExtractionResultRepository;
pub use inventory::JsonInventoryRepository;
pub use memory::{InMemoryExtractionResultRepository, InMemoryInventoryRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("i/o error on `{path}`: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("encode error: {0}")]
    Encode(String),
    #[error("inventory item `{0}` already exists")]
    Duplicate(String),
}

impl RepositoryError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<InventoryItem>, RepositoryError>;

    /// Appends `item` and persists the full set. Fails with
    /// [`RepositoryError::Duplicate`] when the id is taken.
    async fn add(&self, item: InventoryItem) -> Result<(), RepositoryError>;

    /// Returns `false` when no item had `id`; nothing is written in that case.
    async fn remove(&self, id: &InventoryItemId) -> Result<bool, RepositoryError>;
}

/// Single-slot store for the most recent extraction. Each save replaces the
/// previous one.
#[async_trait]
pub trait ExtractionResultRepository: Send + Sync {
    async fn save_latest(&self, result: &ExtractionResult) -> Result<(), RepositoryError>;
    async fn load_latest(&self) -> Result<Option<ExtractionResult>, RepositoryError>;
}

pub(crate) async fn write_file(path: &Path, contents: &str) -> Result<(), RepositoryError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|error| RepositoryError::io(parent, error))?;
    }
    tokio::fs::write(path, contents).await.map_err(|error| RepositoryError::io(path, error))
}

/// Reads `path`, treating a missing file as absent rather than an error.
pub(crate) async fn read_optional(path: &Path) -> Result<Option<String>, RepositoryError> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(RepositoryError::io(path, error)),
    }
}
