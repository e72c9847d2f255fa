use std::path::{Path, PathBuf};

use tokio::sync::RwLock;
use tracing::{debug, info};

use camquote_core::domain::inventory::{InventoryItem, InventoryItemId};

use super::{read_optional, write_file, InventoryRepository, RepositoryError};
use crate::inventory_file::InventoryDocument;

/// Inventory backed by one JSON file, cached in memory after the first read.
/// Every mutation rewrites the whole file.
pub struct JsonInventoryRepository {
    path: PathBuf,
    document: RwLock<InventoryDocument>,
}

impl JsonInventoryRepository {
    /// Loads the file at `path`. A missing file is an empty inventory.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        let document = match read_optional(&path).await? {
            Some(raw) => InventoryDocument::decode(&raw)?,
            None => InventoryDocument::default(),
        };

        info!(
            event_name = "inventory.loaded",
            path = %path.display(),
            item_count = document.items.len(),
            "inventory file loaded"
        );
        Ok(Self { path, document: RwLock::new(document) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, document: &InventoryDocument) -> Result<(), RepositoryError> {
        let encoded = document.encode()?;
        write_file(&self.path, &encoded).await?;
        debug!(
            event_name = "inventory.persisted",
            path = %self.path.display(),
            item_count = document.items.len(),
            "inventory file rewritten"
        );
        Ok(())
    }
}

#[async_trait::async_trait]
impl InventoryRepository for JsonInventoryRepository {
    async fn list(&self) -> Result<Vec<InventoryItem>, RepositoryError> {
        Ok(self.document.read().await.items.clone())
    }

    async fn add(&self, item: InventoryItem) -> Result<(), RepositoryError> {
        let mut document = self.document.write().await;
        if document.items.iter().any(|existing| existing.id == item.id) {
            return Err(RepositoryError::Duplicate(item.id.0));
        }

        document.items.push(item);
        if let Err(error) = self.persist(&document).await {
            document.items.pop();
            return Err(error);
        }
        Ok(())
    }

    async fn remove(&self, id: &InventoryItemId) -> Result<bool, RepositoryError> {
        let mut document = self.document.write().await;
        let Some(position) = document.items.iter().position(|item| &item.id == id) else {
            return Ok(false);
        };

        let removed = document.items.remove(position);
        if let Err(error) = self.persist(&document).await {
            document.items.insert(position, removed);
            return Err(error);
        }
        Ok(true)
    }
}
