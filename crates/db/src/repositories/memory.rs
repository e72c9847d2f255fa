use tokio::sync::RwLock;

use camquote_core::domain::extraction::ExtractionResult;
use camquote_core::domain::inventory::{InventoryItem, InventoryItemId};

use super::{ExtractionResultRepository, InventoryRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryInventoryRepository {
    items: RwLock<Vec<InventoryItem>>,
}

impl InMemoryInventoryRepository {
    pub fn with_items(items: Vec<InventoryItem>) -> Self {
        Self { items: RwLock::new(items) }
    }
}

#[async_trait::async_trait]
impl InventoryRepository for InMemoryInventoryRepository {
    async fn list(&self) -> Result<Vec<InventoryItem>, RepositoryError> {
        Ok(self.items.read().await.clone())
    }

    async fn add(&self, item: InventoryItem) -> Result<(), RepositoryError> {
        let mut items = self.items.write().await;
        if items.iter().any(|existing| existing.id == item.id) {
            return Err(RepositoryError::Duplicate(item.id.0));
        }
        items.push(item);
        Ok(())
    }

    async fn remove(&self, id: &InventoryItemId) -> Result<bool, RepositoryError> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|item| &item.id != id);
        Ok(items.len() != before)
    }
}

#[derive(Default)]
pub struct InMemoryExtractionResultRepository {
    latest: RwLock<Option<ExtractionResult>>,
}

#[async_trait::async_trait]
impl ExtractionResultRepository for InMemoryExtractionResultRepository {
    async fn save_latest(&self, result: &ExtractionResult) -> Result<(), RepositoryError> {
        *self.latest.write().await = Some(result.clone());
        Ok(())
    }

    async fn load_latest(&self) -> Result<Option<ExtractionResult>, RepositoryError> {
        Ok(self.latest.read().await.clone())
    }
}
