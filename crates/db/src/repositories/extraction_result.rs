use std::path::{Path, PathBuf};

use camquote_core::domain::extraction::ExtractionResult;

use super::{read_optional, write_file, ExtractionResultRepository, RepositoryError};

/// Keeps the latest extraction in a single pretty-printed JSON file.
pub struct JsonExtractionResultRepository {
    path: PathBuf,
}

impl JsonExtractionResultRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl ExtractionResultRepository for JsonExtractionResultRepository {
    async fn save_latest(&self, result: &ExtractionResult) -> Result<(), RepositoryError> {
        let encoded = serde_json::to_string_pretty(result)
            .map_err(|error| RepositoryError::Encode(error.to_string()))?;
        write_file(&self.path, &encoded).await
    }

    async fn load_latest(&self) -> Result<Option<ExtractionResult>, RepositoryError> {
        let Some(raw) = read_optional(&self.path).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|error| RepositoryError::Decode(format!("latest result: {error}")))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::Value;
    use tempfile::TempDir;

    use camquote_core::domain::extraction::ExtractionResult;
    use camquote_core::domain::line_item::QuotationLineItem;

    use super::JsonExtractionResultRepository;
    use crate::repositories::ExtractionResultRepository;

    #[tokio::test]
    async fn nothing_saved_yet_loads_none() {
        let dir = TempDir::new().expect("temp dir");
        let repo = JsonExtractionResultRepository::new(dir.path().join("latest_response.json"));

        assert_eq!(repo.load_latest().await.expect("load"), None);
    }

    #[tokio::test]
    async fn each_save_overwrites_the_previous_result() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("out").join("latest_response.json");
        let repo = JsonExtractionResultRepository::new(&path);

        let first = ExtractionResult::new("install", "basic parsing (no AI API key found)", vec![
            QuotationLineItem::priced("Installation Basic", 1, Decimal::new(5000, 0)),
        ]);
        let second = ExtractionResult::new("2 adaptor", "Groq AI (FREE)", vec![
            QuotationLineItem::priced("Adaptor", 2, Decimal::new(300, 0)),
        ]);

        repo.save_latest(&first).await.expect("save first");
        repo.save_latest(&second).await.expect("save second");

        assert_eq!(repo.load_latest().await.expect("load"), Some(second));

        let on_disk: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(on_disk["ai_provider"], "Groq AI (FREE)");
        assert_eq!(on_disk["item_count"], 1);
        assert_eq!(on_disk["raw_input"], "2 adaptor");
    }
}
