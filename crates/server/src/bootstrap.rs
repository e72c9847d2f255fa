use std::sync::Arc;

use camquote_agent::{ExtractorRegistry, LlmError};
use camquote_core::config::{AppConfig, ConfigError, LoadOptions};
use camquote_core::extraction::PromptTemplate;
use camquote_db::{
    ExtractionResultRepository, InventoryRepository, JsonExtractionResultRepository,
    JsonInventoryRepository, RepositoryError,
};
use thiserror::Error;
use tracing::info;

use crate::pdf::unicode::UnicodeFont;

/// Shared handles every route works against.
#[derive(Clone)]
pub struct AppState {
    pub inventory: Arc<dyn InventoryRepository>,
    pub results: Arc<dyn ExtractionResultRepository>,
    pub registry: Arc<ExtractorRegistry>,
    /// Font for the Malayalam notice; absent means the lossy Helvetica fallback.
    pub notice_font: Option<Arc<UnicodeFont>>,
}

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("inventory could not be opened: {0}")]
    Inventory(#[source] RepositoryError),
    #[error("prompt template `{path}` could not be read: {source}")]
    Prompt { path: String, source: std::io::Error },
    #[error("extractor chain could not be built: {0}")]
    Extractors(#[source] LlmError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let inventory = JsonInventoryRepository::open(&config.storage.inventory_path)
        .await
        .map_err(BootstrapError::Inventory)?;
    let items = inventory.list().await.map_err(BootstrapError::Inventory)?;
    info!(
        event_name = "system.bootstrap.inventory_loaded",
        correlation_id = "bootstrap",
        path = %config.storage.inventory_path.display(),
        items = items.len(),
        "inventory loaded"
    );

    let prompt = PromptTemplate::load(&config.storage.prompt_path).map_err(|source| {
        BootstrapError::Prompt { path: config.storage.prompt_path.display().to_string(), source }
    })?;
    let registry =
        ExtractorRegistry::new(config.llm.clone(), prompt).map_err(BootstrapError::Extractors)?;
    info!(
        event_name = "system.bootstrap.extractors_ready",
        correlation_id = "bootstrap",
        prompt_source = ?registry.prompt().source(),
        providers = ?registry.configured_labels(),
        "extractor chain configured"
    );

    let notice_font = UnicodeFont::discover(config.render.font_path.as_deref()).map(Arc::new);

    let results = JsonExtractionResultRepository::new(&config.storage.latest_result_path);
    let state = AppState {
        inventory: Arc::new(inventory),
        results: Arc::new(results),
        registry: Arc::new(registry),
        notice_font,
    };

    Ok(Application { config, state })
}
