use std::fs;
use std::path::PathBuf;

use camquote_agent::ExtractorRegistry;
use camquote_core::config::{AppConfig, LoadOptions};
use camquote_core::extraction::{ExtractionPipeline, PromptTemplate};
use camquote_db::{
    ExtractionResultRepository, InventoryRepository, JsonExtractionResultRepository,
    JsonInventoryRepository,
};
use serde_json::json;

use crate::commands::{runtime, CommandResult, EXIT_CONFIG, EXIT_INPUT, EXIT_STORAGE};

const COMMAND: &str = "extract";

#[derive(Debug, Clone)]
pub enum TextSource {
    Inline(String),
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub source: TextSource,
    pub offline: bool,
    pub save: bool,
}

pub fn run(request: ExtractRequest) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), EXIT_CONFIG)
        }
    };

    let raw_text = match &request.source {
        TextSource::Inline(text) => text.clone(),
        TextSource::File(path) => match fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) => {
                return CommandResult::failure(
                    COMMAND,
                    "input",
                    format!("could not read `{}`: {error}", path.display()),
                    EXIT_INPUT,
                )
            }
        },
    };

    let pipeline = if request.offline {
        ExtractionPipeline::offline()
    } else {
        match build_pipeline(&config) {
            Ok(pipeline) => pipeline,
            Err(result) => return result,
        }
    };

    let runtime = match runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    runtime.block_on(async {
        let inventory = match JsonInventoryRepository::open(&config.storage.inventory_path).await {
            Ok(repository) => repository,
            Err(error) => return storage_failure(error),
        };
        let items = match inventory.list().await {
            Ok(items) => items,
            Err(error) => return storage_failure(error),
        };

        let outcome = pipeline.run(&raw_text, &items).await;

        if request.save {
            let results = JsonExtractionResultRepository::new(&config.storage.latest_result_path);
            if let Err(error) = results.save_latest(&outcome.to_result(&raw_text)).await {
                return storage_failure(error);
            }
        }

        let failures: Vec<_> = outcome
            .failures
            .iter()
            .map(|failure| json!({ "provider": failure.provider_label, "error": failure.error.to_string() }))
            .collect();
        let data = json!({
            "ai_provider": outcome.provider_label,
            "items": outcome.items,
            "failures": failures,
            "saved": request.save,
        });

        CommandResult::success_with_data(COMMAND, outcome.summary(), Some(data))
    })
}

fn build_pipeline(config: &AppConfig) -> Result<ExtractionPipeline, CommandResult> {
    let prompt = PromptTemplate::load(&config.storage.prompt_path).map_err(|error| {
        CommandResult::failure(
            COMMAND,
            "prompt_template",
            format!("could not read `{}`: {error}", config.storage.prompt_path.display()),
            EXIT_CONFIG,
        )
    })?;
    let registry = ExtractorRegistry::new(config.llm.clone(), prompt).map_err(|error| {
        CommandResult::failure(COMMAND, "extractor_chain", error.to_string(), EXIT_CONFIG)
    })?;

    Ok(registry.pipeline())
}

fn storage_failure(error: impl std::fmt::Display) -> CommandResult {
    CommandResult::failure(COMMAND, "storage", error.to_string(), EXIT_STORAGE)
}
