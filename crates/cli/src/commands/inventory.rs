use camquote_core::config::{AppConfig, LoadOptions};
use camquote_db::{InventoryRepository, JsonInventoryRepository};
use serde_json::json;

use crate::commands::{runtime, CommandResult, EXIT_CONFIG, EXIT_STORAGE};

const COMMAND: &str = "inventory";

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), EXIT_CONFIG)
        }
    };

    let runtime = match runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let path = &config.storage.inventory_path;
    let listed = runtime.block_on(async {
        let repository = JsonInventoryRepository::open(path).await?;
        repository.list().await
    });

    match listed {
        Ok(items) => CommandResult::success_with_data(
            COMMAND,
            format!("{} inventory items in `{}`", items.len(), path.display()),
            Some(json!(items)),
        ),
        Err(error) => CommandResult::failure(COMMAND, "storage", error.to_string(), EXIT_STORAGE),
    }
}
