use std::env;
use std::fs;
use std::path::Path;

use camquote_core::config::{resolve_config_path, AppConfig, LlmProvider, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

struct ConfigField {
    key: String,
    value: String,
    env_keys: Vec<String>,
}

impl ConfigField {
    fn new(key: impl Into<String>, value: impl Into<String>, env_keys: &[&str]) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            env_keys: env_keys.iter().map(|key| key.to_string()).collect(),
        }
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in effective_fields(&config) {
        let source = field_source(
            &field.key,
            &field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(&field.key, &field.value, source));
    }

    lines.join("\n")
}

fn effective_fields(config: &AppConfig) -> Vec<ConfigField> {
    let storage = &config.storage;
    let mut fields = vec![
        ConfigField::new(
            "storage.inventory_path",
            storage.inventory_path.display().to_string(),
            &["CAMQUOTE_STORAGE_INVENTORY_PATH"],
        ),
        ConfigField::new(
            "storage.latest_result_path",
            storage.latest_result_path.display().to_string(),
            &["CAMQUOTE_STORAGE_LATEST_RESULT_PATH"],
        ),
        ConfigField::new(
            "storage.prompt_path",
            storage.prompt_path.display().to_string(),
            &["CAMQUOTE_STORAGE_PROMPT_PATH"],
        ),
        ConfigField::new(
            "llm.provider_order",
            config
                .llm
                .provider_order
                .iter()
                .map(|provider| provider.as_str())
                .collect::<Vec<_>>()
                .join(","),
            &["CAMQUOTE_LLM_PROVIDER_ORDER"],
        ),
        ConfigField::new(
            "llm.timeout_secs",
            config.llm.timeout_secs.to_string(),
            &["CAMQUOTE_LLM_TIMEOUT_SECS"],
        ),
        ConfigField::new(
            "llm.temperature",
            config.llm.temperature.to_string(),
            &["CAMQUOTE_LLM_TEMPERATURE"],
        ),
    ];

    for provider in LlmProvider::ALL {
        let settings = config.llm.provider(provider);
        let api_key = match &settings.api_key {
            Some(key) => redact_key(key.expose_secret()),
            None => "<unset>".to_string(),
        };
        let api_key_env = provider.env_key("API_KEY");
        fields.push(ConfigField::new(
            format!("llm.{provider}.api_key"),
            api_key,
            &[api_key_env.as_str(), provider.legacy_api_key_var()],
        ));
        fields.push(ConfigField::new(
            format!("llm.{provider}.model"),
            settings.model.clone(),
            &[provider.env_key("MODEL").as_str()],
        ));
        fields.push(ConfigField::new(
            format!("llm.{provider}.base_url"),
            settings.base_url.clone(),
            &[provider.env_key("BASE_URL").as_str()],
        ));
        fields.push(ConfigField::new(
            format!("llm.{provider}.max_tokens"),
            settings.max_tokens.to_string(),
            &[provider.env_key("MAX_TOKENS").as_str()],
        ));
    }

    fields.extend([
        ConfigField::new(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["CAMQUOTE_SERVER_BIND_ADDRESS"],
        ),
        ConfigField::new(
            "server.port",
            config.server.port.to_string(),
            &["CAMQUOTE_SERVER_PORT"],
        ),
        ConfigField::new(
            "server.cors_origins",
            config.server.cors_origins.join(","),
            &["CAMQUOTE_SERVER_CORS_ORIGINS"],
        ),
        ConfigField::new(
            "render.font_path",
            config
                .render
                .font_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |path| path.display().to_string()),
            &["CAMQUOTE_RENDER_FONT_PATH"],
        ),
        ConfigField::new(
            "logging.level",
            config.logging.level.clone(),
            &["CAMQUOTE_LOGGING_LEVEL", "CAMQUOTE_LOG_LEVEL"],
        ),
        ConfigField::new(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["CAMQUOTE_LOGGING_FORMAT", "CAMQUOTE_LOG_FORMAT"],
        ),
    ]);

    fields
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[String],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let env_hit = env_keys.iter().find(|key| {
        env::var(key.as_str()).map(|value| !value.trim().is_empty()).unwrap_or(false)
    });
    if let Some(env_key) = env_hit {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps a short vendor prefix such as `gsk_` or `sk-` so operators can tell
/// keys apart without exposing them.
fn redact_key(key: &str) -> String {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let prefix_end = trimmed.find(['_', '-']).filter(|index| *index <= 4);
    match prefix_end {
        Some(index) if trimmed.len() > index + 8 => format!("{}***", &trimmed[..=index]),
        _ => "<redacted>".to_string(),
    }
}
