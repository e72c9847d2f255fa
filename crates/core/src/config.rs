use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_PREFIX: &str = "CAMQUOTE";
pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["camquote.toml", "config/camquote.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub render: RenderConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub inventory_path: PathBuf,
    pub latest_result_path: PathBuf,
    pub prompt_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider_order: Vec<LlmProvider>,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub groq: ProviderConfig,
    pub gemini: ProviderConfig,
    pub anthropic: ProviderConfig,
    pub openai: ProviderConfig,
}

#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub api_key: Option<SecretString>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

/// PDF rendering settings. `font_path` names a TrueType font with Malayalam
/// coverage; when unset, a few well-known locations are tried instead.
#[derive(Clone, Debug, Default)]
pub struct RenderConfig {
    pub font_path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Groq,
    Gemini,
    Anthropic,
    OpenAi,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub inventory_path: Option<PathBuf>,
    pub latest_result_path: Option<PathBuf>,
    pub prompt_path: Option<PathBuf>,
    pub provider_order: Option<Vec<LlmProvider>>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl LlmProvider {
    pub const ALL: [LlmProvider; 4] =
        [LlmProvider::Groq, LlmProvider::Gemini, LlmProvider::Anthropic, LlmProvider::OpenAi];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::Gemini => "gemini",
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
        }
    }

    /// Variable name the provider's key was historically read from, kept as
    /// a fallback after the prefixed `CAMQUOTE_*` name.
    pub fn legacy_api_key_var(self) -> &'static str {
        match self {
            Self::Groq => "GROQ_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn env_key(self, field: &str) -> String {
        format!("{ENV_PREFIX}_{}_{field}", self.as_str().to_ascii_uppercase())
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "gemini" => Ok(Self::Gemini),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected groq|gemini|anthropic|openai)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl ProviderConfig {
    fn with_defaults(model: &str, base_url: &str, max_tokens: u32) -> Self {
        Self {
            api_key: None,
            model: model.to_string(),
            base_url: base_url.to_string(),
            max_tokens,
        }
    }

    /// A provider joins the extraction chain only when it has a non-blank key.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|key| !key.expose_secret().trim().is_empty())
    }
}

impl LlmConfig {
    pub fn provider(&self, provider: LlmProvider) -> &ProviderConfig {
        match provider {
            LlmProvider::Groq => &self.groq,
            LlmProvider::Gemini => &self.gemini,
            LlmProvider::Anthropic => &self.anthropic,
            LlmProvider::OpenAi => &self.openai,
        }
    }

    fn provider_mut(&mut self, provider: LlmProvider) -> &mut ProviderConfig {
        match provider {
            LlmProvider::Groq => &mut self.groq,
            LlmProvider::Gemini => &mut self.gemini,
            LlmProvider::Anthropic => &mut self.anthropic,
            LlmProvider::OpenAi => &mut self.openai,
        }
    }

    /// Providers from `provider_order` that have credentials, in order.
    pub fn configured_providers(&self) -> Vec<LlmProvider> {
        self.provider_order
            .iter()
            .copied()
            .filter(|provider| self.provider(*provider).has_api_key())
            .collect()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                inventory_path: PathBuf::from("inventory.json"),
                latest_result_path: PathBuf::from("latest_response.json"),
                prompt_path: PathBuf::from("system_prompt.txt"),
            },
            llm: LlmConfig {
                provider_order: LlmProvider::ALL.to_vec(),
                timeout_secs: 30,
                temperature: 0.2,
                groq: ProviderConfig::with_defaults(
                    "llama-3.3-70b-versatile",
                    "https://api.groq.com/openai/v1",
                    4096,
                ),
                gemini: ProviderConfig::with_defaults(
                    "gemini-2.0-flash-exp",
                    "https://generativelanguage.googleapis.com",
                    4096,
                ),
                anthropic: ProviderConfig::with_defaults(
                    "claude-3-5-sonnet-20241022",
                    "https://api.anthropic.com",
                    2048,
                ),
                openai: ProviderConfig::with_defaults("gpt-4", "https://api.openai.com/v1", 4096),
            },
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8000,
                cors_origins: (5173..=5176)
                    .map(|port| format!("http://localhost:{port}"))
                    .collect(),
            },
            render: RenderConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(storage) = patch.storage {
            if let Some(inventory_path) = storage.inventory_path {
                self.storage.inventory_path = inventory_path;
            }
            if let Some(latest_result_path) = storage.latest_result_path {
                self.storage.latest_result_path = latest_result_path;
            }
            if let Some(prompt_path) = storage.prompt_path {
                self.storage.prompt_path = prompt_path;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider_order) = llm.provider_order {
                self.llm.provider_order = provider_order
                    .iter()
                    .map(|name| name.parse())
                    .collect::<Result<Vec<_>, _>>()?;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }

            let provider_patches = [
                (LlmProvider::Groq, llm.groq),
                (LlmProvider::Gemini, llm.gemini),
                (LlmProvider::Anthropic, llm.anthropic),
                (LlmProvider::OpenAi, llm.openai),
            ];
            for (provider, patch) in provider_patches {
                let Some(patch) = patch else { continue };
                let target = self.llm.provider_mut(provider);
                if let Some(api_key_value) = patch.api_key {
                    target.api_key = Some(secret_value(api_key_value));
                }
                if let Some(model) = patch.model {
                    target.model = model;
                }
                if let Some(base_url) = patch.base_url {
                    target.base_url = base_url;
                }
                if let Some(max_tokens) = patch.max_tokens {
                    target.max_tokens = max_tokens;
                }
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(cors_origins) = server.cors_origins {
                self.server.cors_origins = cors_origins;
            }
        }

        if let Some(render) = patch.render {
            if let Some(font_path) = render.font_path {
                self.render.font_path = Some(font_path);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CAMQUOTE_STORAGE_INVENTORY_PATH") {
            self.storage.inventory_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("CAMQUOTE_STORAGE_LATEST_RESULT_PATH") {
            self.storage.latest_result_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("CAMQUOTE_STORAGE_PROMPT_PATH") {
            self.storage.prompt_path = PathBuf::from(value);
        }

        if let Some(value) = read_env("CAMQUOTE_LLM_PROVIDER_ORDER") {
            self.llm.provider_order = parse_provider_order(&value)?;
        }
        if let Some(value) = read_env("CAMQUOTE_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("CAMQUOTE_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("CAMQUOTE_LLM_TEMPERATURE") {
            self.llm.temperature = parse_f32("CAMQUOTE_LLM_TEMPERATURE", &value)?;
        }

        for provider in LlmProvider::ALL {
            let api_key = read_env(&provider.env_key("API_KEY"))
                .or_else(|| read_env(provider.legacy_api_key_var()));
            let model = read_env(&provider.env_key("MODEL"));
            let base_url = read_env(&provider.env_key("BASE_URL"));
            let max_tokens_key = provider.env_key("MAX_TOKENS");
            let max_tokens = read_env(&max_tokens_key)
                .map(|value| parse_u32(&max_tokens_key, &value))
                .transpose()?;

            let target = self.llm.provider_mut(provider);
            if let Some(value) = api_key {
                target.api_key = Some(secret_value(value));
            }
            if let Some(value) = model {
                target.model = value;
            }
            if let Some(value) = base_url {
                target.base_url = value;
            }
            if let Some(value) = max_tokens {
                target.max_tokens = value;
            }
        }

        if let Some(value) = read_env("CAMQUOTE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("CAMQUOTE_SERVER_PORT") {
            self.server.port = parse_u16("CAMQUOTE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("CAMQUOTE_SERVER_CORS_ORIGINS") {
            self.server.cors_origins = split_list(&value);
        }

        if let Some(value) = read_env("CAMQUOTE_RENDER_FONT_PATH") {
            self.render.font_path = Some(PathBuf::from(value));
        }

        let log_level =
            read_env("CAMQUOTE_LOGGING_LEVEL").or_else(|| read_env("CAMQUOTE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CAMQUOTE_LOGGING_FORMAT").or_else(|| read_env("CAMQUOTE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(inventory_path) = overrides.inventory_path {
            self.storage.inventory_path = inventory_path;
        }
        if let Some(latest_result_path) = overrides.latest_result_path {
            self.storage.latest_result_path = latest_result_path;
        }
        if let Some(prompt_path) = overrides.prompt_path {
            self.storage.prompt_path = prompt_path;
        }
        if let Some(provider_order) = overrides.provider_order {
            self.llm.provider_order = provider_order;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_storage(&self.storage)?;
        validate_llm(&self.llm)?;
        validate_server(&self.server)?;
        validate_render(&self.render)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// The config file `load` would read for `explicit_path`, if any exists.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_storage(storage: &StorageConfig) -> Result<(), ConfigError> {
    let paths = [
        ("storage.inventory_path", &storage.inventory_path),
        ("storage.latest_result_path", &storage.latest_result_path),
        ("storage.prompt_path", &storage.prompt_path),
    ];
    for (key, path) in paths {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(format!("{key} must not be empty")));
        }
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if !llm.temperature.is_finite() || !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    for (index, provider) in llm.provider_order.iter().enumerate() {
        if llm.provider_order[..index].contains(provider) {
            return Err(ConfigError::Validation(format!(
                "llm.provider_order lists `{provider}` more than once"
            )));
        }
    }

    for provider in LlmProvider::ALL {
        let settings = llm.provider(provider);
        if settings.max_tokens == 0 {
            return Err(ConfigError::Validation(format!(
                "llm.{provider}.max_tokens must be greater than zero"
            )));
        }
        if settings.model.trim().is_empty() {
            return Err(ConfigError::Validation(format!("llm.{provider}.model must not be empty")));
        }
        let base_url = settings.base_url.trim();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "llm.{provider}.base_url must start with http:// or https://"
            )));
        }
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    Ok(())
}

fn validate_render(render: &RenderConfig) -> Result<(), ConfigError> {
    match &render.font_path {
        Some(path) if path.as_os_str().is_empty() => {
            Err(ConfigError::Validation("render.font_path must not be empty when set".to_string()))
        }
        _ => Ok(()),
    }
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_provider_order(value: &str) -> Result<Vec<LlmProvider>, ConfigError> {
    split_list(value).iter().map(|name| name.parse()).collect()
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    storage: Option<StoragePatch>,
    llm: Option<LlmPatch>,
    server: Option<ServerPatch>,
    render: Option<RenderPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct StoragePatch {
    inventory_path: Option<PathBuf>,
    latest_result_path: Option<PathBuf>,
    prompt_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider_order: Option<Vec<String>>,
    timeout_secs: Option<u64>,
    temperature: Option<f32>,
    groq: Option<ProviderPatch>,
    gemini: Option<ProviderPatch>,
    anthropic: Option<ProviderPatch>,
    openai: Option<ProviderPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderPatch {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    cors_origins: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderPatch {
    font_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LlmProvider, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const PROVIDER_KEY_VARS: [&str; 8] = [
        "CAMQUOTE_GROQ_API_KEY",
        "CAMQUOTE_GEMINI_API_KEY",
        "CAMQUOTE_ANTHROPIC_API_KEY",
        "CAMQUOTE_OPENAI_API_KEY",
        "GROQ_API_KEY",
        "GEMINI_API_KEY",
        "ANTHROPIC_API_KEY",
        "OPENAI_API_KEY",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_match_original_deployment() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&PROVIDER_KEY_VARS);

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.server.port == 8000, "default port should be 8000")?;
        ensure(config.server.cors_origins.len() == 4, "four dev origins expected")?;
        ensure(
            config.server.cors_origins[0] == "http://localhost:5173",
            "first dev origin should be vite default",
        )?;
        ensure(config.llm.provider_order == LlmProvider::ALL.to_vec(), "default order")?;
        ensure(config.llm.anthropic.max_tokens == 2048, "anthropic token default")?;
        ensure(config.llm.groq.max_tokens == 4096, "groq token default")?;
        ensure((config.llm.temperature - 0.2).abs() < f32::EPSILON, "default temperature")?;
        ensure(config.llm.configured_providers().is_empty(), "no keys means no providers")?;
        ensure(
            config.storage.inventory_path == PathBuf::from("inventory.json"),
            "default inventory file",
        )?;
        Ok(())
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&PROVIDER_KEY_VARS);

        env::set_var("TEST_GROQ_KEY", "gsk-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("camquote.toml");
            fs::write(
                &path,
                r#"
[llm.groq]
api_key = "${TEST_GROQ_KEY}"
model = "llama-3.1-8b-instant"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            let key = config.llm.groq.api_key.as_ref().map(|key| key.expose_secret().to_string());
            ensure(key.as_deref() == Some("gsk-from-env"), "groq key should be interpolated")?;
            ensure(config.llm.groq.model == "llama-3.1-8b-instant", "model from file")?;
            ensure(
                config.llm.configured_providers() == vec![LlmProvider::Groq],
                "only groq should be configured",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_GROQ_KEY"]);
        result
    }

    #[test]
    fn legacy_key_variables_are_accepted_after_prefixed_ones() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&PROVIDER_KEY_VARS);

        env::set_var("GEMINI_API_KEY", "legacy-gemini");
        env::set_var("ANTHROPIC_API_KEY", "legacy-anthropic");
        env::set_var("CAMQUOTE_ANTHROPIC_API_KEY", "prefixed-anthropic");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            let anthropic = config
                .llm
                .anthropic
                .api_key
                .as_ref()
                .map(|key| key.expose_secret().to_string());
            ensure(
                anthropic.as_deref() == Some("prefixed-anthropic"),
                "prefixed variable should win over legacy",
            )?;
            ensure(
                config.llm.configured_providers()
                    == vec![LlmProvider::Gemini, LlmProvider::Anthropic],
                "configured providers follow the default order",
            )?;
            Ok(())
        })();

        clear_vars(&PROVIDER_KEY_VARS);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&PROVIDER_KEY_VARS);

        env::set_var("CAMQUOTE_SERVER_PORT", "9100");
        env::set_var("CAMQUOTE_LLM_PROVIDER_ORDER", "anthropic, groq");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("camquote.toml");
            fs::write(
                &path,
                r#"
[storage]
inventory_path = "data/from-file.json"

[llm]
provider_order = ["openai"]
timeout_secs = 45

[server]
port = 9000

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    inventory_path: Some(PathBuf::from("data/override.json")),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.storage.inventory_path == PathBuf::from("data/override.json"),
                "override inventory path should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.server.port == 9100, "env port should win over file")?;
            ensure(
                config.llm.provider_order == vec![LlmProvider::Anthropic, LlmProvider::Groq],
                "env provider order should win over file",
            )?;
            ensure(config.llm.timeout_secs == 45, "file timeout should win over default")?;
            Ok(())
        })();

        clear_vars(&["CAMQUOTE_SERVER_PORT", "CAMQUOTE_LLM_PROVIDER_ORDER"]);
        result
    }

    #[test]
    fn render_font_path_comes_from_file_then_env() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&["CAMQUOTE_RENDER_FONT_PATH"]);

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("camquote.toml");
            fs::write(&path, "[render]\nfont_path = \"fonts/NotoSansMalayalam.ttf\"\n")
                .map_err(|err| err.to_string())?;
            let load = || AppConfig::load(LoadOptions {
                config_path: Some(path.clone()),
                ..LoadOptions::default()
            });

            let config = load().map_err(|err| format!("config load failed: {err}"))?;
            ensure(
                config.render.font_path == Some(PathBuf::from("fonts/NotoSansMalayalam.ttf")),
                "font path should come from the file",
            )?;

            env::set_var("CAMQUOTE_RENDER_FONT_PATH", "/opt/fonts/custom.ttf");
            let config = load().map_err(|err| format!("config load failed: {err}"))?;
            ensure(
                config.render.font_path == Some(PathBuf::from("/opt/fonts/custom.ttf")),
                "env should override the file font path",
            )?;

            fs::write(&path, "[render]\nfont_path = \"\"\n").map_err(|err| err.to_string())?;
            clear_vars(&["CAMQUOTE_RENDER_FONT_PATH"]);
            match load() {
                Err(ConfigError::Validation(message)) => {
                    ensure(message.contains("render.font_path"), "error should name the key")
                }
                _ => Err("empty font path should fail validation".to_string()),
            }
        })();

        clear_vars(&["CAMQUOTE_RENDER_FONT_PATH"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CAMQUOTE_LOG_LEVEL", "warn");
        env::set_var("CAMQUOTE_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["CAMQUOTE_LOG_LEVEL", "CAMQUOTE_LOG_FORMAT"]);
        result
    }

    #[test]
    fn duplicate_provider_in_order_fails_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CAMQUOTE_LLM_PROVIDER_ORDER", "groq,gemini,groq");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            ensure(
                matches!(
                    error,
                    ConfigError::Validation(ref message) if message.contains("llm.provider_order")
                ),
                "validation failure should mention llm.provider_order",
            )
        })();

        clear_vars(&["CAMQUOTE_LLM_PROVIDER_ORDER"]);
        result
    }

    #[test]
    fn out_of_range_values_fail_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let cases = [
            ("CAMQUOTE_LLM_TIMEOUT_SECS", "0", "llm.timeout_secs"),
            ("CAMQUOTE_LLM_TEMPERATURE", "2.5", "llm.temperature"),
            ("CAMQUOTE_GEMINI_MAX_TOKENS", "0", "llm.gemini.max_tokens"),
            ("CAMQUOTE_OPENAI_BASE_URL", "ftp://example.com", "llm.openai.base_url"),
            ("CAMQUOTE_LOGGING_LEVEL", "verbose", "logging.level"),
        ];

        for (var, value, expected_key) in cases {
            env::set_var(var, value);
            let outcome = AppConfig::load(LoadOptions::default());
            env::remove_var(var);

            match outcome {
                Err(ConfigError::Validation(message)) if message.contains(expected_key) => {}
                Err(other) => return Err(format!("{var}: unexpected error {other}")),
                Ok(_) => return Err(format!("{var}: expected validation failure")),
            }
        }

        Ok(())
    }

    #[test]
    fn unknown_provider_name_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CAMQUOTE_LLM_PROVIDER_ORDER", "groq,mistral");
        let outcome = AppConfig::load(LoadOptions::default());
        clear_vars(&["CAMQUOTE_LLM_PROVIDER_ORDER"]);

        ensure(
            matches!(outcome, Err(ConfigError::Validation(ref message)) if message.contains("mistral")),
            "unknown provider should be named in the error",
        )
    }

    #[test]
    fn non_numeric_port_is_an_invalid_env_override() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CAMQUOTE_SERVER_PORT", "eighty");
        let outcome = AppConfig::load(LoadOptions::default());
        clear_vars(&["CAMQUOTE_SERVER_PORT"]);

        ensure(
            matches!(outcome, Err(ConfigError::InvalidEnvOverride { ref key, .. }) if key == "CAMQUOTE_SERVER_PORT"),
            "invalid port should name the variable",
        )
    }

    #[test]
    fn missing_required_file_is_reported() -> Result<(), String> {
        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("absent.toml");

        let outcome = AppConfig::load(LoadOptions {
            config_path: Some(path.clone()),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(outcome, Err(ConfigError::MissingConfigFile(ref missing)) if *missing == path),
            "missing file should be reported with its path",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&PROVIDER_KEY_VARS);

        env::set_var("CAMQUOTE_GROQ_API_KEY", "gsk-secret-value");
        env::set_var("OPENAI_API_KEY", "sk-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("gsk-secret-value"), "debug output should not contain groq key")?;
            ensure(!debug.contains("sk-secret-value"), "debug output should not contain openai key")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&PROVIDER_KEY_VARS);
        result
    }

    #[test]
    fn blank_api_key_does_not_configure_provider() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&PROVIDER_KEY_VARS);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("camquote.toml");
        fs::write(&path, "[llm.gemini]\napi_key = \"   \"\n").map_err(|err| err.to_string())?;

        let config =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                .map_err(|err| format!("config load failed: {err}"))?;

        ensure(!config.llm.gemini.has_api_key(), "blank key should not count")?;
        ensure(config.llm.configured_providers().is_empty(), "no provider configured")
    }
}
