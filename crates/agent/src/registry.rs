use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use secrecy::SecretString;
use tracing::debug;

use camquote_core::config::{LlmConfig, LlmProvider, ProviderConfig};
use camquote_core::extraction::{ExtractionPipeline, Extractor, PromptTemplate};

use crate::extractor::LlmExtractor;
use crate::llm::{GenerationOptions, LlmClient, LlmError};
use crate::providers::{AnthropicClient, ChatCompletionsClient, GeminiClient};

pub const OPENAI_SYSTEM_MESSAGE: &str = "You are a CCTV quotation assistant.";

/// Name reported to callers when `provider` produced the items.
pub fn provider_label(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::Groq => "Groq AI (FREE)",
        LlmProvider::Gemini => "Gemini AI",
        LlmProvider::Anthropic => "Claude AI",
        LlmProvider::OpenAi => "OpenAI",
    }
}

/// Builds the ordered extractor chain from configuration. One HTTP client,
/// carrying the configured timeout, is shared by every provider.
pub struct ExtractorRegistry {
    http: Client,
    llm: LlmConfig,
    prompt: Arc<PromptTemplate>,
}

impl ExtractorRegistry {
    pub fn new(llm: LlmConfig, prompt: PromptTemplate) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(llm.timeout_secs))
            .build()
            .map_err(|error| LlmError::Transport(error.to_string()))?;

        Ok(Self { http, llm, prompt: Arc::new(prompt) })
    }

    pub fn prompt(&self) -> &PromptTemplate {
        &self.prompt
    }

    /// Providers that will be tried, in order. Providers without a key are
    /// left out.
    pub fn configured_providers(&self) -> Vec<LlmProvider> {
        self.llm.configured_providers()
    }

    pub fn configured_labels(&self) -> Vec<&'static str> {
        self.configured_providers().into_iter().map(provider_label).collect()
    }

    pub fn extractors(&self) -> Vec<Arc<dyn Extractor>> {
        self.llm
            .provider_order
            .iter()
            .filter_map(|provider| {
                let settings = self.llm.provider(*provider);
                let api_key = settings.api_key.clone().filter(|_| settings.has_api_key())?;
                Some(self.extractor_for(*provider, settings, api_key))
            })
            .collect()
    }

    /// A fresh pipeline over the current chain.
    pub fn pipeline(&self) -> ExtractionPipeline {
        let extractors = self.extractors();
        debug!(
            event_name = "extraction.chain.built",
            providers = ?self.configured_labels(),
            "extraction chain assembled"
        );
        ExtractionPipeline::new(extractors)
    }

    fn extractor_for(
        &self,
        provider: LlmProvider,
        settings: &ProviderConfig,
        api_key: SecretString,
    ) -> Arc<dyn Extractor> {
        let http = self.http.clone();
        let (base_url, model) = (settings.base_url.as_str(), settings.model.as_str());
        let client: Arc<dyn LlmClient> = match provider {
            LlmProvider::Groq => Arc::new(ChatCompletionsClient::new(http, api_key, base_url, model)),
            LlmProvider::OpenAi => Arc::new(
                ChatCompletionsClient::new(http, api_key, base_url, model)
                    .with_system_message(OPENAI_SYSTEM_MESSAGE),
            ),
            LlmProvider::Gemini => Arc::new(GeminiClient::new(http, api_key, base_url, model)),
            LlmProvider::Anthropic => Arc::new(AnthropicClient::new(http, api_key, base_url, model)),
        };

        let options =
            GenerationOptions { temperature: self.llm.temperature, max_tokens: settings.max_tokens };
        Arc::new(LlmExtractor::new(provider_label(provider), client, Arc::clone(&self.prompt), options))
    }
}
