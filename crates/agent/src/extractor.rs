use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use camquote_core::domain::inventory::InventoryItem;
use camquote_core::domain::line_item::QuotationLineItem;
use camquote_core::errors::ExtractorError;
use camquote_core::extraction::response::parse_line_items;
use camquote_core::extraction::{Extractor, PromptTemplate};

use crate::llm::{GenerationOptions, LlmClient};

/// Adapts any [`LlmClient`] to the pipeline's `Extractor` contract.
pub struct LlmExtractor {
    label: String,
    client: Arc<dyn LlmClient>,
    prompt: Arc<PromptTemplate>,
    options: GenerationOptions,
}

impl LlmExtractor {
    pub fn new(
        label: impl Into<String>,
        client: Arc<dyn LlmClient>,
        prompt: Arc<PromptTemplate>,
        options: GenerationOptions,
    ) -> Self {
        Self { label: label.into(), client, prompt, options }
    }
}

#[async_trait]
impl Extractor for LlmExtractor {
    fn label(&self) -> &str {
        &self.label
    }

    async fn extract(
        &self,
        raw_text: &str,
        inventory: &[InventoryItem],
    ) -> Result<Vec<QuotationLineItem>, ExtractorError> {
        let prompt = self.prompt.compose(inventory, raw_text);
        debug!(
            event_name = "extraction.provider.request",
            provider = %self.label,
            prompt_chars = prompt.len(),
            max_tokens = self.options.max_tokens,
            "sending extraction prompt"
        );

        let reply = self.client.complete(&prompt, self.options).await?;
        debug!(
            event_name = "extraction.provider.reply",
            provider = %self.label,
            reply_chars = reply.len(),
            "received extraction reply"
        );

        parse_line_items(&reply)
    }
}
