//! Raw text → quotation line items.
//!
//! An [`ExtractionPipeline`] holds the configured extractors in priority
//! order and walks them until one succeeds. The rule-based extractor closes
//! the chain, so a run always produces a (possibly empty) item list.

pub mod prompt;
pub mod response;
pub mod rules;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::extraction::ExtractionResult;
use crate::domain::inventory::InventoryItem;
use crate::domain::line_item::QuotationLineItem;
use crate::errors::ExtractorError;

pub use prompt::{PromptSource, PromptTemplate};
pub use rules::{RuleBasedExtractor, NO_PROVIDER_LABEL, PROVIDERS_FAILED_LABEL};

#[async_trait]
pub trait Extractor: Send + Sync {
    /// Human-readable name reported back to callers when this extractor wins.
    fn label(&self) -> &str;

    async fn extract(
        &self,
        raw_text: &str,
        inventory: &[InventoryItem],
    ) -> Result<Vec<QuotationLineItem>, ExtractorError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractorFailure {
    pub provider_label: String,
    pub error: ExtractorError,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractionOutcome {
    pub items: Vec<QuotationLineItem>,
    pub provider_label: String,
    pub failures: Vec<ExtractorFailure>,
}

impl ExtractionOutcome {
    pub fn summary(&self) -> String {
        format!("Generated {} items using {}", self.items.len(), self.provider_label)
    }

    pub fn to_result(&self, raw_text: &str) -> ExtractionResult {
        ExtractionResult::new(raw_text, self.provider_label.clone(), self.items.clone())
    }
}

#[derive(Clone, Default)]
pub struct ExtractionPipeline {
    extractors: Vec<Arc<dyn Extractor>>,
    fallback: RuleBasedExtractor,
}

impl ExtractionPipeline {
    pub fn new(extractors: Vec<Arc<dyn Extractor>>) -> Self {
        Self { extractors, fallback: RuleBasedExtractor::new() }
    }

    /// A pipeline with no AI providers; every run goes straight to the rules.
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.extractors.iter().map(|extractor| extractor.label()).collect()
    }

    pub async fn run(&self, raw_text: &str, inventory: &[InventoryItem]) -> ExtractionOutcome {
        let mut failures = Vec::new();

        for extractor in &self.extractors {
            match extractor.extract(raw_text, inventory).await {
                Ok(items) => {
                    info!(
                        event_name = "extraction.provider.succeeded",
                        provider = extractor.label(),
                        item_count = items.len(),
                        prior_failures = failures.len(),
                        "extractor produced quotation items"
                    );
                    return ExtractionOutcome {
                        items,
                        provider_label: extractor.label().to_string(),
                        failures,
                    };
                }
                Err(error) => {
                    warn!(
                        event_name = "extraction.provider.failed",
                        provider = extractor.label(),
                        error = %error,
                        "extractor failed, trying next in chain"
                    );
                    failures.push(ExtractorFailure {
                        provider_label: extractor.label().to_string(),
                        error,
                    });
                }
            }
        }

        let provider_label =
            if self.extractors.is_empty() { NO_PROVIDER_LABEL } else { PROVIDERS_FAILED_LABEL };
        let items = self.fallback.parse(raw_text);
        info!(
            event_name = "extraction.fallback.used",
            provider = provider_label,
            item_count = items.len(),
            "rule-based extraction produced quotation items"
        );

        ExtractionOutcome { items, provider_label: provider_label.to_string(), failures }
    }
}
