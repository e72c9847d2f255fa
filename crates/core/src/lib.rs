pub mod config;
pub mod domain;
pub mod errors;
pub mod extraction;

pub use config::{AppConfig, ConfigError, LlmProvider, LoadOptions};
pub use domain::document::QuotationDocument;
pub use domain::extraction::ExtractionResult;
pub use domain::inventory::{InventoryItem, InventoryItemId};
pub use domain::line_item::{LineItemPayload, QuotationLineItem};
pub use errors::{
    ApplicationError, ExtractorError, FieldViolation, InterfaceError, ValidationError,
};
pub use extraction::{
    ExtractionOutcome, ExtractionPipeline, Extractor, ExtractorFailure, PromptTemplate,
    RuleBasedExtractor,
};
