use serde::{Deserialize, Serialize};

use crate::domain::line_item::QuotationLineItem;

/// The "most recent extraction" record. There is exactly one slot; every
/// extraction overwrites it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub raw_input: String,
    #[serde(rename = "ai_provider")]
    pub provider_label: String,
    pub items: Vec<QuotationLineItem>,
    pub item_count: usize,
}

impl ExtractionResult {
    pub fn new(
        raw_input: impl Into<String>,
        provider_label: impl Into<String>,
        items: Vec<QuotationLineItem>,
    ) -> Self {
        let item_count = items.len();
        Self { raw_input: raw_input.into(), provider_label: provider_label.into(), items, item_count }
    }
}
