use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::inventory::InventoryItem;
use crate::domain::line_item::QuotationLineItem;
use crate::errors::ExtractorError;
use crate::extraction::Extractor;

pub const NO_PROVIDER_LABEL: &str = "basic parsing (no AI API key found)";
pub const PROVIDERS_FAILED_LABEL: &str = "basic parsing (AI failed)";

/// Keyword-driven extractor used when no AI provider is configured or every
/// provider failed. It makes no external calls and never errors.
#[derive(Clone, Debug, Default)]
pub struct RuleBasedExtractor;

impl RuleBasedExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, raw_text: &str) -> Vec<QuotationLineItem> {
        let normalized = raw_text.to_lowercase();
        let mut items = Vec::new();

        for line in normalized.split('\n') {
            if line.trim().is_empty() {
                continue;
            }
            let quantity = leading_quantity(line);

            camera_rule(line, quantity, &mut items);
            adaptor_rule(line, quantity, &mut items);
            cable_rule(line, quantity, &mut items);
            recorder_rule(line, &mut items);
            install_rule(line, &mut items);
        }

        items
    }
}

#[async_trait]
impl Extractor for RuleBasedExtractor {
    fn label(&self) -> &str {
        NO_PROVIDER_LABEL
    }

    async fn extract(
        &self,
        raw_text: &str,
        _inventory: &[InventoryItem],
    ) -> Result<Vec<QuotationLineItem>, ExtractorError> {
        Ok(self.parse(raw_text))
    }
}

/// First run of ASCII digits in the line; 1 when there is none, when it is
/// zero, or when it does not fit a `u32`.
fn leading_quantity(line: &str) -> u32 {
    let digits: String = line
        .chars()
        .skip_while(|character| !character.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();

    digits.parse::<u32>().ok().filter(|quantity| *quantity > 0).unwrap_or(1)
}

fn rate(value: i64) -> Decimal {
    Decimal::new(value, 0)
}

fn camera_rule(line: &str, quantity: u32, items: &mut Vec<QuotationLineItem>) {
    if !(line.contains("cctv") || line.contains("camera")) {
        return;
    }

    let (description, unit_rate) = if line.contains("low") {
        ("CCTV Camera - Low Quality", 2500)
    } else if line.contains("medium") {
        ("CCTV Camera - Medium Quality", 3500)
    } else if line.contains("high") {
        ("CCTV Camera - High Quality", 5000)
    } else {
        ("CCTV Camera - Medium Quality", 3500)
    };
    items.push(QuotationLineItem::priced(description, quantity, rate(unit_rate)));
}

fn adaptor_rule(line: &str, quantity: u32, items: &mut Vec<QuotationLineItem>) {
    if line.contains("adaptor") {
        items.push(QuotationLineItem::priced("Adaptor", quantity, rate(300)));
    }
}

fn cable_rule(line: &str, quantity: u32, items: &mut Vec<QuotationLineItem>) {
    if !line.contains("cable") {
        return;
    }

    let (description, unit_rate) =
        if line.contains("coax") { ("Coaxial Cable", 20) } else { ("Cat6 Cable", 25) };
    items.push(QuotationLineItem::priced(description, quantity, rate(unit_rate)));
}

// Recorders are always quoted as a single unit, whatever number the line carries.
fn recorder_rule(line: &str, items: &mut Vec<QuotationLineItem>) {
    if !(line.contains("nvr") || line.contains("dvr")) {
        return;
    }

    let recorder = if line.contains('4') {
        Some(("4 Channel NVR", 8000))
    } else if line.contains('8') {
        Some(("8 Channel NVR", 12_000))
    } else if line.contains("16") {
        Some(("16 Channel NVR", 18_000))
    } else {
        None
    };

    if let Some((description, unit_rate)) = recorder {
        items.push(QuotationLineItem::priced(description, 1, rate(unit_rate)));
    }
}

fn install_rule(line: &str, items: &mut Vec<QuotationLineItem>) {
    if line.contains("install") {
        items.push(QuotationLineItem::priced("Installation Basic", 1, rate(5000)));
    }
}
