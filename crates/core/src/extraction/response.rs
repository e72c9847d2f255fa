//! Decoding of free-form model output into line items.
//!
//! Every AI-backed extractor shares this parser, so a provider only has to
//! hand back the raw text it received.

use serde_json::Value;

use crate::domain::line_item::QuotationLineItem;
use crate::errors::ExtractorError;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Picks the JSON payload out of a model response.
///
/// A ```` ```json ```` fence wins over a bare fence; without any fence the
/// whole trimmed response is the payload.
pub fn extract_payload(response: &str) -> &str {
    let response = response.trim();

    if let Some((_, rest)) = response.split_once(JSON_FENCE) {
        return until_fence(rest);
    }
    if let Some((_, rest)) = response.split_once(FENCE) {
        return until_fence(rest);
    }
    response
}

fn until_fence(rest: &str) -> &str {
    rest.split_once(FENCE).map_or(rest, |(inner, _)| inner).trim()
}

/// Parses a model response into validated line items.
pub fn parse_line_items(response: &str) -> Result<Vec<QuotationLineItem>, ExtractorError> {
    let payload = extract_payload(response);
    let parsed: Value =
        serde_json::from_str(payload).map_err(|error| ExtractorError::Parse(error.to_string()))?;

    let entries = match parsed {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove("items") {
            Some(Value::Array(entries)) => entries,
            _ => return Err(ExtractorError::InvalidFormat),
        },
        _ => return Err(ExtractorError::InvalidFormat),
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let item: QuotationLineItem = serde_json::from_value(entry)
                .map_err(|error| ExtractorError::InvalidItem { index, reason: error.to_string() })?;
            item.validate()
                .map_err(|error| ExtractorError::InvalidItem { index, reason: error.to_string() })?;
            Ok(item)
        })
        .collect()
}
