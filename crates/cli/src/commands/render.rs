use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use camquote_core::config::{AppConfig, LoadOptions};
use camquote_core::domain::document::QuotationDocument;
use camquote_core::domain::line_item::{validate_payloads, LineItemPayload};
use camquote_server::pdf;
use camquote_server::pdf::unicode::UnicodeFont;

use crate::commands::{CommandResult, EXIT_CONFIG, EXIT_INPUT, EXIT_RENDER};

const COMMAND: &str = "render";

#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub items_path: PathBuf,
    pub output_path: PathBuf,
    pub customer_name: Option<String>,
    pub customer_location: Option<String>,
    pub include_info_page: bool,
}

pub fn run(request: RenderRequest) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), EXIT_CONFIG)
        }
    };
    let payloads = match read_payloads(&request.items_path) {
        Ok(payloads) => payloads,
        Err(error) => {
            return CommandResult::failure(COMMAND, "input", format!("{error:#}"), EXIT_INPUT)
        }
    };
    let items = match validate_payloads(payloads) {
        Ok(items) => items,
        Err(error) => {
            return CommandResult::failure(COMMAND, "validation", error.to_string(), EXIT_INPUT)
        }
    };

    let count = items.len();
    let document = QuotationDocument::new(items)
        .with_customer(request.customer_name, request.customer_location)
        .with_info_page(request.include_info_page);

    let notice_font = if document.include_info_page {
        UnicodeFont::discover(config.render.font_path.as_deref())
    } else {
        None
    };
    let rendered = pdf::render_to_path(&document, notice_font.as_ref(), &request.output_path)
        .and_then(|()| document.total().ok_or(pdf::RenderError::TotalOverflow));
    match rendered {
        Ok(total) => CommandResult::success(
            COMMAND,
            format!(
                "rendered {count} line items (total {}) to `{}`",
                total.normalize(),
                request.output_path.display()
            ),
        ),
        Err(error) => CommandResult::failure(COMMAND, "render", error.to_string(), EXIT_RENDER),
    }
}

/// Accepts either a bare array of line items or an object with an `items`
/// array, the shape the PDF endpoint takes.
fn read_payloads(path: &Path) -> anyhow::Result<Vec<LineItemPayload>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read `{}`", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("`{}` is not valid JSON", path.display()))?;

    let items = match value {
        serde_json::Value::Object(mut object) => {
            object.remove("items").context("expected an `items` array")?
        }
        other => other,
    };
    serde_json::from_value(items).context("line items do not match the expected shape")
}
