use std::fs;
use std::io;
use std::path::Path;

use crate::domain::inventory::InventoryItem;

pub const DEFAULT_INSTRUCTIONS: &str =
    "You are a CCTV quotation assistant. Convert raw input into structured quotation JSON.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptSource {
    File,
    Embedded,
}

/// Fixed instruction prefix shared by every AI-backed extractor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptTemplate {
    instructions: String,
    source: PromptSource,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self { instructions: DEFAULT_INSTRUCTIONS.to_string(), source: PromptSource::Embedded }
    }
}

impl PromptTemplate {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self { instructions: instructions.into(), source: PromptSource::File }
    }

    /// Reads the template verbatim from `path`, falling back to the embedded
    /// default when the file does not exist. Other I/O failures are returned.
    pub fn load(path: &Path) -> io::Result<Self> {
        match fs::read_to_string(path) {
            Ok(instructions) => Ok(Self::new(instructions)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(error),
        }
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn source(&self) -> PromptSource {
        self.source
    }

    pub fn compose(&self, inventory: &[InventoryItem], raw_text: &str) -> String {
        let inventory_json =
            serde_json::to_string_pretty(inventory).unwrap_or_else(|_| "[]".to_string());

        format!(
            "{}\n\nInventory List:\n{}\n\nAgent Input:\n{}",
            self.instructions, inventory_json, raw_text
        )
    }
}
