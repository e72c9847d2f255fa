use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{FieldViolation, ValidationError};

/// Top-level key of the inventory file that holds pricing rules, not items.
pub const RESERVED_GROUP: &str = "rules";

/// Subgroup a bare category is filed under.
pub const DEFAULT_SUBGROUP: &str = "general";

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InventoryItemId(pub String);

impl InventoryItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for InventoryItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A priced catalog entry the extractors may quote from.
///
/// `category` uses the `group/subgroup` path form the inventory file is keyed by.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub name: String,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl InventoryItem {
    /// Splits `category` into its group and subgroup. A category without a
    /// separator is filed under [`DEFAULT_SUBGROUP`].
    pub fn category_path(&self) -> (&str, &str) {
        match self.category.split_once('/') {
            Some((group, subgroup)) => (group, subgroup),
            None => (self.category.as_str(), DEFAULT_SUBGROUP),
        }
    }

    /// Rewrites a bare category into its `group/general` path, the form it
    /// reads back as once the inventory file is saved.
    pub fn normalize_category(&mut self) {
        if !self.category.trim().is_empty() && !self.category.contains('/') {
            self.category = format!("{}/{DEFAULT_SUBGROUP}", self.category);
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Vec::new();

        if self.id.0.trim().is_empty() {
            violations.push(FieldViolation::new("id", "must not be empty"));
        }
        if self.name.trim().is_empty() {
            violations.push(FieldViolation::new("name", "must not be empty"));
        }
        match self.category.split_once('/') {
            _ if self.category.trim().is_empty() => {
                violations.push(FieldViolation::new("category", "must not be empty"));
            }
            Some((group, subgroup)) if !group.trim().is_empty() && !subgroup.trim().is_empty() => {
                if group == RESERVED_GROUP {
                    violations.push(FieldViolation::new("category", "group `rules` is reserved"));
                }
            }
            _ => violations.push(FieldViolation::new("category", "must be a `group/subgroup` path")),
        }
        if self.price.is_sign_negative() {
            violations.push(FieldViolation::new("price", "must be non-negative"));
        }
        if self.unit.trim().is_empty() {
            violations.push(FieldViolation::new("unit", "must not be empty"));
        }

        ValidationError::from_violations(violations)
    }
}
