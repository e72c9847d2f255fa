use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{FieldViolation, ValidationError};

/// One row of a quotation.
///
/// `amount` is trusted as given; it is not reconciled against `rate * quantity`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationLineItem {
    pub description: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl QuotationLineItem {
    /// Builds a line whose amount is `rate * quantity`.
    pub fn priced(description: impl Into<String>, quantity: u32, rate: Decimal) -> Self {
        Self { description: description.into(), quantity, rate, amount: rate * Decimal::from(quantity) }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::from_violations(self.violations(""))
    }

    pub(crate) fn violations(&self, prefix: &str) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        if self.description.trim().is_empty() {
            violations.push(FieldViolation::new(format!("{prefix}description"), "must not be empty"));
        }
        if self.quantity == 0 {
            violations.push(FieldViolation::new(format!("{prefix}quantity"), "must be positive"));
        }
        if self.rate.is_sign_negative() {
            violations.push(FieldViolation::new(format!("{prefix}rate"), "must be non-negative"));
        }
        if self.amount.is_sign_negative() {
            violations.push(FieldViolation::new(format!("{prefix}amount"), "must be non-negative"));
        }
        violations
    }
}

/// Line item as submitted by a caller, where `amount` may be left out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemPayload {
    pub description: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
}

impl LineItemPayload {
    /// Fills a missing amount from `rate * quantity`. `None` when that product
    /// does not fit a `Decimal`.
    pub fn into_line_item(self) -> Option<QuotationLineItem> {
        let amount = match self.amount {
            Some(amount) => amount,
            None => self.rate.checked_mul(Decimal::from(self.quantity))?,
        };
        Some(QuotationLineItem {
            description: self.description,
            quantity: self.quantity,
            rate: self.rate,
            amount,
        })
    }
}

impl From<QuotationLineItem> for LineItemPayload {
    fn from(item: QuotationLineItem) -> Self {
        Self { description: item.description, quantity: item.quantity, rate: item.rate, amount: Some(item.amount) }
    }
}

/// Converts caller payloads into line items, collecting every violation with
/// an `items[i].` prefix. Amounts whose running total would overflow are
/// reported on the item that tips it over.
pub fn validate_payloads(
    payloads: Vec<LineItemPayload>,
) -> Result<Vec<QuotationLineItem>, ValidationError> {
    let mut violations = Vec::new();
    let mut items = Vec::with_capacity(payloads.len());
    let mut total = Some(Decimal::ZERO);

    for (index, payload) in payloads.into_iter().enumerate() {
        let prefix = format!("items[{index}].");
        let Some(item) = payload.into_line_item() else {
            violations.push(FieldViolation::new(
                format!("{prefix}amount"),
                "rate times quantity is out of range",
            ));
            continue;
        };

        violations.extend(item.violations(&prefix));
        if let Some(running) = total {
            total = running.checked_add(item.amount);
            if total.is_none() {
                violations.push(FieldViolation::new(
                    format!("{prefix}amount"),
                    "pushes the quotation total out of range",
                ));
            }
        }
        items.push(item);
    }

    ValidationError::from_violations(violations)?;
    Ok(items)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{validate_payloads, LineItemPayload, QuotationLineItem};

    #[test]
    fn priced_line_multiplies_rate_by_quantity() {
        let line = QuotationLineItem::priced("Coaxial Cable", 700, Decimal::new(20, 0));
        assert_eq!(line.amount, Decimal::new(14_000, 0));
    }

    #[test]
    fn decodes_integer_and_fractional_json_numbers() {
        let line: QuotationLineItem = serde_json::from_str(
            r#"{"description":"HDMI 4k","quantity":1,"rate":650,"amount":650.5}"#,
        )
        .expect("decode");

        assert_eq!(line.rate, Decimal::new(650, 0));
        assert_eq!(line.amount, Decimal::new(6505, 1));
    }

    #[test]
    fn missing_amount_is_a_decode_error_for_line_items() {
        let result = serde_json::from_str::<QuotationLineItem>(
            r#"{"description":"HDMI 4k","quantity":1,"rate":650}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn payload_without_amount_is_filled_from_rate() {
        let payload: LineItemPayload =
            serde_json::from_str(r#"{"description":"Patch cord","quantity":4,"rate":200}"#)
                .expect("decode");

        assert_eq!(payload.into_line_item().expect("in range").amount, Decimal::new(800, 0));
    }

    #[test]
    fn payload_amount_is_kept_even_when_it_disagrees() {
        let payload = LineItemPayload {
            description: "Nvr configuration charge".to_string(),
            quantity: 2,
            rate: Decimal::new(1000, 0),
            amount: Some(Decimal::new(1500, 0)),
        };

        assert_eq!(payload.into_line_item().expect("in range").amount, Decimal::new(1500, 0));
    }

    #[test]
    fn validate_payloads_prefixes_violations_with_item_index() {
        let error = validate_payloads(vec![
            LineItemPayload {
                description: "Camera".to_string(),
                quantity: 1,
                rate: Decimal::new(3500, 0),
                amount: None,
            },
            LineItemPayload {
                description: " ".to_string(),
                quantity: 0,
                rate: Decimal::new(10, 0),
                amount: None,
            },
        ])
        .expect_err("second payload is invalid");

        let fields: Vec<_> = error.violations.iter().map(|v| v.field.clone()).collect();
        assert_eq!(fields, vec!["items[1].description", "items[1].quantity"]);
    }

    #[test]
    fn overflowing_rate_times_quantity_is_a_violation() {
        let payload: LineItemPayload = serde_json::from_str(
            r#"{"description":"Bulk cable","quantity":4000000000,"rate":70000000000000000000}"#,
        )
        .expect("decode");

        let error = validate_payloads(vec![payload]).expect_err("product overflows");
        let fields: Vec<_> = error.violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["items[0].amount"]);
    }

    #[test]
    fn overflowing_total_is_reported_on_the_item_that_tips_it() {
        let huge = Decimal::MAX - Decimal::ONE;
        let payload = |description: &str| LineItemPayload {
            description: description.to_string(),
            quantity: 1,
            rate: Decimal::ONE,
            amount: Some(huge),
        };

        let error = validate_payloads(vec![payload("First"), payload("Second")])
            .expect_err("total overflows");
        assert_eq!(error.violations.len(), 1);
        assert_eq!(error.violations[0].field, "items[1].amount");
    }
}
