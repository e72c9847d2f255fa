use rust_decimal::Decimal;

use crate::domain::line_item::QuotationLineItem;

/// Everything the renderer needs for one quotation. Built per render call and
/// dropped once the bytes are produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuotationDocument {
    pub items: Vec<QuotationLineItem>,
    pub customer_name: Option<String>,
    pub customer_location: Option<String>,
    pub date: Option<String>,
    pub reference: Option<String>,
    pub include_info_page: bool,
}

impl QuotationDocument {
    pub fn new(items: Vec<QuotationLineItem>) -> Self {
        Self { items, ..Self::default() }
    }

    pub fn with_customer(mut self, name: Option<String>, location: Option<String>) -> Self {
        self.customer_name = name.filter(|value| !value.trim().is_empty());
        self.customer_location = location.filter(|value| !value.trim().is_empty());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_info_page(mut self, include: bool) -> Self {
        self.include_info_page = include;
        self
    }

    /// Sum of the item amounts as given. `None` if the sum overflows.
    pub fn total(&self) -> Option<Decimal> {
        self.items.iter().try_fold(Decimal::ZERO, |total, item| total.checked_add(item.amount))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::QuotationDocument;
    use crate::domain::line_item::QuotationLineItem;

    #[test]
    fn total_sums_amounts_not_rate_times_quantity() {
        let mut mismatched = QuotationLineItem::priced("Camera", 2, Decimal::new(3500, 0));
        mismatched.amount = Decimal::new(1000, 0);
        let document = QuotationDocument::new(vec![
            mismatched,
            QuotationLineItem::priced("Adaptor", 2, Decimal::new(300, 0)),
        ]);

        assert_eq!(document.total(), Some(Decimal::new(1600, 0)));
    }

    #[test]
    fn total_is_none_when_amounts_overflow() {
        let mut first = QuotationLineItem::priced("Camera", 1, Decimal::ONE);
        first.amount = Decimal::from_i128_with_scale(50_000_000_000_000_000_000_000_000_000, 0);
        let second = first.clone();

        assert_eq!(QuotationDocument::new(vec![first, second]).total(), None);
    }

    #[test]
    fn blank_customer_fields_are_dropped() {
        let document = QuotationDocument::new(Vec::new())
            .with_customer(Some("  ".to_string()), Some("Calicut".to_string()));

        assert_eq!(document.customer_name, None);
        assert_eq!(document.customer_location.as_deref(), Some("Calicut"));
    }
}
