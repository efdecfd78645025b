//! Decide one canonical position value per row, with provenance.

use super::numeric::{format_notional, parse_numeric};
use super::position::{ValueSource, UNAVAILABLE};

/// Reconciled position value.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledValue {
    pub text: String,
    pub num: Option<f64>,
    pub source: ValueSource,
}

impl Default for ReconciledValue {
    fn default() -> Self {
        Self {
            text: UNAVAILABLE.to_string(),
            num: None,
            source: ValueSource::Unavailable,
        }
    }
}

/// Reconcile the scraped value cell with size × mark price.
///
/// `scraped` is `None` when the table has no value column. A non-empty
/// scraped cell always wins, even when it does not parse: the result is then
/// `Scraped` with no numeric value. Only without a scraped cell is the product
/// of size and mark price used.
pub fn reconcile_value(
    scraped: Option<&str>,
    size_num: Option<f64>,
    mark_price_num: Option<f64>,
) -> ReconciledValue {
    let mut value = ReconciledValue::default();

    match (scraped.filter(|s| !s.is_empty()), size_num, mark_price_num) {
        (Some(text), _, _) => {
            value.text = text.to_string();
            value.num = parse_numeric(Some(text));
            value.source = ValueSource::Scraped;
        }
        (None, Some(size), Some(price)) => {
            let product = size * price;
            value.text = format_notional(Some(product));
            value.num = Some(product);
            value.source = ValueSource::Computed;
        }
        _ => {}
    }

    if value.num.is_some() && value.text == UNAVAILABLE {
        value.text = format_notional(value.num);
    }

    value
}
