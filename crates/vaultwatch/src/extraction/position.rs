//! Position records emitted by the extraction pass.

use serde::Serialize;
use std::fmt;

/// Display text used when a column is absent or its cell is empty.
pub const NOT_AVAILABLE: &str = "N/A";

/// Display text used when no position value could be observed or derived.
pub const UNAVAILABLE: &str = "Unavailable";

/// Where a position's value figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    /// Read directly from a position value column.
    Scraped,
    /// Derived as size × mark price.
    Computed,
    /// Neither observed nor derivable.
    Unavailable,
}

impl ValueSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueSource::Scraped => "scraped",
            ValueSource::Computed => "computed",
            ValueSource::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the positions table: a single instrument's open exposure.
///
/// Built once per qualifying row and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    /// Original coin label, trimmed.
    pub coin_display: String,
    /// Canonical ticker (e.g. `BTC` for `BTC-PERP`). Never empty.
    pub coin_symbol: String,
    pub leverage: String,
    pub size_text: String,
    pub size_num: Option<f64>,
    pub mark_price_text: String,
    pub mark_price_num: Option<f64>,
    pub pnl_roe: String,
    /// Dollar-formatted value, the scraped text verbatim, or [`UNAVAILABLE`].
    pub position_value_text: String,
    pub position_value_num: Option<f64>,
    pub position_value_source: ValueSource,
}

impl Position {
    /// Value text as shown to humans, tagged when it is an estimate.
    pub fn value_descriptor(&self) -> String {
        match self.position_value_source {
            ValueSource::Computed => format!("{} (computed)", self.position_value_text),
            _ => self.position_value_text.clone(),
        }
    }
}
