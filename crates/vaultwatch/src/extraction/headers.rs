//! Header resolution: map raw column headers to canonical fields.
//!
//! Column wording drifts between page revisions ("Coin", "Asset", "Market"),
//! so each canonical field carries an ordered alias list and a header is
//! matched by substring after normalization. The alias table is plain data;
//! [`resolve_headers`] is the only matcher.

use serde::Serialize;

/// A semantic column the extraction pass understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Coin,
    Leverage,
    Size,
    MarkPrice,
    PnlRoe,
    PositionValue,
}

impl CanonicalField {
    /// All fields, in matching order.
    pub const ALL: [CanonicalField; 6] = [
        CanonicalField::Coin,
        CanonicalField::Leverage,
        CanonicalField::Size,
        CanonicalField::MarkPrice,
        CanonicalField::PnlRoe,
        CanonicalField::PositionValue,
    ];

    /// Fields a table must expose to count as a positions table.
    pub const REQUIRED: [CanonicalField; 5] = [
        CanonicalField::Coin,
        CanonicalField::Leverage,
        CanonicalField::Size,
        CanonicalField::MarkPrice,
        CanonicalField::PnlRoe,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CanonicalField::Coin => "coin",
            CanonicalField::Leverage => "leverage",
            CanonicalField::Size => "size",
            CanonicalField::MarkPrice => "mark_price",
            CanonicalField::PnlRoe => "pnl_roe",
            CanonicalField::PositionValue => "position_value",
        }
    }

    /// Substrings accepted for this field, checked in order.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::Coin => &["coin", "asset", "market", "pair"],
            CanonicalField::Leverage => &["leverage", "lev"],
            CanonicalField::Size => &["size", "position size", "qty", "quantity"],
            CanonicalField::MarkPrice => &["mark price", "mark", "price"],
            CanonicalField::PnlRoe => &["pnl (roe %)", "pnl", "roe"],
            CanonicalField::PositionValue => &["position value", "value", "notional"],
        }
    }

    fn slot(&self) -> usize {
        *self as usize
    }
}

/// Column index per canonical field for one table.
///
/// At most one column per field; the earliest matching header wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    columns: [Option<usize>; 6],
}

impl HeaderMap {
    /// Column index of `field`, if any header matched it.
    pub fn get(&self, field: CanonicalField) -> Option<usize> {
        self.columns[field.slot()]
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.get(field).is_some()
    }

    /// Whether every required field is mapped.
    pub fn is_positions_table(&self) -> bool {
        CanonicalField::REQUIRED.iter().all(|f| self.contains(*f))
    }

    /// Required fields that no header matched.
    pub fn missing_required(&self) -> Vec<CanonicalField> {
        CanonicalField::REQUIRED
            .iter()
            .copied()
            .filter(|f| !self.contains(*f))
            .collect()
    }
}

/// Collapse whitespace runs, trim and lowercase a header cell.
pub fn normalize_header(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Build a [`HeaderMap`] from one table's header texts, in column order.
///
/// Each header is assigned to the first not-yet-mapped field (in
/// [`CanonicalField::ALL`] order) that has an alias occurring in it.
pub fn resolve_headers<S: AsRef<str>>(headers: &[S]) -> HeaderMap {
    let mut map = HeaderMap::default();

    for (idx, header) in headers.iter().enumerate() {
        let normalized = normalize_header(header.as_ref());
        for field in CanonicalField::ALL {
            if map.contains(field) {
                continue;
            }
            if field.aliases().iter().any(|alias| normalized.contains(alias)) {
                map.columns[field.slot()] = Some(idx);
                break;
            }
        }
    }

    map
}
