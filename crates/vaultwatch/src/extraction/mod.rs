//! Tabular extraction and normalization.
//!
//! Turns the outer HTML of a positions table into ordered [`Position`]
//! records: headers are resolved to canonical fields, cell text is pulled per
//! row, numeric text is normalized and the position value is reconciled
//! between the scraped column and size × mark price.

pub mod headers;
pub mod numeric;
pub mod position;
pub mod reconcile;
pub mod rows;

pub use headers::{resolve_headers, CanonicalField, HeaderMap};
pub use numeric::{format_notional, parse_numeric};
pub use position::{Position, ValueSource, NOT_AVAILABLE, UNAVAILABLE};
pub use reconcile::{reconcile_value, ReconciledValue};
pub use rows::{canonical_symbol, extract_positions, RawRow, SkipReason};
