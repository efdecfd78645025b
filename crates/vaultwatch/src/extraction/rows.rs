//! Row extraction: walk table markup and build [`Position`] records.
//!
//! Every `table` in the markup is a candidate; tables whose headers do not
//! cover the required fields are skipped, so unrelated tables elsewhere on the
//! page never leak rows into the result. Rows from all qualifying tables are
//! concatenated in document order.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, warn};

use super::headers::{resolve_headers, CanonicalField, HeaderMap};
use super::numeric::parse_numeric;
use super::position::{Position, NOT_AVAILABLE};
use super::reconcile::reconcile_value;

static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static TH_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").unwrap());
static TBODY_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tbody").unwrap());
static TR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static TD_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static ROLE_CELL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[role="cell"], [role="gridcell"]"#).unwrap());

static TABLE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(/?)(table|tbody)[\s>/]").unwrap());

/// Why a table or row contributed nothing. Logged, never escalated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Candidate has no `th` header cells at all.
    NoHeaders,
    /// Headers do not cover every required field.
    SelectionMiss { missing: Vec<CanonicalField> },
    /// Row has no extractable cells.
    RowMalformed,
    /// Coin cell is empty.
    BlankCoin,
    /// Coin label canonicalizes to an empty symbol.
    EmptySymbol { label: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoHeaders => write!(f, "no header cells"),
            SkipReason::SelectionMiss { missing } => {
                let names: Vec<_> = missing.iter().map(|m| m.name()).collect();
                write!(f, "missing required columns: {}", names.join(", "))
            }
            SkipReason::RowMalformed => write!(f, "row has no cells"),
            SkipReason::BlankCoin => write!(f, "blank coin cell"),
            SkipReason::EmptySymbol { label } => write!(f, "no symbol in coin label {label:?}"),
        }
    }
}

/// Cell texts of one table row, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    cells: Vec<String>,
}

impl RawRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Text of `field`'s column, or `""` when unmapped or out of range.
    pub fn field<'a>(&'a self, headers: &HeaderMap, field: CanonicalField) -> &'a str {
        headers
            .get(field)
            .and_then(|idx| self.cells.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Like [`RawRow::field`], substituting `N/A` for empty text.
    fn display_field(&self, headers: &HeaderMap, field: CanonicalField) -> String {
        match self.field(headers, field) {
            "" => NOT_AVAILABLE.to_string(),
            text => text.to_string(),
        }
    }
}

/// Canonical ticker for a coin label: `"BTC-PERP"` → `"BTC"`, `"eth / usd"` → `"ETH"`.
///
/// Uppercases, removes `PERP`, cuts at the first `/`, `-` and space in turn,
/// then drops everything outside `[A-Z0-9]`. May return an empty string.
pub fn canonical_symbol(label: &str) -> String {
    let mut text = label.trim().to_uppercase().replace("PERP", "");
    for splitter in ['/', '-', ' '] {
        if let Some((head, _)) = text.split_once(splitter) {
            text = head.to_string();
        }
    }
    text.chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect()
}

/// Extract every position from the qualifying tables in `html`.
///
/// Never fails: non-position tables and unusable rows are skipped. An empty
/// result is valid and only logged.
pub fn extract_positions(html: &str) -> Vec<Position> {
    let document = Html::parse_document(html);
    let explicit_tbody = explicit_tbody_flags(html);

    let mut tables: Vec<ElementRef> = document.select(&TABLE_SEL).collect();
    if tables.is_empty() {
        tables.push(document.root_element());
    }

    let mut positions = Vec::new();
    for (table_idx, table) in tables.into_iter().enumerate() {
        let has_tbody = explicit_tbody.get(table_idx).copied().unwrap_or(true);
        match extract_table(table, has_tbody) {
            Ok(mut rows) => positions.append(&mut rows),
            Err(reason) => debug!("skipping table {table_idx}: {reason}"),
        }
    }

    if positions.is_empty() {
        warn!("no rows were parsed from the positions table");
    }
    positions
}

/// For each `table` start tag in source order, whether the markup itself
/// opens a `tbody` inside it.
///
/// The HTML parser inserts a `tbody` into every bare table, so the parsed
/// tree cannot tell the two apart.
fn explicit_tbody_flags(html: &str) -> Vec<bool> {
    let mut flags = Vec::new();
    let mut open: Vec<usize> = Vec::new();

    for caps in TABLE_TAG_RE.captures_iter(html) {
        let closing = !caps[1].is_empty();
        let is_table = caps[2].eq_ignore_ascii_case("table");
        match (is_table, closing) {
            (true, false) => {
                open.push(flags.len());
                flags.push(false);
            }
            (true, true) => {
                open.pop();
            }
            (false, false) => {
                if let Some(&idx) = open.last() {
                    flags[idx] = true;
                }
            }
            (false, true) => {}
        }
    }
    flags
}

/// Extract positions from one candidate table.
fn extract_table(table: ElementRef, has_tbody: bool) -> Result<Vec<Position>, SkipReason> {
    let header_texts: Vec<String> = table.select(&TH_SEL).map(cell_text).collect();
    if header_texts.is_empty() {
        return Err(SkipReason::NoHeaders);
    }

    let headers = resolve_headers(&header_texts);
    if !headers.is_positions_table() {
        return Err(SkipReason::SelectionMiss {
            missing: headers.missing_required(),
        });
    }

    let positions = data_rows(table, has_tbody)
        .into_iter()
        .enumerate()
        .filter_map(|(row_idx, row)| {
            let raw = row_cells(row);
            match build_position(&raw, &headers) {
                Ok(position) => Some(position),
                Err(reason) => {
                    debug!("skipping row {row_idx}: {reason}");
                    None
                }
            }
        })
        .collect();

    Ok(positions)
}

/// Rows of the first `tbody` when the markup has one, else every row after
/// the first. A single-row table without a `tbody` has no data rows.
fn data_rows(table: ElementRef, has_tbody: bool) -> Vec<ElementRef> {
    if has_tbody {
        if let Some(tbody) = table.select(&TBODY_SEL).next() {
            return tbody.select(&TR_SEL).collect();
        }
    }
    table.select(&TR_SEL).skip(1).collect()
}

/// Cell texts of a row: `td` cells, falling back to ARIA cell roles.
fn row_cells(row: ElementRef) -> RawRow {
    let mut cells: Vec<String> = row.select(&TD_SEL).map(cell_text).collect();
    if cells.is_empty() {
        cells = row.select(&ROLE_CELL_SEL).map(cell_text).collect();
    }
    RawRow::new(cells)
}

/// Visible text of an element: trimmed text nodes joined by single spaces.
fn cell_text(el: ElementRef) -> String {
    el.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turn one raw row into a [`Position`].
pub fn build_position(row: &RawRow, headers: &HeaderMap) -> Result<Position, SkipReason> {
    if row.is_empty() {
        return Err(SkipReason::RowMalformed);
    }

    let coin_raw = row.field(headers, CanonicalField::Coin);
    if coin_raw.is_empty() {
        return Err(SkipReason::BlankCoin);
    }
    let coin_symbol = canonical_symbol(coin_raw);
    if coin_symbol.is_empty() {
        return Err(SkipReason::EmptySymbol {
            label: coin_raw.to_string(),
        });
    }

    let size_text = row.display_field(headers, CanonicalField::Size);
    let mark_price_text = row.display_field(headers, CanonicalField::MarkPrice);
    let size_num = parse_numeric(Some(&size_text));
    let mark_price_num = parse_numeric(Some(&mark_price_text));

    let scraped = headers
        .contains(CanonicalField::PositionValue)
        .then(|| row.field(headers, CanonicalField::PositionValue));
    let value = reconcile_value(scraped, size_num, mark_price_num);

    Ok(Position {
        coin_display: coin_raw.trim().to_string(),
        coin_symbol,
        leverage: row.display_field(headers, CanonicalField::Leverage),
        size_text,
        size_num,
        mark_price_text,
        mark_price_num,
        pnl_roe: row.display_field(headers, CanonicalField::PnlRoe),
        position_value_text: value.text,
        position_value_num: value.num,
        position_value_source: value.source,
    })
}
