//! The per-institution adapter contract and the token helpers shared by every
//! adapter.
//!
//! An adapter knows one bank's layout: how records start, which dates and
//! amount columns a record carries, and which header labels hold the account
//! details. Everything else (reconstruction, inference, validation, keyword
//! counting) is the shared pipeline's job.

use chrono::NaiveDate;
use passbook_core::{AmountClassifier, AmountToken, Direction, Metadata, PipelineConfig, Transaction};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::document::Grid;
use crate::institution::Institution;
use crate::metadata::MetadataSchema;
use crate::reconstruct::{LineRules, LogicalLine};

/// Where an institution's records are read from.
#[derive(Debug, Clone, Copy)]
pub enum Layout<'a> {
    /// Flattened page text, folded into logical lines by these rules
    Text(&'a LineRules),
    /// Table cells detected by the document reader
    Table,
}

/// One normalized table row: cells trimmed, newlines folded, padded to the
/// adapter's column count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub page: usize,
    pub cells: Vec<String>,
}

impl TableRow {
    pub fn new(page: usize, cells: Vec<String>) -> Self {
        Self { page, cells }
    }

    /// The cell at `index`, or "" past the end.
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }

    pub fn joined(&self) -> String {
        self.cells
            .iter()
            .filter(|c| !c.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Record<'a> {
    Line(&'a LogicalLine),
    Row(&'a TableRow),
}

impl Record<'_> {
    /// Source text for warnings.
    pub fn source(&self) -> String {
        match self {
            Record::Line(line) => line.text.clone(),
            Record::Row(row) => row.joined(),
        }
    }
}

/// A record that looked like a transaction but yielded no balance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}: '{source_text}'")]
pub struct MalformedRecord {
    pub reason: String,
    pub source_text: String,
}

impl MalformedRecord {
    pub fn new(reason: impl Into<String>, record: &Record<'_>) -> Self {
        Self {
            reason: reason.into(),
            source_text: record.source(),
        }
    }
}

/// `Ok(None)` for records that are not transactions (repeated headers,
/// totals), `Err` for records that should have been and could not be read.
pub type RecordResult = Result<Option<Transaction>, MalformedRecord>;

/// Per-run settings an adapter needs while parsing.
#[derive(Debug, Clone)]
pub struct ParseContext {
    pub classifier: AmountClassifier,
    pub missing: String,
}

impl ParseContext {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            classifier: config.classifier(),
            missing: config.missing_value.clone(),
        }
    }
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

pub trait FormatAdapter: Send + Sync {
    fn institution(&self) -> Institution;

    fn layout(&self) -> Layout<'_>;

    /// Upper-case bank-name markers used to recognise a statement.
    fn markers(&self) -> &[&'static str];

    fn metadata_schema(&self) -> &MetadataSchema;

    fn parse_record(&self, record: Record<'_>, ctx: &ParseContext) -> RecordResult;

    fn detect(&self, header: &str) -> bool {
        let upper = header.to_uppercase();
        self.markers().iter().any(|m| upper.contains(m))
    }

    /// Header fields plus whatever positional heuristics the layout needs.
    fn parse_metadata_header(&self, header: &[&str], ctx: &ParseContext) -> Metadata {
        self.metadata_schema().extract(header, &ctx.missing)
    }

    /// Turn every page's cell grid into rows, in document order. Tables run
    /// on across page breaks, so the adapter sees all pages in one call. The
    /// default trims cells, folds embedded newlines and drops blank rows.
    fn normalize_tables(&self, tables: &[(usize, &Grid)]) -> Vec<TableRow> {
        tables
            .iter()
            .flat_map(|&(page, grid)| {
                grid.iter()
                    .map(move |row| TableRow::new(page, row.iter().map(|c| clean_cell(c.as_deref())).collect()))
            })
            .filter(|row| !row.is_blank())
            .collect()
    }
}

pub(crate) fn clean_cell(cell: Option<&str>) -> String {
    cell.unwrap_or("").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First format in `formats` that parses `token`.
pub(crate) fn parse_date(token: &str, formats: &[&str]) -> Option<NaiveDate> {
    let token = token.trim();
    formats
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(token, f).ok())
}

pub(crate) fn join(tokens: &[&str]) -> String {
    tokens.join(" ")
}

/// Amount columns found at the tail of a record's tokens.
#[derive(Debug, Clone)]
pub(crate) struct AmountColumns {
    pub balance: AmountToken,
    /// Columns before the balance in printed order; `None` where a `-`
    /// placeholder stood
    pub preceding: Vec<Option<AmountToken>>,
    /// Index of the first token consumed as a column
    pub first: usize,
    pub balance_at: usize,
}

impl AmountColumns {
    /// Locate the balance (the last amount token at or after `from`) and walk
    /// back over the adjacent amount tokens, at most `max_columns` in total
    /// including the balance. A `-` placeholder fills a column slot.
    pub fn locate(
        tokens: &[&str],
        from: usize,
        classifier: &AmountClassifier,
        max_columns: usize,
    ) -> Option<Self> {
        let (balance_at, balance) = (from..tokens.len())
            .rev()
            .map(|i| (i, classifier.classify(tokens[i])))
            .find(|(_, t)| t.is_amount())?;

        let mut preceding = Vec::new();
        let mut first = balance_at;
        while preceding.len() + 1 < max_columns && first > from {
            let candidate = tokens[first - 1];
            if candidate == "-" {
                preceding.push(None);
            } else {
                let token = classifier.classify(candidate);
                if !token.is_amount() {
                    break;
                }
                preceding.push(Some(token));
            }
            first -= 1;
        }
        preceding.reverse();

        Some(Self {
            balance,
            preceding,
            first,
            balance_at,
        })
    }
}

/// The balance value, with a `Dr` marker read as an overdrawn (negative)
/// balance.
pub(crate) fn signed_balance(token: &AmountToken) -> Option<Decimal> {
    let value = token.value?;
    Some(match token.suffix {
        Some(Direction::Debit) => -value.abs(),
        _ => value,
    })
}

/// Apply separate debit and credit cells to `txn`.
///
/// One non-zero side is an explicit posting. Both sides filled is
/// ambiguous: the debit is kept as the amount and the credit as the
/// alternate reading, left for the inferencer to settle. Neither side leaves
/// the amount to be derived from the balance move.
pub(crate) fn apply_split_columns(
    txn: Transaction,
    debit: &str,
    credit: &str,
    classifier: &AmountClassifier,
) -> Transaction {
    let read = |cell: &str| {
        classifier
            .parse_cell(cell)
            .and_then(|t| t.value)
            .map(|v| v.abs())
            .filter(|v| !v.is_zero())
    };
    match (read(debit), read(credit)) {
        (Some(d), None) => txn.with_posting(Direction::Debit, d),
        (None, Some(c)) => txn.with_posting(Direction::Credit, c),
        (Some(d), Some(c)) => txn.with_amount(Some(d)).with_alternate(Some(c)),
        (None, None) => txn,
    }
}
