//! Axis Bank statement (table)
//!
//! Each page's table opens with a header row naming the columns:
//!   Tran Date | Chq No | Particulars | Debit | Credit | Balance | Init. Br
//!
//! Columns are located by header name. A page without a header row keeps the
//! mapping of the last header seen; before any header, the order above applies.

use passbook_core::{Metadata, Transaction, keys};

use crate::adapter::{
    FormatAdapter, Layout, MalformedRecord, ParseContext, Record, RecordResult, TableRow,
    apply_split_columns, clean_cell, parse_date, signed_balance,
};
use crate::document::Grid;
use crate::institution::Institution;
use crate::metadata::{MetadataSchema, first_name_line};

const DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y"];

/// Canonical column order and the header text that identifies each column.
const COLUMN_LABELS: [&str; 7] = ["tran date", "chq", "particulars", "debit", "credit", "balance", "init"];
const TRAN_DATE: usize = 0;
const CHQ_NO: usize = 1;
const PARTICULARS: usize = 2;
const DEBIT: usize = 3;
const CREDIT: usize = 4;
const BALANCE: usize = 5;
const INIT_BRANCH: usize = 6;

pub struct AxisAdapter {
    schema: MetadataSchema,
}

impl AxisAdapter {
    pub fn new() -> Result<Self, regex::Error> {
        let schema = MetadataSchema::new("AXIS BANK")
            .field("Customer No", r"(?mi)Customer\s*No\s*:\s*(\d+)")?
            .field("Scheme", r"(?mi)Scheme\s*:\s*([\w-]+)")?
            .field(keys::CURRENCY, r"(?mi)Currency\s*:\s*([A-Z]+)")?
            .field(keys::ACCOUNT_NUMBER, r"(?mi)Statement\s+of\s+Account\s+No\s*:?\s*(\d+)")?
            .field(
                keys::STATEMENT_PERIOD,
                r"(?mi)period\s*\(\s*From\s*:\s*(\S+)\s+To\s*:\s*([^)\s]+)\s*\)",
            )?;
        Ok(Self { schema })
    }
}

/// Map header cells to canonical positions, if this row is a header.
fn header_positions(cells: &[String]) -> Option<[Option<usize>; 7]> {
    let lower: Vec<String> = cells.iter().map(|c| c.to_ascii_lowercase()).collect();
    if !lower.iter().any(|c| c == "particulars" || c.starts_with("tran date")) {
        return None;
    }
    Some(COLUMN_LABELS.map(|label| lower.iter().position(|c| c.starts_with(label))))
}

impl FormatAdapter for AxisAdapter {
    fn institution(&self) -> Institution {
        Institution::Axis
    }

    fn layout(&self) -> Layout<'_> {
        Layout::Table
    }

    fn markers(&self) -> &[&'static str] {
        &["AXIS BANK"]
    }

    fn metadata_schema(&self) -> &MetadataSchema {
        &self.schema
    }

    fn normalize_tables(&self, tables: &[(usize, &Grid)]) -> Vec<TableRow> {
        let mut positions: Option<[Option<usize>; 7]> = None;
        let mut rows = Vec::new();
        for &(page, grid) in tables {
            for raw in grid {
                let cells: Vec<String> = raw.iter().map(|c| clean_cell(c.as_deref())).collect();
                if cells.iter().all(|c| c.is_empty()) {
                    continue;
                }
                if let Some(found) = header_positions(&cells) {
                    if positions.is_some_and(|p| p != found) {
                        log::debug!("axis column order changed on page {}", page + 1);
                    }
                    positions = Some(found);
                    continue;
                }
                let projected = match positions {
                    Some(map) => map
                        .iter()
                        .map(|at| at.and_then(|i| cells.get(i).cloned()).unwrap_or_default())
                        .collect(),
                    None => {
                        let mut cells = cells;
                        cells.resize(COLUMN_LABELS.len(), String::new());
                        cells
                    }
                };
                rows.push(TableRow::new(page, projected));
            }
        }
        rows
    }

    fn parse_record(&self, record: Record<'_>, ctx: &ParseContext) -> RecordResult {
        let Record::Row(row) = record else {
            return Ok(None);
        };
        let particulars = row.cell(PARTICULARS).to_uppercase();
        let balance = ctx
            .classifier
            .parse_cell(row.cell(BALANCE))
            .and_then(|t| signed_balance(&t));

        if particulars.contains("OPENING BALANCE") {
            let balance = balance
                .ok_or_else(|| MalformedRecord::new("opening balance row without a balance", &record))?;
            return Ok(Some(Transaction::opening_balance(balance)));
        }
        if particulars.contains("CLOSING BALANCE") || particulars.contains("TRANSACTION TOTAL") {
            return Ok(None);
        }

        let date = parse_date(row.cell(TRAN_DATE), DATE_FORMATS);
        let Some(balance) = balance else {
            return match date {
                Some(_) => Err(MalformedRecord::new("no balance in row", &record)),
                None => Ok(None),
            };
        };

        log::trace!("axis row from branch {}", row.cell(INIT_BRANCH));
        let txn = Transaction::new(row.cell(PARTICULARS), balance)
            .with_date(date)
            .with_reference(Some(row.cell(CHQ_NO).to_string()));
        Ok(Some(apply_split_columns(
            txn,
            row.cell(DEBIT),
            row.cell(CREDIT),
            &ctx.classifier,
        )))
    }

    fn parse_metadata_header(&self, header: &[&str], ctx: &ParseContext) -> Metadata {
        let mut md = self.schema.extract(header, &ctx.missing);
        if let Some(holder) = first_name_line(header, &["AXIS BANK", "STATEMENT"]) {
            md.set_if_missing(keys::ACCOUNT_HOLDER, holder);
            let address: Vec<&str> = header
                .iter()
                .skip_while(|l| **l != holder)
                .skip(1)
                .take_while(|l| !l.contains(':'))
                .copied()
                .collect();
            md.set_if_missing(keys::ACCOUNT_HOLDER_ADDRESS, address.join(" "));
        }
        md
    }
}
