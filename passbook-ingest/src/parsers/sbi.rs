//! State Bank of India statement (table)
//!
//! Expected table columns (header row repeated on every page):
//!   Post Date | Value Date | Description | Cheque No/Reference | Debit | Credit | Balance
//!
//! Descriptions that overflow a cell come through as an extra row holding
//! only the description; those are folded into the row above, even when the
//! row above is on the previous page.

use passbook_core::{Metadata, Transaction, keys};

use crate::adapter::{
    FormatAdapter, Layout, MalformedRecord, ParseContext, Record, RecordResult, TableRow,
    apply_split_columns, clean_cell, parse_date, signed_balance,
};
use crate::document::Grid;
use crate::institution::Institution;
use crate::metadata::MetadataSchema;

const DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d %b %Y", "%d/%m/%Y", "%d-%b-%Y"];

const COLUMNS: usize = 7;
const POST_DATE: usize = 0;
const VALUE_DATE: usize = 1;
const DESCRIPTION: usize = 2;
const REFERENCE: usize = 3;
const DEBIT: usize = 4;
const CREDIT: usize = 5;
const BALANCE: usize = 6;

const HEADER_CELLS: &[&str] = &[
    "post date",
    "txn date",
    "value date",
    "description",
    "details",
    "debit",
    "credit",
    "balance",
];

/// Header lines that end the holder's address block.
const ADDRESS_STOP: &[&str] = &[
    "BRANCH CODE",
    "CIF",
    "ACCOUNT NO",
    "IFSC",
    "DATE OF STATEMENT",
    "TIME OF STATEMENT",
    "MICR CODE",
    "BALANCE",
    "STATEMENT FROM",
];

pub struct SbiAdapter {
    schema: MetadataSchema,
}

impl SbiAdapter {
    pub fn new() -> Result<Self, regex::Error> {
        let schema = MetadataSchema::new("STATE BANK OF INDIA")
            .field(keys::ACCOUNT_HOLDER, r"(?mi)Account\s+Name\s*:\s*(.+?)\s*$")?
            .field("Branch Code", r"(?mi)Branch\s*Code\s*:\s*(\d+)")?
            .field("Branch Email", r"(?mi)Branch\s*Email\s*:\s*([\w.-]+@[\w.-]+)")?
            .field("Branch Phone", r"(?mi)Branch\s*Phone\s*:\s*(\d+)")?
            .field("CIF No", r"(?mi)CIF\s*No\.?\s*:\s*(\d+)")?
            .field(keys::ACCOUNT_NUMBER, r"(?mi)Account\s*No\.?\s*:\s*(\d+)")?
            .field("Product", r"(?mi)Product\s*:\s*(.+?)\s*$")?
            .field("IFSC Code", r"(?mi)IFSC\s*Code\s*:\s*([A-Z0-9]+)")?
            .field("MICR Code", r"(?mi)MICR\s*Code\s*:\s*(\d+)")?
            .field(keys::CURRENCY, r"(?mi)Currency\s*:\s*([A-Z]+)")?
            .field("Account Status", r"(?mi)Account\s*Status\s*:\s*(\w+)")?
            .field("Nominee Name", r"(?mi)Nominee\s*Name\s*:\s*(.+?)\s*$")?
            .field("CKYC No", r"(?mi)CKYC\s*No\.?\s*:\s*(.+?)\s*$")?
            .field("Email", r"(?mi)^Email\s*:\s*(\S+)")?
            .field(
                keys::STATEMENT_PERIOD,
                r"(?mi)Statement\s*From\s*:\s*(\d{2}-\d{2}-\d{4})\s*To\s*(\d{2}-\d{2}-\d{4})",
            )?;
        Ok(Self { schema })
    }
}

fn is_header_row(cells: &[String]) -> bool {
    cells
        .iter()
        .any(|c| HEADER_CELLS.contains(&c.to_ascii_lowercase().as_str()))
}

/// Only the description is filled: overflow from the row above.
fn is_overflow_row(cells: &[String]) -> bool {
    !cells[DESCRIPTION].is_empty()
        && [POST_DATE, VALUE_DATE, DEBIT, CREDIT, BALANCE]
            .iter()
            .all(|&i| cells[i].is_empty())
}

impl FormatAdapter for SbiAdapter {
    fn institution(&self) -> Institution {
        Institution::Sbi
    }

    fn layout(&self) -> Layout<'_> {
        Layout::Table
    }

    fn markers(&self) -> &[&'static str] {
        &["STATE BANK OF INDIA"]
    }

    fn metadata_schema(&self) -> &MetadataSchema {
        &self.schema
    }

    fn normalize_tables(&self, tables: &[(usize, &Grid)]) -> Vec<TableRow> {
        let mut rows: Vec<TableRow> = Vec::new();
        for &(page, grid) in tables {
            for raw in grid {
                let mut cells: Vec<String> = raw.iter().map(|c| clean_cell(c.as_deref())).collect();
                cells.resize(COLUMNS, String::new());
                cells.truncate(COLUMNS);

                if cells.iter().all(|c| c.is_empty()) || is_header_row(&cells) {
                    continue;
                }
                if is_overflow_row(&cells) {
                    if let Some(prev) = rows.last_mut() {
                        let extra = std::mem::take(&mut cells[DESCRIPTION]);
                        prev.cells[DESCRIPTION] = format!("{} {}", prev.cells[DESCRIPTION], extra)
                            .trim()
                            .to_string();
                        continue;
                    }
                }
                rows.push(TableRow::new(page, cells));
            }
        }
        rows
    }

    fn parse_record(&self, record: Record<'_>, ctx: &ParseContext) -> RecordResult {
        let Record::Row(row) = record else {
            return Ok(None);
        };
        let balance = ctx
            .classifier
            .parse_cell(row.cell(BALANCE))
            .and_then(|t| signed_balance(&t));

        if row.cell(DESCRIPTION).to_uppercase().contains("BROUGHT FORWARD") {
            let balance = balance
                .ok_or_else(|| MalformedRecord::new("brought-forward row without a balance", &record))?;
            return Ok(Some(Transaction::brought_forward(balance)));
        }

        // Folding only leaves an overflow row standing when nothing precedes it.
        if is_overflow_row(&row.cells) {
            return Err(MalformedRecord::new("description with no transaction row above it", &record));
        }

        let date = parse_date(row.cell(POST_DATE), DATE_FORMATS);
        let Some(balance) = balance else {
            return match date {
                Some(_) => Err(MalformedRecord::new("no balance in row", &record)),
                None => Ok(None),
            };
        };

        let reference = Some(row.cell(REFERENCE))
            .filter(|r| *r != "-")
            .map(str::to_string);
        let txn = Transaction::new(row.cell(DESCRIPTION), balance)
            .with_date(date)
            .with_value_date(parse_date(row.cell(VALUE_DATE), DATE_FORMATS))
            .with_reference(reference);
        Ok(Some(apply_split_columns(
            txn,
            row.cell(DEBIT),
            row.cell(CREDIT),
            &ctx.classifier,
        )))
    }

    fn parse_metadata_header(&self, header: &[&str], ctx: &ParseContext) -> Metadata {
        let mut md = self.schema.extract(header, &ctx.missing);

        // Bank name, then branch name, then branch address.
        if let Some(at) = header
            .iter()
            .position(|l| l.to_uppercase().contains("STATE BANK OF INDIA"))
        {
            if let Some(branch) = header.get(at + 1) {
                md.set_if_missing(keys::BRANCH, branch);
            }
            if let Some(address) = header.get(at + 2).filter(|l| !l.starts_with("Branch Code")) {
                md.set_if_missing(keys::BRANCH_ADDRESS, address);
            }
        }

        // Holder name and address follow the title, mixed with label lines.
        if let Some(at) = header
            .iter()
            .position(|l| l.trim().eq_ignore_ascii_case("STATEMENT OF ACCOUNT"))
        {
            let mut block: Vec<&str> = Vec::new();
            for line in &header[at + 1..] {
                let upper = line.to_ascii_uppercase();
                let cut = ["BRANCH EMAIL", "BRANCH PHONE"]
                    .iter()
                    .filter_map(|label| upper.find(label))
                    .min()
                    .unwrap_or(line.len());
                let text = line[..cut].trim();
                if ADDRESS_STOP.iter().any(|w| upper.starts_with(w)) {
                    break;
                }
                if !text.is_empty() && !text.contains(':') {
                    block.push(text);
                }
            }
            if let Some((holder, address)) = block.split_first() {
                md.set_if_missing(keys::ACCOUNT_HOLDER, holder);
                md.set_if_missing(keys::ACCOUNT_HOLDER_ADDRESS, address.join(" "));
            }
        }
        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::fixture::header;
    use passbook_core::{Direction, RowKind};
    use rust_decimal::Decimal;

    const HEADER: &str = r#"
STATE BANK OF INDIA
KORAMANGALA BRANCH
80 FEET ROAD KORAMANGALA BANGALORE
Branch Code : 04321
STATEMENT OF ACCOUNT
Account Name : MR RAVI KUMAR
MR RAVI KUMAR
12 MG ROAD Branch Email : sbi.04321@sbi.co.in
BANGALORE 560001 Branch Phone : 08012345678
CIF No : 85012345678
Account No : 30123456789
Product : SAVINGS BANK
IFSC Code : SBIN0004321
MICR Code : 560002034
Currency : INR
Account Status : OPEN
Nominee Name : SITA KUMAR
Email : ravi@example.com
Statement From : 01-04-2023 To 30-06-2023
"#;

    fn cells(row: &[Option<&str>]) -> Vec<Option<String>> {
        row.iter().map(|c| c.map(str::to_string)).collect()
    }

    fn grid() -> Grid {
        vec![
            cells(&[
                Some("Post Date"),
                Some("Value Date"),
                Some("Description"),
                Some("Cheque No/Reference"),
                Some("Debit"),
                Some("Credit"),
                Some("Balance"),
            ]),
            cells(&[None, None, Some("BROUGHT FORWARD"), None, None, None, Some("10,000.00")]),
            cells(&[
                Some("01-04-2023"),
                Some("01-04-2023"),
                Some("UPI/DR/309112345678/\nSWIGGY"),
                Some(""),
                Some("250.00"),
                Some(""),
                Some("9,750.00"),
            ]),
            cells(&[None, None, Some("FOOD ORDER"), None, None, None, None]),
            cells(&[
                Some("05 Apr 2023"),
                Some("05 Apr 2023"),
                Some("NEFT SALARY"),
                Some("NEFT123"),
                Some(""),
                Some("50,000.00"),
                Some("59,750.00"),
            ]),
            cells(&[
                Some("06/04/2023"),
                None,
                Some("REVERSAL"),
                Some("-"),
                Some("100.00"),
                Some("100.00"),
                Some("59,750.00"),
            ]),
            cells(&[Some("07-04-2023"), None, Some("CHARGES"), None, Some("10.00"), None, Some("")]),
            cells(&[None, None, None, None, None, None, None]),
        ]
    }

    fn d(units: i64) -> Decimal {
        Decimal::new(units, 2)
    }

    #[test]
    fn test_normalize_drops_headers_and_folds_overflow() {
        let adapter = SbiAdapter::new().unwrap();
        let rows = adapter.normalize_tables(&[(0, &grid())]);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[1].cell(DESCRIPTION), "UPI/DR/309112345678/ SWIGGY FOOD ORDER");
        assert!(rows.iter().all(|r| r.cells.len() == COLUMNS));
    }

    #[test]
    fn test_overflow_at_top_of_next_page_folds_back() {
        let adapter = SbiAdapter::new().unwrap();
        let first = vec![
            cells(&[None, None, Some("BROUGHT FORWARD"), None, None, None, Some("10,000.00")]),
            cells(&[
                Some("01-04-2023"),
                None,
                Some("UPI/DR/309112345678/"),
                None,
                Some("250.00"),
                None,
                Some("9,750.00"),
            ]),
        ];
        let second = vec![
            cells(&[
                Some("Post Date"),
                Some("Value Date"),
                Some("Description"),
                None,
                Some("Debit"),
                Some("Credit"),
                Some("Balance"),
            ]),
            cells(&[None, None, Some("SWIGGY FOOD ORDER"), None, None, None, None]),
        ];
        let rows = adapter.normalize_tables(&[(0, &first), (1, &second)]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].page, 0);
        assert_eq!(rows[1].cell(DESCRIPTION), "UPI/DR/309112345678/ SWIGGY FOOD ORDER");
    }

    #[test]
    fn test_leading_overflow_row_is_reported() {
        let adapter = SbiAdapter::new().unwrap();
        let grid = vec![cells(&[None, None, Some("SWIGGY FOOD ORDER"), None, None, None, None])];
        let rows = adapter.normalize_tables(&[(0, &grid)]);
        assert_eq!(rows.len(), 1);
        let err = adapter
            .parse_record(Record::Row(&rows[0]), &ParseContext::default())
            .unwrap_err();
        assert!(err.source_text.contains("SWIGGY FOOD ORDER"));
    }

    #[test]
    fn test_parse_sbi_rows() {
        let adapter = SbiAdapter::new().unwrap();
        let ctx = ParseContext::default();
        let rows = adapter.normalize_tables(&[(0, &grid())]);
        let parsed: Vec<_> = rows
            .iter()
            .map(|r| adapter.parse_record(Record::Row(r), &ctx))
            .collect();

        let bf = parsed[0].clone().unwrap().unwrap();
        assert_eq!(bf.kind, RowKind::BroughtForward);
        assert_eq!(bf.balance, d(1_000_000));

        let upi = parsed[1].clone().unwrap().unwrap();
        assert_eq!(upi.direction(), Some(Direction::Debit));
        assert_eq!(upi.debit, Some(d(25_000)));
        assert_eq!(upi.reference, None);

        let salary = parsed[2].clone().unwrap().unwrap();
        assert_eq!(salary.credit, Some(d(5_000_000)));
        assert_eq!(salary.date.unwrap().to_string(), "2023-04-05");
        assert_eq!(salary.reference.as_deref(), Some("NEFT123"));

        let reversal = parsed[3].clone().unwrap().unwrap();
        assert_eq!(reversal.amount, Some(d(10_000)));
        assert_eq!(reversal.alternate_amount, Some(d(10_000)));
        assert_eq!(reversal.reference, None);

        // Dated but no balance: dropped with a reason.
        let err = parsed[4].clone().unwrap_err();
        assert!(err.to_string().contains("no balance"));
        assert!(err.source_text.contains("CHARGES"));
    }

    #[test]
    fn test_sbi_metadata() {
        let adapter = SbiAdapter::new().unwrap();
        let md = adapter.parse_metadata_header(&header(HEADER), &ParseContext::default());
        assert_eq!(md.get(keys::BRANCH), "KORAMANGALA BRANCH");
        assert_eq!(md.get(keys::BRANCH_ADDRESS), "80 FEET ROAD KORAMANGALA BANGALORE");
        assert_eq!(md.get(keys::ACCOUNT_HOLDER), "MR RAVI KUMAR");
        assert_eq!(md.get(keys::ACCOUNT_HOLDER_ADDRESS), "12 MG ROAD BANGALORE 560001");
        assert_eq!(md.get(keys::ACCOUNT_NUMBER), "30123456789");
        assert_eq!(md.get(keys::STATEMENT_PERIOD), "01-04-2023 to 30-06-2023");
        assert_eq!(md.get("Branch Email"), "sbi.04321@sbi.co.in");
        assert_eq!(md.get("Email"), "ravi@example.com");
        assert_eq!(md.get("CKYC No"), "N/A");
    }
}
