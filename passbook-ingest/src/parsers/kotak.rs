//! Kotak Mahindra Bank savings statement (text)
//!
//! Expected extracted-text section:
//!   Date       Narration                 Chq/Ref No        Withdrawal (Dr)  Deposit (Cr)  Balance
//!   B/F                                                                                 10,000.00(Cr)
//!   01-04-2022 UPI/SWIGGY/209112345678   UPI-209112345678  250.00(Dr)                   9,750.00(Cr)
//!
//! Long narrations wrap onto the next line, sometimes in the middle of a date
//! ("to 30-" / "06-2022"), so continuations are hyphen-stitched.

use passbook_core::{AmountToken, Direction, Metadata, Transaction, keys};
use regex::Regex;
use rust_decimal::Decimal;

use crate::adapter::{
    AmountColumns, FormatAdapter, Layout, MalformedRecord, ParseContext, Record, RecordResult,
    join, parse_date, signed_balance,
};
use crate::institution::Institution;
use crate::metadata::{MetadataSchema, left_column};
use crate::reconstruct::{LineRules, WrapMode};

const DATE_FORMATS: &[&str] = &["%d-%m-%Y"];

/// Right-hand column labels that share a physical line with the address.
const RIGHT_LABELS: &[&str] = &[
    "Period",
    "Cust.Reln",
    "Account No",
    "Currency",
    "Branch",
    "Nominee",
];

pub struct KotakAdapter {
    rules: LineRules,
    schema: MetadataSchema,
    reference: Regex,
}

impl KotakAdapter {
    pub fn new() -> Result<Self, regex::Error> {
        let rules = LineRules::new(WrapMode::HyphenStitch)?
            .start(r"^\d{2}-\d{2}-\d{4}\b")?
            .start(r"(?i)^B/F\b")?
            .header(r"(?i)^Date\s+Narration\b")?
            .header(r"(?i)^Page\s+\d+\s+of\s+\d+")?
            .terminator(r"(?i)^Statement\s+Summary")?;

        let schema = MetadataSchema::new("KOTAK MAHINDRA BANK")
            .field(keys::STATEMENT_PERIOD, r"(?mi)\bPeriod\s*:\s*(.+?)\s*$")?
            .field("Cust.Reln.No", r"(?mi)Cust\.?\s*Reln\.?\s*No\.?\s*:\s*(\d+)")?
            .field(keys::ACCOUNT_NUMBER, r"(?mi)Account\s+No\.?\s*:\s*(\d+)")?
            .field(keys::CURRENCY, r"(?mi)Currency\s*:\s*([A-Z]{3})")?
            .field(keys::BRANCH, r"(?mi)\bBranch\s*:\s*(.+?)\s*$")?
            .field("Nominee Registered", r"(?mi)Nominee\s+Registered\s*:\s*(\w+)")?
            .field("Branch Phone No.", r"(?mi)Branch\s+Phone\s+No\.?\s*:\s*([+\d][\d -]*\d)")?
            .field("MICR Code", r"(?mi)MICR\s+Code\s*:\s*(\d+)")?
            .field("IFSC Code", r"(?mi)IFSC\s+Code\s*:\s*([A-Z0-9]+)")?
            .block(
                keys::BRANCH_ADDRESS,
                r"(?i)Branch\s+Address\s*:?",
                r"(?i)Phone|MICR|IFSC|E-?mail",
            )?;

        Ok(Self {
            rules,
            schema,
            // UPI-209112345678, NEFT-KKBKH22095123456, 00012345678
            reference: Regex::new(r"^(?:[A-Za-z]{2,}-[A-Za-z0-9]*\d{6,}|\d{7,})$")?,
        })
    }

    fn split_reference<'a>(&self, narration: &[&'a str]) -> (Vec<&'a str>, Option<String>) {
        match narration.split_last() {
            Some((last, rest)) if !rest.is_empty() && self.reference.is_match(last) => {
                (rest.to_vec(), Some(last.to_string()))
            }
            _ => (narration.to_vec(), None),
        }
    }
}

impl FormatAdapter for KotakAdapter {
    fn institution(&self) -> Institution {
        Institution::Kotak
    }

    fn layout(&self) -> Layout<'_> {
        Layout::Text(&self.rules)
    }

    fn markers(&self) -> &[&'static str] {
        &["KOTAK MAHINDRA", "KOTAK BANK"]
    }

    fn metadata_schema(&self) -> &MetadataSchema {
        &self.schema
    }

    fn parse_record(&self, record: Record<'_>, ctx: &ParseContext) -> RecordResult {
        let Record::Line(line) = record else {
            return Ok(None);
        };
        let tokens: Vec<&str> = line.text.split_whitespace().collect();
        let Some(&first) = tokens.first() else {
            return Ok(None);
        };

        if first.eq_ignore_ascii_case("B/F") {
            let balance = AmountColumns::locate(&tokens, 1, &ctx.classifier, 1)
                .and_then(|cols| signed_balance(&cols.balance))
                .ok_or_else(|| MalformedRecord::new("brought-forward line without a balance", &record))?;
            return Ok(Some(Transaction::brought_forward(balance)));
        }

        let Some(date) = parse_date(first, DATE_FORMATS) else {
            return Ok(None);
        };

        // Withdrawal, deposit, balance.
        let cols = AmountColumns::locate(&tokens, 1, &ctx.classifier, 3)
            .ok_or_else(|| MalformedRecord::new("no balance on transaction line", &record))?;
        let balance = signed_balance(&cols.balance)
            .ok_or_else(|| MalformedRecord::new("unreadable balance", &record))?;

        let mut narration_end = cols.first;
        let mut posting: Option<(Direction, Decimal)> = None;
        let mut amount = None;
        let mut hint = None;
        let mut alternate = None;

        let is_zero = |t: &AmountToken| t.value.is_some_and(|v| v.is_zero());
        match cols.preceding.as_slice() {
            [Some(one)] => {
                amount = one.value.map(|v| v.abs());
                hint = one.suffix;
            }
            [Some(w), Some(d)] if d.suffix.is_some() && w.suffix.is_none() => {
                // Suffixed layout: the bare number belongs to the narration.
                narration_end += 1;
                amount = d.value.map(|v| v.abs());
                hint = d.suffix;
            }
            [Some(w), Some(d)] if is_zero(w) => posting = d.value.map(|v| (Direction::Credit, v.abs())),
            [Some(w), Some(d)] if is_zero(d) => posting = w.value.map(|v| (Direction::Debit, v.abs())),
            [Some(w), Some(d)] => {
                // Both columns filled: one is a number from the narration.
                narration_end += 1;
                amount = d.value.map(|v| v.abs());
                alternate = w.value.map(|v| v.abs());
            }
            [None, Some(d)] => posting = d.value.map(|v| (Direction::Credit, v.abs())),
            [Some(w), None] => posting = w.value.map(|v| (Direction::Debit, v.abs())),
            _ => {}
        }

        let (narration, reference) = self.split_reference(&tokens[1..narration_end]);
        let mut narration = join(&narration);
        let trailing = &tokens[cols.balance_at + 1..];
        if !trailing.is_empty() {
            narration = format!("{} {}", narration, join(trailing)).trim().to_string();
        }

        let mut txn = Transaction::new(narration, balance)
            .with_date(Some(date))
            .with_reference(reference)
            .with_amount(amount)
            .with_hint(hint)
            .with_alternate(alternate);
        if let Some((direction, value)) = posting {
            txn = txn.with_posting(direction, value);
        }
        Ok(Some(txn))
    }

    fn parse_metadata_header(&self, header: &[&str], ctx: &ParseContext) -> Metadata {
        let mut md = self.schema.extract(header, &ctx.missing);

        let holder_at = header.iter().position(|l| {
            !l.to_ascii_lowercase().starts_with("kotak") && !left_column(l, RIGHT_LABELS).is_empty()
        });
        if let Some(at) = holder_at {
            md.set_if_missing(keys::ACCOUNT_HOLDER, left_column(header[at], RIGHT_LABELS));

            let address: Vec<&str> = header[at + 1..]
                .iter()
                .take_while(|l| {
                    let lower = l.to_ascii_lowercase();
                    !lower.contains("branch address") && !lower.starts_with("date ")
                })
                .map(|l| left_column(l, RIGHT_LABELS))
                .filter(|l| !l.is_empty())
                .collect();
            md.set_if_missing(keys::ACCOUNT_HOLDER_ADDRESS, address.join(" "));
        }
        md
    }
}
