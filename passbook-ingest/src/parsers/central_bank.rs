//! Central Bank of India statement (text)
//!
//! Expected extracted-text section:
//!   Value Date Post Date Details            Chq.No.  Debit/Credit  Balance
//!   BROUGHT FORWARD : 10,000.00Cr
//!   01/04/22 01/04/22 UPI/SWIGGY . - 250.00 9,750.00Cr
//!   . . FOOD ORDER .
//!
//! A lone `.` ends the details column. The statement prints one amount column
//! with no side marker, so direction comes from the balance move. Lines
//! starting with `. .` carry extra narration for the row above.

use passbook_core::{Metadata, Transaction, keys};
use regex::Regex;

use crate::adapter::{
    AmountColumns, FormatAdapter, Layout, MalformedRecord, ParseContext, Record, RecordResult,
    join, parse_date, signed_balance,
};
use crate::institution::Institution;
use crate::metadata::{MetadataSchema, first_name_line};
use crate::reconstruct::{LineRules, WrapMode};

const DATE_FORMATS: &[&str] = &["%d/%m/%y"];

pub struct CentralBankAdapter {
    rules: LineRules,
    schema: MetadataSchema,
    brought_forward: Regex,
    spaced_suffix: Regex,
}

impl CentralBankAdapter {
    pub fn new() -> Result<Self, regex::Error> {
        let rules = LineRules::new(WrapMode::Space)?
            .start(r"^\d{2}/\d{2}/\d{2}\s+\d{2}/\d{2}/\d{2}\b")?
            .start(r"(?i)^\W*BROUGHT\s+FORWARD\b")?
            .header(r"(?i)^Value\s+Date\b")?
            .header(r"(?i)^Page\s+\d+")?
            .terminator(r"(?i)END\s+OF\s+STATEMENT")?;

        let schema = MetadataSchema::new("CENTRAL BANK OF INDIA")
            .field("Branch Email", r"(?mi)Branch\s+E-?mail\s*:\s*(\S+)")?
            .field("Branch Code", r"(?mi)Branch\s+Code\s*:\s*(\d+)")?
            .field(keys::ACCOUNT_NUMBER, r"(?mi)Account\s+No\.?\s*:\s*(\d+)")?
            .field(keys::CURRENCY, r"(?mi)Currency\s*:\s*(\w+)")?
            .field("Product", r"(?mi)Product\s*:\s*(.+?)\s*$")?
            .field("Nomination", r"(?mi)Nomination\s*:\s*(\w+)")?
            .field("Statement Date", r"(?mi)(?:^|\s)Date\s*:\s*(\d{2}/\d{2}/\d{4})")?
            .field("Statement Time", r"(?mi)Time\s*:\s*(\d{2}:\d{2}:\d{2})")?
            .field("Email", r"(?mi)^E-?mail\s*:\s*(\S+)")?
            .field(
                keys::STATEMENT_PERIOD,
                r"(?mi)Statement\s+From\s+(\d{2}/\d{2}/\d{4})\s+to\s+(\d{2}/\d{2}/\d{4})",
            )?;

        Ok(Self {
            rules,
            schema,
            brought_forward: Regex::new(r"(?i)^\W*BROUGHT\s+FORWARD\b")?,
            spaced_suffix: Regex::new(r"(?i)(\d)\s+(Cr|Dr)\b")?,
        })
    }
}

impl FormatAdapter for CentralBankAdapter {
    fn institution(&self) -> Institution {
        Institution::CentralBank
    }

    fn layout(&self) -> Layout<'_> {
        Layout::Text(&self.rules)
    }

    fn markers(&self) -> &[&'static str] {
        &["CENTRAL BANK OF INDIA"]
    }

    fn metadata_schema(&self) -> &MetadataSchema {
        &self.schema
    }

    fn parse_record(&self, record: Record<'_>, ctx: &ParseContext) -> RecordResult {
        let Record::Line(line) = record else {
            return Ok(None);
        };
        // "10,000.00 Cr" → "10,000.00Cr"
        let text = self.spaced_suffix.replace_all(&line.text, "${1}${2}");
        let tokens: Vec<&str> = text.split_whitespace().collect();

        if self.brought_forward.is_match(&text) {
            let balance = tokens
                .iter()
                .rev()
                .map(|t| ctx.classifier.classify(t))
                .find(|t| t.is_amount())
                .and_then(|t| signed_balance(&t))
                .ok_or_else(|| MalformedRecord::new("brought-forward line without a balance", &record))?;
            return Ok(Some(Transaction::brought_forward(balance)));
        }

        let value_date = tokens.first().and_then(|t| parse_date(t, DATE_FORMATS));
        let post_date = tokens.get(1).and_then(|t| parse_date(t, DATE_FORMATS));
        let (Some(value_date), Some(post_date)) = (value_date, post_date) else {
            return Ok(None);
        };

        let dot = tokens.iter().skip(2).position(|t| *t == ".").map(|i| i + 2);
        let from = dot.map_or(2, |d| d + 1);

        // The balance always carries Cr/Dr; prefer it over any later number
        // in the continuation text.
        let balance_at = (from..tokens.len())
            .find(|&i| {
                let t = ctx.classifier.classify(tokens[i]);
                t.is_amount() && t.suffix.is_some()
            })
            .or_else(|| (from..tokens.len()).rev().find(|&i| ctx.classifier.classify(tokens[i]).is_amount()))
            .ok_or_else(|| MalformedRecord::new("no balance on transaction line", &record))?;

        let cols = AmountColumns::locate(&tokens[..=balance_at], from, &ctx.classifier, 2)
            .ok_or_else(|| MalformedRecord::new("no balance on transaction line", &record))?;
        let balance = signed_balance(&cols.balance)
            .ok_or_else(|| MalformedRecord::new("unreadable balance", &record))?;
        let amount = cols
            .preceding
            .first()
            .and_then(|t| t.as_ref())
            .and_then(|t| t.value)
            .map(|v| v.abs())
            .filter(|v| !v.is_zero());

        let (details, reference) = match dot {
            Some(d) => (&tokens[2..d], &tokens[d + 1..cols.first]),
            None => (&tokens[2..cols.first], &tokens[..0]),
        };
        let reference: Vec<&str> = reference.iter().copied().filter(|t| *t != "-").collect();
        let more: Vec<&str> = tokens[balance_at + 1..]
            .iter()
            .copied()
            .filter(|t| !t.chars().all(|c| c == '.'))
            .collect();
        let narration = format!("{} {}", join(details), join(&more)).trim().to_string();

        Ok(Some(
            Transaction::new(narration, balance)
                .with_date(Some(post_date))
                .with_value_date(Some(value_date))
                .with_reference(Some(join(&reference)))
                .with_amount(amount),
        ))
    }

    fn parse_metadata_header(&self, header: &[&str], ctx: &ParseContext) -> Metadata {
        let mut md = self.schema.extract(header, &ctx.missing);

        let holder = first_name_line(header, &["CENTRAL BANK", "STATEMENT"]);
        if let Some(holder) = holder {
            md.set_if_missing(keys::ACCOUNT_HOLDER, holder);

            let address: Vec<&str> = header
                .iter()
                .skip_while(|l| **l != holder)
                .skip(1)
                .take_while(|l| !l.contains("Account No"))
                .filter(|l| !l.contains(':'))
                .copied()
                .collect();
            md.set_if_missing(keys::ACCOUNT_HOLDER_ADDRESS, address.join(", "));
        }
        md
    }
}
