//! RBL Bank statement (text)
//!
//! Expected extracted-text section:
//!   Date        Transaction Details          Value Date   Withdrawal Amt  Deposit Amt  Balance
//!   01-Apr-2023 UPI/309112345678/ZOMATO      01-Apr-2023  450.00                       14,550.00
//!
//! Withdrawal and deposit collapse into one unmarked amount in the text, and
//! rows may omit it entirely; the balance move supplies both.

use passbook_core::{Transaction, keys};
use regex::Regex;

use crate::adapter::{
    AmountColumns, FormatAdapter, Layout, MalformedRecord, ParseContext, Record, RecordResult,
    join, parse_date, signed_balance,
};
use crate::institution::Institution;
use crate::metadata::MetadataSchema;
use crate::reconstruct::{LineRules, WrapMode};

const DATE_FORMATS: &[&str] = &["%d-%b-%Y"];

pub struct RblAdapter {
    rules: LineRules,
    schema: MetadataSchema,
    opening: Regex,
}

impl RblAdapter {
    pub fn new() -> Result<Self, regex::Error> {
        let rules = LineRules::new(WrapMode::Space)?
            .start(r"^\d{2}-[A-Za-z]{3}-\d{4}\b")?
            .start(r"(?i)^Opening\s+Balance\b")?
            .header(r"(?i)^(Transaction\s+)?Date\s+(Transaction\s+)?Details\b")?
            .header(r"(?i)^Page\s+\d+")?
            .terminator(r"(?i)^(Closing\s+Balance|Statement\s+Summary)\b")?;

        let schema = MetadataSchema::new("RBL BANK")
            .field(keys::ACCOUNT_HOLDER, r"(?mi)Accountholder\s+Name\s*:\s*(.+?)\s*$")?
            .field("Phone", r"(?mi)Phone\s*:\s*([+\d() -]+?)\s*$")?
            .field("Email Id", r"(?mi)Email\s+Id\s*:\s*([\w.-]+@[\w.-]+)")?
            .field("CIF ID", r"(?mi)CIF\s+ID\s*:\s*(\d+)")?
            .field(keys::CURRENCY, r"(?mi)A/c\s+Currency\s*:\s*([A-Z]+)")?
            .field("A/c Open Date", r"(?mi)A/c\s+Open\s+Date\s*:\s*(.+?)\s*$")?
            .field("A/c Type", r"(?mi)A/c\s+Type\s*:\s*(.+?)\s*$")?
            .field("A/c Status", r"(?mi)A/c\s+Status\s*:\s*(.+?)\s*$")?
            .field(keys::ACCOUNT_NUMBER, r"(?mi)^(?:Account|A/c)\s+(?:No|Number)\.?\s*:\s*(\d+)")?
            .field(keys::BRANCH, r"(?mi)Home\s+Branch\s*:\s*(.+?)\s*$")?
            .field(keys::BRANCH_ADDRESS, r"(?mi)Home\s+Branch\s+Address\s*:\s*(.+?)\s*$")?
            .field("IFSC/RTGS/NEFT", r"(?mi)IFSC/RTGS/NEFT\s*:\s*([A-Z0-9]+)")?
            .field("MICR Code", r"(?mi)MICR\s+Code\s*:\s*(\d+)")?
            .field("ECS A/c No", r"(?mi)ECS\s+A/c\s+No\s*:\s*(\d+)")?
            .field(
                keys::STATEMENT_PERIOD,
                r"(?mi)Period\s*:\s*(\d{2}-[A-Za-z]{3}-\d{4})\s+to\s+(\d{2}-[A-Za-z]{3}-\d{4})",
            )?
            .field(keys::STATEMENT_PERIOD, r"(?mi)Period\s*:\s*(.+?)\s*$")?
            .block(
                keys::ACCOUNT_HOLDER_ADDRESS,
                r"(?i)Customer\s+Address\s*:?",
                r"(?i)^(Phone|Email|CIF|A/c|Home\s+Branch)",
            )?;

        Ok(Self {
            rules,
            schema,
            opening: Regex::new(r"(?i)^Opening\s+Balance\b")?,
        })
    }
}

impl FormatAdapter for RblAdapter {
    fn institution(&self) -> Institution {
        Institution::Rbl
    }

    fn layout(&self) -> Layout<'_> {
        Layout::Text(&self.rules)
    }

    fn markers(&self) -> &[&'static str] {
        &["RBL BANK", "RATNAKAR BANK"]
    }

    fn metadata_schema(&self) -> &MetadataSchema {
        &self.schema
    }

    fn parse_record(&self, record: Record<'_>, ctx: &ParseContext) -> RecordResult {
        let Record::Line(line) = record else {
            return Ok(None);
        };
        let tokens: Vec<&str> = line.text.split_whitespace().collect();

        if self.opening.is_match(&line.text) {
            let balance = AmountColumns::locate(&tokens, 0, &ctx.classifier, 1)
                .and_then(|cols| signed_balance(&cols.balance))
                .ok_or_else(|| MalformedRecord::new("opening balance line without an amount", &record))?;
            return Ok(Some(Transaction::opening_balance(balance)));
        }

        let Some(date) = tokens.first().and_then(|t| parse_date(t, DATE_FORMATS)) else {
            return Ok(None);
        };
        let value_at = (1..tokens.len()).find(|&i| parse_date(tokens[i], DATE_FORMATS).is_some());
        let from = value_at.map_or(1, |i| i + 1);

        let cols = AmountColumns::locate(&tokens, from, &ctx.classifier, 2)
            .ok_or_else(|| MalformedRecord::new("no balance on transaction line", &record))?;
        let balance = signed_balance(&cols.balance)
            .ok_or_else(|| MalformedRecord::new("unreadable balance", &record))?;
        let amount = match cols.preceding.first() {
            Some(Some(t)) => t.value.map(|v| v.abs()).filter(|v| !v.is_zero()),
            _ => None,
        };

        let (details, reference) = match value_at {
            Some(v) => (&tokens[1..v], &tokens[v + 1..cols.first]),
            None => (&tokens[1..cols.first], &tokens[..0]),
        };
        let mut narration = join(details);
        let trailing = &tokens[cols.balance_at + 1..];
        if !trailing.is_empty() {
            narration = format!("{} {}", narration, join(trailing)).trim().to_string();
        }

        Ok(Some(
            Transaction::new(narration, balance)
                .with_date(Some(date))
                .with_value_date(value_at.and_then(|v| parse_date(tokens[v], DATE_FORMATS)))
                .with_reference(Some(join(reference)))
                .with_amount(amount),
        ))
    }
}
