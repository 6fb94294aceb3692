//! Indian Overseas Bank statement (text)
//!
//! Expected extracted-text section:
//!   Post Date Tran Id   Ref Num Particulars        Debit   Credit  Balance Amt Contra Id
//!   ACCOUNT OPENING BALANCE : 5,000.00CR
//!   16-04-2019S42347939 REF001  UPI/SWIGGY/FOOD    250.00          4,750.00CR
//!
//! The post date is glued to the transaction id. The CR/DR marker on the
//! balance is the balance's sign; debit and credit share one printed column.

use passbook_core::{Metadata, Transaction, keys};
use regex::Regex;
use rust_decimal::Decimal;

use crate::adapter::{
    AmountColumns, FormatAdapter, Layout, MalformedRecord, ParseContext, Record, RecordResult,
    join, parse_date, signed_balance,
};
use crate::institution::Institution;
use crate::metadata::MetadataSchema;
use crate::reconstruct::{LineRules, WrapMode};

const DATE_FORMATS: &[&str] = &["%d-%m-%Y"];

pub struct IobAdapter {
    rules: LineRules,
    schema: MetadataSchema,
    opening: Regex,
    brought_forward: Regex,
    date_tran: Regex,
    page_suffix: Regex,
}

impl IobAdapter {
    pub fn new() -> Result<Self, regex::Error> {
        let rules = LineRules::new(WrapMode::Space)?
            .start(r"^\d{2}-\d{2}-\d{4}")?
            .start(r"(?i)^ACCOUNT\s+OPENING\s+BALANCE\b")?
            .start(r"(?i)^BROUGHT\s+FORWARD\b")?
            .header(r"(?i)^(post\s+)?date\b")?
            .header(r"\bParticulars\b")?
            .header(r"(?i)\bBalance\s+Amt\b")?
            .header(r"(?i)\bContra\s+Id\b")?
            .header(r"(?i)^INDIAN\s+OVERSEAS\s+BANK\b")?;

        let schema = MetadataSchema::new("INDIAN OVERSEAS BANK")
            .field(keys::ACCOUNT_NUMBER, r"(?mi)Account\s+Number\s*:\s*(\d+)")?
            .field(keys::CURRENCY, r"(?mi)Account\s+Number\s*:\s*\d+/([A-Z]{3})")?
            .field(keys::ACCOUNT_HOLDER, r"(?mi)Account\s+Number\s*:\s*\d+/[A-Z]{3}\s+(.+?)\s*$")?
            .field("Report To", r"(?mi)Report\s*To\s*:\s*(\w+)")?
            .field("Service Outlet", r"(?mi)Service\s*Outlet\s*:\s*([\w ]+?)\s*$")?
            .field(
                keys::STATEMENT_PERIOD,
                r"(?mi)Report\s*for\s*the\s*Period\s*:\s*(\d{2}-\d{2}-\d{4})\s*TO\s*(\d{2}-\d{2}-\d{4})",
            )?;

        Ok(Self {
            rules,
            schema,
            opening: Regex::new(r"(?i)^\s*ACCOUNT\s+OPENING\s+BALANCE\b")?,
            brought_forward: Regex::new(r"(?i)^\s*BROUGHT\s+FORWARD\b")?,
            date_tran: Regex::new(r"^(\d{2}-\d{2}-\d{4})(\S*)$")?,
            page_suffix: Regex::new(r"(?i)\s*Page\s*\d+\s*$")?,
        })
    }

    fn anchor_balance(
        &self,
        tokens: &[&str],
        record: &Record<'_>,
        ctx: &ParseContext,
    ) -> Result<Decimal, MalformedRecord> {
        AmountColumns::locate(tokens, 0, &ctx.classifier, 1)
            .and_then(|cols| signed_balance(&cols.balance))
            .ok_or_else(|| MalformedRecord::new("balance line without an amount", record))
    }
}

impl FormatAdapter for IobAdapter {
    fn institution(&self) -> Institution {
        Institution::Iob
    }

    fn layout(&self) -> Layout<'_> {
        Layout::Text(&self.rules)
    }

    fn markers(&self) -> &[&'static str] {
        &["INDIAN OVERSEAS BANK"]
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
            let balance = self.anchor_balance(&tokens, &record, ctx)?;
            return Ok(Some(Transaction::opening_balance(balance)));
        }
        if self.brought_forward.is_match(&line.text) {
            let balance = self.anchor_balance(&tokens, &record, ctx)?;
            return Ok(Some(Transaction::brought_forward(balance)));
        }

        let Some(caps) = tokens.first().and_then(|t| self.date_tran.captures(t)) else {
            return Ok(None);
        };
        let Some(date) = parse_date(&caps[1], DATE_FORMATS) else {
            return Ok(None);
        };
        let tran = caps[2].to_string();

        let cols = AmountColumns::locate(&tokens, 1, &ctx.classifier, 2)
            .ok_or_else(|| MalformedRecord::new("no balance on transaction line", &record))?;
        let balance = signed_balance(&cols.balance)
            .ok_or_else(|| MalformedRecord::new("unreadable balance", &record))?;
        let (amount, hint) = match cols.preceding.first() {
            Some(Some(t)) => (t.value.map(|v| v.abs()), t.suffix),
            _ => (None, None),
        };

        // Ref Num sits between the tran id and the particulars.
        let (ref_num, particulars) = if cols.first > 2 {
            (Some(tokens[1]), &tokens[2..cols.first])
        } else {
            (None, &tokens[1..cols.first])
        };
        let reference: Vec<&str> = [Some(tran.as_str()), ref_num]
            .into_iter()
            .flatten()
            .filter(|r| !r.is_empty() && *r != "-")
            .collect();

        let mut narration = join(particulars);
        let trailing = &tokens[cols.balance_at + 1..];
        if !trailing.is_empty() {
            narration = format!("{} {}", narration, join(trailing)).trim().to_string();
        }

        Ok(Some(
            Transaction::new(narration, balance)
                .with_date(Some(date))
                .with_reference(Some(reference.join(" ")))
                .with_amount(amount)
                .with_hint(hint),
        ))
    }

    fn parse_metadata_header(&self, header: &[&str], ctx: &ParseContext) -> Metadata {
        let mut md = self.schema.extract(header, &ctx.missing);

        // "INDIAN OVERSEAS BANK, MAHALAKSHMIPURAM, BANGALORE Page 1"
        let bank_line = header
            .iter()
            .find(|l| l.to_uppercase().contains("INDIAN OVERSEAS BANK"));
        if let Some(line) = bank_line {
            let line = self.page_suffix.replace(line, "");
            if let Some((_, branch_info)) = line.split_once(',') {
                let branch_info = branch_info.trim();
                let branch = branch_info.split(',').next().unwrap_or(branch_info);
                md.set_if_missing(keys::BRANCH, branch);
                md.set_if_missing(keys::BRANCH_ADDRESS, branch_info);
            }
        }
        md
    }
}
