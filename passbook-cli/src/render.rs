use anyhow::{Context, Result};
use passbook_analytics::{StatementSummary, frequent};
use passbook_core::{RowKind, Transaction};
use passbook_ingest::ParsedStatement;
use rust_decimal::Decimal;
use std::io::Write;

use crate::config::OutputSection;

const NARRATION_WIDTH: usize = 48;

fn amount(value: Option<Decimal>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_default()
}

fn date(value: Option<chrono::NaiveDate>) -> String {
    value.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

fn kind_label(kind: RowKind) -> &'static str {
    match kind {
        RowKind::Normal => "",
        RowKind::OpeningBalance => "opening",
        RowKind::BroughtForward => "b/f",
    }
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('~');
    out
}

fn flags(txn: &Transaction) -> String {
    txn.warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>().join("; ")
}

pub fn print_table(out: &mut impl Write, parsed: &ParsedStatement, opts: &OutputSection) -> Result<()> {
    writeln!(out, "# {} statement\n", parsed.institution.display_name())?;

    writeln!(out, "## Metadata\n")?;
    for (key, value) in parsed.metadata.iter() {
        writeln!(out, "{:<22} {}", key, value)?;
    }

    let ledger = &parsed.ledger;
    writeln!(out, "\n## Transactions ({})\n", ledger.transactions().len())?;
    writeln!(
        out,
        "{:<10} {:<10} {:<16} {:<w$} {:>14} {:>14} {:>14} {}",
        "Date",
        "Value",
        "Reference",
        "Narration",
        "Debit",
        "Credit",
        "Balance",
        "Flags",
        w = NARRATION_WIDTH
    )?;
    for txn in ledger.transactions() {
        let narration = match txn.kind {
            RowKind::Normal => txn.narration.clone(),
            kind => format!("[{}] {}", kind_label(kind), txn.narration),
        };
        writeln!(
            out,
            "{:<10} {:<10} {:<16} {:<w$} {:>14} {:>14} {:>14.2} {}",
            date(txn.date),
            date(txn.value_date),
            clip(txn.reference.as_deref().unwrap_or(""), 16),
            clip(&narration, NARRATION_WIDTH),
            amount(txn.debit),
            amount(txn.credit),
            txn.balance,
            flags(txn),
            w = NARRATION_WIDTH
        )?;
    }

    if !ledger.warnings().is_empty() {
        writeln!(out, "\n## Warnings ({})\n", ledger.warnings().len())?;
        for warning in ledger.warnings() {
            writeln!(out, "- {}", warning)?;
        }
    }

    let summary = StatementSummary::from_ledger(ledger);
    writeln!(out, "\n## Summary\n")?;
    writeln!(
        out,
        "transactions={} debits={} credits={}",
        summary.transaction_count, summary.debit_count, summary.credit_count
    )?;
    writeln!(
        out,
        "total debit={:.2} total credit={:.2} net={:.2}",
        summary.total_debit, summary.total_credit, summary.net_movement
    )?;
    writeln!(
        out,
        "opening={} closing={} period={}..{}",
        amount(summary.opening_balance),
        amount(summary.closing_balance),
        date(summary.first_date),
        date(summary.last_date)
    )?;

    let keywords = frequent(&parsed.keyword_frequency, opts.min_keyword_count, opts.top_keywords);
    writeln!(out, "\n## Frequent keywords\n")?;
    if keywords.is_empty() {
        writeln!(out, "(none seen at least {} times)", opts.min_keyword_count)?;
    }
    for (word, count) in &keywords {
        writeln!(out, "{:<24} {}", word, count)?;
    }

    Ok(())
}

pub fn print_json(out: &mut impl Write, parsed: &ParsedStatement) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, parsed).context("serialize statement")?;
    writeln!(out)?;
    Ok(())
}

pub fn print_csv(out: impl Write, parsed: &ParsedStatement) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        "date",
        "value_date",
        "reference",
        "narration",
        "debit",
        "credit",
        "balance",
        "kind",
        "warnings",
    ])?;
    for txn in parsed.ledger.transactions() {
        let balance = txn.balance.to_string();
        let kind = match txn.kind {
            RowKind::Normal => "normal",
            RowKind::OpeningBalance => "opening-balance",
            RowKind::BroughtForward => "brought-forward",
        };
        wtr.write_record([
            date(txn.date).as_str(),
            date(txn.value_date).as_str(),
            txn.reference.as_deref().unwrap_or(""),
            txn.narration.as_str(),
            amount(txn.debit).as_str(),
            amount(txn.credit).as_str(),
            balance.as_str(),
            kind,
            flags(txn).as_str(),
        ])?;
    }
    wtr.flush().context("flush csv")?;
    Ok(())
}
