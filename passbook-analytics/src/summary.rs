//! Headline figures for a parsed statement.

use chrono::NaiveDate;
use passbook_core::Ledger;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementSummary {
    pub transaction_count: usize,
    pub debit_count: usize,
    pub credit_count: usize,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    /// Credits minus debits
    pub net_movement: Decimal,
    pub opening_balance: Option<Decimal>,
    pub closing_balance: Option<Decimal>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub warning_count: usize,
}

impl StatementSummary {
    pub fn from_ledger(ledger: &Ledger) -> Self {
        let mut summary = Self {
            transaction_count: 0,
            debit_count: 0,
            credit_count: 0,
            total_debit: Decimal::ZERO,
            total_credit: Decimal::ZERO,
            net_movement: Decimal::ZERO,
            opening_balance: ledger.opening_balance(),
            closing_balance: ledger.closing_balance(),
            first_date: None,
            last_date: None,
            warning_count: ledger.warnings().len(),
        };

        for txn in ledger.postings() {
            summary.transaction_count += 1;
            if let Some(debit) = txn.debit {
                summary.debit_count += 1;
                summary.total_debit = summary.total_debit.saturating_add(debit);
            }
            if let Some(credit) = txn.credit {
                summary.credit_count += 1;
                summary.total_credit = summary.total_credit.saturating_add(credit);
            }
            if let Some(date) = txn.date {
                summary.first_date = Some(summary.first_date.map_or(date, |d| d.min(date)));
                summary.last_date = Some(summary.last_date.map_or(date, |d| d.max(date)));
            }
        }

        // Totals clamp at the Decimal range instead of overflowing.
        summary.net_movement = summary.total_credit.saturating_sub(summary.total_debit);
        summary
    }
}
