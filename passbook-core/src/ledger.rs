//! Ledger assembly and balance-continuity validation.
//!
//! Rows are kept in document order; posting order is what the statement
//! printed, and dates alone cannot reorder rows reliably. Every problem found
//! here is a [`Warning`], never an error, so a partially broken statement
//! still yields every row that could be read.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{RowKind, Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// A record that could not yield a balance and was dropped
    #[serde(rename = "malformed-line")]
    MalformedLine,
    #[serde(rename = "balance-mismatch")]
    BalanceMismatch,
    #[serde(rename = "indeterminate-direction")]
    IndeterminateDirection,
    /// The amount/narration boundary was guessed
    #[serde(rename = "ambiguous-amount")]
    AmbiguousAmount,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WarningKind::MalformedLine => "malformed line",
            WarningKind::BalanceMismatch => "balance mismatch",
            WarningKind::IndeterminateDirection => "indeterminate direction",
            WarningKind::AmbiguousAmount => "ambiguous amount",
        };
        f.write_str(label)
    }
}

/// A non-fatal finding. `row` indexes [`Ledger::transactions`] when the
/// finding concerns a kept row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub row: Option<usize>,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, row: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            kind,
            row,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(WarningKind::MalformedLine, None, message)
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "row {}: {}: {}", row + 1, self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// The validated output of one pipeline run. Read-only once assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    transactions: Vec<Transaction>,
    opening_balance: Option<Decimal>,
    warnings: Vec<Warning>,
}

impl Ledger {
    /// Anchor, validate and seal a sequence of records.
    ///
    /// `carried` holds warnings raised upstream (dropped lines, inference);
    /// they come first in the ledger's warning list.
    pub fn assemble(mut records: Vec<Transaction>, carried: Vec<Warning>, tolerance: Decimal) -> Self {
        let opening_balance = records.iter().find(|t| t.kind.is_anchor()).map(|t| t.balance);

        let mut warnings = carried;
        let mut running: Option<Decimal> = None;

        for (row, txn) in records.iter_mut().enumerate() {
            match txn.kind {
                RowKind::OpeningBalance => {}
                RowKind::BroughtForward => {
                    if let Some(prev) = running {
                        match txn.balance.checked_sub(prev) {
                            None => report_out_of_range(row, txn, &mut warnings),
                            Some(gap) if gap.abs() > tolerance => {
                                txn.flag(WarningKind::BalanceMismatch);
                                warnings.push(Warning::new(
                                    WarningKind::BalanceMismatch,
                                    Some(row),
                                    format!(
                                        "brought forward {} does not continue running balance {}",
                                        txn.balance, prev
                                    ),
                                ));
                            }
                            Some(_) => {}
                        }
                    }
                }
                RowKind::Normal => {
                    if let Some(prev) = running {
                        match continuity_error(txn, prev, tolerance) {
                            Some(Continuity::Mismatch(message)) => {
                                txn.flag(WarningKind::BalanceMismatch);
                                warnings.push(Warning::new(WarningKind::BalanceMismatch, Some(row), message));
                            }
                            Some(Continuity::OutOfRange) => report_out_of_range(row, txn, &mut warnings),
                            None => {}
                        }
                    }
                }
            }
            running = Some(txn.balance);
        }

        log::debug!(
            "assembled ledger: {} rows, {} warnings",
            records.len(),
            warnings.len()
        );

        Self {
            transactions: records,
            opening_balance,
            warnings,
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn opening_balance(&self) -> Option<Decimal> {
        self.opening_balance
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Balance after the last row.
    pub fn closing_balance(&self) -> Option<Decimal> {
        self.transactions.last().map(|t| t.balance)
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Rows that move money.
    pub fn postings(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(|t| t.is_normal())
    }

    pub fn into_parts(self) -> (Vec<Transaction>, Option<Decimal>, Vec<Warning>) {
        (self.transactions, self.opening_balance, self.warnings)
    }
}

/// Flag a row whose balance arithmetic does not fit in a [`Decimal`].
pub(crate) fn report_out_of_range(row: usize, txn: &mut Transaction, warnings: &mut Vec<Warning>) {
    txn.flag(WarningKind::MalformedLine);
    warnings.push(Warning::new(
        WarningKind::MalformedLine,
        Some(row),
        format!("balance {} is out of range for continuity checks", txn.balance),
    ));
}

enum Continuity {
    Mismatch(String),
    OutOfRange,
}

fn continuity_error(txn: &Transaction, prev: Decimal, tolerance: Decimal) -> Option<Continuity> {
    // Already reported by the inferencer.
    if txn.has_warning(WarningKind::IndeterminateDirection) || txn.has_warning(WarningKind::MalformedLine) {
        return None;
    }

    if let Some(signed) = txn.signed_amount() {
        let Some(expected) = prev.checked_add(signed) else {
            return Some(Continuity::OutOfRange);
        };
        let Some(gap) = expected.checked_sub(txn.balance) else {
            return Some(Continuity::OutOfRange);
        };
        return (gap.abs() > tolerance).then(|| {
            Continuity::Mismatch(format!(
                "expected balance {}, statement shows {}",
                expected, txn.balance
            ))
        });
    }

    // Undirected rows: only the size of the move can be checked.
    let amount = txn.amount?;
    let Some(moved) = txn.balance.checked_sub(prev).map(|m| m.abs()) else {
        return Some(Continuity::OutOfRange);
    };
    let Some(gap) = moved.checked_sub(amount.abs()) else {
        return Some(Continuity::OutOfRange);
    };
    (gap.abs() > tolerance).then(|| {
        Continuity::Mismatch(format!(
            "balance moved by {} from {} but the amount is {}",
            moved, prev, amount
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    fn d(units: i64) -> Decimal {
        Decimal::new(units, 2)
    }

    fn tol() -> Decimal {
        Decimal::new(1, 2)
    }

    #[test]
    fn test_opening_then_matching_credit_is_clean() {
        let records = vec![
            Transaction::opening_balance(d(50000)),
            Transaction::new("SALARY", d(70000)).with_amount(Some(d(20000))),
        ];
        let ledger = Ledger::assemble(records, Vec::new(), tol());
        assert_eq!(ledger.opening_balance(), Some(d(50000)));
        assert!(ledger.is_clean(), "{:?}", ledger.warnings());
    }

    #[test]
    fn test_opening_then_wrong_balance_warns_once() {
        let records = vec![
            Transaction::opening_balance(d(50000)),
            Transaction::new("SALARY", d(80000)).with_amount(Some(d(20000))),
        ];
        let ledger = Ledger::assemble(records, Vec::new(), tol());
        assert_eq!(ledger.warnings().len(), 1);
        assert_eq!(ledger.warnings()[0].kind, WarningKind::BalanceMismatch);
        assert_eq!(ledger.warnings()[0].row, Some(1));
        assert!(ledger.transactions()[1].has_warning(WarningKind::BalanceMismatch));
    }

    #[test]
    fn test_directed_rows_checked_with_sign() {
        let records = vec![
            Transaction::opening_balance(d(100000)),
            Transaction::new("ATM", d(95000)).with_posting(Direction::Debit, d(5000)),
            // Wrong side: a credit that lowered the balance.
            Transaction::new("REFUND", d(90000)).with_posting(Direction::Credit, d(5000)),
        ];
        let ledger = Ledger::assemble(records, Vec::new(), tol());
        assert_eq!(ledger.warnings().len(), 1);
        assert_eq!(ledger.warnings()[0].row, Some(2));
        assert!(ledger.warnings()[0].message.contains("expected balance 1000.00"));
    }

    #[test]
    fn test_tolerance_absorbs_rounding() {
        let records = vec![
            Transaction::opening_balance(d(10000)),
            Transaction::new("INT", d(10101)).with_posting(Direction::Credit, d(100)),
        ];
        let ledger = Ledger::assemble(records, Vec::new(), tol());
        assert!(ledger.is_clean());
    }

    #[test]
    fn test_no_anchor_leaves_opening_unset() {
        let records = vec![
            Transaction::new("A", d(1000)).with_amount(Some(d(1000))),
            Transaction::new("B", d(1500)).with_posting(Direction::Credit, d(500)),
        ];
        let ledger = Ledger::assemble(records, Vec::new(), tol());
        assert_eq!(ledger.opening_balance(), None);
        assert!(ledger.is_clean());
        assert_eq!(ledger.closing_balance(), Some(d(1500)));
    }

    #[test]
    fn test_brought_forward_break_is_reported() {
        let records = vec![
            Transaction::opening_balance(d(10000)),
            Transaction::new("A", d(12000)).with_posting(Direction::Credit, d(2000)),
            Transaction::brought_forward(d(15000)),
            Transaction::new("B", d(14000)).with_posting(Direction::Debit, d(1000)),
        ];
        let ledger = Ledger::assemble(records, Vec::new(), tol());
        assert_eq!(ledger.warnings().len(), 1);
        assert_eq!(ledger.warnings()[0].row, Some(2));
    }

    #[test]
    fn test_carried_warnings_come_first_and_order_is_stable() {
        let carried = vec![Warning::malformed("line 'XYZ' has no balance")];
        let records = vec![
            Transaction::opening_balance(d(100)),
            Transaction::new("late", d(50)).with_posting(Direction::Credit, d(50)),
        ];
        let ledger = Ledger::assemble(records, carried, tol());
        assert_eq!(ledger.warnings()[0].kind, WarningKind::MalformedLine);
        assert_eq!(ledger.warnings()[1].kind, WarningKind::BalanceMismatch);
        assert_eq!(ledger.transactions()[1].narration, "late");
    }

    #[test]
    fn test_out_of_range_posting_is_malformed_not_a_panic() {
        let records = vec![
            Transaction::opening_balance(Decimal::MAX),
            Transaction::new("HUGE", Decimal::MAX).with_posting(Direction::Credit, Decimal::MAX),
            Transaction::brought_forward(Decimal::MIN),
        ];
        let ledger = Ledger::assemble(records, Vec::new(), tol());
        let kinds: Vec<_> = ledger.warnings().iter().map(|w| (w.kind, w.row)).collect();
        assert_eq!(
            kinds,
            vec![
                (WarningKind::MalformedLine, Some(1)),
                (WarningKind::MalformedLine, Some(2)),
            ]
        );
        assert!(ledger.transactions()[1].has_warning(WarningKind::MalformedLine));
    }

    #[test]
    fn test_warning_display() {
        let w = Warning::new(WarningKind::BalanceMismatch, Some(0), "boom");
        assert_eq!(w.to_string(), "row 1: balance mismatch: boom");
    }
}
