//! Debit/credit inference from consecutive running balances.
//!
//! This is a fallback for layouts that print a single amount column with no
//! Cr/Dr marker. A rising balance means credit and a falling one means debit.
//! A zero delta cannot be classified and is reported rather than guessed;
//! the same goes for rows with no preceding balance to compare against.

use rust_decimal::Decimal;

use crate::ledger::{Warning, WarningKind, report_out_of_range};
use crate::types::{Direction, Transaction};

/// Fill in debit/credit for every undirected row, in document order.
///
/// Returns the warnings raised; row-scoped ones are also flagged on the row.
pub fn infer(transactions: &mut [Transaction], tolerance: Decimal) -> Vec<Warning> {
    let mut warnings = Vec::new();
    let mut previous: Option<Decimal> = None;

    for (row, txn) in transactions.iter_mut().enumerate() {
        if txn.is_normal() && txn.direction().is_none() {
            match previous.map(|p| txn.balance.checked_sub(p)) {
                Some(None) => report_out_of_range(row, txn, &mut warnings),
                delta => {
                    let delta = delta.flatten();
                    if txn.alternate_amount.is_some() {
                        choose_reading(row, txn, delta, tolerance, &mut warnings);
                    }
                    infer_row(row, txn, delta, &mut warnings);
                }
            }
        }
        previous = Some(txn.balance);
    }

    warnings
}

/// Pick between the primary and alternate amount readings, preferring the one
/// that explains the balance move. Always reported: the choice is a guess.
fn choose_reading(
    row: usize,
    txn: &mut Transaction,
    delta: Option<Decimal>,
    tolerance: Decimal,
    warnings: &mut Vec<Warning>,
) {
    let Some(alternate) = txn.alternate_amount.take() else {
        return;
    };
    let primary = txn.amount;

    let moved = delta.map(|d| d.abs());
    let fits = |candidate: Decimal| {
        moved
            .and_then(|m| m.checked_sub(candidate.abs()))
            .is_some_and(|diff| diff.abs() <= tolerance)
    };

    let swap = !primary.is_some_and(fits) && fits(alternate);
    if swap {
        txn.amount = Some(alternate);
    }

    let chosen = txn.amount.map(|a| a.to_string()).unwrap_or_else(|| "none".to_string());
    let other = if swap {
        primary.map(|a| a.to_string()).unwrap_or_else(|| "none".to_string())
    } else {
        alternate.to_string()
    };
    txn.flag(WarningKind::AmbiguousAmount);
    warnings.push(Warning::new(
        WarningKind::AmbiguousAmount,
        Some(row),
        format!("read amount as {chosen} rather than {other}; narration left as printed"),
    ));
}

fn infer_row(row: usize, txn: &mut Transaction, delta: Option<Decimal>, warnings: &mut Vec<Warning>) {
    // An explicit Cr/Dr marker outranks the balance comparison. Without an
    // amount, a flat balance gives nothing to post.
    if let Some(direction) = txn.direction_hint {
        let moved = delta.filter(|d| !d.is_zero()).map(|d| d.abs());
        if let Some(amount) = txn.amount.or(moved) {
            txn.resolve(direction, amount.abs());
            return;
        }
    }

    match delta {
        Some(d) if d > Decimal::ZERO => {
            let amount = txn.amount.unwrap_or(d);
            txn.resolve(Direction::Credit, amount.abs());
        }
        Some(d) if d < Decimal::ZERO => {
            let amount = txn.amount.unwrap_or(-d);
            txn.resolve(Direction::Debit, amount.abs());
        }
        Some(_) => {
            txn.flag(WarningKind::IndeterminateDirection);
            warnings.push(Warning::new(
                WarningKind::IndeterminateDirection,
                Some(row),
                "zero balance delta",
            ));
        }
        None => {
            txn.flag(WarningKind::IndeterminateDirection);
            warnings.push(Warning::new(
                WarningKind::IndeterminateDirection,
                Some(row),
                "no preceding balance",
            ));
        }
    }
}
