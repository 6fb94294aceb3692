//! Normalized transaction types shared by every institution adapter.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ledger::WarningKind;

/// Which side of the account a posting hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "debit")]
    Debit,
    #[serde(rename = "credit")]
    Credit,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Debit => f.write_str("debit"),
            Direction::Credit => f.write_str("credit"),
        }
    }
}

/// Row classification. Only `Normal` rows move money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowKind {
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "opening-balance")]
    OpeningBalance,
    #[serde(rename = "brought-forward")]
    BroughtForward,
}

impl RowKind {
    /// Opening-balance and brought-forward rows seed the running balance.
    pub fn is_anchor(&self) -> bool {
        !matches!(self, RowKind::Normal)
    }
}

/// One statement row after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Posting date
    pub date: Option<NaiveDate>,
    pub value_date: Option<NaiveDate>,
    /// Cheque number, transaction id or other reference
    pub reference: Option<String>,
    pub narration: String,
    pub debit: Option<Decimal>,
    pub credit: Option<Decimal>,
    /// Running balance after this row
    pub balance: Decimal,
    pub kind: RowKind,

    /// Transaction amount whose direction is not yet known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,

    /// Direction signalled by a Cr/Dr marker on the source line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction_hint: Option<Direction>,

    /// Competing amount reading when the amount/narration boundary is unclear.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_amount: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<WarningKind>,
}

impl Transaction {
    pub fn new(narration: impl Into<String>, balance: Decimal) -> Self {
        Self {
            date: None,
            value_date: None,
            reference: None,
            narration: narration.into(),
            debit: None,
            credit: None,
            balance,
            kind: RowKind::Normal,
            amount: None,
            direction_hint: None,
            alternate_amount: None,
            warnings: Vec::new(),
        }
    }

    pub fn opening_balance(balance: Decimal) -> Self {
        Self {
            kind: RowKind::OpeningBalance,
            ..Self::new("OPENING BALANCE", balance)
        }
    }

    pub fn brought_forward(balance: Decimal) -> Self {
        Self {
            kind: RowKind::BroughtForward,
            ..Self::new("BROUGHT FORWARD", balance)
        }
    }

    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }

    pub fn with_value_date(mut self, date: Option<NaiveDate>) -> Self {
        self.value_date = date;
        self
    }

    pub fn with_reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference.filter(|r| !r.trim().is_empty());
        self
    }

    pub fn with_amount(mut self, amount: Option<Decimal>) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_hint(mut self, hint: Option<Direction>) -> Self {
        self.direction_hint = hint;
        self
    }

    pub fn with_alternate(mut self, alternate: Option<Decimal>) -> Self {
        self.alternate_amount = alternate;
        self
    }

    /// Set an explicit debit or credit, as when the source separates the columns.
    pub fn with_posting(mut self, direction: Direction, amount: Decimal) -> Self {
        self.resolve(direction, amount);
        self
    }

    /// Fix the direction of this row. Clears any pending amount readings.
    pub fn resolve(&mut self, direction: Direction, amount: Decimal) {
        match direction {
            Direction::Debit => {
                self.debit = Some(amount);
                self.credit = None;
            }
            Direction::Credit => {
                self.credit = Some(amount);
                self.debit = None;
            }
        }
        self.amount = None;
        self.alternate_amount = None;
    }

    pub fn is_normal(&self) -> bool {
        self.kind == RowKind::Normal
    }

    pub fn direction(&self) -> Option<Direction> {
        match (self.debit, self.credit) {
            (Some(_), None) => Some(Direction::Debit),
            (None, Some(_)) => Some(Direction::Credit),
            _ => None,
        }
    }

    /// Credit minus debit, when the direction is known.
    pub fn signed_amount(&self) -> Option<Decimal> {
        match (self.debit, self.credit) {
            (Some(d), None) => Some(-d),
            (None, Some(c)) => Some(c),
            _ => None,
        }
    }

    pub fn has_warning(&self, kind: WarningKind) -> bool {
        self.warnings.contains(&kind)
    }

    pub(crate) fn flag(&mut self, kind: WarningKind) {
        if !self.warnings.contains(&kind) {
            self.warnings.push(kind);
        }
    }
}
