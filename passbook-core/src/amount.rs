//! Amount token classification.
//!
//! Extracted statement text mixes money with cheque serials, reference ids and
//! account numbers. A token counts as an amount when it has a one- or
//! two-digit fraction, or when it is a short bare integer. Longer bare digit
//! runs are treated as identifiers; the cut-off is tuned per deployment
//! through [`crate::PipelineConfig::max_bare_amount_digits`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::Direction;

pub const DEFAULT_MAX_BARE_DIGITS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Amount,
    Identifier,
}

/// A classified token. `value` is only set for amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountToken {
    pub raw: String,
    pub value: Option<Decimal>,
    pub kind: TokenKind,
    /// Cr/Dr marker that was attached to the amount
    pub suffix: Option<Direction>,
}

impl AmountToken {
    pub fn is_amount(&self) -> bool {
        self.kind == TokenKind::Amount
    }

    fn identifier(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            value: None,
            kind: TokenKind::Identifier,
            suffix: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountClassifier {
    max_bare_digits: usize,
}

impl Default for AmountClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BARE_DIGITS)
    }
}

impl AmountClassifier {
    pub fn new(max_bare_digits: usize) -> Self {
        Self { max_bare_digits }
    }

    /// Classify a whitespace-delimited token from statement text.
    pub fn classify(&self, token: &str) -> AmountToken {
        classify_with_limit(token, Some(self.max_bare_digits))
    }

    /// Parse a cell already known to hold an amount (a debit/credit/balance
    /// column). The bare-integer length limit does not apply here.
    pub fn parse_cell(&self, cell: &str) -> Option<AmountToken> {
        let token = classify_with_limit(cell, None);
        token.is_amount().then_some(token)
    }
}

/// Classify with the default bare-integer limit.
pub fn classify(token: &str) -> AmountToken {
    AmountClassifier::default().classify(token)
}

fn classify_with_limit(token: &str, max_bare_digits: Option<usize>) -> AmountToken {
    let raw = token.trim();
    let cleaned: String = raw.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();

    let (body, suffix) = strip_direction_suffix(&cleaned);
    let (body, negative) = strip_parentheses(body);

    let value = if is_fractional(body) {
        Decimal::from_str(body).ok()
    } else if is_bare_integer(body, max_bare_digits) {
        Decimal::from_str(body).ok()
    } else {
        None
    };

    match value {
        Some(v) => AmountToken {
            raw: raw.to_string(),
            value: Some(if negative { -v } else { v }),
            kind: TokenKind::Amount,
            suffix,
        },
        None => AmountToken::identifier(raw),
    }
}

fn strip_direction_suffix(s: &str) -> (&str, Option<Direction>) {
    let lower = s.to_ascii_lowercase();
    for (marker, direction) in [
        ("(cr)", Direction::Credit),
        ("(dr)", Direction::Debit),
        ("cr", Direction::Credit),
        ("dr", Direction::Debit),
    ] {
        if lower.ends_with(marker) {
            return (&s[..s.len() - marker.len()], Some(direction));
        }
    }
    (s, None)
}

fn strip_parentheses(s: &str) -> (&str, bool) {
    match s.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
        Some(inner) => (inner, true),
        None => (s, false),
    }
}

/// `-?digits.digits{1,2}`
fn is_fractional(s: &str) -> bool {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let Some((whole, frac)) = unsigned.split_once('.') else {
        return false;
    };
    !whole.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && (1..=2).contains(&frac.len())
        && frac.bytes().all(|b| b.is_ascii_digit())
}

fn is_bare_integer(s: &str, max_digits: Option<usize>) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| b.is_ascii_digit())
        && max_digits.is_none_or(|max| s.len() <= max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thousands_separator_amount() {
        let tok = classify("1,234.56");
        assert_eq!(tok.kind, TokenKind::Amount);
        assert_eq!(tok.value, Some(Decimal::new(123456, 2)));
        assert_eq!(tok.raw, "1,234.56");
    }

    #[test]
    fn test_long_digit_run_is_identifier() {
        let tok = classify("123456789");
        assert_eq!(tok.kind, TokenKind::Identifier);
        assert_eq!(tok.value, None);
    }

    #[test]
    fn test_short_integer_is_amount() {
        assert_eq!(classify("0").value, Some(Decimal::ZERO));
        assert_eq!(classify("1000").value, Some(Decimal::new(1000, 0)));
        assert!(classify("123456").is_amount());
        assert!(!classify("1234567").is_amount());
    }

    #[test]
    fn test_parenthesised_credit_suffix() {
        let tok = classify("45.00(Cr)");
        assert_eq!(tok.kind, TokenKind::Amount);
        assert_eq!(tok.value, Some(Decimal::new(4500, 2)));
        assert_eq!(tok.suffix, Some(Direction::Credit));
    }

    #[test]
    fn test_bare_suffixes_any_case() {
        let tok = classify("12,500.75Dr");
        assert_eq!(tok.value, Some(Decimal::new(1250075, 2)));
        assert_eq!(tok.suffix, Some(Direction::Debit));

        let tok = classify("300.00CR");
        assert_eq!(tok.suffix, Some(Direction::Credit));
    }

    #[test]
    fn test_parentheses_mean_negative() {
        let tok = classify("(1,000.00)");
        assert_eq!(tok.value, Some(Decimal::new(-100000, 2)));
    }

    #[test]
    fn test_non_amounts() {
        for raw in ["-", "", "UPI/1234/PAY", "12.345", "1.2.3", "ADDR", "S42347939"] {
            assert!(!classify(raw).is_amount(), "{raw} should be an identifier");
        }
        assert_eq!(classify("ADDR").suffix, None);
    }

    #[test]
    fn test_negative_fraction() {
        assert_eq!(classify("-15.00").value, Some(Decimal::new(-1500, 2)));
    }

    #[test]
    fn test_custom_limit() {
        let classifier = AmountClassifier::new(4);
        assert!(classifier.classify("1234").is_amount());
        assert!(!classifier.classify("12345").is_amount());
    }

    #[test]
    fn test_parse_cell_ignores_digit_limit() {
        let classifier = AmountClassifier::default();
        let tok = classifier.parse_cell("12345678").unwrap();
        assert_eq!(tok.value, Some(Decimal::new(12345678, 0)));
        assert!(classifier.parse_cell("-").is_none());
        assert!(classifier.parse_cell("  ").is_none());
    }
}
