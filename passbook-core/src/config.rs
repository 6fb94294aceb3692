//! Pipeline tunables. Passed into each run; nothing here is global.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::{AmountClassifier, DEFAULT_MAX_BARE_DIGITS};
use crate::error::{CoreError, Result};
use crate::metadata::DEFAULT_MISSING;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Largest |expected - actual| balance difference accepted as continuous
    pub balance_tolerance: Decimal,
    /// Bare digit runs longer than this are identifiers, not amounts
    pub max_bare_amount_digits: usize,
    /// Physical lines of the first page searched for header fields
    pub header_lines: usize,
    /// Shortest narration word counted by the keyword aggregator
    pub min_keyword_len: usize,
    /// Sentinel for header fields that were not found
    pub missing_value: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            balance_tolerance: Decimal::new(1, 2),
            max_bare_amount_digits: DEFAULT_MAX_BARE_DIGITS,
            header_lines: 40,
            min_keyword_len: 3,
            missing_value: DEFAULT_MISSING.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.balance_tolerance.is_sign_negative() {
            return Err(CoreError::InvalidConfig(format!(
                "balance_tolerance must not be negative (got {})",
                self.balance_tolerance
            )));
        }
        if self.max_bare_amount_digits == 0 {
            return Err(CoreError::InvalidConfig(
                "max_bare_amount_digits must be at least 1".to_string(),
            ));
        }
        if self.header_lines == 0 {
            return Err(CoreError::InvalidConfig("header_lines must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn classifier(&self) -> AmountClassifier {
        AmountClassifier::new(self.max_bare_amount_digits)
    }
}
