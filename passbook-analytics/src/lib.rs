//! passbook-analytics: keyword frequency and headline totals over a parsed ledger.

pub mod keywords;
pub mod summary;

pub use keywords::{count_words, frequent, keyword_frequency};
pub use summary::StatementSummary;
