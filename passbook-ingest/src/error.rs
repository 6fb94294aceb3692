//! Errors raised by the ingest pipeline.
//!
//! Only conditions that leave nothing to parse are errors. Bad lines, balance
//! breaks and missing header fields are reported through the ledger instead.

use passbook_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("document is unreadable: none of its {pages} page(s) produced text or table cells")]
    UnreadableDocument { pages: usize },

    #[error("unknown institution `{given}` (expected one of: {expected})")]
    UnknownInstitution { given: String, expected: String },

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, IngestError>;
