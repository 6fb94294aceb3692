//! passbook-core: normalized ledger types and the institution-independent
//! half of the statement pipeline (amount classification, direction
//! inference, ledger assembly and validation).

pub mod amount;
pub mod config;
pub mod direction;
pub mod error;
pub mod ledger;
pub mod metadata;
pub mod types;

pub use amount::{classify, AmountClassifier, AmountToken, TokenKind};
pub use config::PipelineConfig;
pub use direction::infer;
pub use error::{CoreError, Result};
pub use ledger::{Ledger, Warning, WarningKind};
pub use metadata::{keys, Metadata};
pub use types::{Direction, RowKind, Transaction};
