//! passbook-ingest: statement documents, line reconstruction and the
//! per-institution format adapters, joined into one parsing pipeline.

pub mod adapter;
pub mod document;
pub mod error;
pub mod institution;
pub mod metadata;
pub mod parsers;
pub mod pipeline;
pub mod reconstruct;

pub use adapter::{FormatAdapter, Layout, MalformedRecord, ParseContext, Record, RecordResult, TableRow};
pub use document::{Document, Grid, Page};
pub use error::{IngestError, Result};
pub use institution::{Institution, detect_institution};
pub use metadata::MetadataSchema;
pub use pipeline::{ParsedStatement, StatementParser, parse};
pub use reconstruct::{LineRules, LogicalLine, RawLine, Reconstructor, WrapMode, reconstruct};
