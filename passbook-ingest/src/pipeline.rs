//! The shared pipeline: document → records → inference → validated ledger,
//! with header metadata and keyword counts alongside.
//!
//! One [`StatementParser`] owns its adapter and configuration; a run borrows
//! the document and allocates everything else itself, so parsers can be used
//! from several threads on different documents at once.

use passbook_analytics::keyword_frequency;
use passbook_core::{Ledger, Metadata, PipelineConfig, Transaction, Warning, infer};
use serde::{Deserialize, Serialize};

use crate::adapter::{FormatAdapter, Layout, ParseContext, Record};
use crate::document::Document;
use crate::error::{IngestError, Result};
use crate::institution::Institution;
use crate::reconstruct::reconstruct;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedStatement {
    pub institution: Institution,
    pub metadata: Metadata,
    pub ledger: Ledger,
    /// (WORD, count), most frequent first
    pub keyword_frequency: Vec<(String, usize)>,
}

pub struct StatementParser {
    adapter: Box<dyn FormatAdapter>,
    config: PipelineConfig,
}

impl StatementParser {
    pub fn new(institution: Institution, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            adapter: institution.adapter()?,
            config,
        })
    }

    pub fn institution(&self) -> Institution {
        self.adapter.institution()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Parse one document. Fails only when the document has no readable
    /// content at all; everything else is reported as ledger warnings.
    pub fn parse(&self, document: &Document) -> Result<ParsedStatement> {
        if !document.is_readable() {
            return Err(IngestError::UnreadableDocument {
                pages: document.pages.len(),
            });
        }

        let ctx = ParseContext::new(&self.config);
        let header = document.header_lines(self.config.header_lines);
        let metadata = self.adapter.parse_metadata_header(&header, &ctx);

        let (mut records, mut warnings) = self.extract_records(document, &ctx);
        warnings.extend(infer(&mut records, self.config.balance_tolerance));
        let ledger = Ledger::assemble(records, warnings, self.config.balance_tolerance);
        let keyword_frequency = keyword_frequency(ledger.transactions(), self.config.min_keyword_len);

        log::info!(
            "{}: {} rows, {} warnings",
            self.institution(),
            ledger.transactions().len(),
            ledger.warnings().len()
        );

        Ok(ParsedStatement {
            institution: self.institution(),
            metadata,
            ledger,
            keyword_frequency,
        })
    }

    fn extract_records(&self, document: &Document, ctx: &ParseContext) -> (Vec<Transaction>, Vec<Warning>) {
        let mut records = Vec::new();
        let mut warnings = Vec::new();
        let mut skipped = 0usize;

        let layout = self.adapter.layout();
        if matches!(layout, Layout::Table) && !document.has_tables() {
            let message = format!(
                "no tables found; {} statements are read from table cells",
                self.institution().display_name()
            );
            log::warn!("{message}");
            warnings.push(Warning::malformed(message));
        }

        let mut take = |record: Record<'_>| match self.adapter.parse_record(record, ctx) {
            Ok(Some(txn)) => records.push(txn),
            Ok(None) => skipped += 1,
            Err(malformed) => {
                log::warn!("dropped record: {malformed}");
                warnings.push(Warning::malformed(malformed.to_string()));
            }
        };

        match layout {
            Layout::Text(rules) => {
                for line in reconstruct(rules, document.raw_lines()) {
                    take(Record::Line(&line));
                }
            }
            Layout::Table => {
                for row in self.adapter.normalize_tables(&document.tables()) {
                    take(Record::Row(&row));
                }
            }
        }

        log::debug!("{} records kept, {} non-transaction records skipped", records.len(), skipped);
        (records, warnings)
    }
}

/// Parse `document` as a statement from `institution`.
pub fn parse(document: &Document, institution: Institution, config: &PipelineConfig) -> Result<ParsedStatement> {
    StatementParser::new(institution, config.clone())?.parse(document)
}
