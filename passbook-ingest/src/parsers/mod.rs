//! One adapter per supported institution.

pub mod axis;
pub mod central_bank;
pub mod iob;
pub mod kotak;
pub mod rbl;
pub mod sbi;

#[cfg(test)]
pub(crate) mod fixture {
    //! Helpers for adapter tests: run a text fixture through the same
    //! reconstruct-then-parse path the pipeline uses.

    use passbook_core::Transaction;

    use crate::adapter::{FormatAdapter, Layout, ParseContext, Record};
    use crate::document::Document;
    use crate::reconstruct::reconstruct;

    pub fn parse_text(adapter: &dyn FormatAdapter, text: &str) -> (Vec<Transaction>, Vec<String>) {
        let Layout::Text(rules) = adapter.layout() else {
            panic!("not a text adapter");
        };
        let ctx = ParseContext::default();
        let doc = Document::from_text(text);
        let mut rows = Vec::new();
        let mut dropped = Vec::new();
        for line in reconstruct(rules, doc.raw_lines()) {
            match adapter.parse_record(Record::Line(&line), &ctx) {
                Ok(Some(t)) => rows.push(t),
                Ok(None) => {}
                Err(e) => dropped.push(e.to_string()),
            }
        }
        (rows, dropped)
    }

    pub fn header(text: &str) -> Vec<&str> {
        text.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
    }
}
