//! The document handed over by the reader: ordered pages of flattened text,
//! each optionally carrying the raw cell grid of a detected table.

use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::error::Result;
use crate::reconstruct::RawLine;

/// Rows of cells; `None` is a cell the reader saw but could not fill.
pub type Grid = Vec<Vec<Option<String>>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub table: Option<Grid>,
}

impl Page {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            table: None,
        }
    }

    pub fn with_table(mut self, table: Grid) -> Self {
        self.table = Some(table);
        self
    }

    fn has_content(&self) -> bool {
        !self.text.trim().is_empty()
            || self.table.as_ref().is_some_and(|grid| {
                grid.iter()
                    .flatten()
                    .any(|cell| cell.as_deref().is_some_and(|c| !c.trim().is_empty()))
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    /// Plain text, pages separated by form feeds (as `pdftotext` writes them).
    pub fn from_text(text: &str) -> Self {
        Self::new(text.split('\x0c').map(Page::text).collect())
    }

    /// A JSON page dump: `{"pages": [{"text": "...", "table": [[...]]}]}`.
    pub fn from_json_reader(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// True if at least one page has text or a non-empty table cell.
    pub fn is_readable(&self) -> bool {
        self.pages.iter().any(Page::has_content)
    }

    pub fn has_tables(&self) -> bool {
        self.pages.iter().any(|p| p.table.is_some())
    }

    /// Page index and cell grid of every page that carries a table.
    pub fn tables(&self) -> Vec<(usize, &Grid)> {
        self.pages
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.table.as_ref().map(|grid| (i, grid)))
            .collect()
    }

    /// Every non-blank physical line, trimmed, in page order.
    pub fn raw_lines(&self) -> impl Iterator<Item = RawLine> + '_ {
        self.pages.iter().enumerate().flat_map(|(page, p)| {
            p.text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(move |l| RawLine::new(page, l))
        })
    }

    /// The first `limit` non-blank lines of the first page that has text.
    pub fn header_lines(&self, limit: usize) -> Vec<&str> {
        self.pages
            .iter()
            .find(|p| !p.text.trim().is_empty())
            .map(|p| {
                p.text
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .take(limit)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_feed_splits_pages() {
        let doc = Document::from_text("page one\nline 2\x0cpage two");
        assert_eq!(doc.pages.len(), 2);
        let lines: Vec<_> = doc.raw_lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].page, 1);
        assert_eq!(lines[2].text, "page two");
    }

    #[test]
    fn test_json_dump_with_table() {
        let doc = Document::from_json_str(
            r#"{"pages":[{"text":"HEADER"},{"table":[["a",null],["b","c"]]}]}"#,
        )
        .unwrap();
        assert!(doc.is_readable());
        assert!(doc.has_tables());
        let tables = doc.tables();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].0, 1);
        assert_eq!(doc.pages[1].text, "");
        assert_eq!(doc.pages[1].table.as_ref().unwrap()[0][1], None);
    }

    #[test]
    fn test_blank_pages_are_unreadable() {
        let doc = Document::new(vec![
            Page::text("   \n"),
            Page::default().with_table(vec![vec![None, Some(" ".to_string())]]),
        ]);
        assert!(!doc.is_readable());
    }

    #[test]
    fn test_header_lines_skip_blank_first_page() {
        let doc = Document::from_text("\n\x0c  ACME BANK \n\nAccount No : 1\nthird");
        assert_eq!(doc.header_lines(2), vec!["ACME BANK", "Account No : 1"]);
    }
}
