//! Header metadata extraction.
//!
//! Each adapter describes its header as a [`MetadataSchema`]: single-line
//! `Label : value` fields plus multi-line blocks (addresses) that run until a
//! terminating label. Every declared key is present in the result; fields the
//! header does not carry hold the configured missing-value sentinel.

use passbook_core::{Metadata, keys};
use regex::Regex;

/// Longest address block accepted before giving up on a terminator.
const MAX_BLOCK_LINES: usize = 6;

#[derive(Debug, Clone)]
struct FieldRule {
    key: &'static str,
    pattern: Regex,
}

#[derive(Debug, Clone)]
struct BlockRule {
    key: &'static str,
    start: Regex,
    stop: Regex,
}

#[derive(Debug, Clone)]
pub struct MetadataSchema {
    bank: &'static str,
    fields: Vec<FieldRule>,
    blocks: Vec<BlockRule>,
}

impl MetadataSchema {
    pub fn new(bank: &'static str) -> Self {
        Self {
            bank,
            fields: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// A single-line field. Group 1 is the value; when the pattern has a
    /// second group (a date range), the two are joined with " to ".
    pub fn field(mut self, key: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        self.fields.push(FieldRule {
            key,
            pattern: Regex::new(pattern)?,
        });
        Ok(self)
    }

    /// A block starting on the line matching `start` (text after the match
    /// is the first part) and running until a line matching `stop`.
    pub fn block(mut self, key: &'static str, start: &str, stop: &str) -> Result<Self, regex::Error> {
        self.blocks.push(BlockRule {
            key,
            start: Regex::new(start)?,
            stop: Regex::new(stop)?,
        });
        Ok(self)
    }

    pub fn bank(&self) -> &'static str {
        self.bank
    }

    pub fn extract(&self, lines: &[&str], missing: &str) -> Metadata {
        let mut md = Metadata::new(missing);
        for key in [
            keys::ACCOUNT_HOLDER,
            keys::ACCOUNT_HOLDER_ADDRESS,
            keys::ACCOUNT_NUMBER,
            keys::BRANCH,
            keys::BRANCH_ADDRESS,
            keys::STATEMENT_PERIOD,
            keys::CURRENCY,
        ] {
            md.declare(key);
        }
        md.set(keys::BANK, self.bank);

        let text = lines.join("\n");
        for rule in &self.fields {
            md.declare(rule.key);
            if let Some(value) = capture_value(&rule.pattern, &text) {
                md.set_if_missing(rule.key, value);
            }
        }

        for rule in &self.blocks {
            md.declare(rule.key);
            if let Some(value) = capture_block(rule, lines) {
                md.set_if_missing(rule.key, value);
            }
        }

        log::debug!(
            "{}: {} of {} header fields found",
            self.bank,
            md.iter().filter(|(k, _)| md.is_found(k)).count(),
            md.len()
        );
        md
    }
}

fn capture_value(pattern: &Regex, text: &str) -> Option<String> {
    let caps = pattern.captures(text)?;
    let first = caps.get(1)?.as_str().trim();
    let value = match caps.get(2) {
        Some(second) => format!("{} to {}", first, second.as_str().trim()),
        None => first.to_string(),
    };
    (!value.is_empty()).then_some(value)
}

fn capture_block(rule: &BlockRule, lines: &[&str]) -> Option<String> {
    let (at, found) = lines
        .iter()
        .enumerate()
        .find_map(|(i, l)| rule.start.find(l).map(|m| (i, m)))?;

    let head = lines[at][found.end()..].trim().trim_start_matches(':').trim();
    let mut parts: Vec<&str> = Vec::new();
    if !head.is_empty() {
        parts.push(head);
    }
    parts.extend(
        lines[at + 1..]
            .iter()
            .take(MAX_BLOCK_LINES)
            .take_while(|l| !rule.stop.is_match(l))
            .map(|l| l.trim()),
    );
    let value = parts.join(" ");
    (!value.is_empty()).then_some(value)
}

/// The first line made only of upper-case letters, spaces and name
/// punctuation that contains none of `exclude`.
pub(crate) fn first_name_line<'a>(lines: &[&'a str], exclude: &[&str]) -> Option<&'a str> {
    lines.iter().copied().find(|line| {
        let upper = line.to_uppercase();
        line.chars().any(char::is_alphabetic)
            && line
                .chars()
                .all(|c| c.is_ascii_uppercase() || c == ' ' || c == '.' || c == '/' || c == '&')
            && !exclude.iter().any(|x| upper.contains(x))
    })
}

/// Cut a two-column header line at the first right-hand label.
pub(crate) fn left_column<'a>(line: &'a str, labels: &[&str]) -> &'a str {
    let cut = labels
        .iter()
        .filter_map(|label| line.find(label))
        .min()
        .unwrap_or(line.len());
    line[..cut].trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> MetadataSchema {
        MetadataSchema::new("ACME BANK")
            .field(keys::ACCOUNT_NUMBER, r"(?mi)Account\s+No\.?\s*:\s*(\d+)")
            .unwrap()
            .field(
                keys::STATEMENT_PERIOD,
                r"(?mi)Period\s*:\s*(\d{2}-\d{2}-\d{4})\s+to\s+(\d{2}-\d{2}-\d{4})",
            )
            .unwrap()
            .field("IFSC Code", r"(?mi)IFSC\s+Code\s*:\s*([A-Z0-9]+)")
            .unwrap()
            .block(keys::BRANCH_ADDRESS, r"(?i)Branch\s+Address", r"(?i)Phone|IFSC")
            .unwrap()
    }

    #[test]
    fn test_fields_blocks_and_sentinels() {
        let lines = vec![
            "ACME BANK",
            "Account No : 0012345678",
            "Period : 01-04-2022 to 30-06-2022",
            "Branch Address : 12 MG ROAD",
            "BANGALORE 560001",
            "Phone : 080-1234",
        ];
        let md = schema().extract(&lines, "N/A");
        assert_eq!(md.get(keys::BANK), "ACME BANK");
        assert_eq!(md.get(keys::ACCOUNT_NUMBER), "0012345678");
        assert_eq!(md.get(keys::STATEMENT_PERIOD), "01-04-2022 to 30-06-2022");
        assert_eq!(md.get(keys::BRANCH_ADDRESS), "12 MG ROAD BANGALORE 560001");
        assert_eq!(md.get("IFSC Code"), "N/A");
        assert!(!md.is_found("IFSC Code"));
        assert_eq!(md.get(keys::ACCOUNT_HOLDER), "N/A");
    }

    #[test]
    fn test_empty_header_uses_sentinel_everywhere() {
        let md = schema().extract(&[], "");
        assert_eq!(md.get(keys::ACCOUNT_NUMBER), "");
        assert_eq!(md.get(keys::BANK), "ACME BANK");
        assert!(md.len() >= 8);
    }

    #[test]
    fn test_name_and_column_helpers() {
        let lines = ["ACME BANK LTD", "Account No : 1", "RAVI KUMAR", "12 MG ROAD"];
        assert_eq!(first_name_line(&lines, &["ACME"]), Some("RAVI KUMAR"));
        assert_eq!(
            left_column("12 MG ROAD      Branch : INDIRANAGAR", &["Branch :", "Period"]),
            "12 MG ROAD"
        );
        assert_eq!(left_column("no labels", &["Branch"]), "no labels");
    }
}
