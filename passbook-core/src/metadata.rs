//! Statement header fields.
//!
//! Every field an adapter knows about is always present; a field that could
//! not be found holds the configured sentinel instead of being left out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_MISSING: &str = "N/A";

/// Canonical field names shared across institutions.
pub mod keys {
    pub const BANK: &str = "Bank";
    pub const ACCOUNT_HOLDER: &str = "Account Holder";
    pub const ACCOUNT_HOLDER_ADDRESS: &str = "Account Holder Address";
    pub const ACCOUNT_NUMBER: &str = "Account Number";
    pub const BRANCH: &str = "Branch";
    pub const BRANCH_ADDRESS: &str = "Branch Address";
    pub const STATEMENT_PERIOD: &str = "Statement Period";
    pub const CURRENCY: &str = "Currency";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    fields: BTreeMap<String, String>,
    /// Sentinel for fields the header did not yield
    #[serde(default = "default_missing")]
    missing: String,
}

fn default_missing() -> String {
    DEFAULT_MISSING.to_string()
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new(DEFAULT_MISSING)
    }
}

impl Metadata {
    pub fn new(missing: impl Into<String>) -> Self {
        Self {
            fields: BTreeMap::new(),
            missing: missing.into(),
        }
    }

    /// Declare a field without a value yet. Existing values are kept.
    pub fn declare(&mut self, key: &str) {
        if !self.fields.contains_key(key) {
            self.fields.insert(key.to_string(), self.missing.clone());
        }
    }

    /// Store a value; blank values become the sentinel.
    pub fn set(&mut self, key: &str, value: impl AsRef<str>) {
        let value = value.as_ref().trim();
        let value = if value.is_empty() {
            self.missing.clone()
        } else {
            value.to_string()
        };
        self.fields.insert(key.to_string(), value);
    }

    /// Store a value only if the field is still unset.
    pub fn set_if_missing(&mut self, key: &str, value: impl AsRef<str>) {
        if !self.is_found(key) {
            self.set(key, value);
        }
    }

    /// Value for `key`, or the sentinel.
    pub fn get(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or(&self.missing)
    }

    pub fn is_found(&self, key: &str) -> bool {
        self.fields.get(key).is_some_and(|v| *v != self.missing)
    }

    pub fn missing_value(&self) -> &str {
        &self.missing
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
