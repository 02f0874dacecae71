//! Validation result types

use serde::{Deserialize, Serialize};

/// Severity of a validation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single validation error or warning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationEntry {
    /// Stable rule identifier (e.g. `OBJECT_MISSING_REQUIRED_PROPERTY`)
    pub code: String,

    /// Human-readable message
    pub message: String,

    /// Path segments from the document root to the offending node
    pub path: Vec<String>,
}

impl ValidationEntry {
    /// Slash-joined locator in the form `#/<path>`
    pub fn locator(&self) -> String {
        format!("#/{}", self.path.join("/"))
    }
}

/// Errors and warnings produced by one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<ValidationEntry>,
    pub warnings: Vec<ValidationEntry>,
}

impl ValidationResult {
    /// Whether the document passed (warnings do not count)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether there is nothing to report at all
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    pub fn push_error<I, S>(&mut self, code: &str, path: I, message: impl Into<String>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Severity::Error, code, path, message);
    }

    pub fn push_warning<I, S>(&mut self, code: &str, path: I, message: impl Into<String>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Severity::Warning, code, path, message);
    }

    /// Append an entry to the list matching `severity`
    pub fn push<I, S>(&mut self, severity: Severity, code: &str, path: I, message: impl Into<String>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = ValidationEntry {
            code: code.to_string(),
            message: message.into(),
            path: path.into_iter().map(Into::into).collect(),
        };
        match severity {
            Severity::Error => self.errors.push(entry),
            Severity::Warning => self.warnings.push(entry),
        }
    }
}
