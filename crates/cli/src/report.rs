//! Validation diagnostics
//!
//! Errors and warnings are printed in separate labeled sections, each entry
//! as its `#/<path>: <message>` locator line followed by the entry as JSON.

use colored::*;
use swagger_pipeline_common::{Severity, ValidationEntry, ValidationResult};

/// Render every non-empty section of `result`
pub fn render(result: &ValidationResult) -> String {
    let mut out = String::new();
    section(&mut out, Severity::Error, &result.errors);
    section(&mut out, Severity::Warning, &result.warnings);
    out
}

/// Print the report on stderr
pub fn emit(result: &ValidationResult) {
    if !result.is_empty() {
        eprint!("{}", render(result));
    }
}

fn section(out: &mut String, severity: Severity, entries: &[ValidationEntry]) {
    if entries.is_empty() {
        return;
    }

    let label = match severity {
        Severity::Error => "Errors",
        Severity::Warning => "Warnings",
    };
    let title = format!("Swagger Schema {} ({})", label, entries.len());
    let rule = "-".repeat(title.len());

    out.push_str(&format!("{}\n", paint(&title, severity).bold()));
    out.push_str(&format!("{}\n", paint(&rule, severity)));

    for entry in entries {
        let locator = format!("{}: {}", entry.locator(), entry.message);
        // ValidationEntry only holds strings, so serialization cannot fail.
        let raw = serde_json::to_string(entry).unwrap_or_default();
        out.push_str(&format!("{}\n{}\n", paint(&locator, severity), raw));
    }
    out.push('\n');
}

fn paint(text: &str, severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => text.red(),
        Severity::Warning => text.yellow(),
    }
}
