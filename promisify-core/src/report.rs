//! Run reporting
//!
//! Global invariants enforced:
//! - Deterministic output ordering (file order, then declaration order)
//! - Byte-for-byte identical output across runs

use crate::error::Diagnostic;
use crate::manifest::ManifestEntry;
use crate::rewrite::TransformKind;
use serde::Serialize;

/// One transformed function in report format
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformRecord {
    pub file: String,
    pub exposed_name: String,
    pub original_name: String,
    pub kind: String,
    pub callback: String,
    pub result_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_override: Option<usize>,
}

impl TransformRecord {
    pub fn new(file: &str, entry: &ManifestEntry) -> Self {
        TransformRecord {
            file: file.to_string(),
            exposed_name: entry.exposed_name.clone(),
            original_name: entry.original_name.clone(),
            kind: entry.kind.as_str().to_string(),
            callback: entry.callback.as_str().to_string(),
            result_type: entry.result_type.clone(),
            position_override: entry.position_override,
        }
    }
}

/// One diagnostic in report format
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticRecord {
    pub file: String,
    pub code: String,
    pub message: String,
}

impl DiagnosticRecord {
    pub fn new(file: &str, diagnostic: &Diagnostic) -> Self {
        DiagnosticRecord {
            file: file.to_string(),
            code: diagnostic.code().to_string(),
            message: diagnostic.to_string(),
        }
    }
}

/// Summary of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub files: Vec<String>,
    pub function_count: usize,
    pub transforms: Vec<TransformRecord>,
    pub diagnostics: Vec<DiagnosticRecord>,
}

impl RunReport {
    pub fn count_kind(&self, kind: TransformKind) -> usize {
        self.transforms
            .iter()
            .filter(|t| t.kind == kind.as_str())
            .count()
    }
}

/// Render a run report as text output
pub fn render_text(report: &RunReport) -> String {
    let mut output = String::new();

    if !report.transforms.is_empty() {
        output.push_str(&format!(
            "{:<10} {:<14} {:<40} {}\n",
            "KIND", "CALLBACK", "FUNCTION", "RESULT"
        ));
        for t in &report.transforms {
            let mut result = t.result_type.clone();
            if let Some(idx) = t.position_override {
                result.push_str(&format!(" (callback at index {})", idx));
            }
            output.push_str(&format!(
                "{:<10} {:<14} {:<40} {}\n",
                t.kind,
                t.callback,
                truncate_or_pad(&t.exposed_name, 40),
                result
            ));
        }
    }

    if !report.diagnostics.is_empty() {
        if !output.is_empty() {
            output.push('\n');
        }
        for d in &report.diagnostics {
            output.push_str(&format!("warning[{}] {}: {}\n", d.code, d.file, d.message));
        }
    }

    if !output.is_empty() {
        output.push('\n');
    }
    output.push_str(&format!(
        "{} function(s) in {} file(s): {} transformed ({} in place, {} aliased), {} diagnostic(s)\n",
        report.function_count,
        report.files.len(),
        report.transforms.len(),
        report.count_kind(TransformKind::InPlace),
        report.count_kind(TransformKind::Aliased),
        report.diagnostics.len()
    ));

    output
}

/// Render a run report as JSON output
pub fn render_json(report: &RunReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}

/// Truncate or pad string to fixed width
fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        format!("{:<width$}", s, width = width)
    }
}
