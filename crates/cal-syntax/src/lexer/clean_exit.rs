//! Clean-exit validation.
//!
//! After a scan the lexer must have returned to its base state: context stack
//! at `[NORMAL]`, braces and brackets balanced, no half-open property value
//! or field record. The report captures every deviation; it never aborts the
//! scan itself.

use serde::Serialize;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::token::Position;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanExitViolation {
    pub kind: DiagnosticKind,
    pub expected: String,
    pub actual: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanExitReport {
    pub passed: bool,
    pub violations: Vec<CleanExitViolation>,
    pub brace_depth: i32,
    pub bracket_depth: i32,
    /// Detected object type, upper-normalized (TABLE, CODEUNIT, PAGE, REPORT,
    /// QUERY, XMLPORT, MENUSUITE). `None` when detection never fired.
    pub object_type: Option<String>,
    /// End-of-input position, used to range the violation diagnostics.
    pub end: Position,
}

impl CleanExitReport {
    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }

    /// Boundary conversion. Violation messages carry only state descriptions
    /// (depths, context names), never source content.
    pub fn to_diagnostics(&self) -> Vec<Diagnostic> {
        self.violations
            .iter()
            .map(|v| {
                Diagnostic::new(
                    v.kind,
                    &self.end,
                    format!(
                        "{} (expected {}, actual {})",
                        v.kind.default_message(),
                        v.expected,
                        v.actual
                    ),
                )
            })
            .collect()
    }
}
