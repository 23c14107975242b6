//! Diagnostic kinds and the boundary diagnostic shape.
//!
//! Internally every position is 1-based (see [`crate::token::Position`]).
//! Consumers of the core receive [`Diagnostic`] values with 0-based
//! line/column; [`Range::from_position`] is the single conversion point.

use serde::Serialize;

use crate::token::Position;

/// Stable identity of a diagnostic. `code()` is the string exposed at the
/// boundary; `default_message()` is used when no custom message is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    // Lex-time violations (clean-exit report).
    StackMismatch,
    UnbalancedBraces,
    UnbalancedBrackets,
    IncompleteProperty,
    IncompleteField,
    ContextUnderflow,
    // Parse errors.
    UnexpectedToken,
    ExpectedExpression,
    ExpectedIdentifier,
    ExpectedRangeExpression,
    ExpectedCaseEnd,
    MissingOpeningBrace,
    MissingClosingBrace,
    InvalidDeclaration,
    UnterminatedLiteral,
    // Walk-time diagnostics.
    NestingDepthExceeded,
}

impl DiagnosticKind {
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::StackMismatch => "stack-mismatch",
            DiagnosticKind::UnbalancedBraces => "unbalanced-braces",
            DiagnosticKind::UnbalancedBrackets => "unbalanced-brackets",
            DiagnosticKind::IncompleteProperty => "incomplete-property",
            DiagnosticKind::IncompleteField => "incomplete-field",
            DiagnosticKind::ContextUnderflow => "context-underflow",
            DiagnosticKind::UnexpectedToken => "unexpected-token",
            DiagnosticKind::ExpectedExpression => "expected-expression",
            DiagnosticKind::ExpectedIdentifier => "expected-identifier",
            DiagnosticKind::ExpectedRangeExpression => "expected-range-expression",
            DiagnosticKind::ExpectedCaseEnd => "expected-case-end",
            DiagnosticKind::MissingOpeningBrace => "missing-opening-brace",
            DiagnosticKind::MissingClosingBrace => "missing-closing-brace",
            DiagnosticKind::InvalidDeclaration => "invalid-declaration",
            DiagnosticKind::UnterminatedLiteral => "unterminated-literal",
            DiagnosticKind::NestingDepthExceeded => "nesting-depth-exceeded",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::NestingDepthExceeded => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            DiagnosticKind::StackMismatch => "lexer context stack did not return to its base state",
            DiagnosticKind::UnbalancedBraces => "unbalanced braces",
            DiagnosticKind::UnbalancedBrackets => "unbalanced brackets",
            DiagnosticKind::IncompleteProperty => "property value not terminated",
            DiagnosticKind::IncompleteField => "field record not terminated",
            DiagnosticKind::ContextUnderflow => "closing token without matching opener",
            DiagnosticKind::UnexpectedToken => "unexpected token",
            DiagnosticKind::ExpectedExpression => "expected expression",
            DiagnosticKind::ExpectedIdentifier => "expected identifier",
            DiagnosticKind::ExpectedRangeExpression => "expected expression after '..' in range",
            DiagnosticKind::ExpectedCaseEnd => "expected END to close CASE statement",
            DiagnosticKind::MissingOpeningBrace => "missing opening brace for section",
            DiagnosticKind::MissingClosingBrace => "missing closing brace for section",
            DiagnosticKind::InvalidDeclaration => "invalid declaration",
            DiagnosticKind::UnterminatedLiteral => "unterminated literal",
            DiagnosticKind::NestingDepthExceeded => "nesting depth exceeded",
        }
    }
}

/// Severity with editor-protocol numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum Severity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Information => write!(f, "information"),
            Severity::Hint => write!(f, "hint"),
        }
    }
}

/// 0-based line/column pair (boundary shape).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

/// 0-based range (boundary shape).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range {
    pub start: Pos,
    pub end: Pos,
}

impl Range {
    /// Converts an internal 1-based token position into the 0-based boundary
    /// range. The end column is derived from the token length; multi-line
    /// tokens keep the range on the start line, which is what editors expect
    /// for squiggle placement.
    pub fn from_position(position: &Position) -> Self {
        let line = position.line.saturating_sub(1);
        let col = position.column.saturating_sub(1);
        Range {
            start: Pos { line, col },
            end: Pos {
                line,
                col: col + position.len(),
            },
        }
    }
}

/// Outward-facing diagnostic. `message` is always sanitized before it gets
/// here; `code` is one of the [`DiagnosticKind::code`] strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub range: Range,
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, position: &Position, message: impl Into<String>) -> Self {
        Self {
            range: Range::from_position(position),
            severity: kind.severity(),
            code: kind.code(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}[{}] {}:{}: {}",
            self.severity, self.code, self.range.start.line, self.range.start.col, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_conversion_is_zero_based() {
        let pos = Position::new(3, 5, 40, 47);
        let range = Range::from_position(&pos);
        assert_eq!(range.start, Pos { line: 2, col: 4 });
        assert_eq!(range.end, Pos { line: 2, col: 11 });
    }

    #[test]
    fn severity_numbers_match_protocol() {
        assert_eq!(Severity::Error as u8, 1);
        assert_eq!(Severity::Warning as u8, 2);
        assert_eq!(Severity::Information as u8, 3);
        assert_eq!(Severity::Hint as u8, 4);
    }

    #[test]
    fn depth_violations_are_warnings() {
        assert_eq!(DiagnosticKind::NestingDepthExceeded.severity(), Severity::Warning);
        assert_eq!(DiagnosticKind::NestingDepthExceeded.code(), "nesting-depth-exceeded");
    }
}
