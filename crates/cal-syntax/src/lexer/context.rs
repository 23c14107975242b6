//! Context tracking for the scanner.
//!
//! The same `{` can open an object, open a section, open a field record, or
//! start a block comment, depending on where the scan currently is. The
//! tracker holds that state: a context stack updated by braces and
//! BEGIN/END, the brace/bracket counters, the current record column, and the
//! object-type detection latch.

use serde::Serialize;

use super::clean_exit::{CleanExitReport, CleanExitViolation};
use crate::diagnostics::DiagnosticKind;
use crate::token::{Position, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LexContext {
    Normal,
    ObjectLevel,
    Properties,
    Fields,
    Keys,
    FieldGroups,
    Controls,
    Elements,
    Dataset,
    CodeBlock,
}

impl LexContext {
    /// Contexts whose sections contain brace-delimited records.
    pub fn has_records(self) -> bool {
        matches!(
            self,
            LexContext::Fields
                | LexContext::Keys
                | LexContext::FieldGroups
                | LexContext::Controls
                | LexContext::Elements
                | LexContext::Dataset
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            LexContext::Normal => "NORMAL",
            LexContext::ObjectLevel => "OBJECT_LEVEL",
            LexContext::Properties => "PROPERTIES",
            LexContext::Fields => "FIELDS",
            LexContext::Keys => "KEYS",
            LexContext::FieldGroups => "FIELDGROUPS",
            LexContext::Controls => "CONTROLS",
            LexContext::Elements => "ELEMENTS",
            LexContext::Dataset => "DATASET",
            LexContext::CodeBlock => "CODE_BLOCK",
        }
    }
}

/// Current column inside a `{ id ; enabled ; name ; type ; props }` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum FieldColumn {
    None,
    Id,
    Enabled,
    Name,
    Type,
    Properties,
    Triggers,
}

impl FieldColumn {
    /// Column reached by the next top-level `;`. Stops advancing at
    /// Properties; the properties cell is internally `;`-separated.
    pub fn next(self) -> FieldColumn {
        match self {
            FieldColumn::None => FieldColumn::None,
            FieldColumn::Id => FieldColumn::Enabled,
            FieldColumn::Enabled => FieldColumn::Name,
            FieldColumn::Name => FieldColumn::Type,
            FieldColumn::Type => FieldColumn::Properties,
            FieldColumn::Properties => FieldColumn::Properties,
            FieldColumn::Triggers => FieldColumn::Triggers,
        }
    }
}

/// Which kinds the object-type latch accepts. FORM and DATAPORT lex as
/// keywords for classic exports but are not object types of this dialect.
fn object_type_name(kind: TokenKind) -> Option<&'static str> {
    match kind {
        TokenKind::Table => Some("TABLE"),
        TokenKind::Codeunit => Some("CODEUNIT"),
        TokenKind::Page => Some("PAGE"),
        TokenKind::Report => Some("REPORT"),
        TokenKind::Query => Some("QUERY"),
        TokenKind::Xmlport => Some("XMLPORT"),
        TokenKind::Menusuite => Some("MENUSUITE"),
        _ => None,
    }
}

fn section_context(kind: TokenKind) -> Option<LexContext> {
    match kind {
        TokenKind::Properties | TokenKind::ObjectProperties => Some(LexContext::Properties),
        TokenKind::Code => Some(LexContext::CodeBlock),
        TokenKind::Fields => Some(LexContext::Fields),
        TokenKind::Keys => Some(LexContext::Keys),
        TokenKind::FieldGroups => Some(LexContext::FieldGroups),
        TokenKind::Controls | TokenKind::Actions | TokenKind::RequestPage => {
            Some(LexContext::Controls)
        }
        TokenKind::Elements | TokenKind::Menunodes | TokenKind::DataItems => {
            Some(LexContext::Elements)
        }
        TokenKind::Dataset | TokenKind::Rdldata | TokenKind::Sections | TokenKind::Labels
        | TokenKind::Wordlayout => Some(LexContext::Dataset),
        _ => None,
    }
}

#[derive(Debug)]
pub(super) struct ContextTracker {
    stack: Vec<LexContext>,
    pub(super) brace_depth: i32,
    pub(super) bracket_depth: i32,
    pub(super) in_property_value: bool,
    pub(super) field_def_column: FieldColumn,
    pub(super) current_section: Option<TokenKind>,
    pub(super) context_underflow: bool,
    pub(super) incomplete_property: bool,
    pub(super) object_type: Option<String>,
    expect_object_kind: bool,
}

impl ContextTracker {
    pub fn new() -> Self {
        Self {
            stack: vec![LexContext::Normal],
            brace_depth: 0,
            bracket_depth: 0,
            in_property_value: false,
            field_def_column: FieldColumn::None,
            current_section: None,
            context_underflow: false,
            incomplete_property: false,
            object_type: None,
            expect_object_kind: false,
        }
    }

    pub fn top(&self) -> LexContext {
        *self.stack.last().expect("context stack never empty")
    }

    pub fn in_record(&self) -> bool {
        self.field_def_column != FieldColumn::None
    }

    /// `{` while the scan is inside BEGIN…END scans as a block comment.
    pub fn brace_is_comment(&self) -> bool {
        self.top() == LexContext::CodeBlock
    }

    /// Structural `{`. The pushed context comes from the preceding keyword;
    /// without one, a `{` inside a record-bearing section opens a record.
    pub fn open_brace(&mut self, prev: Option<TokenKind>) {
        let pushed = match prev.and_then(section_context) {
            Some(ctx) => {
                self.current_section = prev;
                self.field_def_column = FieldColumn::None;
                ctx
            }
            None => {
                let top = self.top();
                if top.has_records() && !self.in_record() {
                    self.field_def_column = FieldColumn::Id;
                    top
                } else {
                    LexContext::ObjectLevel
                }
            }
        };
        self.stack.push(pushed);
        self.brace_depth += 1;
    }

    /// Structural `}`. Unmatched closers clamp the depth at zero and latch the
    /// underflow flag instead of corrupting the stack.
    pub fn close_brace(&mut self) {
        if self.stack.len() > 1 {
            let popped = self.stack.pop().expect("len checked above");
            if popped.has_records() && self.in_record() {
                self.field_def_column = FieldColumn::None;
            } else if !popped.has_records() {
                self.current_section = None;
            }
        } else {
            self.context_underflow = true;
        }
        if self.brace_depth == 0 {
            self.context_underflow = true;
        } else {
            self.brace_depth -= 1;
        }
    }

    pub fn on_begin(&mut self) {
        self.stack.push(LexContext::CodeBlock);
    }

    pub fn on_end(&mut self) {
        if self.stack.len() > 1 && self.top() == LexContext::CodeBlock {
            self.stack.pop();
        } else {
            self.context_underflow = true;
        }
    }

    /// Object-type detection: fires only when the kind word is the token
    /// immediately after OBJECT at the outermost document position.
    pub fn observe(&mut self, kind: TokenKind) {
        if self.expect_object_kind {
            self.expect_object_kind = false;
            if let Some(name) = object_type_name(kind) {
                if self.object_type.is_none() {
                    self.object_type = Some(name.to_string());
                }
            }
        }
        if kind == TokenKind::Object && self.stack.len() == 1 && self.brace_depth == 0 {
            self.expect_object_kind = true;
        }
    }

    pub fn advance_column(&mut self) {
        self.field_def_column = self.field_def_column.next();
    }

    pub fn finish(&self, allow_rdldata_underflow: bool, end: Position) -> CleanExitReport {
        let mut violations = Vec::new();

        if self.stack.as_slice() != [LexContext::Normal] {
            let actual = self
                .stack
                .iter()
                .map(|c| c.name())
                .collect::<Vec<_>>()
                .join(" > ");
            violations.push(CleanExitViolation {
                kind: DiagnosticKind::StackMismatch,
                expected: "NORMAL".to_string(),
                actual,
            });
        }
        if self.brace_depth != 0 {
            violations.push(CleanExitViolation {
                kind: DiagnosticKind::UnbalancedBraces,
                expected: "0".to_string(),
                actual: self.brace_depth.to_string(),
            });
        }
        if self.bracket_depth != 0 {
            violations.push(CleanExitViolation {
                kind: DiagnosticKind::UnbalancedBrackets,
                expected: "0".to_string(),
                actual: self.bracket_depth.to_string(),
            });
        }
        if self.incomplete_property || self.in_property_value {
            violations.push(CleanExitViolation {
                kind: DiagnosticKind::IncompleteProperty,
                expected: "terminated property value".to_string(),
                actual: "end of input inside property value".to_string(),
            });
        }
        if self.in_record() {
            violations.push(CleanExitViolation {
                kind: DiagnosticKind::IncompleteField,
                expected: "closed field record".to_string(),
                actual: format!("end of input in column {:?}", self.field_def_column),
            });
        }
        if self.context_underflow && !allow_rdldata_underflow {
            violations.push(CleanExitViolation {
                kind: DiagnosticKind::ContextUnderflow,
                expected: "matching opener for every closing token".to_string(),
                actual: "closing token with empty or mismatched context".to_string(),
            });
        }

        CleanExitReport {
            passed: violations.is_empty(),
            violations,
            brace_depth: self.brace_depth,
            bracket_depth: self.bracket_depth,
            object_type: self.object_type.clone(),
            end,
        }
    }
}
