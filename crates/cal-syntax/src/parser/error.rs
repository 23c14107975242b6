//! Parse errors and the sanitizing factory.
//!
//! Every `ParseError` is built here and nowhere else. The factory never
//! embeds raw source text in a message: content-bearing tokens are described
//! by placeholder (`[content sanitized, N chars]`), path-like fragments
//! become `<REDACTED>`, and unusual characters are cited by code point. The
//! raw token itself stays on the error for position arithmetic only; field
//! privacy makes the factory the single construction site, and a source-scan
//! test in `parser/tests` backs that up.

use serde::Serialize;
use serde::ser::SerializeStruct;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    kind: DiagnosticKind,
    message: String,
    token: Token,
    expected: Option<String>,
    actual: Option<String>,
}

impl ParseError {
    /// Sole constructor; `pub(crate)` so errors can only originate inside the
    /// parser. The message is assembled from static phrases plus sanitized
    /// token descriptions.
    pub(crate) fn new(kind: DiagnosticKind, token: &Token) -> Self {
        Self {
            kind,
            message: kind.default_message().to_string(),
            token: token.clone(),
            expected: None,
            actual: None,
        }
    }

    /// `expected <what>, found <sanitized token description>`. `what` must be
    /// a static phrase (grammar vocabulary, never source content).
    pub(crate) fn expected(kind: DiagnosticKind, token: &Token, what: &'static str) -> Self {
        let found = describe_token(token);
        let mut error = Self::new(kind, token);
        error.message = format!("expected {what}, found {found}");
        error.expected = Some(what.to_string());
        error.actual = Some(found);
        error
    }

    /// Fixed-message variant for errors whose wording the grammar dictates
    /// (e.g. `expected END to close CASE statement`).
    pub(crate) fn with_message(kind: DiagnosticKind, token: &Token, message: &'static str) -> Self {
        let mut error = Self::new(kind, token);
        error.message = message.to_string();
        error
    }

    /// Length-only comparison form: `[expected: N chars, actual: M chars]`.
    pub(crate) fn length_mismatch(
        kind: DiagnosticKind,
        token: &Token,
        expected: &str,
        actual: &str,
    ) -> Self {
        let mut error = Self::new(kind, token);
        error.message = format!(
            "{} [expected: {} chars, actual: {} chars]",
            kind.default_message(),
            expected.chars().count(),
            actual.chars().count()
        );
        error
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Sanitized; safe to surface outside the core.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The raw token, internal use only: extract numeric position metadata
    /// from it, never its value.
    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn expected_description(&self) -> Option<&str> {
        self.expected.as_deref()
    }

    pub fn actual_description(&self) -> Option<&str> {
        self.actual.as_deref()
    }

    /// Boundary conversion: position metadata plus the sanitized message.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(self.kind, &self.token.position, self.message.clone())
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}]",
            self.token.position.line,
            self.token.position.column,
            self.message,
            self.kind.code()
        )
    }
}

impl std::error::Error for ParseError {}

// Serialization intentionally omits the raw token; only numeric position
// metadata leaves the error object.
impl Serialize for ParseError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ParseError", 4)?;
        s.serialize_field("code", self.kind.code())?;
        s.serialize_field("message", &self.message)?;
        s.serialize_field("line", &self.token.position.line)?;
        s.serialize_field("column", &self.token.position.column)?;
        s.end()
    }
}

/// Describes a token without leaking its value. Grammar vocabulary (keywords,
/// operators, structural tokens) is spelled out from the kind; everything
/// content-bearing is reduced to a placeholder.
fn describe_token(token: &Token) -> String {
    if let Some(spelling) = canonical_spelling(token.kind) {
        return format!("'{spelling}'");
    }
    match token.kind {
        TokenKind::Eof => "end of input".to_string(),
        TokenKind::Identifier => sanitize_content("identifier", &token.value),
        TokenKind::QuotedIdentifier => sanitize_content("quoted identifier", &token.value),
        TokenKind::StringLiteral => sanitize_content("string literal", &token.value),
        TokenKind::Integer | TokenKind::Decimal => sanitize_content("number", &token.value),
        TokenKind::Date | TokenKind::Time | TokenKind::DateTime => {
            sanitize_content("date/time literal", &token.value)
        }
        TokenKind::PropertyValue => sanitize_content("property value", &token.value),
        TokenKind::Unknown => sanitize_content("unrecognized input", &token.value),
        _ => "token".to_string(),
    }
}

fn sanitize_content(what: &str, value: &str) -> String {
    if value.contains('/') || value.contains('\\') {
        return format!("{what} <REDACTED>");
    }
    let mut chars = value.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if !c.is_ascii_graphic() && c != ' ' {
            return format!("{what} U+{:04X}", c as u32);
        }
    }
    format!("{what} [content sanitized, {} chars]", value.chars().count())
}

/// Spelling of non-content tokens. Returns `None` for content-bearing kinds.
fn canonical_spelling(kind: TokenKind) -> Option<&'static str> {
    use TokenKind::*;
    Some(match kind {
        LeftBrace => "{",
        RightBrace => "}",
        LeftBracket => "[",
        RightBracket => "]",
        LeftParen => "(",
        RightParen => ")",
        Semicolon => ";",
        Comma => ",",
        Colon => ":",
        DoubleColon => "::",
        Dot => ".",
        DotDot => "..",
        At => "@",
        Assign => ":=",
        PlusAssign => "+=",
        MinusAssign => "-=",
        MultAssign => "*=",
        DivAssign => "/=",
        Plus => "+",
        Minus => "-",
        Multiply => "*",
        Divide => "/",
        Equal => "=",
        NotEqual => "<>",
        Less => "<",
        LessOrEqual => "<=",
        Greater => ">",
        GreaterOrEqual => ">=",
        Begin => "BEGIN",
        End => "END",
        If => "IF",
        Then => "THEN",
        Else => "ELSE",
        Case => "CASE",
        Of => "OF",
        For => "FOR",
        To => "TO",
        Downto => "DOWNTO",
        Do => "DO",
        While => "WHILE",
        Repeat => "REPEAT",
        Until => "UNTIL",
        With => "WITH",
        Exit => "EXIT",
        Asserterror => "ASSERTERROR",
        And => "AND",
        Or => "OR",
        Not => "NOT",
        Xor => "XOR",
        Div => "DIV",
        Mod => "MOD",
        In => "IN",
        Var => "VAR",
        Procedure => "PROCEDURE",
        Function => "FUNCTION",
        Trigger => "TRIGGER",
        Event => "EVENT",
        Local => "LOCAL",
        Array => "ARRAY",
        Object => "OBJECT",
        Table => "TABLE",
        Form => "FORM",
        Page => "PAGE",
        Report => "REPORT",
        Dataport => "DATAPORT",
        Xmlport => "XMLPORT",
        Codeunit => "CODEUNIT",
        Menusuite => "MENUSUITE",
        Query => "QUERY",
        ObjectProperties => "OBJECT-PROPERTIES",
        Properties => "PROPERTIES",
        Fields => "FIELDS",
        Keys => "KEYS",
        FieldGroups => "FIELDGROUPS",
        Code => "CODE",
        Controls => "CONTROLS",
        Actions => "ACTIONS",
        Elements => "ELEMENTS",
        Dataset => "DATASET",
        RequestPage => "REQUESTPAGE",
        Labels => "LABELS",
        Rdldata => "RDLDATA",
        Sections => "SECTIONS",
        DataItems => "DATAITEMS",
        Menunodes => "MENUNODES",
        Wordlayout => "WORDLAYOUT",
        Temporary => "TEMPORARY",
        RunOnClient => "RUNONCLIENT",
        WithEvents => "WITHEVENTS",
        InDataSet => "INDATASET",
        SecurityFiltering => "SECURITYFILTERING",
        True => "TRUE",
        False => "FALSE",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Position;

    fn token(kind: TokenKind, value: &str) -> Token {
        Token::new(kind, value, Position::new(1, 1, 0, value.len() as u32))
    }

    #[test]
    fn identifier_values_never_appear_in_messages() {
        let t = token(TokenKind::Identifier, "CustomerSecret123");
        let error = ParseError::expected(DiagnosticKind::UnexpectedToken, &t, "':'");
        assert!(!error.message().contains("CustomerSecret123"));
        assert!(error.message().contains("[content sanitized, 17 chars]"));
    }

    #[test]
    fn paths_are_redacted() {
        let t = token(TokenKind::StringLiteral, "C:\\Secret\\Payroll.txt");
        let error = ParseError::expected(DiagnosticKind::UnexpectedToken, &t, "expression");
        assert!(error.message().contains("<REDACTED>"));
        assert!(!error.message().contains("Payroll"));
    }

    #[test]
    fn unusual_characters_cited_by_code_point() {
        let t = token(TokenKind::Unknown, "\u{2603}");
        let error = ParseError::expected(DiagnosticKind::UnexpectedToken, &t, "statement");
        assert!(error.message().contains("U+2603"));
    }

    #[test]
    fn keyword_tokens_spell_out_vocabulary() {
        let t = token(TokenKind::End, "end");
        let error = ParseError::expected(DiagnosticKind::UnexpectedToken, &t, "';'");
        assert_eq!(error.message(), "expected ';', found 'END'");
    }

    #[test]
    fn length_mismatch_form() {
        let t = token(TokenKind::Identifier, "abc");
        let error = ParseError::length_mismatch(
            DiagnosticKind::UnexpectedToken,
            &t,
            "expected-text",
            "actual",
        );
        assert!(error.message().contains("[expected: 13 chars, actual: 6 chars]"));
    }
}
