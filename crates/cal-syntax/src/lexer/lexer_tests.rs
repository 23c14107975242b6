use indoc::indoc;

use super::{Lexer, LexOptions, tokenize};
use crate::diagnostics::DiagnosticKind;
use crate::token::{Token, TokenKind};

fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|t| t.kind).collect()
}

fn values(tokens: &[Token]) -> Vec<&str> {
    tokens.iter().map(|t| t.value.as_str()).collect()
}

#[test]
fn object_with_field_section() {
    let source = "OBJECT Table 18 Customer {\nFIELDS { { 1;;No.;Code20 } }\n}";
    let (tokens, report) = tokenize(source);

    assert!(report.passed, "violations: {:?}", report.violations);
    assert_eq!(report.object_type.as_deref(), Some("TABLE"));
    assert_eq!(report.brace_depth, 0);

    insta::assert_yaml_snapshot!(kinds(&tokens), @r"
    - Object
    - Table
    - Integer
    - Identifier
    - LeftBrace
    - Fields
    - LeftBrace
    - LeftBrace
    - Integer
    - Semicolon
    - Semicolon
    - PropertyValue
    - Semicolon
    - PropertyValue
    - RightBrace
    - RightBrace
    - RightBrace
    - Eof
    ");

    let cells: Vec<_> = tokens
        .iter()
        .filter(|t| matches!(t.kind, TokenKind::PropertyValue))
        .map(|t| t.value.as_str())
        .collect();
    assert_eq!(cells, ["No.", "Code20"]);
}

#[test]
fn brace_comment_inside_code_block() {
    let (tokens, report) = tokenize("BEGIN { This is a comment } x := 5; END");

    assert!(report.passed, "violations: {:?}", report.violations);
    assert_eq!(
        kinds(&tokens),
        [
            TokenKind::Begin,
            TokenKind::Identifier,
            TokenKind::Assign,
            TokenKind::Integer,
            TokenKind::Semicolon,
            TokenKind::End,
            TokenKind::Eof,
        ]
    );
    assert_eq!(values(&tokens)[1], "x");
}

#[test]
fn brace_comment_does_not_nest() {
    // The first `}` closes the comment; `{` inside is a literal character.
    let (tokens, report) = tokenize("BEGIN { outer { inner } x := 1; END");
    assert!(report.passed, "violations: {:?}", report.violations);
    assert_eq!(kinds(&tokens)[0], TokenKind::Begin);
    assert_eq!(values(&tokens)[1], "x");
}

#[test]
fn property_value_with_apostrophe() {
    let source = "PROPERTIES { Description=The note's content.; }";
    let (tokens, report) = tokenize(source);

    assert!(report.passed, "violations: {:?}", report.violations);
    assert_eq!(report.brace_depth, 0);
    assert!(
        !tokens.iter().any(|t| t.kind == TokenKind::StringLiteral),
        "apostrophe inside a property value must not open a string"
    );
    let value = tokens
        .iter()
        .find(|t| t.kind == TokenKind::PropertyValue)
        .expect("property value token");
    assert_eq!(value.value, "The note's content.");
}

#[test]
fn property_value_semicolons_inside_brackets() {
    let source = "PROPERTIES { CaptionML=[ENU=No.;DAN=Nr.]; }";
    let (tokens, report) = tokenize(source);
    assert!(report.passed, "violations: {:?}", report.violations);
    let value = tokens
        .iter()
        .find(|t| t.kind == TokenKind::PropertyValue)
        .expect("property value token");
    assert_eq!(value.value, "[ENU=No.;DAN=Nr.]");
}

#[test]
fn trigger_property_lexes_as_code() {
    let source = "PROPERTIES { OnRun=BEGIN MESSAGE('hi'); END; }";
    let (tokens, report) = tokenize(source);

    assert!(report.passed, "violations: {:?}", report.violations);
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Begin));
    assert!(tokens.iter().any(|t| t.kind == TokenKind::End));
    let s = tokens
        .iter()
        .find(|t| t.kind == TokenKind::StringLiteral)
        .expect("string inside trigger code");
    assert_eq!(s.value, "hi");
}

#[test]
fn key_record_cells() {
    let source = "KEYS { {    ;No.                      ;Clustered=Yes } }";
    let (tokens, report) = tokenize(source);

    assert!(report.passed, "violations: {:?}", report.violations);
    let kinds = kinds(&tokens);
    assert_eq!(
        kinds,
        [
            TokenKind::Keys,
            TokenKind::LeftBrace,
            TokenKind::LeftBrace,
            TokenKind::Semicolon,
            TokenKind::PropertyValue,
            TokenKind::Semicolon,
            TokenKind::Identifier,
            TokenKind::Equal,
            TokenKind::PropertyValue,
            TokenKind::RightBrace,
            TokenKind::RightBrace,
            TokenKind::Eof,
        ]
    );
    assert_eq!(tokens[4].value, "No.");
    assert_eq!(tokens[6].value, "Clustered");
    assert_eq!(tokens[8].value, "Yes");
}

#[test]
fn field_record_with_trigger_and_trailing_property() {
    let source =
        "FIELDS { { 1;;Name;Text30;OnValidate=BEGIN MESSAGE('x'); END;\n CaptionML=ENU=Name } }";
    let (tokens, report) = tokenize(source);

    assert!(report.passed, "violations: {:?}", report.violations);
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Begin));
    let caption = tokens
        .iter()
        .rfind(|t| t.kind == TokenKind::PropertyValue)
        .expect("trailing property value");
    assert_eq!(caption.value, "ENU=Name");
}

#[test]
fn keyword_casing_law() {
    for word in ["BEGIN", "begin", "Begin", "bEgIn"] {
        let (tokens, _) = tokenize(word);
        assert_eq!(tokens[0].kind, TokenKind::Begin, "casing {word}");
        assert_eq!(tokens[0].value, word, "stored value keeps original casing");
    }
    for (a, b) in [("CASE", "case"), ("DOWNTO", "DownTo"), ("xor", "XOR")] {
        let (ta, _) = tokenize(a);
        let (tb, _) = tokenize(b);
        assert_eq!(ta[0].kind, tb[0].kind);
    }
}

#[test]
fn al_only_names_stay_identifiers() {
    let (tokens, _) = tokenize("MODIFY INSERT RUNONCLIENT WITHEVENTS INDATASET SECURITYFILTERING TEMPORARY VAR");
    assert_eq!(
        kinds(&tokens),
        [
            TokenKind::Identifier,
            TokenKind::Identifier,
            TokenKind::RunOnClient,
            TokenKind::WithEvents,
            TokenKind::InDataSet,
            TokenKind::SecurityFiltering,
            TokenKind::Temporary,
            TokenKind::Var,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn line_terminator_variants() {
    let (tokens, _) = tokenize("a\r\nb\rc\nd");
    let lines: Vec<u32> = tokens.iter().map(|t| t.position.line).collect();
    assert_eq!(lines, [1, 2, 3, 4, 4]);
    let cols: Vec<u32> = tokens.iter().map(|t| t.position.column).collect();
    assert_eq!(cols, [1, 1, 1, 1, 2]);
}

#[test]
fn string_escape_and_value() {
    let (tokens, report) = tokenize("BEGIN x := 'it''s'; END");
    assert!(report.passed);
    let s = tokens
        .iter()
        .find(|t| t.kind == TokenKind::StringLiteral)
        .expect("string token");
    assert_eq!(s.value, "it's");
}

#[test]
fn unterminated_string_is_unknown_and_sanitized() {
    let (tokens, _) = tokenize("BEGIN x := 'SecretCustomerName");
    let unknown = tokens
        .iter()
        .find(|t| t.kind == TokenKind::Unknown)
        .expect("unknown token");
    let message = unknown.message.as_deref().expect("message present");
    assert!(message.contains("unterminated"));
    assert!(
        !message.contains("SecretCustomerName"),
        "raw content must stay out of the message"
    );
    // Raw content is retained internally for position arithmetic.
    assert!(unknown.value.contains("SecretCustomerName"));
}

#[test]
fn quoted_identifier_value_excludes_quotes() {
    let (tokens, _) = tokenize("BEGIN \"No. Series\" := 1; END");
    let q = tokens
        .iter()
        .find(|t| t.kind == TokenKind::QuotedIdentifier)
        .expect("quoted identifier");
    assert_eq!(q.value, "No. Series");
}

#[test]
fn comments_are_skipped() {
    let (tokens, report) = tokenize("// line\n1 /* multi\nline */ 2");
    assert!(report.passed);
    assert_eq!(
        kinds(&tokens),
        [TokenKind::Integer, TokenKind::Integer, TokenKind::Eof]
    );
    assert_eq!(tokens[1].position.line, 3);
}

#[test]
fn unterminated_block_comment_is_unknown() {
    let (tokens, _) = tokenize("1 /* never closed");
    assert_eq!(tokens[1].kind, TokenKind::Unknown);
    assert_eq!(
        tokens[1].message.as_deref(),
        Some("unterminated block comment")
    );
}

#[test]
fn number_literals() {
    let (tokens, _) = tokenize("42 3.14 010196D 120000T 010196DT 0D");
    assert_eq!(
        kinds(&tokens),
        [
            TokenKind::Integer,
            TokenKind::Decimal,
            TokenKind::Date,
            TokenKind::Time,
            TokenKind::DateTime,
            TokenKind::Date,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn integer_range_is_not_a_decimal() {
    let (tokens, _) = tokenize("1..5");
    assert_eq!(
        kinds(&tokens),
        [
            TokenKind::Integer,
            TokenKind::DotDot,
            TokenKind::Integer,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn operator_tokens() {
    let (tokens, _) = tokenize(":= += -= *= /= < <= <> > >= :: . @ ,");
    assert_eq!(
        kinds(&tokens),
        [
            TokenKind::Assign,
            TokenKind::PlusAssign,
            TokenKind::MinusAssign,
            TokenKind::MultAssign,
            TokenKind::DivAssign,
            TokenKind::Less,
            TokenKind::LessOrEqual,
            TokenKind::NotEqual,
            TokenKind::Greater,
            TokenKind::GreaterOrEqual,
            TokenKind::DoubleColon,
            TokenKind::Dot,
            TokenKind::At,
            TokenKind::Comma,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn unbalanced_open_brace_reported() {
    let (_, report) = tokenize("OBJECT Table 1 T {");
    assert!(!report.passed);
    assert!(report.has(DiagnosticKind::UnbalancedBraces));
    assert!(report.has(DiagnosticKind::StackMismatch));
}

#[test]
fn stray_close_brace_clamps_and_reports_underflow() {
    let (_, report) = tokenize("}");
    assert!(report.has(DiagnosticKind::ContextUnderflow));
    assert_eq!(report.brace_depth, 0, "depth clamps at zero");
}

#[test]
fn end_without_begin_is_underflow() {
    let (_, report) = tokenize("END");
    assert!(report.has(DiagnosticKind::ContextUnderflow));
}

#[test]
fn case_end_balances_like_begin_end() {
    let (_, report) = tokenize("BEGIN CASE x OF 1: y := 1; END; END");
    assert!(report.passed, "violations: {:?}", report.violations);

    let (_, report) = tokenize("BEGIN CASE x OF 1: BEGIN y := 1; END; END; END");
    assert!(report.passed, "violations: {:?}", report.violations);
}

#[test]
fn rdldata_underflow_can_be_permitted() {
    let mut lexer = Lexer::with_options(LexOptions {
        trace: None,
        allow_rdldata_underflow: true,
    });
    let (_, report) = lexer.tokenize("}");
    assert!(
        !report.has(DiagnosticKind::ContextUnderflow),
        "option suppresses only the underflow violation"
    );

    // Other violations stay reported under the same option.
    let (_, report) = lexer.tokenize("{");
    assert!(report.has(DiagnosticKind::UnbalancedBraces));
}

#[test]
fn incomplete_field_record_reported() {
    let (_, report) = tokenize("FIELDS { { 1;;No.");
    assert!(report.has(DiagnosticKind::IncompleteField));
}

#[test]
fn incomplete_property_reported() {
    let (_, report) = tokenize("PROPERTIES { Description=never terminated");
    assert!(report.has(DiagnosticKind::IncompleteProperty));
}

#[test]
fn object_type_detection_requires_adjacency() {
    let (_, report) = tokenize("OBJECT Codeunit 50000 Tools { }");
    assert_eq!(report.object_type.as_deref(), Some("CODEUNIT"));

    // A brace between OBJECT and the kind word defeats detection.
    let (_, report) = tokenize("OBJECT { Table");
    assert_eq!(report.object_type, None);

    // Kind words inside CODE blocks do not influence detection.
    let (_, report) = tokenize("BEGIN OBJECT := 1; END");
    assert_eq!(report.object_type, None);
}

#[test]
fn unknown_character_cites_code_point() {
    let (tokens, _) = tokenize("BEGIN x := 1 \u{00A7}; END");
    let unknown = tokens
        .iter()
        .find(|t| t.kind == TokenKind::Unknown)
        .expect("unknown token");
    assert_eq!(unknown.message.as_deref(), Some("unexpected character U+00A7"));
}

#[test]
fn offsets_cover_the_source() {
    let source = indoc! {"
        OBJECT Codeunit 50000 Demo
        {
          CODE
          {
            PROCEDURE Run@1();
            BEGIN
              IF x > 1 THEN
                x := x - 1;
            END;

            BEGIN
            END.
          }
        }
    "};
    let (tokens, report) = tokenize(source);
    assert!(report.passed, "violations: {:?}", report.violations);

    let mut cursor = 0u32;
    for token in tokens.iter().filter(|t| !t.is_eof()) {
        assert!(
            token.position.start >= cursor,
            "tokens must not overlap: {token:?}"
        );
        // Everything between tokens is whitespace (no comments in fixture).
        for b in source.as_bytes()[cursor as usize..token.position.start as usize].iter() {
            assert!(b.is_ascii_whitespace(), "gap byte {b:?} not whitespace");
        }
        cursor = token.position.end;
    }
    for b in source.as_bytes()[cursor as usize..].iter() {
        assert!(b.is_ascii_whitespace());
    }
    let last = tokens.iter().rev().find(|t| !t.is_eof()).expect("tokens");
    assert!(last.position.end as usize <= source.len());
}

#[test]
fn determinism() {
    let source = "OBJECT Table 18 Customer {\nFIELDS { { 1;;No.;Code20 } }\n}";
    let (a, ra) = tokenize(source);
    let (b, rb) = tokenize(source);
    assert_eq!(a, b);
    assert_eq!(ra, rb);
}
