mod expressions_tests;
mod recovery_tests;
mod statements_tests;

use crate::ast::{BlockStatement, CalDocument, CodeSection, ObjectDeclaration, Statement};
use crate::lexer::tokenize;
use crate::parser::{ParseError, parse};

pub(super) fn parse_source(source: &str) -> (CalDocument, Vec<ParseError>) {
    let (tokens, _) = tokenize(source);
    parse(tokens)
}

pub(super) fn parse_clean(source: &str) -> CalDocument {
    let (document, errors) = parse_source(source);
    assert!(errors.is_empty(), "unexpected errors: {errors:#?}");
    document
}

pub(super) fn only_object(document: &CalDocument) -> &ObjectDeclaration {
    assert_eq!(document.objects.len(), 1, "expected one object");
    &document.objects[0]
}

pub(super) fn code_section(document: &CalDocument) -> &CodeSection {
    only_object(document).code.as_ref().expect("CODE section")
}

/// Wraps statement source into a one-procedure codeunit and returns the
/// procedure body plus errors.
pub(super) fn parse_body(source: &str) -> (BlockStatement, Vec<ParseError>) {
    let wrapped = format!(
        "OBJECT Codeunit 50000 Harness {{ CODE {{ PROCEDURE Run@1(); BEGIN {source} END; BEGIN END. }} }}"
    );
    let (document, errors) = parse_source(&wrapped);
    let body = code_section(&document).procedures[0]
        .body
        .clone()
        .expect("procedure body");
    (body, errors)
}

pub(super) fn single_statement(source: &str) -> Statement {
    let (body, errors) = parse_body(source);
    assert!(errors.is_empty(), "unexpected errors: {errors:#?}");
    assert_eq!(body.statements.len(), 1, "expected one statement");
    body.statements[0].clone()
}
