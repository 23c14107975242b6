use indoc::indoc;

use super::{code_section, only_object, parse_body, parse_source};
use crate::ast::{Expression, Statement};

fn case_of(statement: &Statement) -> &crate::ast::CaseStatement {
    match statement {
        Statement::Case(case) => case,
        other => panic!("expected CASE, got {other:?}"),
    }
}

fn identifier_name(expression: &Expression) -> &str {
    match expression {
        Expression::Identifier(identifier) => &identifier.name,
        other => panic!("expected identifier, got {other:?}"),
    }
}

#[test]
fn inner_case_missing_colon_recovers_both_cases() {
    let source = "CASE x OF 1: CASE y OF 5 MESSAGE('e'); END; END;";
    let (body, errors) = parse_body(source);

    assert_eq!(errors.len(), 1, "exactly one error expected: {errors:#?}");
    let error = &errors[0];
    assert!(error.message().contains("':'"), "message: {}", error.message());
    // The error token sits on the same line as the `5` value.
    assert_eq!(error.token().position.line, 1);

    let outer = case_of(&body.statements[0]);
    assert_eq!(outer.branches.len(), 1);
    let inner_statement = outer.branches[0].body.as_ref().expect("inner CASE body");
    let inner = case_of(inner_statement);
    assert_eq!(inner.branches.len(), 1);
    assert!(inner.branches[0].body.is_some(), "MESSAGE call kept as body");
}

#[test]
fn malformed_call_in_branch_value_recovers_two_branches() {
    let source = "CASE x OF BadFunc(arg: Ready: MESSAGE('r'); END;";
    let (body, errors) = parse_body(source);

    assert!(!errors.is_empty());
    let case = case_of(&body.statements[0]);
    assert_eq!(case.branches.len(), 2, "branches: {:#?}", case.branches);

    // `arg` is recognized as a branch value because it is followed by `:` at
    // CASE depth; the malformed `BadFunc(` value is dropped.
    assert_eq!(identifier_name(&case.branches[0].values[0]), "arg");
    assert!(case.branches[0].body.is_none());

    assert_eq!(identifier_name(&case.branches[1].values[0]), "Ready");
    assert!(case.branches[1].body.is_some());
}

#[test]
fn call_arguments_are_not_branch_labels() {
    let source = "CASE x OF 1: SomeFunc(a, b, c); END;";
    let (body, errors) = parse_body(source);

    assert!(errors.is_empty(), "{errors:#?}");
    let case = case_of(&body.statements[0]);
    assert_eq!(case.branches.len(), 1, "no false branch detection");

    let body_statement = case.branches[0].body.as_ref().expect("branch body");
    let Statement::Expression(expression) = body_statement else {
        panic!("expected call statement");
    };
    let Expression::Call(call) = &expression.expression else {
        panic!("expected call");
    };
    assert_eq!(call.arguments.len(), 3);
}

#[test]
fn range_without_high_bound_reports_on_the_delimiter() {
    let (_, errors) = parse_body("Ok := x IN [1..];");
    let error = errors
        .iter()
        .find(|e| e.code() == "expected-range-expression")
        .expect("range error");
    assert_eq!(error.message(), "expected expression after '..' in range");
    // The error token is the offending `]`.
    assert_eq!(error.token().kind, crate::token::TokenKind::RightBracket);
}

#[test]
fn case_range_error_resyncs_on_next_branch() {
    let source = "CASE x OF 1..: y := 1; 2: z := 1; END;";
    let (body, errors) = parse_body(source);

    assert!(errors.iter().any(|e| e.code() == "expected-range-expression"));
    let case = case_of(&body.statements[0]);
    // The malformed branch is dropped; recovery finds `2:` as the next
    // branch pattern.
    assert_eq!(case.branches.len(), 1);
    assert!(matches!(&case.branches[0].values[0], Expression::Literal(_)));
}

#[test]
fn error_in_else_branch_still_expects_case_end() {
    let source = indoc! {"
        OBJECT Codeunit 1 T
        {
          CODE
          {
            PROCEDURE First@1();
            BEGIN
              CASE x OF
                1: y := 1;
              ELSE
                z := ;
            PROCEDURE Second@2();
            BEGIN
            END;

            BEGIN
            END.
          }
        }
    "};
    let (document, errors) = parse_source(source);

    assert!(
        errors
            .iter()
            .any(|e| e.message() == "expected END to close CASE statement"
                && e.code() == "expected-case-end"),
        "{errors:#?}"
    );
    let code = code_section(&document);
    let names: Vec<&str> = code.procedures.iter().map(|p| p.name.as_str()).collect();
    assert!(names.contains(&"Second"), "Second must survive: {names:?}");
}

#[test]
fn missing_case_end_preserves_following_procedure() {
    let source = indoc! {"
        OBJECT Codeunit 1 T
        {
          OBJECT-PROPERTIES
          {
            Modified=Yes;
          }
          CODE
          {
            PROCEDURE First@1();
            BEGIN
              CASE x OF
                1: y := 1;
            END;

            PROCEDURE Second@2();
            BEGIN
            END;

            BEGIN
            END.
          }
        }
    "};
    let (document, errors) = parse_source(source);

    assert!(!errors.is_empty(), "the missing END must be reported");
    let code = code_section(&document);
    let names: Vec<&str> = code.procedures.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["First", "Second"]);
    assert!(code.documentation.is_some());
}

#[test]
fn missing_section_close_synthesizes_and_continues() {
    let source = indoc! {"
        OBJECT Table 1 T
        {
          PROPERTIES
          {
            DataPerCompany=Yes;
          FIELDS
          {
            { 1;;Name;Text30 }
          }
        }
    "};
    let (document, errors) = parse_source(source);

    assert!(
        errors.iter().any(|e| e.code() == "missing-closing-brace"),
        "{errors:#?}"
    );
    let object = only_object(&document);
    let properties = object.properties.as_ref().expect("PROPERTIES kept");
    assert_eq!(properties.properties.len(), 1);
    let fields = object.fields.as_ref().expect("FIELDS parsed after recovery");
    assert_eq!(fields.fields.len(), 1);
}

#[test]
fn missing_section_open_brace_is_reported_and_parsed() {
    let source = indoc! {"
        OBJECT Codeunit 1 T
        {
          CODE
            BEGIN
            END.
        }
    "};
    let (document, errors) = parse_source(source);
    assert!(
        errors.iter().any(|e| e.code() == "missing-opening-brace"),
        "{errors:#?}"
    );
    let code = code_section(&document);
    assert!(code.documentation.is_some());
}

#[test]
fn junk_between_objects_does_not_consume_the_next_object() {
    let source = ":= ; what OBJECT Table 1 T { }";
    let (document, errors) = parse_source(source);
    assert!(!errors.is_empty());
    assert_eq!(document.objects.len(), 1);
    assert_eq!(document.objects[0].object_id, Some(1));
}

#[test]
fn block_missing_end_stops_at_declaration_boundary() {
    let source = indoc! {"
        OBJECT Codeunit 1 T
        {
          CODE
          {
            PROCEDURE Broken@1();
            BEGIN
              x := 1;

            PROCEDURE Fine@2();
            BEGIN
            END;

            BEGIN
            END.
          }
        }
    "};
    let (document, errors) = parse_source(source);
    assert!(
        errors
            .iter()
            .any(|e| e.message() == "expected END to close BEGIN block"),
        "{errors:#?}"
    );
    let code = code_section(&document);
    let names: Vec<&str> = code.procedures.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Broken", "Fine"]);
}

#[test]
fn deeply_nested_input_hits_the_recursion_guard_without_overflow() {
    // 400 nested parens exceed the parser recursion clamp; the parse must
    // return with an error rather than exhaust the stack.
    let mut source = String::from("x := ");
    for _ in 0..400 {
        source.push('(');
    }
    source.push('1');
    for _ in 0..400 {
        source.push(')');
    }
    source.push(';');
    let (_, errors) = parse_body(&source);
    assert!(
        errors
            .iter()
            .any(|e| e.message().contains("recursion limit")),
        "{errors:#?}"
    );
}

#[test]
fn errors_do_not_cascade_at_one_position() {
    let (_, errors) = parse_body("x := ;");
    assert_eq!(errors.len(), 1, "{errors:#?}");
}
