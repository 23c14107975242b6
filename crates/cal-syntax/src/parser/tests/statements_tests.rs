use super::{parse_body, single_statement};
use crate::ast::{AssignOp, Expression, LiteralValue, Statement};

fn as_case(statement: &Statement) -> &crate::ast::CaseStatement {
    match statement {
        Statement::Case(case) => case,
        other => panic!("expected CASE, got {other:?}"),
    }
}

#[test]
fn assignment_operators() {
    let (body, errors) = parse_body("x := 1; y += 2; z -= 3; w *= 4; v /= 5;");
    assert!(errors.is_empty(), "{errors:#?}");
    let ops: Vec<AssignOp> = body
        .statements
        .iter()
        .map(|s| match s {
            Statement::Assignment(a) => a.operator,
            other => panic!("expected assignment, got {other:?}"),
        })
        .collect();
    assert_eq!(
        ops,
        [
            AssignOp::Assign,
            AssignOp::Add,
            AssignOp::Subtract,
            AssignOp::Multiply,
            AssignOp::Divide,
        ]
    );
}

#[test]
fn if_then_else() {
    let statement = single_statement("IF x > 1 THEN y := 1 ELSE y := 2;");
    let Statement::If(if_statement) = statement else {
        panic!("expected IF");
    };
    assert!(if_statement.then_branch.is_some());
    assert!(if_statement.else_branch.is_some());
}

#[test]
fn if_with_empty_then() {
    let statement = single_statement("IF Ready THEN;");
    let Statement::If(if_statement) = statement else {
        panic!("expected IF");
    };
    assert!(if_statement.then_branch.is_none());
    assert!(if_statement.else_branch.is_none());
}

#[test]
fn while_do() {
    let statement = single_statement("WHILE x < 10 DO x := x + 1;");
    let Statement::While(while_statement) = statement else {
        panic!("expected WHILE");
    };
    assert!(while_statement.body.is_some());
}

#[test]
fn repeat_until() {
    let statement = single_statement("REPEAT x := x + 1; y := y - 1 UNTIL x > 10;");
    let Statement::Repeat(repeat) = statement else {
        panic!("expected REPEAT");
    };
    assert_eq!(repeat.body.len(), 2);
    assert!(repeat.condition.is_some());
}

#[test]
fn for_to_and_downto() {
    let up = single_statement("FOR i := 1 TO 10 DO Total := Total + i;");
    let Statement::For(for_up) = up else {
        panic!("expected FOR");
    };
    assert!(!for_up.down_to);

    let down = single_statement("FOR i := 10 DOWNTO 1 DO Total := Total + i;");
    let Statement::For(for_down) = down else {
        panic!("expected FOR");
    };
    assert!(for_down.down_to);
}

#[test]
fn with_do() {
    let statement = single_statement("WITH Customer DO Name := 'x';");
    let Statement::With(with_statement) = statement else {
        panic!("expected WITH");
    };
    assert!(with_statement.body.is_some());
}

#[test]
fn exit_with_and_without_value() {
    let bare = single_statement("EXIT;");
    let Statement::Exit(exit) = bare else {
        panic!("expected EXIT");
    };
    assert!(exit.value.is_none());

    let with_value = single_statement("EXIT(Total);");
    let Statement::Exit(exit) = with_value else {
        panic!("expected EXIT");
    };
    assert!(exit.value.is_some());
}

#[test]
fn asserterror_wraps_a_statement() {
    let statement = single_statement("ASSERTERROR Post(Invoice);");
    let Statement::AssertError(assert_error) = statement else {
        panic!("expected ASSERTERROR");
    };
    assert!(assert_error.body.is_some());
}

#[test]
fn nested_blocks() {
    let statement = single_statement("BEGIN x := 1; BEGIN y := 2; END; END;");
    let Statement::Block(block) = statement else {
        panic!("expected block");
    };
    assert_eq!(block.statements.len(), 2);
    assert!(matches!(block.statements[1], Statement::Block(_)));
}

#[test]
fn case_branches_preserve_source_order() {
    let statement = single_statement(
        "CASE Status OF 1: First; 2, 3: Second; 'open'..'closed': Third; END;",
    );
    let case = as_case(&statement);
    assert_eq!(case.branches.len(), 3);
    assert_eq!(case.branches[0].values.len(), 1);
    assert_eq!(case.branches[1].values.len(), 2);
    assert_eq!(case.branches[2].values.len(), 1);
    assert!(matches!(case.branches[2].values[0], Expression::Range(_)));
    assert!(case.else_branch.is_none());
}

#[test]
fn case_with_else_branch() {
    let statement =
        single_statement("CASE x OF 1: y := 1; ELSE y := 0; z := 0; END;");
    let case = as_case(&statement);
    assert_eq!(case.branches.len(), 1);
    let else_branch = case.else_branch.as_ref().expect("ELSE branch");
    assert_eq!(else_branch.len(), 2);
}

#[test]
fn case_with_empty_else() {
    let statement = single_statement("CASE x OF 1: y := 1; ELSE END;");
    let case = as_case(&statement);
    let else_branch = case.else_branch.as_ref().expect("ELSE branch present");
    assert!(else_branch.is_empty());
}

#[test]
fn empty_case_branch_is_accepted() {
    // `1:` immediately followed by the next branch parses without error.
    let statement = single_statement("CASE x OF 1: 2: y := 2; END;");
    let case = as_case(&statement);
    assert_eq!(case.branches.len(), 2);
    assert!(case.branches[0].body.is_none());
    assert!(case.branches[1].body.is_some());
}

#[test]
fn case_branch_values_with_scope_qualifier() {
    let statement = single_statement("CASE Status OF Status::Open: y := 1; END;");
    let case = as_case(&statement);
    assert_eq!(case.branches.len(), 1);
    assert!(matches!(case.branches[0].values[0], Expression::Member(_)));
}

#[test]
fn case_expression_is_preserved() {
    let statement = single_statement("CASE Rec.Amount OF 1: y := 1; END;");
    let case = as_case(&statement);
    assert!(matches!(case.expression, Expression::Member(_)));
}

#[test]
fn set_literal_statement_values() {
    let statement = single_statement("Ok := x IN [1, 3..5, 9];");
    let Statement::Assignment(assignment) = statement else {
        panic!("expected assignment");
    };
    let Expression::Binary(binary) = &assignment.value else {
        panic!("expected binary IN");
    };
    let Expression::Set(set) = &binary.right else {
        panic!("expected set literal");
    };
    assert_eq!(set.elements.len(), 3);
    assert!(matches!(set.elements[1], Expression::Range(_)));
}

#[test]
fn literal_kinds() {
    let (body, errors) = parse_body(
        "a := 42; b := 3.14; c := 'txt'; d := 010196D; e := 120000T; f := TRUE;",
    );
    assert!(errors.is_empty(), "{errors:#?}");
    let literals: Vec<&LiteralValue> = body
        .statements
        .iter()
        .map(|s| match s {
            Statement::Assignment(a) => match &a.value {
                Expression::Literal(l) => &l.value,
                other => panic!("expected literal, got {other:?}"),
            },
            other => panic!("expected assignment, got {other:?}"),
        })
        .collect();
    assert!(matches!(literals[0], LiteralValue::Integer(42)));
    assert!(matches!(literals[1], LiteralValue::Decimal(_)));
    assert!(matches!(literals[2], LiteralValue::Str(s) if s == "txt"));
    assert!(matches!(literals[3], LiteralValue::Date(_)));
    assert!(matches!(literals[4], LiteralValue::Time(_)));
    assert!(matches!(literals[5], LiteralValue::Boolean(true)));
}
