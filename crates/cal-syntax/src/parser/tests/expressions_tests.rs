use super::single_statement;
use crate::ast::{BinaryOp, Expression, MemberQualifier, Statement, UnaryOp};

fn assigned_value(source: &str) -> Expression {
    match single_statement(source) {
        Statement::Assignment(assignment) => assignment.value,
        other => panic!("expected assignment, got {other:?}"),
    }
}

fn as_binary(expression: &Expression) -> &crate::ast::BinaryExpression {
    match expression {
        Expression::Binary(binary) => binary,
        other => panic!("expected binary, got {other:?}"),
    }
}

#[test]
fn multiplicative_binds_tighter_than_additive() {
    let value = assigned_value("x := 1 + 2 * 3;");
    let add = as_binary(&value);
    assert_eq!(add.op, BinaryOp::Add);
    let mul = as_binary(&add.right);
    assert_eq!(mul.op, BinaryOp::Multiply);
}

#[test]
fn comparison_binds_tighter_than_logic() {
    let value = assigned_value("x := a < 5 AND b;");
    let and = as_binary(&value);
    assert_eq!(and.op, BinaryOp::And);
    assert_eq!(as_binary(&and.left).op, BinaryOp::Less);

    let value = assigned_value("x := a OR b XOR c;");
    // OR and XOR share a tier, left-associatively.
    let xor = as_binary(&value);
    assert_eq!(xor.op, BinaryOp::Xor);
    assert_eq!(as_binary(&xor.left).op, BinaryOp::Or);
}

#[test]
fn div_and_mod_are_multiplicative() {
    let value = assigned_value("x := a DIV b MOD c;");
    let modulo = as_binary(&value);
    assert_eq!(modulo.op, BinaryOp::Modulo);
    assert_eq!(as_binary(&modulo.left).op, BinaryOp::IntDivide);
}

#[test]
fn unary_operators() {
    let value = assigned_value("x := NOT Done;");
    let Expression::Unary(unary) = value else {
        panic!("expected unary");
    };
    assert_eq!(unary.op, UnaryOp::Not);

    let value = assigned_value("x := -Amount + 1;");
    let add = as_binary(&value);
    assert!(matches!(&add.left, Expression::Unary(u) if u.op == UnaryOp::Minus));
}

#[test]
fn member_access_both_qualifiers() {
    let value = assigned_value("x := Rec.Amount;");
    let Expression::Member(member) = value else {
        panic!("expected member");
    };
    assert_eq!(member.qualifier, MemberQualifier::Dot);
    assert_eq!(member.member.name, "Amount");

    let value = assigned_value("x := Status::Open;");
    let Expression::Member(member) = value else {
        panic!("expected member");
    };
    assert_eq!(member.qualifier, MemberQualifier::Scope);
    assert_eq!(member.member.name, "Open");
}

#[test]
fn chained_postfix() {
    let value = assigned_value("x := Rec.Lines[1].Amount;");
    // ((Rec.Lines)[1]).Amount
    let Expression::Member(outer) = value else {
        panic!("expected member");
    };
    assert_eq!(outer.member.name, "Amount");
    let Expression::Index(index) = &outer.object else {
        panic!("expected index");
    };
    assert_eq!(index.indices.len(), 1);
    assert!(matches!(&index.target, Expression::Member(_)));
}

#[test]
fn calls_with_member_callee() {
    let value = assigned_value("x := Customer.CalcFields(Balance, Amount);");
    let Expression::Call(call) = value else {
        panic!("expected call");
    };
    assert_eq!(call.arguments.len(), 2);
    assert!(matches!(&call.callee, Expression::Member(_)));
}

#[test]
fn quoted_identifier_expression() {
    let value = assigned_value("x := \"No. Series\";");
    let Expression::Identifier(identifier) = value else {
        panic!("expected identifier");
    };
    assert!(identifier.is_quoted);
    assert_eq!(identifier.name, "No. Series");
}

#[test]
fn parenthesized_grouping() {
    let value = assigned_value("x := (1 + 2) * 3;");
    let mul = as_binary(&value);
    assert_eq!(mul.op, BinaryOp::Multiply);
    assert_eq!(as_binary(&mul.left).op, BinaryOp::Add);
}

#[test]
fn empty_set_literal() {
    let value = assigned_value("x := y IN [];");
    let binary = as_binary(&value);
    assert_eq!(binary.op, BinaryOp::In);
    let Expression::Set(set) = &binary.right else {
        panic!("expected set");
    };
    assert!(set.elements.is_empty());
}

#[test]
fn string_escape_reaches_the_ast() {
    let value = assigned_value("x := 'it''s';");
    let Expression::Literal(literal) = value else {
        panic!("expected literal");
    };
    assert!(matches!(&literal.value, crate::ast::LiteralValue::Str(s) if s == "it's"));
}
