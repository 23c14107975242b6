use super::depth::{DepthLimitedWalker, PHYSICAL_STACK_LIMIT, walk_depth_limited};
use super::visit::{NodeRef, NullVisitor};
use super::*;
use crate::diagnostics::Severity;
use crate::lexer::tokenize;
use crate::parser::parse;
use crate::token::{Position, Token, TokenKind};

fn dummy_span() -> TokenSpan {
    TokenSpan::point(Token::new(
        TokenKind::Identifier,
        "x",
        Position::new(1, 1, 0, 1),
    ))
}

fn literal_true() -> Expression {
    Expression::Literal(Box::new(Literal {
        value: LiteralValue::Boolean(true),
        span: dummy_span(),
    }))
}

/// Builds an IF chain of the given depth iteratively; the parser is not
/// involved, so the chain can exceed its recursion clamp.
fn nested_ifs(depth: usize) -> Statement {
    let mut statement = Statement::Exit(Box::new(ExitStatement {
        value: None,
        span: dummy_span(),
    }));
    for _ in 0..depth {
        statement = Statement::If(Box::new(IfStatement {
            condition: literal_true(),
            then_branch: Some(statement),
            else_branch: None,
            span: dummy_span(),
        }));
    }
    statement
}

fn block_of(statements: Vec<Statement>) -> BlockStatement {
    BlockStatement {
        statements,
        span: dummy_span(),
    }
}

#[test]
fn no_diagnostics_below_the_limit() {
    let block = block_of(vec![nested_ifs(10)]);
    let diagnostics = walk_depth_limited(NodeRef::Block(&block), &mut NullVisitor, Some(100));
    assert!(diagnostics.is_empty(), "{diagnostics:#?}");
}

#[test]
fn logical_violation_cites_depth_and_limit() {
    let block = block_of(vec![nested_ifs(5)]);
    let diagnostics = walk_depth_limited(NodeRef::Block(&block), &mut NullVisitor, Some(3));

    assert_eq!(diagnostics.len(), 1, "first violation per subtree only");
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.code, "nesting-depth-exceeded");
    assert_eq!(diagnostic.severity, Severity::Warning);
    assert!(diagnostic.message.contains('4'), "{}", diagnostic.message);
    assert!(diagnostic.message.contains('3'), "{}", diagnostic.message);
}

#[test]
fn sibling_violations_all_reported() {
    let block = block_of(vec![nested_ifs(5), nested_ifs(5), nested_ifs(5)]);
    let diagnostics = walk_depth_limited(NodeRef::Block(&block), &mut NullVisitor, Some(3));
    assert_eq!(diagnostics.len(), 3, "one violation must not suppress others");
}

#[test]
fn all_hierarchical_statement_kinds_count() {
    // WHILE containing REPEAT containing CASE containing WITH containing FOR.
    let innermost = Statement::For(Box::new(ForStatement {
        variable: literal_true(),
        from: literal_true(),
        to: literal_true(),
        down_to: false,
        body: None,
        span: dummy_span(),
    }));
    let with = Statement::With(Box::new(WithStatement {
        record: literal_true(),
        body: Some(innermost),
        span: dummy_span(),
    }));
    let case = Statement::Case(Box::new(CaseStatement {
        expression: literal_true(),
        branches: vec![CaseBranch {
            values: vec![literal_true()],
            body: Some(with),
            span: dummy_span(),
        }],
        else_branch: None,
        span: dummy_span(),
    }));
    let repeat = Statement::Repeat(Box::new(RepeatStatement {
        body: vec![case],
        condition: None,
        span: dummy_span(),
    }));
    let outer = Statement::While(Box::new(WhileStatement {
        condition: literal_true(),
        body: Some(repeat),
        span: dummy_span(),
    }));

    let block = block_of(vec![outer]);
    let diagnostics = walk_depth_limited(NodeRef::Block(&block), &mut NullVisitor, Some(4));
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains('5'));
}

/// Tears an arbitrarily deep statement chain down iteratively; recursive drop
/// glue on a 5,500-deep chain would risk the very overflow the walker avoids.
fn dismantle(statement: Statement) {
    let mut stack = vec![statement];
    while let Some(current) = stack.pop() {
        match current {
            Statement::If(if_statement) => {
                let if_statement = *if_statement;
                stack.extend(if_statement.then_branch);
                stack.extend(if_statement.else_branch);
            }
            Statement::Block(block) => stack.extend(block.statements),
            _ => {}
        }
    }
}

#[test]
fn physical_limit_clamps_adversarial_input() {
    // 5,500 nested IFs with a huge logical limit: the physical clamp must
    // cut traversal at 1000, emit one warning citing both numbers, and
    // return without overflowing the stack.
    let block = block_of(vec![nested_ifs(5_500)]);
    let diagnostics = walk_depth_limited(NodeRef::Block(&block), &mut NullVisitor, Some(10_000));

    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.code, "nesting-depth-exceeded");
    assert_eq!(diagnostic.severity, Severity::Warning);
    assert!(
        diagnostic.message.contains("1001"),
        "{}",
        diagnostic.message
    );
    assert!(
        diagnostic
            .message
            .contains(&PHYSICAL_STACK_LIMIT.to_string()),
        "{}",
        diagnostic.message
    );

    dismantle(Statement::Block(block));
}

#[test]
fn reset_allows_walker_reuse() {
    let block = block_of(vec![nested_ifs(5)]);
    let mut walker = DepthLimitedWalker::with_max_depth(3);

    let first = walker.walk(NodeRef::Block(&block), &mut NullVisitor).len();
    assert_eq!(first, 1);

    walker.reset_diagnostics();
    assert!(walker.diagnostics().is_empty());

    let second = walker.walk(NodeRef::Block(&block), &mut NullVisitor).len();
    assert_eq!(second, 1, "reuse after reset behaves like a fresh walker");
}

#[test]
fn mixed_action_and_statement_nesting_shares_one_counter() {
    let source = "OBJECT Page 1 P { ACTIONS { { 1;0;Action;OnAction=BEGIN IF TRUE THEN EXIT; END } } }";
    let (tokens, _) = tokenize(source);
    let (document, errors) = parse(tokens);
    assert!(errors.is_empty(), "{errors:#?}");

    // Action depth 1, IF depth 2: a limit of 1 flags the IF.
    let diagnostics = walk_depth_limited(NodeRef::Document(&document), &mut NullVisitor, Some(1));
    assert_eq!(diagnostics.len(), 1, "{diagnostics:#?}");
    assert!(diagnostics[0].message.contains('2'));
    assert!(diagnostics[0].message.contains('1'));
}

#[test]
fn depth_counter_decrements_on_exit() {
    // Two sequential subtrees at depth 2 with limit 2: no violation, the
    // counter must come back down between them.
    let block = block_of(vec![nested_ifs(2), nested_ifs(2)]);
    let diagnostics = walk_depth_limited(NodeRef::Block(&block), &mut NullVisitor, Some(2));
    assert!(diagnostics.is_empty(), "{diagnostics:#?}");
}
