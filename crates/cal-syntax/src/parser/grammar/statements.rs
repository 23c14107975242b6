//! Statement grammar, including the CASE recovery state machine.
//!
//! Statement-layer recovery stops at `;`, END, UNTIL, ELSE and — inside a
//! CASE body — at the next `value ':'` branch pattern. Recovery never
//! crosses a declaration or section boundary, so a malformed statement can
//! never consume the following procedure or section.

use crate::ast::{
    AssertErrorStatement, AssignOp, AssignmentStatement, BlockStatement, CaseBranch, CaseStatement,
    ExitStatement, Expression, ExpressionStatement, ForStatement, IfStatement, RepeatStatement,
    Statement, WhileStatement, WithStatement,
};
use crate::diagnostics::DiagnosticKind;
use crate::parser::core::{CaseSync, Parser};
use crate::token::{TokenKind, TokenSet, token_sets};

const STATEMENT_RECOVERY: TokenSet = token_sets::STATEMENT_BOUNDARY
    .union(token_sets::DECLARATION_BOUNDARY)
    .union(token_sets::SECTION_KEYWORDS)
    .union(TokenSet::single(TokenKind::RightBrace));

impl Parser {
    /// `BEGIN … END`. A missing END is reported and synthesized at the next
    /// boundary so later declarations survive.
    pub(in crate::parser) fn parse_block(&mut self) -> BlockStatement {
        let start = self.bump(); // BEGIN
        let mut statements = Vec::new();
        loop {
            let before = self.pos;
            match self.kind() {
                TokenKind::End => {
                    self.bump();
                    break;
                }
                TokenKind::Eof
                | TokenKind::RightBrace
                | TokenKind::Until
                | TokenKind::Else => {
                    self.error_message(
                        DiagnosticKind::UnexpectedToken,
                        "expected END to close BEGIN block",
                    );
                    break;
                }
                TokenKind::Semicolon => {
                    self.bump();
                }
                k if token_sets::DECLARATION_BOUNDARY.contains(k) => {
                    self.error_message(
                        DiagnosticKind::UnexpectedToken,
                        "expected END to close BEGIN block",
                    );
                    break;
                }
                _ if self.at_section_boundary() => {
                    self.error_message(
                        DiagnosticKind::UnexpectedToken,
                        "expected END to close BEGIN block",
                    );
                    break;
                }
                _ => {
                    if let Some(statement) = self.parse_statement() {
                        statements.push(statement);
                    }
                    if self.pos == before {
                        self.bump();
                    }
                }
            }
        }
        BlockStatement {
            statements,
            span: self.span_from(&start),
        }
    }

    pub(in crate::parser) fn parse_statement(&mut self) -> Option<Statement> {
        if !self.enter_recursion() {
            self.recover_to(STATEMENT_RECOVERY);
            return None;
        }
        let statement = self.parse_statement_inner();
        self.exit_recursion();
        statement
    }

    fn parse_statement_inner(&mut self) -> Option<Statement> {
        match self.kind() {
            TokenKind::Begin => Some(Statement::Block(self.parse_block())),
            TokenKind::If => self.parse_if(),
            TokenKind::Case => self.parse_case(),
            TokenKind::For => self.parse_for(),
            TokenKind::While => self.parse_while(),
            TokenKind::Repeat => self.parse_repeat(),
            TokenKind::With => self.parse_with(),
            TokenKind::Exit => self.parse_exit(),
            TokenKind::Asserterror => self.parse_assert_error(),
            k if token_sets::EXPR_FIRST.contains(k) => self.parse_assignment_or_expression(),
            _ => {
                self.error_and_bump("statement");
                None
            }
        }
    }

    /// Body position of IF/WHILE/FOR/WITH/CASE branches: empty bodies are
    /// legal, so boundaries yield `None` without an error.
    fn parse_branch_statement(&mut self) -> Option<Statement> {
        match self.kind() {
            TokenKind::Semicolon
            | TokenKind::End
            | TokenKind::Else
            | TokenKind::Until
            | TokenKind::RightBrace
            | TokenKind::Eof => None,
            k if token_sets::DECLARATION_BOUNDARY.contains(k) => None,
            _ if self.at_section_boundary() => None,
            _ => self.parse_statement(),
        }
    }

    fn parse_if(&mut self) -> Option<Statement> {
        let start = self.bump(); // IF
        let Some(condition) = self.parse_expression() else {
            self.recover_to(STATEMENT_RECOVERY);
            return None;
        };
        self.expect(TokenKind::Then, "THEN after IF condition");
        let then_branch = self.parse_branch_statement();
        let else_branch = if self.eat(TokenKind::Else).is_some() {
            self.parse_branch_statement()
        } else {
            None
        };
        Some(Statement::If(Box::new(IfStatement {
            condition,
            then_branch,
            else_branch,
            span: self.span_from(&start),
        })))
    }

    /// `CASE <expr> OF <branches> [ELSE <stmts>] END`.
    fn parse_case(&mut self) -> Option<Statement> {
        let start = self.bump(); // CASE
        let Some(expression) = self.parse_expression() else {
            self.recover_to(STATEMENT_RECOVERY);
            return None;
        };
        self.expect(TokenKind::Of, "OF after CASE expression");

        let mut branches = Vec::new();
        let mut else_branch: Option<Vec<Statement>> = None;
        loop {
            match self.kind() {
                TokenKind::End => {
                    self.bump();
                    break;
                }
                TokenKind::Eof | TokenKind::Until | TokenKind::RightBrace => {
                    self.error_message(
                        DiagnosticKind::ExpectedCaseEnd,
                        "expected END to close CASE statement",
                    );
                    break;
                }
                TokenKind::Semicolon => {
                    self.bump();
                }
                TokenKind::Else => {
                    self.bump();
                    let statements = self.parse_case_else();
                    match &mut else_branch {
                        None => else_branch = Some(statements),
                        Some(existing) => existing.extend(statements),
                    }
                }
                k if token_sets::DECLARATION_BOUNDARY.contains(k) => {
                    self.error_message(
                        DiagnosticKind::ExpectedCaseEnd,
                        "expected END to close CASE statement",
                    );
                    break;
                }
                _ if self.at_section_boundary() => {
                    self.error_message(
                        DiagnosticKind::ExpectedCaseEnd,
                        "expected END to close CASE statement",
                    );
                    break;
                }
                _ => self.parse_case_branch(&mut branches),
            }
        }

        Some(Statement::Case(Box::new(CaseStatement {
            expression,
            branches,
            else_branch,
            span: self.span_from(&start),
        })))
    }

    /// One `value-list ':' statement` branch. A malformed value abandons the
    /// branch and resynchronizes on the next `value ':'` pattern at CASE
    /// depth — never on an identifier followed by `,`, which is still an
    /// argument list.
    fn parse_case_branch(&mut self, branches: &mut Vec<CaseBranch>) {
        let branch_start = self.pos;
        let start_token = self.current().clone();
        let errors_before = self.error_count();

        let mut values = Vec::new();
        loop {
            match self.parse_case_value() {
                Some(value) => values.push(value),
                None => break,
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }

        if self.error_count() > errors_before {
            match self.find_case_sync(branch_start + 1) {
                CaseSync::Branch(index)
                | CaseSync::CaseEnd(index)
                | CaseSync::ElseAt(index)
                | CaseSync::Boundary(index) => self.jump_to(index),
            }
            return;
        }

        if values.is_empty() {
            self.error_and_bump("CASE branch value");
            return;
        }

        self.expect(TokenKind::Colon, "':' after CASE branch value");

        // An immediately following `value ':'` means this branch is empty.
        let body = if self.at_case_branch_start() {
            None
        } else {
            self.parse_branch_statement()
        };

        branches.push(CaseBranch {
            values,
            body,
            span: self.span_from(&start_token),
        });
    }

    /// Statements of the ELSE branch, up to the CASE's END. Reaching a
    /// declaration boundary instead leaves the END error to the CASE loop.
    fn parse_case_else(&mut self) -> Vec<Statement> {
        let mut statements = Vec::new();
        loop {
            let before = self.pos;
            match self.kind() {
                TokenKind::End
                | TokenKind::Eof
                | TokenKind::Until
                | TokenKind::RightBrace => break,
                TokenKind::Semicolon => {
                    self.bump();
                }
                k if token_sets::DECLARATION_BOUNDARY.contains(k) => break,
                _ if self.at_section_boundary() => break,
                _ => {
                    if let Some(statement) = self.parse_statement() {
                        statements.push(statement);
                    }
                    if self.pos == before {
                        self.bump();
                    }
                }
            }
        }
        statements
    }

    /// `FOR <var> := <from> (TO | DOWNTO) <to> DO <stmt>`
    fn parse_for(&mut self) -> Option<Statement> {
        let start = self.bump(); // FOR
        let Some(variable) = self.parse_expression() else {
            self.recover_to(STATEMENT_RECOVERY);
            return None;
        };
        self.expect(TokenKind::Assign, "':=' in FOR statement");
        let Some(from) = self.parse_expression() else {
            self.recover_to(STATEMENT_RECOVERY);
            return None;
        };
        let down_to = match self.kind() {
            TokenKind::To => {
                self.bump();
                false
            }
            TokenKind::Downto => {
                self.bump();
                true
            }
            _ => {
                self.error_expected(DiagnosticKind::UnexpectedToken, "TO or DOWNTO");
                false
            }
        };
        let Some(to) = self.parse_expression() else {
            self.recover_to(STATEMENT_RECOVERY);
            return None;
        };
        self.expect(TokenKind::Do, "DO after FOR bounds");
        let body = self.parse_branch_statement();
        Some(Statement::For(Box::new(ForStatement {
            variable,
            from,
            to,
            down_to,
            body,
            span: self.span_from(&start),
        })))
    }

    fn parse_while(&mut self) -> Option<Statement> {
        let start = self.bump(); // WHILE
        let Some(condition) = self.parse_expression() else {
            self.recover_to(STATEMENT_RECOVERY);
            return None;
        };
        self.expect(TokenKind::Do, "DO after WHILE condition");
        let body = self.parse_branch_statement();
        Some(Statement::While(Box::new(WhileStatement {
            condition,
            body,
            span: self.span_from(&start),
        })))
    }

    /// `REPEAT <stmts> UNTIL <expr>`
    fn parse_repeat(&mut self) -> Option<Statement> {
        let start = self.bump(); // REPEAT
        let mut body = Vec::new();
        let mut found_until = false;
        loop {
            let before = self.pos;
            match self.kind() {
                TokenKind::Until => {
                    self.bump();
                    found_until = true;
                    break;
                }
                TokenKind::Eof | TokenKind::End | TokenKind::RightBrace => {
                    self.error_expected(DiagnosticKind::UnexpectedToken, "UNTIL to close REPEAT");
                    break;
                }
                TokenKind::Semicolon => {
                    self.bump();
                }
                k if token_sets::DECLARATION_BOUNDARY.contains(k) => {
                    self.error_expected(DiagnosticKind::UnexpectedToken, "UNTIL to close REPEAT");
                    break;
                }
                _ if self.at_section_boundary() => {
                    self.error_expected(DiagnosticKind::UnexpectedToken, "UNTIL to close REPEAT");
                    break;
                }
                _ => {
                    if let Some(statement) = self.parse_statement() {
                        body.push(statement);
                    }
                    if self.pos == before {
                        self.bump();
                    }
                }
            }
        }
        let condition = if found_until {
            self.parse_expression()
        } else {
            None
        };
        Some(Statement::Repeat(Box::new(RepeatStatement {
            body,
            condition,
            span: self.span_from(&start),
        })))
    }

    fn parse_with(&mut self) -> Option<Statement> {
        let start = self.bump(); // WITH
        let Some(record) = self.parse_expression() else {
            self.recover_to(STATEMENT_RECOVERY);
            return None;
        };
        self.expect(TokenKind::Do, "DO after WITH record");
        let body = self.parse_branch_statement();
        Some(Statement::With(Box::new(WithStatement {
            record,
            body,
            span: self.span_from(&start),
        })))
    }

    /// `EXIT` or `EXIT(<expr>)`
    fn parse_exit(&mut self) -> Option<Statement> {
        let start = self.bump(); // EXIT
        let value = if self.eat(TokenKind::LeftParen).is_some() {
            let value = self.parse_expression();
            self.expect(TokenKind::RightParen, "')' after EXIT value");
            value
        } else {
            None
        };
        Some(Statement::Exit(Box::new(ExitStatement {
            value,
            span: self.span_from(&start),
        })))
    }

    fn parse_assert_error(&mut self) -> Option<Statement> {
        let start = self.bump(); // ASSERTERROR
        let body = self.parse_branch_statement();
        Some(Statement::AssertError(Box::new(AssertErrorStatement {
            body,
            span: self.span_from(&start),
        })))
    }

    fn parse_assignment_or_expression(&mut self) -> Option<Statement> {
        let start = self.current().clone();
        let target = self.parse_expression()?;
        let operator = match self.kind() {
            TokenKind::Assign => Some(AssignOp::Assign),
            TokenKind::PlusAssign => Some(AssignOp::Add),
            TokenKind::MinusAssign => Some(AssignOp::Subtract),
            TokenKind::MultAssign => Some(AssignOp::Multiply),
            TokenKind::DivAssign => Some(AssignOp::Divide),
            _ => None,
        };
        match operator {
            Some(operator) => {
                self.bump();
                let Some(value) = self.parse_expression() else {
                    self.recover_to(STATEMENT_RECOVERY);
                    return None;
                };
                Some(Statement::Assignment(Box::new(AssignmentStatement {
                    target,
                    operator,
                    value,
                    span: self.span_from(&start),
                })))
            }
            None => Some(Statement::Expression(Box::new(ExpressionStatement {
                expression: target,
                span: self.span_from(&start),
            }))),
        }
    }

    /// A CASE branch value: an expression or `a..b` range. `..` followed by
    /// a token that cannot start an expression is the range error, pointed
    /// at the offending delimiter.
    pub(in crate::parser) fn parse_case_value(&mut self) -> Option<Expression> {
        self.parse_possible_range()
    }
}
