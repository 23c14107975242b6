//! Expression grammar: Pratt-style precedence climbing.
//!
//! Tiers, loosest first: OR/XOR, AND, comparison (`= <> < <= > >=`, IN),
//! additive, multiplicative (`* / DIV MOD`), unary (`+ - NOT`), postfix
//! (call, index, `.`/`::` member), primary.

use crate::ast::{
    BinaryExpression, BinaryOp, CallExpression, Expression, Identifier, IndexExpression, Literal,
    LiteralValue, MemberExpression, MemberQualifier, RangeExpression, SetLiteral, TokenSpan,
    UnaryExpression, UnaryOp,
};
use crate::diagnostics::DiagnosticKind;
use crate::parser::core::Parser;
use crate::token::{TokenKind, token_sets};

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Or => Some(BinaryOp::Or),
        TokenKind::Xor => Some(BinaryOp::Xor),
        TokenKind::And => Some(BinaryOp::And),
        TokenKind::Equal => Some(BinaryOp::Equal),
        TokenKind::NotEqual => Some(BinaryOp::NotEqual),
        TokenKind::Less => Some(BinaryOp::Less),
        TokenKind::LessOrEqual => Some(BinaryOp::LessOrEqual),
        TokenKind::Greater => Some(BinaryOp::Greater),
        TokenKind::GreaterOrEqual => Some(BinaryOp::GreaterOrEqual),
        TokenKind::In => Some(BinaryOp::In),
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Subtract),
        TokenKind::Multiply => Some(BinaryOp::Multiply),
        TokenKind::Divide => Some(BinaryOp::Divide),
        TokenKind::Div => Some(BinaryOp::IntDivide),
        TokenKind::Mod => Some(BinaryOp::Modulo),
        _ => None,
    }
}

fn join_spans(left: &Expression, right: &Expression) -> TokenSpan {
    TokenSpan::new(left.span().start.clone(), right.span().end.clone())
}

impl Parser {
    pub(in crate::parser) fn parse_expression(&mut self) -> Option<Expression> {
        self.parse_binary_tier(0)
    }

    /// Binary tiers by index; each tier loops left-associatively over its
    /// operators and delegates operands to the next tier.
    fn parse_binary_tier(&mut self, tier: usize) -> Option<Expression> {
        const TIERS: [&[TokenKind]; 5] = [
            &[TokenKind::Or, TokenKind::Xor],
            &[TokenKind::And],
            &[
                TokenKind::Equal,
                TokenKind::NotEqual,
                TokenKind::Less,
                TokenKind::LessOrEqual,
                TokenKind::Greater,
                TokenKind::GreaterOrEqual,
                TokenKind::In,
            ],
            &[TokenKind::Plus, TokenKind::Minus],
            &[
                TokenKind::Multiply,
                TokenKind::Divide,
                TokenKind::Div,
                TokenKind::Mod,
            ],
        ];

        if tier >= TIERS.len() {
            return self.parse_unary();
        }

        let mut left = self.parse_binary_tier(tier + 1)?;
        while TIERS[tier].contains(&self.kind()) {
            let op = binary_op(self.kind()).expect("tier tokens map to operators");
            self.bump();
            let Some(right) = self.parse_binary_tier(tier + 1) else {
                // Error already recorded by the operand parser; keep the
                // partial tree.
                break;
            };
            let span = join_spans(&left, &right);
            left = Expression::Binary(Box::new(BinaryExpression {
                op,
                left,
                right,
                span,
            }));
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<Expression> {
        let op = match self.kind() {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Not => Some(UnaryOp::Not),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_postfix();
        };
        let op_token = self.bump();
        let operand = self.parse_unary()?;
        let span = TokenSpan::new(op_token, operand.span().end.clone());
        Some(Expression::Unary(Box::new(UnaryExpression {
            op,
            operand,
            span,
        })))
    }

    fn parse_postfix(&mut self) -> Option<Expression> {
        let mut expression = self.parse_primary()?;
        loop {
            match self.kind() {
                TokenKind::LeftParen => expression = self.parse_call_suffix(expression),
                TokenKind::LeftBracket => expression = self.parse_index_suffix(expression),
                TokenKind::Dot => {
                    expression = self.parse_member_suffix(expression, MemberQualifier::Dot)?
                }
                TokenKind::DoubleColon => {
                    expression = self.parse_member_suffix(expression, MemberQualifier::Scope)?
                }
                _ => break,
            }
        }
        Some(expression)
    }

    /// Argument list. On a token that is neither `,` nor `)` the error is
    /// recorded and the token left in place — CASE recovery relies on seeing
    /// it (an `identifier ':'` there is the next branch, not an argument).
    fn parse_call_suffix(&mut self, callee: Expression) -> Expression {
        let start = callee.span().start.clone();
        self.bump(); // '('
        let mut arguments = Vec::new();
        loop {
            match self.kind() {
                TokenKind::RightParen => {
                    self.bump();
                    break;
                }
                TokenKind::Eof => {
                    self.error_expected(DiagnosticKind::UnexpectedToken, "')' to close call");
                    break;
                }
                TokenKind::Comma => {
                    // Empty argument slots are legal in C/AL built-ins.
                    self.bump();
                }
                k if token_sets::EXPR_FIRST.contains(k) => {
                    match self.parse_expression() {
                        Some(argument) => arguments.push(argument),
                        None => break,
                    }
                    match self.kind() {
                        TokenKind::Comma => {
                            self.bump();
                        }
                        TokenKind::RightParen => {}
                        _ => {
                            self.error_expected(
                                DiagnosticKind::UnexpectedToken,
                                "',' or ')' in argument list",
                            );
                            break;
                        }
                    }
                }
                _ => {
                    self.error_expected(
                        DiagnosticKind::UnexpectedToken,
                        "',' or ')' in argument list",
                    );
                    break;
                }
            }
        }
        let span = self.span_from(&start);
        Expression::Call(Box::new(CallExpression {
            callee,
            arguments,
            span,
        }))
    }

    fn parse_index_suffix(&mut self, target: Expression) -> Expression {
        let start = target.span().start.clone();
        self.bump(); // '['
        let mut indices = Vec::new();
        loop {
            match self.kind() {
                TokenKind::RightBracket => {
                    self.bump();
                    break;
                }
                TokenKind::Eof => {
                    self.error_expected(DiagnosticKind::UnexpectedToken, "']' to close index");
                    break;
                }
                TokenKind::Comma => {
                    self.bump();
                }
                k if token_sets::EXPR_FIRST.contains(k) => match self.parse_expression() {
                    Some(index) => indices.push(index),
                    None => break,
                },
                _ => {
                    self.error_expected(
                        DiagnosticKind::UnexpectedToken,
                        "',' or ']' in index expression",
                    );
                    break;
                }
            }
        }
        let span = self.span_from(&start);
        Expression::Index(Box::new(IndexExpression {
            target,
            indices,
            span,
        }))
    }

    fn parse_member_suffix(
        &mut self,
        object: Expression,
        qualifier: MemberQualifier,
    ) -> Option<Expression> {
        let start = object.span().start.clone();
        self.bump(); // '.' or '::'
        let member = match self.kind() {
            TokenKind::Identifier => {
                let token = self.bump();
                Identifier {
                    name: token.value.clone(),
                    is_quoted: false,
                    span: TokenSpan::point(token),
                }
            }
            TokenKind::QuotedIdentifier => {
                let token = self.bump();
                Identifier {
                    name: token.value.clone(),
                    is_quoted: true,
                    span: TokenSpan::point(token),
                }
            }
            _ => {
                self.error_expected(DiagnosticKind::ExpectedIdentifier, "member name");
                return Some(object);
            }
        };
        let span = self.span_from(&start);
        Some(Expression::Member(Box::new(MemberExpression {
            object,
            member,
            qualifier,
            span,
        })))
    }

    fn parse_primary(&mut self) -> Option<Expression> {
        if !self.enter_recursion() {
            return None;
        }
        let expression = self.parse_primary_inner();
        self.exit_recursion();
        expression
    }

    fn parse_primary_inner(&mut self) -> Option<Expression> {
        match self.kind() {
            TokenKind::Integer => {
                let token = self.bump();
                let value = token.value.parse::<i64>().unwrap_or_default();
                Some(literal(LiteralValue::Integer(value), token))
            }
            TokenKind::Decimal => {
                let token = self.bump();
                let value = token.value.parse::<f64>().unwrap_or_default();
                Some(literal(LiteralValue::Decimal(value), token))
            }
            TokenKind::StringLiteral => {
                let token = self.bump();
                let value = token.value.clone();
                Some(literal(LiteralValue::Str(value), token))
            }
            TokenKind::Date => {
                let token = self.bump();
                let value = token.value.clone();
                Some(literal(LiteralValue::Date(value), token))
            }
            TokenKind::Time => {
                let token = self.bump();
                let value = token.value.clone();
                Some(literal(LiteralValue::Time(value), token))
            }
            TokenKind::DateTime => {
                let token = self.bump();
                let value = token.value.clone();
                Some(literal(LiteralValue::DateTime(value), token))
            }
            TokenKind::True => {
                let token = self.bump();
                Some(literal(LiteralValue::Boolean(true), token))
            }
            TokenKind::False => {
                let token = self.bump();
                Some(literal(LiteralValue::Boolean(false), token))
            }
            TokenKind::Identifier => {
                let token = self.bump();
                Some(identifier(token, false))
            }
            TokenKind::QuotedIdentifier => {
                let token = self.bump();
                Some(identifier(token, true))
            }
            TokenKind::LeftParen => {
                self.bump();
                let inner = self.parse_expression();
                self.expect(
                    TokenKind::RightParen,
                    "')' to close parenthesized expression",
                );
                inner
            }
            TokenKind::LeftBracket => self.parse_set_literal(),
            _ => {
                self.error_expected(DiagnosticKind::ExpectedExpression, "expression");
                None
            }
        }
    }

    /// `[v, a..b, …]` — possibly empty (`[]` is the empty set).
    fn parse_set_literal(&mut self) -> Option<Expression> {
        let start = self.bump(); // '['
        let mut elements = Vec::new();
        loop {
            match self.kind() {
                TokenKind::RightBracket => {
                    self.bump();
                    break;
                }
                TokenKind::Eof => {
                    self.error_expected(DiagnosticKind::UnexpectedToken, "']' to close set literal");
                    break;
                }
                TokenKind::Comma => {
                    self.bump();
                }
                k if token_sets::EXPR_FIRST.contains(k) => {
                    match self.parse_possible_range() {
                        Some(element) => elements.push(element),
                        None => break,
                    }
                }
                _ => {
                    self.error_expected(
                        DiagnosticKind::UnexpectedToken,
                        "',' or ']' in set literal",
                    );
                    break;
                }
            }
        }
        Some(Expression::Set(Box::new(SetLiteral {
            elements,
            span: self.span_from(&start),
        })))
    }

    /// An expression, or `a..b`. `..` followed by a token that cannot start
    /// an expression records expected-range-expression on that token.
    pub(in crate::parser) fn parse_possible_range(&mut self) -> Option<Expression> {
        let low = self.parse_expression()?;
        if !self.at(TokenKind::DotDot) {
            return Some(low);
        }
        self.bump(); // '..'
        let high = if self.at_set(token_sets::RANGE_BLOCKERS)
            || !self.at_set(token_sets::EXPR_FIRST)
        {
            self.error_message(
                DiagnosticKind::ExpectedRangeExpression,
                "expected expression after '..' in range",
            );
            None
        } else {
            self.parse_expression()
        };
        let start = low.span().start.clone();
        let span = self.span_from(&start);
        Some(Expression::Range(Box::new(RangeExpression {
            low,
            high,
            span,
        })))
    }
}

fn literal(value: LiteralValue, token: crate::token::Token) -> Expression {
    Expression::Literal(Box::new(Literal {
        value,
        span: TokenSpan::point(token),
    }))
}

fn identifier(token: crate::token::Token, is_quoted: bool) -> Expression {
    Expression::Identifier(Box::new(Identifier {
        name: token.value.clone(),
        is_quoted,
        span: TokenSpan::point(token),
    }))
}
