//! CODE section: VAR blocks, procedures, triggers, events and the object
//! documentation trigger.

use crate::ast::{
    CodeSection, EventDeclaration, ParameterDeclaration, ProcedureDeclaration, TokenSpan,
    TriggerDeclaration, VariableDeclaration,
};
use crate::diagnostics::DiagnosticKind;
use crate::parser::core::Parser;
use crate::token::{Token, TokenKind, TokenSet, token_sets};

const CODE_RECOVERY: TokenSet = token_sets::DECLARATION_BOUNDARY
    .union(token_sets::SECTION_KEYWORDS)
    .union(TokenSet::new(&[TokenKind::Begin, TokenKind::RightBrace]));

impl Parser {
    pub(in crate::parser) fn parse_code_section(&mut self) -> CodeSection {
        let keyword = self.bump(); // CODE
        let has_brace = if self.at(TokenKind::LeftBrace) {
            self.bump();
            true
        } else {
            self.error(DiagnosticKind::MissingOpeningBrace);
            false
        };

        let mut section = CodeSection {
            variables: Vec::new(),
            procedures: Vec::new(),
            triggers: Vec::new(),
            events: Vec::new(),
            documentation: None,
            span: TokenSpan::point(keyword.clone()),
        };

        loop {
            match self.kind() {
                TokenKind::RightBrace => {
                    if has_brace {
                        self.bump();
                    }
                    break;
                }
                TokenKind::Eof => {
                    if has_brace {
                        self.error(DiagnosticKind::MissingClosingBrace);
                    }
                    break;
                }
                TokenKind::Semicolon => {
                    self.bump();
                }
                TokenKind::Var => {
                    self.bump();
                    let variables = self.parse_var_block();
                    section.variables.extend(variables);
                }
                TokenKind::Local | TokenKind::Procedure | TokenKind::Function => {
                    if let Some(procedure) = self.parse_procedure() {
                        section.procedures.push(procedure);
                    }
                }
                TokenKind::Trigger => {
                    if let Some(trigger) = self.parse_trigger_declaration() {
                        section.triggers.push(trigger);
                    }
                }
                TokenKind::Event => {
                    if let Some(event) = self.parse_event_declaration() {
                        section.events.push(event);
                    }
                }
                TokenKind::Begin => {
                    let block = self.parse_block();
                    if self.eat(TokenKind::Dot).is_none() {
                        self.error_expected(
                            DiagnosticKind::UnexpectedToken,
                            "'.' after the object documentation trigger",
                        );
                    }
                    if section.documentation.is_some() {
                        self.error_message(
                            DiagnosticKind::InvalidDeclaration,
                            "duplicate object documentation trigger",
                        );
                    }
                    section.documentation = Some(block);
                }
                k if k.is_section_keyword() && self.nth_kind(1) != TokenKind::Equal => {
                    if has_brace {
                        self.error(DiagnosticKind::MissingClosingBrace);
                    }
                    break;
                }
                _ => {
                    self.error_expected(DiagnosticKind::UnexpectedToken, "declaration");
                    self.bump();
                    self.recover_to(CODE_RECOVERY);
                }
            }
        }

        section.span = self.span_from(&keyword);
        section
    }

    /// Declarations under a VAR header: `name[@seq] : [TEMPORARY] type
    /// [modifier…] ;`. Modifier order is liberal; duplicates just set the
    /// flag again.
    pub(in crate::parser) fn parse_var_block(&mut self) -> Vec<VariableDeclaration> {
        let mut variables = Vec::new();
        while matches!(
            self.kind(),
            TokenKind::Identifier | TokenKind::QuotedIdentifier
        ) {
            if let Some(variable) = self.parse_variable() {
                variables.push(variable);
            } else {
                break;
            }
        }
        variables
    }

    fn parse_variable(&mut self) -> Option<VariableDeclaration> {
        let start = self.bump();
        let name = start.value.clone();
        let sequence_no = self.parse_sequence_no();

        if self.expect(TokenKind::Colon, "':' in variable declaration").is_none() {
            self.recover_to(CODE_RECOVERY.union(TokenSet::single(TokenKind::Semicolon)));
            self.eat(TokenKind::Semicolon);
            return None;
        }

        let mut is_temporary = self.eat(TokenKind::Temporary).is_some();
        let var_type = self.parse_type_text();

        let mut run_on_client = false;
        let mut with_events = false;
        let mut is_in_dataset = false;
        let mut security_filtering = None;
        loop {
            match self.kind() {
                TokenKind::Temporary => {
                    self.bump();
                    is_temporary = true;
                }
                TokenKind::RunOnClient => {
                    self.bump();
                    run_on_client = true;
                }
                TokenKind::WithEvents => {
                    self.bump();
                    with_events = true;
                }
                TokenKind::InDataSet => {
                    self.bump();
                    is_in_dataset = true;
                }
                TokenKind::SecurityFiltering => {
                    self.bump();
                    if self.eat(TokenKind::LeftParen).is_some() {
                        if matches!(
                            self.kind(),
                            TokenKind::Identifier | TokenKind::QuotedIdentifier
                        ) || self.kind().is_keyword()
                        {
                            security_filtering = Some(self.bump().value);
                        } else {
                            self.error_expected(
                                DiagnosticKind::ExpectedIdentifier,
                                "security filtering value",
                            );
                        }
                        self.expect(TokenKind::RightParen, "')' after SECURITYFILTERING value");
                    } else {
                        self.error_expected(
                            DiagnosticKind::UnexpectedToken,
                            "'(' after SECURITYFILTERING",
                        );
                    }
                }
                _ => break,
            }
        }

        self.expect(TokenKind::Semicolon, "';' after variable declaration");
        Some(VariableDeclaration {
            name,
            sequence_no,
            var_type,
            is_temporary,
            run_on_client,
            with_events,
            is_in_dataset,
            security_filtering,
            span: self.span_from(&start),
        })
    }

    /// `@seq` marker; event subscriptions use negative numbers (`@-1`).
    fn parse_sequence_no(&mut self) -> Option<i64> {
        if self.eat(TokenKind::At).is_none() {
            return None;
        }
        let negative = self.eat(TokenKind::Minus).is_some();
        let value = self
            .eat(TokenKind::Integer)
            .and_then(|t| t.value.parse::<i64>().ok())?;
        Some(if negative { -value } else { value })
    }

    /// Type text assembled from tokens: `Record 18`, `Text[30]`,
    /// `ARRAY[5] OF Integer`. Stops at `;`, modifiers, or any boundary.
    fn parse_type_text(&mut self) -> String {
        let mut text = String::new();
        loop {
            match self.kind() {
                TokenKind::Semicolon
                | TokenKind::RightParen
                | TokenKind::RightBrace
                | TokenKind::Begin
                | TokenKind::Eof
                | TokenKind::Temporary
                | TokenKind::RunOnClient
                | TokenKind::WithEvents
                | TokenKind::InDataSet
                | TokenKind::SecurityFiltering
                | TokenKind::Procedure
                | TokenKind::Function
                | TokenKind::Trigger
                | TokenKind::Event
                | TokenKind::Var
                | TokenKind::Local => break,
                _ => {
                    let token = self.bump();
                    push_type_token(&mut text, &token);
                }
            }
        }
        text
    }

    /// `[LOCAL] PROCEDURE Name[@seq] '(' params ')' [[ret] ':' type] ';'
    /// [VAR decls] [BEGIN … END] ';'`
    fn parse_procedure(&mut self) -> Option<ProcedureDeclaration> {
        let start = self.current().clone();
        let is_local = self.eat(TokenKind::Local).is_some();
        if !matches!(self.kind(), TokenKind::Procedure | TokenKind::Function) {
            self.error_expected(DiagnosticKind::InvalidDeclaration, "PROCEDURE or FUNCTION");
            self.recover_to(CODE_RECOVERY);
            return None;
        }
        self.bump();

        let name = self.parse_declaration_name();
        let sequence_no = self.parse_sequence_no();
        let parameters = self.parse_parameter_list();
        let (return_name, return_type) = self.parse_return_clause();
        self.expect(TokenKind::Semicolon, "';' after procedure header");

        let variables = if self.eat(TokenKind::Var).is_some() {
            self.parse_var_block()
        } else {
            Vec::new()
        };
        let body = if self.at(TokenKind::Begin) {
            Some(self.parse_block())
        } else {
            None
        };
        self.eat(TokenKind::Semicolon);

        Some(ProcedureDeclaration {
            name,
            sequence_no,
            is_local,
            parameters,
            return_name,
            return_type,
            variables,
            body,
            span: self.span_from(&start),
        })
    }

    /// `TRIGGER Name[@seq] '(' params ')' ';' [VAR decls] BEGIN … END ';'`
    fn parse_trigger_declaration(&mut self) -> Option<TriggerDeclaration> {
        let start = self.bump(); // TRIGGER
        let name = self.parse_declaration_name();
        self.parse_sequence_no();
        self.parse_parameter_list();
        self.expect(TokenKind::Semicolon, "';' after trigger header");

        let variables = if self.eat(TokenKind::Var).is_some() {
            self.parse_var_block()
        } else {
            Vec::new()
        };
        let body = if self.at(TokenKind::Begin) {
            Some(self.parse_block())
        } else {
            None
        };
        self.eat(TokenKind::Semicolon);

        Some(TriggerDeclaration {
            name,
            variables,
            body,
            span: self.span_from(&start),
        })
    }

    /// `EVENT [Publisher@seq ::] Name[@seq] '(' params ')' ';' [body ';']`
    fn parse_event_declaration(&mut self) -> Option<EventDeclaration> {
        let start = self.bump(); // EVENT
        let first = self.parse_declaration_name();
        let first_seq = self.parse_sequence_no();

        let (publisher, name, sequence_no) = if self.eat(TokenKind::DoubleColon).is_some() {
            let name = self.parse_declaration_name();
            let seq = self.parse_sequence_no();
            (Some(first), name, seq)
        } else {
            (None, first, first_seq)
        };

        let parameters = self.parse_parameter_list();
        self.expect(TokenKind::Semicolon, "';' after event header");

        let variables = if self.eat(TokenKind::Var).is_some() {
            self.parse_var_block()
        } else {
            Vec::new()
        };
        let body = if self.at(TokenKind::Begin) {
            Some(self.parse_block())
        } else {
            None
        };
        if body.is_some() {
            self.eat(TokenKind::Semicolon);
        }

        Some(EventDeclaration {
            publisher,
            name,
            sequence_no,
            parameters,
            variables,
            body,
            span: self.span_from(&start),
        })
    }

    fn parse_declaration_name(&mut self) -> String {
        match self.kind() {
            TokenKind::Identifier | TokenKind::QuotedIdentifier => self.bump().value,
            _ => {
                self.error_expected(DiagnosticKind::ExpectedIdentifier, "declaration name");
                String::new()
            }
        }
    }

    fn parse_parameter_list(&mut self) -> Vec<ParameterDeclaration> {
        let mut parameters = Vec::new();
        if self.eat(TokenKind::LeftParen).is_none() {
            return parameters;
        }
        loop {
            match self.kind() {
                TokenKind::RightParen => {
                    self.bump();
                    break;
                }
                TokenKind::Eof => {
                    self.error_expected(DiagnosticKind::UnexpectedToken, "')' after parameters");
                    break;
                }
                TokenKind::Semicolon => {
                    self.bump();
                }
                TokenKind::Var | TokenKind::Identifier | TokenKind::QuotedIdentifier => {
                    if let Some(parameter) = self.parse_parameter() {
                        parameters.push(parameter);
                    }
                }
                _ => self.error_and_bump("parameter declaration"),
            }
        }
        parameters
    }

    fn parse_parameter(&mut self) -> Option<ParameterDeclaration> {
        let start = self.current().clone();
        let is_var = self.eat(TokenKind::Var).is_some();
        let name = match self.kind() {
            TokenKind::Identifier | TokenKind::QuotedIdentifier => self.bump().value,
            _ => {
                self.error_expected(DiagnosticKind::ExpectedIdentifier, "parameter name");
                return None;
            }
        };
        let sequence_no = self.parse_sequence_no();
        self.expect(TokenKind::Colon, "':' in parameter declaration");
        let param_type = self.parse_type_text();
        Some(ParameterDeclaration {
            is_var,
            name,
            sequence_no,
            param_type,
            span: self.span_from(&start),
        })
    }

    fn parse_return_clause(&mut self) -> (Option<String>, Option<String>) {
        if self.at(TokenKind::Colon) {
            self.bump();
            return (None, Some(self.parse_type_text()));
        }
        if matches!(
            self.kind(),
            TokenKind::Identifier | TokenKind::QuotedIdentifier
        ) && self.nth_kind(1) == TokenKind::Colon
        {
            let name = self.bump().value;
            self.bump(); // ':'
            return (Some(name), Some(self.parse_type_text()));
        }
        (None, None)
    }

    /// Trigger code in property position (`OnRun=BEGIN … END`), also used by
    /// record properties.
    pub(in crate::parser) fn parse_trigger_body(
        &mut self,
        name: String,
        start: &Token,
    ) -> TriggerDeclaration {
        let variables = if self.eat(TokenKind::Var).is_some() {
            self.parse_var_block()
        } else {
            Vec::new()
        };
        let body = if self.at(TokenKind::Begin) {
            Some(self.parse_block())
        } else {
            None
        };
        TriggerDeclaration {
            name,
            variables,
            body,
            span: self.span_from(start),
        }
    }
}

fn push_type_token(text: &mut String, token: &Token) {
    let no_space = text.is_empty()
        || text.ends_with('[')
        || matches!(token.kind, TokenKind::LeftBracket | TokenKind::RightBracket);
    if !no_space {
        text.push(' ');
    }
    text.push_str(&token.value);
}
