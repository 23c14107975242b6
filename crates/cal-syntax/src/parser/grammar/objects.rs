//! Document and object declarations.

use crate::ast::{CalDocument, ObjectDeclaration, ObjectKind};
use crate::diagnostics::DiagnosticKind;
use crate::parser::core::Parser;
use crate::token::{TokenKind, TokenSet};

fn object_kind(kind: TokenKind) -> Option<ObjectKind> {
    match kind {
        TokenKind::Table => Some(ObjectKind::Table),
        TokenKind::Codeunit => Some(ObjectKind::Codeunit),
        TokenKind::Page => Some(ObjectKind::Page),
        TokenKind::Report => Some(ObjectKind::Report),
        TokenKind::Query => Some(ObjectKind::Query),
        TokenKind::Xmlport => Some(ObjectKind::Xmlport),
        TokenKind::Menusuite => Some(ObjectKind::Menusuite),
        TokenKind::Form => Some(ObjectKind::Form),
        TokenKind::Dataport => Some(ObjectKind::Dataport),
        _ => None,
    }
}

impl Parser {
    /// A document is zero or more object declarations.
    pub(in crate::parser) fn parse_document(&mut self) -> CalDocument {
        let start = self.current().clone();
        let mut objects = Vec::new();
        while !self.at_eof() {
            if self.at(TokenKind::Object) {
                objects.push(self.parse_object());
            } else {
                self.error_expected(DiagnosticKind::UnexpectedToken, "OBJECT declaration");
                self.bump();
                self.recover_to(TokenSet::single(TokenKind::Object));
            }
        }
        let span = self.span_from(&start);
        CalDocument { objects, span }
    }

    /// `OBJECT <kind> <id> <name> '{' <sections> '}'`. An unknown kind word
    /// leaves `object_kind` empty but parsing continues.
    fn parse_object(&mut self) -> ObjectDeclaration {
        let start = self.bump(); // OBJECT

        let kind = match object_kind(self.kind()) {
            Some(kind) => {
                self.bump();
                Some(kind)
            }
            None => {
                if self.at(TokenKind::Identifier) {
                    // Unknown kind word; consume it so the id/name still line up.
                    self.bump();
                }
                None
            }
        };

        let object_id = self
            .eat(TokenKind::Integer)
            .and_then(|t| t.value.parse::<i64>().ok());

        // Names run to the `{` and may contain dots and spaces
        // (`Cust. Ledger Entry`).
        let mut name = String::new();
        while !self.at(TokenKind::LeftBrace) && !self.at_eof() {
            match self.kind() {
                TokenKind::Identifier
                | TokenKind::QuotedIdentifier
                | TokenKind::Integer
                | TokenKind::Dot => {
                    let token = self.bump();
                    if !name.is_empty() && token.kind != TokenKind::Dot {
                        name.push(' ');
                    }
                    name.push_str(&token.value);
                }
                k if k.is_keyword() => {
                    let token = self.bump();
                    if !name.is_empty() {
                        name.push(' ');
                    }
                    name.push_str(&token.value);
                }
                _ => break,
            }
        }
        let object_name = if name.is_empty() { None } else { Some(name) };

        let mut object = ObjectDeclaration {
            object_kind: kind,
            object_id,
            object_name,
            object_properties: None,
            properties: None,
            fields: None,
            keys: None,
            field_groups: None,
            controls: None,
            actions: None,
            elements: None,
            dataset: None,
            request_page: None,
            code: None,
            span: self.span_from(&start),
        };

        if self.expect(TokenKind::LeftBrace, "'{' to open object body").is_none() {
            object.span = self.span_from(&start);
            return object;
        }

        loop {
            match self.kind() {
                TokenKind::RightBrace => {
                    self.bump();
                    break;
                }
                TokenKind::Eof => {
                    self.error_message(
                        DiagnosticKind::MissingClosingBrace,
                        "missing closing brace for object",
                    );
                    break;
                }
                TokenKind::ObjectProperties => {
                    let section = self.parse_property_section();
                    self.assign_section(object.object_properties.replace(section).is_some());
                }
                TokenKind::Properties => {
                    let section = self.parse_property_section();
                    self.assign_section(object.properties.replace(section).is_some());
                }
                TokenKind::Fields => {
                    let section = self.parse_field_section();
                    self.assign_section(object.fields.replace(section).is_some());
                }
                TokenKind::Keys => {
                    let section = self.parse_key_section();
                    self.assign_section(object.keys.replace(section).is_some());
                }
                TokenKind::FieldGroups => {
                    let section = self.parse_field_group_section();
                    self.assign_section(object.field_groups.replace(section).is_some());
                }
                TokenKind::Controls => {
                    let section = self.parse_controls_section();
                    self.assign_section(object.controls.replace(section).is_some());
                }
                TokenKind::RequestPage => {
                    let section = self.parse_controls_section();
                    self.assign_section(object.request_page.replace(section).is_some());
                }
                TokenKind::Actions => {
                    let section = self.parse_actions_section();
                    self.assign_section(object.actions.replace(section).is_some());
                }
                TokenKind::Elements | TokenKind::Menunodes => {
                    let section = self.parse_elements_section();
                    self.assign_section(object.elements.replace(section).is_some());
                }
                TokenKind::Dataset | TokenKind::DataItems => {
                    let section = self.parse_dataset_section();
                    self.assign_section(object.dataset.replace(section).is_some());
                }
                TokenKind::Code => {
                    let section = self.parse_code_section();
                    self.assign_section(object.code.replace(section).is_some());
                }
                TokenKind::Labels
                | TokenKind::Rdldata
                | TokenKind::Sections
                | TokenKind::Wordlayout => {
                    // Layout payloads; skipped wholesale, brace-balanced.
                    self.skip_opaque_section();
                }
                _ => {
                    self.error_expected(DiagnosticKind::UnexpectedToken, "section keyword");
                    self.bump();
                    self.recover_to_section_or_close();
                }
            }
        }

        object.span = self.span_from(&start);
        object
    }

    fn assign_section(&mut self, duplicate: bool) {
        if duplicate {
            self.error_message(
                DiagnosticKind::InvalidDeclaration,
                "duplicate section in object",
            );
        }
    }
}
