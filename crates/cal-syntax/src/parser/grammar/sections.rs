//! Section bodies: properties, field/key/control/element records.
//!
//! All record-bearing sections share one raw shape — `{ cell ; cell ; … ;
//! Name=Value … }` — and differ only in what the positional cells mean. The
//! raw record parser collects cells and properties; per-section mapping
//! happens on top. Controls, actions, XMLport elements and data items nest
//! by their indentation cell.

use crate::ast::{
    ActionDeclaration, ActionsSection, ControlDeclaration, ControlsSection, DataItemDeclaration,
    DatasetSection, FieldDeclaration, FieldGroupDeclaration, FieldGroupSection, FieldSection,
    KeyDeclaration, KeySection, Property, PropertySection, TokenSpan, XmlPortElement,
};
use crate::diagnostics::DiagnosticKind;
use crate::parser::core::Parser;
use crate::token::{Token, TokenKind, TokenSet, token_sets};

const SECTION_RECOVERY: TokenSet =
    token_sets::SECTION_KEYWORDS.union(TokenSet::single(TokenKind::RightBrace));

struct RawRecord {
    cells: Vec<Option<String>>,
    properties: Vec<Property>,
    span: TokenSpan,
}

impl RawRecord {
    fn cell(&self, index: usize) -> Option<String> {
        self.cells.get(index).cloned().flatten()
    }

    fn cell_i64(&self, index: usize) -> Option<i64> {
        self.cell(index).and_then(|v| v.parse::<i64>().ok())
    }

    fn cell_list(&self, index: usize) -> Vec<String> {
        self.cell(index)
            .map(|v| {
                v.split(',')
                    .map(|part| part.trim().to_string())
                    .filter(|part| !part.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Record kinds that nest by their indentation cell.
trait Nested: Sized {
    fn indentation(&self) -> i64;
    fn children_mut(&mut self) -> &mut Vec<Self>;
}

impl Nested for ControlDeclaration {
    fn indentation(&self) -> i64 {
        self.indentation
    }
    fn children_mut(&mut self) -> &mut Vec<Self> {
        &mut self.children
    }
}

impl Nested for ActionDeclaration {
    fn indentation(&self) -> i64 {
        self.indentation
    }
    fn children_mut(&mut self) -> &mut Vec<Self> {
        &mut self.children
    }
}

impl Nested for XmlPortElement {
    fn indentation(&self) -> i64 {
        self.indentation
    }
    fn children_mut(&mut self) -> &mut Vec<Self> {
        &mut self.children
    }
}

impl Nested for DataItemDeclaration {
    fn indentation(&self) -> i64 {
        self.indentation
    }
    fn children_mut(&mut self) -> &mut Vec<Self> {
        &mut self.children
    }
}

fn insert_nested<T: Nested>(siblings: &mut Vec<T>, item: T) {
    match siblings.last_mut() {
        Some(last) if item.indentation() > last.indentation() => {
            insert_nested(last.children_mut(), item)
        }
        _ => siblings.push(item),
    }
}

fn nest_by_indentation<T: Nested>(flat: Vec<T>) -> Vec<T> {
    let mut roots = Vec::new();
    for item in flat {
        insert_nested(&mut roots, item);
    }
    roots
}

impl Parser {
    pub(in crate::parser) fn recover_to_section_or_close(&mut self) {
        self.recover_to(SECTION_RECOVERY);
    }

    /// True at `}`, EOF, or the start of the next section — the points where
    /// any section body must stop.
    fn section_is_done(&self) -> bool {
        self.at(TokenKind::RightBrace) || self.at_eof() || self.at_section_boundary()
    }

    /// Consumes the section keyword and its `{`. A missing opening brace is
    /// recorded and the body is parsed as if the brace were present.
    fn open_section(&mut self) -> (Token, bool) {
        let keyword = self.bump();
        let has_brace = if self.at(TokenKind::LeftBrace) {
            self.bump();
            true
        } else {
            self.error(DiagnosticKind::MissingOpeningBrace);
            false
        };
        (keyword, has_brace)
    }

    /// Closes the section. Stopping at a section keyword synthesizes the
    /// close and records the missing brace.
    fn close_section(&mut self, had_brace: bool) {
        if self.at(TokenKind::RightBrace) {
            if had_brace {
                self.bump();
            }
            // Without an opening brace the `}` belongs to the object.
        } else if had_brace {
            self.error(DiagnosticKind::MissingClosingBrace);
        }
    }

    pub(in crate::parser) fn parse_property_section(&mut self) -> PropertySection {
        let (keyword, has_brace) = self.open_section();
        let mut properties = Vec::new();
        loop {
            if self.section_is_done() {
                break;
            }
            match self.kind() {
                TokenKind::Semicolon => {
                    self.bump();
                }
                TokenKind::Identifier | TokenKind::QuotedIdentifier => {
                    if let Some(property) = self.parse_property() {
                        properties.push(property);
                    }
                }
                k if k.is_keyword() => {
                    if let Some(property) = self.parse_property() {
                        properties.push(property);
                    }
                }
                _ => self.error_and_bump("property name"),
            }
        }
        self.close_section(has_brace);
        PropertySection {
            properties,
            span: self.span_from(&keyword),
        }
    }

    /// `Name=Value;` — the name may span several words (`Version List`), the
    /// value is a single raw token, or trigger code for `OnXxx=BEGIN … END`.
    pub(in crate::parser) fn parse_property(&mut self) -> Option<Property> {
        let start = self.current().clone();
        let mut name_parts: Vec<String> = Vec::new();
        loop {
            match self.kind() {
                TokenKind::Identifier | TokenKind::QuotedIdentifier | TokenKind::Integer => {
                    name_parts.push(self.bump().value);
                }
                k if k.is_keyword() => {
                    name_parts.push(self.bump().value);
                }
                _ => break,
            }
        }
        if name_parts.is_empty() {
            self.error_and_bump("property name");
            return None;
        }
        let name = name_parts.join(" ");

        let mut value = None;
        let mut trigger = None;
        if self.eat(TokenKind::Equal).is_some() {
            if self.at(TokenKind::Begin) || self.at(TokenKind::Var) {
                trigger = Some(self.parse_trigger_body(name.clone(), &start));
            } else if self.at(TokenKind::PropertyValue) {
                value = Some(self.bump().value);
            }
        } else {
            self.error_expected(DiagnosticKind::UnexpectedToken, "'=' after property name");
        }
        self.eat(TokenKind::Semicolon);
        Some(Property {
            name,
            value,
            trigger,
            span: self.span_from(&start),
        })
    }

    /// One brace-delimited record: positional cells, then `Name=Value` pairs.
    fn parse_record(&mut self) -> RawRecord {
        let start = self.bump(); // '{'
        let mut cells: Vec<Option<String>> = Vec::new();
        let mut pending: Option<String> = None;
        let mut properties = Vec::new();
        loop {
            match self.kind() {
                TokenKind::RightBrace => {
                    self.bump();
                    break;
                }
                TokenKind::Eof => {
                    self.error_message(
                        DiagnosticKind::MissingClosingBrace,
                        "missing closing brace for record",
                    );
                    break;
                }
                TokenKind::Semicolon => {
                    cells.push(pending.take());
                    self.bump();
                }
                TokenKind::Integer
                | TokenKind::Decimal
                | TokenKind::Date
                | TokenKind::Time
                | TokenKind::DateTime
                | TokenKind::PropertyValue => {
                    pending = Some(self.bump().value);
                }
                TokenKind::Identifier | TokenKind::QuotedIdentifier
                    if self.nth_kind(1) != TokenKind::Equal =>
                {
                    pending = Some(self.bump().value);
                }
                // Keyword-valued cells: XMLport source types lex as `Table`
                // or `Text` keyword tokens.
                k if k.is_keyword()
                    && !k.is_section_keyword()
                    && self.nth_kind(1) != TokenKind::Equal =>
                {
                    pending = Some(self.bump().value);
                }
                k if k.is_section_keyword() && self.nth_kind(1) != TokenKind::Equal => {
                    self.error_message(
                        DiagnosticKind::MissingClosingBrace,
                        "missing closing brace for record",
                    );
                    break;
                }
                _ => {
                    if let Some(cell) = pending.take() {
                        cells.push(Some(cell));
                    }
                    self.parse_record_properties(&mut properties);
                    break;
                }
            }
        }
        if let Some(cell) = pending.take() {
            cells.push(Some(cell));
        }
        RawRecord {
            cells,
            properties,
            span: self.span_from(&start),
        }
    }

    fn parse_record_properties(&mut self, properties: &mut Vec<Property>) {
        loop {
            match self.kind() {
                TokenKind::RightBrace => {
                    self.bump();
                    return;
                }
                TokenKind::Eof => {
                    self.error_message(
                        DiagnosticKind::MissingClosingBrace,
                        "missing closing brace for record",
                    );
                    return;
                }
                TokenKind::Semicolon => {
                    self.bump();
                }
                k if k.is_section_keyword() && self.nth_kind(1) != TokenKind::Equal => {
                    self.error_message(
                        DiagnosticKind::MissingClosingBrace,
                        "missing closing brace for record",
                    );
                    return;
                }
                _ => {
                    if self.parse_property().is_none() {
                        // parse_property reported and consumed one token.
                        if self.at_eof() {
                            return;
                        }
                    }
                }
            }
        }
    }

    fn parse_record_section(&mut self) -> (Vec<RawRecord>, Token, bool) {
        let (keyword, has_brace) = self.open_section();
        let mut records = Vec::new();
        loop {
            if self.section_is_done() {
                break;
            }
            if self.at(TokenKind::LeftBrace) {
                records.push(self.parse_record());
            } else {
                self.error_and_bump("record");
            }
        }
        self.close_section(has_brace);
        (records, keyword, has_brace)
    }

    pub(in crate::parser) fn parse_field_section(&mut self) -> FieldSection {
        let (records, keyword, _) = self.parse_record_section();
        let fields = records
            .into_iter()
            .map(|r| FieldDeclaration {
                number: r.cell_i64(0),
                enabled: r.cell(1),
                name: r.cell(2),
                field_type: r.cell(3),
                properties: r.properties,
                span: r.span,
            })
            .collect();
        FieldSection {
            fields,
            span: self.span_from(&keyword),
        }
    }

    pub(in crate::parser) fn parse_key_section(&mut self) -> KeySection {
        let (records, keyword, _) = self.parse_record_section();
        let keys = records
            .into_iter()
            .map(|r| KeyDeclaration {
                enabled: r.cell(0),
                fields: r.cell_list(1),
                properties: r.properties,
                span: r.span,
            })
            .collect();
        KeySection {
            keys,
            span: self.span_from(&keyword),
        }
    }

    pub(in crate::parser) fn parse_field_group_section(&mut self) -> FieldGroupSection {
        let (records, keyword, _) = self.parse_record_section();
        let groups = records
            .into_iter()
            .map(|r| FieldGroupDeclaration {
                id: r.cell_i64(0),
                name: r.cell(1),
                fields: r.cell_list(2),
                span: r.span,
            })
            .collect();
        FieldGroupSection {
            groups,
            span: self.span_from(&keyword),
        }
    }

    pub(in crate::parser) fn parse_controls_section(&mut self) -> ControlsSection {
        let (records, keyword, _) = self.parse_record_section();
        let flat: Vec<ControlDeclaration> = records
            .into_iter()
            .map(|r| ControlDeclaration {
                id: r.cell_i64(0),
                indentation: r.cell_i64(1).unwrap_or(0),
                control_type: r.cell(2),
                properties: r.properties,
                children: Vec::new(),
                span: r.span,
            })
            .collect();
        ControlsSection {
            controls: nest_by_indentation(flat),
            span: self.span_from(&keyword),
        }
    }

    pub(in crate::parser) fn parse_actions_section(&mut self) -> ActionsSection {
        let (records, keyword, _) = self.parse_record_section();
        let flat: Vec<ActionDeclaration> = records
            .into_iter()
            .map(|r| ActionDeclaration {
                id: r.cell_i64(0),
                indentation: r.cell_i64(1).unwrap_or(0),
                action_type: r.cell(2),
                properties: r.properties,
                children: Vec::new(),
                span: r.span,
            })
            .collect();
        ActionsSection {
            actions: nest_by_indentation(flat),
            span: self.span_from(&keyword),
        }
    }

    pub(in crate::parser) fn parse_elements_section(&mut self) -> crate::ast::ElementsSection {
        let (records, keyword, _) = self.parse_record_section();
        let flat: Vec<XmlPortElement> = records
            .into_iter()
            .map(|r| XmlPortElement {
                element_id: r.cell(0),
                indentation: r.cell_i64(1).unwrap_or(0),
                name: r.cell(2),
                element_kind: r.cell(3),
                source_type: r.cell(4),
                properties: r.properties,
                children: Vec::new(),
                span: r.span,
            })
            .collect();
        crate::ast::ElementsSection {
            elements: nest_by_indentation(flat),
            span: self.span_from(&keyword),
        }
    }

    pub(in crate::parser) fn parse_dataset_section(&mut self) -> DatasetSection {
        let (records, keyword, _) = self.parse_record_section();
        let flat: Vec<DataItemDeclaration> = records
            .into_iter()
            .map(|r| DataItemDeclaration {
                id: r.cell_i64(0),
                indentation: r.cell_i64(1).unwrap_or(0),
                item_kind: r.cell(2),
                name: r.cell(3),
                properties: r.properties,
                children: Vec::new(),
                span: r.span,
            })
            .collect();
        DatasetSection {
            items: nest_by_indentation(flat),
            span: self.span_from(&keyword),
        }
    }

    /// Layout payload sections (RDLDATA, LABELS, …): consumed brace-balanced
    /// and dropped.
    pub(in crate::parser) fn skip_opaque_section(&mut self) {
        self.bump(); // keyword
        if self.expect(TokenKind::LeftBrace, "'{' to open section").is_none() {
            return;
        }
        let mut depth = 1u32;
        while depth > 0 && !self.at_eof() {
            match self.kind() {
                TokenKind::LeftBrace => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::RightBrace => {
                    depth -= 1;
                    self.bump();
                }
                _ => {
                    self.bump();
                }
            }
        }
    }
}
