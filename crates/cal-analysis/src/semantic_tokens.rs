//! Semantic-token classification.
//!
//! A single pass over the token stream, narrowed by one AST walk done up
//! front: procedure/trigger/event names classify as functions, declared
//! parameter and variable names as such, declaration sites carry the
//! declaration modifier, and values inside `[ … ]` set literals get their own
//! token type so set expressions highlight distinctly. Positions are 0-based
//! at this boundary. Nothing survives between calls.


use std::collections::HashSet;

use serde::Serialize;

use cal_syntax::ast::visit::{NodeRef, Visitor, walk};
use cal_syntax::ast::CalDocument;
use cal_syntax::token::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SemanticTokenType {
    Keyword,
    Variable,
    Parameter,
    Function,
    TypeName,
    Property,
    Number,
    Str,
    Operator,
    /// Values inside a set literal.
    SetValue,
}

/// Bit set of token modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SemanticTokenModifiers(pub u32);

impl SemanticTokenModifiers {
    pub const NONE: SemanticTokenModifiers = SemanticTokenModifiers(0);
    pub const DECLARATION: SemanticTokenModifiers = SemanticTokenModifiers(1);
    pub const QUOTED: SemanticTokenModifiers = SemanticTokenModifiers(1 << 1);

    pub fn union(self, other: SemanticTokenModifiers) -> SemanticTokenModifiers {
        SemanticTokenModifiers(self.0 | other.0)
    }

    pub fn contains(self, other: SemanticTokenModifiers) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Builder interface the classifier emits into.
pub trait SemanticTokenSink {
    fn push(
        &mut self,
        line: u32,
        character: u32,
        length: u32,
        token_type: SemanticTokenType,
        modifiers: SemanticTokenModifiers,
    );
}

/// Plain collecting sink.
#[derive(Debug, Default)]
pub struct SemanticTokensBuilder {
    tokens: Vec<SemanticToken>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SemanticToken {
    pub line: u32,
    pub character: u32,
    pub length: u32,
    pub token_type: SemanticTokenType,
    pub modifiers: SemanticTokenModifiers,
}

impl SemanticTokensBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tokens(&self) -> &[SemanticToken] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<SemanticToken> {
        self.tokens
    }
}

impl SemanticTokenSink for SemanticTokensBuilder {
    fn push(
        &mut self,
        line: u32,
        character: u32,
        length: u32,
        token_type: SemanticTokenType,
        modifiers: SemanticTokenModifiers,
    ) {
        self.tokens.push(SemanticToken {
            line,
            character,
            length,
            token_type,
            modifiers,
        });
    }
}

#[derive(Default)]
struct NameIndex {
    functions: HashSet<String>,
    parameters: HashSet<String>,
    variables: HashSet<String>,
    /// Offset ranges of variable/parameter declarations: name first, type
    /// identifiers after.
    declaration_ranges: Vec<(u32, u32)>,
    /// Offset ranges of set literals.
    set_ranges: Vec<(u32, u32)>,
}

impl NameIndex {
    fn add(set: &mut HashSet<String>, name: &str) {
        if !name.is_empty() {
            set.insert(name.to_ascii_uppercase());
        }
    }
}

impl Visitor for NameIndex {
    fn visit_procedure(&mut self, node: &cal_syntax::ast::ProcedureDeclaration) -> bool {
        Self::add(&mut self.functions, &node.name);
        true
    }

    fn visit_trigger(&mut self, node: &cal_syntax::ast::TriggerDeclaration) -> bool {
        Self::add(&mut self.functions, &node.name);
        true
    }

    fn visit_event(&mut self, node: &cal_syntax::ast::EventDeclaration) -> bool {
        Self::add(&mut self.functions, &node.name);
        true
    }

    fn visit_parameter(&mut self, node: &cal_syntax::ast::ParameterDeclaration) -> bool {
        Self::add(&mut self.parameters, &node.name);
        self.declaration_ranges
            .push((node.span.start.position.start, node.span.end.position.end));
        true
    }

    fn visit_variable(&mut self, node: &cal_syntax::ast::VariableDeclaration) -> bool {
        Self::add(&mut self.variables, &node.name);
        self.declaration_ranges
            .push((node.span.start.position.start, node.span.end.position.end));
        true
    }

    fn visit_set(&mut self, node: &cal_syntax::ast::SetLiteral) -> bool {
        self.set_ranges
            .push((node.span.start.position.start, node.span.end.position.end));
        true
    }
}

fn in_any(ranges: &[(u32, u32)], offset: u32) -> Option<(u32, u32)> {
    ranges
        .iter()
        .copied()
        .find(|(start, end)| offset >= *start && offset < *end)
}

/// Classifies every contributing token and pushes them into `sink` in source
/// order.
pub fn semantic_tokens(tokens: &[Token], document: &CalDocument, sink: &mut dyn SemanticTokenSink) {
    let mut index = NameIndex::default();
    walk(&mut index, NodeRef::Document(document));

    let mut named_in_declaration: Option<(u32, u32)> = None;

    for (position, token) in tokens.iter().enumerate() {
        if token.kind == TokenKind::Eof || token.position.is_empty() {
            continue;
        }
        let offset = token.position.start;
        let in_set = in_any(&index.set_ranges, offset).is_some();

        let classified: Option<(SemanticTokenType, SemanticTokenModifiers)> = match token.kind {
            k if k.is_keyword() => Some((SemanticTokenType::Keyword, SemanticTokenModifiers::NONE)),
            k if k.is_operator() => {
                Some((SemanticTokenType::Operator, SemanticTokenModifiers::NONE))
            }
            TokenKind::Integer
            | TokenKind::Decimal
            | TokenKind::Date
            | TokenKind::Time
            | TokenKind::DateTime => {
                let token_type = if in_set {
                    SemanticTokenType::SetValue
                } else {
                    SemanticTokenType::Number
                };
                Some((token_type, SemanticTokenModifiers::NONE))
            }
            TokenKind::StringLiteral => {
                let token_type = if in_set {
                    SemanticTokenType::SetValue
                } else {
                    SemanticTokenType::Str
                };
                Some((token_type, SemanticTokenModifiers::NONE))
            }
            TokenKind::PropertyValue => {
                Some((SemanticTokenType::Property, SemanticTokenModifiers::NONE))
            }
            TokenKind::Identifier | TokenKind::QuotedIdentifier => {
                let quoted = if token.kind == TokenKind::QuotedIdentifier {
                    SemanticTokenModifiers::QUOTED
                } else {
                    SemanticTokenModifiers::NONE
                };
                if in_set {
                    Some((SemanticTokenType::SetValue, quoted))
                } else if let Some(range) = in_any(&index.declaration_ranges, offset) {
                    // First identifier in a declaration is the declared name,
                    // the rest belong to the type.
                    if named_in_declaration != Some(range) {
                        named_in_declaration = Some(range);
                        let token_type = if index.parameters.contains(&token.value.to_ascii_uppercase())
                        {
                            SemanticTokenType::Parameter
                        } else {
                            SemanticTokenType::Variable
                        };
                        Some((token_type, quoted.union(SemanticTokenModifiers::DECLARATION)))
                    } else {
                        Some((SemanticTokenType::TypeName, quoted))
                    }
                } else if tokens.get(position + 1).map(|t| t.kind) == Some(TokenKind::Equal) {
                    Some((SemanticTokenType::Property, quoted))
                } else {
                    let upper = token.value.to_ascii_uppercase();
                    let token_type = if index.functions.contains(&upper) {
                        SemanticTokenType::Function
                    } else if index.parameters.contains(&upper) {
                        SemanticTokenType::Parameter
                    } else {
                        SemanticTokenType::Variable
                    };
                    Some((token_type, quoted))
                }
            }
            _ => None,
        };

        if let Some((token_type, modifiers)) = classified {
            sink.push(
                token.position.line - 1,
                token.position.column - 1,
                token.position.len(),
                token_type,
                modifiers,
            );
        }
    }
}
