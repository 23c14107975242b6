//! Abstract syntax tree for C/AL.
//!
//! Nodes are plain owned data in three families: declarations, statements and
//! expressions. Every node carries a [`TokenSpan`] with clones of its first
//! and last token, so provenance survives after the parser releases the token
//! vector. When a closing delimiter was never seen, the end token falls back
//! to the start token and the parser records an error instead.

pub mod depth;
pub mod visit;

#[cfg(test)]
mod visit_tests;

#[cfg(test)]
mod depth_tests;

use serde::Serialize;
use serde::ser::SerializeStruct;

use crate::token::{Position, Token};

/// Inclusive token span of a node. Serializes as positions only; the full
/// tokens stay available in memory for consumers that need values.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSpan {
    pub start: Token,
    pub end: Token,
}

impl TokenSpan {
    pub fn new(start: Token, end: Token) -> Self {
        Self { start, end }
    }

    /// Span collapsed onto a single token; used when the closer is missing.
    pub fn point(token: Token) -> Self {
        Self {
            start: token.clone(),
            end: token,
        }
    }

    pub fn start_position(&self) -> &Position {
        &self.start.position
    }

    pub fn end_position(&self) -> &Position {
        &self.end.position
    }

    pub fn start_line(&self) -> u32 {
        self.start.position.line
    }

    pub fn end_line(&self) -> u32 {
        self.end.position.line
    }
}

impl Serialize for TokenSpan {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("TokenSpan", 2)?;
        s.serialize_field("start", &self.start.position)?;
        s.serialize_field("end", &self.end.position)?;
        s.end()
    }
}

// --- Declarations ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalDocument {
    pub objects: Vec<ObjectDeclaration>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObjectKind {
    Table,
    Codeunit,
    Page,
    Report,
    Query,
    Xmlport,
    Menusuite,
    Form,
    Dataport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectDeclaration {
    /// `None` when OBJECT was followed by an unknown kind word; the object is
    /// still parsed and consumers must tolerate the absence.
    pub object_kind: Option<ObjectKind>,
    pub object_id: Option<i64>,
    pub object_name: Option<String>,
    pub object_properties: Option<PropertySection>,
    pub properties: Option<PropertySection>,
    pub fields: Option<FieldSection>,
    pub keys: Option<KeySection>,
    pub field_groups: Option<FieldGroupSection>,
    pub controls: Option<ControlsSection>,
    pub actions: Option<ActionsSection>,
    pub elements: Option<ElementsSection>,
    pub dataset: Option<DatasetSection>,
    pub request_page: Option<ControlsSection>,
    pub code: Option<CodeSection>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySection {
    pub properties: Vec<Property>,
    pub span: TokenSpan,
}

/// `Name=Value;` pair. Trigger-valued properties (`OnRun=BEGIN … END;`) carry
/// the parsed code instead of raw text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub name: String,
    pub value: Option<String>,
    pub trigger: Option<TriggerDeclaration>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSection {
    pub fields: Vec<FieldDeclaration>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDeclaration {
    pub number: Option<i64>,
    pub enabled: Option<String>,
    pub name: Option<String>,
    pub field_type: Option<String>,
    pub properties: Vec<Property>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeySection {
    pub keys: Vec<KeyDeclaration>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyDeclaration {
    pub enabled: Option<String>,
    pub fields: Vec<String>,
    pub properties: Vec<Property>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldGroupSection {
    pub groups: Vec<FieldGroupDeclaration>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldGroupDeclaration {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub fields: Vec<String>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlsSection {
    pub controls: Vec<ControlDeclaration>,
    pub span: TokenSpan,
}

/// Page/report control. Children are rebuilt from the indentation column of
/// the export format, so container controls nest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlDeclaration {
    pub id: Option<i64>,
    pub indentation: i64,
    pub control_type: Option<String>,
    pub properties: Vec<Property>,
    pub children: Vec<ControlDeclaration>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionsSection {
    pub actions: Vec<ActionDeclaration>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionDeclaration {
    pub id: Option<i64>,
    pub indentation: i64,
    pub action_type: Option<String>,
    pub properties: Vec<Property>,
    pub children: Vec<ActionDeclaration>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementsSection {
    pub elements: Vec<XmlPortElement>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XmlPortElement {
    pub element_id: Option<String>,
    pub indentation: i64,
    pub name: Option<String>,
    pub element_kind: Option<String>,
    pub source_type: Option<String>,
    pub properties: Vec<Property>,
    pub children: Vec<XmlPortElement>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSection {
    pub items: Vec<DataItemDeclaration>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataItemDeclaration {
    pub id: Option<i64>,
    pub indentation: i64,
    pub name: Option<String>,
    pub item_kind: Option<String>,
    pub properties: Vec<Property>,
    pub children: Vec<DataItemDeclaration>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeSection {
    pub variables: Vec<VariableDeclaration>,
    pub procedures: Vec<ProcedureDeclaration>,
    pub triggers: Vec<TriggerDeclaration>,
    pub events: Vec<EventDeclaration>,
    /// The terminal `BEGIN … END.` documentation trigger.
    pub documentation: Option<BlockStatement>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDeclaration {
    pub name: String,
    pub sequence_no: Option<i64>,
    pub var_type: String,
    pub is_temporary: bool,
    pub run_on_client: bool,
    pub with_events: bool,
    pub is_in_dataset: bool,
    pub security_filtering: Option<String>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDeclaration {
    pub is_var: bool,
    pub name: String,
    pub sequence_no: Option<i64>,
    pub param_type: String,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcedureDeclaration {
    pub name: String,
    pub sequence_no: Option<i64>,
    pub is_local: bool,
    pub parameters: Vec<ParameterDeclaration>,
    pub return_name: Option<String>,
    pub return_type: Option<String>,
    pub variables: Vec<VariableDeclaration>,
    pub body: Option<BlockStatement>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerDeclaration {
    pub name: String,
    pub variables: Vec<VariableDeclaration>,
    pub body: Option<BlockStatement>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDeclaration {
    pub publisher: Option<String>,
    pub name: String,
    pub sequence_no: Option<i64>,
    pub parameters: Vec<ParameterDeclaration>,
    pub variables: Vec<VariableDeclaration>,
    pub body: Option<BlockStatement>,
    pub span: TokenSpan,
}

// --- Statements ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    Block(BlockStatement),
    If(Box<IfStatement>),
    Case(Box<CaseStatement>),
    For(Box<ForStatement>),
    While(Box<WhileStatement>),
    Repeat(Box<RepeatStatement>),
    With(Box<WithStatement>),
    Assignment(Box<AssignmentStatement>),
    Expression(Box<ExpressionStatement>),
    Exit(Box<ExitStatement>),
    AssertError(Box<AssertErrorStatement>),
}

impl Statement {
    pub fn span(&self) -> &TokenSpan {
        match self {
            Statement::Block(s) => &s.span,
            Statement::If(s) => &s.span,
            Statement::Case(s) => &s.span,
            Statement::For(s) => &s.span,
            Statement::While(s) => &s.span,
            Statement::Repeat(s) => &s.span,
            Statement::With(s) => &s.span,
            Statement::Assignment(s) => &s.span,
            Statement::Expression(s) => &s.span,
            Statement::Exit(s) => &s.span,
            Statement::AssertError(s) => &s.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_branch: Option<Statement>,
    pub else_branch: Option<Statement>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseStatement {
    pub expression: Expression,
    /// Branches in source order.
    pub branches: Vec<CaseBranch>,
    /// `None` when no ELSE was written; `Some(vec![])` for an empty ELSE.
    pub else_branch: Option<Vec<Statement>>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseBranch {
    /// Non-empty; ranges appear as [`Expression::Range`].
    pub values: Vec<Expression>,
    pub body: Option<Statement>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForStatement {
    pub variable: Expression,
    pub from: Expression,
    pub to: Expression,
    pub down_to: bool,
    pub body: Option<Statement>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Option<Statement>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatStatement {
    pub body: Vec<Statement>,
    pub condition: Option<Expression>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithStatement {
    pub record: Expression,
    pub body: Option<Statement>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignOp {
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentStatement {
    pub target: Expression,
    pub operator: AssignOp,
    pub value: Expression,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpressionStatement {
    pub expression: Expression,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExitStatement {
    pub value: Option<Expression>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssertErrorStatement {
    pub body: Option<Statement>,
    pub span: TokenSpan,
}

// --- Expressions ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expression {
    Literal(Box<Literal>),
    Identifier(Box<Identifier>),
    Binary(Box<BinaryExpression>),
    Unary(Box<UnaryExpression>),
    Member(Box<MemberExpression>),
    Call(Box<CallExpression>),
    Index(Box<IndexExpression>),
    Set(Box<SetLiteral>),
    Range(Box<RangeExpression>),
}

impl Expression {
    pub fn span(&self) -> &TokenSpan {
        match self {
            Expression::Literal(e) => &e.span,
            Expression::Identifier(e) => &e.span,
            Expression::Binary(e) => &e.span,
            Expression::Unary(e) => &e.span,
            Expression::Member(e) => &e.span,
            Expression::Call(e) => &e.span,
            Expression::Index(e) => &e.span,
            Expression::Set(e) => &e.span,
            Expression::Range(e) => &e.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    Integer(i64),
    Decimal(f64),
    Str(String),
    Date(String),
    Time(String),
    DateTime(String),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Literal {
    pub value: LiteralValue,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identifier {
    pub name: String,
    pub is_quoted: bool,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Or,
    Xor,
    And,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    In,
    Add,
    Subtract,
    Multiply,
    Divide,
    IntDivide,
    Modulo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryExpression {
    pub op: BinaryOp,
    pub left: Expression,
    pub right: Expression,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnaryExpression {
    pub op: UnaryOp,
    pub operand: Expression,
    pub span: TokenSpan,
}

/// `.`-qualified (`Rec.Name`) or `::`-qualified (`Status::Open`) access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MemberQualifier {
    Dot,
    Scope,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberExpression {
    pub object: Expression,
    pub member: Identifier,
    pub qualifier: MemberQualifier,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallExpression {
    pub callee: Expression,
    pub arguments: Vec<Expression>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexExpression {
    pub target: Expression,
    pub indices: Vec<Expression>,
    pub span: TokenSpan,
}

/// `[v, a..b, …]`; elements are plain expressions or ranges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetLiteral {
    pub elements: Vec<Expression>,
    pub span: TokenSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeExpression {
    pub low: Expression,
    /// `None` only after an expected-range-expression error.
    pub high: Option<Expression>,
    pub span: TokenSpan,
}
