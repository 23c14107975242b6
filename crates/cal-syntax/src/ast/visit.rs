//! AST visitor and walker.
//!
//! Implement [`Visitor`] and override the hooks you care about. Every hook
//! returns a descent flag: `false` means "do not descend into this node's
//! children". The walker invokes the generic [`Visitor::visit_node`] first,
//! then the variant hook; children are visited in source order unless either
//! returned `false`.
//!
//! [`for_each_child`] is the single definition of child order; the plain
//! walker and the depth-limited walker both drive it.

use super::*;

/// Borrowed reference to any node kind.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Document(&'a CalDocument),
    Object(&'a ObjectDeclaration),
    PropertySection(&'a PropertySection),
    Property(&'a Property),
    FieldSection(&'a FieldSection),
    Field(&'a FieldDeclaration),
    KeySection(&'a KeySection),
    Key(&'a KeyDeclaration),
    FieldGroupSection(&'a FieldGroupSection),
    FieldGroup(&'a FieldGroupDeclaration),
    ControlsSection(&'a ControlsSection),
    Control(&'a ControlDeclaration),
    ActionsSection(&'a ActionsSection),
    Action(&'a ActionDeclaration),
    ElementsSection(&'a ElementsSection),
    XmlPortElement(&'a XmlPortElement),
    DatasetSection(&'a DatasetSection),
    DataItem(&'a DataItemDeclaration),
    CodeSection(&'a CodeSection),
    Variable(&'a VariableDeclaration),
    Parameter(&'a ParameterDeclaration),
    Procedure(&'a ProcedureDeclaration),
    Trigger(&'a TriggerDeclaration),
    Event(&'a EventDeclaration),
    Block(&'a BlockStatement),
    If(&'a IfStatement),
    Case(&'a CaseStatement),
    CaseBranch(&'a CaseBranch),
    For(&'a ForStatement),
    While(&'a WhileStatement),
    Repeat(&'a RepeatStatement),
    With(&'a WithStatement),
    Assignment(&'a AssignmentStatement),
    ExpressionStmt(&'a ExpressionStatement),
    Exit(&'a ExitStatement),
    AssertError(&'a AssertErrorStatement),
    Literal(&'a Literal),
    Identifier(&'a Identifier),
    Binary(&'a BinaryExpression),
    Unary(&'a UnaryExpression),
    Member(&'a MemberExpression),
    Call(&'a CallExpression),
    Index(&'a IndexExpression),
    Set(&'a SetLiteral),
    Range(&'a RangeExpression),
}

impl<'a> NodeRef<'a> {
    pub fn span(&self) -> &'a TokenSpan {
        match *self {
            NodeRef::Document(n) => &n.span,
            NodeRef::Object(n) => &n.span,
            NodeRef::PropertySection(n) => &n.span,
            NodeRef::Property(n) => &n.span,
            NodeRef::FieldSection(n) => &n.span,
            NodeRef::Field(n) => &n.span,
            NodeRef::KeySection(n) => &n.span,
            NodeRef::Key(n) => &n.span,
            NodeRef::FieldGroupSection(n) => &n.span,
            NodeRef::FieldGroup(n) => &n.span,
            NodeRef::ControlsSection(n) => &n.span,
            NodeRef::Control(n) => &n.span,
            NodeRef::ActionsSection(n) => &n.span,
            NodeRef::Action(n) => &n.span,
            NodeRef::ElementsSection(n) => &n.span,
            NodeRef::XmlPortElement(n) => &n.span,
            NodeRef::DatasetSection(n) => &n.span,
            NodeRef::DataItem(n) => &n.span,
            NodeRef::CodeSection(n) => &n.span,
            NodeRef::Variable(n) => &n.span,
            NodeRef::Parameter(n) => &n.span,
            NodeRef::Procedure(n) => &n.span,
            NodeRef::Trigger(n) => &n.span,
            NodeRef::Event(n) => &n.span,
            NodeRef::Block(n) => &n.span,
            NodeRef::If(n) => &n.span,
            NodeRef::Case(n) => &n.span,
            NodeRef::CaseBranch(n) => &n.span,
            NodeRef::For(n) => &n.span,
            NodeRef::While(n) => &n.span,
            NodeRef::Repeat(n) => &n.span,
            NodeRef::With(n) => &n.span,
            NodeRef::Assignment(n) => &n.span,
            NodeRef::ExpressionStmt(n) => &n.span,
            NodeRef::Exit(n) => &n.span,
            NodeRef::AssertError(n) => &n.span,
            NodeRef::Literal(n) => &n.span,
            NodeRef::Identifier(n) => &n.span,
            NodeRef::Binary(n) => &n.span,
            NodeRef::Unary(n) => &n.span,
            NodeRef::Member(n) => &n.span,
            NodeRef::Call(n) => &n.span,
            NodeRef::Index(n) => &n.span,
            NodeRef::Set(n) => &n.span,
            NodeRef::Range(n) => &n.span,
        }
    }
}

pub fn statement_ref(statement: &Statement) -> NodeRef<'_> {
    match statement {
        Statement::Block(s) => NodeRef::Block(s),
        Statement::If(s) => NodeRef::If(s),
        Statement::Case(s) => NodeRef::Case(s),
        Statement::For(s) => NodeRef::For(s),
        Statement::While(s) => NodeRef::While(s),
        Statement::Repeat(s) => NodeRef::Repeat(s),
        Statement::With(s) => NodeRef::With(s),
        Statement::Assignment(s) => NodeRef::Assignment(s),
        Statement::Expression(s) => NodeRef::ExpressionStmt(s),
        Statement::Exit(s) => NodeRef::Exit(s),
        Statement::AssertError(s) => NodeRef::AssertError(s),
    }
}

pub fn expression_ref(expression: &Expression) -> NodeRef<'_> {
    match expression {
        Expression::Literal(e) => NodeRef::Literal(e),
        Expression::Identifier(e) => NodeRef::Identifier(e),
        Expression::Binary(e) => NodeRef::Binary(e),
        Expression::Unary(e) => NodeRef::Unary(e),
        Expression::Member(e) => NodeRef::Member(e),
        Expression::Call(e) => NodeRef::Call(e),
        Expression::Index(e) => NodeRef::Index(e),
        Expression::Set(e) => NodeRef::Set(e),
        Expression::Range(e) => NodeRef::Range(e),
    }
}

/// One optional hook per node kind plus the generic `visit_node`. Defaults
/// descend everywhere.
#[allow(unused_variables)]
pub trait Visitor {
    fn visit_node(&mut self, node: NodeRef<'_>) -> bool {
        true
    }

    fn visit_document(&mut self, node: &CalDocument) -> bool {
        true
    }
    fn visit_object(&mut self, node: &ObjectDeclaration) -> bool {
        true
    }
    fn visit_property_section(&mut self, node: &PropertySection) -> bool {
        true
    }
    fn visit_property(&mut self, node: &Property) -> bool {
        true
    }
    fn visit_field_section(&mut self, node: &FieldSection) -> bool {
        true
    }
    fn visit_field(&mut self, node: &FieldDeclaration) -> bool {
        true
    }
    fn visit_key_section(&mut self, node: &KeySection) -> bool {
        true
    }
    fn visit_key(&mut self, node: &KeyDeclaration) -> bool {
        true
    }
    fn visit_field_group_section(&mut self, node: &FieldGroupSection) -> bool {
        true
    }
    fn visit_field_group(&mut self, node: &FieldGroupDeclaration) -> bool {
        true
    }
    fn visit_controls_section(&mut self, node: &ControlsSection) -> bool {
        true
    }
    fn visit_control(&mut self, node: &ControlDeclaration) -> bool {
        true
    }
    fn visit_actions_section(&mut self, node: &ActionsSection) -> bool {
        true
    }
    fn visit_action(&mut self, node: &ActionDeclaration) -> bool {
        true
    }
    fn visit_elements_section(&mut self, node: &ElementsSection) -> bool {
        true
    }
    fn visit_xmlport_element(&mut self, node: &XmlPortElement) -> bool {
        true
    }
    fn visit_dataset_section(&mut self, node: &DatasetSection) -> bool {
        true
    }
    fn visit_data_item(&mut self, node: &DataItemDeclaration) -> bool {
        true
    }
    fn visit_code_section(&mut self, node: &CodeSection) -> bool {
        true
    }
    fn visit_variable(&mut self, node: &VariableDeclaration) -> bool {
        true
    }
    fn visit_parameter(&mut self, node: &ParameterDeclaration) -> bool {
        true
    }
    fn visit_procedure(&mut self, node: &ProcedureDeclaration) -> bool {
        true
    }
    fn visit_trigger(&mut self, node: &TriggerDeclaration) -> bool {
        true
    }
    fn visit_event(&mut self, node: &EventDeclaration) -> bool {
        true
    }
    fn visit_block(&mut self, node: &BlockStatement) -> bool {
        true
    }
    fn visit_if(&mut self, node: &IfStatement) -> bool {
        true
    }
    fn visit_case(&mut self, node: &CaseStatement) -> bool {
        true
    }
    fn visit_case_branch(&mut self, node: &CaseBranch) -> bool {
        true
    }
    fn visit_for(&mut self, node: &ForStatement) -> bool {
        true
    }
    fn visit_while(&mut self, node: &WhileStatement) -> bool {
        true
    }
    fn visit_repeat(&mut self, node: &RepeatStatement) -> bool {
        true
    }
    fn visit_with(&mut self, node: &WithStatement) -> bool {
        true
    }
    fn visit_assignment(&mut self, node: &AssignmentStatement) -> bool {
        true
    }
    fn visit_expression_statement(&mut self, node: &ExpressionStatement) -> bool {
        true
    }
    fn visit_exit(&mut self, node: &ExitStatement) -> bool {
        true
    }
    fn visit_assert_error(&mut self, node: &AssertErrorStatement) -> bool {
        true
    }
    fn visit_literal(&mut self, node: &Literal) -> bool {
        true
    }
    fn visit_identifier(&mut self, node: &Identifier) -> bool {
        true
    }
    fn visit_binary(&mut self, node: &BinaryExpression) -> bool {
        true
    }
    fn visit_unary(&mut self, node: &UnaryExpression) -> bool {
        true
    }
    fn visit_member(&mut self, node: &MemberExpression) -> bool {
        true
    }
    fn visit_call(&mut self, node: &CallExpression) -> bool {
        true
    }
    fn visit_index(&mut self, node: &IndexExpression) -> bool {
        true
    }
    fn visit_set(&mut self, node: &SetLiteral) -> bool {
        true
    }
    fn visit_range(&mut self, node: &RangeExpression) -> bool {
        true
    }
}

/// Visitor that descends everywhere and does nothing.
pub struct NullVisitor;

impl Visitor for NullVisitor {}

/// Dispatches the variant-specific hook for `node`.
pub(crate) fn visit_specific<V: Visitor + ?Sized>(visitor: &mut V, node: NodeRef<'_>) -> bool {
    match node {
        NodeRef::Document(n) => visitor.visit_document(n),
        NodeRef::Object(n) => visitor.visit_object(n),
        NodeRef::PropertySection(n) => visitor.visit_property_section(n),
        NodeRef::Property(n) => visitor.visit_property(n),
        NodeRef::FieldSection(n) => visitor.visit_field_section(n),
        NodeRef::Field(n) => visitor.visit_field(n),
        NodeRef::KeySection(n) => visitor.visit_key_section(n),
        NodeRef::Key(n) => visitor.visit_key(n),
        NodeRef::FieldGroupSection(n) => visitor.visit_field_group_section(n),
        NodeRef::FieldGroup(n) => visitor.visit_field_group(n),
        NodeRef::ControlsSection(n) => visitor.visit_controls_section(n),
        NodeRef::Control(n) => visitor.visit_control(n),
        NodeRef::ActionsSection(n) => visitor.visit_actions_section(n),
        NodeRef::Action(n) => visitor.visit_action(n),
        NodeRef::ElementsSection(n) => visitor.visit_elements_section(n),
        NodeRef::XmlPortElement(n) => visitor.visit_xmlport_element(n),
        NodeRef::DatasetSection(n) => visitor.visit_dataset_section(n),
        NodeRef::DataItem(n) => visitor.visit_data_item(n),
        NodeRef::CodeSection(n) => visitor.visit_code_section(n),
        NodeRef::Variable(n) => visitor.visit_variable(n),
        NodeRef::Parameter(n) => visitor.visit_parameter(n),
        NodeRef::Procedure(n) => visitor.visit_procedure(n),
        NodeRef::Trigger(n) => visitor.visit_trigger(n),
        NodeRef::Event(n) => visitor.visit_event(n),
        NodeRef::Block(n) => visitor.visit_block(n),
        NodeRef::If(n) => visitor.visit_if(n),
        NodeRef::Case(n) => visitor.visit_case(n),
        NodeRef::CaseBranch(n) => visitor.visit_case_branch(n),
        NodeRef::For(n) => visitor.visit_for(n),
        NodeRef::While(n) => visitor.visit_while(n),
        NodeRef::Repeat(n) => visitor.visit_repeat(n),
        NodeRef::With(n) => visitor.visit_with(n),
        NodeRef::Assignment(n) => visitor.visit_assignment(n),
        NodeRef::ExpressionStmt(n) => visitor.visit_expression_statement(n),
        NodeRef::Exit(n) => visitor.visit_exit(n),
        NodeRef::AssertError(n) => visitor.visit_assert_error(n),
        NodeRef::Literal(n) => visitor.visit_literal(n),
        NodeRef::Identifier(n) => visitor.visit_identifier(n),
        NodeRef::Binary(n) => visitor.visit_binary(n),
        NodeRef::Unary(n) => visitor.visit_unary(n),
        NodeRef::Member(n) => visitor.visit_member(n),
        NodeRef::Call(n) => visitor.visit_call(n),
        NodeRef::Index(n) => visitor.visit_index(n),
        NodeRef::Set(n) => visitor.visit_set(n),
        NodeRef::Range(n) => visitor.visit_range(n),
    }
}

/// Invokes `f` for each child of `node` in source order.
pub fn for_each_child<'a>(node: NodeRef<'a>, f: &mut dyn FnMut(NodeRef<'a>)) {
    match node {
        NodeRef::Document(n) => {
            for object in &n.objects {
                f(NodeRef::Object(object));
            }
        }
        NodeRef::Object(n) => {
            if let Some(s) = &n.object_properties {
                f(NodeRef::PropertySection(s));
            }
            if let Some(s) = &n.properties {
                f(NodeRef::PropertySection(s));
            }
            if let Some(s) = &n.fields {
                f(NodeRef::FieldSection(s));
            }
            if let Some(s) = &n.keys {
                f(NodeRef::KeySection(s));
            }
            if let Some(s) = &n.field_groups {
                f(NodeRef::FieldGroupSection(s));
            }
            if let Some(s) = &n.controls {
                f(NodeRef::ControlsSection(s));
            }
            if let Some(s) = &n.actions {
                f(NodeRef::ActionsSection(s));
            }
            if let Some(s) = &n.elements {
                f(NodeRef::ElementsSection(s));
            }
            if let Some(s) = &n.dataset {
                f(NodeRef::DatasetSection(s));
            }
            if let Some(s) = &n.request_page {
                f(NodeRef::ControlsSection(s));
            }
            if let Some(s) = &n.code {
                f(NodeRef::CodeSection(s));
            }
        }
        NodeRef::PropertySection(n) => {
            for property in &n.properties {
                f(NodeRef::Property(property));
            }
        }
        NodeRef::Property(n) => {
            if let Some(trigger) = &n.trigger {
                f(NodeRef::Trigger(trigger));
            }
        }
        NodeRef::FieldSection(n) => {
            for field in &n.fields {
                f(NodeRef::Field(field));
            }
        }
        NodeRef::Field(n) => {
            for property in &n.properties {
                f(NodeRef::Property(property));
            }
        }
        NodeRef::KeySection(n) => {
            for key in &n.keys {
                f(NodeRef::Key(key));
            }
        }
        NodeRef::Key(n) => {
            for property in &n.properties {
                f(NodeRef::Property(property));
            }
        }
        NodeRef::FieldGroupSection(n) => {
            for group in &n.groups {
                f(NodeRef::FieldGroup(group));
            }
        }
        NodeRef::FieldGroup(_) => {}
        NodeRef::ControlsSection(n) => {
            for control in &n.controls {
                f(NodeRef::Control(control));
            }
        }
        NodeRef::Control(n) => {
            for property in &n.properties {
                f(NodeRef::Property(property));
            }
            for child in &n.children {
                f(NodeRef::Control(child));
            }
        }
        NodeRef::ActionsSection(n) => {
            for action in &n.actions {
                f(NodeRef::Action(action));
            }
        }
        NodeRef::Action(n) => {
            for property in &n.properties {
                f(NodeRef::Property(property));
            }
            for child in &n.children {
                f(NodeRef::Action(child));
            }
        }
        NodeRef::ElementsSection(n) => {
            for element in &n.elements {
                f(NodeRef::XmlPortElement(element));
            }
        }
        NodeRef::XmlPortElement(n) => {
            for property in &n.properties {
                f(NodeRef::Property(property));
            }
            for child in &n.children {
                f(NodeRef::XmlPortElement(child));
            }
        }
        NodeRef::DatasetSection(n) => {
            for item in &n.items {
                f(NodeRef::DataItem(item));
            }
        }
        NodeRef::DataItem(n) => {
            for property in &n.properties {
                f(NodeRef::Property(property));
            }
            for child in &n.children {
                f(NodeRef::DataItem(child));
            }
        }
        NodeRef::CodeSection(n) => {
            for variable in &n.variables {
                f(NodeRef::Variable(variable));
            }
            for procedure in &n.procedures {
                f(NodeRef::Procedure(procedure));
            }
            for trigger in &n.triggers {
                f(NodeRef::Trigger(trigger));
            }
            for event in &n.events {
                f(NodeRef::Event(event));
            }
            if let Some(doc) = &n.documentation {
                f(NodeRef::Block(doc));
            }
        }
        NodeRef::Variable(_) | NodeRef::Parameter(_) => {}
        NodeRef::Procedure(n) => {
            for parameter in &n.parameters {
                f(NodeRef::Parameter(parameter));
            }
            for variable in &n.variables {
                f(NodeRef::Variable(variable));
            }
            if let Some(body) = &n.body {
                f(NodeRef::Block(body));
            }
        }
        NodeRef::Trigger(n) => {
            for variable in &n.variables {
                f(NodeRef::Variable(variable));
            }
            if let Some(body) = &n.body {
                f(NodeRef::Block(body));
            }
        }
        NodeRef::Event(n) => {
            for parameter in &n.parameters {
                f(NodeRef::Parameter(parameter));
            }
            for variable in &n.variables {
                f(NodeRef::Variable(variable));
            }
            if let Some(body) = &n.body {
                f(NodeRef::Block(body));
            }
        }
        NodeRef::Block(n) => {
            for statement in &n.statements {
                f(statement_ref(statement));
            }
        }
        NodeRef::If(n) => {
            f(expression_ref(&n.condition));
            if let Some(then_branch) = &n.then_branch {
                f(statement_ref(then_branch));
            }
            if let Some(else_branch) = &n.else_branch {
                f(statement_ref(else_branch));
            }
        }
        NodeRef::Case(n) => {
            f(expression_ref(&n.expression));
            for branch in &n.branches {
                f(NodeRef::CaseBranch(branch));
            }
            if let Some(else_branch) = &n.else_branch {
                for statement in else_branch {
                    f(statement_ref(statement));
                }
            }
        }
        NodeRef::CaseBranch(n) => {
            for value in &n.values {
                f(expression_ref(value));
            }
            if let Some(body) = &n.body {
                f(statement_ref(body));
            }
        }
        NodeRef::For(n) => {
            f(expression_ref(&n.variable));
            f(expression_ref(&n.from));
            f(expression_ref(&n.to));
            if let Some(body) = &n.body {
                f(statement_ref(body));
            }
        }
        NodeRef::While(n) => {
            f(expression_ref(&n.condition));
            if let Some(body) = &n.body {
                f(statement_ref(body));
            }
        }
        NodeRef::Repeat(n) => {
            for statement in &n.body {
                f(statement_ref(statement));
            }
            if let Some(condition) = &n.condition {
                f(expression_ref(condition));
            }
        }
        NodeRef::With(n) => {
            f(expression_ref(&n.record));
            if let Some(body) = &n.body {
                f(statement_ref(body));
            }
        }
        NodeRef::Assignment(n) => {
            f(expression_ref(&n.target));
            f(expression_ref(&n.value));
        }
        NodeRef::ExpressionStmt(n) => {
            f(expression_ref(&n.expression));
        }
        NodeRef::Exit(n) => {
            if let Some(value) = &n.value {
                f(expression_ref(value));
            }
        }
        NodeRef::AssertError(n) => {
            if let Some(body) = &n.body {
                f(statement_ref(body));
            }
        }
        NodeRef::Literal(_) | NodeRef::Identifier(_) => {}
        NodeRef::Binary(n) => {
            f(expression_ref(&n.left));
            f(expression_ref(&n.right));
        }
        NodeRef::Unary(n) => {
            f(expression_ref(&n.operand));
        }
        NodeRef::Member(n) => {
            f(expression_ref(&n.object));
            f(NodeRef::Identifier(&n.member));
        }
        NodeRef::Call(n) => {
            f(expression_ref(&n.callee));
            for argument in &n.arguments {
                f(expression_ref(argument));
            }
        }
        NodeRef::Index(n) => {
            f(expression_ref(&n.target));
            for index in &n.indices {
                f(expression_ref(index));
            }
        }
        NodeRef::Set(n) => {
            for element in &n.elements {
                f(expression_ref(element));
            }
        }
        NodeRef::Range(n) => {
            f(expression_ref(&n.low));
            if let Some(high) = &n.high {
                f(expression_ref(high));
            }
        }
    }
}

/// Stateless recursive walk: `visit_node`, then the variant hook, then the
/// children unless either returned `false`.
pub fn walk<V: Visitor + ?Sized>(visitor: &mut V, node: NodeRef<'_>) {
    let descend_generic = visitor.visit_node(node);
    let descend_specific = visit_specific(visitor, node);
    if descend_generic && descend_specific {
        for_each_child(node, &mut |child| walk(visitor, child));
    }
}
