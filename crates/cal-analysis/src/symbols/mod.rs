//! Scoped, case-insensitive symbol table.
//!
//! Scopes mirror the source: the document scope contains object scopes, an
//! object scope contains its CODE scope, and the CODE scope contains one
//! scope per procedure, trigger and event. Names compare
//! ASCII-case-insensitively, but the stored symbol keeps the original casing
//! for display and quoted-identifier round-trips. Shadowed and ambiguous
//! declarations are all retained; no redefinition error is emitted here.


use indexmap::IndexMap;
use serde::Serialize;

use cal_syntax::ast::visit::{NodeRef, Visitor, walk};
use cal_syntax::ast::{
    CalDocument, CodeSection, EventDeclaration, ObjectDeclaration, ProcedureDeclaration,
    TokenSpan, TriggerDeclaration, VariableDeclaration,
};

pub type ScopeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SymbolKind {
    Object,
    Field,
    Procedure,
    Trigger,
    Event,
    Variable,
    Parameter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScopeKind {
    Document,
    Object,
    Code,
    Procedure,
    Trigger,
    Event,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Symbol {
    /// Original casing preserved.
    pub name: String,
    pub kind: SymbolKind,
    /// Declared type for variables/parameters, return type for procedures.
    pub type_name: Option<String>,
    pub scope: ScopeId,
    pub span: TokenSpan,
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    parent: Option<ScopeId>,
    /// Upper-cased name → indexes into the symbol arena, in insertion order.
    entries: IndexMap<String, Vec<usize>>,
}

#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    /// Builds the table by traversing a parsed document.
    pub fn build(document: &CalDocument) -> Self {
        let mut table = SymbolTable {
            scopes: vec![Scope {
                kind: ScopeKind::Document,
                parent: None,
                entries: IndexMap::new(),
            }],
            symbols: Vec::new(),
        };
        for object in &document.objects {
            table.collect_object(object);
        }
        table
    }

    pub fn root(&self) -> ScopeId {
        0
    }

    /// Case-insensitive lookup across the whole table, first declaration in
    /// document order wins.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols
            .iter()
            .find(|symbol| symbol.name.eq_ignore_ascii_case(name))
    }

    /// Scoped lookup: searches `scope`, then its parents.
    pub fn lookup_from(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let key = name.to_ascii_uppercase();
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id];
            if let Some(indexes) = scope.entries.get(&key) {
                if let Some(&first) = indexes.first() {
                    return Some(&self.symbols[first]);
                }
            }
            current = scope.parent;
        }
        None
    }

    /// Every symbol in document order.
    pub fn all(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn scope_kind(&self, scope: ScopeId) -> ScopeKind {
        self.scopes[scope].kind
    }

    /// All entries for a name inside one scope — shadowed or duplicated
    /// declarations stay resolvable.
    pub fn entries_in(&self, scope: ScopeId, name: &str) -> Vec<&Symbol> {
        let key = name.to_ascii_uppercase();
        self.scopes[scope]
            .entries
            .get(&key)
            .map(|indexes| indexes.iter().map(|&i| &self.symbols[i]).collect())
            .unwrap_or_default()
    }

    fn new_scope(&mut self, kind: ScopeKind, parent: ScopeId) -> ScopeId {
        self.scopes.push(Scope {
            kind,
            parent: Some(parent),
            entries: IndexMap::new(),
        });
        self.scopes.len() - 1
    }

    fn insert(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: SymbolKind,
        type_name: Option<String>,
        span: TokenSpan,
    ) {
        if name.is_empty() {
            return;
        }
        let index = self.symbols.len();
        self.symbols.push(Symbol {
            name: name.to_string(),
            kind,
            type_name,
            scope,
            span,
        });
        self.scopes[scope]
            .entries
            .entry(name.to_ascii_uppercase())
            .or_default()
            .push(index);
    }

    fn collect_object(&mut self, object: &ObjectDeclaration) {
        let object_scope = self.new_scope(ScopeKind::Object, self.root());
        if let Some(name) = &object.object_name {
            self.insert(
                self.root(),
                name,
                SymbolKind::Object,
                None,
                object.span.clone(),
            );
        }

        if let Some(fields) = &object.fields {
            for field in &fields.fields {
                if let Some(name) = &field.name {
                    self.insert(
                        object_scope,
                        name,
                        SymbolKind::Field,
                        field.field_type.clone(),
                        field.span.clone(),
                    );
                }
            }
        }

        // Property-level triggers (OnRun=BEGIN … END and friends) live in
        // sections all over the object; collect them with a visitor.
        let mut collector = PropertyTriggerCollector {
            table: self,
            scope: object_scope,
        };
        walk(&mut collector, NodeRef::Object(object));

        if let Some(code) = &object.code {
            self.collect_code(code, object_scope);
        }
    }

    fn collect_code(&mut self, code: &CodeSection, object_scope: ScopeId) {
        let code_scope = self.new_scope(ScopeKind::Code, object_scope);
        for variable in &code.variables {
            self.insert_variable(code_scope, variable);
        }
        for procedure in &code.procedures {
            self.collect_procedure(procedure, code_scope);
        }
        for trigger in &code.triggers {
            self.collect_trigger(trigger, code_scope);
        }
        for event in &code.events {
            self.collect_event(event, code_scope);
        }
    }

    fn collect_procedure(&mut self, procedure: &ProcedureDeclaration, code_scope: ScopeId) {
        self.insert(
            code_scope,
            &procedure.name,
            SymbolKind::Procedure,
            procedure.return_type.clone(),
            procedure.span.clone(),
        );
        let scope = self.new_scope(ScopeKind::Procedure, code_scope);
        for parameter in &procedure.parameters {
            self.insert(
                scope,
                &parameter.name,
                SymbolKind::Parameter,
                Some(parameter.param_type.clone()),
                parameter.span.clone(),
            );
        }
        if let Some(name) = &procedure.return_name {
            self.insert(
                scope,
                name,
                SymbolKind::Variable,
                procedure.return_type.clone(),
                procedure.span.clone(),
            );
        }
        for variable in &procedure.variables {
            self.insert_variable(scope, variable);
        }
    }

    fn collect_trigger(&mut self, trigger: &TriggerDeclaration, parent: ScopeId) {
        self.insert(
            parent,
            &trigger.name,
            SymbolKind::Trigger,
            None,
            trigger.span.clone(),
        );
        let scope = self.new_scope(ScopeKind::Trigger, parent);
        for variable in &trigger.variables {
            self.insert_variable(scope, variable);
        }
    }

    fn collect_event(&mut self, event: &EventDeclaration, code_scope: ScopeId) {
        self.insert(
            code_scope,
            &event.name,
            SymbolKind::Event,
            None,
            event.span.clone(),
        );
        let scope = self.new_scope(ScopeKind::Event, code_scope);
        for parameter in &event.parameters {
            self.insert(
                scope,
                &parameter.name,
                SymbolKind::Parameter,
                Some(parameter.param_type.clone()),
                parameter.span.clone(),
            );
        }
        for variable in &event.variables {
            self.insert_variable(scope, variable);
        }
    }

    fn insert_variable(&mut self, scope: ScopeId, variable: &VariableDeclaration) {
        self.insert(
            scope,
            &variable.name,
            SymbolKind::Variable,
            Some(variable.var_type.clone()),
            variable.span.clone(),
        );
    }
}

/// Finds trigger code hanging off properties (object, field, control and
/// action properties alike) and records each as a trigger scope.
struct PropertyTriggerCollector<'a> {
    table: &'a mut SymbolTable,
    scope: ScopeId,
}

impl Visitor for PropertyTriggerCollector<'_> {
    fn visit_trigger(&mut self, node: &TriggerDeclaration) -> bool {
        self.table.collect_trigger(node, self.scope);
        // collect_trigger already handled variables; don't descend.
        false
    }

    fn visit_code_section(&mut self, _node: &CodeSection) -> bool {
        // CODE is collected separately with its own scopes.
        false
    }
}
