use super::visit::{NodeRef, Visitor, walk};
use crate::lexer::tokenize;
use crate::parser::parse;

fn parse_document(source: &str) -> super::CalDocument {
    let (tokens, _) = tokenize(source);
    let (document, errors) = parse(tokens);
    assert!(errors.is_empty(), "{errors:#?}");
    document
}

fn node_label(node: NodeRef<'_>) -> &'static str {
    match node {
        NodeRef::Document(_) => "document",
        NodeRef::Object(_) => "object",
        NodeRef::PropertySection(_) => "property-section",
        NodeRef::Property(_) => "property",
        NodeRef::FieldSection(_) => "field-section",
        NodeRef::Field(_) => "field",
        NodeRef::CodeSection(_) => "code-section",
        NodeRef::Procedure(_) => "procedure",
        NodeRef::Trigger(_) => "trigger",
        NodeRef::Variable(_) => "variable",
        NodeRef::Parameter(_) => "parameter",
        NodeRef::Block(_) => "block",
        NodeRef::If(_) => "if",
        NodeRef::Case(_) => "case",
        NodeRef::CaseBranch(_) => "case-branch",
        NodeRef::Assignment(_) => "assignment",
        NodeRef::Identifier(_) => "identifier",
        NodeRef::Literal(_) => "literal",
        _ => "other",
    }
}

struct Recorder {
    labels: Vec<&'static str>,
    skip: Option<&'static str>,
}

impl Visitor for Recorder {
    fn visit_node(&mut self, node: NodeRef<'_>) -> bool {
        let label = node_label(node);
        self.labels.push(label);
        Some(label) != self.skip
    }
}

const SOURCE: &str = "OBJECT Codeunit 1 T { CODE { PROCEDURE P@1(Arg@1 : Integer); VAR Total@2 : Integer; BEGIN IF Arg > 1 THEN Total := Arg; END; BEGIN END. } }";

#[test]
fn walk_visits_children_in_source_order() {
    let document = parse_document(SOURCE);
    let mut recorder = Recorder {
        labels: Vec::new(),
        skip: None,
    };
    walk(&mut recorder, NodeRef::Document(&document));

    assert_eq!(
        recorder.labels,
        [
            "document",
            "object",
            "code-section",
            "procedure",
            "parameter",
            "variable",
            "block",
            "if",
            "other",      // the comparison expression
            "identifier", // Arg
            "literal",    // 1
            "assignment",
            "identifier", // Total
            "identifier", // Arg
            "block", // documentation trigger
        ]
    );
}

#[test]
fn visit_node_false_prevents_descent() {
    let document = parse_document(SOURCE);
    let mut recorder = Recorder {
        labels: Vec::new(),
        skip: Some("procedure"),
    };
    walk(&mut recorder, NodeRef::Document(&document));

    assert!(recorder.labels.contains(&"procedure"));
    assert!(
        !recorder.labels.contains(&"parameter"),
        "children of a skipped node must not be visited: {:?}",
        recorder.labels
    );
    assert!(!recorder.labels.contains(&"if"));
    // Siblings of the skipped subtree still get visited.
    assert!(recorder.labels.iter().filter(|l| **l == "block").count() >= 1);
}

struct HookSkipper {
    visited_ifs: usize,
    visited_assignments: usize,
}

impl Visitor for HookSkipper {
    fn visit_if(&mut self, _node: &super::IfStatement) -> bool {
        self.visited_ifs += 1;
        false
    }

    fn visit_assignment(&mut self, _node: &super::AssignmentStatement) -> bool {
        self.visited_assignments += 1;
        true
    }
}

#[test]
fn variant_hook_false_prevents_descent() {
    let document = parse_document(SOURCE);
    let mut visitor = HookSkipper {
        visited_ifs: 0,
        visited_assignments: 0,
    };
    walk(&mut visitor, NodeRef::Document(&document));

    assert_eq!(visitor.visited_ifs, 1);
    assert_eq!(
        visitor.visited_assignments, 0,
        "the assignment lives under the skipped IF"
    );
}

#[test]
fn spans_are_reachable_through_node_refs() {
    let document = parse_document(SOURCE);
    struct SpanCheck;
    impl Visitor for SpanCheck {
        fn visit_node(&mut self, node: NodeRef<'_>) -> bool {
            let span = node.span();
            assert!(span.start.position.start <= span.end.position.end);
            true
        }
    }
    walk(&mut SpanCheck, NodeRef::Document(&document));
}
