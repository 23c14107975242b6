//! Depth-limited traversal.
//!
//! One shared logical counter covers every hierarchical node kind, so an
//! Action containing triggers containing IF statements accumulates a single
//! combined depth. A fixed physical limit clamps the traversal independently
//! of the configured logical limit and guarantees termination on adversarial
//! input without exhausting the call stack.

use super::visit::{NodeRef, Visitor, for_each_child, visit_specific};
use crate::diagnostics::{Diagnostic, DiagnosticKind};

/// Absolute recursion clamp; not configurable.
pub const PHYSICAL_STACK_LIMIT: u32 = 1000;

/// Default logical nesting limit.
pub const DEFAULT_MAX_DEPTH: u32 = 100;

fn is_hierarchical(node: NodeRef<'_>) -> bool {
    matches!(
        node,
        NodeRef::Action(_)
            | NodeRef::Control(_)
            | NodeRef::XmlPortElement(_)
            | NodeRef::If(_)
            | NodeRef::While(_)
            | NodeRef::For(_)
            | NodeRef::Repeat(_)
            | NodeRef::Case(_)
            | NodeRef::With(_)
    )
}

/// Walker with a logical nesting-depth limit and a physical recursion clamp.
///
/// Diagnostics accumulate in the instance; call [`reset_diagnostics`] between
/// walks to reuse it.
///
/// [`reset_diagnostics`]: DepthLimitedWalker::reset_diagnostics
pub struct DepthLimitedWalker {
    max_depth: u32,
    current_depth: u32,
    physical_depth: u32,
    physical_reported: bool,
    diagnostics: Vec<Diagnostic>,
}

impl Default for DepthLimitedWalker {
    fn default() -> Self {
        Self::new()
    }
}

impl DepthLimitedWalker {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(max_depth: u32) -> Self {
        Self {
            max_depth,
            current_depth: 0,
            physical_depth: 0,
            physical_reported: false,
            diagnostics: Vec::new(),
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Clears diagnostics and both depth counters for the next walk.
    pub fn reset_diagnostics(&mut self) {
        self.diagnostics.clear();
        self.current_depth = 0;
        self.physical_depth = 0;
        self.physical_reported = false;
    }

    /// Traverses `root`, invoking `visitor` like the plain walker does, and
    /// returns the diagnostics collected during this walk.
    pub fn walk<V: Visitor + ?Sized>(
        &mut self,
        root: NodeRef<'_>,
        visitor: &mut V,
    ) -> &[Diagnostic] {
        self.walk_node(root, visitor, false);
        &self.diagnostics
    }

    fn walk_node<V: Visitor + ?Sized>(
        &mut self,
        node: NodeRef<'_>,
        visitor: &mut V,
        ancestor_violated: bool,
    ) {
        if self.physical_depth >= PHYSICAL_STACK_LIMIT {
            // One diagnostic per walk; the branch is pruned, siblings continue.
            if !self.physical_reported {
                self.physical_reported = true;
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::NestingDepthExceeded,
                    node.span().start_position(),
                    format!(
                        "physical nesting depth {} exceeds traversal limit {}",
                        self.physical_depth + 1,
                        PHYSICAL_STACK_LIMIT
                    ),
                ));
            }
            return;
        }
        self.physical_depth += 1;

        let hierarchical = is_hierarchical(node);
        let mut violated_here = false;
        if hierarchical {
            self.current_depth += 1;
            if self.current_depth > self.max_depth && !ancestor_violated {
                violated_here = true;
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::NestingDepthExceeded,
                    node.span().start_position(),
                    format!(
                        "nesting depth {} exceeds the configured limit of {}",
                        self.current_depth, self.max_depth
                    ),
                ));
            }
        }

        let descend_generic = visitor.visit_node(node);
        let descend_specific = visit_specific(visitor, node);
        if descend_generic && descend_specific {
            let violated = ancestor_violated || violated_here;
            // Children collected first: for_each_child takes a closure and the
            // recursion needs &mut self.
            let mut children = Vec::new();
            for_each_child(node, &mut |child| children.push(child));
            for child in children {
                self.walk_node(child, visitor, violated);
            }
        }

        if hierarchical {
            self.current_depth -= 1;
        }
        self.physical_depth -= 1;
    }
}

/// Convenience entry matching the consumer API: walk with a fresh
/// depth-limited walker and return its diagnostics.
pub fn walk_depth_limited<V: Visitor + ?Sized>(
    root: NodeRef<'_>,
    visitor: &mut V,
    max_depth: Option<u32>,
) -> Vec<Diagnostic> {
    let mut walker = match max_depth {
        Some(limit) => DepthLimitedWalker::with_max_depth(limit),
        None => DepthLimitedWalker::new(),
    };
    walker.walk(root, visitor);
    walker.diagnostics().to_vec()
}
