//! Folding-range extraction.
//!
//! Two collectors: an AST walk over multi-line constructs (sections fold as
//! regions, code constructs untagged), and a raw-text scan for block
//! comments, which never become AST nodes. AST ranges exclude the terminator
//! line so END/UNTIL/`}` stay visible when folded. Lines are 0-based at this
//! boundary.


use serde::Serialize;

use cal_syntax::ast::visit::{NodeRef, Visitor, walk};
use cal_syntax::ast::CalDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FoldingRangeKind {
    Region,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FoldingRange {
    pub start_line: u32,
    pub end_line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FoldingRangeKind>,
}

/// Collects folding ranges from the AST and from a raw comment scan of the
/// same source. The two sets cannot overlap: comments are not AST nodes.
pub fn folding_ranges(document: &CalDocument, source: &str) -> Vec<FoldingRange> {
    let mut collector = AstCollector { ranges: Vec::new() };
    walk(&mut collector, NodeRef::Document(document));
    let mut ranges = collector.ranges;
    ranges.extend(comment_ranges(source));
    ranges
}

struct AstCollector {
    ranges: Vec<FoldingRange>,
}

impl AstCollector {
    /// Folds a node spanning three or more lines: the fold runs from the
    /// first line to the line above the terminator.
    fn push(&mut self, node: NodeRef<'_>, kind: Option<FoldingRangeKind>) {
        let span = node.span();
        let start = span.start_line();
        let end = span.end_line();
        if end < start + 2 {
            return;
        }
        self.ranges.push(FoldingRange {
            start_line: start - 1,
            end_line: end - 2,
            kind,
        });
    }
}

impl Visitor for AstCollector {
    fn visit_node(&mut self, node: NodeRef<'_>) -> bool {
        match node {
            NodeRef::PropertySection(_)
            | NodeRef::FieldSection(_)
            | NodeRef::KeySection(_)
            | NodeRef::FieldGroupSection(_)
            | NodeRef::CodeSection(_)
            | NodeRef::ControlsSection(_)
            | NodeRef::ActionsSection(_)
            | NodeRef::ElementsSection(_)
            | NodeRef::DatasetSection(_) => self.push(node, Some(FoldingRangeKind::Region)),
            NodeRef::Procedure(_)
            | NodeRef::Trigger(_)
            | NodeRef::Event(_)
            | NodeRef::Block(_)
            | NodeRef::If(_)
            | NodeRef::Case(_)
            | NodeRef::While(_)
            | NodeRef::Repeat(_)
            | NodeRef::For(_)
            | NodeRef::With(_) => self.push(node, None),
            _ => {}
        }
        true
    }
}

/// Raw-text scan for `/* … */` and code-context `{ … }` comments spanning
/// three or more lines. Strings and quoted identifiers are skipped honoring
/// the `''`/`""` escapes; `//` comments hide any opener to end of line; a
/// `{` only opens a comment inside BEGIN…END, tracked by word scanning.
fn comment_ranges(source: &str) -> Vec<FoldingRange> {
    let bytes = source.as_bytes();
    let mut ranges = Vec::new();
    let mut line = 0u32;
    let mut begin_depth = 0u32;
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                line += 1;
            }
            b'\n' => {
                i += 1;
                line += 1;
            }
            b'\'' | b'"' => {
                let quote = bytes[i];
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == quote {
                        if bytes.get(i + 1) == Some(&quote) {
                            i += 2;
                            continue;
                        }
                        i += 1;
                        break;
                    }
                    if bytes[i] == b'\n' || bytes[i] == b'\r' {
                        i += if bytes[i] == b'\r' && bytes.get(i + 1) == Some(&b'\n') {
                            2
                        } else {
                            1
                        };
                        line += 1;
                        continue;
                    }
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' && bytes[i] != b'\r' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let start_line = line;
                i += 2;
                while i < bytes.len() {
                    if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
                        i += 2;
                        break;
                    }
                    if bytes[i] == b'\n' || bytes[i] == b'\r' {
                        i += if bytes[i] == b'\r' && bytes.get(i + 1) == Some(&b'\n') {
                            2
                        } else {
                            1
                        };
                        line += 1;
                        continue;
                    }
                    i += 1;
                }
                if line >= start_line + 2 {
                    ranges.push(FoldingRange {
                        start_line,
                        end_line: line,
                        kind: Some(FoldingRangeKind::Comment),
                    });
                }
            }
            b'{' if begin_depth > 0 => {
                let start_line = line;
                i += 1;
                while i < bytes.len() && bytes[i] != b'}' {
                    if bytes[i] == b'\n' || bytes[i] == b'\r' {
                        i += if bytes[i] == b'\r' && bytes.get(i + 1) == Some(&b'\n') {
                            2
                        } else {
                            1
                        };
                        line += 1;
                        continue;
                    }
                    i += 1;
                }
                if i < bytes.len() {
                    i += 1;
                }
                if line >= start_line + 2 {
                    ranges.push(FoldingRange {
                        start_line,
                        end_line: line,
                        kind: Some(FoldingRangeKind::Comment),
                    });
                }
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                let word = &source[start..i];
                if word.eq_ignore_ascii_case("BEGIN") {
                    begin_depth += 1;
                } else if word.eq_ignore_ascii_case("END") {
                    begin_depth = begin_depth.saturating_sub(1);
                }
            }
            _ => i += 1,
        }
    }

    ranges
}
