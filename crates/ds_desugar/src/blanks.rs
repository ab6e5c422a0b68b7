//! Blank-line markers.
//!
//! The tree keeps no whitespace, so before any pass rebuilds nodes each
//! block gets a `Blank` marker wherever the source left at least one empty
//! line between two statements.

use ds_ast::{Stmt, VisitMut, VisitMutWith};

pub struct BlanksInserter;

impl VisitMut for BlanksInserter {
    fn visit_mut_stmts(&mut self, node: &mut Vec<Stmt>) {
        node.visit_mut_children_with(self);

        if node.len() < 2 {
            return;
        }
        let body = std::mem::take(node);
        let mut before_end = None;
        for stmt in body {
            if let Some(end_line) = before_end {
                if stmt.span.line > end_line + 1 {
                    tracing::trace!(line = end_line + 1, "blank marker");
                    node.push(Stmt::blank(end_line + 1));
                }
            }
            before_end = Some(stmt.span.end_line);
            node.push(stmt);
        }
    }
}
