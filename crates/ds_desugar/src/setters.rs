//! `obj.set_autocommit(value)` → `obj.autocommit = value`.
//!
//! Only statement-level calls with a single positional argument are
//! rewritten; the sync API exposes these setters as properties.

use std::collections::HashMap;

use ds_ast::{Expr, ExprKind, Stmt, StmtKind, VisitMut, VisitMutWith};

pub struct FixAsyncSetters<'a> {
    setters: &'a HashMap<String, String>,
}

impl<'a> FixAsyncSetters<'a> {
    pub fn new(setters: &'a HashMap<String, String>) -> Self {
        Self { setters }
    }

    /// The assignment replacing `call`, if it is a setter call.
    fn fix_setter(&self, call: &mut Expr) -> Option<StmtKind> {
        let ExprKind::Call {
            func,
            args,
            keywords,
        } = &mut call.kind
        else {
            return None;
        };
        let ExprKind::Attribute { value, attr } = &mut func.kind else {
            return None;
        };
        let property = self.setters.get(attr.as_str())?;
        if !keywords.is_empty() || args.len() != 1 || matches!(args[0].kind, ExprKind::Starred(_)) {
            return None;
        }

        tracing::trace!(setter = %attr, line = call.span.line, "setter to assignment");
        let target = Expr::new(
            ExprKind::Attribute {
                value: Box::new(value.take()),
                attr: property.clone(),
            },
            func.span,
        );
        Some(StmtKind::Assign {
            targets: vec![target],
            value: args[0].take(),
        })
    }
}

impl VisitMut for FixAsyncSetters<'_> {
    fn visit_mut_stmt(&mut self, node: &mut Stmt) {
        if let StmtKind::Expr(call) = &mut node.kind {
            if let Some(assign) = self.fix_setter(call) {
                node.kind = assign;
                return;
            }
        }
        node.visit_mut_children_with(self);
    }
}
