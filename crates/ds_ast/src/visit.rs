//! Mutable visitor over the syntax tree.
//!
//! Passes implement [`VisitMut`] and override the hooks they care about.
//! Inside an override, `node.visit_mut_children_with(self)` continues the
//! default recursion; leaving it out prunes the walk at that node.

use crate::*;

pub trait VisitMut {
    fn visit_mut_module(&mut self, node: &mut Module) {
        node.visit_mut_children_with(self)
    }

    /// A block: module body, function body, loop body, branch, ...
    fn visit_mut_stmts(&mut self, node: &mut Vec<Stmt>) {
        node.visit_mut_children_with(self)
    }

    fn visit_mut_stmt(&mut self, node: &mut Stmt) {
        node.visit_mut_children_with(self)
    }

    fn visit_mut_expr(&mut self, node: &mut Expr) {
        node.visit_mut_children_with(self)
    }

    fn visit_mut_parameters(&mut self, node: &mut Parameters) {
        node.visit_mut_children_with(self)
    }

    fn visit_mut_param(&mut self, node: &mut Param) {
        node.visit_mut_children_with(self)
    }

    fn visit_mut_keyword(&mut self, node: &mut Keyword) {
        node.visit_mut_children_with(self)
    }

    fn visit_mut_comprehension(&mut self, node: &mut Comprehension) {
        node.visit_mut_children_with(self)
    }
}

pub trait VisitMutWith<V: ?Sized + VisitMut> {
    /// Dispatch to the visitor hook for this node.
    fn visit_mut_with(&mut self, visitor: &mut V);

    /// Visit every child node, without calling the hook for `self`.
    fn visit_mut_children_with(&mut self, visitor: &mut V);
}

impl<V: ?Sized + VisitMut> VisitMutWith<V> for Module {
    fn visit_mut_with(&mut self, visitor: &mut V) {
        visitor.visit_mut_module(self)
    }

    fn visit_mut_children_with(&mut self, visitor: &mut V) {
        visitor.visit_mut_stmts(&mut self.body)
    }
}

impl<V: ?Sized + VisitMut> VisitMutWith<V> for Vec<Stmt> {
    fn visit_mut_with(&mut self, visitor: &mut V) {
        visitor.visit_mut_stmts(self)
    }

    fn visit_mut_children_with(&mut self, visitor: &mut V) {
        for stmt in self.iter_mut() {
            visitor.visit_mut_stmt(stmt);
        }
    }
}

impl<V: ?Sized + VisitMut> VisitMutWith<V> for Stmt {
    fn visit_mut_with(&mut self, visitor: &mut V) {
        visitor.visit_mut_stmt(self)
    }

    fn visit_mut_children_with(&mut self, visitor: &mut V) {
        match &mut self.kind {
            StmtKind::FunctionDef(func) | StmtKind::AsyncFunctionDef(func) => {
                for decorator in &mut func.decorators {
                    visitor.visit_mut_expr(decorator);
                }
                visitor.visit_mut_parameters(&mut func.params);
                if let Some(returns) = &mut func.returns {
                    visitor.visit_mut_expr(returns);
                }
                visitor.visit_mut_stmts(&mut func.body);
            }
            StmtKind::ClassDef(class) => {
                for decorator in &mut class.decorators {
                    visitor.visit_mut_expr(decorator);
                }
                for base in &mut class.bases {
                    visitor.visit_mut_expr(base);
                }
                for keyword in &mut class.keywords {
                    visitor.visit_mut_keyword(keyword);
                }
                visitor.visit_mut_stmts(&mut class.body);
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    visitor.visit_mut_expr(value);
                }
            }
            StmtKind::Delete(targets) => {
                for target in targets {
                    visitor.visit_mut_expr(target);
                }
            }
            StmtKind::Assign { targets, value } => {
                for target in targets {
                    visitor.visit_mut_expr(target);
                }
                visitor.visit_mut_expr(value);
            }
            StmtKind::AugAssign { target, value, .. } => {
                visitor.visit_mut_expr(target);
                visitor.visit_mut_expr(value);
            }
            StmtKind::AnnAssign {
                target,
                annotation,
                value,
                ..
            } => {
                visitor.visit_mut_expr(target);
                visitor.visit_mut_expr(annotation);
                if let Some(value) = value {
                    visitor.visit_mut_expr(value);
                }
            }
            StmtKind::For(for_) | StmtKind::AsyncFor(for_) => {
                visitor.visit_mut_expr(&mut for_.target);
                visitor.visit_mut_expr(&mut for_.iter);
                visitor.visit_mut_stmts(&mut for_.body);
                visitor.visit_mut_stmts(&mut for_.orelse);
            }
            StmtKind::While { test, body, orelse } | StmtKind::If { test, body, orelse } => {
                visitor.visit_mut_expr(test);
                visitor.visit_mut_stmts(body);
                visitor.visit_mut_stmts(orelse);
            }
            StmtKind::With(with) | StmtKind::AsyncWith(with) => {
                for item in &mut with.items {
                    visitor.visit_mut_expr(&mut item.context_expr);
                    if let Some(vars) = &mut item.optional_vars {
                        visitor.visit_mut_expr(vars);
                    }
                }
                visitor.visit_mut_stmts(&mut with.body);
            }
            StmtKind::Raise { exc, cause } => {
                if let Some(exc) = exc {
                    visitor.visit_mut_expr(exc);
                }
                if let Some(cause) = cause {
                    visitor.visit_mut_expr(cause);
                }
            }
            StmtKind::Try(try_) => {
                visitor.visit_mut_stmts(&mut try_.body);
                for handler in &mut try_.handlers {
                    if let Some(exc_type) = &mut handler.exc_type {
                        visitor.visit_mut_expr(exc_type);
                    }
                    visitor.visit_mut_stmts(&mut handler.body);
                }
                visitor.visit_mut_stmts(&mut try_.orelse);
                visitor.visit_mut_stmts(&mut try_.finalbody);
            }
            StmtKind::Assert { test, msg } => {
                visitor.visit_mut_expr(test);
                if let Some(msg) = msg {
                    visitor.visit_mut_expr(msg);
                }
            }
            StmtKind::Expr(value) => visitor.visit_mut_expr(value),
            StmtKind::Import(_)
            | StmtKind::ImportFrom(_)
            | StmtKind::Global(_)
            | StmtKind::Nonlocal(_)
            | StmtKind::Pass
            | StmtKind::Break
            | StmtKind::Continue
            | StmtKind::Comment { .. }
            | StmtKind::Blank => {}
        }
    }
}

impl<V: ?Sized + VisitMut> VisitMutWith<V> for Expr {
    fn visit_mut_with(&mut self, visitor: &mut V) {
        visitor.visit_mut_expr(self)
    }

    fn visit_mut_children_with(&mut self, visitor: &mut V) {
        match &mut self.kind {
            ExprKind::BoolOp { values, .. } => {
                for value in values {
                    visitor.visit_mut_expr(value);
                }
            }
            ExprKind::NamedExpr { target, value } => {
                visitor.visit_mut_expr(target);
                visitor.visit_mut_expr(value);
            }
            ExprKind::BinOp { left, right, .. } => {
                visitor.visit_mut_expr(left);
                visitor.visit_mut_expr(right);
            }
            ExprKind::UnaryOp { operand, .. } => visitor.visit_mut_expr(operand),
            ExprKind::Lambda { params, body } => {
                visitor.visit_mut_parameters(params);
                visitor.visit_mut_expr(body);
            }
            ExprKind::IfExp { test, body, orelse } => {
                visitor.visit_mut_expr(test);
                visitor.visit_mut_expr(body);
                visitor.visit_mut_expr(orelse);
            }
            ExprKind::Dict(items) => {
                for item in items {
                    if let Some(key) = &mut item.key {
                        visitor.visit_mut_expr(key);
                    }
                    visitor.visit_mut_expr(&mut item.value);
                }
            }
            ExprKind::Set(elts) | ExprKind::List(elts) | ExprKind::Tuple { elts, .. } => {
                for elt in elts {
                    visitor.visit_mut_expr(elt);
                }
            }
            ExprKind::ListComp { elt, generators }
            | ExprKind::SetComp { elt, generators }
            | ExprKind::GeneratorExp { elt, generators } => {
                // Comprehension scoping: the clauses run before the element.
                for generator in generators.iter_mut() {
                    visitor.visit_mut_comprehension(generator);
                }
                visitor.visit_mut_expr(elt);
            }
            ExprKind::DictComp {
                key,
                value,
                generators,
            } => {
                for generator in generators.iter_mut() {
                    visitor.visit_mut_comprehension(generator);
                }
                visitor.visit_mut_expr(key);
                visitor.visit_mut_expr(value);
            }
            ExprKind::Await(value) | ExprKind::YieldFrom(value) | ExprKind::Starred(value) => {
                visitor.visit_mut_expr(value)
            }
            ExprKind::Yield(value) => {
                if let Some(value) = value {
                    visitor.visit_mut_expr(value);
                }
            }
            ExprKind::Compare {
                left, comparators, ..
            } => {
                visitor.visit_mut_expr(left);
                for comparator in comparators {
                    visitor.visit_mut_expr(comparator);
                }
            }
            ExprKind::Call {
                func,
                args,
                keywords,
            } => {
                visitor.visit_mut_expr(func);
                for arg in args {
                    visitor.visit_mut_expr(arg);
                }
                for keyword in keywords {
                    visitor.visit_mut_keyword(keyword);
                }
            }
            ExprKind::Attribute { value, .. } => visitor.visit_mut_expr(value),
            ExprKind::Subscript { value, slice } => {
                visitor.visit_mut_expr(value);
                visitor.visit_mut_expr(slice);
            }
            ExprKind::Slice { lower, upper, step } => {
                for part in [lower, upper, step].into_iter().flatten() {
                    visitor.visit_mut_expr(part);
                }
            }
            ExprKind::Constant(_) | ExprKind::Str(_) | ExprKind::Name(_) => {}
        }
    }
}

impl<V: ?Sized + VisitMut> VisitMutWith<V> for Parameters {
    fn visit_mut_with(&mut self, visitor: &mut V) {
        visitor.visit_mut_parameters(self)
    }

    fn visit_mut_children_with(&mut self, visitor: &mut V) {
        for param in self.posonly.iter_mut().chain(self.args.iter_mut()) {
            visitor.visit_mut_param(param);
        }
        if let Some(vararg) = &mut self.vararg {
            visitor.visit_mut_param(vararg);
        }
        for param in &mut self.kwonly {
            visitor.visit_mut_param(param);
        }
        if let Some(kwarg) = &mut self.kwarg {
            visitor.visit_mut_param(kwarg);
        }
    }
}

impl<V: ?Sized + VisitMut> VisitMutWith<V> for Param {
    fn visit_mut_with(&mut self, visitor: &mut V) {
        visitor.visit_mut_param(self)
    }

    fn visit_mut_children_with(&mut self, visitor: &mut V) {
        if let Some(annotation) = &mut self.annotation {
            visitor.visit_mut_expr(annotation);
        }
        if let Some(default) = &mut self.default {
            visitor.visit_mut_expr(default);
        }
    }
}

impl<V: ?Sized + VisitMut> VisitMutWith<V> for Keyword {
    fn visit_mut_with(&mut self, visitor: &mut V) {
        visitor.visit_mut_keyword(self)
    }

    fn visit_mut_children_with(&mut self, visitor: &mut V) {
        visitor.visit_mut_expr(&mut self.value)
    }
}

impl<V: ?Sized + VisitMut> VisitMutWith<V> for Comprehension {
    fn visit_mut_with(&mut self, visitor: &mut V) {
        visitor.visit_mut_comprehension(self)
    }

    fn visit_mut_children_with(&mut self, visitor: &mut V) {
        visitor.visit_mut_expr(&mut self.target);
        visitor.visit_mut_expr(&mut self.iter);
        for cond in &mut self.ifs {
            visitor.visit_mut_expr(cond);
        }
    }
}
