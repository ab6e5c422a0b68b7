//! Statement layout.

use ds_ast::{Alias, ClassDef, Expr, ExprKind, For, FunctionDef, Module, Stmt, StmtKind, Try, With};

use crate::expr::Precedence;

const INDENT: &str = "    ";

#[derive(Default)]
pub(crate) struct Printer {
    pub(crate) out: String,
    indent: usize,
}

impl Printer {
    pub(crate) fn finish(self) -> String {
        self.out
    }

    pub(crate) fn module(&mut self, module: &Module) {
        self.stmts(&module.body, false);
    }

    /// Start a new line at the current indentation.
    fn fill(&mut self, text: &str) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
    }

    pub(crate) fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// Emit a block. Blank markers collapse and never open or close it;
    /// a nested block without code gets `pass`.
    fn stmts(&mut self, body: &[Stmt], needs_code: bool) {
        let mut pending_blank = false;
        let mut emitted = false;
        for stmt in body {
            if let StmtKind::Blank = stmt.kind {
                pending_blank = emitted;
                continue;
            }
            if pending_blank {
                self.out.push('\n');
                pending_blank = false;
            }
            self.stmt(stmt);
            emitted = true;
        }
        if needs_code && !body.iter().any(Stmt::is_code) {
            self.fill("pass");
        }
    }

    fn block(&mut self, body: &[Stmt]) {
        self.write(":");
        self.indent += 1;
        self.stmts(body, true);
        self.indent -= 1;
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::FunctionDef(func) => self.function_def(func, false),
            StmtKind::AsyncFunctionDef(func) => self.function_def(func, true),
            StmtKind::ClassDef(class) => self.class_def(class),
            StmtKind::Return(value) => {
                self.fill("return");
                if let Some(value) = value {
                    self.write(" ");
                    self.expr(value, Precedence::Tuple);
                }
            }
            StmtKind::Delete(targets) => {
                self.fill("del ");
                self.comma_separated(targets, Precedence::Test);
            }
            StmtKind::Assign { targets, value } => {
                self.fill("");
                for target in targets {
                    self.expr(target, Precedence::Tuple);
                    self.write(" = ");
                }
                self.expr(value, Precedence::Yield);
            }
            StmtKind::AugAssign { target, op, value } => {
                self.fill("");
                self.expr(target, Precedence::Tuple);
                self.write(&format!(" {op}= "));
                self.expr(value, Precedence::Yield);
            }
            StmtKind::AnnAssign {
                target,
                annotation,
                value,
                simple,
            } => {
                self.fill("");
                if !simple && matches!(target.kind, ExprKind::Name(_)) {
                    self.write("(");
                    self.expr(target, Precedence::Test);
                    self.write(")");
                } else {
                    self.expr(target, Precedence::Test);
                }
                self.write(": ");
                self.expr(annotation, Precedence::Test);
                if let Some(value) = value {
                    self.write(" = ");
                    self.expr(value, Precedence::Yield);
                }
            }
            StmtKind::For(for_) => self.for_stmt(for_, false),
            StmtKind::AsyncFor(for_) => self.for_stmt(for_, true),
            StmtKind::While { test, body, orelse } => {
                self.fill("while ");
                self.condition(test);
                self.block(body);
                self.else_block(orelse);
            }
            StmtKind::If { test, body, orelse } => self.if_stmt("if ", test, body, orelse),
            StmtKind::With(with) => self.with_stmt(with, false),
            StmtKind::AsyncWith(with) => self.with_stmt(with, true),
            StmtKind::Raise { exc, cause } => {
                self.fill("raise");
                if let Some(exc) = exc {
                    self.write(" ");
                    self.expr(exc, Precedence::Test);
                    if let Some(cause) = cause {
                        self.write(" from ");
                        self.expr(cause, Precedence::Test);
                    }
                }
            }
            StmtKind::Try(try_) => self.try_stmt(try_),
            StmtKind::Assert { test, msg } => {
                self.fill("assert ");
                self.expr(test, Precedence::Test);
                if let Some(msg) = msg {
                    self.write(", ");
                    self.expr(msg, Precedence::Test);
                }
            }
            StmtKind::Import(names) => {
                self.fill("import ");
                self.aliases(names);
            }
            StmtKind::ImportFrom(import) => {
                self.fill("from ");
                self.write(&".".repeat(import.level as usize));
                if let Some(module) = &import.module {
                    self.write(module);
                }
                self.write(" import ");
                self.aliases(&import.names);
            }
            StmtKind::Global(names) => self.fill(&format!("global {}", names.join(", "))),
            StmtKind::Nonlocal(names) => self.fill(&format!("nonlocal {}", names.join(", "))),
            StmtKind::Expr(value) => {
                self.fill("");
                self.expr(value, Precedence::Yield);
            }
            StmtKind::Pass => self.fill("pass"),
            StmtKind::Break => self.fill("break"),
            StmtKind::Continue => self.fill("continue"),
            StmtKind::Comment { text, inline } => {
                if *inline && !self.out.is_empty() {
                    self.write("  ");
                    self.write(text);
                } else {
                    self.fill(text);
                }
            }
            StmtKind::Blank => {}
        }
    }

    fn function_def(&mut self, func: &FunctionDef, is_async: bool) {
        self.decorators(&func.decorators);
        self.fill(if is_async { "async def " } else { "def " });
        self.write(&func.name);
        self.write("(");
        self.parameters(&func.params);
        self.write(")");
        if let Some(returns) = &func.returns {
            self.write(" -> ");
            self.expr(returns, Precedence::Test);
        }
        self.block(&func.body);
    }

    fn class_def(&mut self, class: &ClassDef) {
        self.decorators(&class.decorators);
        self.fill("class ");
        self.write(&class.name);
        if !class.bases.is_empty() || !class.keywords.is_empty() {
            self.write("(");
            self.arguments(&class.bases, &class.keywords);
            self.write(")");
        }
        self.block(&class.body);
    }

    fn decorators(&mut self, decorators: &[Expr]) {
        for decorator in decorators {
            self.fill("@");
            self.expr(decorator, Precedence::Test);
        }
    }

    fn for_stmt(&mut self, for_: &For, is_async: bool) {
        self.fill(if is_async { "async for " } else { "for " });
        self.expr(&for_.target, Precedence::Tuple);
        self.write(" in ");
        self.expr(&for_.iter, Precedence::Tuple);
        self.block(&for_.body);
        self.else_block(&for_.orelse);
    }

    fn if_stmt(&mut self, keyword: &str, test: &Expr, body: &[Stmt], orelse: &[Stmt]) {
        self.fill(keyword);
        self.condition(test);
        self.block(body);

        if let [Stmt {
            kind:
                StmtKind::If {
                    test,
                    body,
                    orelse,
                },
            ..
        }] = orelse
        {
            self.if_stmt("elif ", test, body, orelse);
        } else {
            self.else_block(orelse);
        }
    }

    /// `if`/`while` test: a bare `:=` is allowed, `yield` is not.
    fn condition(&mut self, test: &Expr) {
        let ctx = match test.kind {
            ExprKind::NamedExpr { .. } => Precedence::NamedExpr,
            _ => Precedence::Tuple,
        };
        self.expr(test, ctx);
    }

    fn else_block(&mut self, orelse: &[Stmt]) {
        if orelse.is_empty() {
            return;
        }
        self.fill("else");
        self.block(orelse);
    }

    fn with_stmt(&mut self, with: &With, is_async: bool) {
        self.fill(if is_async { "async with " } else { "with " });
        for (i, item) in with.items.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.expr(&item.context_expr, Precedence::Test);
            if let Some(vars) = &item.optional_vars {
                self.write(" as ");
                self.expr(vars, Precedence::Test);
            }
        }
        self.block(&with.body);
    }

    fn try_stmt(&mut self, try_: &Try) {
        self.fill("try");
        self.block(&try_.body);
        for handler in &try_.handlers {
            self.fill(if try_.star { "except*" } else { "except" });
            if let Some(exc_type) = &handler.exc_type {
                self.write(" ");
                self.expr(exc_type, Precedence::Test);
                if let Some(name) = &handler.name {
                    self.write(" as ");
                    self.write(name);
                }
            }
            self.block(&handler.body);
        }
        self.else_block(&try_.orelse);
        if !try_.finalbody.is_empty() {
            self.fill("finally");
            self.block(&try_.finalbody);
        }
    }

    fn aliases(&mut self, names: &[Alias]) {
        for (i, alias) in names.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.write(&alias.name);
            if let Some(asname) = &alias.asname {
                self.write(" as ");
                self.write(asname);
            }
        }
    }
}
