//! Statement parsing.

use ds_ast::{
    Alias, ClassDef, ExceptHandler, Expr, ExprKind, For, FunctionDef, ImportFrom, Operator, Stmt,
    StmtKind, Try, With, WithItem,
};
use ds_lexer::TokenKind;

use crate::cursor::{PResult, Parser};

const AUGASSIGN_OPS: &[&str] = &[
    "+=", "-=", "*=", "@=", "/=", "%=", "&=", "|=", "^=", "<<=", ">>=", "**=", "//=",
];

impl Parser<'_> {
    /// One statement line. Simple statements joined by `;` and a trailing
    /// inline comment come back as several statements.
    pub(crate) fn statement(&mut self) -> PResult<Vec<Stmt>> {
        match self.peek().kind {
            TokenKind::Comment => return Ok(vec![self.comment()]),
            TokenKind::Indent => return Err(self.error("unexpected indent")),
            _ => {}
        }

        if self.at_op("@") {
            return self.decorated();
        }

        let start = self.start();
        let compound = match self.head().as_str() {
            "def" => Some(self.function_def(start, false, Vec::new())?),
            "class" => Some(self.class_def(start, Vec::new())?),
            "if" => Some(self.if_stmt()?),
            "while" => Some(self.while_stmt()?),
            "for" => Some(self.for_stmt(start, false)?),
            "try" => Some(self.try_stmt()?),
            "with" => Some(self.with_stmt(start, false)?),
            "async" => Some(self.async_stmt(start, Vec::new())?),
            _ => None,
        };

        match compound {
            Some(stmt) => Ok(vec![stmt]),
            None => self.simple_line(),
        }
    }

    /// Simple statements up to the end of the line.
    pub(crate) fn simple_line(&mut self) -> PResult<Vec<Stmt>> {
        let mut out = vec![self.simple_statement()?];
        while self.eat_op(";") {
            if self.at_line_end() {
                break;
            }
            out.push(self.simple_statement()?);
        }
        out.extend(self.inline_comment());
        self.expect_newline()?;
        Ok(out)
    }

    fn simple_statement(&mut self) -> PResult<Stmt> {
        let start = self.start();
        let keyword = self.head();

        let kind = match keyword.as_str() {
            "pass" => {
                self.bump();
                StmtKind::Pass
            }
            "break" => {
                self.bump();
                StmtKind::Break
            }
            "continue" => {
                self.bump();
                StmtKind::Continue
            }
            "return" => {
                self.bump();
                let value = if self.at_simple_end() {
                    None
                } else {
                    Some(self.star_expressions()?)
                };
                StmtKind::Return(value)
            }
            "raise" => {
                self.bump();
                let mut exc = None;
                let mut cause = None;
                if !self.at_simple_end() {
                    exc = Some(self.expression()?);
                    if self.eat_keyword("from") {
                        cause = Some(self.expression()?);
                    }
                }
                StmtKind::Raise { exc, cause }
            }
            "assert" => {
                self.bump();
                let test = self.expression()?;
                let msg = if self.eat_op(",") {
                    Some(self.expression()?)
                } else {
                    None
                };
                StmtKind::Assert { test, msg }
            }
            "del" => {
                self.bump();
                let mut targets = vec![self.target()?];
                while self.eat_op(",") {
                    if self.at_simple_end() {
                        break;
                    }
                    targets.push(self.target()?);
                }
                StmtKind::Delete(targets)
            }
            "global" | "nonlocal" => {
                self.bump();
                let mut names = vec![self.expect_name()?];
                while self.eat_op(",") {
                    names.push(self.expect_name()?);
                }
                if keyword == "global" {
                    StmtKind::Global(names)
                } else {
                    StmtKind::Nonlocal(names)
                }
            }
            "import" => {
                self.bump();
                let mut names = vec![self.dotted_alias()?];
                while self.eat_op(",") {
                    names.push(self.dotted_alias()?);
                }
                StmtKind::Import(names)
            }
            "from" => self.import_from()?,
            _ => self.expression_statement()?,
        };

        Ok(Stmt::new(kind, self.span_from(start)))
    }

    /// End of a simple statement: `;`, end of line or inline comment.
    fn at_simple_end(&self) -> bool {
        self.at_line_end() || self.at_op(";") || self.peek().kind == TokenKind::EndMarker
    }

    fn expression_statement(&mut self) -> PResult<StmtKind> {
        let parenthesized = self.at_op("(");
        let first = self.star_expressions_or_yield()?;

        if self.eat_op(":") {
            let annotation = self.expression()?;
            let value = if self.eat_op("=") {
                Some(self.star_expressions_or_yield()?)
            } else {
                None
            };
            let simple = !parenthesized && matches!(first.kind, ExprKind::Name(_));
            return Ok(StmtKind::AnnAssign {
                target: first,
                annotation,
                value,
                simple,
            });
        }

        let token = self.peek();
        if token.kind == TokenKind::Op && AUGASSIGN_OPS.contains(&token.text.as_str()) {
            let op_text = self.bump().text;
            let op = Operator::from_augassign(&op_text)
                .ok_or_else(|| self.error("invalid augmented assignment"))?;
            let value = self.star_expressions_or_yield()?;
            return Ok(StmtKind::AugAssign {
                target: first,
                op,
                value,
            });
        }

        if !self.at_op("=") {
            return Ok(StmtKind::Expr(first));
        }

        let mut targets = vec![first];
        while self.eat_op("=") {
            targets.push(self.star_expressions_or_yield()?);
        }
        let value = targets.pop().ok_or_else(|| self.error("invalid syntax"))?;
        Ok(StmtKind::Assign { targets, value })
    }

    fn star_expressions_or_yield(&mut self) -> PResult<Expr> {
        if self.at_keyword("yield") {
            return self.yield_expr();
        }
        self.star_expressions()
    }

    fn dotted_name(&mut self) -> PResult<String> {
        let mut name = self.expect_name()?;
        while self.eat_op(".") {
            name.push('.');
            name.push_str(&self.expect_name()?);
        }
        Ok(name)
    }

    fn dotted_alias(&mut self) -> PResult<Alias> {
        let name = self.dotted_name()?;
        let asname = if self.eat_keyword("as") {
            Some(self.expect_name()?)
        } else {
            None
        };
        Ok(Alias { name, asname })
    }

    fn import_from(&mut self) -> PResult<StmtKind> {
        self.expect_keyword("from")?;
        let mut level = 0;
        loop {
            if self.eat_op(".") {
                level += 1;
            } else if self.eat_op("...") {
                level += 3;
            } else {
                break;
            }
        }
        let module = if self.at_keyword("import") {
            None
        } else {
            Some(self.dotted_name()?)
        };
        if level == 0 && module.is_none() {
            return Err(self.error("expected module name"));
        }
        self.expect_keyword("import")?;

        let mut names = Vec::new();
        if self.at_op("*") {
            self.bump();
            names.push(Alias {
                name: "*".into(),
                asname: None,
            });
        } else if self.eat_op("(") {
            while !self.at_op(")") {
                names.push(self.import_alias()?);
                if !self.eat_op(",") {
                    break;
                }
            }
            self.expect_op(")")?;
        } else {
            names.push(self.import_alias()?);
            while self.eat_op(",") {
                names.push(self.import_alias()?);
            }
        }
        if names.is_empty() {
            return Err(self.error("expected name"));
        }

        Ok(StmtKind::ImportFrom(ImportFrom {
            module,
            names,
            level,
        }))
    }

    fn import_alias(&mut self) -> PResult<Alias> {
        let name = self.expect_name()?;
        let asname = if self.eat_keyword("as") {
            Some(self.expect_name()?)
        } else {
            None
        };
        Ok(Alias { name, asname })
    }

    fn decorated(&mut self) -> PResult<Vec<Stmt>> {
        let start = self.start();
        let mut decorators = Vec::new();
        let mut leading = Vec::new();
        while self.eat_op("@") {
            decorators.push(self.named_expression()?);
            leading.extend(self.inline_comment());
            self.expect_newline()?;
            while self.peek().kind == TokenKind::Comment {
                leading.push(self.comment());
            }
        }

        let stmt = match self.head().as_str() {
            "def" => self.function_def(start, false, decorators)?,
            "class" => self.class_def(start, decorators)?,
            "async" => self.async_stmt(start, decorators)?,
            _ => return Err(self.error("expected function or class definition")),
        };
        leading.push(stmt);
        Ok(leading)
    }

    fn async_stmt(&mut self, start: (u32, u32), decorators: Vec<Expr>) -> PResult<Stmt> {
        self.expect_keyword("async")?;
        match self.head().as_str() {
            "def" => self.function_def(start, true, decorators),
            "for" if decorators.is_empty() => self.for_stmt(start, true),
            "with" if decorators.is_empty() => self.with_stmt(start, true),
            _ => Err(self.error("invalid syntax")),
        }
    }

    fn function_def(
        &mut self,
        start: (u32, u32),
        is_async: bool,
        decorators: Vec<Expr>,
    ) -> PResult<Stmt> {
        self.expect_keyword("def")?;
        let name = self.expect_name()?;
        self.expect_op("(")?;
        let params = self.parameters(")", true)?;
        self.expect_op(")")?;
        let returns = if self.eat_op("->") {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect_op(":")?;
        let body = self.block()?;

        let func = FunctionDef {
            name,
            params,
            body,
            decorators,
            returns,
        };
        let kind = if is_async {
            StmtKind::AsyncFunctionDef(func)
        } else {
            StmtKind::FunctionDef(func)
        };
        Ok(Stmt::new(kind, self.span_from(start)))
    }

    fn class_def(&mut self, start: (u32, u32), decorators: Vec<Expr>) -> PResult<Stmt> {
        self.expect_keyword("class")?;
        let name = self.expect_name()?;
        let (bases, keywords) = if self.eat_op("(") {
            let args = self.call_arguments()?;
            self.expect_op(")")?;
            args
        } else {
            (Vec::new(), Vec::new())
        };
        self.expect_op(":")?;
        let body = self.block()?;

        let class = ClassDef {
            name,
            bases,
            keywords,
            body,
            decorators,
        };
        Ok(Stmt::new(StmtKind::ClassDef(class), self.span_from(start)))
    }

    /// `if` or `elif`: the keyword is consumed here.
    fn if_stmt(&mut self) -> PResult<Stmt> {
        let start = self.start();
        self.bump();
        let test = self.named_expression()?;
        self.expect_op(":")?;
        let mut body = self.block()?;

        let orelse = match self.continuation(&mut body, &["elif", "else"]) {
            Some("elif") => vec![self.if_stmt()?],
            Some(_) => self.else_block()?,
            None => Vec::new(),
        };
        Ok(Stmt::new(
            StmtKind::If { test, body, orelse },
            self.span_from(start),
        ))
    }

    fn else_block(&mut self) -> PResult<Vec<Stmt>> {
        self.expect_keyword("else")?;
        self.expect_op(":")?;
        self.block()
    }

    fn while_stmt(&mut self) -> PResult<Stmt> {
        let start = self.start();
        self.expect_keyword("while")?;
        let test = self.named_expression()?;
        self.expect_op(":")?;
        let mut body = self.block()?;
        let orelse = match self.continuation(&mut body, &["else"]) {
            Some(_) => self.else_block()?,
            None => Vec::new(),
        };
        Ok(Stmt::new(
            StmtKind::While { test, body, orelse },
            self.span_from(start),
        ))
    }

    fn for_stmt(&mut self, start: (u32, u32), is_async: bool) -> PResult<Stmt> {
        self.expect_keyword("for")?;
        let target = self.target_list()?;
        self.expect_keyword("in")?;
        let iter = self.star_expressions()?;
        self.expect_op(":")?;
        let mut body = self.block()?;
        let orelse = match self.continuation(&mut body, &["else"]) {
            Some(_) => self.else_block()?,
            None => Vec::new(),
        };

        let for_ = For {
            target,
            iter,
            body,
            orelse,
        };
        let kind = if is_async {
            StmtKind::AsyncFor(for_)
        } else {
            StmtKind::For(for_)
        };
        Ok(Stmt::new(kind, self.span_from(start)))
    }

    fn with_stmt(&mut self, start: (u32, u32), is_async: bool) -> PResult<Stmt> {
        self.expect_keyword("with")?;
        let items = match self.parenthesized_with_items() {
            Some(items) => items,
            None => self.with_items()?,
        };
        self.expect_op(":")?;
        let body = self.block()?;

        let with = With { items, body };
        let kind = if is_async {
            StmtKind::AsyncWith(with)
        } else {
            StmtKind::With(with)
        };
        Ok(Stmt::new(kind, self.span_from(start)))
    }

    /// `with (a as b, c):`. Backtracks when the parenthesis turns out to be
    /// part of the first context expression.
    fn parenthesized_with_items(&mut self) -> Option<Vec<WithItem>> {
        if !self.at_op("(") {
            return None;
        }
        let saved = self.save();
        match self.with_item_list() {
            Ok(items) => Some(items),
            Err(_) => {
                self.restore(saved);
                None
            }
        }
    }

    fn with_item_list(&mut self) -> PResult<Vec<WithItem>> {
        self.expect_op("(")?;
        let mut items = Vec::new();
        while !self.at_op(")") {
            items.push(self.with_item()?);
            if !self.eat_op(",") {
                break;
            }
        }
        self.expect_op(")")?;
        if !self.at_op(":") || items.is_empty() {
            return Err(self.error("invalid syntax"));
        }
        Ok(items)
    }

    fn with_items(&mut self) -> PResult<Vec<WithItem>> {
        let mut items = vec![self.with_item()?];
        while self.eat_op(",") {
            items.push(self.with_item()?);
        }
        Ok(items)
    }

    fn with_item(&mut self) -> PResult<WithItem> {
        let context_expr = self.expression()?;
        let optional_vars = if self.eat_keyword("as") {
            Some(self.target()?)
        } else {
            None
        };
        Ok(WithItem {
            context_expr,
            optional_vars,
        })
    }

    fn try_stmt(&mut self) -> PResult<Stmt> {
        let start = self.start();
        self.expect_keyword("try")?;
        self.expect_op(":")?;
        let mut body = self.block()?;

        let mut handlers: Vec<ExceptHandler> = Vec::new();
        let mut star = false;
        let mut orelse = Vec::new();
        let mut finalbody = Vec::new();

        loop {
            let last = match handlers.last_mut() {
                Some(handler) => &mut handler.body,
                None => &mut body,
            };
            if self.continuation(last, &["except"]).is_none() {
                break;
            }
            self.bump();
            if self.eat_op("*") {
                star = true;
            }
            let mut exc_type = None;
            let mut name = None;
            if !self.at_op(":") {
                exc_type = Some(self.expression()?);
                if self.eat_keyword("as") {
                    name = Some(self.expect_name()?);
                }
            }
            self.expect_op(":")?;
            let handler_body = self.block()?;
            handlers.push(ExceptHandler {
                exc_type,
                name,
                body: handler_body,
            });
        }

        let last = match handlers.last_mut() {
            Some(handler) => &mut handler.body,
            None => &mut body,
        };
        if self.continuation(last, &["else"]).is_some() {
            orelse = self.else_block()?;
        }

        let last = if !orelse.is_empty() {
            &mut orelse
        } else {
            match handlers.last_mut() {
                Some(handler) => &mut handler.body,
                None => &mut body,
            }
        };
        if self.continuation(last, &["finally"]).is_some() {
            self.bump();
            self.expect_op(":")?;
            finalbody = self.block()?;
        }

        if handlers.is_empty() && finalbody.is_empty() {
            return Err(self.error("expected 'except' or 'finally' block"));
        }

        let try_ = Try {
            body,
            handlers,
            orelse,
            finalbody,
            star,
        };
        Ok(Stmt::new(StmtKind::Try(try_), self.span_from(start)))
    }
}
