//! Expression parsing, one function per precedence level.

use ds_ast::{
    BoolOp, CmpOp, Comprehension, Constant, DictItem, Expr, ExprKind, Keyword, Operator, Param,
    Parameters, StrLit, UnaryOp,
};
use ds_lexer::TokenKind;

use crate::cursor::{is_keyword, PResult, Parser};

/// Keywords that may start an expression.
const EXPR_KEYWORDS: &[&str] = &["not", "lambda", "await", "None", "True", "False", "yield"];

impl Parser<'_> {
    /// Comma-separated expressions; more than one (or a trailing comma)
    /// makes an unparenthesized tuple.
    pub(crate) fn star_expressions(&mut self) -> PResult<Expr> {
        let start = self.start();
        let first = self.star_expression()?;
        if !self.at_op(",") {
            return Ok(first);
        }
        let mut elts = vec![first];
        while self.eat_op(",") {
            if !self.starts_expression() {
                break;
            }
            elts.push(self.star_expression()?);
        }
        Ok(self.tuple(elts, false, start))
    }

    fn star_expression(&mut self) -> PResult<Expr> {
        if self.at_op("*") {
            let start = self.start();
            self.bump();
            let value = self.bitor()?;
            return Ok(Expr::new(
                ExprKind::Starred(Box::new(value)),
                self.span_from(start),
            ));
        }
        self.expression()
    }

    fn star_named_expression(&mut self) -> PResult<Expr> {
        if self.at_op("*") {
            return self.star_expression();
        }
        self.named_expression()
    }

    /// `name := value` or a plain expression.
    pub(crate) fn named_expression(&mut self) -> PResult<Expr> {
        let token = self.peek();
        if token.kind == TokenKind::Name && !is_keyword(&token.text) && self.peek_nth(1).is_op(":=")
        {
            let start = self.start();
            let target = Expr::name(self.bump().text, self.span_from(start));
            self.bump();
            let value = self.expression()?;
            return Ok(Expr::new(
                ExprKind::NamedExpr {
                    target: Box::new(target),
                    value: Box::new(value),
                },
                self.span_from(start),
            ));
        }
        self.expression()
    }

    /// Conditional expression or lambda.
    pub(crate) fn expression(&mut self) -> PResult<Expr> {
        if self.at_keyword("lambda") {
            return self.lambda();
        }
        let start = self.start();
        let body = self.or_test()?;
        if !self.eat_keyword("if") {
            return Ok(body);
        }
        let test = self.or_test()?;
        self.expect_keyword("else")?;
        let orelse = self.expression()?;
        Ok(Expr::new(
            ExprKind::IfExp {
                test: Box::new(test),
                body: Box::new(body),
                orelse: Box::new(orelse),
            },
            self.span_from(start),
        ))
    }

    fn lambda(&mut self) -> PResult<Expr> {
        let start = self.start();
        self.expect_keyword("lambda")?;
        let params = self.parameters(":", false)?;
        self.expect_op(":")?;
        let body = self.expression()?;
        Ok(Expr::new(
            ExprKind::Lambda {
                params: Box::new(params),
                body: Box::new(body),
            },
            self.span_from(start),
        ))
    }

    pub(crate) fn yield_expr(&mut self) -> PResult<Expr> {
        let start = self.start();
        self.expect_keyword("yield")?;
        if self.eat_keyword("from") {
            let value = self.expression()?;
            return Ok(Expr::new(
                ExprKind::YieldFrom(Box::new(value)),
                self.span_from(start),
            ));
        }
        let value = if self.starts_expression() {
            Some(Box::new(self.star_expressions()?))
        } else {
            None
        };
        Ok(Expr::new(ExprKind::Yield(value), self.span_from(start)))
    }

    fn or_test(&mut self) -> PResult<Expr> {
        self.bool_op("or", BoolOp::Or, Self::and_test)
    }

    fn and_test(&mut self) -> PResult<Expr> {
        self.bool_op("and", BoolOp::And, Self::not_test)
    }

    fn bool_op(
        &mut self,
        keyword: &str,
        op: BoolOp,
        operand: fn(&mut Self) -> PResult<Expr>,
    ) -> PResult<Expr> {
        let start = self.start();
        let first = operand(self)?;
        if !self.at_keyword(keyword) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.eat_keyword(keyword) {
            values.push(operand(self)?);
        }
        Ok(Expr::new(
            ExprKind::BoolOp { op, values },
            self.span_from(start),
        ))
    }

    fn not_test(&mut self) -> PResult<Expr> {
        if !self.at_keyword("not") {
            return self.comparison();
        }
        let start = self.start();
        self.bump();
        let operand = self.not_test()?;
        Ok(Expr::new(
            ExprKind::UnaryOp {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            },
            self.span_from(start),
        ))
    }

    fn comparison(&mut self) -> PResult<Expr> {
        let start = self.start();
        let left = self.bitor()?;
        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        while let Some(op) = self.comparison_op() {
            ops.push(op);
            comparators.push(self.bitor()?);
        }
        if ops.is_empty() {
            return Ok(left);
        }
        Ok(Expr::new(
            ExprKind::Compare {
                left: Box::new(left),
                ops,
                comparators,
            },
            self.span_from(start),
        ))
    }

    /// Consume a comparison operator, if one is next.
    fn comparison_op(&mut self) -> Option<CmpOp> {
        let token = self.peek();
        let op = match (token.kind, token.text.as_str()) {
            (TokenKind::Op, "==") => CmpOp::Eq,
            (TokenKind::Op, "!=") => CmpOp::NotEq,
            (TokenKind::Op, "<") => CmpOp::Lt,
            (TokenKind::Op, "<=") => CmpOp::LtE,
            (TokenKind::Op, ">") => CmpOp::Gt,
            (TokenKind::Op, ">=") => CmpOp::GtE,
            (TokenKind::Name, "in") => CmpOp::In,
            (TokenKind::Name, "is") => {
                self.bump();
                return Some(if self.eat_keyword("not") {
                    CmpOp::IsNot
                } else {
                    CmpOp::Is
                });
            }
            (TokenKind::Name, "not") if self.peek_nth(1).is_keyword("in") => {
                self.bump();
                self.bump();
                return Some(CmpOp::NotIn);
            }
            _ => return None,
        };
        self.bump();
        Some(op)
    }

    pub(crate) fn bitor(&mut self) -> PResult<Expr> {
        self.binary_level(&["|"], Self::bitxor)
    }

    fn bitxor(&mut self) -> PResult<Expr> {
        self.binary_level(&["^"], Self::bitand)
    }

    fn bitand(&mut self) -> PResult<Expr> {
        self.binary_level(&["&"], Self::shift)
    }

    fn shift(&mut self) -> PResult<Expr> {
        self.binary_level(&["<<", ">>"], Self::arith)
    }

    fn arith(&mut self) -> PResult<Expr> {
        self.binary_level(&["+", "-"], Self::term)
    }

    fn term(&mut self) -> PResult<Expr> {
        self.binary_level(&["*", "/", "//", "%", "@"], Self::factor)
    }

    /// Left-associative binary operators of one precedence level.
    fn binary_level(
        &mut self,
        ops: &[&str],
        operand: fn(&mut Self) -> PResult<Expr>,
    ) -> PResult<Expr> {
        let start = self.start();
        let mut left = operand(self)?;
        loop {
            let token = self.peek();
            if token.kind != TokenKind::Op || !ops.contains(&token.text.as_str()) {
                return Ok(left);
            }
            let op_text = self.bump().text;
            let op = Operator::from_binary(&op_text)
                .ok_or_else(|| self.error("invalid binary operator"))?;
            let right = operand(self)?;
            left = Expr::new(
                ExprKind::BinOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                self.span_from(start),
            );
        }
    }

    fn factor(&mut self) -> PResult<Expr> {
        let op = if self.at_op("+") {
            UnaryOp::UAdd
        } else if self.at_op("-") {
            UnaryOp::USub
        } else if self.at_op("~") {
            UnaryOp::Invert
        } else {
            return self.power();
        };
        let start = self.start();
        self.bump();
        let operand = self.factor()?;
        Ok(Expr::new(
            ExprKind::UnaryOp {
                op,
                operand: Box::new(operand),
            },
            self.span_from(start),
        ))
    }

    fn power(&mut self) -> PResult<Expr> {
        let start = self.start();
        let base = self.await_primary()?;
        if !self.eat_op("**") {
            return Ok(base);
        }
        let exponent = self.factor()?;
        Ok(Expr::new(
            ExprKind::BinOp {
                left: Box::new(base),
                op: Operator::Pow,
                right: Box::new(exponent),
            },
            self.span_from(start),
        ))
    }

    fn await_primary(&mut self) -> PResult<Expr> {
        if !self.at_keyword("await") {
            return self.primary();
        }
        let start = self.start();
        self.bump();
        let value = self.primary()?;
        Ok(Expr::new(
            ExprKind::Await(Box::new(value)),
            self.span_from(start),
        ))
    }

    fn primary(&mut self) -> PResult<Expr> {
        let start = self.start();
        let mut expr = self.atom()?;
        loop {
            if self.eat_op(".") {
                let attr = self.expect_name()?;
                expr = Expr::new(
                    ExprKind::Attribute {
                        value: Box::new(expr),
                        attr,
                    },
                    self.span_from(start),
                );
            } else if self.eat_op("(") {
                let (args, keywords) = self.call_arguments()?;
                self.expect_op(")")?;
                expr = Expr::new(
                    ExprKind::Call {
                        func: Box::new(expr),
                        args,
                        keywords,
                    },
                    self.span_from(start),
                );
            } else if self.eat_op("[") {
                let slice = self.slices()?;
                self.expect_op("]")?;
                expr = Expr::new(
                    ExprKind::Subscript {
                        value: Box::new(expr),
                        slice: Box::new(slice),
                    },
                    self.span_from(start),
                );
            } else {
                return Ok(expr);
            }
        }
    }

    fn atom(&mut self) -> PResult<Expr> {
        let start = self.start();
        let token = self.peek().clone();
        let kind = match token.kind {
            TokenKind::Name => match token.text.as_str() {
                "None" => self.constant(Constant::None),
                "True" => self.constant(Constant::True),
                "False" => self.constant(Constant::False),
                text if is_keyword(text) => return Err(self.error("invalid syntax")),
                _ => ExprKind::Name(self.bump().text),
            },
            TokenKind::Number => ExprKind::Constant(Constant::Number(self.bump().text)),
            TokenKind::String => {
                let mut parts = Vec::new();
                while self.peek().kind == TokenKind::String {
                    parts.push(self.bump().text);
                }
                ExprKind::Str(StrLit::new(parts))
            }
            TokenKind::Op => match token.text.as_str() {
                "..." => self.constant(Constant::Ellipsis),
                "(" => return self.paren(),
                "[" => return self.list_display(),
                "{" => return self.brace_display(),
                _ => return Err(self.error("invalid syntax")),
            },
            _ => return Err(self.error("invalid syntax")),
        };
        Ok(Expr::new(kind, self.span_from(start)))
    }

    fn constant(&mut self, value: Constant) -> ExprKind {
        self.bump();
        ExprKind::Constant(value)
    }

    /// `( ... )`: empty tuple, yield, generator, tuple or grouping.
    fn paren(&mut self) -> PResult<Expr> {
        let start = self.start();
        self.expect_op("(")?;
        if self.eat_op(")") {
            return Ok(self.tuple(Vec::new(), true, start));
        }
        if self.at_keyword("yield") {
            let value = self.yield_expr()?;
            self.expect_op(")")?;
            return Ok(value);
        }

        let first = self.star_named_expression()?;
        if self.at_comprehension() {
            let generators = self.comprehension_clauses()?;
            self.expect_op(")")?;
            return Ok(Expr::new(
                ExprKind::GeneratorExp {
                    elt: Box::new(first),
                    generators,
                },
                self.span_from(start),
            ));
        }
        if self.eat_op(")") {
            return Ok(match first.kind {
                ExprKind::Tuple { elts, .. } => self.tuple(elts, true, start),
                _ => first,
            });
        }

        let mut elts = vec![first];
        while self.eat_op(",") {
            if self.at_op(")") {
                break;
            }
            elts.push(self.star_named_expression()?);
        }
        self.expect_op(")")?;
        Ok(self.tuple(elts, true, start))
    }

    fn list_display(&mut self) -> PResult<Expr> {
        let start = self.start();
        self.expect_op("[")?;
        if self.eat_op("]") {
            return Ok(Expr::new(ExprKind::List(Vec::new()), self.span_from(start)));
        }
        let first = self.star_named_expression()?;
        if self.at_comprehension() {
            let generators = self.comprehension_clauses()?;
            self.expect_op("]")?;
            return Ok(Expr::new(
                ExprKind::ListComp {
                    elt: Box::new(first),
                    generators,
                },
                self.span_from(start),
            ));
        }
        let elts = self.rest_of_sequence(first, "]")?;
        Ok(Expr::new(ExprKind::List(elts), self.span_from(start)))
    }

    /// `{ ... }`: dict, set or their comprehensions.
    fn brace_display(&mut self) -> PResult<Expr> {
        let start = self.start();
        self.expect_op("{")?;
        if self.eat_op("}") {
            return Ok(Expr::new(ExprKind::Dict(Vec::new()), self.span_from(start)));
        }

        if self.at_op("**") {
            let items = self.dict_items(None)?;
            return Ok(Expr::new(ExprKind::Dict(items), self.span_from(start)));
        }

        let first = self.star_named_expression()?;
        if self.eat_op(":") {
            let value = self.expression()?;
            if self.at_comprehension() {
                let generators = self.comprehension_clauses()?;
                self.expect_op("}")?;
                return Ok(Expr::new(
                    ExprKind::DictComp {
                        key: Box::new(first),
                        value: Box::new(value),
                        generators,
                    },
                    self.span_from(start),
                ));
            }
            let items = self.dict_items(Some(DictItem {
                key: Some(first),
                value,
            }))?;
            return Ok(Expr::new(ExprKind::Dict(items), self.span_from(start)));
        }

        if self.at_comprehension() {
            let generators = self.comprehension_clauses()?;
            self.expect_op("}")?;
            return Ok(Expr::new(
                ExprKind::SetComp {
                    elt: Box::new(first),
                    generators,
                },
                self.span_from(start),
            ));
        }
        let elts = self.rest_of_sequence(first, "}")?;
        Ok(Expr::new(ExprKind::Set(elts), self.span_from(start)))
    }

    /// Remaining dict items up to and including the closing brace.
    fn dict_items(&mut self, first: Option<DictItem>) -> PResult<Vec<DictItem>> {
        let mut items: Vec<DictItem> = first.into_iter().collect();
        if !items.is_empty() && !self.eat_op(",") {
            self.expect_op("}")?;
            return Ok(items);
        }
        while !self.at_op("}") {
            if self.eat_op("**") {
                let value = self.bitor()?;
                items.push(DictItem { key: None, value });
            } else {
                let key = self.expression()?;
                self.expect_op(":")?;
                let value = self.expression()?;
                items.push(DictItem {
                    key: Some(key),
                    value,
                });
            }
            if !self.eat_op(",") {
                break;
            }
        }
        self.expect_op("}")?;
        Ok(items)
    }

    /// Remaining elements of a list or set display after `first`, consuming
    /// the closing delimiter.
    fn rest_of_sequence(&mut self, first: Expr, close: &str) -> PResult<Vec<Expr>> {
        let mut elts = vec![first];
        while self.eat_op(",") {
            if self.at_op(close) {
                break;
            }
            elts.push(self.star_named_expression()?);
        }
        self.expect_op(close)?;
        Ok(elts)
    }

    fn at_comprehension(&self) -> bool {
        self.at_keyword("for")
            || (self.at_keyword("async") && self.peek_nth(1).is_keyword("for"))
    }

    fn comprehension_clauses(&mut self) -> PResult<Vec<Comprehension>> {
        let mut generators = Vec::new();
        while self.at_comprehension() {
            let is_async = self.eat_keyword("async");
            self.expect_keyword("for")?;
            let target = self.target_list()?;
            self.expect_keyword("in")?;
            let iter = self.or_test()?;
            let mut ifs = Vec::new();
            while self.eat_keyword("if") {
                ifs.push(self.or_test()?);
            }
            generators.push(Comprehension {
                target,
                iter,
                ifs,
                is_async,
            });
        }
        Ok(generators)
    }

    /// Arguments of a call or class header, up to (not including) `)`.
    pub(crate) fn call_arguments(&mut self) -> PResult<(Vec<Expr>, Vec<Keyword>)> {
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        while !self.at_op(")") {
            let start = self.start();
            if self.eat_op("**") {
                let value = self.expression()?;
                keywords.push(Keyword { arg: None, value });
            } else if self.eat_op("*") {
                let value = self.expression()?;
                args.push(Expr::new(
                    ExprKind::Starred(Box::new(value)),
                    self.span_from(start),
                ));
            } else if self.peek().kind == TokenKind::Name && self.peek_nth(1).is_op("=") {
                let arg = self.expect_name()?;
                self.bump();
                let value = self.expression()?;
                keywords.push(Keyword {
                    arg: Some(arg),
                    value,
                });
            } else {
                let value = self.named_expression()?;
                if self.at_comprehension() {
                    let generators = self.comprehension_clauses()?;
                    args.push(Expr::new(
                        ExprKind::GeneratorExp {
                            elt: Box::new(value),
                            generators,
                        },
                        self.span_from(start),
                    ));
                } else {
                    args.push(value);
                }
            }
            if !self.eat_op(",") {
                break;
            }
        }
        Ok((args, keywords))
    }

    /// Contents of `[...]` after a primary.
    fn slices(&mut self) -> PResult<Expr> {
        let start = self.start();
        let first = self.slice()?;
        if !self.at_op(",") {
            return Ok(first);
        }
        let mut elts = vec![first];
        while self.eat_op(",") {
            if self.at_op("]") {
                break;
            }
            elts.push(self.slice()?);
        }
        Ok(self.tuple(elts, false, start))
    }

    fn slice(&mut self) -> PResult<Expr> {
        let start = self.start();
        if self.at_op("*") {
            return self.star_expression();
        }
        let lower = if self.at_op(":") {
            None
        } else {
            Some(self.named_expression()?)
        };
        if !self.eat_op(":") {
            return lower.ok_or_else(|| self.error("invalid syntax"));
        }
        let upper = if self.at_op(":") || self.at_op("]") || self.at_op(",") {
            None
        } else {
            Some(Box::new(self.expression()?))
        };
        let mut step = None;
        if self.eat_op(":") && !(self.at_op("]") || self.at_op(",")) {
            step = Some(Box::new(self.expression()?));
        }
        Ok(Expr::new(
            ExprKind::Slice {
                lower: lower.map(Box::new),
                upper,
                step,
            },
            self.span_from(start),
        ))
    }

    /// A single assignment-like target (`del`, `with ... as`).
    pub(crate) fn target(&mut self) -> PResult<Expr> {
        self.star_target()
    }

    fn star_target(&mut self) -> PResult<Expr> {
        if !self.at_op("*") {
            return self.bitor();
        }
        let start = self.start();
        self.bump();
        let value = self.bitor()?;
        Ok(Expr::new(
            ExprKind::Starred(Box::new(value)),
            self.span_from(start),
        ))
    }

    /// Loop target: stops before `in`, so parsed below comparisons.
    pub(crate) fn target_list(&mut self) -> PResult<Expr> {
        let start = self.start();
        let first = self.star_target()?;
        if !self.at_op(",") {
            return Ok(first);
        }
        let mut elts = vec![first];
        while self.eat_op(",") {
            if self.at_keyword("in") || self.at_op("=") {
                break;
            }
            elts.push(self.star_target()?);
        }
        Ok(self.tuple(elts, false, start))
    }

    /// Parameters of a `def` (`annotations`) or `lambda`, up to `close`.
    pub(crate) fn parameters(&mut self, close: &str, annotations: bool) -> PResult<Parameters> {
        let mut params = Parameters::default();
        let mut after_star = false;
        while !self.at_op(close) {
            if self.eat_op("/") {
                params.posonly = std::mem::take(&mut params.args);
            } else if self.eat_op("**") {
                params.kwarg = Some(self.param(annotations)?);
            } else if self.eat_op("*") {
                after_star = true;
                if !self.at_op(",") && !self.at_op(close) {
                    params.vararg = Some(self.param(annotations)?);
                }
            } else {
                let param = self.param(annotations)?;
                if after_star {
                    params.kwonly.push(param);
                } else {
                    params.args.push(param);
                }
            }
            if !self.eat_op(",") {
                break;
            }
        }
        Ok(params)
    }

    fn param(&mut self, annotations: bool) -> PResult<Param> {
        let name = self.expect_name()?;
        let annotation = if annotations && self.eat_op(":") {
            Some(self.expression()?)
        } else {
            None
        };
        let default = if self.eat_op("=") {
            Some(self.expression()?)
        } else {
            None
        };
        Ok(Param {
            name,
            annotation,
            default,
        })
    }

    fn tuple(&self, elts: Vec<Expr>, parenthesized: bool, start: (u32, u32)) -> Expr {
        Expr::new(
            ExprKind::Tuple {
                elts,
                parenthesized,
            },
            self.span_from(start),
        )
    }

    fn starts_expression(&self) -> bool {
        let token = self.peek();
        match token.kind {
            TokenKind::Name => !is_keyword(&token.text) || EXPR_KEYWORDS.contains(&token.text.as_str()),
            TokenKind::Number | TokenKind::String => true,
            TokenKind::Op => matches!(
                token.text.as_str(),
                "(" | "[" | "{" | "-" | "+" | "~" | "*" | "..."
            ),
            _ => false,
        }
    }
}
