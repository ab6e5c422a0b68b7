//! Expression rendering with precedence-driven parentheses.

use ds_ast::{
    BoolOp, Comprehension, Constant, Expr, ExprKind, Keyword, Operator, Param, Parameters, UnaryOp,
};

use crate::printer::Printer;

/// Binding strength of expression forms, weakest first.
///
/// An expression is parenthesized when the context it appears in requires
/// a higher precedence than its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Precedence {
    NamedExpr,
    /// Statement values: a bare `yield` is allowed, `:=` is not.
    Yield,
    Tuple,
    Test,
    Or,
    And,
    Not,
    Cmp,
    BitOr,
    BitXor,
    BitAnd,
    Shift,
    Arith,
    Term,
    Factor,
    Power,
    Await,
    Atom,
}

impl Precedence {
    fn next(self) -> Precedence {
        use Precedence::*;
        match self {
            NamedExpr => Yield,
            Yield => Tuple,
            Tuple => Test,
            Test => Or,
            Or => And,
            And => Not,
            Not => Cmp,
            Cmp => BitOr,
            BitOr => BitXor,
            BitXor => BitAnd,
            BitAnd => Shift,
            Shift => Arith,
            Arith => Term,
            Term => Factor,
            Factor => Power,
            Power => Await,
            Await | Atom => Atom,
        }
    }

    fn of_operator(op: Operator) -> Precedence {
        match op {
            Operator::BitOr => Precedence::BitOr,
            Operator::BitXor => Precedence::BitXor,
            Operator::BitAnd => Precedence::BitAnd,
            Operator::LShift | Operator::RShift => Precedence::Shift,
            Operator::Add | Operator::Sub => Precedence::Arith,
            Operator::Mult
            | Operator::MatMult
            | Operator::Div
            | Operator::Mod
            | Operator::FloorDiv => Precedence::Term,
            Operator::Pow => Precedence::Power,
        }
    }
}

/// Precedence of the outermost form of `expr`.
fn precedence_of(expr: &Expr) -> Precedence {
    match &expr.kind {
        ExprKind::NamedExpr { .. } => Precedence::NamedExpr,
        ExprKind::Tuple { .. } => Precedence::Tuple,
        ExprKind::Yield(_) | ExprKind::YieldFrom(_) => Precedence::Yield,
        ExprKind::Lambda { .. } | ExprKind::IfExp { .. } => Precedence::Test,
        ExprKind::BoolOp { op: BoolOp::Or, .. } => Precedence::Or,
        ExprKind::BoolOp { op: BoolOp::And, .. } => Precedence::And,
        ExprKind::UnaryOp {
            op: UnaryOp::Not, ..
        } => Precedence::Not,
        ExprKind::Compare { .. } => Precedence::Cmp,
        ExprKind::BinOp { op, .. } => Precedence::of_operator(*op),
        ExprKind::UnaryOp { .. } => Precedence::Factor,
        ExprKind::Await(_) => Precedence::Await,
        _ => Precedence::Atom,
    }
}

impl Printer {
    /// Render `expr` in a context that requires at least `ctx`.
    pub(crate) fn expr(&mut self, expr: &Expr, ctx: Precedence) {
        let own = precedence_of(expr);
        let parens = match &expr.kind {
            ExprKind::Tuple {
                elts,
                parenthesized,
            } => elts.is_empty() || *parenthesized || ctx > own,
            _ => ctx > own,
        };
        if parens {
            self.write("(");
        }
        self.expr_inner(expr, own);
        if parens {
            self.write(")");
        }
    }

    fn expr_inner(&mut self, expr: &Expr, own: Precedence) {
        match &expr.kind {
            ExprKind::BoolOp { op, values } => {
                let sep = format!(" {op} ");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.write(&sep);
                    }
                    self.expr(value, own.next());
                }
            }
            ExprKind::NamedExpr { target, value } => {
                self.expr(target, Precedence::Atom);
                self.write(" := ");
                self.expr(value, Precedence::Test);
            }
            ExprKind::BinOp { left, op, right } => {
                let (left_ctx, right_ctx) = if *op == Operator::Pow {
                    (own.next(), own)
                } else {
                    (own, own.next())
                };
                self.expr(left, left_ctx);
                self.write(&format!(" {op} "));
                self.expr(right, right_ctx);
            }
            ExprKind::UnaryOp { op, operand } => {
                self.write(&op.to_string());
                self.expr(operand, own);
            }
            ExprKind::Lambda { params, body } => {
                self.write("lambda");
                if !params.is_empty() {
                    self.write(" ");
                    self.parameters(params);
                }
                self.write(": ");
                self.expr(body, Precedence::Test);
            }
            ExprKind::IfExp { test, body, orelse } => {
                self.expr(body, Precedence::Test.next());
                self.write(" if ");
                self.expr(test, Precedence::Test.next());
                self.write(" else ");
                self.expr(orelse, Precedence::Test);
            }
            ExprKind::Dict(items) => {
                self.write("{");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    match &item.key {
                        Some(key) => {
                            self.expr(key, Precedence::Test);
                            self.write(": ");
                            self.expr(&item.value, Precedence::Test);
                        }
                        None => {
                            self.write("**");
                            self.expr(&item.value, Precedence::BitOr);
                        }
                    }
                }
                self.write("}");
            }
            ExprKind::Set(elts) => {
                self.write("{");
                self.comma_separated(elts, Precedence::Test);
                self.write("}");
            }
            ExprKind::List(elts) => {
                self.write("[");
                self.comma_separated(elts, Precedence::Test);
                self.write("]");
            }
            ExprKind::ListComp { elt, generators } => {
                self.comprehension_display("[", elt, generators, "]")
            }
            ExprKind::SetComp { elt, generators } => {
                self.comprehension_display("{", elt, generators, "}")
            }
            ExprKind::GeneratorExp { elt, generators } => {
                self.comprehension_display("(", elt, generators, ")")
            }
            ExprKind::DictComp {
                key,
                value,
                generators,
            } => {
                self.write("{");
                self.expr(key, Precedence::Test);
                self.write(": ");
                self.expr(value, Precedence::Test);
                self.comprehensions(generators);
                self.write("}");
            }
            ExprKind::Await(value) => {
                self.write("await ");
                self.expr(value, Precedence::Atom);
            }
            ExprKind::Yield(value) => {
                self.write("yield");
                if let Some(value) = value {
                    self.write(" ");
                    self.expr(value, Precedence::Tuple);
                }
            }
            ExprKind::YieldFrom(value) => {
                self.write("yield from ");
                self.expr(value, Precedence::Test);
            }
            ExprKind::Compare {
                left,
                ops,
                comparators,
            } => {
                self.expr(left, own.next());
                for (op, comparator) in ops.iter().zip(comparators) {
                    self.write(&format!(" {op} "));
                    self.expr(comparator, own.next());
                }
            }
            ExprKind::Call {
                func,
                args,
                keywords,
            } => {
                self.expr(func, Precedence::Atom);
                self.write("(");
                match (args.as_slice(), keywords.is_empty()) {
                    (
                        [Expr {
                            kind: ExprKind::GeneratorExp { elt, generators },
                            ..
                        }],
                        true,
                    ) => {
                        self.expr(elt, Precedence::Test);
                        self.comprehensions(generators);
                    }
                    _ => self.arguments(args, keywords),
                }
                self.write(")");
            }
            ExprKind::Constant(value) => self.constant(value),
            ExprKind::Str(lit) => self.write(&lit.parts.join(" ")),
            ExprKind::Attribute { value, attr } => {
                self.expr(value, Precedence::Atom);
                if is_plain_integer(value) {
                    self.write(" ");
                }
                self.write(".");
                self.write(attr);
            }
            ExprKind::Subscript { value, slice } => {
                self.expr(value, Precedence::Atom);
                self.write("[");
                match &slice.kind {
                    ExprKind::Tuple {
                        elts,
                        parenthesized: false,
                    } if !elts.is_empty() => self.tuple_elements(elts),
                    _ => self.expr(slice, Precedence::Tuple),
                }
                self.write("]");
            }
            ExprKind::Starred(value) => {
                self.write("*");
                self.expr(value, Precedence::BitOr);
            }
            ExprKind::Name(id) => self.write(id),
            ExprKind::Tuple { elts, .. } => self.tuple_elements(elts),
            ExprKind::Slice { lower, upper, step } => {
                if let Some(lower) = lower {
                    self.expr(lower, Precedence::Test);
                }
                self.write(":");
                if let Some(upper) = upper {
                    self.expr(upper, Precedence::Test);
                }
                if let Some(step) = step {
                    self.write(":");
                    self.expr(step, Precedence::Test);
                }
            }
        }
    }

    fn constant(&mut self, value: &Constant) {
        let text = match value {
            Constant::None => "None",
            Constant::True => "True",
            Constant::False => "False",
            Constant::Ellipsis => "...",
            Constant::Number(text) => text,
        };
        self.write(text);
    }

    /// Tuple items; a single element keeps its trailing comma.
    fn tuple_elements(&mut self, elts: &[Expr]) {
        self.comma_separated(elts, Precedence::Test);
        if elts.len() == 1 {
            self.write(",");
        }
    }

    pub(crate) fn comma_separated(&mut self, elts: &[Expr], ctx: Precedence) {
        for (i, elt) in elts.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.expr(elt, ctx);
        }
    }

    fn comprehension_display(
        &mut self,
        open: &str,
        elt: &Expr,
        generators: &[Comprehension],
        close: &str,
    ) {
        self.write(open);
        self.expr(elt, Precedence::Test);
        self.comprehensions(generators);
        self.write(close);
    }

    fn comprehensions(&mut self, generators: &[Comprehension]) {
        for generator in generators {
            self.write(if generator.is_async {
                " async for "
            } else {
                " for "
            });
            self.expr(&generator.target, Precedence::Tuple);
            self.write(" in ");
            self.expr(&generator.iter, Precedence::Test.next());
            for cond in &generator.ifs {
                self.write(" if ");
                self.expr(cond, Precedence::Test.next());
            }
        }
    }

    /// Call or class-header arguments, without the parentheses.
    pub(crate) fn arguments(&mut self, args: &[Expr], keywords: &[Keyword]) {
        self.comma_separated(args, Precedence::Test);
        for (i, keyword) in keywords.iter().enumerate() {
            if i > 0 || !args.is_empty() {
                self.write(", ");
            }
            match &keyword.arg {
                Some(arg) => {
                    self.write(arg);
                    self.write("=");
                }
                None => self.write("**"),
            }
            self.expr(&keyword.value, Precedence::Test);
        }
    }

    pub(crate) fn parameters(&mut self, params: &Parameters) {
        let mut first = true;
        let mut sep = |printer: &mut Printer| {
            if !first {
                printer.write(", ");
            }
            first = false;
        };

        for param in &params.posonly {
            sep(self);
            self.param(param);
        }
        if !params.posonly.is_empty() {
            sep(self);
            self.write("/");
        }
        for param in &params.args {
            sep(self);
            self.param(param);
        }
        if let Some(vararg) = &params.vararg {
            sep(self);
            self.write("*");
            self.param(vararg);
        } else if !params.kwonly.is_empty() {
            sep(self);
            self.write("*");
        }
        for param in &params.kwonly {
            sep(self);
            self.param(param);
        }
        if let Some(kwarg) = &params.kwarg {
            sep(self);
            self.write("**");
            self.param(kwarg);
        }
    }

    fn param(&mut self, param: &Param) {
        self.write(&param.name);
        if let Some(annotation) = &param.annotation {
            self.write(": ");
            self.expr(annotation, Precedence::Test);
        }
        if let Some(default) = &param.default {
            self.write(if param.annotation.is_some() { " = " } else { "=" });
            self.expr(default, Precedence::Test);
        }
    }
}

/// `1 .real` needs a space so the dot is not read as a decimal point.
fn is_plain_integer(expr: &Expr) -> bool {
    matches!(
        &expr.kind,
        ExprKind::Constant(Constant::Number(text))
            if text.chars().all(|c| c.is_ascii_digit() || c == '_')
    )
}

#[cfg(test)]
mod tests {
    use ds_parser::parse_module;

    use crate::unparse;

    fn roundtrip(src: &str) -> String {
        unparse(&parse_module(src, "test.py").unwrap())
    }

    #[track_caller]
    fn assert_stable(src: &str) {
        assert_eq!(roundtrip(src), src);
    }

    #[test]
    fn precedence_is_preserved() {
        assert_stable("x = (a + b) * c");
        assert_stable("x = a + b * c");
        assert_stable("x = a - (b - c)");
        assert_stable("x = (a ** b) ** c");
        assert_stable("x = a ** b ** c");
        assert_stable("x = -a ** b");
        assert_stable("x = (-a) ** b");
        assert_stable("x = not (a and b) or c");
        assert_stable("x = (a or b) and c");
        assert_stable("x = a if b else c if d else e");
        assert_stable("x = (a if b else c) if d else e");
        assert_stable("x = (lambda: 1) if a else lambda y, *z: y");
        assert_stable("x = a < b is not c not in d");
    }

    #[test]
    fn redundant_parentheses_are_dropped() {
        assert_eq!(roundtrip("x = (a) + ((b))"), "x = a + b");
        assert_eq!(roundtrip("x = (await f())"), "x = await f()");
    }

    #[test]
    fn tuples_keep_source_parentheses() {
        assert_stable("x = 1, 2");
        assert_stable("x = (1, 2)");
        assert_stable("x = ()");
        assert_stable("x = (1,)");
        assert_stable("for a, b in items:\n    pass");
        assert_stable("f((a, b), c)");
    }

    #[test]
    fn displays_and_comprehensions() {
        assert_stable("x = [1, *rest]");
        assert_stable("x = {1, 2}");
        assert_stable("x = {'a': 1, **other}");
        assert_stable("x = {}");
        assert_stable("x = [y async for y in it if y if not z]");
        assert_stable("x = {k: v for k, v in pairs}");
        assert_stable("x = {s for s in (lambda: t)()}");
        assert_stable("x = sum(y for y in ys)");
        assert_stable("x = f((y for y in ys), 1)");
    }

    #[test]
    fn calls_subscripts_attributes() {
        assert_stable("f(a, *args, k=1, **kwargs)");
        assert_stable("x = a[1:2, ::3]");
        assert_stable("x = a[i,]");
        assert_stable("x = a[:]");
        assert_stable("x = a[(1, 2)]");
        assert_stable("x = 1 .real");
        assert_stable("x = 1.5.real");
        assert_stable("x = (a + b).c");
    }

    #[test]
    fn yield_and_named_expressions() {
        assert_stable("def f():\n    x = yield a, b\n    yield from g()\n    f((yield))");
        assert_stable("if (n := len(a)) > 10:\n    pass");
        assert_eq!(roundtrip("while chunk := read():\n    pass"), "while chunk := read():\n    pass");
        assert_stable("(y := 1)");
    }

    #[test]
    fn yield_is_parenthesized_outside_statement_values() {
        assert_stable(
            "\
def g():
    return (yield from y)
    for i in (yield):
        pass
    a[(yield)]
    if (yield):
        pass
    while (yield x):
        pass
    x = yield
    x += yield y
    x: int = yield
    x = (y := 1)
    yield",
        );
    }

    #[test]
    fn strings_are_verbatim() {
        assert_stable("x = 'a' \"b\" rb'\\x00' f'{y!r:>10}'");
        assert_stable("x = '''multi\nline'''");
    }
}
