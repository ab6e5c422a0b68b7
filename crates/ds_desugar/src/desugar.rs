//! Rewrite async constructs into their synchronous forms.
//!
//! - `async def` → `def`
//! - `async for` → `for`
//! - `async with` → `with`
//! - `await x`   → `x`
//! - `[.. async for ..]` → `[.. for ..]`

use ds_ast::{Comprehension, Expr, ExprKind, Stmt, StmtKind, VisitMut, VisitMutWith};

pub struct AsyncToSync;

impl VisitMut for AsyncToSync {
    fn visit_mut_stmt(&mut self, node: &mut Stmt) {
        let kind = std::mem::replace(&mut node.kind, StmtKind::Pass);
        node.kind = match kind {
            StmtKind::AsyncFunctionDef(func) => {
                tracing::trace!(name = %func.name, line = node.span.line, "async def");
                StmtKind::FunctionDef(func)
            }
            StmtKind::AsyncFor(for_) => {
                tracing::trace!(line = node.span.line, "async for");
                StmtKind::For(for_)
            }
            StmtKind::AsyncWith(with) => {
                tracing::trace!(line = node.span.line, "async with");
                StmtKind::With(with)
            }
            other => other,
        };
        node.visit_mut_children_with(self);
    }

    fn visit_mut_expr(&mut self, node: &mut Expr) {
        while let ExprKind::Await(value) = &mut node.kind {
            let value = value.take();
            *node = value;
        }
        node.visit_mut_children_with(self);
    }

    fn visit_mut_comprehension(&mut self, node: &mut Comprehension) {
        node.is_async = false;
        node.visit_mut_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use ds_codegen::unparse;
    use ds_parser::parse_module;

    use super::*;

    fn desugar(src: &str) -> String {
        let mut module = parse_module(src, "test.py").unwrap();
        module.visit_mut_with(&mut AsyncToSync);
        unparse(&module)
    }

    #[test]
    fn async_def_keeps_everything_else() {
        assert_eq!(
            desugar("@deco\nasync def f(a, *, b=1) -> int:\n    return a\n"),
            "@deco\ndef f(a, *, b=1) -> int:\n    return a"
        );
    }

    #[test]
    fn async_for_and_with() {
        let src = "\
async def f(it):
    async with lock as l, other:
        async for x in it:
            pass
        else:
            pass
";
        let expected = "\
def f(it):
    with lock as l, other:
        for x in it:
            pass
        else:
            pass";
        assert_eq!(desugar(src), expected);
    }

    #[test]
    fn awaits_are_unwrapped() {
        assert_eq!(desugar("x = await f(await g())"), "x = f(g())");
        assert_eq!(desugar("x = await (await f())"), "x = f()");
        assert_eq!(desugar("x = (await a.b) ** 2"), "x = a.b ** 2");
        assert_eq!(desugar("x = (await a) + 1"), "x = a + 1");
    }

    #[test]
    fn async_comprehensions() {
        assert_eq!(
            desugar("x = [await y async for y in it]"),
            "x = [y for y in it]"
        );
        assert_eq!(
            desugar("x = {k: v async for k, v in it}"),
            "x = {k: v for k, v in it}"
        );
    }

    #[test]
    fn sync_input_is_unchanged() {
        let src = "def f(x):\n    with a:\n        for i in x:\n            yield i";
        assert_eq!(desugar(src), src);
    }

    #[test]
    fn nested_definitions() {
        let src = "async def outer():\n    async def inner():\n        await x\n    return inner";
        assert_eq!(
            desugar(src),
            "def outer():\n    def inner():\n        x\n    return inner"
        );
    }
}
