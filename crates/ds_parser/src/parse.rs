use ds_ast::Module;
use ds_lexer::tokenize;

use crate::cursor::Parser;
use crate::ParseError;

/// Parse a Python module.
///
/// `filename` is only used in error messages.
pub fn parse_module(source: &str, filename: &str) -> Result<Module, ParseError> {
    let tokens = tokenize(source).map_err(|e| ParseError::from_lex(filename, e))?;
    tracing::trace!(filename, tokens = tokens.len(), "tokenized");

    let module = Parser::new(tokens, filename).module()?;
    tracing::debug!(filename, statements = module.body.len(), "parsed module");
    Ok(module)
}

#[cfg(test)]
mod tests {
    use ds_ast::{BoolOp, CmpOp, Expr, ExprKind, Operator, StmtKind, UnaryOp};

    use super::*;

    fn parse(src: &str) -> Module {
        parse_module(src, "test.py").unwrap()
    }

    fn only_stmt(src: &str) -> StmtKind {
        let module = parse(src);
        assert_eq!(module.body.len(), 1, "{:#?}", module.body);
        module.body.into_iter().next().unwrap().kind
    }

    fn only_expr(src: &str) -> ExprKind {
        match only_stmt(src) {
            StmtKind::Expr(e) => e.kind,
            other => panic!("not an expression statement: {other:?}"),
        }
    }

    #[test]
    fn async_function_with_await() {
        let StmtKind::AsyncFunctionDef(func) =
            only_stmt("async def fetch(aconn, *, n=1) -> int:\n    return await aconn.run(n)\n")
        else {
            panic!("expected async def");
        };
        assert_eq!(func.name, "fetch");
        assert_eq!(func.params.args[0].name, "aconn");
        assert_eq!(func.params.kwonly[0].name, "n");
        assert!(func.returns.is_some());
        let StmtKind::Return(Some(value)) = &func.body[0].kind else {
            panic!("expected return");
        };
        assert!(matches!(value.kind, ExprKind::Await(_)));
    }

    #[test]
    fn async_for_and_with() {
        let src = "async def f():\n    async with a as b, c:\n        async for x in b:\n            pass\n";
        let StmtKind::AsyncFunctionDef(func) = only_stmt(src) else {
            panic!();
        };
        let StmtKind::AsyncWith(with) = &func.body[0].kind else {
            panic!("expected async with");
        };
        assert_eq!(with.items.len(), 2);
        assert!(with.items[0].optional_vars.is_some());
        assert!(matches!(with.body[0].kind, StmtKind::AsyncFor(_)));
    }

    #[test]
    fn parenthesized_with_items() {
        let StmtKind::With(with) = only_stmt("with (\n    a as b,\n    c as d,\n):\n    pass\n")
        else {
            panic!();
        };
        assert_eq!(with.items.len(), 2);
    }

    #[test]
    fn parenthesized_context_expression_is_not_an_item_list() {
        let StmtKind::With(with) = only_stmt("with (a or b).lock:\n    pass\n") else {
            panic!();
        };
        assert_eq!(with.items.len(), 1);
        assert!(matches!(
            with.items[0].context_expr.kind,
            ExprKind::Attribute { .. }
        ));
    }

    #[test]
    fn statement_spans_cover_bodies() {
        let module = parse("def f():\n    a = 1\n\n    b = 2\n\nx = 3\n");
        assert_eq!(module.body[0].span.line, 1);
        assert_eq!(module.body[0].span.end_line, 4);
        assert_eq!(module.body[1].span.line, 6);
    }

    #[test]
    fn decorators_and_class() {
        let src = "@dataclass(frozen=True)\nclass AsyncCursor(Base, metaclass=M):\n    x: int = 0\n";
        let StmtKind::ClassDef(class) = only_stmt(src) else {
            panic!();
        };
        assert_eq!(class.name, "AsyncCursor");
        assert_eq!(class.decorators.len(), 1);
        assert_eq!(class.bases.len(), 1);
        assert_eq!(class.keywords[0].arg.as_deref(), Some("metaclass"));
        assert!(matches!(class.body[0].kind, StmtKind::AnnAssign { .. }));
    }

    #[test]
    fn comments_are_statements() {
        let module = parse("# leading\nx = 1  # trailing\n");
        assert_eq!(module.body.len(), 3);
        assert!(matches!(
            &module.body[0].kind,
            StmtKind::Comment { inline: false, text } if text == "# leading"
        ));
        assert!(matches!(
            module.body[2].kind,
            StmtKind::Comment { inline: true, .. }
        ));
    }

    #[test]
    fn header_comment_opens_the_body() {
        let StmtKind::If { body, .. } = only_stmt("if x:  # why\n    y()\n") else {
            panic!();
        };
        assert!(matches!(body[0].kind, StmtKind::Comment { inline: true, .. }));
        assert!(matches!(body[1].kind, StmtKind::Expr(_)));
    }

    #[test]
    fn comment_before_else_stays_in_previous_branch() {
        let src = "if a:\n    b()\n# done with a\nelse:\n    c()\n";
        let StmtKind::If { body, orelse, .. } = only_stmt(src) else {
            panic!();
        };
        assert_eq!(body.len(), 2);
        assert_eq!(orelse.len(), 1);
    }

    #[test]
    fn elif_chain_nests() {
        let StmtKind::If { orelse, .. } =
            only_stmt("if a:\n    pass\nelif b:\n    pass\nelse:\n    pass\n")
        else {
            panic!();
        };
        let StmtKind::If { orelse: inner, .. } = &orelse[0].kind else {
            panic!("expected nested if");
        };
        assert!(matches!(inner[0].kind, StmtKind::Pass));
    }

    #[test]
    fn try_statement() {
        let src = "try:\n    a()\nexcept (A, B) as e:\n    raise C from e\nexcept:\n    pass\nelse:\n    b()\nfinally:\n    c()\n";
        let StmtKind::Try(try_) = only_stmt(src) else {
            panic!();
        };
        assert_eq!(try_.handlers.len(), 2);
        assert_eq!(try_.handlers[0].name.as_deref(), Some("e"));
        assert!(try_.handlers[1].exc_type.is_none());
        assert_eq!(try_.orelse.len(), 1);
        assert_eq!(try_.finalbody.len(), 1);
        assert!(!try_.star);
    }

    #[test]
    fn imports() {
        let StmtKind::ImportFrom(import) =
            only_stmt("from ..utils import (alist, anext as nx,)\n")
        else {
            panic!();
        };
        assert_eq!(import.level, 2);
        assert_eq!(import.module.as_deref(), Some("utils"));
        assert_eq!(import.names[1].asname.as_deref(), Some("nx"));

        let StmtKind::ImportFrom(import) = only_stmt("from . import x\n") else {
            panic!();
        };
        assert_eq!((import.level, import.module), (1, None));

        let StmtKind::Import(names) = only_stmt("import os.path as p, sys\n") else {
            panic!();
        };
        assert_eq!(names[0].name, "os.path");
        assert_eq!(names[1].asname, None);
    }

    #[test]
    fn assignment_forms() {
        assert!(matches!(
            only_stmt("a = b = c\n"),
            StmtKind::Assign { targets, .. } if targets.len() == 2
        ));
        assert!(matches!(
            only_stmt("a, *b = c\n"),
            StmtKind::Assign { .. }
        ));
        assert!(matches!(
            only_stmt("x //= 2\n"),
            StmtKind::AugAssign {
                op: Operator::FloorDiv,
                ..
            }
        ));
        assert!(matches!(
            only_stmt("x: int\n"),
            StmtKind::AnnAssign { value: None, .. }
        ));
        assert!(matches!(
            only_stmt("x = yield y\n"),
            StmtKind::Assign { value: Expr { kind: ExprKind::Yield(Some(_)), .. }, .. }
        ));
    }

    #[test]
    fn semicolons_split_statements() {
        assert_eq!(parse("a = 1; b = 2;\n").body.len(), 2);
    }

    #[test]
    fn single_line_compound_body() {
        let StmtKind::While { body, .. } = only_stmt("while x: x -= 1; y()\n") else {
            panic!();
        };
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn operator_precedence() {
        let ExprKind::BinOp { op, right, .. } = only_expr("a + b * c\n") else {
            panic!();
        };
        assert_eq!(op, Operator::Add);
        assert!(matches!(right.kind, ExprKind::BinOp { op: Operator::Mult, .. }));

        let ExprKind::UnaryOp { op, operand } = only_expr("-a ** b\n") else {
            panic!();
        };
        assert_eq!(op, UnaryOp::USub);
        assert!(matches!(operand.kind, ExprKind::BinOp { op: Operator::Pow, .. }));

        let ExprKind::BoolOp { op, values } = only_expr("a or b or not c\n") else {
            panic!();
        };
        assert_eq!(op, BoolOp::Or);
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn comparisons_chain() {
        let ExprKind::Compare { ops, .. } = only_expr("a < b is not c not in d\n") else {
            panic!();
        };
        assert_eq!(ops, vec![CmpOp::Lt, CmpOp::IsNot, CmpOp::NotIn]);
    }

    #[test]
    fn await_binds_tighter_than_power_and_attribute_is_inside() {
        let ExprKind::BinOp { left, .. } = only_expr("await x.y ** 2\n") else {
            panic!();
        };
        let ExprKind::Await(inner) = left.kind else {
            panic!();
        };
        assert!(matches!(inner.kind, ExprKind::Attribute { .. }));
    }

    #[test]
    fn calls_subscripts_and_slices() {
        let ExprKind::Call { args, keywords, .. } = only_expr("f(a, *b, c=1, **d)\n") else {
            panic!();
        };
        assert_eq!(args.len(), 2);
        assert!(matches!(args[1].kind, ExprKind::Starred(_)));
        assert_eq!(keywords.len(), 2);
        assert_eq!(keywords[1].arg, None);

        let ExprKind::Subscript { slice, .. } = only_expr("x[1:2, ::3]\n") else {
            panic!();
        };
        let ExprKind::Tuple { elts, parenthesized } = slice.kind else {
            panic!();
        };
        assert!(!parenthesized);
        assert!(matches!(elts[1].kind, ExprKind::Slice { lower: None, upper: None, step: Some(_) }));
    }

    #[test]
    fn comprehensions() {
        assert!(matches!(
            only_expr("[x async for x in it if x]\n"),
            ExprKind::ListComp { generators, .. } if generators[0].is_async && generators[0].ifs.len() == 1
        ));
        assert!(matches!(
            only_expr("{k: v for k, v in d.items()}\n"),
            ExprKind::DictComp { .. }
        ));
        assert!(matches!(only_expr("{a, *b}\n"), ExprKind::Set(_)));
        assert!(matches!(
            only_expr("{**a, 'b': 1}\n"),
            ExprKind::Dict(items) if items[0].key.is_none()
        ));
        assert!(matches!(
            only_expr("sum(x for x in y)\n"),
            ExprKind::Call { args, .. } if matches!(args[0].kind, ExprKind::GeneratorExp { .. })
        ));
    }

    #[test]
    fn tuples_remember_parentheses() {
        assert!(matches!(
            only_expr("(a, b)\n"),
            ExprKind::Tuple { parenthesized: true, .. }
        ));
        assert!(matches!(
            only_expr("a, b\n"),
            ExprKind::Tuple { parenthesized: false, .. }
        ));
        assert!(matches!(
            only_expr("()\n"),
            ExprKind::Tuple { parenthesized: true, .. }
        ));
        assert!(matches!(only_expr("(a)\n"), ExprKind::Name(_)));
    }

    #[test]
    fn lambda_and_ternary() {
        let ExprKind::Lambda { params, body } = only_expr("lambda x, *a, k=1, **kw: x if k else a\n")
        else {
            panic!();
        };
        assert_eq!(params.args.len(), 1);
        assert!(params.vararg.is_some());
        assert_eq!(params.kwonly.len(), 1);
        assert!(params.kwarg.is_some());
        assert!(matches!(body.kind, ExprKind::IfExp { .. }));
    }

    #[test]
    fn positional_only_parameters() {
        let StmtKind::FunctionDef(func) = only_stmt("def f(a, /, b, *args, c, **kw):\n    pass\n")
        else {
            panic!();
        };
        assert_eq!(func.params.posonly.len(), 1);
        assert_eq!(func.params.args.len(), 1);
        assert_eq!(func.params.vararg.as_ref().unwrap().name, "args");
        assert_eq!(func.params.kwonly[0].name, "c");
    }

    #[test]
    fn string_concatenation_and_docstring() {
        let module = parse("\"\"\"Async module.\"\"\"\nx = 'a' 'b'\n");
        let StmtKind::Expr(doc) = &module.body[0].kind else {
            panic!();
        };
        assert!(matches!(&doc.kind, ExprKind::Str(lit) if lit.parts.len() == 1));
        let StmtKind::Assign { value, .. } = &module.body[1].kind else {
            panic!();
        };
        assert!(matches!(&value.kind, ExprKind::Str(lit) if lit.parts.len() == 2));
    }

    #[test]
    fn walrus() {
        let StmtKind::If { test, .. } = only_stmt("if (n := len(a)) > 10:\n    pass\n") else {
            panic!();
        };
        let ExprKind::Compare { left, .. } = test.kind else {
            panic!();
        };
        assert!(matches!(left.kind, ExprKind::NamedExpr { .. }));
    }

    #[test]
    fn errors_name_file_and_position() {
        let err = parse_module("x = (1,\n", "broken.py").unwrap_err();
        assert_eq!(err.filename, "broken.py");
        assert_eq!(err.line, 1);

        let err = parse_module("def f()\n    pass\n", "broken.py").unwrap_err();
        assert_eq!((err.line, err.col), (1, 7));
        assert!(err.to_string().starts_with("broken.py:1:7: "));

        let err = parse_module("  x = 1\n", "indent.py").unwrap_err();
        assert_eq!(err.message, "unexpected indent");

        let err = parse_module("if x:\npass\n", "block.py").unwrap_err();
        assert_eq!(err.message, "expected an indented block");

        let err = parse_module("x = = 1\n", "syntax.py").unwrap_err();
        assert_eq!((err.line, err.col), (1, 4));
    }
}
