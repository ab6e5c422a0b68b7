//! Serializer turning a desync tree back into Python source.
//!
//! Output is canonical: one statement per line, four-space indentation and
//! parentheses only where operator precedence needs them (tuples keep their
//! source parentheses). Comments and blank markers are emitted in place.

mod expr;
mod printer;

use std::path::Path;

use ds_ast::Module;

use printer::Printer;

/// Render a module without banner. The result has no trailing newline.
pub fn unparse(module: &Module) -> String {
    let mut printer = Printer::default();
    printer.module(module);
    printer.finish()
}

/// Render a generated module: banner, body and a final newline.
///
/// `tool` is the name of the generating program, `filename` the file the
/// module was generated from (only its base name appears in the output).
pub fn tree_to_str(module: &Module, filename: &str, tool: &str) -> String {
    let source_name = Path::new(filename)
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_else(|| filename.into());

    let mut out = banner(tool, &source_name);
    out.push_str(&unparse(module));
    out.push('\n');
    out
}

fn banner(tool: &str, source_name: &str) -> String {
    format!(
        "# WARNING: this file is auto-generated by '{tool}'\n\
         # from the original file '{source_name}'\n\
         # DO NOT CHANGE! Change the original file instead.\n"
    )
}

#[cfg(test)]
mod tests {
    use ds_parser::parse_module;

    use super::*;

    fn roundtrip(src: &str) -> String {
        let module = parse_module(src, "test.py").unwrap();
        unparse(&module)
    }

    #[test]
    fn banner_uses_base_names() {
        let module = parse_module("x = 1\n", "psycopg/cursor_async.py").unwrap();
        let out = tree_to_str(&module, "psycopg/cursor_async.py", "async_to_sync.py");
        assert_eq!(
            out,
            "# WARNING: this file is auto-generated by 'async_to_sync.py'\n\
             # from the original file 'cursor_async.py'\n\
             # DO NOT CHANGE! Change the original file instead.\n\
             x = 1\n"
        );
    }

    #[test]
    fn empty_module_still_gets_banner() {
        let out = tree_to_str(&Module::default(), "a.py", "tool");
        assert!(out.starts_with("# WARNING: this file is auto-generated by 'tool'\n"));
        assert!(out.ends_with("instead.\n\n"));
    }

    #[test]
    fn canonical_statements() {
        let src = "\
import os.path as p, sys
from ..pq import (Format,
    Escaping as E)
from . import *
def f(a, /, b: int=1, *args, c, d=2, **kw) -> None:
    global g
    del a[0], b
    x = y = (1, 2)
    x += 1
    n: int
    return a, b
";
        let expected = "\
import os.path as p, sys
from ..pq import Format, Escaping as E
from . import *
def f(a, /, b: int = 1, *args, c, d=2, **kw) -> None:
    global g
    del a[0], b
    x = y = (1, 2)
    x += 1
    n: int
    return a, b";
        assert_eq!(roundtrip(src), expected);
    }

    #[test]
    fn annotated_targets_keep_parentheses() {
        assert_eq!(roundtrip("x: int = 1\n"), "x: int = 1");
        assert_eq!(roundtrip("(x): int = 1\n"), "(x): int = 1");
        assert_eq!(roundtrip("(a.b): int\n"), "a.b: int");
    }

    #[test]
    fn compound_statements() {
        let src = "\
@dec
@other(1)
class A(B, metaclass=M):
    async def m(self):
        async with a as b, c:
            async for x in b:
                await x
            else:
                pass
        try:
            pass
        except* (E1, E2) as e:
            raise X from e
        else:
            pass
        finally:
            pass
        while x:
            break
        else:
            continue
        if a:
            pass
        elif b:
            pass
        else:
            pass
";
        let expected = src.trim_end();
        assert_eq!(roundtrip(src), expected);
    }

    #[test]
    fn single_line_bodies_are_expanded() {
        assert_eq!(
            roundtrip("if x: a = 1; b = 2\n"),
            "if x:\n    a = 1\n    b = 2"
        );
    }

    #[test]
    fn comments_stay_in_place() {
        let src = "\
# leading
x = 1  # trailing
def f():  # header
    # body
    pass
";
        assert_eq!(roundtrip(src), src.trim_end());
    }

    #[test]
    fn blank_markers_collapse_and_trim() {
        use ds_ast::{Span, Stmt, StmtKind};

        let sp = Span::new(1, 0, 1, 0);
        let module = Module {
            body: vec![
                Stmt::blank(1),
                Stmt::new(StmtKind::Pass, sp),
                Stmt::blank(2),
                Stmt::blank(3),
                Stmt::new(StmtKind::Break, sp),
                Stmt::blank(4),
            ],
        };
        assert_eq!(unparse(&module), "pass\n\nbreak");
    }

    #[test]
    fn code_less_block_gets_pass() {
        use ds_ast::StmtKind;

        let mut module = parse_module("if x:\n    # only this\n    y = 1\n", "t.py").unwrap();
        let StmtKind::If { body, .. } = &mut module.body[0].kind else {
            panic!();
        };
        body.pop();
        assert_eq!(unparse(&module), "if x:\n    # only this\n    pass");
    }
}
