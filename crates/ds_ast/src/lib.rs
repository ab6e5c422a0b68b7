//! Python syntax tree for desync.
//!
//! Mirrors the shape of the standard Python AST closely enough for the
//! async-to-sync rewrite, with two additions:
//! - comments are statements (`StmtKind::Comment`), so they survive the
//!   rewrite and can be emitted back in place;
//! - `StmtKind::Blank` marks a blank line between two statements.
//!
//! Async constructs have their own variants (`AsyncFunctionDef`, `AsyncFor`,
//! `AsyncWith`, `ExprKind::Await`) sharing the payload of their sync twins,
//! so desugaring is a variant swap.

use std::fmt;

use serde::Serialize;

pub mod visit;

pub use visit::{VisitMut, VisitMutWith};

/// Source position of a node. Only consulted for layout decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub line: u32,
    pub col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(line: u32, col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            line,
            col,
            end_line,
            end_col,
        }
    }

    /// A span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            line: self.line,
            col: self.col,
            end_line: other.end_line,
            end_col: other.end_col,
        }
    }

    /// A zero-width span at the start of `line`.
    pub fn empty_line(line: u32) -> Span {
        Span::new(line, 0, line, 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Module {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// A blank-line marker sitting on `line`.
    pub fn blank(line: u32) -> Self {
        Self::new(StmtKind::Blank, Span::empty_line(line))
    }

    /// True for statements that carry code, as opposed to comments and
    /// blank markers.
    pub fn is_code(&self) -> bool {
        !matches!(self.kind, StmtKind::Comment { .. } | StmtKind::Blank)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StmtKind {
    FunctionDef(FunctionDef),
    AsyncFunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Return(Option<Expr>),
    Delete(Vec<Expr>),
    Assign {
        targets: Vec<Expr>,
        value: Expr,
    },
    AugAssign {
        target: Expr,
        op: Operator,
        value: Expr,
    },
    AnnAssign {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
        /// A bare name target, as opposed to `(x): int` or `a.b: int`.
        simple: bool,
    },
    For(For),
    AsyncFor(For),
    While {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    With(With),
    AsyncWith(With),
    Raise {
        exc: Option<Expr>,
        cause: Option<Expr>,
    },
    Try(Try),
    Assert {
        test: Expr,
        msg: Option<Expr>,
    },
    Import(Vec<Alias>),
    ImportFrom(ImportFrom),
    Global(Vec<String>),
    Nonlocal(Vec<String>),
    Expr(Expr),
    Pass,
    Break,
    Continue,
    /// A `#` comment, text included. `inline` comments trail the previous
    /// line instead of standing on their own.
    Comment {
        text: String,
        inline: bool,
    },
    /// Blank-line marker. Carries no payload.
    Blank,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDef {
    pub name: String,
    pub params: Parameters,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
    pub returns: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<Expr>,
    pub keywords: Vec<Keyword>,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct For {
    pub target: Expr,
    pub iter: Expr,
    pub body: Vec<Stmt>,
    pub orelse: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct With {
    pub items: Vec<WithItem>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithItem {
    pub context_expr: Expr,
    pub optional_vars: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Try {
    pub body: Vec<Stmt>,
    pub handlers: Vec<ExceptHandler>,
    pub orelse: Vec<Stmt>,
    pub finalbody: Vec<Stmt>,
    /// `except*` handlers.
    pub star: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExceptHandler {
    pub exc_type: Option<Expr>,
    pub name: Option<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alias {
    pub name: String,
    pub asname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFrom {
    /// Dotted module path without the leading dots.
    pub module: Option<String>,
    pub names: Vec<Alias>,
    /// Number of leading dots.
    pub level: u32,
}

/// Parameter list of a `def` or `lambda`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Parameters {
    pub posonly: Vec<Param>,
    pub args: Vec<Param>,
    pub vararg: Option<Param>,
    pub kwonly: Vec<Param>,
    pub kwarg: Option<Param>,
}

impl Parameters {
    pub fn is_empty(&self) -> bool {
        self.posonly.is_empty()
            && self.args.is_empty()
            && self.vararg.is_none()
            && self.kwonly.is_empty()
            && self.kwarg.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub annotation: Option<Expr>,
    pub default: Option<Expr>,
}

/// `name=value` in a call or class header; `arg` is `None` for `**value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyword {
    pub arg: Option<String>,
    pub value: Expr,
}

/// One `for ... in ... if ...` clause of a comprehension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comprehension {
    pub target: Expr,
    pub iter: Expr,
    pub ifs: Vec<Expr>,
    pub is_async: bool,
}

/// `key: value` in a dict display; `key` is `None` for `**value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DictItem {
    pub key: Option<Expr>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn name(id: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Name(id.into()), span)
    }

    /// Move the expression out, leaving `None` behind.
    pub fn take(&mut self) -> Expr {
        let placeholder = Expr::new(ExprKind::Constant(Constant::None), self.span);
        std::mem::replace(self, placeholder)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprKind {
    BoolOp {
        op: BoolOp,
        values: Vec<Expr>,
    },
    NamedExpr {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    BinOp {
        left: Box<Expr>,
        op: Operator,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Lambda {
        params: Box<Parameters>,
        body: Box<Expr>,
    },
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Dict(Vec<DictItem>),
    Set(Vec<Expr>),
    ListComp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    SetComp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    DictComp {
        key: Box<Expr>,
        value: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    GeneratorExp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    Await(Box<Expr>),
    Yield(Option<Box<Expr>>),
    YieldFrom(Box<Expr>),
    Compare {
        left: Box<Expr>,
        ops: Vec<CmpOp>,
        comparators: Vec<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
    },
    Constant(Constant),
    Str(StrLit),
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        slice: Box<Expr>,
    },
    Starred(Box<Expr>),
    Name(String),
    List(Vec<Expr>),
    Tuple {
        elts: Vec<Expr>,
        /// Whether the source wrapped the tuple in parentheses.
        parenthesized: bool,
    },
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Constant {
    None,
    True,
    False,
    Ellipsis,
    /// Numeric literal, spelled as in the source.
    Number(String),
}

/// One string literal, possibly made of several implicitly concatenated
/// tokens. Each part is the raw token text, prefix and quotes included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrLit {
    pub parts: Vec<String>,
}

impl StrLit {
    pub fn new(parts: Vec<String>) -> Self {
        Self { parts }
    }

    /// Replace every occurrence of `from` with `to` in the literal text.
    pub fn replace_text(&mut self, from: &str, to: &str) {
        for part in &mut self.parts {
            let (prefix, body) = split_string_prefix(part);
            let replaced = format!("{prefix}{}", body.replace(from, to));
            *part = replaced;
        }
    }
}

/// Split a raw string token into its prefix letters and the quoted rest.
pub fn split_string_prefix(raw: &str) -> (&str, &str) {
    let idx = raw.find(['\'', '"']).unwrap_or(0);
    raw.split_at(idx)
}

/// True when the raw string token is an f-string.
pub fn is_fstring(raw: &str) -> bool {
    split_string_prefix(raw)
        .0
        .chars()
        .any(|c| c == 'f' || c == 'F')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    Add,
    Sub,
    Mult,
    MatMult,
    Div,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
    FloorDiv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOp {
    Invert,
    Not,
    UAdd,
    USub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolOp::And => write!(f, "and"),
            BoolOp::Or => write!(f, "or"),
        }
    }
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mult => "*",
            Operator::MatMult => "@",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::Pow => "**",
            Operator::LShift => "<<",
            Operator::RShift => ">>",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
            Operator::BitAnd => "&",
            Operator::FloorDiv => "//",
        }
    }

    /// Map an augmented-assignment token (`+=`, `//=`, ...) to its operator.
    pub fn from_augassign(op: &str) -> Option<Operator> {
        let base = op.strip_suffix('=')?;
        Operator::from_binary(base)
    }

    pub fn from_binary(op: &str) -> Option<Operator> {
        let op = match op {
            "+" => Operator::Add,
            "-" => Operator::Sub,
            "*" => Operator::Mult,
            "@" => Operator::MatMult,
            "/" => Operator::Div,
            "%" => Operator::Mod,
            "**" => Operator::Pow,
            "<<" => Operator::LShift,
            ">>" => Operator::RShift,
            "|" => Operator::BitOr,
            "^" => Operator::BitXor,
            "&" => Operator::BitAnd,
            "//" => Operator::FloorDiv,
            _ => return None,
        };
        Some(op)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Invert => write!(f, "~"),
            UnaryOp::Not => write!(f, "not "),
            UnaryOp::UAdd => write!(f, "+"),
            UnaryOp::USub => write!(f, "-"),
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtE => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtE => ">=",
            CmpOp::Is => "is",
            CmpOp::IsNot => "is not",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn augassign_operators_map_to_binary_ones() {
        assert_eq!(Operator::from_augassign("+="), Some(Operator::Add));
        assert_eq!(Operator::from_augassign("//="), Some(Operator::FloorDiv));
        assert_eq!(Operator::from_augassign("**="), Some(Operator::Pow));
        assert_eq!(Operator::from_augassign("=="), None);
    }

    #[test]
    fn string_prefix_detection() {
        assert_eq!(split_string_prefix("rb'x'"), ("rb", "'x'"));
        assert!(is_fstring("f\"{a}\""));
        assert!(is_fstring("Rf'{a}'"));
        assert!(!is_fstring("'''f'''"));
    }

    #[test]
    fn replace_text_keeps_prefix() {
        let mut lit = StrLit::new(vec!["f'AsyncThing'".to_string()]);
        lit.replace_text("Async", "");
        assert_eq!(lit.parts, vec!["f'Thing'".to_string()]);
    }

    #[test]
    fn take_leaves_none_behind() {
        let mut e = Expr::name("x", Span::new(1, 0, 1, 1));
        let taken = e.take();
        assert_eq!(taken.kind, ExprKind::Name("x".into()));
        assert_eq!(e.kind, ExprKind::Constant(Constant::None));
    }
}
