//! Token cursor shared by the statement and expression parsers.

use ds_ast::{Module, Span, Stmt, StmtKind};
use ds_lexer::{Token, TokenKind};

use crate::ParseError;

pub(crate) type PResult<T> = Result<T, ParseError>;

/// Hard keywords: never valid as a plain name.
const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

pub(crate) fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

pub(crate) struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    filename: &'a str,
    /// End of the last consumed token that carries text.
    prev_end: (u32, u32),
}

impl<'a> Parser<'a> {
    pub(crate) fn new(tokens: Vec<Token>, filename: &'a str) -> Self {
        Self {
            tokens,
            pos: 0,
            filename,
            prev_end: (1, 0),
        }
    }

    pub(crate) fn module(mut self) -> PResult<Module> {
        let mut body = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::EndMarker => break,
                TokenKind::Newline => {
                    self.bump();
                }
                _ => body.extend(self.statement()?),
            }
        }
        Ok(Module { body })
    }

    /// Parse the body that follows a compound statement's `:`.
    pub(crate) fn block(&mut self) -> PResult<Vec<Stmt>> {
        if !self.at_line_end() {
            return self.simple_line();
        }

        let mut body = Vec::new();
        body.extend(self.inline_comment());
        self.expect_newline()?;
        while self.peek().kind == TokenKind::Comment {
            body.push(self.comment());
        }
        if self.peek().kind != TokenKind::Indent {
            return Err(self.error("expected an indented block"));
        }
        self.bump();
        while !matches!(self.peek().kind, TokenKind::Dedent | TokenKind::EndMarker) {
            if self.peek().kind == TokenKind::Newline {
                self.bump();
                continue;
            }
            body.extend(self.statement()?);
        }
        if self.peek().kind == TokenKind::Dedent {
            self.bump();
        }
        Ok(body)
    }

    /// Look past comments for one of `keywords` continuing the current
    /// compound statement (`elif`, `else`, `except`, `finally`). When found,
    /// the skipped comments are appended to `body`, the branch they follow.
    pub(crate) fn continuation(
        &mut self,
        body: &mut Vec<Stmt>,
        keywords: &[&'static str],
    ) -> Option<&'static str> {
        let mut i = self.pos;
        while self.tokens.get(i).is_some_and(|t| t.kind == TokenKind::Comment) {
            i += 1;
        }
        let token = self.tokens.get(i)?;
        let keyword = keywords.iter().copied().find(|kw| token.is_keyword(kw))?;
        while self.pos < i {
            body.push(self.comment());
        }
        Some(keyword)
    }

    /// Consume a comment token as a statement.
    pub(crate) fn comment(&mut self) -> Stmt {
        let token = self.bump();
        let span = Span::new(token.line, token.col, token.end_line, token.end_col);
        Stmt::new(
            StmtKind::Comment {
                text: token.text,
                inline: token.inline,
            },
            span,
        )
    }

    /// A trailing comment before the end of the line, if any.
    pub(crate) fn inline_comment(&mut self) -> Option<Stmt> {
        let token = self.peek();
        (token.kind == TokenKind::Comment && token.inline).then(|| self.comment())
    }

    pub(crate) fn at_line_end(&self) -> bool {
        let token = self.peek();
        token.kind == TokenKind::Newline || (token.kind == TokenKind::Comment && token.inline)
    }

    pub(crate) fn expect_newline(&mut self) -> PResult<()> {
        match self.peek().kind {
            TokenKind::Newline => {
                self.bump();
                Ok(())
            }
            TokenKind::EndMarker => Ok(()),
            _ => Err(self.error("invalid syntax")),
        }
    }

    pub(crate) fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    pub(crate) fn peek_nth(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    pub(crate) fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        if !matches!(
            token.kind,
            TokenKind::Indent | TokenKind::Dedent | TokenKind::Newline | TokenKind::EndMarker
        ) {
            self.prev_end = (token.end_line, token.end_col);
        }
        token
    }

    /// Text of the next token when it is a name, empty otherwise.
    pub(crate) fn head(&self) -> String {
        let token = self.peek();
        if token.kind == TokenKind::Name {
            token.text.clone()
        } else {
            String::new()
        }
    }

    pub(crate) fn at_op(&self, op: &str) -> bool {
        self.peek().is_op(op)
    }

    pub(crate) fn at_keyword(&self, kw: &str) -> bool {
        self.peek().is_keyword(kw)
    }

    pub(crate) fn eat_op(&mut self, op: &str) -> bool {
        if self.at_op(op) {
            self.bump();
            return true;
        }
        false
    }

    pub(crate) fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.at_keyword(kw) {
            self.bump();
            return true;
        }
        false
    }

    pub(crate) fn expect_op(&mut self, op: &str) -> PResult<Token> {
        if self.at_op(op) {
            return Ok(self.bump());
        }
        Err(self.error(&format!("expected '{op}'")))
    }

    pub(crate) fn expect_keyword(&mut self, kw: &str) -> PResult<Token> {
        if self.at_keyword(kw) {
            return Ok(self.bump());
        }
        Err(self.error(&format!("expected '{kw}'")))
    }

    /// An identifier that is not a keyword.
    pub(crate) fn expect_name(&mut self) -> PResult<String> {
        let token = self.peek();
        if token.kind == TokenKind::Name && !is_keyword(&token.text) {
            return Ok(self.bump().text);
        }
        Err(self.error("expected name"))
    }

    /// Position of the next token, for building spans.
    pub(crate) fn start(&self) -> (u32, u32) {
        let token = self.peek();
        (token.line, token.col)
    }

    /// Span from `start` to the end of the last consumed token.
    pub(crate) fn span_from(&self, start: (u32, u32)) -> Span {
        Span::new(start.0, start.1, self.prev_end.0, self.prev_end.1)
    }

    pub(crate) fn save(&self) -> (usize, (u32, u32)) {
        (self.pos, self.prev_end)
    }

    pub(crate) fn restore(&mut self, saved: (usize, (u32, u32))) {
        self.pos = saved.0;
        self.prev_end = saved.1;
    }

    pub(crate) fn error(&self, message: &str) -> ParseError {
        let token = self.peek();
        let message = match token.kind {
            TokenKind::Indent if message == "invalid syntax" => "unexpected indent",
            _ => message,
        };
        ParseError {
            filename: self.filename.to_string(),
            line: token.line,
            col: token.col,
            message: message.to_string(),
        }
    }
}
