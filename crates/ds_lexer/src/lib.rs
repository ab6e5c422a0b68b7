//! Python tokenizer for desync.
//!
//! Produces the usual NAME / NUMBER / STRING / OP / NEWLINE / INDENT /
//! DEDENT stream, with two twists needed to carry comments through the
//! rewrite:
//!
//! - Comments are tokens. A comment after code on the same physical line is
//!   marked `inline`; a comment on its own line is standalone.
//! - Comments inside brackets cannot live inside an expression tree, so they
//!   are hoisted in front of the logical line that contains them, as
//!   standalone comments positioned on that line's first line.
//!
//! String tokens keep their raw text (prefix and quotes included).

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Name,
    Number,
    String,
    Op,
    Newline,
    Indent,
    Dedent,
    Comment,
    EndMarker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    pub col: u32,
    pub end_line: u32,
    pub end_col: u32,
    /// Comments only: code precedes the comment on its line.
    pub inline: bool,
}

impl Token {
    /// True for an operator or delimiter token spelled `op`.
    pub fn is_op(&self, op: &str) -> bool {
        self.kind == TokenKind::Op && self.text == op
    }

    /// True for a name token spelled `kw`.
    pub fn is_keyword(&self, kw: &str) -> bool {
        self.kind == TokenKind::Name && self.text == kw
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated triple-quoted string literal")]
    UnterminatedTripleString,
    #[error("unindent does not match any outer indentation level")]
    InconsistentDedent,
    #[error("closing '{found}' does not match opening '{expected}'")]
    MismatchedBracket { expected: char, found: char },
    #[error("unmatched '{0}'")]
    UnmatchedBracket(char),
    #[error("'{0}' was never closed")]
    UnclosedBracket(char),
    #[error("unexpected character after line continuation character")]
    BadContinuation,
    #[error("invalid character '{0}'")]
    InvalidCharacter(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{col}: {kind}")]
pub struct LexError {
    pub line: u32,
    pub col: u32,
    pub kind: LexErrorKind,
}

const THREE_CHAR_OPS: &[&str] = &["**=", "//=", ">>=", "<<=", "..."];
const TWO_CHAR_OPS: &[&str] = &[
    "**", "//", "<<", ">>", "<=", ">=", "==", "!=", "->", ":=", "+=", "-=", "*=", "/=", "%=",
    "&=", "|=", "^=", "@=",
];
const ONE_CHAR_OPS: &str = "+-*/%@&|^~<>()[]{},:;.=";

const STRING_PREFIXES: &[&str] = &["r", "u", "b", "f", "br", "rb", "fr", "rf"];

/// Tokenize a Python source string.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let normalized = source.replace("\r\n", "\n");
    Lexer::new(&normalized).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    col: u32,
    tokens: Vec<Token>,
    indents: Vec<u32>,
    /// Open brackets with their positions.
    brackets: Vec<(char, u32, u32)>,
    at_line_start: bool,
    /// Index of the first token of the current logical line.
    logical_start: usize,
    logical_line: u32,
    logical_col: u32,
    hoisted: usize,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 0,
            tokens: Vec::new(),
            indents: vec![0],
            brackets: Vec::new(),
            at_line_start: true,
            logical_start: 0,
            logical_line: 1,
            logical_col: 0,
            hoisted: 0,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        loop {
            if self.at_line_start {
                if !self.start_line()? {
                    break;
                }
                continue;
            }

            let Some(c) = self.peek() else {
                break;
            };

            match c {
                ' ' | '\t' | '\x0c' => self.bump(),
                '#' => self.comment(),
                '\\' => self.continuation()?,
                '\n' => {
                    if self.brackets.is_empty() {
                        self.push(TokenKind::Newline, "\n".into(), self.line, self.col);
                        self.at_line_start = true;
                    }
                    self.bump();
                }
                '"' | '\'' => self.string(self.pos, self.line, self.col)?,
                c if c.is_ascii_digit() => self.number(),
                '.' if self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) => self.number(),
                c if is_name_start(c) => self.name()?,
                _ => self.operator()?,
            }
        }

        if let Some(&(open, line, col)) = self.brackets.first() {
            return Err(LexError {
                line,
                col,
                kind: LexErrorKind::UnclosedBracket(open),
            });
        }
        if !self.at_line_start {
            self.push(TokenKind::Newline, String::new(), self.line, self.col);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(TokenKind::Dedent, String::new(), self.line, 0);
        }
        self.push(TokenKind::EndMarker, String::new(), self.line, 0);
        Ok(self.tokens)
    }

    /// Handle the start of a physical line outside brackets. Returns `false`
    /// at end of input.
    fn start_line(&mut self) -> Result<bool, LexError> {
        let indent = self.measure_indent();
        match self.peek() {
            None => Ok(false),
            Some('\n') => {
                self.bump();
                Ok(true)
            }
            Some('#') => {
                self.standalone_comment(indent);
                Ok(true)
            }
            Some(_) => {
                self.indentation(indent)?;
                self.at_line_start = false;
                self.logical_start = self.tokens.len();
                self.logical_line = self.line;
                self.logical_col = self.col;
                self.hoisted = 0;
                Ok(true)
            }
        }
    }

    fn measure_indent(&mut self) -> u32 {
        let mut width = 0;
        while let Some(c) = self.peek() {
            match c {
                ' ' => width += 1,
                '\t' => width = (width / 8 + 1) * 8,
                '\x0c' => width = 0,
                _ => break,
            }
            self.bump();
        }
        width
    }

    fn indentation(&mut self, indent: u32) -> Result<(), LexError> {
        let top = self.current_indent();
        if indent > top {
            self.indents.push(indent);
            self.push(TokenKind::Indent, String::new(), self.line, 0);
            return Ok(());
        }
        while indent < self.current_indent() {
            self.indents.pop();
            self.push(TokenKind::Dedent, String::new(), self.line, 0);
        }
        if indent != self.current_indent() {
            return Err(LexError {
                line: self.line,
                col: indent,
                kind: LexErrorKind::InconsistentDedent,
            });
        }
        Ok(())
    }

    fn current_indent(&self) -> u32 {
        self.indents.last().copied().unwrap_or(0)
    }

    /// A comment alone on its line. When it sits left of the current block
    /// and the code after it dedents, it belongs to the outer block.
    fn standalone_comment(&mut self, col: u32) {
        if col < self.current_indent() {
            let target = col.max(self.next_code_indent());
            while self.current_indent() > target {
                self.indents.pop();
                self.push(TokenKind::Dedent, String::new(), self.line, 0);
            }
        }

        let (line, start) = (self.line, self.pos);
        self.skip_to_eol();
        let text = self.text_from(start);
        let end_col = self.col;
        self.tokens.push(Token {
            kind: TokenKind::Comment,
            text,
            line,
            col,
            end_line: line,
            end_col,
            inline: false,
        });
    }

    /// Indentation of the next line holding code, or 0 at end of input.
    fn next_code_indent(&self) -> u32 {
        let mut i = self.pos;
        // Skip the rest of the current line.
        while i < self.chars.len() && self.chars[i] != '\n' {
            i += 1;
        }
        while i < self.chars.len() {
            i += 1;
            let mut width = 0;
            while i < self.chars.len() {
                match self.chars[i] {
                    ' ' => width += 1,
                    '\t' => width = (width / 8 + 1) * 8,
                    '\x0c' => width = 0,
                    _ => break,
                }
                i += 1;
            }
            match self.chars.get(i) {
                None => return 0,
                Some('\n') => continue,
                Some('#') => {
                    while i < self.chars.len() && self.chars[i] != '\n' {
                        i += 1;
                    }
                }
                Some(_) => return width,
            }
        }
        0
    }

    fn comment(&mut self) {
        let (line, col, start) = (self.line, self.col, self.pos);
        self.skip_to_eol();
        let text = self.text_from(start);

        if self.brackets.is_empty() {
            let end_col = self.col;
            self.tokens.push(Token {
                kind: TokenKind::Comment,
                text,
                line,
                col,
                end_line: line,
                end_col,
                inline: true,
            });
            return;
        }

        let token = Token {
            kind: TokenKind::Comment,
            text,
            line: self.logical_line,
            col: self.logical_col,
            end_line: self.logical_line,
            end_col: self.logical_col,
            inline: false,
        };
        self.tokens.insert(self.logical_start + self.hoisted, token);
        self.hoisted += 1;
    }

    fn continuation(&mut self) -> Result<(), LexError> {
        if self.peek_at(1) != Some('\n') {
            return Err(LexError {
                line: self.line,
                col: self.col,
                kind: LexErrorKind::BadContinuation,
            });
        }
        self.bump();
        self.bump();
        Ok(())
    }

    fn name(&mut self) -> Result<(), LexError> {
        let (line, col, start) = (self.line, self.col, self.pos);
        while self.peek().is_some_and(is_name_char) {
            self.bump();
        }
        let text = self.text_from(start);
        if matches!(self.peek(), Some('"' | '\''))
            && STRING_PREFIXES.contains(&text.to_ascii_lowercase().as_str())
        {
            return self.string(start, line, col);
        }
        self.push(TokenKind::Name, text, line, col);
        Ok(())
    }

    fn number(&mut self) {
        let (line, col, start) = (self.line, self.col, self.pos);
        let radix_prefix = self.peek() == Some('0')
            && matches!(self.peek_at(1), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B'));
        if radix_prefix {
            self.bump();
            self.bump();
            while self
                .peek()
                .is_some_and(|c| c.is_ascii_hexdigit() || c == '_')
            {
                self.bump();
            }
        } else {
            self.digits();
            if self.peek() == Some('.') {
                self.bump();
                self.digits();
            }
            if matches!(self.peek(), Some('e' | 'E')) {
                let sign = matches!(self.peek_at(1), Some('+' | '-'));
                let digit_at = if sign { 2 } else { 1 };
                if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                    for _ in 0..digit_at {
                        self.bump();
                    }
                    self.digits();
                }
            }
            if matches!(self.peek(), Some('j' | 'J')) {
                self.bump();
            }
        }
        let text = self.text_from(start);
        self.push(TokenKind::Number, text, line, col);
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_') {
            self.bump();
        }
    }

    /// Scan a string literal whose token (prefix included) starts at `start`;
    /// the cursor sits on the opening quote.
    fn string(&mut self, start: usize, line: u32, col: u32) -> Result<(), LexError> {
        let Some(quote) = self.peek() else {
            return Ok(());
        };
        let triple = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        let width = if triple { 3 } else { 1 };
        for _ in 0..width {
            self.bump();
        }

        loop {
            let Some(c) = self.peek() else {
                let kind = if triple {
                    LexErrorKind::UnterminatedTripleString
                } else {
                    LexErrorKind::UnterminatedString
                };
                return Err(LexError { line, col, kind });
            };
            match c {
                '\\' => {
                    self.bump();
                    if self.peek().is_some() {
                        self.bump();
                    }
                }
                '\n' if !triple => {
                    return Err(LexError {
                        line,
                        col,
                        kind: LexErrorKind::UnterminatedString,
                    });
                }
                c if c == quote => {
                    if !triple {
                        self.bump();
                        break;
                    }
                    if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                        self.bump();
                        self.bump();
                        self.bump();
                        break;
                    }
                    self.bump();
                }
                _ => self.bump(),
            }
        }

        let text = self.text_from(start);
        self.push(TokenKind::String, text, line, col);
        Ok(())
    }

    fn operator(&mut self) -> Result<(), LexError> {
        let (line, col) = (self.line, self.col);
        let rest: String = self.chars[self.pos..self.chars.len().min(self.pos + 3)]
            .iter()
            .collect();

        let op = THREE_CHAR_OPS
            .iter()
            .chain(TWO_CHAR_OPS.iter())
            .find(|op| rest.starts_with(**op))
            .map(|op| op.to_string())
            .or_else(|| {
                let c = rest.chars().next()?;
                ONE_CHAR_OPS.contains(c).then(|| c.to_string())
            });

        let Some(op) = op else {
            let c = rest.chars().next().unwrap_or('\0');
            return Err(LexError {
                line,
                col,
                kind: LexErrorKind::InvalidCharacter(c),
            });
        };

        match op.as_str() {
            "(" | "[" | "{" => {
                let c = op.chars().next().unwrap_or('(');
                self.brackets.push((c, line, col));
            }
            ")" | "]" | "}" => {
                let found = op.chars().next().unwrap_or(')');
                let Some((open, _, _)) = self.brackets.pop() else {
                    return Err(LexError {
                        line,
                        col,
                        kind: LexErrorKind::UnmatchedBracket(found),
                    });
                };
                let expected = closing_for(open);
                if expected != found {
                    return Err(LexError {
                        line,
                        col,
                        kind: LexErrorKind::MismatchedBracket { expected, found },
                    });
                }
            }
            _ => {}
        }

        for _ in 0..op.chars().count() {
            self.bump();
        }
        self.push(TokenKind::Op, op, line, col);
        Ok(())
    }

    fn skip_to_eol(&mut self) {
        while self.peek().is_some_and(|c| c != '\n') {
            self.bump();
        }
    }

    fn text_from(&self, start: usize) -> String {
        self.chars[start..self.pos].iter().collect()
    }

    fn push(&mut self, kind: TokenKind, text: String, line: u32, col: u32) {
        self.tokens.push(Token {
            kind,
            text,
            line,
            col,
            end_line: self.line,
            end_col: self.col,
            inline: false,
        });
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
        }
    }
}

fn closing_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

fn is_name_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_name_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}
