//! Rename async identifiers to their sync counterparts.
//!
//! Every identifier position goes through [`SyncConfig::renames`]: names,
//! attributes, definitions, parameters, keyword arguments, imports and
//! f-string replacement fields. The module docstring only loses the
//! docstring marker, and imports that would shadow renamed builtins are
//! dropped.

use ds_ast::{
    is_fstring, split_string_prefix, Expr, ExprKind, ImportFrom, Keyword, Module, Param, Stmt,
    StmtKind, VisitMut, VisitMutWith,
};

use crate::config::SyncConfig;

pub struct RenameAsyncToSync<'a> {
    config: &'a SyncConfig,
}

impl<'a> RenameAsyncToSync<'a> {
    pub fn new(config: &'a SyncConfig) -> Self {
        Self { config }
    }

    fn rename(&self, name: &mut String) {
        if let Some(sync) = self.config.renames.get(name.as_str()) {
            tracing::trace!(from = %name, to = %sync, "rename");
            *name = sync.clone();
        }
    }

    fn fix_docstring(&self, module: &mut Module) {
        let Some(first) = module.body.iter_mut().find(|s| s.is_code()) else {
            return;
        };
        let StmtKind::Expr(Expr {
            kind: ExprKind::Str(lit),
            ..
        }) = &mut first.kind
        else {
            return;
        };
        let is_text = lit.parts.iter().all(|part| {
            let (prefix, _) = split_string_prefix(part);
            !prefix.contains(['b', 'B', 'f', 'F'])
        });
        if is_text {
            lit.replace_text(&self.config.docstring_marker, "");
        }
    }

    /// Drop shadowed names from a `from <shadow module> import ...`.
    /// Returns false when nothing is left to import.
    fn keep_import(&self, import: &mut ImportFrom) -> bool {
        if import.module.as_deref() != Some(self.config.shadow_module.as_str()) {
            return true;
        }
        import
            .names
            .retain(|alias| !self.config.shadowed.contains(&alias.name));
        !import.names.is_empty()
    }

    fn rename_fstring(&self, raw: &str) -> String {
        let (prefix, body) = split_string_prefix(raw);
        let is_raw = prefix.contains(['r', 'R']);
        let chars: Vec<char> = body.chars().collect();

        let mut out = String::with_capacity(raw.len());
        out.push_str(prefix);
        let mut depth = 0usize;
        let mut quote = None;
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if depth == 0 {
                match c {
                    '{' | '}' if chars.get(i + 1) == Some(&c) => {
                        out.push(c);
                        i += 1;
                    }
                    '{' => depth = 1,
                    // `\N{NAME}` is an escape, not a field.
                    '\\' if !is_raw && chars.get(i + 1) == Some(&'N') => {
                        while i < chars.len() && chars[i] != '}' {
                            out.push(chars[i]);
                            i += 1;
                        }
                        if i == chars.len() {
                            break;
                        }
                    }
                    _ => {}
                }
                out.push(chars[i]);
                i += 1;
                continue;
            }

            if let Some(q) = quote {
                if c == q {
                    quote = None;
                }
                out.push(c);
                i += 1;
                continue;
            }
            match c {
                '\'' | '"' => quote = Some(c),
                '{' => depth += 1,
                '}' => depth -= 1,
                c if is_ident_start(c) && !(i > 0 && is_ident_char(chars[i - 1])) => {
                    let start = i;
                    while i < chars.len() && is_ident_char(chars[i]) {
                        i += 1;
                    }
                    let word: String = chars[start..i].iter().collect();
                    if matches!(chars.get(i), Some('\'' | '"')) && is_string_prefix(&word) {
                        let end = string_end(&chars, i);
                        let nested: String = chars[start..end].iter().collect();
                        if is_fstring(&nested) {
                            out.push_str(&self.rename_fstring(&nested));
                        } else {
                            out.push_str(&nested);
                        }
                        i = end;
                        continue;
                    }
                    out.push_str(self.config.rename(&word));
                    continue;
                }
                _ => {}
            }
            out.push(c);
            i += 1;
        }
        out
    }
}

fn is_string_prefix(word: &str) -> bool {
    word.len() <= 2 && word.chars().all(|c| "rRbBuUfF".contains(c))
}

/// Index just past the string literal whose opening quote is at `open`.
fn string_end(chars: &[char], open: usize) -> usize {
    let quote = chars[open];
    let triple = chars.get(open + 1) == Some(&quote) && chars.get(open + 2) == Some(&quote);
    let mut i = open + if triple { 3 } else { 1 };
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => {
                if !triple {
                    return i + 1;
                }
                if chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote) {
                    return i + 3;
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    chars.len()
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl VisitMut for RenameAsyncToSync<'_> {
    fn visit_mut_module(&mut self, node: &mut Module) {
        self.fix_docstring(node);
        node.visit_mut_children_with(self);
    }

    fn visit_mut_stmts(&mut self, node: &mut Vec<Stmt>) {
        let body = std::mem::take(node);
        let mut dropped_import = false;
        for mut stmt in body {
            // A trailing comment goes with the import it annotates.
            if dropped_import && matches!(stmt.kind, StmtKind::Comment { inline: true, .. }) {
                continue;
            }
            dropped_import = false;
            if let StmtKind::ImportFrom(import) = &mut stmt.kind {
                if !self.keep_import(import) {
                    tracing::trace!(line = stmt.span.line, "drop shadowing import");
                    // Comments moved out of its brackets share its line.
                    while node.last().is_some_and(|prev| {
                        matches!(prev.kind, StmtKind::Comment { inline: false, .. })
                            && prev.span.line == stmt.span.line
                    }) {
                        node.pop();
                    }
                    dropped_import = true;
                    continue;
                }
            }
            node.push(stmt);
        }
        node.visit_mut_children_with(self);
    }

    fn visit_mut_stmt(&mut self, node: &mut Stmt) {
        match &mut node.kind {
            StmtKind::FunctionDef(func) | StmtKind::AsyncFunctionDef(func) => {
                self.rename(&mut func.name)
            }
            StmtKind::ClassDef(class) => self.rename(&mut class.name),
            StmtKind::ImportFrom(import) => {
                for alias in &mut import.names {
                    self.rename(&mut alias.name);
                    if let Some(asname) = &mut alias.asname {
                        self.rename(asname);
                    }
                }
            }
            StmtKind::Import(names) => {
                for asname in names.iter_mut().filter_map(|a| a.asname.as_mut()) {
                    self.rename(asname);
                }
            }
            StmtKind::Global(names) | StmtKind::Nonlocal(names) => {
                for name in names {
                    self.rename(name);
                }
            }
            StmtKind::Try(try_) => {
                for name in try_.handlers.iter_mut().filter_map(|h| h.name.as_mut()) {
                    self.rename(name);
                }
            }
            _ => {}
        }
        node.visit_mut_children_with(self);
    }

    fn visit_mut_expr(&mut self, node: &mut Expr) {
        match &mut node.kind {
            ExprKind::Name(id) => self.rename(id),
            ExprKind::Attribute { attr, .. } => self.rename(attr),
            ExprKind::Str(lit) => {
                for part in &mut lit.parts {
                    if is_fstring(part) {
                        *part = self.rename_fstring(part);
                    }
                }
            }
            _ => {}
        }
        node.visit_mut_children_with(self);
    }

    fn visit_mut_param(&mut self, node: &mut Param) {
        self.rename(&mut node.name);
        node.visit_mut_children_with(self);
    }

    fn visit_mut_keyword(&mut self, node: &mut Keyword) {
        if let Some(arg) = &mut node.arg {
            self.rename(arg);
        }
        node.visit_mut_children_with(self);
    }
}
