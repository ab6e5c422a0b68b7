//! Tables driving the rewrite.

use std::collections::{HashMap, HashSet};

const RENAMES: &[(&str, &str)] = &[
    ("AsyncClientCursor", "ClientCursor"),
    ("AsyncCursor", "Cursor"),
    ("AsyncRawCursor", "RawCursor"),
    ("AsyncServerCursor", "ServerCursor"),
    ("aclose", "close"),
    ("aclosing", "closing"),
    ("aconn", "conn"),
    ("aconn_cls", "conn_cls"),
    ("aconn_set", "conn_set"),
    ("alist", "list"),
    ("anext", "next"),
];

const SETTERS: &[(&str, &str)] = &[
    ("set_autocommit", "autocommit"),
    ("set_read_only", "read_only"),
    ("set_isolation_level", "isolation_level"),
    ("set_deferrable", "deferrable"),
];

/// Everything the passes need to know about the async/sync naming
/// convention. Built once and shared by reference.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Async identifier → sync identifier.
    pub renames: HashMap<String, String>,
    /// Async setter method → sync attribute.
    pub setters: HashMap<String, String>,
    /// Removed from the module docstring.
    pub docstring_marker: String,
    /// `from <shadow_module> import ...` loses the names in `shadowed`,
    /// which would hide the builtins they are renamed to.
    pub shadow_module: String,
    pub shadowed: HashSet<String>,
}

impl SyncConfig {
    pub fn rename<'a>(&'a self, name: &'a str) -> &'a str {
        self.renames.get(name).map_or(name, String::as_str)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        let table = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect()
        };
        Self {
            renames: table(RENAMES),
            setters: table(SETTERS),
            docstring_marker: "Async".into(),
            shadow_module: "utils".into(),
            shadowed: ["alist", "anext"].into_iter().map(String::from).collect(),
        }
    }
}
