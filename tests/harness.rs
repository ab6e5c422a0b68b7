//! Golden-file test harness for desync.
//!
//! Discovers `.input.py` files under `tests/fixtures/`, runs the conversion
//! pipeline (parse → async_to_sync → tree_to_str), and compares the output
//! against the corresponding `.expected.py` file.
//!
//! Set `DS_UPDATE_FIXTURES=1` to overwrite expected files with actual output.

use std::path::{Path, PathBuf};

use anyhow::Result;
use ds_ast::{Comprehension, Expr, ExprKind, Module, Stmt, StmtKind, VisitMut, VisitMutWith};
use ds_codegen::{tree_to_str, unparse};
use ds_desugar::{async_to_sync, SyncConfig};
use ds_parser::parse_module;

const TOOL: &str = "async-to-sync";

fn fixtures_dir() -> PathBuf {
    // CARGO_MANIFEST_DIR is crates/ds_test/, so go up two levels to workspace root.
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
}

fn collect_input_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir(dir)
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".input.py"))
        })
        .collect();
    files.sort();
    files
}

fn walkdir(dir: &Path) -> Vec<PathBuf> {
    let mut result = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                result.extend(walkdir(&path));
            } else {
                result.push(path);
            }
        }
    }
    result
}

fn run_pipeline(source: &str, filename: &str) -> Result<String> {
    let module = parse_module(source, filename)?;
    let module = async_to_sync(module, &SyncConfig::default());
    Ok(tree_to_str(&module, filename, TOOL))
}

/// Flags any async construct left in a tree.
#[derive(Default)]
struct AsyncFinder {
    found: Vec<String>,
}

impl VisitMut for AsyncFinder {
    fn visit_mut_stmt(&mut self, node: &mut Stmt) {
        let kind = match &node.kind {
            StmtKind::AsyncFunctionDef(_) => Some("async def"),
            StmtKind::AsyncFor(_) => Some("async for"),
            StmtKind::AsyncWith(_) => Some("async with"),
            _ => None,
        };
        if let Some(kind) = kind {
            self.found.push(format!("{kind} at line {}", node.span.line));
        }
        node.visit_mut_children_with(self);
    }

    fn visit_mut_expr(&mut self, node: &mut Expr) {
        if let ExprKind::Await(_) = node.kind {
            self.found.push(format!("await at line {}", node.span.line));
        }
        node.visit_mut_children_with(self);
    }

    fn visit_mut_comprehension(&mut self, node: &mut Comprehension) {
        if node.is_async {
            self.found.push(format!("async comprehension at line {}", node.iter.span.line));
        }
        node.visit_mut_children_with(self);
    }
}

/// The generated file must parse, be fully synchronous, and convert to
/// itself.
fn verify_sync_output(output: &str, filename: &str) -> Result<()> {
    let mut module: Module = parse_module(output, filename)?;

    let mut finder = AsyncFinder::default();
    module.visit_mut_with(&mut finder);
    anyhow::ensure!(
        finder.found.is_empty(),
        "async constructs left: {}",
        finder.found.join(", ")
    );

    let again = unparse(&async_to_sync(module, &SyncConfig::default()));
    anyhow::ensure!(
        again.trim_end() == output.trim_end(),
        "conversion is not idempotent:\n{again}"
    );
    Ok(())
}

#[test]
fn golden_file_tests() {
    let fixtures = fixtures_dir();
    let input_files = collect_input_files(&fixtures);

    assert!(
        !input_files.is_empty(),
        "No test fixtures found in {}",
        fixtures.display()
    );

    let update_mode = std::env::var("DS_UPDATE_FIXTURES").is_ok();
    let mut failures = Vec::new();

    for input_path in &input_files {
        let expected_path = input_path
            .to_str()
            .unwrap()
            .replace(".input.py", ".expected.py");
        let expected_path = PathBuf::from(&expected_path);

        let test_name = input_path
            .strip_prefix(&fixtures)
            .unwrap()
            .display()
            .to_string();

        let source = match std::fs::read_to_string(input_path) {
            Ok(s) => s,
            Err(e) => {
                failures.push(format!("{test_name}: failed to read input: {e}"));
                continue;
            }
        };

        let filename = input_path.display().to_string();
        let actual = match run_pipeline(&source, &filename) {
            Ok(s) => s,
            Err(e) => {
                failures.push(format!("{test_name}: pipeline failed: {e}"));
                continue;
            }
        };

        if update_mode {
            if let Err(e) = std::fs::write(&expected_path, &actual) {
                failures.push(format!("{test_name}: failed to write expected: {e}"));
            }
            continue;
        }

        if !expected_path.exists() {
            failures.push(format!(
                "{test_name}: missing expected file: {}",
                expected_path.display()
            ));
            continue;
        }

        let expected = match std::fs::read_to_string(&expected_path) {
            Ok(s) => s,
            Err(e) => {
                failures.push(format!("{test_name}: failed to read expected: {e}"));
                continue;
            }
        };
        if actual != expected {
            failures.push(format!(
                "{test_name}: output mismatch\n--- expected ---\n{expected}\n--- actual ---\n{actual}"
            ));
        }
    }

    if !failures.is_empty() {
        panic!(
            "\n{} golden test(s) failed:\n\n{}",
            failures.len(),
            failures.join("\n\n")
        );
    }
}

#[test]
fn roundtrip_tests() {
    let input_files = collect_input_files(&fixtures_dir());

    let mut failures = Vec::new();

    for input_path in &input_files {
        let test_name = input_path
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();

        let source = match std::fs::read_to_string(input_path) {
            Ok(s) => s,
            Err(e) => {
                failures.push(format!("{test_name}: failed to read: {e}"));
                continue;
            }
        };

        let filename = input_path.display().to_string();
        let output = match run_pipeline(&source, &filename) {
            Ok(s) => s,
            Err(e) => {
                failures.push(format!("{test_name}: pipeline failed: {e}"));
                continue;
            }
        };

        if let Err(e) = verify_sync_output(&output, &format!("{test_name}.output")) {
            failures.push(format!(
                "{test_name}: generated file does not check out: {e}\n--- output ---\n{}",
                output.trim()
            ));
        }
    }

    if !failures.is_empty() {
        panic!(
            "\n{} roundtrip test(s) failed:\n\n{}",
            failures.len(),
            failures.join("\n\n")
        );
    }
}
