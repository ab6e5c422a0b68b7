mod tracing_config;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use ds_codegen::tree_to_str;
use ds_desugar::{async_to_sync, SyncConfig};
use ds_parser::parse_module;

const DEFAULT_TOOL: &str = "async-to-sync";

/// Convert an async module to a sync module.
#[derive(Parser)]
#[command(name = "async-to-sync")]
struct Cli {
    /// The file to process.
    #[arg(value_name = "FILE")]
    filename: PathBuf,
    /// File where to write (stdout if omitted).
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,
    /// Dump the parsed tree as JSON instead of converting.
    #[arg(long)]
    dump_ast: bool,
}

fn main() -> Result<()> {
    tracing_config::init_tracing();
    let cli = Cli::parse();

    let output = render(&cli, &tool_name())?;
    match &cli.output {
        Some(path) => std::fs::write(path, &output)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{output}"),
    }
    Ok(())
}

/// Produce the text the command writes: the generated module or, with
/// `--dump-ast`, the parsed tree.
fn render(cli: &Cli, tool: &str) -> Result<String> {
    let source = std::fs::read_to_string(&cli.filename)
        .with_context(|| format!("failed to read {}", cli.filename.display()))?;
    let filename = cli.filename.display().to_string();
    let module = parse_module(&source, &filename)?;

    if cli.dump_ast {
        let mut json = serde_json::to_string_pretty(&module)?;
        json.push('\n');
        return Ok(json);
    }

    let config = SyncConfig::default();
    let module = async_to_sync(module, &config);
    tracing::info!(file = %filename, "converted");
    Ok(tree_to_str(&module, &filename, tool))
}

/// Base name of the running program, as shown in the banner.
fn tool_name() -> String {
    std::env::args_os()
        .next()
        .and_then(|arg0| {
            Path::new(&arg0)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| DEFAULT_TOOL.to_string())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("async-to-sync").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn arguments() {
        let parsed = cli(&["in.py"]);
        assert_eq!(parsed.filename, PathBuf::from("in.py"));
        assert!(parsed.output.is_none());
        assert!(!parsed.dump_ast);

        let parsed = cli(&["in.py", "out.py", "--dump-ast"]);
        assert_eq!(parsed.output, Some(PathBuf::from("out.py")));
        assert!(parsed.dump_ast);

        assert!(Cli::try_parse_from(["async-to-sync"]).is_err());
        assert!(Cli::try_parse_from(["async-to-sync", "a", "b", "c"]).is_err());
    }

    #[test]
    fn converts_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pool_async.py");
        fs::write(&input, "async def f(aconn):\n    await aconn.aclose()\n").unwrap();

        let out = render(&cli(&[input.to_str().unwrap()]), "async_to_sync.py").unwrap();
        assert_eq!(
            out,
            "# WARNING: this file is auto-generated by 'async_to_sync.py'\n\
             # from the original file 'pool_async.py'\n\
             # DO NOT CHANGE! Change the original file instead.\n\
             def f(conn):\n    conn.close()\n"
        );
    }

    #[test]
    fn dumps_the_tree() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.py");
        fs::write(&input, "x = 1\n").unwrap();

        let out = render(&cli(&[input.to_str().unwrap(), "--dump-ast"]), DEFAULT_TOOL).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(json["body"][0]["kind"]["Assign"].is_object());
    }

    #[test]
    fn errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.py");
        let err = render(&cli(&[missing.to_str().unwrap()]), DEFAULT_TOOL).unwrap_err();
        assert!(format!("{err:#}").contains("missing.py"));

        let broken = dir.path().join("broken.py");
        fs::write(&broken, "def f(:\n").unwrap();
        let err = render(&cli(&[broken.to_str().unwrap()]), DEFAULT_TOOL).unwrap_err();
        assert!(
            err.to_string().contains("broken.py:1:5: '(' was never closed"),
            "{err}"
        );

        let syntax = dir.path().join("syntax.py");
        fs::write(&syntax, "x = = 1\n").unwrap();
        let err = render(&cli(&[syntax.to_str().unwrap()]), DEFAULT_TOOL).unwrap_err();
        assert!(err.to_string().contains("syntax.py:1:4: invalid syntax"), "{err}");
    }
}
