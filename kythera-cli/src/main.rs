use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use kythera_core::ast::parse_program;
use kythera_core::{DEFAULT_RUNTIME_PATH, Translator, binding_dump, compile, runtime_prelude};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Translate Kythera parse trees into host runtime text.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(short, long, help = "JSON parse tree to translate (defaults to stdin)")]
    input: Option<String>,

    #[arg(short, long, help = "Write the emitted text here instead of stdout")]
    output: Option<String>,

    #[arg(
        long,
        value_name = "PATH",
        default_value = DEFAULT_RUNTIME_PATH,
        help = "Module path the emitted prelude loads the runtime from"
    )]
    runtime: String,

    #[arg(long, help = "Append statements that log every top-level binding")]
    bindings: bool,

    #[arg(long, help = "Print the type of every top-level binding to stderr")]
    types: bool,

    #[arg(long, help = "Echo the parsed input tree to stderr")]
    print_tree: bool,

    #[arg(long, help = "Interactive mode: translate blocks separated by blank lines")]
    repl: bool,

    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    execute(cli)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn execute(cli: Cli) -> Result<()> {
    if cli.repl {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        return run_repl(stdin.lock(), &mut stdout, &cli.runtime);
    }

    let source = match &cli.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {path}"))?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    if cli.print_tree {
        let tree: serde_json::Value =
            serde_json::from_str(&source).context("input is not valid JSON")?;
        eprintln!("{}", serde_json::to_string_pretty(&tree)?);
    }

    let artifact = compile(&source)?;
    debug!(bindings = artifact.bindings.len(), "translation complete");

    let mut text = artifact.with_prelude(&cli.runtime);
    if cli.bindings {
        text.push_str(&binding_dump(&artifact.bindings));
    }

    match &cli.output {
        Some(path) => write_output(path, text.as_bytes())?,
        None => print!("{text}"),
    }

    if cli.types {
        for line in artifact.describe_bindings() {
            eprintln!("{line}");
        }
    }

    Ok(())
}

fn write_output(path: &str, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = PathBuf::from(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    fs::write(path, bytes).with_context(|| format!("failed to write output file {path}"))?;
    Ok(())
}

/// Accumulate lines until a blank one, then translate the block.
///
/// A failing block is reported and discarded; the session carries on.
/// Bindings are not kept between blocks.
fn run_repl(input: impl BufRead, out: &mut impl Write, runtime: &str) -> Result<()> {
    writeln!(
        out,
        "Starting interactive mode.\n\
         Bindings are not kept between blocks.\n\
         Enter a parse tree line by line. Enter a blank line to translate."
    )?;

    let mut translator = Translator::new();
    let mut block = String::new();
    write!(out, "==> ")?;
    out.flush()?;

    for line in input.lines() {
        let line = line.context("failed to read from stdin")?;
        if !line.trim().is_empty() {
            block.push_str(&line);
            block.push('\n');
            write!(out, "  > ")?;
            out.flush()?;
            continue;
        }

        if !block.is_empty() {
            match translate_block(&mut translator, &block, runtime) {
                Ok(text) => write!(out, "Compiled result:\n{text}")?,
                Err(err) => writeln!(out, "{err:#}\n")?,
            }
            block.clear();
        }
        write!(out, "==> ")?;
        out.flush()?;
    }

    writeln!(out)?;
    Ok(())
}

fn translate_block(translator: &mut Translator, block: &str, runtime: &str) -> Result<String> {
    let program = parse_program(block).context("malformed parse tree")?;
    translator.load(program);
    let output = translator.visit_program()?;
    let mut text = format!("{}{output}", runtime_prelude(runtime));
    text.push_str(&binding_dump(translator.root_bindings()));
    Ok(text)
}
