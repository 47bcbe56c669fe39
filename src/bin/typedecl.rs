//! Declaration Compiler CLI
//!
//! Compiles a schema file (or a directory of schema files) into a single
//! `.d.ts` module, written to a file or stdout.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use typedecl::{compile, load_from_directory, load_from_file, CompileConfig};

#[derive(Parser)]
#[command(name = "typedecl")]
#[command(about = "Compile schema documents to type declarations")]
struct Cli {
    /// Schema file or directory of schema files
    input: PathBuf,

    /// Output path (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Name for anonymous document roots
    #[arg(long, default_value = "Schema")]
    root_name: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let graph = if cli.input.is_dir() {
        load_from_directory(&cli.input)
    } else {
        load_from_file(&cli.input)
    }
    .with_context(|| format!("failed to load schemas from {}", cli.input.display()))?;

    let config = CompileConfig {
        root_name: cli.root_name,
        ..CompileConfig::default()
    };

    let output = compile(graph, &config)?;
    let rendered = output.render();

    match cli.output {
        Some(path) => {
            fs::write(&path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "✅ Wrote {} declarations to {}",
                output.declarations.len(),
                path.display()
            );
        }
        None => print!("{}", rendered),
    }

    Ok(())
}
