//! `toolspec`: import an OpenAPI document and print the resulting tool specification.

use anyhow::Context as _;
use clap::Parser;
use owo_colors::OwoColorize as _;
use std::io::Read as _;
use std::path::PathBuf;
use toolspec_openapi::extract::DefaultExtractor;
use toolspec_openapi::import::import_document;
use toolspec_openapi::normalizer::RejectLegacy;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Import an OpenAPI 3 document (JSON or YAML) as an MCP tool specification.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the OpenAPI document, or `-` to read from stdin.
    input: PathBuf,

    /// Write the specification to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toolspec=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let json = run(&cli)?;

    match &cli.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("write {}", path.display()))?,
        None => println!("{json}"),
    }

    Ok(())
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    let text = read_input(&cli.input)?;

    let outcome = import_document(&text, &DefaultExtractor, &RejectLegacy)
        .with_context(|| format!("import {}", cli.input.display()))?;

    for diagnostic in &outcome.diagnostics {
        eprintln!("{} {diagnostic}", "warning:".yellow().bold());
    }

    let json = if cli.pretty {
        outcome.specification.to_json_pretty()?
    } else {
        outcome.specification.to_json()?
    };
    Ok(json)
}

fn read_input(path: &PathBuf) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}
