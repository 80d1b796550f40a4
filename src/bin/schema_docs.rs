//! Schema Docs CLI
//!
//! Converts JSON Schema files into Hugo Markdown pages.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use schema_docs::{Converter, DocsConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-docs")]
#[command(about = "Convert JSON Schema files into Markdown documentation")]
struct Cli {
    /// Schema file, or directory to search for schemas
    path: PathBuf,

    /// Output directory
    #[arg(short, long)]
    destination: Option<PathBuf>,

    /// Glob matched against schema file names
    #[arg(short, long)]
    extension: Option<String>,

    /// Search sub-directories
    #[arg(short, long)]
    recursive: bool,

    /// Order properties as they appear in the source files
    #[arg(short, long)]
    ordered: bool,

    /// Prefix definition page names with their source position
    #[arg(long)]
    ordered_file_path: bool,

    /// Remove the output directory first
    #[arg(short, long)]
    clean: bool,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Loaded configuration with command line flags applied on top
    fn docs_config(&self) -> anyhow::Result<DocsConfig> {
        let mut config = DocsConfig::load_from(self.config.as_deref())
            .context("failed to load configuration")?;

        if let Some(destination) = &self.destination {
            config.destination = destination.clone();
        }
        if let Some(extension) = &self.extension {
            config.extension = extension.clone();
        }
        config.recursive |= self.recursive;
        config.ordered |= self.ordered;
        config.ordered_file_path |= self.ordered_file_path;
        config.clean |= self.clean;

        Ok(config.normalized())
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.docs_config()?;
    let converter = Converter::new(config);

    let report = converter
        .convert(&cli.path)
        .with_context(|| format!("failed to convert {}", cli.path.display()))?;

    println!(
        "Converted {} schemas into {} pages in {}",
        report.schemas,
        report.pages,
        converter.config().destination.display()
    );
    Ok(())
}
