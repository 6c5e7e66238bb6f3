//! CLI tool for record schema files.
//!
//! Provides commands for:
//! - Validating a schema file and its relation targets
//! - Listing column aliases and relation aliases per record type

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fieldtrack_core::schema::{Registry, SchemaFile};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the schema tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a schema file
    Check {
        /// Path to the schema JSON file
        path: PathBuf,
    },
    /// Print column and relation aliases
    Aliases {
        /// Path to the schema JSON file
        path: PathBuf,

        /// Only show this record type
        #[arg(long = "type")]
        type_name: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Check { path } => {
            let registry = load_registry(&path)?;
            for line in check_report(&registry)? {
                println!("{}", line);
            }
        }
        Command::Aliases { path, type_name } => {
            let registry = load_registry(&path)?;
            for line in alias_report(&registry, type_name.as_deref())? {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

fn load_registry(path: &Path) -> Result<Registry> {
    tracing::info!(path = %path.display(), "Loading schema");
    let schema = SchemaFile::load(path)
        .with_context(|| format!("failed to read schema {}", path.display()))?;
    schema
        .into_registry()
        .with_context(|| format!("invalid schema {}", path.display()))
}

/// One summary line per record type.
fn check_report(registry: &Registry) -> Result<Vec<String>> {
    let mut lines = Vec::with_capacity(registry.len() + 1);
    for name in registry.type_names() {
        let record_type = registry.get(&name)?;
        lines.push(format!(
            "{}: {} fields, {} relations",
            name,
            record_type.fields().len(),
            record_type.relation_aliases().len()
        ));
    }
    lines.push(format!("ok: {} record types", registry.len()));
    Ok(lines)
}

/// Alias lines for every type, or only for `only`.
fn alias_report(registry: &Registry, only: Option<&str>) -> Result<Vec<String>> {
    let names = match only {
        Some(name) => vec![registry.get(name)?.name().to_string()],
        None => registry.type_names(),
    };

    let mut lines = Vec::new();
    for name in names {
        let record_type = registry.get(&name)?;
        lines.push(format!("{}:", name));
        for alias in record_type.relation_aliases() {
            lines.push(format!(
                "  {} -> {} (relation to {})",
                alias.column, alias.name, alias.target
            ));
        }
        for (column, field) in record_type.column_aliases() {
            lines.push(format!("  {} -> {}", column, field));
        }
    }
    Ok(lines)
}
