use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{ApplicationStore, PersistenceAdapter};
use storage::SqliteStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{execute, Command};
use config::load_settings;

/// Admissions application wizard with locally saved drafts.
#[derive(Parser, Debug)]
#[command(name = "wizard")]
struct Cli {
    /// Settings file; `wizard.toml` in the working directory is used when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// SQLite file holding saved drafts.
    #[arg(long)]
    database: Option<String>,
    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        settings.database_path = database;
    }

    let filter = EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let backend = SqliteStore::new(&settings.database_path).with_context(|| {
        format!(
            "failed to open draft storage at '{}'",
            settings.database_path
        )
    })?;
    info!(database = %settings.database_path, "wizard: draft storage opened");

    let adapter = PersistenceAdapter::with_keys(backend, settings.storage_keys());
    let mut store = ApplicationStore::restore(adapter);

    let stdout = io::stdout();
    execute(&mut store, cli.command, &mut stdout.lock())
}
