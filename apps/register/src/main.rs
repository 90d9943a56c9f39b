//! # Billbook Register
//!
//! Terminal till over the billing engine.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Register Startup                                 │
//! │                                                                         │
//! │  init_tracing()                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  EngineConfig::load(arg or <config dir>/billbook.toml) + BILLBOOK_* env │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(<data dir>/billbook.db)   migrations run on open         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Engine::from_database ──► Register::open ──► read-eval loop on stdin   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```text
//! register [config.toml]
//! RUST_LOG=billbook=trace register
//! ```

mod commands;
mod error;
mod register;

use anyhow::{anyhow, Context};
use billbook_db::{Database, DbConfig};
use billbook_engine::{Engine, EngineConfig};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::commands::parse;
use crate::error::RegisterError;
use crate::register::{Register, Reply};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = EngineConfig::load(config_path).context("Failed to load configuration")?;

    let db_path = database_path(&config)?;
    info!(path = ?db_path, "Opening database");
    let db = Database::new(DbConfig::new(db_path.clone()))
        .await
        .context("Failed to open database")?;

    let engine = Engine::from_database(&db, config);
    let mut register = Register::open(engine).await?;
    info!("Register ready");

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    stdout.write_all(b"Type 'help' for commands.\n> ").await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let reply = match parse(&line) {
            Ok(Some(command)) => register.execute(command).await,
            Ok(None) => Ok(Reply::Output(String::new())),
            Err(e) => Err(RegisterError::from(e)),
        };

        match reply {
            Ok(Reply::Quit) => break,
            Ok(Reply::Output(text)) if text.is_empty() => {}
            Ok(Reply::Output(text)) => stdout.write_all(format!("{}\n", text).as_bytes()).await?,
            Err(e) => stdout.write_all(format!("{}\n", e).as_bytes()).await?,
        }
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }

    if !register.pending().is_empty() {
        tracing::warn!(
            pending = register.pending().len(),
            "Exiting with stock updates still pending"
        );
    }
    db.close().await;
    info!("Register closed");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=billbook=trace` - Show trace for billbook crates only
/// - Default: INFO, with debug for billbook crates
///
/// Logs go to stderr so receipts on stdout stay clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,billbook=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Configured database path, with its directory created.
fn database_path(config: &EngineConfig) -> anyhow::Result<PathBuf> {
    let path = config
        .database_path()
        .ok_or_else(|| anyhow!("Could not determine app data directory"))?;

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(path)
}
