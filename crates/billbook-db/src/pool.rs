//! # Database Handle
//!
//! Opens the SQLite file shared by every till in the shop and hands out the
//! two repositories the engine stores wrap.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig::new("<data dir>/billbook.db")    DbConfig::in_memory()       │
//! │            │                                        │                   │
//! │            └────────────► Database::new ◄───────────┘                   │
//! │                               │                                         │
//! │             WAL journal, foreign keys, busy timeout                     │
//! │                               │                                         │
//! │                    SqlitePool ──► migrations                            │
//! │                               │                                         │
//! │           ┌───────────────────┴───────────────────┐                     │
//! │           ▼                                       ▼                     │
//! │   db.products()  catalog rows              db.bills()  ledger rows      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two tills decrementing the same product contend on SQLite's single
//! writer lock. The busy timeout makes the loser wait for the lock instead
//! of failing the stock write straight away.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::bill::BillRepository;
use crate::repository::product::ProductRepository;

const MEMORY_URL: &str = "sqlite::memory:";

/// Where the database lives and how the pool behaves.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// `None` means a private in-memory database.
    pub path: Option<PathBuf>,

    /// Pool size. In-memory databases are pinned to one connection.
    pub max_connections: u32,

    /// How long a writer waits on a locked database.
    pub busy_timeout: Duration,

    pub run_migrations: bool,
}

impl DbConfig {
    /// A file-backed database, created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            path: Some(path.into()),
            max_connections: 4,
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// A throwaway database for tests and demos.
    ///
    /// Every `:memory:` connection is its own database, so the pool holds
    /// exactly one connection and never recycles it.
    pub fn in_memory() -> Self {
        DbConfig {
            path: None,
            max_connections: 1,
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        if self.path.is_some() {
            self.max_connections = max.max(1);
        }
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Skips migrations on open (the schema is managed elsewhere).
    pub fn without_migrations(mut self) -> Self {
        self.run_migrations = false;
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.path {
            Some(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true),
            None => SqliteConnectOptions::from_str(MEMORY_URL)
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
        };

        Ok(options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout))
    }
}

/// Shared handle to the catalog and ledger tables.
///
/// Clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let location = config
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string());
        info!(%location, "Opening database");

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .acquire_timeout(config.busy_timeout * 2);
        if config.path.is_none() {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(max_connections = config.max_connections, "Pool ready");

        let db = Database { pool };
        if config.run_migrations {
            migrations::run_migrations(&db.pool).await?;
        }
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Catalog rows (products and their stock).
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Ledger rows (bills and their items).
    pub fn bills(&self) -> BillRepository {
        BillRepository::new(self.pool.clone())
    }

    pub async fn close(&self) {
        debug!("Closing database pool");
        self.pool.close().await;
    }
}
