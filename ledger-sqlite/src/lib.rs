#![warn(missing_docs)]
//! SQLite reference backend for the agency ledger engine.
//!
//! This crate implements every repository port of `ledger-core` against a
//! SQLite database. It provides separate reader and writer connection
//! pools: the reader pool allows concurrent reads, while the writer pool
//! is capped at a single connection so mutating transactions (the
//! versioner's close-then-open step, the draw-limit check-then-insert)
//! serialize instead of racing.

use sqlx::sqlite;
use std::{str::FromStr, time::Duration};
use tokio::try_join;

pub mod config;
mod error;
mod r#impl;
mod types;

pub use error::StoreError;

use config::SqliteConfig;

/// SQLite database implementation of the ledger repositories.
///
/// # Connection Management
///
/// - `reader`: A connection pool for read operations, allowing concurrent reads
/// - `writer`: A single-connection pool for write operations, ensuring serialized writes
///
/// # Example
///
/// ```no_run
/// # use ledger_sqlite::{Db, config::SqliteConfig};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SqliteConfig::default();
/// let db = Db::open(&config).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Db {
    /// Connection pool for read operations
    pub reader: sqlx::Pool<sqlx::Sqlite>,
    /// Connection pool for write operations (limited to 1 connection)
    pub writer: sqlx::Pool<sqlx::Sqlite>,
}

impl Db {
    /// Open a connection to the specified SQLite database.
    ///
    /// Creates a new database if one doesn't exist (when
    /// `create_if_missing` is true) and applies all pending migrations.
    ///
    /// The database runs in WAL mode with foreign keys enforced; a busy
    /// timeout covers the rare writer-vs-reader contention on the same
    /// file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the connection fails or migrations fail
    /// to apply.
    pub async fn open(config: &SqliteConfig) -> Result<Self, StoreError> {
        let db_path = config
            .database_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());

        let options =
            sqlite::SqliteConnectOptions::from_str(db_path.as_deref().unwrap_or(":memory:"))?
                .busy_timeout(Duration::from_secs(5))
                .foreign_keys(true)
                .journal_mode(sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlite::SqliteSynchronous::Normal)
                .pragma("temp_store", "memory")
                .create_if_missing(config.create_if_missing);

        let reader = sqlite::SqlitePoolOptions::new().connect_with(options.clone());
        let writer = sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options);

        let (reader, writer) = try_join!(reader, writer)?;

        // Run any pending migrations before returning
        sqlx::migrate!("./schema").run(&writer).await?;

        tracing::debug!(
            path = db_path.as_deref().unwrap_or(":memory:"),
            "ledger database opened"
        );

        Ok(Self { reader, writer })
    }
}
