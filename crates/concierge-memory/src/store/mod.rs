//! SQLite-backed persistent store.
//!
//! Split into focused submodules:
//! - `sessions`: per-user session row and partial-patch upsert
//! - `history`: conversation turns for classifier/orchestrator context
//! - `reminders`: reminder CRUD, duplicate detection and snooze

mod history;
mod reminders;
mod sessions;

pub use reminders::{Reminder, ReminderOutcome, ReminderStatus};

use concierge_core::{config::MemoryConfig, error::ConciergeError, shellexpand};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

/// Persistent store backed by SQLite.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the database and run pending migrations.
    ///
    /// A `db_path` of `:memory:` gives a private in-memory database.
    pub async fn new(config: &MemoryConfig) -> Result<Self, ConciergeError> {
        if config.db_path == ":memory:" {
            return Self::open_in_memory().await;
        }

        let db_path = shellexpand(&config.db_path);

        if let Some(parent) = std::path::Path::new(&db_path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConciergeError::Memory(format!("failed to create data dir: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| ConciergeError::Memory(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| ConciergeError::Memory(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        info!("memory store initialized at {db_path}");

        Ok(Self { pool })
    }

    /// In-memory database on a single connection (each connection would
    /// otherwise see its own empty database).
    pub async fn open_in_memory() -> Result<Self, ConciergeError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| ConciergeError::Memory(format!("invalid db path: {e}")))?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .map_err(|e| ConciergeError::Memory(format!("failed to open sqlite: {e}")))?;
        Self::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the database file size in bytes.
    pub async fn db_size(&self) -> Result<u64, ConciergeError> {
        let (page_count,): (i64,) = sqlx::query_as("PRAGMA page_count")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ConciergeError::Memory(format!("pragma failed: {e}")))?;

        let (page_size,): (i64,) = sqlx::query_as("PRAGMA page_size")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ConciergeError::Memory(format!("pragma failed: {e}")))?;

        Ok((page_count * page_size) as u64)
    }

    /// Run SQL migrations, tracking which have already been applied.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), ConciergeError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| ConciergeError::Memory(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] = &[
            (
                "001_sessions",
                include_str!("../../migrations/001_sessions.sql"),
            ),
            (
                "002_history",
                include_str!("../../migrations/002_history.sql"),
            ),
            (
                "003_reminders",
                include_str!("../../migrations/003_reminders.sql"),
            ),
        ];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        ConciergeError::Memory(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| ConciergeError::Memory(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| {
                    ConciergeError::Memory(format!("failed to record migration {name}: {e}"))
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
