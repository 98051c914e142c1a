// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database handle: connection setup, PRAGMAs, migrations and shutdown.
//!
//! Every statement runs on tokio-rusqlite's single background thread, which
//! makes [`Database`] the only writer. Do not open a second connection for writes.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;
use wabot_core::WabotError;

/// Owned handle to the SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs and run migrations.
    pub async fn open(path: &str) -> Result<Self, WabotError> {
        Self::open_with(path, true).await
    }

    /// Like [`Database::open`] with control over journal mode.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, WabotError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| WabotError::io(parent, e))?;
        }
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| WabotError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.prepare(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// A migrated in-memory database.
    pub async fn open_in_memory() -> Result<Self, WabotError> {
        let db = Self::open_in_memory_unmigrated().await?;
        db.prepare(false).await?;
        Ok(db)
    }

    /// An in-memory database with no schema, for exercising not-ready paths.
    #[doc(hidden)]
    pub async fn open_in_memory_unmigrated() -> Result<Self, WabotError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| WabotError::Storage {
                source: Box::new(e),
            })?;
        Ok(Self { conn })
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), WabotError> {
        self.run(move |conn| {
            if wal_mode {
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                    row.get::<_, String>(0)
                })?;
            }
            conn.execute_batch(
                "PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA foreign_keys = ON;",
            )?;
            Ok(())
        })
        .await?;

        self.conn
            .call(|conn| Ok::<_, rusqlite::Error>(crate::migrations::run_migrations(conn)))
            .await
            .map_err(map_tr_err)?
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Run `f` on the writer thread, classifying SQLite failures.
    ///
    /// A missing table becomes [`WabotError::StoreNotReady`]; everything else
    /// is [`WabotError::Storage`].
    pub async fn run<T, F>(&self, f: F) -> Result<T, WabotError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<T, rusqlite::Error> + Send + 'static,
        T: Send + 'static,
    {
        self.conn
            .call(move |conn| Ok::<_, rusqlite::Error>(f(conn).map_err(classify)))
            .await
            .map_err(map_tr_err)?
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), WabotError> {
        self.checkpoint().await?;
        self.conn.close().await.map_err(|e| WabotError::Storage {
            source: Box::new(e),
        })
    }

    /// Fold the WAL back into the main database file.
    pub async fn checkpoint(&self) -> Result<(), WabotError> {
        self.run(|conn| conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);"))
            .await
    }
}

/// Convert tokio-rusqlite transport errors (closed connection) to storage errors.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> WabotError {
    WabotError::Storage {
        source: Box::new(e),
    }
}

fn classify(e: rusqlite::Error) -> WabotError {
    match &e {
        rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.starts_with("no such table") => {
            WabotError::StoreNotReady(msg.clone())
        }
        _ => WabotError::Storage {
            source: Box::new(e),
        },
    }
}

/// Canonical text form for stored instants: fixed-width UTC with milliseconds,
/// so lexical order in SQL matches chronological order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp, surfacing corrupt values as a conversion error.
pub(crate) fn parse_timestamp(idx: usize, raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_file_and_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("wabot.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        assert!(path.exists());

        let tables: Vec<String> = db
            .run(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();
        assert!(tables.contains(&"scheduled_tasks".to_string()));
        assert!(tables.contains(&"wa_sessions".to_string()));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("again.db");
        let path = path.to_str().unwrap();
        Database::open(path).await.unwrap().close().await.unwrap();
        Database::open(path).await.unwrap().close().await.unwrap();
    }

    #[tokio::test]
    async fn wal_mode_is_applied() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("wal.db").to_str().unwrap())
            .await
            .unwrap();
        let mode: String = db
            .run(|conn| conn.query_row("PRAGMA journal_mode", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn missing_table_is_not_ready() {
        let db = Database::open_in_memory_unmigrated().await.unwrap();
        let err = db
            .run(|conn| conn.query_row("SELECT COUNT(*) FROM scheduled_tasks", [], |row| row.get::<_, i64>(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, WabotError::StoreNotReady(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn syntax_error_is_storage() {
        let db = Database::open_in_memory().await.unwrap();
        let err = db.run(|conn| conn.execute_batch("SELEKT 1")).await.unwrap_err();
        assert!(matches!(err, WabotError::Storage { .. }));
    }

    #[test]
    fn timestamps_sort_lexically() {
        let a = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let b = a + chrono::Duration::milliseconds(1);
        assert_eq!(format_timestamp(a), "2026-01-02T03:04:05.000Z");
        assert!(format_timestamp(a) < format_timestamp(b));
        assert_eq!(parse_timestamp(0, &format_timestamp(b)).unwrap(), b);
    }
}
