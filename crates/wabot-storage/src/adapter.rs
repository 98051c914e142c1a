// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use wabot_config::model::StorageConfig;
use wabot_core::{
    AdapterType, HealthStatus, NewTask, PluginAdapter, ScheduledTask, SessionRecord, SessionTable,
    StorageAdapter, TaskStore, WabotError,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed task store and local session table.
///
/// The database is opened by [`StorageAdapter::initialize`]. Until then every
/// query fails with [`WabotError::StoreNotReady`], which a scheduler tick
/// treats as "try again next time".
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create an adapter for the configured path without opening it.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wrap an already opened database.
    pub fn from_database(config: StorageConfig, db: Database) -> Self {
        Self {
            config,
            db: OnceCell::new_with(Some(db)),
        }
    }

    fn db(&self) -> Result<&Database, WabotError> {
        self.db.get().ok_or_else(|| {
            WabotError::StoreNotReady("storage not initialized, call initialize() first".to_string())
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, WabotError> {
        match self.db() {
            Ok(db) => {
                db.run(|conn| conn.execute_batch("SELECT 1;")).await?;
                Ok(HealthStatus::Healthy)
            }
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), WabotError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), WabotError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| WabotError::Internal("storage already initialized".to_string()))?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), WabotError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl TaskStore for SqliteStorage {
    async fn insert_task(&self, task: NewTask) -> Result<ScheduledTask, WabotError> {
        queries::tasks::insert_task(self.db()?, task).await
    }

    async fn find_due_unexecuted(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledTask>, WabotError> {
        queries::tasks::find_due_unexecuted(self.db()?, now).await
    }

    async fn save_task(&self, task: &ScheduledTask) -> Result<(), WabotError> {
        queries::tasks::save_task(self.db()?, task).await
    }

    async fn get_task(&self, id: i64) -> Result<Option<ScheduledTask>, WabotError> {
        queries::tasks::get_task(self.db()?, id).await
    }
}

#[async_trait]
impl SessionTable for SqliteStorage {
    async fn insert(&self, record: &SessionRecord) -> Result<(), WabotError> {
        queries::sessions::insert_session(self.db()?, record).await
    }

    async fn select_by_key(&self, session_id: &str) -> Result<Option<SessionRecord>, WabotError> {
        queries::sessions::get_session(self.db()?, session_id).await
    }
}
