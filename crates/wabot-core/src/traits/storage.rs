// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage traits: backend lifecycle, the scheduled task store, and the
//! remote session table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::WabotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{NewTask, ScheduledTask, SessionRecord};

/// Adapter for storage and persistence backends.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection).
    async fn initialize(&self) -> Result<(), WabotError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), WabotError>;
}

/// Durable table of time-triggered actions.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persists a new task with `executed = false` and returns it with its assigned id.
    async fn insert_task(&self, task: NewTask) -> Result<ScheduledTask, WabotError>;

    /// Returns every task with `executed = false` and `trigger_time <= now`.
    ///
    /// Fails with [`WabotError::StoreNotReady`] while the store cannot be
    /// queried yet (uninitialized, schema missing).
    async fn find_due_unexecuted(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledTask>, WabotError>;

    /// Persists the mutable state of an existing task (its `executed` flag).
    async fn save_task(&self, task: &ScheduledTask) -> Result<(), WabotError>;

    /// Looks up a task by id.
    async fn get_task(&self, id: i64) -> Result<Option<ScheduledTask>, WabotError>;
}

/// Durable, globally addressable table of session records.
#[async_trait]
pub trait SessionTable: Send + Sync {
    /// Writes a new record. Records are never updated in place.
    async fn insert(&self, record: &SessionRecord) -> Result<(), WabotError>;

    /// Looks up a record by exact session id.
    async fn select_by_key(&self, session_id: &str) -> Result<Option<SessionRecord>, WabotError>;
}
