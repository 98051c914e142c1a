// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the scheduler and session stack over a temp
//! SQLite database and a [`MockChannel`]. Ticks are driven explicitly with
//! [`TestHarness::tick`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use wabot_config::model::{SchedulerConfig, StorageConfig};
use wabot_core::{ActionType, ScheduledTask, StorageAdapter, WabotError};
use wabot_scheduler::{Scheduler, TickOutcome, schedule_message};
use wabot_session::{CredentialCodec, RemoteSessionStore, SessionPersistence};
use wabot_storage::SqliteStorage;

use crate::mock_channel::MockChannel;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    channel: MockChannel,
    scheduler: SchedulerConfig,
    token_prefix: Option<String>,
    remote: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            channel: MockChannel::new(),
            scheduler: SchedulerConfig::default(),
            token_prefix: None,
            remote: true,
        }
    }

    /// Use a preconfigured mock channel (failures, delays).
    pub fn with_channel(mut self, channel: MockChannel) -> Self {
        self.channel = channel;
        self
    }

    /// Override scheduler settings (template, status JID, timeout).
    pub fn with_scheduler_config(mut self, config: SchedulerConfig) -> Self {
        self.scheduler = config;
        self
    }

    /// Use a custom token prefix for the credential codec.
    pub fn with_token_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.token_prefix = Some(prefix.into());
        self
    }

    /// Disable the remote session store so persistence always yields a token.
    pub fn without_remote(mut self) -> Self {
        self.remote = false;
        self
    }

    /// Build the harness, creating and migrating a temp database.
    pub async fn build(self) -> Result<TestHarness, WabotError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| WabotError::io(std::env::temp_dir(), e))?;
        let db_path = temp_dir.path().join("test.db");

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let storage = Arc::new(storage);

        let channel = Arc::new(self.channel);
        let scheduler = Arc::new(Scheduler::new(
            storage.clone(),
            channel.clone(),
            self.scheduler,
        ));

        let codec = match self.token_prefix {
            Some(prefix) => CredentialCodec::new(prefix),
            None => CredentialCodec::default(),
        };
        let remote = self
            .remote
            .then(|| RemoteSessionStore::new(storage.clone(), "wbot-"));
        let persistence = SessionPersistence::new(codec, remote);

        Ok(TestHarness {
            storage,
            channel,
            scheduler,
            persistence,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock channel and temp storage.
pub struct TestHarness {
    /// SQLite storage (temp DB, removed on drop). Also the session table.
    pub storage: Arc<SqliteStorage>,
    /// The mock channel every send goes through.
    pub channel: Arc<MockChannel>,
    pub scheduler: Arc<Scheduler>,
    pub persistence: SessionPersistence,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Scratch directory owned by this harness.
    pub fn path(&self) -> &Path {
        self._temp_dir.path()
    }

    /// Enqueue a text task through the public scheduling helper.
    pub async fn schedule(
        &self,
        action_type: ActionType,
        jid: &str,
        at: DateTime<Utc>,
        content: &str,
    ) -> Result<ScheduledTask, WabotError> {
        schedule_message(&*self.storage, jid, at, content, action_type).await
    }

    /// Run one scheduler tick as of `now`.
    pub async fn tick(&self, now: DateTime<Utc>) -> TickOutcome {
        self.scheduler.tick(now).await
    }

    /// Write a credential bundle into `<tmp>/<name>` and return the directory.
    pub async fn write_credentials(
        &self,
        name: &str,
        files: &[(&str, &str)],
    ) -> Result<PathBuf, WabotError> {
        let dir = self.path().join(name);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| WabotError::io(&dir, e))?;
        for (file, content) in files {
            let path = dir.join(file);
            tokio::fs::write(&path, content)
                .await
                .map_err(|e| WabotError::io(&path, e))?;
        }
        Ok(dir)
    }
}
