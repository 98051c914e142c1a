// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote session store: upload a bundle under a fresh identifier, restore it later.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use wabot_core::{SessionRecord, SessionTable, WabotError};

use crate::bundle::{read_bundle, write_bundle};

/// Persists credential bundles as structured records in a [`SessionTable`].
///
/// Records are write-once. Re-pairing uploads a new record under a new id.
#[derive(Clone)]
pub struct RemoteSessionStore {
    table: Arc<dyn SessionTable>,
    id_prefix: String,
}

impl RemoteSessionStore {
    pub fn new(table: Arc<dyn SessionTable>, id_prefix: impl Into<String>) -> Self {
        Self {
            table,
            id_prefix: id_prefix.into(),
        }
    }

    /// A new identifier: the configured prefix followed by a random UUID.
    pub fn new_session_id(&self) -> String {
        format!("{}{}", self.id_prefix, Uuid::new_v4())
    }

    /// Upload the bundle in `bundle_dir` and return its new session id.
    ///
    /// The directory is read before the table is touched, so a missing or
    /// empty source fails with [`WabotError::SourceMissing`] and no record
    /// is created.
    pub async fn upload(
        &self,
        bundle_dir: &Path,
        owner_phone: Option<&str>,
    ) -> Result<String, WabotError> {
        let session_data = read_bundle(bundle_dir).await?;
        let record = SessionRecord {
            session_id: self.new_session_id(),
            session_data,
            owner_phone: owner_phone.map(str::to_owned),
            updated_at: Utc::now(),
        };
        self.table.insert(&record).await?;
        info!(
            session_id = %record.session_id,
            files = record.session_data.len(),
            "session uploaded"
        );
        Ok(record.session_id)
    }

    /// Fetch the record for `session_id`, failing with [`WabotError::NotFound`].
    pub async fn fetch(&self, session_id: &str) -> Result<SessionRecord, WabotError> {
        self.table
            .select_by_key(session_id)
            .await?
            .ok_or_else(|| WabotError::NotFound {
                session_id: session_id.to_string(),
            })
    }

    /// Write the files stored under `session_id` into `target_dir`.
    /// Returns the number of files restored.
    pub async fn restore(&self, session_id: &str, target_dir: &Path) -> Result<usize, WabotError> {
        let record = self.fetch(session_id).await?;
        let restored = write_bundle(&record.session_data, target_dir).await?;
        info!(session_id, files = restored, dir = %target_dir.display(), "session restored");
        Ok(restored)
    }
}
