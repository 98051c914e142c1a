// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisting freshly paired credentials, and getting them back.
//!
//! The remote store is preferred. When it is not configured or the write
//! fails, the bundle is encoded into a self-contained token instead so
//! pairing still succeeds.

use std::fmt;
use std::path::Path;

use tracing::{info, warn};
use wabot_core::WabotError;

use crate::codec::CredentialCodec;
use crate::remote::RemoteSessionStore;

/// Where a paired session ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistedSession {
    /// Stored remotely under this session id.
    Remote(String),
    /// Encoded locally into this token.
    Token(String),
}

impl PersistedSession {
    /// The string a user hands back to reconnect.
    pub fn identifier(&self) -> &str {
        match self {
            PersistedSession::Remote(id) | PersistedSession::Token(id) => id,
        }
    }
}

impl fmt::Display for PersistedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Persistence policy combining the codec and an optional remote store.
#[derive(Clone)]
pub struct SessionPersistence {
    codec: CredentialCodec,
    remote: Option<RemoteSessionStore>,
}

impl SessionPersistence {
    pub fn new(codec: CredentialCodec, remote: Option<RemoteSessionStore>) -> Self {
        Self { codec, remote }
    }

    pub fn codec(&self) -> &CredentialCodec {
        &self.codec
    }

    pub fn remote(&self) -> Option<&RemoteSessionStore> {
        self.remote.as_ref()
    }

    /// Save the bundle in `auth_dir` after pairing.
    ///
    /// A missing or empty `auth_dir` is returned as-is: the token path would
    /// fail the same way.
    pub async fn persist_credentials(
        &self,
        auth_dir: &Path,
        owner_phone: Option<&str>,
    ) -> Result<PersistedSession, WabotError> {
        if let Some(remote) = &self.remote {
            match remote.upload(auth_dir, owner_phone).await {
                Ok(id) => return Ok(PersistedSession::Remote(id)),
                Err(e @ WabotError::SourceMissing { .. }) => return Err(e),
                Err(e) => warn!(error = %e, "remote session upload failed, falling back to token"),
            }
        }
        let token = self.codec.encode(auth_dir).await?;
        info!(bytes = token.len(), "session encoded as token");
        Ok(PersistedSession::Token(token))
    }

    /// Restore credentials from either a token or a remote session id.
    ///
    /// Anything passing [`CredentialCodec::is_valid_token`] is decoded
    /// locally. Everything else is looked up in the remote store.
    pub async fn restore_credentials(
        &self,
        identifier: &str,
        target_dir: &Path,
    ) -> Result<usize, WabotError> {
        let identifier = identifier.trim();
        if self.codec.is_valid_token(identifier) {
            return self.codec.decode(identifier, target_dir).await;
        }
        match &self.remote {
            Some(remote) => remote.restore(identifier, target_dir).await,
            None => Err(WabotError::Config(format!(
                "`{identifier}` is not a session token and no remote session store is configured"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::{TempDir, tempdir};
    use wabot_test_utils::MemorySessionTable;

    fn paired_dir() -> TempDir {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("creds.json"), "{\"registered\":true}").unwrap();
        std::fs::write(dir.path().join("app-state-sync-version-regular.json"), "3").unwrap();
        dir
    }

    fn with_table(table: &Arc<MemorySessionTable>) -> SessionPersistence {
        SessionPersistence::new(
            CredentialCodec::default(),
            Some(RemoteSessionStore::new(table.clone(), "wbot-")),
        )
    }

    #[tokio::test]
    async fn remote_preferred_when_available() {
        let table = Arc::new(MemorySessionTable::new());
        let persisted = with_table(&table)
            .persist_credentials(paired_dir().path(), None)
            .await
            .unwrap();
        assert!(matches!(persisted, PersistedSession::Remote(ref id) if id.starts_with("wbot-")));
    }

    #[tokio::test]
    async fn falls_back_to_token_when_remote_write_fails() {
        let table = Arc::new(MemorySessionTable::new());
        table.fail_inserts(true);
        let persistence = with_table(&table);
        let src = paired_dir();

        let persisted = persistence.persist_credentials(src.path(), None).await.unwrap();
        let PersistedSession::Token(token) = &persisted else {
            panic!("expected token fallback, got {persisted:?}");
        };
        assert!(token.starts_with("WBOT_"));

        let dst = tempdir().unwrap();
        assert_eq!(persistence.restore_credentials(token, dst.path()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn no_remote_means_token() {
        let persistence = SessionPersistence::new(CredentialCodec::default(), None);
        let persisted = persistence
            .persist_credentials(paired_dir().path(), None)
            .await
            .unwrap();
        assert!(matches!(persisted, PersistedSession::Token(_)));
    }

    #[tokio::test]
    async fn missing_source_does_not_fall_back() {
        let table = Arc::new(MemorySessionTable::new());
        let empty = tempdir().unwrap();
        let err = with_table(&table)
            .persist_credentials(empty.path(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, WabotError::SourceMissing { .. }));
    }

    #[tokio::test]
    async fn restore_routes_ids_to_remote() {
        let table = Arc::new(MemorySessionTable::new());
        let persistence = with_table(&table);
        let id = persistence
            .persist_credentials(paired_dir().path(), Some("15550001111"))
            .await
            .unwrap();

        let dst = tempdir().unwrap();
        let restored = persistence
            .restore_credentials(id.identifier(), dst.path())
            .await
            .unwrap();
        assert_eq!(restored, 2);
        assert_eq!(
            std::fs::read_to_string(dst.path().join("creds.json")).unwrap(),
            "{\"registered\":true}"
        );
    }

    #[tokio::test]
    async fn unknown_identifier_without_remote_is_config_error() {
        let persistence = SessionPersistence::new(CredentialCodec::default(), None);
        let dst = tempdir().unwrap();
        let err = persistence
            .restore_credentials("wbot-1234", dst.path())
            .await
            .unwrap_err();
        assert!(matches!(err, WabotError::Config(_)));
    }
}
