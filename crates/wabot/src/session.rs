// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wabot session` subcommands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Subcommand;
use tracing::{info, warn};
use wabot_config::RemoteBackend;
use wabot_config::model::WabotConfig;
use wabot_core::{SessionTable, StorageAdapter, WabotError};
use wabot_session::{
    CredentialCodec, PersistedSession, RemoteSessionStore, SessionPersistence, generate_id,
};
use wabot_storage::SqliteStorage;

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Print the credential directory as a single token.
    Encode {
        /// Credential directory (defaults to `session.auth_dir`).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Write the files carried by a token into the credential directory.
    Decode {
        token: String,
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Save credentials to the remote store, falling back to a token.
    Upload {
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Phone number recorded as the session owner.
        #[arg(long)]
        owner: Option<String>,
    },
    /// Restore credentials from a token or a remote session id.
    Restore {
        identifier: String,
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Report whether a string is a well-formed session token.
    Check { token: String },
    /// Print a fresh human-readable session identifier.
    NewId,
}

pub async fn run(config: &WabotConfig, cmd: SessionCommand) -> Result<(), WabotError> {
    let codec = CredentialCodec::new(config.session.token_prefix.clone());
    let auth_dir = |dir: Option<PathBuf>| dir.unwrap_or_else(|| PathBuf::from(&config.session.auth_dir));

    match cmd {
        SessionCommand::Encode { dir } => {
            println!("{}", codec.encode(&auth_dir(dir)).await?);
        }
        SessionCommand::Decode { token, dir } => {
            let dir = auth_dir(dir);
            let written = codec.decode(&token, &dir).await?;
            println!("restored {written} file(s) into {}", dir.display());
        }
        SessionCommand::Upload { dir, owner } => {
            let owner = owner.or_else(|| config.bot.owner_phone.clone());
            match upload(config, codec, &auth_dir(dir), owner.as_deref()).await? {
                PersistedSession::Remote(id) => println!("session id: {id}"),
                PersistedSession::Token(token) => {
                    println!("remote store unavailable, session token:");
                    println!("{token}");
                }
            }
        }
        SessionCommand::Restore { identifier, dir } => {
            let dir = auth_dir(dir);
            let remote = if codec.is_valid_token(identifier.trim()) {
                None
            } else {
                open_remote(config).await?
            };
            let persistence = SessionPersistence::new(codec, remote);
            let written = persistence.restore_credentials(&identifier, &dir).await?;
            println!("restored {written} file(s) into {}", dir.display());
        }
        SessionCommand::Check { token } => {
            if codec.is_valid_token(&token) {
                println!("valid session token");
            } else {
                return Err(WabotError::Format(format!(
                    "not a session token (expected prefix `{}` followed by base64)",
                    codec.prefix()
                )));
            }
        }
        SessionCommand::NewId => println!("{}", generate_id()),
    }
    Ok(())
}

/// Persist the bundle in `dir`, remotely when possible.
///
/// A remote store that cannot be opened is treated like one that rejects
/// the insert: the credentials come back as a token.
async fn upload(
    config: &WabotConfig,
    codec: CredentialCodec,
    dir: &Path,
    owner: Option<&str>,
) -> Result<PersistedSession, WabotError> {
    let remote = match open_remote(config).await {
        Ok(remote) => remote,
        Err(e) => {
            warn!(error = %e, "remote session store unavailable, falling back to token");
            None
        }
    };
    SessionPersistence::new(codec, remote)
        .persist_credentials(dir, owner)
        .await
}

/// Open the configured remote session table, if any.
pub async fn open_remote(config: &WabotConfig) -> Result<Option<RemoteSessionStore>, WabotError> {
    let table: Arc<dyn SessionTable> = match config.session.remote_backend {
        RemoteBackend::None => return Ok(None),
        RemoteBackend::Sqlite => {
            let storage = SqliteStorage::new(config.storage.clone());
            storage.initialize().await?;
            Arc::new(storage)
        }
        #[cfg(feature = "supabase")]
        RemoteBackend::Supabase => {
            Arc::new(wabot_supabase::SupabaseSessionTable::new(&config.supabase)?)
        }
        #[cfg(not(feature = "supabase"))]
        RemoteBackend::Supabase => {
            return Err(WabotError::Config(
                "remote_backend = \"supabase\" requires the supabase feature".to_string(),
            ));
        }
    };
    info!(backend = ?config.session.remote_backend, "remote session store opened");
    Ok(Some(RemoteSessionStore::new(
        table,
        config.session.session_id_prefix.clone(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wabot_core::ErrorKind;

    fn config_in(root: &Path, backend: RemoteBackend) -> WabotConfig {
        let mut config = WabotConfig::default();
        config.storage.database_path = root.join("wabot.db").to_string_lossy().into_owned();
        config.session.auth_dir = root.join("auth_info").to_string_lossy().into_owned();
        config.session.remote_backend = backend;
        config
    }

    async fn write_creds(dir: &Path) {
        tokio::fs::create_dir_all(dir).await.unwrap();
        tokio::fs::write(dir.join("creds.json"), r#"{"me":{"id":"1"}}"#)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn no_backend_means_no_remote() {
        let tmp = tempdir().unwrap();
        let config = config_in(tmp.path(), RemoteBackend::None);
        assert!(open_remote(&config).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sqlite_backend_round_trips_through_session_id() {
        let tmp = tempdir().unwrap();
        let config = config_in(tmp.path(), RemoteBackend::Sqlite);
        write_creds(Path::new(&config.session.auth_dir)).await;

        let remote = open_remote(&config).await.unwrap().unwrap();
        let id = remote
            .upload(Path::new(&config.session.auth_dir), None)
            .await
            .unwrap();
        assert!(id.starts_with("wbot-"));

        let target = tmp.path().join("restored");
        run(
            &config,
            SessionCommand::Restore {
                identifier: id,
                dir: Some(target.clone()),
            },
        )
        .await
        .unwrap();
        assert!(target.join("creds.json").exists());
    }

    #[tokio::test]
    async fn check_rejects_generated_ids() {
        let tmp = tempdir().unwrap();
        let config = config_in(tmp.path(), RemoteBackend::None);
        let err = run(&config, SessionCommand::Check { token: generate_id() })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[tokio::test]
    async fn restore_unknown_id_without_remote_is_config_error() {
        let tmp = tempdir().unwrap();
        let config = config_in(tmp.path(), RemoteBackend::None);
        let err = run(
            &config,
            SessionCommand::Restore {
                identifier: "wbot-missing".to_string(),
                dir: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[tokio::test]
    async fn encode_of_missing_dir_fails() {
        let tmp = tempdir().unwrap();
        let config = config_in(tmp.path(), RemoteBackend::None);
        let err = run(&config, SessionCommand::Encode { dir: None }).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceMissing);
    }

    #[tokio::test]
    async fn upload_falls_back_to_token_when_store_cannot_open() {
        let tmp = tempdir().unwrap();
        let mut config = config_in(tmp.path(), RemoteBackend::Sqlite);
        let blocker = tmp.path().join("not-a-dir");
        tokio::fs::write(&blocker, "x").await.unwrap();
        config.storage.database_path = blocker.join("wabot.db").to_string_lossy().into_owned();
        let auth = PathBuf::from(&config.session.auth_dir);
        write_creds(&auth).await;

        assert!(open_remote(&config).await.is_err());
        let codec = CredentialCodec::new(config.session.token_prefix.clone());
        let persisted = upload(&config, codec.clone(), &auth, None).await.unwrap();
        let PersistedSession::Token(token) = persisted else {
            panic!("expected a token, got {persisted:?}");
        };
        assert!(codec.is_valid_token(&token));
    }

    #[tokio::test]
    async fn upload_uses_remote_when_available() {
        let tmp = tempdir().unwrap();
        let config = config_in(tmp.path(), RemoteBackend::Sqlite);
        let auth = PathBuf::from(&config.session.auth_dir);
        write_creds(&auth).await;

        let codec = CredentialCodec::new(config.session.token_prefix.clone());
        let persisted = upload(&config, codec, &auth, Some("15551234567")).await.unwrap();
        assert!(matches!(persisted, PersistedSession::Remote(ref id) if id.starts_with("wbot-")));
    }
}
