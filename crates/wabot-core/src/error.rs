// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the wabot workspace.

use strum::Display;
use thiserror::Error;

/// The primary error type used across all wabot adapter traits and core operations.
#[derive(Debug, Error)]
pub enum WabotError {
    /// Configuration errors (invalid TOML, missing credentials, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The task store cannot be queried yet (not initialized, schema missing).
    ///
    /// Recoverable: a scheduler tick that hits this silently skips.
    #[error("store not ready: {0}")]
    StoreNotReady(String),

    /// Messaging channel errors (disconnected socket, rejected send).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A remote session lookup found no record for the identifier.
    #[error("session not found: {session_id}")]
    NotFound { session_id: String },

    /// A session token or stored bundle could not be decoded.
    #[error("malformed session data: {0}")]
    Format(String),

    /// A credential bundle was requested from a missing or empty directory.
    #[error("no credential files found at {path}")]
    SourceMissing { path: String },

    /// Local filesystem errors while reading or writing credential fragments.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Remote session table errors (HTTP failure, unexpected response).
    #[error("remote store error: {message}")]
    Remote {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A scheduled task row cannot be dispatched as stored.
    #[error("task {id} cannot be dispatched: {reason}")]
    InvalidTask { id: i64, reason: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Fieldless discriminant of [`WabotError`], for matching and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Config,
    Storage,
    StoreNotReady,
    Channel,
    NotFound,
    Format,
    SourceMissing,
    Io,
    Remote,
    InvalidTask,
    Timeout,
    Internal,
}

impl WabotError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            WabotError::Config(_) => ErrorKind::Config,
            WabotError::Storage { .. } => ErrorKind::Storage,
            WabotError::StoreNotReady(_) => ErrorKind::StoreNotReady,
            WabotError::Channel { .. } => ErrorKind::Channel,
            WabotError::NotFound { .. } => ErrorKind::NotFound,
            WabotError::Format(_) => ErrorKind::Format,
            WabotError::SourceMissing { .. } => ErrorKind::SourceMissing,
            WabotError::Io { .. } => ErrorKind::Io,
            WabotError::Remote { .. } => ErrorKind::Remote,
            WabotError::InvalidTask { .. } => ErrorKind::InvalidTask,
            WabotError::Timeout { .. } => ErrorKind::Timeout,
            WabotError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Builds an [`WabotError::Io`] for the given path.
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        WabotError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Builds a [`WabotError::Channel`] without an underlying source.
    pub fn channel(message: impl Into<String>) -> Self {
        WabotError::Channel {
            message: message.into(),
            source: None,
        }
    }
}
