// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the wabot WhatsApp automation bot.
//!
//! This crate provides the error taxonomy, domain types, and adapter traits
//! shared by the scheduler, session, storage, and channel crates.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ErrorKind, WabotError};
pub use types::{
    ActionType, AdapterType, CredentialBundle, HealthStatus, MessageId, NewTask,
    OutboundMessage, STATUS_BROADCAST_JID, ScheduledTask, SessionRecord,
};

pub use traits::{MessagingChannel, PluginAdapter, SessionTable, StorageAdapter, TaskStore};
