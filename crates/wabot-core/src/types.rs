// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across adapter traits and the wabot crates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Recipient used for WhatsApp status updates.
pub const STATUS_BROADCAST_JID: &str = "status@broadcast";

/// Identifier assigned to a sent message by the messaging channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
    SessionTable,
}

// --- Scheduled tasks ---

/// What a scheduled task does when it becomes due.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Plain text message to the target JID.
    #[default]
    Message,
    /// Status update sent to the broadcast recipient.
    Status,
    /// Templated reminder text sent to the target JID.
    Reminder,
}

/// A time-triggered action persisted in the task store.
///
/// `executed` is the only durability marker: once it is `true` the task is
/// never returned as due again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: i64,
    pub trigger_time: DateTime<Utc>,
    pub action_type: ActionType,
    pub target_jid: String,
    pub content: Option<String>,
    /// Local media reference. Only meaningful for status tasks.
    pub media_path: Option<String>,
    pub executed: bool,
    pub created_at: DateTime<Utc>,
}

impl ScheduledTask {
    /// Returns true if the task has not executed and its trigger time is at or before `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.executed && self.trigger_time <= now
    }
}

/// A task that has not been stored yet. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub trigger_time: DateTime<Utc>,
    pub action_type: ActionType,
    pub target_jid: String,
    pub content: Option<String>,
    pub media_path: Option<String>,
}

impl NewTask {
    /// A task of the given type carrying text content for `jid`.
    pub fn new(
        action_type: ActionType,
        jid: impl Into<String>,
        trigger_time: DateTime<Utc>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            trigger_time,
            action_type,
            target_jid: jid.into(),
            content: Some(content.into()),
            media_path: None,
        }
    }

    /// A status update. Either `content`, `media_path`, or both may be set.
    pub fn status(
        trigger_time: DateTime<Utc>,
        content: Option<String>,
        media_path: Option<String>,
    ) -> Self {
        Self {
            trigger_time,
            action_type: ActionType::Status,
            target_jid: STATUS_BROADCAST_JID.to_string(),
            content,
            media_path,
        }
    }
}

// --- Sessions ---

/// The flat set of files making up one authenticated device session.
///
/// Maps file name to raw file content. Contents are opaque; ordering is by
/// file name so serialized forms are canonical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialBundle(BTreeMap<String, String>);

impl CredentialBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fragment, returning the previous content for that name.
    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), content.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl From<BTreeMap<String, String>> for CredentialBundle {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CredentialBundle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A credential bundle persisted in the remote session table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub session_data: CredentialBundle,
    pub owner_phone: Option<String>,
    pub updated_at: DateTime<Utc>,
}

// --- Channel types ---

/// A text message to be delivered through a messaging channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Recipient chat, group, or broadcast JID.
    pub jid: String,
    pub text: String,
}

impl OutboundMessage {
    pub fn text(jid: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            jid: jid.into(),
            text: text.into(),
        }
    }
}
