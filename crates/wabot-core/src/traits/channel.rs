// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging channel trait for the connected WhatsApp socket.

use async_trait::async_trait;

use crate::error::WabotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{MessageId, OutboundMessage};

/// A live connection able to deliver messages to a JID.
///
/// One handle is shared by the scheduler and command handlers. The trait
/// applies no locking; implementations serialize writes themselves if the
/// underlying transport requires it.
#[async_trait]
pub trait MessagingChannel: PluginAdapter {
    /// Sends a message. Fails with [`WabotError::Channel`] when disconnected
    /// or when the transport rejects the message.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, WabotError>;
}
