// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messaging channel for deterministic tests.
//!
//! Successful sends are captured for assertions. Failures can be injected
//! per call number, per recipient, or for every send (disconnected).

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use wabot_core::traits::adapter::PluginAdapter;
use wabot_core::traits::channel::MessagingChannel;
use wabot_core::types::{AdapterType, HealthStatus, MessageId, OutboundMessage};
use wabot_core::WabotError;

/// A messaging channel that records what it was asked to send.
pub struct MockChannel {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    calls: AtomicUsize,
    connected: AtomicBool,
    fail_calls: HashSet<usize>,
    fail_jids: HashSet<String>,
    delay: Option<Duration>,
}

impl MockChannel {
    /// A connected channel on which every send succeeds.
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            calls: AtomicUsize::new(0),
            connected: AtomicBool::new(true),
            fail_calls: HashSet::new(),
            fail_jids: HashSet::new(),
            delay: None,
        }
    }

    /// Fail the `n`th call to `send` (1-based).
    pub fn with_failure_on_call(mut self, n: usize) -> Self {
        self.fail_calls.insert(n);
        self
    }

    /// Fail every send addressed to `jid`.
    pub fn with_failure_for_jid(mut self, jid: impl Into<String>) -> Self {
        self.fail_jids.insert(jid.into());
        self
    }

    /// Sleep this long inside every send before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Simulate the socket dropping (or coming back).
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Messages whose send succeeded, in order.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Number of send attempts, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, WabotError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy("disconnected".to_string()))
        }
    }

    async fn shutdown(&self) -> Result<(), WabotError> {
        Ok(())
    }
}

#[async_trait]
impl MessagingChannel for MockChannel {
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, WabotError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if !self.connected.load(Ordering::SeqCst) {
            return Err(WabotError::channel("connection closed"));
        }
        if self.fail_calls.contains(&call) {
            return Err(WabotError::channel(format!("injected failure on call {call}")));
        }
        if self.fail_jids.contains(&msg.jid) {
            return Err(WabotError::channel(format!("injected failure for {}", msg.jid)));
        }
        self.sent.lock().await.push(msg);
        Ok(MessageId(format!("mock-msg-{}", uuid::Uuid::new_v4())))
    }
}
