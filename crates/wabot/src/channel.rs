// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel selection for `wabot serve`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use wabot_config::model::WabotConfig;
use wabot_core::{
    AdapterType, HealthStatus, MessageId, MessagingChannel, OutboundMessage, PluginAdapter,
    WabotError,
};

/// Dry-run channel: logs every message instead of delivering it.
///
/// Used when no real channel is configured so schedules can be exercised
/// end to end without sending anything.
#[derive(Debug, Default)]
pub struct LogChannel;

#[async_trait]
impl PluginAdapter for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, WabotError> {
        Ok(HealthStatus::Degraded("dry run, messages are not delivered".to_string()))
    }

    async fn shutdown(&self) -> Result<(), WabotError> {
        Ok(())
    }
}

#[async_trait]
impl MessagingChannel for LogChannel {
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, WabotError> {
        let id = format!("dry-run-{}", uuid::Uuid::new_v4());
        info!(jid = %msg.jid, message_id = %id, text = %msg.text, "dry run send");
        Ok(MessageId(id))
    }
}

/// Pick the delivery channel: the Cloud API when credentials are set,
/// otherwise [`LogChannel`].
pub fn build_channel(config: &WabotConfig) -> Result<Arc<dyn MessagingChannel>, WabotError> {
    let configured =
        config.whatsapp.access_token.is_some() && config.whatsapp.phone_number_id.is_some();

    #[cfg(feature = "whatsapp")]
    if configured {
        let channel = wabot_whatsapp::CloudApiChannel::new(&config.whatsapp)?;
        info!("using WhatsApp Cloud API channel");
        warn!(
            status_jid = %config.scheduler.status_jid,
            "the Cloud API delivers to individual chats only; status and group tasks will fail and be marked executed"
        );
        return Ok(Arc::new(channel));
    }

    if configured {
        warn!("whatsapp credentials set but the whatsapp feature is not compiled in");
    } else {
        warn!("no whatsapp credentials configured, running in dry-run mode");
    }
    Ok(Arc::new(LogChannel))
}
