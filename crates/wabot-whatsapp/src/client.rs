// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Cloud API text sender.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use wabot_config::model::WhatsAppConfig;
use wabot_core::{
    AdapterType, HealthStatus, MessageId, MessagingChannel, OutboundMessage, PluginAdapter,
    WabotError,
};

use crate::jid::to_recipient;

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[serde(default)]
    code: Option<i64>,
}

/// Sends text messages through the Graph API `/{phone_number_id}/messages` endpoint.
#[derive(Debug, Clone)]
pub struct CloudApiChannel {
    client: reqwest::Client,
    endpoint: String,
}

impl CloudApiChannel {
    /// Build a channel from config. Both the token and phone number id are required.
    pub fn new(config: &WhatsAppConfig) -> Result<Self, WabotError> {
        let (Some(token), Some(phone_number_id)) = (&config.access_token, &config.phone_number_id)
        else {
            return Err(WabotError::Config(
                "whatsapp.access_token and whatsapp.phone_number_id are required".to_string(),
            ));
        };

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| WabotError::Config(format!("invalid access token header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WabotError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/{}/messages",
                config.api_base.trim_end_matches('/'),
                phone_number_id
            ),
        })
    }
}

#[async_trait]
impl PluginAdapter for CloudApiChannel {
    fn name(&self) -> &str {
        "whatsapp-cloud"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, WabotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WabotError> {
        Ok(())
    }
}

#[async_trait]
impl MessagingChannel for CloudApiChannel {
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, WabotError> {
        let to = to_recipient(&msg.jid)?;
        let body = json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "text",
            "text": { "preview_url": false, "body": msg.text },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| WabotError::Channel {
                message: format!("Cloud API request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        debug!(status = %status, to = %to, "Cloud API response received");

        if !status.is_success() {
            let detail = match serde_json::from_str::<ApiErrorResponse>(&text) {
                Ok(err) => match err.error.code {
                    Some(code) => format!("{} (code {code})", err.error.message),
                    None => err.error.message,
                },
                Err(_) => text,
            };
            return Err(WabotError::channel(format!("Cloud API returned {status}: {detail}")));
        }

        let parsed: SendResponse = serde_json::from_str(&text).map_err(|e| WabotError::Channel {
            message: format!("unexpected Cloud API response: {e}"),
            source: Some(Box::new(e)),
        })?;
        parsed
            .messages
            .into_iter()
            .next()
            .map(|m| MessageId(m.id))
            .ok_or_else(|| WabotError::channel("Cloud API response carried no message id"))
    }
}
