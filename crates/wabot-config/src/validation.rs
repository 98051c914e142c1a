// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::{RemoteBackend, WabotConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Every failing rule is reported; validation does not stop at the first one.
pub fn validate_config(config: &WabotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.bot.log_level.as_str()) {
        fail(format!(
            "bot.log_level `{}` is not one of {}",
            config.bot.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let scheduler = &config.scheduler;
    if scheduler.tick_interval_secs == 0 {
        fail("scheduler.tick_interval_secs must be at least 1".to_string());
    }
    if scheduler.send_timeout_secs == 0 {
        fail("scheduler.send_timeout_secs must be at least 1".to_string());
    }
    if scheduler.status_jid.trim().is_empty() {
        fail("scheduler.status_jid must not be empty".to_string());
    }
    if !scheduler.reminder_template.contains("{content}") {
        fail("scheduler.reminder_template must contain the `{content}` placeholder".to_string());
    }

    let session = &config.session;
    if session.token_prefix.is_empty() {
        fail("session.token_prefix must not be empty".to_string());
    } else if !session.token_prefix.chars().all(|c| c.is_ascii_graphic()) {
        fail(format!(
            "session.token_prefix `{}` must be printable ASCII without whitespace",
            session.token_prefix
        ));
    }
    if session.session_id_prefix.trim().is_empty() {
        fail("session.session_id_prefix must not be empty".to_string());
    }
    if session.auth_dir.trim().is_empty() {
        fail("session.auth_dir must not be empty".to_string());
    }

    if session.remote_backend == RemoteBackend::Supabase {
        let supabase = &config.supabase;
        if supabase.url.as_deref().is_none_or(|u| u.trim().is_empty()) {
            fail("supabase.url is required when session.remote_backend = \"supabase\"".to_string());
        }
        if supabase
            .service_key
            .as_deref()
            .is_none_or(|k| k.trim().is_empty())
        {
            fail(
                "supabase.service_key is required when session.remote_backend = \"supabase\""
                    .to_string(),
            );
        }
        if supabase.table.trim().is_empty() {
            fail("supabase.table must not be empty".to_string());
        }
    }

    let whatsapp = &config.whatsapp;
    if whatsapp.access_token.is_some() != whatsapp.phone_number_id.is_some() {
        fail(
            "whatsapp.access_token and whatsapp.phone_number_id must be set together".to_string(),
        );
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
