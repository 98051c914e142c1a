// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wabot config`: print the merged configuration.

use wabot_config::model::WabotConfig;
use wabot_core::WabotError;

const REDACTED: &str = "<redacted>";

/// Render `config` as TOML with credentials masked.
pub fn render(config: &WabotConfig) -> Result<String, WabotError> {
    let mut shown = config.clone();
    if shown.whatsapp.access_token.is_some() {
        shown.whatsapp.access_token = Some(REDACTED.to_string());
    }
    if shown.supabase.service_key.is_some() {
        shown.supabase.service_key = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| WabotError::Internal(format!("failed to render config: {e}")))
}

pub fn run(config: &WabotConfig) -> Result<(), WabotError> {
    print!("{}", render(config)?);
    Ok(())
}
