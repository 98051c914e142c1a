// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the wabot bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Deserializer, Serialize};

/// Top-level wabot configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WabotConfig {
    /// Bot identity and logging.
    #[serde(default)]
    pub bot: BotConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Scheduled task engine settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Credential codec and session persistence settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Supabase remote session table settings.
    #[serde(default)]
    pub supabase: SupabaseConfig,

    /// WhatsApp Cloud API channel settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name of the bot.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Phone number of the paired device, recorded alongside uploaded sessions.
    #[serde(default, deserialize_with = "digits_or_string")]
    pub owner_phone: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
            owner_phone: None,
        }
    }
}

fn default_bot_name() -> String {
    "wabot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("wabot").join("wabot.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "wabot.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// Scheduled task engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Whether `serve` starts the reconciliation loop.
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,

    /// Seconds between ticks.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Recipient for status tasks.
    #[serde(default = "default_status_jid")]
    pub status_jid: String,

    /// Text sent for reminder tasks. `{content}` is replaced with the task content.
    #[serde(default = "default_reminder_template")]
    pub reminder_template: String,

    /// Upper bound on a single send before it counts as failed.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            tick_interval_secs: default_tick_interval_secs(),
            status_jid: default_status_jid(),
            reminder_template: default_reminder_template(),
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

fn default_scheduler_enabled() -> bool {
    true
}

fn default_tick_interval_secs() -> u64 {
    60
}

fn default_status_jid() -> String {
    "status@broadcast".to_string()
}

fn default_reminder_template() -> String {
    "⏰ *REMINDER*\n\n{content}".to_string()
}

fn default_send_timeout_secs() -> u64 {
    30
}

/// Where uploaded credential bundles are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteBackend {
    /// The local SQLite `wa_sessions` table.
    #[default]
    Sqlite,
    /// A Supabase (PostgREST) table.
    Supabase,
    /// No remote table; pairing always falls back to a token.
    None,
}

/// Credential codec and session persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Directory holding the WhatsApp auth state files.
    #[serde(default = "default_auth_dir")]
    pub auth_dir: String,

    /// Literal marker prepended to encoded session tokens.
    #[serde(default = "default_token_prefix")]
    pub token_prefix: String,

    /// Prefix of identifiers generated for remote session records.
    #[serde(default = "default_session_id_prefix")]
    pub session_id_prefix: String,

    /// Remote session table implementation.
    #[serde(default)]
    pub remote_backend: RemoteBackend,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auth_dir: default_auth_dir(),
            token_prefix: default_token_prefix(),
            session_id_prefix: default_session_id_prefix(),
            remote_backend: RemoteBackend::default(),
        }
    }
}

fn default_auth_dir() -> String {
    "auth_info".to_string()
}

fn default_token_prefix() -> String {
    "WBOT_".to_string()
}

fn default_session_id_prefix() -> String {
    "wbot-".to_string()
}

/// Supabase configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    #[serde(default)]
    pub url: Option<String>,

    /// Service role key used for both `apikey` and bearer auth.
    #[serde(default, deserialize_with = "digits_or_string")]
    pub service_key: Option<String>,

    /// Table holding session records.
    #[serde(default = "default_supabase_table")]
    pub table: String,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_key: None,
            table: default_supabase_table(),
        }
    }
}

fn default_supabase_table() -> String {
    "wa_sessions".to_string()
}

/// WhatsApp Cloud API configuration. `None` credentials disable the channel.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Permanent or temporary access token.
    #[serde(default, deserialize_with = "digits_or_string")]
    pub access_token: Option<String>,

    /// Business phone number id messages are sent from.
    #[serde(default, deserialize_with = "digits_or_string")]
    pub phone_number_id: Option<String>,

    /// Graph API base URL including version.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            phone_number_id: None,
            api_base: default_api_base(),
        }
    }
}

fn default_api_base() -> String {
    "https://graph.facebook.com/v21.0".to_string()
}

/// Accept a bare number where a string is expected.
///
/// Env values such as `WABOT_WHATSAPP_PHONE_NUMBER_ID=10987` arrive as
/// integers, and phone numbers and ids are plausible in TOML unquoted.
fn digits_or_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(Option::<Raw>::deserialize(d)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Unsigned(n) => n.to_string(),
        Raw::Signed(n) => n.to_string(),
    }))
}
