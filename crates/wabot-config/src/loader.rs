// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `./wabot.toml` > `~/.config/wabot/wabot.toml` > `/etc/wabot/wabot.toml`,
//! with `WABOT_*` environment variables applied last.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::WabotConfig;

/// Config file name used at every level of the hierarchy.
pub const CONFIG_FILE: &str = "wabot.toml";

/// System-wide config location.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/wabot/wabot.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "WABOT_";

/// Top-level sections an env var can address. The first `_` after one of
/// these becomes the section separator; later underscores stay in the key.
const SECTIONS: &[&str] = &[
    "bot",
    "storage",
    "scheduler",
    "session",
    "supabase",
    "whatsapp",
];

/// Load configuration from the XDG hierarchy with env var overrides.
pub fn load_config() -> Result<WabotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string on top of compiled defaults.
///
/// No files or environment variables are consulted.
pub fn load_config_from_str(toml_content: &str) -> Result<WabotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WabotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file, then apply env overrides.
pub fn load_config_from_path(path: &Path) -> Result<WabotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WabotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered Figment, before extraction.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(WabotConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH));
    if let Some(user) = user_config_path() {
        figment = figment.merge(Toml::file(user));
    }
    figment.merge(Toml::file(CONFIG_FILE)).merge(env_provider())
}

/// `~/.config/wabot/wabot.toml`, when a config dir exists on this platform.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("wabot").join(CONFIG_FILE))
}

/// Env provider mapping `WABOT_SECTION_KEY_NAME` to `section.key_name`.
///
/// `Env::split("_")` would turn `WABOT_SESSION_TOKEN_PREFIX` into
/// `session.token.prefix`, so the section is matched explicitly.
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).map(|key| map_env_key(key.as_str()).into())
}

/// Map a prefix-stripped env key to a dotted config path.
///
/// `Env` hands keys over in their original case, so matching is done on the
/// lowercased key.
pub fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key
}
