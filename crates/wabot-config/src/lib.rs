// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the wabot WhatsApp bot.
//!
//! Strict TOML parsing (`deny_unknown_fields`), XDG file lookup, `WABOT_*`
//! environment overrides, and miette diagnostics with typo suggestions.
//!
//! ```no_run
//! use wabot_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("tick every {}s", config.scheduler.tick_interval_secs);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{RemoteBackend, WabotConfig};

/// Load from the XDG hierarchy and validate.
///
/// Deserialization failures become diagnostics with source spans where the
/// offending file can be located; semantic failures come from
/// [`validation::validate_config`].
pub fn load_and_validate() -> Result<WabotConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load one explicit file (plus env overrides) and validate.
pub fn load_and_validate_path(path: &Path) -> Result<WabotConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        std::fs::read_to_string(path)
            .map(|content| vec![(path.display().to_string(), content)])
            .unwrap_or_default()
    })
}

/// Load a TOML string and validate.
pub fn load_and_validate_str(toml_content: &str) -> Result<WabotConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

fn finish(
    loaded: Result<WabotConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<WabotConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Read every config file that exists so spans can point into it.
fn collect_toml_sources() -> Vec<(String, String)> {
    let local = std::env::current_dir()
        .map(|d| d.join(loader::CONFIG_FILE))
        .unwrap_or_else(|_| loader::CONFIG_FILE.into());

    [
        Some(local),
        loader::user_config_path(),
        Some(loader::SYSTEM_CONFIG_PATH.into()),
    ]
    .into_iter()
    .flatten()
    .filter_map(|path| {
        std::fs::read_to_string(&path)
            .ok()
            .map(|content| (path.display().to_string(), content))
    })
    .collect()
}
