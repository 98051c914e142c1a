// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wabot serve` command implementation.
//!
//! Opens SQLite storage, builds the delivery channel, registers it in the
//! session registry, and runs the scheduler until SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wabot_config::model::WabotConfig;
use wabot_core::{MessagingChannel, StorageAdapter, WabotError};
use wabot_scheduler::{Scheduler, SchedulerRunner};
use wabot_session::SessionRegistry;
use wabot_storage::SqliteStorage;

use crate::channel::build_channel;

/// Runs the `wabot serve` command.
pub async fn run_serve(config: WabotConfig) -> Result<(), WabotError> {
    info!(name = %config.bot.name, "starting wabot");

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    info!(path = %config.storage.database_path, "storage initialized");

    let channel = build_channel(&config)?;
    let registry: SessionRegistry<dyn MessagingChannel> = SessionRegistry::new();
    registry.insert(config.bot.name.clone(), channel.clone());
    debug!(sessions = registry.len(), "channel registered");

    let cancel = install_signal_handler();

    let handle = if config.scheduler.enabled {
        let scheduler = Arc::new(Scheduler::new(
            storage.clone(),
            channel.clone(),
            config.scheduler.clone(),
        ));
        let interval = Duration::from_secs(config.scheduler.tick_interval_secs);
        Some(SchedulerRunner::start_with_token(
            scheduler,
            interval,
            cancel.child_token(),
        ))
    } else {
        info!("scheduler disabled");
        None
    };

    cancel.cancelled().await;
    info!("shutting down");

    if let Some(handle) = handle
        && let Err(e) = handle.stop().await
    {
        warn!(error = %e, "scheduler did not stop cleanly");
    }

    for id in registry.ids() {
        if let Some(channel) = registry.remove(&id)
            && let Err(e) = channel.shutdown().await
        {
            warn!(session = %id, error = %e, "channel shutdown failed");
        }
    }

    storage.close().await?;
    info!("wabot serve shutdown complete");
    Ok(())
}

/// Installs handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] cancelled when either signal arrives.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler, only Ctrl+C will stop wabot");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` wins when set.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wabot={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
