// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! wabot - WhatsApp automation bot.
//!
//! This is the binary entry point: the long-running `serve` loop plus the
//! session and scheduling maintenance commands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod channel;
mod config_cmd;
mod schedule;
mod serve;
mod session;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use wabot_config::model::WabotConfig;

use crate::schedule::ScheduleCommand;
use crate::session::SessionCommand;

/// wabot - WhatsApp automation bot.
#[derive(Parser, Debug)]
#[command(name = "wabot", version, about, long_about = None)]
struct Cli {
    /// Load this config file instead of the standard search path.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot: scheduler loop on the configured channel.
    Serve,
    /// Encode, upload, and restore pairing credentials.
    #[command(subcommand)]
    Session(SessionCommand),
    /// Enqueue and inspect scheduled tasks.
    #[command(subcommand)]
    Schedule(ScheduleCommand),
    /// Print the effective configuration (secrets redacted).
    Config,
}

fn load_config(path: Option<&PathBuf>) -> Result<WabotConfig, ExitCode> {
    let loaded = match path {
        Some(path) => wabot_config::load_and_validate_path(path),
        None => wabot_config::load_and_validate(),
    };
    loaded.map_err(|errors| {
        wabot_config::render_errors(&errors);
        ExitCode::FAILURE
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(code) => return code,
    };
    serve::init_tracing(&config.bot.log_level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Session(cmd)) => session::run(&config, cmd).await,
        Some(Commands::Schedule(cmd)) => schedule::run(&config, cmd).await,
        Some(Commands::Config) => config_cmd::run(&config),
        None => {
            println!("wabot: use --help for available commands");
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("wabot: {e}");
            ExitCode::FAILURE
        }
    }
}
