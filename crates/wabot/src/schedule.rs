// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wabot schedule` subcommands.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use clap::Subcommand;
use wabot_config::model::WabotConfig;
use wabot_core::{ActionType, StorageAdapter, TaskStore, WabotError};
use wabot_scheduler::{schedule_message, schedule_status};
use wabot_storage::SqliteStorage;

#[derive(Subcommand, Debug)]
pub enum ScheduleCommand {
    /// Enqueue a message, reminder, or status update.
    Add {
        /// Recipient JID (ignored for status updates).
        #[arg(long)]
        to: Option<String>,
        /// When to fire: RFC 3339 timestamp, `now`, or `+<n><s|m|h|d>`.
        #[arg(long)]
        at: String,
        /// Task kind: message, reminder, or status.
        #[arg(long, value_parser = parse_action_type)]
        kind: Option<ActionType>,
        /// Media attachment path (status updates only).
        #[arg(long)]
        media: Option<String>,
        /// Text to send.
        content: Option<String>,
    },
    /// List pending tasks that are due.
    Due {
        /// Evaluate as of this instant instead of now.
        #[arg(long)]
        at: Option<String>,
    },
}

fn parse_action_type(s: &str) -> Result<ActionType, String> {
    ActionType::from_str(s).map_err(|_| format!("unknown task kind `{s}` (message, reminder, status)"))
}

/// Parse a trigger time relative to `now`.
pub fn parse_trigger_time(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, WabotError> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("now") {
        return Ok(now);
    }
    if let Some(offset) = input.strip_prefix('+') {
        let invalid = || WabotError::Config(format!("invalid relative time `{input}`"));
        let unit = offset.chars().last().ok_or_else(invalid)?;
        let amount: i64 = offset[..offset.len() - unit.len_utf8()]
            .parse()
            .map_err(|_| invalid())?;
        let delta = match unit {
            's' => Duration::try_seconds(amount),
            'm' => Duration::try_minutes(amount),
            'h' => Duration::try_hours(amount),
            'd' => Duration::try_days(amount),
            _ => None,
        }
        .ok_or_else(invalid)?;
        return now.checked_add_signed(delta).ok_or_else(invalid);
    }
    DateTime::parse_from_rfc3339(input)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| WabotError::Config(format!("invalid time `{input}`: {e}")))
}

pub async fn run(config: &WabotConfig, cmd: ScheduleCommand) -> Result<(), WabotError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let result = execute(&storage, cmd, Utc::now()).await;
    storage.close().await?;
    let lines = result?;
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

/// Run a schedule command against `store`, returning the lines to print.
async fn execute(
    store: &dyn TaskStore,
    cmd: ScheduleCommand,
    now: DateTime<Utc>,
) -> Result<Vec<String>, WabotError> {
    match cmd {
        ScheduleCommand::Add {
            to,
            at,
            kind,
            media,
            content,
        } => {
            let at = parse_trigger_time(&at, now)?;
            let task = match kind.unwrap_or(ActionType::Message) {
                ActionType::Status => schedule_status(store, at, content, media).await?,
                action_type => {
                    let to = to.ok_or_else(|| {
                        WabotError::Config(format!("a {action_type} needs --to <jid>"))
                    })?;
                    let content = content.ok_or_else(|| {
                        WabotError::Config(format!("a {action_type} needs text content"))
                    })?;
                    schedule_message(store, &to, at, &content, action_type).await?
                }
            };
            Ok(vec![format!(
                "scheduled {} #{} for {}",
                task.action_type,
                task.id,
                task.trigger_time.to_rfc3339()
            )])
        }
        ScheduleCommand::Due { at } => {
            let at = match at {
                Some(at) => parse_trigger_time(&at, now)?,
                None => now,
            };
            let tasks = store.find_due_unexecuted(at).await?;
            if tasks.is_empty() {
                return Ok(vec!["no tasks due".to_string()]);
            }
            Ok(tasks
                .iter()
                .map(|t| {
                    format!(
                        "#{}\t{}\t{}\t{}\t{}",
                        t.id,
                        t.trigger_time.to_rfc3339(),
                        t.action_type,
                        t.target_jid,
                        t.content.as_deref().or(t.media_path.as_deref()).unwrap_or("-")
                    )
                })
                .collect())
        }
    }
}
