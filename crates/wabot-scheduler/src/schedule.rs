// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entry points producers use to enqueue tasks.

use chrono::{DateTime, Utc};
use tracing::info;
use wabot_core::{ActionType, NewTask, ScheduledTask, TaskStore, WabotError};

/// Enqueue a text task for `jid`, due at `at`.
///
/// Reminder commands pass [`ActionType::Reminder`]; the scheduler wraps the
/// content in the reminder template when it fires.
pub async fn schedule_message(
    store: &dyn TaskStore,
    jid: &str,
    at: DateTime<Utc>,
    content: &str,
    action_type: ActionType,
) -> Result<ScheduledTask, WabotError> {
    let task = store
        .insert_task(NewTask::new(action_type, jid, at, content))
        .await?;
    info!(
        task_id = task.id,
        action = %task.action_type,
        jid = %task.target_jid,
        trigger_time = %task.trigger_time,
        "task scheduled"
    );
    Ok(task)
}

/// Enqueue a status update. At least one of `content` and `media_path` is required.
pub async fn schedule_status(
    store: &dyn TaskStore,
    at: DateTime<Utc>,
    content: Option<String>,
    media_path: Option<String>,
) -> Result<ScheduledTask, WabotError> {
    if content.is_none() && media_path.is_none() {
        return Err(WabotError::Config(
            "a status update needs text content or a media path".to_string(),
        ));
    }
    let task = store
        .insert_task(NewTask::status(at, content, media_path))
        .await?;
    info!(
        task_id = task.id,
        has_media = task.media_path.is_some(),
        trigger_time = %task.trigger_time,
        "status scheduled"
    );
    Ok(task)
}
