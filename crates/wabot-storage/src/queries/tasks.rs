// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled task queries.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};
use wabot_core::{ActionType, NewTask, ScheduledTask, WabotError};

use crate::database::{Database, format_timestamp, parse_timestamp};

const COLUMNS: &str =
    "id, trigger_time, action_type, target_jid, content, media_path, executed, created_at";

fn task_from_row(row: &Row<'_>) -> Result<ScheduledTask, rusqlite::Error> {
    let action: String = row.get(2)?;
    let action_type = action.parse::<ActionType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(ScheduledTask {
        id: row.get(0)?,
        trigger_time: parse_timestamp(1, &row.get::<_, String>(1)?)?,
        action_type,
        target_jid: row.get(3)?,
        content: row.get(4)?,
        media_path: row.get(5)?,
        executed: row.get(6)?,
        created_at: parse_timestamp(7, &row.get::<_, String>(7)?)?,
    })
}

/// Insert a pending task and return it as stored.
pub async fn insert_task(db: &Database, task: NewTask) -> Result<ScheduledTask, WabotError> {
    let trigger_time = format_timestamp(task.trigger_time);
    let created_at = format_timestamp(Utc::now());
    let action_type = task.action_type.to_string();
    db.run(move |conn| {
        conn.execute(
            "INSERT INTO scheduled_tasks
                 (trigger_time, action_type, target_jid, content, media_path, executed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
            params![
                trigger_time,
                action_type,
                task.target_jid,
                task.content,
                task.media_path,
                created_at,
            ],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM scheduled_tasks WHERE id = ?1"),
            params![id],
            task_from_row,
        )
    })
    .await
}

/// Pending tasks with `trigger_time <= now`, oldest first.
pub async fn find_due_unexecuted(
    db: &Database,
    now: DateTime<Utc>,
) -> Result<Vec<ScheduledTask>, WabotError> {
    let now = format_timestamp(now);
    db.run(move |conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM scheduled_tasks
             WHERE executed = 0 AND trigger_time <= ?1
             ORDER BY trigger_time ASC, id ASC"
        ))?;
        let rows = stmt.query_map(params![now], task_from_row)?;
        rows.collect()
    })
    .await
}

/// Persist a task's executed flag. Unknown ids are an error.
pub async fn save_task(db: &Database, task: &ScheduledTask) -> Result<(), WabotError> {
    let id = task.id;
    let executed = task.executed;
    let changed = db
        .run(move |conn| {
            conn.execute(
                "UPDATE scheduled_tasks SET executed = ?1 WHERE id = ?2",
                params![executed, id],
            )
        })
        .await?;
    if changed == 0 {
        return Err(WabotError::InvalidTask {
            id,
            reason: "no such task in store".to_string(),
        });
    }
    Ok(())
}

/// Look up one task.
pub async fn get_task(db: &Database, id: i64) -> Result<Option<ScheduledTask>, WabotError> {
    db.run(move |conn| {
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM scheduled_tasks WHERE id = ?1"),
            params![id],
            task_from_row,
        )
        .optional()
    })
    .await
}
