// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduler ticks against the real SQLite task store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::tempdir;
use wabot_config::model::{SchedulerConfig, StorageConfig};
use wabot_core::{ActionType, StorageAdapter, TaskStore};
use wabot_scheduler::{Scheduler, TickOutcome, schedule_message, schedule_status};
use wabot_storage::SqliteStorage;
use wabot_test_utils::MockChannel;

fn storage_at(dir: &std::path::Path) -> Arc<SqliteStorage> {
    Arc::new(SqliteStorage::new(StorageConfig {
        database_path: dir.join("wabot.db").display().to_string(),
        wal_mode: true,
    }))
}

#[tokio::test]
async fn uninitialized_store_skips_then_recovers() {
    let dir = tempdir().unwrap();
    let storage = storage_at(dir.path());
    let channel = Arc::new(MockChannel::new());
    let scheduler = Scheduler::new(storage.clone(), channel.clone(), SchedulerConfig::default());

    assert!(matches!(scheduler.tick(Utc::now()).await, TickOutcome::Skipped(_)));

    storage.initialize().await.unwrap();
    let now = Utc::now();
    schedule_message(&*storage, "123@x", now - Duration::milliseconds(1000), "buy milk", ActionType::Reminder)
        .await
        .unwrap();

    let outcome = scheduler.tick(now).await;
    assert_eq!(outcome.reports().len(), 1);
    let sent = channel.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("buy milk"));
    assert!(storage.find_due_unexecuted(now).await.unwrap().is_empty());
}

#[tokio::test]
async fn mixed_batch_is_fully_committed() {
    let dir = tempdir().unwrap();
    let storage = storage_at(dir.path());
    storage.initialize().await.unwrap();
    let channel = Arc::new(MockChannel::new().with_failure_for_jid("down@x"));
    let scheduler = Scheduler::new(storage.clone(), channel.clone(), SchedulerConfig::default());
    let now = Utc::now();

    let a = schedule_message(&*storage, "up@x", now - Duration::seconds(3), "one", ActionType::Message)
        .await
        .unwrap();
    let b = schedule_message(&*storage, "down@x", now - Duration::seconds(2), "two", ActionType::Message)
        .await
        .unwrap();
    let c = schedule_status(&*storage, now - Duration::seconds(1), None, Some("/tmp/x.jpg".into()))
        .await
        .unwrap();
    let later = schedule_message(&*storage, "up@x", now + Duration::minutes(5), "later", ActionType::Message)
        .await
        .unwrap();

    let outcome = scheduler.tick(now).await;
    let ids: Vec<i64> = outcome.reports().iter().map(|r| r.task_id).collect();
    assert_eq!(ids, vec![a.id, b.id, c.id]);

    for id in [a.id, b.id, c.id] {
        assert!(storage.get_task(id).await.unwrap().unwrap().executed);
    }
    assert!(!storage.get_task(later.id).await.unwrap().unwrap().executed);
    assert_eq!(channel.sent_count().await, 1);

    let outcome = scheduler.tick(now + Duration::minutes(5)).await;
    assert_eq!(outcome.reports().len(), 1);
    assert_eq!(outcome.reports()[0].task_id, later.id);
}
