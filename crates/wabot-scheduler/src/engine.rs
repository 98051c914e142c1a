// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One scheduler tick: query due tasks, dispatch each, commit each.
//!
//! Delivery is at most once. Every task that was dispatched (sent, failed,
//! timed out, or unsupported) is marked executed. Only a failed commit
//! leaves a task pending, and only then can it be sent again.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use wabot_config::model::SchedulerConfig;
use wabot_core::{
    ActionType, MessageId, MessagingChannel, OutboundMessage, ScheduledTask, TaskStore, WabotError,
};

/// How a dispatched task was handled by the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent(MessageId),
    /// The task's payload has no delivery path (status with media only).
    Unsupported,
}

/// Result of processing one due task.
#[derive(Debug)]
pub struct TaskReport {
    pub task_id: i64,
    pub action_type: ActionType,
    pub dispatch: Result<Delivery, WabotError>,
    /// Whether `executed = true` was persisted.
    pub committed: Result<(), WabotError>,
}

impl TaskReport {
    /// Sent and committed.
    pub fn is_delivered(&self) -> bool {
        matches!(self.dispatch, Ok(Delivery::Sent(_))) && self.committed.is_ok()
    }
}

/// What a call to [`Scheduler::tick`] did.
#[derive(Debug)]
pub enum TickOutcome {
    /// The store could not be queried; nothing was dispatched or changed.
    Skipped(WabotError),
    /// A previous tick was still running.
    Overlapped,
    /// Every due task was processed, in store order.
    Completed(Vec<TaskReport>),
}

impl TickOutcome {
    pub fn reports(&self) -> &[TaskReport] {
        match self {
            TickOutcome::Completed(reports) => reports,
            _ => &[],
        }
    }
}

/// Reconciles due tasks against a messaging channel.
pub struct Scheduler {
    store: Arc<dyn TaskStore>,
    channel: Arc<dyn MessagingChannel>,
    config: SchedulerConfig,
    tick_guard: Mutex<()>,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn TaskStore>,
        channel: Arc<dyn MessagingChannel>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            channel,
            config,
            tick_guard: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Run one tick as of `now`.
    ///
    /// Never fails: store errors skip the tick, per-task errors land in the
    /// task's [`TaskReport`] and do not stop later tasks.
    pub async fn tick(&self, now: DateTime<Utc>) -> TickOutcome {
        let Ok(_guard) = self.tick_guard.try_lock() else {
            debug!("previous tick still in flight, skipping");
            return TickOutcome::Overlapped;
        };

        let due = match self.store.find_due_unexecuted(now).await {
            Ok(due) => due,
            Err(e @ WabotError::StoreNotReady(_)) => {
                debug!(error = %e, "task store not ready, skipping tick");
                return TickOutcome::Skipped(e);
            }
            Err(e) => {
                error!(error = %e, "failed to query due tasks, skipping tick");
                return TickOutcome::Skipped(e);
            }
        };

        if !due.is_empty() {
            debug!(count = due.len(), "dispatching due tasks");
        }
        let mut reports = Vec::with_capacity(due.len());
        for task in due {
            reports.push(self.process(task).await);
        }
        TickOutcome::Completed(reports)
    }

    async fn process(&self, mut task: ScheduledTask) -> TaskReport {
        let dispatch = self.dispatch(&task).await;
        match &dispatch {
            Ok(Delivery::Sent(id)) => {
                info!(task_id = task.id, action = %task.action_type, message_id = %id.0, "task delivered");
            }
            Ok(Delivery::Unsupported) => {
                // Kept for compatibility: the media is dropped and the task still completes.
                warn!(
                    task_id = task.id,
                    media_path = task.media_path.as_deref().unwrap_or_default(),
                    "media status delivery is not supported, marking executed without sending"
                );
            }
            Err(e) => {
                warn!(task_id = task.id, action = %task.action_type, error = %e, "task dispatch failed, not retrying");
            }
        }

        task.executed = true;
        let committed = self.store.save_task(&task).await;
        if let Err(e) = &committed {
            error!(task_id = task.id, error = %e, "failed to mark task executed, it remains pending");
        }

        TaskReport {
            task_id: task.id,
            action_type: task.action_type,
            dispatch,
            committed,
        }
    }

    async fn dispatch(&self, task: &ScheduledTask) -> Result<Delivery, WabotError> {
        let Some(message) = self.render(task)? else {
            return Ok(Delivery::Unsupported);
        };
        let limit = Duration::from_secs(self.config.send_timeout_secs);
        match tokio::time::timeout(limit, self.channel.send(message)).await {
            Ok(sent) => sent.map(Delivery::Sent),
            Err(_) => Err(WabotError::Timeout { duration: limit }),
        }
    }

    /// The message a task turns into, or `None` when it has no deliverable form.
    fn render(&self, task: &ScheduledTask) -> Result<Option<OutboundMessage>, WabotError> {
        let content = task.content.as_deref().filter(|c| !c.trim().is_empty());
        let missing = |what: &str| WabotError::InvalidTask {
            id: task.id,
            reason: format!("{} task has no {what}", task.action_type),
        };

        match task.action_type {
            ActionType::Message => {
                let text = content.ok_or_else(|| missing("content"))?;
                Ok(Some(OutboundMessage::text(&task.target_jid, text)))
            }
            ActionType::Reminder => {
                let text = content.ok_or_else(|| missing("content"))?;
                let rendered = self.config.reminder_template.replace("{content}", text);
                Ok(Some(OutboundMessage::text(&task.target_jid, rendered)))
            }
            ActionType::Status => match (content, task.media_path.as_deref()) {
                (Some(text), media) => {
                    if let Some(media) = media {
                        warn!(task_id = task.id, media_path = media, "status media ignored, sending text only");
                    }
                    Ok(Some(OutboundMessage::text(&self.config.status_jid, text)))
                }
                (None, Some(_)) => Ok(None),
                (None, None) => Err(missing("content or media")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use tracing_test::traced_test;
    use wabot_core::NewTask;
    use wabot_test_utils::{MemoryTaskStore, MockChannel};

    fn scheduler(store: &Arc<MemoryTaskStore>, channel: &Arc<MockChannel>) -> Scheduler {
        Scheduler::new(store.clone(), channel.clone(), SchedulerConfig::default())
    }

    async fn add(store: &MemoryTaskStore, task: NewTask) -> ScheduledTask {
        store.insert_task(task).await.unwrap()
    }

    #[tokio::test]
    async fn reminder_is_templated_and_committed() {
        let store = Arc::new(MemoryTaskStore::new());
        let channel = Arc::new(MockChannel::new());
        let now = Utc::now();
        let task = add(
            &store,
            NewTask::new(ActionType::Reminder, "123@x", now - ChronoDuration::milliseconds(1000), "buy milk"),
        )
        .await;

        let outcome = scheduler(&store, &channel).tick(now).await;
        assert_eq!(outcome.reports().len(), 1);
        assert!(outcome.reports()[0].is_delivered());

        let sent = channel.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].jid, "123@x");
        assert!(sent[0].text.contains("buy milk"));
        assert!(sent[0].text.contains("REMINDER"));
        assert!(store.task(task.id).unwrap().executed);
    }

    #[tokio::test]
    async fn executed_tasks_do_not_come_back() {
        let store = Arc::new(MemoryTaskStore::new());
        let channel = Arc::new(MockChannel::new());
        let now = Utc::now();
        add(&store, NewTask::new(ActionType::Message, "a@x", now, "hi")).await;

        let s = scheduler(&store, &channel);
        s.tick(now).await;
        assert!(s.tick(now).await.reports().is_empty());
        assert!(store.find_due_unexecuted(now).await.unwrap().is_empty());
        assert_eq!(channel.call_count(), 1);
    }

    #[tokio::test]
    async fn boundary_is_inclusive() {
        let store = Arc::new(MemoryTaskStore::new());
        let channel = Arc::new(MockChannel::new());
        let now = Utc::now();
        let on_time = add(&store, NewTask::new(ActionType::Message, "a@x", now, "now")).await;
        let future = add(
            &store,
            NewTask::new(ActionType::Message, "b@x", now + ChronoDuration::seconds(1), "later"),
        )
        .await;

        let outcome = scheduler(&store, &channel).tick(now).await;
        let ids: Vec<i64> = outcome.reports().iter().map(|r| r.task_id).collect();
        assert_eq!(ids, vec![on_time.id]);
        assert!(!store.task(future.id).unwrap().executed);
    }

    #[tokio::test]
    async fn failing_task_does_not_abort_batch() {
        let store = Arc::new(MemoryTaskStore::new());
        let channel = Arc::new(MockChannel::new().with_failure_on_call(2));
        let now = Utc::now();
        let mut ids = Vec::new();
        for (i, jid) in ["1@x", "2@x", "3@x"].into_iter().enumerate() {
            let at = now - ChronoDuration::seconds(10 - i as i64);
            ids.push(add(&store, NewTask::new(ActionType::Message, jid, at, "m")).await.id);
        }

        let outcome = scheduler(&store, &channel).tick(now).await;
        let reports = outcome.reports();
        assert_eq!(reports.len(), 3);
        assert!(reports[0].is_delivered());
        assert!(matches!(reports[1].dispatch, Err(WabotError::Channel { .. })));
        assert!(reports[2].is_delivered());
        for id in ids {
            assert!(store.task(id).unwrap().executed, "task {id} should be executed");
        }
    }

    #[tokio::test]
    async fn disconnected_channel_still_commits_everything() {
        let store = Arc::new(MemoryTaskStore::new());
        let channel = Arc::new(MockChannel::new());
        channel.set_connected(false);
        let now = Utc::now();
        add(&store, NewTask::new(ActionType::Message, "a@x", now, "1")).await;
        add(&store, NewTask::new(ActionType::Reminder, "b@x", now, "2")).await;

        let outcome = scheduler(&store, &channel).tick(now).await;
        assert!(outcome.reports().iter().all(|r| r.dispatch.is_err() && r.committed.is_ok()));
        assert!(store.tasks().iter().all(|t| t.executed));
        assert_eq!(channel.sent_count().await, 0);
    }

    #[tokio::test]
    async fn store_not_ready_skips_silently() {
        let store = Arc::new(MemoryTaskStore::new());
        let channel = Arc::new(MockChannel::new());
        let now = Utc::now();
        let task = add(&store, NewTask::new(ActionType::Message, "a@x", now, "x")).await;
        store.set_ready(false);

        let outcome = scheduler(&store, &channel).tick(now).await;
        assert!(matches!(outcome, TickOutcome::Skipped(WabotError::StoreNotReady(_))));
        assert_eq!(channel.call_count(), 0);
        assert_eq!(store.save_calls(), 0);
        assert!(!store.task(task.id).unwrap().executed);

        store.set_ready(true);
        assert_eq!(scheduler(&store, &channel).tick(now).await.reports().len(), 1);
    }

    #[traced_test]
    #[tokio::test]
    async fn media_only_status_is_executed_without_send() {
        let store = Arc::new(MemoryTaskStore::new());
        let channel = Arc::new(MockChannel::new());
        let now = Utc::now();
        let task = add(&store, NewTask::status(now, None, Some("/media/sunrise.jpg".into()))).await;

        let outcome = scheduler(&store, &channel).tick(now).await;
        let report = &outcome.reports()[0];
        assert!(matches!(report.dispatch, Ok(Delivery::Unsupported)));
        assert!(report.committed.is_ok());
        assert_eq!(channel.call_count(), 0);
        assert!(store.task(task.id).unwrap().executed);
        assert!(logs_contain("media status delivery is not supported"));
    }

    #[tokio::test]
    async fn text_status_goes_to_broadcast() {
        let store = Arc::new(MemoryTaskStore::new());
        let channel = Arc::new(MockChannel::new());
        let now = Utc::now();
        add(&store, NewTask::status(now, Some("good morning".into()), Some("/m.jpg".into()))).await;

        scheduler(&store, &channel).tick(now).await;
        let sent = channel.sent_messages().await;
        assert_eq!(sent, vec![OutboundMessage::text("status@broadcast", "good morning")]);
    }

    #[tokio::test]
    async fn contentless_message_is_invalid_but_committed() {
        let store = Arc::new(MemoryTaskStore::new());
        let channel = Arc::new(MockChannel::new());
        let now = Utc::now();
        let mut task = NewTask::new(ActionType::Message, "a@x", now, "");
        task.content = None;
        let task = add(&store, task).await;

        let outcome = scheduler(&store, &channel).tick(now).await;
        assert!(matches!(
            outcome.reports()[0].dispatch,
            Err(WabotError::InvalidTask { id, .. }) if id == task.id
        ));
        assert!(store.task(task.id).unwrap().executed);
        assert_eq!(channel.call_count(), 0);
    }

    #[tokio::test]
    async fn failed_commit_leaves_task_pending() {
        let store = Arc::new(MemoryTaskStore::new());
        let channel = Arc::new(MockChannel::new());
        let now = Utc::now();
        let task = add(&store, NewTask::new(ActionType::Message, "a@x", now, "x")).await;
        store.fail_saves_for(task.id);

        let outcome = scheduler(&store, &channel).tick(now).await;
        let report = &outcome.reports()[0];
        assert!(matches!(report.dispatch, Ok(Delivery::Sent(_))));
        assert!(report.committed.is_err());
        assert!(!store.task(task.id).unwrap().executed);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_send_times_out_and_commits() {
        let store = Arc::new(MemoryTaskStore::new());
        let channel = Arc::new(MockChannel::new().with_delay(Duration::from_secs(120)));
        let now = Utc::now();
        let task = add(&store, NewTask::new(ActionType::Message, "a@x", now, "x")).await;

        let outcome = scheduler(&store, &channel).tick(now).await;
        assert!(matches!(
            outcome.reports()[0].dispatch,
            Err(WabotError::Timeout { duration }) if duration == Duration::from_secs(30)
        ));
        assert!(store.task(task.id).unwrap().executed);
    }

    #[tokio::test]
    async fn overlapping_tick_is_rejected() {
        let store = Arc::new(MemoryTaskStore::new());
        let channel = Arc::new(MockChannel::new().with_delay(Duration::from_millis(50)));
        let now = Utc::now();
        add(&store, NewTask::new(ActionType::Message, "a@x", now, "x")).await;

        let s = scheduler(&store, &channel);
        let (first, second) = tokio::join!(s.tick(now), s.tick(now));
        assert_eq!(first.reports().len(), 1);
        assert!(matches!(second, TickOutcome::Overlapped));
        assert_eq!(channel.call_count(), 1);
    }
}
