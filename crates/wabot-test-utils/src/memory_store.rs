// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory task store and session table with failure switches.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use wabot_core::traits::storage::{SessionTable, TaskStore};
use wabot_core::types::{NewTask, ScheduledTask, SessionRecord};
use wabot_core::WabotError;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A [`TaskStore`] backed by a map.
pub struct MemoryTaskStore {
    tasks: Mutex<BTreeMap<i64, ScheduledTask>>,
    next_id: AtomicI64,
    ready: AtomicBool,
    failing_saves: Mutex<HashSet<i64>>,
    save_calls: AtomicUsize,
}

impl MemoryTaskStore {
    /// An empty, ready store.
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            ready: AtomicBool::new(true),
            failing_saves: Mutex::new(HashSet::new()),
            save_calls: AtomicUsize::new(0),
        }
    }

    /// While not ready, every call fails with [`WabotError::StoreNotReady`].
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Make `save_task` fail for this id.
    pub fn fail_saves_for(&self, id: i64) {
        lock(&self.failing_saves).insert(id);
    }

    /// Snapshot of every stored task, ordered by id.
    pub fn tasks(&self) -> Vec<ScheduledTask> {
        lock(&self.tasks).values().cloned().collect()
    }

    pub fn task(&self, id: i64) -> Option<ScheduledTask> {
        lock(&self.tasks).get(&id).cloned()
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    fn check_ready(&self) -> Result<(), WabotError> {
        if self.ready.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(WabotError::StoreNotReady("memory store marked not ready".to_string()))
        }
    }
}

impl Default for MemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn insert_task(&self, task: NewTask) -> Result<ScheduledTask, WabotError> {
        self.check_ready()?;
        let stored = ScheduledTask {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            trigger_time: task.trigger_time,
            action_type: task.action_type,
            target_jid: task.target_jid,
            content: task.content,
            media_path: task.media_path,
            executed: false,
            created_at: Utc::now(),
        };
        lock(&self.tasks).insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_due_unexecuted(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledTask>, WabotError> {
        self.check_ready()?;
        let mut due: Vec<ScheduledTask> = lock(&self.tasks)
            .values()
            .filter(|t| t.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|t| (t.trigger_time, t.id));
        Ok(due)
    }

    async fn save_task(&self, task: &ScheduledTask) -> Result<(), WabotError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.check_ready()?;
        if lock(&self.failing_saves).contains(&task.id) {
            return Err(WabotError::Storage {
                source: format!("injected save failure for task {}", task.id).into(),
            });
        }
        match lock(&self.tasks).get_mut(&task.id) {
            Some(slot) => {
                *slot = task.clone();
                Ok(())
            }
            None => Err(WabotError::InvalidTask {
                id: task.id,
                reason: "no such task in store".to_string(),
            }),
        }
    }

    async fn get_task(&self, id: i64) -> Result<Option<ScheduledTask>, WabotError> {
        self.check_ready()?;
        Ok(self.task(id))
    }
}

/// A [`SessionTable`] backed by a vector.
pub struct MemorySessionTable {
    records: Mutex<Vec<SessionRecord>>,
    fail_inserts: AtomicBool,
    insert_calls: AtomicUsize,
}

impl MemorySessionTable {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail_inserts: AtomicBool::new(false),
            insert_calls: AtomicUsize::new(0),
        }
    }

    /// Make every insert fail like an unreachable remote.
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<SessionRecord> {
        lock(&self.records).clone()
    }

    /// Insert attempts, including failed ones.
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }
}

impl Default for MemorySessionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionTable for MemorySessionTable {
    async fn insert(&self, record: &SessionRecord) -> Result<(), WabotError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(WabotError::Remote {
                message: "injected insert failure".to_string(),
                source: None,
            });
        }
        let mut records = lock(&self.records);
        if records.iter().any(|r| r.session_id == record.session_id) {
            return Err(WabotError::Storage {
                source: format!("duplicate session id {}", record.session_id).into(),
            });
        }
        records.push(record.clone());
        Ok(())
    }

    async fn select_by_key(&self, session_id: &str) -> Result<Option<SessionRecord>, WabotError> {
        Ok(lock(&self.records)
            .iter()
            .find(|r| r.session_id == session_id)
            .cloned())
    }
}
