// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyed registry of live session handles.

use std::sync::Arc;

use dashmap::DashMap;

/// Live connections (or any per-session handle) keyed by session id.
///
/// Created once by the host and passed to whoever needs it. Each key is
/// guarded by its own shard lock, so writers to one session never block
/// readers of another.
pub struct SessionRegistry<T: ?Sized> {
    entries: DashMap<String, Arc<T>>,
}

impl<T: ?Sized> Default for SessionRegistry<T> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<T: ?Sized> SessionRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle, returning the one it replaced.
    pub fn insert(&self, session_id: impl Into<String>, handle: Arc<T>) -> Option<Arc<T>> {
        self.entries.insert(session_id.into(), handle)
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<T>> {
        self.entries.get(session_id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, session_id: &str) -> Option<Arc<T>> {
        self.entries.remove(session_id).map(|(_, handle)| handle)
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.entries.contains_key(session_id)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
