// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for wabot.
//!
//! - [`MockChannel`]: captures sends, injects failures and latency.
//! - [`MemoryTaskStore`] / [`MemorySessionTable`]: in-memory stores with
//!   not-ready and failure switches.
//! - `TestHarness` (feature `harness`): SQLite-backed scheduler and session
//!   stack for end-to-end tests.
//!
//! Scheduler tests drive ticks with an explicit `now`, so nothing here
//! depends on wall-clock time.

#[cfg(feature = "harness")]
pub mod harness;
pub mod memory_store;
pub mod mock_channel;

#[cfg(feature = "harness")]
pub use harness::{TestHarness, TestHarnessBuilder};
pub use memory_store::{MemorySessionTable, MemoryTaskStore};
pub use mock_channel::MockChannel;
