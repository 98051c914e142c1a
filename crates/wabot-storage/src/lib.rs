// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for wabot.
//!
//! WAL-mode SQLite with embedded migrations and a single writer thread
//! (`tokio-rusqlite`). Holds the scheduled task table and a local
//! implementation of the remote session table.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
