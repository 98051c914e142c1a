// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Supabase-backed remote session table.
//!
//! Session records live in a PostgREST-exposed table (`wa_sessions` by
//! default) so that a bot started on another host can restore its
//! credentials from a short session id.

pub mod table;

pub use table::SupabaseSessionTable;
