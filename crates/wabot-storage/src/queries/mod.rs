// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions over a [`crate::Database`].

pub mod sessions;
pub mod tasks;
