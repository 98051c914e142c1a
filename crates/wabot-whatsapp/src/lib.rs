// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Cloud API channel for wabot.
//!
//! Implements [`wabot_core::MessagingChannel`] for individual chats over
//! the Graph API.

pub mod client;
pub mod jid;

pub use client::CloudApiChannel;
