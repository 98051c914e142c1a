// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session credential handling for wabot.
//!
//! - [`codec`]: bundle to token and back (gzip + base64, legacy plain JSON accepted).
//! - [`remote`]: write-once records in a [`wabot_core::SessionTable`].
//! - [`pairing`]: remote-first persistence with token fallback.
//! - [`registry`]: live session handles keyed by id.

pub mod bundle;
pub mod codec;
pub mod pairing;
pub mod registry;
pub mod remote;

pub use bundle::{read_bundle, write_bundle};
pub use codec::{CredentialCodec, DEFAULT_TOKEN_PREFIX, generate_id};
pub use pairing::{PersistedSession, SessionPersistence};
pub use registry::SessionRegistry;
pub use remote::RemoteSessionStore;
