// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session token codec.
//!
//! A token is `<prefix><base64(gzip(json))>` where the JSON is the
//! file-name to content map of a credential bundle. Decoding also accepts
//! the older form without the gzip layer.

use std::io::{Read, Write};
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use rand::Rng;
use tracing::debug;
use wabot_core::{CredentialBundle, WabotError};

use crate::bundle::{read_bundle, validate_file_name, write_bundle};

/// Marker prepended to tokens unless configured otherwise.
pub const DEFAULT_TOKEN_PREFIX: &str = "WBOT_";

/// Uppercase alphabet without I, L, O and U.
const ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Encodes credential bundles into copy-pasteable tokens and back.
#[derive(Debug, Clone)]
pub struct CredentialCodec {
    prefix: String,
}

impl Default for CredentialCodec {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_PREFIX)
    }
}

impl CredentialCodec {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Serialize, compress, and base64 a bundle.
    pub fn encode_bundle(&self, bundle: &CredentialBundle) -> Result<String, WabotError> {
        let json = serde_json::to_vec(bundle)
            .map_err(|e| WabotError::Internal(format!("bundle serialization failed: {e}")))?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&json)
            .map_err(|e| WabotError::Internal(format!("gzip failed: {e}")))?;
        let compressed = encoder
            .finish()
            .map_err(|e| WabotError::Internal(format!("gzip failed: {e}")))?;
        Ok(format!("{}{}", self.prefix, STANDARD.encode(compressed)))
    }

    /// Parse a token back into a bundle.
    ///
    /// The prefix is optional on input. Payloads that are not gzip are read
    /// as plain JSON. Every fragment name is checked before returning, so a
    /// bundle from this function is always safe to write.
    pub fn decode_bundle(&self, token: &str) -> Result<CredentialBundle, WabotError> {
        let trimmed = token.trim();
        let payload = trimmed.strip_prefix(self.prefix.as_str()).unwrap_or(trimmed);
        let raw = STANDARD
            .decode(payload)
            .map_err(|e| WabotError::Format(format!("token is not valid base64: {e}")))?;

        let json = match gunzip(&raw) {
            Ok(inflated) => inflated,
            Err(e) => {
                debug!(error = %e, "token payload is not gzip, trying legacy plain JSON");
                raw
            }
        };

        let bundle: CredentialBundle = serde_json::from_slice(&json).map_err(|e| {
            WabotError::Format(format!("token payload is not a file-name to content map: {e}"))
        })?;
        for name in bundle.file_names() {
            validate_file_name(name)?;
        }
        Ok(bundle)
    }

    /// Read the bundle in `dir` and encode it.
    pub async fn encode(&self, dir: &Path) -> Result<String, WabotError> {
        let bundle = read_bundle(dir).await?;
        self.encode_bundle(&bundle)
    }

    /// Decode `token` and write its files into `dir`. Returns the file count.
    ///
    /// Nothing is written unless the whole token decodes.
    pub async fn decode(&self, token: &str, dir: &Path) -> Result<usize, WabotError> {
        let bundle = self.decode_bundle(token)?;
        write_bundle(&bundle, dir).await
    }

    /// Cheap syntactic check: prefix present and the rest is base64.
    ///
    /// Passing this does not mean the token decodes to a bundle.
    pub fn is_valid_token(&self, token: &str) -> bool {
        token
            .strip_prefix(self.prefix.as_str())
            .filter(|rest| !rest.is_empty())
            .is_some_and(|rest| STANDARD.decode(rest).is_ok())
    }
}

fn gunzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(out)
}

/// A random human-shareable identifier such as `WBOT-7K2M-Q9XD-R4TB`.
///
/// Not derived from any credentials, and never accepted by
/// [`CredentialCodec::is_valid_token`] because `-` is outside the base64 alphabet.
pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    let mut group = || -> String {
        (0..4)
            .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect()
    };
    let (a, b, c) = (group(), group(), group());
    format!("WBOT-{a}-{b}-{c}")
}
