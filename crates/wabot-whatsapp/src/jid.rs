// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JID to Cloud API recipient conversion.

use wabot_core::WabotError;

/// Server part used by individual user JIDs.
const USER_SERVER: &str = "s.whatsapp.net";

/// Convert a JID such as `15551234567:3@s.whatsapp.net` to the bare phone
/// number the Cloud API expects.
///
/// Plain numbers (optionally `+`-prefixed) are accepted as-is. Group and
/// broadcast JIDs have no Cloud API equivalent and are rejected.
pub fn to_recipient(jid: &str) -> Result<String, WabotError> {
    let (user, server) = match jid.split_once('@') {
        Some((user, server)) => (user, Some(server)),
        None => (jid, None),
    };
    if let Some(server) = server
        && server != USER_SERVER
        && server != "c.us"
    {
        return Err(WabotError::channel(format!(
            "recipient {jid} is not an individual chat; the Cloud API cannot deliver to {server}"
        )));
    }

    let number = user.split(':').next().unwrap_or(user).trim_start_matches('+');
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(WabotError::channel(format!("recipient {jid} is not a phone number")));
    }
    Ok(number.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_jids_become_numbers() {
        assert_eq!(to_recipient("15551234567@s.whatsapp.net").unwrap(), "15551234567");
        assert_eq!(to_recipient("15551234567:12@s.whatsapp.net").unwrap(), "15551234567");
        assert_eq!(to_recipient("4915112345678@c.us").unwrap(), "4915112345678");
        assert_eq!(to_recipient("+447700900123").unwrap(), "447700900123");
    }

    #[test]
    fn groups_and_broadcast_rejected() {
        assert!(to_recipient("120363025246125486@g.us").is_err());
        assert!(to_recipient("status@broadcast").is_err());
    }

    #[test]
    fn non_numeric_rejected() {
        assert!(to_recipient("alice@s.whatsapp.net").is_err());
        assert!(to_recipient("").is_err());
    }
}
