// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local session record table (`wa_sessions`).

use rusqlite::{OptionalExtension, params};
use wabot_core::{CredentialBundle, SessionRecord, WabotError};

use crate::database::{Database, format_timestamp, parse_timestamp};

/// Insert a new record. A duplicate session id is a storage error.
pub async fn insert_session(db: &Database, record: &SessionRecord) -> Result<(), WabotError> {
    let session_data = serde_json::to_string(&record.session_data).map_err(|e| WabotError::Storage {
        source: Box::new(e),
    })?;
    let session_id = record.session_id.clone();
    let owner_phone = record.owner_phone.clone();
    let updated_at = format_timestamp(record.updated_at);
    db.run(move |conn| {
        conn.execute(
            "INSERT INTO wa_sessions (session_id, session_data, owner_phone, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![session_id, session_data, owner_phone, updated_at],
        )?;
        Ok(())
    })
    .await
}

/// Fetch a record by exact id.
pub async fn get_session(db: &Database, session_id: &str) -> Result<Option<SessionRecord>, WabotError> {
    let key = session_id.to_string();
    let row = db
        .run(move |conn| {
            conn.query_row(
                "SELECT session_id, session_data, owner_phone, updated_at
                 FROM wa_sessions WHERE session_id = ?1",
                params![key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        parse_timestamp(3, &row.get::<_, String>(3)?)?,
                    ))
                },
            )
            .optional()
        })
        .await?;

    row.map(|(session_id, data, owner_phone, updated_at)| {
        let session_data: CredentialBundle = serde_json::from_str(&data).map_err(|e| {
            WabotError::Format(format!("stored session {session_id} is not a JSON object: {e}"))
        })?;
        Ok(SessionRecord {
            session_id,
            session_data,
            owner_phone,
            updated_at,
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(id: &str) -> SessionRecord {
        SessionRecord {
            session_id: id.to_string(),
            session_data: [("creds.json", "{\"me\":1}"), ("app-state-sync-key-A.json", "k")]
                .into_iter()
                .collect(),
            owner_phone: Some("15550001111".to_string()),
            updated_at: Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn insert_then_select() {
        let db = Database::open_in_memory().await.unwrap();
        insert_session(&db, &record("wbot-1")).await.unwrap();
        let found = get_session(&db, "wbot-1").await.unwrap().unwrap();
        assert_eq!(found, record("wbot-1"));
    }

    #[tokio::test]
    async fn lookup_is_exact() {
        let db = Database::open_in_memory().await.unwrap();
        insert_session(&db, &record("wbot-1")).await.unwrap();
        assert!(get_session(&db, "wbot-").await.unwrap().is_none());
        assert!(get_session(&db, "WBOT-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let db = Database::open_in_memory().await.unwrap();
        insert_session(&db, &record("dup")).await.unwrap();
        let err = insert_session(&db, &record("dup")).await.unwrap_err();
        assert!(matches!(err, WabotError::Storage { .. }));
    }

    #[tokio::test]
    async fn corrupt_row_is_format_error() {
        let db = Database::open_in_memory().await.unwrap();
        db.run(|conn| {
            conn.execute(
                "INSERT INTO wa_sessions (session_id, session_data, updated_at)
                 VALUES ('bad', '[1,2]', '2026-01-01T00:00:00.000Z')",
                [],
            )
        })
        .await
        .unwrap();
        let err = get_session(&db, "bad").await.unwrap_err();
        assert!(matches!(err, WabotError::Format(_)));
    }
}
