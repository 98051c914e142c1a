// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`SessionTable`] over the Supabase REST interface.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use wabot_config::model::SupabaseConfig;
use wabot_core::{CredentialBundle, SessionRecord, SessionTable, WabotError};

const SELECT_COLUMNS: &str = "session_id,session_data,owner_phone,updated_at";

/// Row shape exchanged with PostgREST. `session_data` is a `jsonb` column.
#[derive(Debug, Serialize, Deserialize)]
struct SessionRow {
    session_id: String,
    session_data: CredentialBundle,
    #[serde(default)]
    owner_phone: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<&SessionRecord> for SessionRow {
    fn from(record: &SessionRecord) -> Self {
        Self {
            session_id: record.session_id.clone(),
            session_data: record.session_data.clone(),
            owner_phone: record.owner_phone.clone(),
            updated_at: record.updated_at,
        }
    }
}

impl From<SessionRow> for SessionRecord {
    fn from(row: SessionRow) -> Self {
        Self {
            session_id: row.session_id,
            session_data: row.session_data,
            owner_phone: row.owner_phone,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Remote session table stored in Supabase.
#[derive(Debug, Clone)]
pub struct SupabaseSessionTable {
    client: reqwest::Client,
    endpoint: Url,
}

impl SupabaseSessionTable {
    /// Creates a table client from `[supabase]` config. `url` and `service_key` are required.
    pub fn new(config: &SupabaseConfig) -> Result<Self, WabotError> {
        let (Some(url), Some(key)) = (&config.url, &config.service_key) else {
            return Err(WabotError::Config(
                "supabase.url and supabase.service_key are required".to_string(),
            ));
        };

        let endpoint = Url::parse(&format!(
            "{}/rest/v1/{}",
            url.trim_end_matches('/'),
            config.table
        ))
        .map_err(|e| WabotError::Config(format!("invalid supabase url {url}: {e}")))?;

        let mut headers = HeaderMap::new();
        let mut apikey = HeaderValue::from_str(key)
            .map_err(|e| WabotError::Config(format!("invalid service key header value: {e}")))?;
        apikey.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| WabotError::Config(format!("invalid service key header value: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert("apikey", apikey);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| remote_error("failed to build HTTP client", e))?;

        Ok(Self { client, endpoint })
    }

    /// Full table endpoint, e.g. `https://xyz.supabase.co/rest/v1/wa_sessions`.
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}

fn remote_error(context: &str, e: reqwest::Error) -> WabotError {
    WabotError::Remote {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}

async fn failure(response: reqwest::Response, action: &str) -> WabotError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<PostgrestError>(&body) {
        Ok(err) => match err.code {
            Some(code) => format!("{} ({code})", err.message),
            None => err.message,
        },
        Err(_) => body,
    };
    WabotError::Remote {
        message: format!("supabase {action} returned {status}: {detail}"),
        source: None,
    }
}

#[async_trait]
impl SessionTable for SupabaseSessionTable {
    async fn insert(&self, record: &SessionRecord) -> Result<(), WabotError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Prefer", "return=minimal")
            .json(&SessionRow::from(record))
            .send()
            .await
            .map_err(|e| remote_error("supabase insert failed", e))?;

        let status = response.status();
        debug!(status = %status, session_id = %record.session_id, "supabase insert response");
        if status == StatusCode::CONFLICT {
            return Err(WabotError::Storage {
                source: format!("session {} already exists", record.session_id).into(),
            });
        }
        if !status.is_success() {
            return Err(failure(response, "insert").await);
        }
        Ok(())
    }

    async fn select_by_key(&self, session_id: &str) -> Result<Option<SessionRecord>, WabotError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("select", SELECT_COLUMNS)
            .append_pair("session_id", &format!("eq.{session_id}"))
            .append_pair("limit", "1");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| remote_error("supabase select failed", e))?;

        let status = response.status();
        debug!(status = %status, session_id, "supabase select response");
        if !status.is_success() {
            return Err(failure(response, "select").await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| remote_error("supabase select body unreadable", e))?;
        let rows: Vec<SessionRow> = serde_json::from_str(&body)
            .map_err(|e| WabotError::Format(format!("session row is not valid: {e}")))?;
        Ok(rows.into_iter().next().map(SessionRecord::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wabot_core::ErrorKind;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn table(server: &MockServer) -> SupabaseSessionTable {
        SupabaseSessionTable::new(&SupabaseConfig {
            url: Some(format!("{}/", server.uri())),
            service_key: Some("service-role".to_string()),
            table: "wa_sessions".to_string(),
        })
        .unwrap()
    }

    fn record() -> SessionRecord {
        SessionRecord {
            session_id: "wbot-1234".to_string(),
            session_data: [("creds.json", r#"{"me":{"id":"1"}}"#)].into_iter().collect(),
            owner_phone: Some("15551234567".to_string()),
            updated_at: "2026-10-18T12:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn missing_credentials_is_config_error() {
        let err = SupabaseSessionTable::new(&SupabaseConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[tokio::test]
    async fn insert_posts_row_with_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/wa_sessions"))
            .and(header("apikey", "service-role"))
            .and(header("authorization", "Bearer service-role"))
            .and(header("prefer", "return=minimal"))
            .and(body_partial_json(json!({
                "session_id": "wbot-1234",
                "session_data": { "creds.json": r#"{"me":{"id":"1"}}"# },
                "owner_phone": "15551234567"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        table(&server).insert(&record()).await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_insert_is_storage_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint"
            })))
            .mount(&server)
            .await;

        let err = table(&server).insert(&record()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[tokio::test]
    async fn server_error_is_remote_error_with_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": "PGRST301",
                "message": "JWT expired"
            })))
            .mount(&server)
            .await;

        let err = table(&server).insert(&record()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert!(err.to_string().contains("JWT expired"), "{err}");
    }

    #[tokio::test]
    async fn select_returns_first_row() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/wa_sessions"))
            .and(query_param("session_id", "eq.wbot-1234"))
            .and(query_param("select", SELECT_COLUMNS))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "session_id": "wbot-1234",
                "session_data": { "creds.json": r#"{"me":{"id":"1"}}"# },
                "owner_phone": "15551234567",
                "updated_at": "2026-10-18T12:00:00+00:00"
            }])))
            .mount(&server)
            .await;

        let found = table(&server).select_by_key("wbot-1234").await.unwrap();
        assert_eq!(found, Some(record()));
    }

    #[tokio::test]
    async fn select_miss_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        assert!(table(&server).select_by_key("wbot-nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_row_is_format_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "session_id": "wbot-1234",
                "session_data": "not-an-object",
                "updated_at": "2026-10-18T12:00:00Z"
            }])))
            .mount(&server)
            .await;

        let err = table(&server).select_by_key("wbot-1234").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
