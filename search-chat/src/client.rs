//! HTTP client for the gateway's search and session routes.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Prior turns the provider should keep for session-bound searches.
const SEARCH_RESULT_PERSISTENCE_COUNT: u32 = 5;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Gateway unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("Gateway returned {status}: {body}")]
    Api { status: u16, body: Value },
}

/// Session as listed by `GET /sessions`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub turn_count: u32,
    pub created: Option<DateTime<Utc>>,
}

impl SessionSummary {
    pub fn short_id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Deserialize)]
struct SessionListBody {
    #[serde(default)]
    sessions: Vec<SessionSummary>,
}

/// Base URL from `API_URL`, tolerating a value that already ends in `/search`.
pub fn base_url_from(api_url: Option<&str>) -> String {
    match api_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => {
            let url = url.trim_end_matches('/');
            url.strip_suffix("/search").unwrap_or(url).to_string()
        }
        None => DEFAULT_API_URL.to_string(),
    }
}

pub struct GatewayClient {
    base_url: String,
    http: reqwest::Client,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, ClientError> {
        let status = response.status();
        let body = response.text().await?;
        let body = serde_json::from_str(&body).unwrap_or(Value::String(body));

        if status.is_success() {
            Ok(body)
        } else {
            Err(ClientError::Api {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// `POST /search`, bound to `session` when given.
    pub async fn search(&self, query: &str, session: Option<&str>) -> Result<Value, ClientError> {
        let body = match session {
            Some(session_id) => json!({
                "query": query,
                "sessionId": session_id,
                "searchResultPersistenceCount": SEARCH_RESULT_PERSISTENCE_COUNT,
            }),
            None => json!({ "query": query }),
        };

        tracing::debug!(session = ?session, "Sending search");

        let response = self
            .http
            .post(format!("{}/search", self.base_url))
            .json(&body)
            .send()
            .await?;

        Self::read_json(response).await
    }

    /// `POST /session`. The gateway fills in defaults for a missing name.
    pub async fn create_session(
        &self,
        display_name: Option<&str>,
    ) -> Result<SessionSummary, ClientError> {
        let body = json!({
            "displayName": display_name,
            "userPseudoId": format!("user_{}", Utc::now().timestamp_millis()),
        });

        let response = self
            .http
            .post(format!("{}/session", self.base_url))
            .json(&body)
            .send()
            .await?;

        let value = Self::read_json(response).await?;
        serde_json::from_value(value.clone()).map_err(|_| ClientError::Api {
            status: 200,
            body: value,
        })
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ClientError> {
        let response = self
            .http
            .get(format!("{}/sessions", self.base_url))
            .send()
            .await?;

        let value = Self::read_json(response).await?;
        Ok(serde_json::from_value::<SessionListBody>(value)
            .map(|list| list.sessions)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use tokio::net::TcpListener;

    #[test]
    fn test_base_url_strips_search_suffix() {
        assert_eq!(base_url_from(None), DEFAULT_API_URL);
        assert_eq!(base_url_from(Some("  ")), DEFAULT_API_URL);
        assert_eq!(
            base_url_from(Some("http://gw:9000/search")),
            "http://gw:9000"
        );
        assert_eq!(base_url_from(Some("http://gw:9000/")), "http://gw:9000");
    }

    async fn spawn_fake_gateway() -> String {
        let app = Router::new()
            .route(
                "/search",
                post(|Json(body): Json<Value>| async move {
                    if body["query"] == "boom" {
                        return (
                            StatusCode::BAD_GATEWAY,
                            Json(json!({"error": "Search provider request failed"})),
                        );
                    }
                    (StatusCode::OK, Json(json!({"echo": body})))
                }),
            )
            .route(
                "/session",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({
                        "name": "projects/p/sessions/42",
                        "displayName": body["displayName"].as_str().unwrap_or("Session now"),
                        "turnCount": 0,
                        "created": "2024-05-01T10:00:00Z"
                    }))
                }),
            )
            .route(
                "/sessions",
                get(|| async {
                    Json(json!({"sessions": [
                        {"name": "projects/p/sessions/1", "displayName": "a", "turnCount": 3, "created": "2024-05-01T10:00:00Z"}
                    ]}))
                }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_session_search_sends_persistence_count() {
        let client = GatewayClient::new(spawn_fake_gateway().await);

        let body = client.search("hello", Some("projects/p/sessions/1")).await.unwrap();

        assert_eq!(body["echo"]["sessionId"], "projects/p/sessions/1");
        assert_eq!(body["echo"]["searchResultPersistenceCount"], 5);

        let single = client.search("hello", None).await.unwrap();
        assert!(single["echo"].get("sessionId").is_none());
    }

    #[tokio::test]
    async fn test_error_status_carries_body() {
        let client = GatewayClient::new(spawn_fake_gateway().await);

        match client.search("boom", None).await {
            Err(ClientError::Api { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body["error"], "Search provider request failed");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sessions_round_trip() {
        let client = GatewayClient::new(spawn_fake_gateway().await);

        let created = client.create_session(Some("chat A")).await.unwrap();
        assert_eq!(created.display_name, "chat A");
        assert_eq!(created.short_id(), "42");

        let sessions = client.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].turn_count, 3);
    }
}
