//! Discovery Engine REST client.
//!
//! Issues `servingConfigs/*:search` and `sessions` calls against the
//! configured engine, authenticated with a caller-supplied bearer token.

use super::{CreateSessionPayload, ProviderError, SearchPayload, SearchProvider};
use crate::config::DiscoveryEngineConfig;
use crate::models::RemoteSession;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use service_core::observability::TracedClientExt;

pub struct DiscoveryEngineClient {
    config: DiscoveryEngineConfig,
    client: Client,
}

fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ProviderError> {
    value
        .as_deref()
        .ok_or_else(|| ProviderError::NotConfigured(format!("{} is not set", name)))
}

impl DiscoveryEngineClient {
    pub fn new(config: DiscoveryEngineConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// `projects/{p}/locations/{l}/collections/{c}/engines/{e}`
    fn engine_path(&self) -> Result<String, ProviderError> {
        Ok(format!(
            "projects/{}/locations/{}/collections/{}/engines/{}",
            require(&self.config.project_id, "PROJECT_ID")?,
            require(&self.config.location, "LOCATION")?,
            require(&self.config.collection_id, "COLLECTION_ID")?,
            require(&self.config.engine_id, "ENGINE_ID")?,
        ))
    }

    pub fn search_url(&self) -> Result<String, ProviderError> {
        Ok(format!(
            "{}/{}/servingConfigs/{}:search",
            self.config.base_url.trim_end_matches('/'),
            self.engine_path()?,
            require(&self.config.serving_config_id, "SERVING_CONFIG_ID")?,
        ))
    }

    pub fn sessions_url(&self) -> Result<String, ProviderError> {
        Ok(format!(
            "{}/{}/sessions",
            self.config.base_url.trim_end_matches('/'),
            self.engine_path()?,
        ))
    }

    async fn post_json<T: Serialize>(
        &self,
        url: &str,
        token: &str,
        body: &T,
    ) -> Result<Value, ProviderError> {
        let response = self
            .client
            .traced_post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %url, error = %e, "Provider request failed");
                ProviderError::NetworkError(e.to_string())
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(error = %e, raw = %text, "Provider returned non-JSON body");
            ProviderError::InvalidResponse(format!("{}: {}", e, text))
        })
    }
}

#[async_trait]
impl SearchProvider for DiscoveryEngineClient {
    async fn search(&self, token: &str, payload: &SearchPayload) -> Result<Value, ProviderError> {
        let url = self.search_url()?;

        tracing::debug!(
            url = %url,
            query_len = payload.query.len(),
            session_bound = payload.session.is_some(),
            "Sending search request"
        );

        self.post_json(&url, token, payload).await
    }

    async fn create_session(
        &self,
        token: &str,
        payload: &CreateSessionPayload,
    ) -> Result<RemoteSession, ProviderError> {
        let url = self.sessions_url()?;

        let body = self.post_json(&url, token, payload).await?;

        serde_json::from_value(body).map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse session: {}", e))
        })
    }

    fn name(&self) -> &'static str {
        "discovery-engine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::{
        ContentSearchSpec, ModelSpec, SnippetSpec, SummarySpec, UserInfo,
    };
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::json;
    use tokio::net::TcpListener;

    fn config(base_url: &str) -> DiscoveryEngineConfig {
        DiscoveryEngineConfig {
            base_url: base_url.to_string(),
            project_id: Some("proj".to_string()),
            location: Some("global".to_string()),
            collection_id: Some("default_collection".to_string()),
            engine_id: Some("eng".to_string()),
            serving_config_id: Some("default_search".to_string()),
            timeout_secs: 5,
        }
    }

    fn payload(query: &str) -> SearchPayload {
        SearchPayload {
            query: query.to_string(),
            page_size: 10,
            language_code: None,
            user_info: UserInfo { time_zone: None },
            content_search_spec: ContentSearchSpec {
                snippet_spec: SnippetSpec {
                    return_snippet: true,
                },
                summary_spec: SummarySpec {
                    use_semantic_chunks: true,
                    include_citations: true,
                    summary_result_count: 3,
                    model_spec: ModelSpec {
                        version: "stable".to_string(),
                    },
                    model_prompt_spec: None,
                },
            },
            session: None,
            session_spec: None,
        }
    }

    /// Fake provider echoing the request path and authorization header.
    async fn spawn_fake_provider() -> String {
        async fn handle(
            Path(rest): Path<String>,
            headers: HeaderMap,
            Json(body): Json<Value>,
        ) -> (StatusCode, Json<Value>) {
            let auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();

            if body.get("query").and_then(Value::as_str) == Some("fail") {
                return (
                    StatusCode::FORBIDDEN,
                    Json(json!({"error": {"code": 403, "message": "denied"}})),
                );
            }

            if rest.ends_with("/sessions") {
                return (
                    StatusCode::OK,
                    Json(json!({
                        "name": format!("{}/123", rest),
                        "state": "IN_PROGRESS",
                        "userPseudoId": body["userPseudoId"],
                        "displayName": body["displayName"],
                    })),
                );
            }

            (
                StatusCode::OK,
                Json(json!({"path": rest, "authorization": auth, "results": []})),
            )
        }

        let app = Router::new().route("/v1alpha/*rest", post(handle));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{}/v1alpha", addr)
    }

    #[test]
    fn test_search_url_templating() {
        let client = DiscoveryEngineClient::new(config("https://example.test/v1alpha/"), Client::new());
        assert_eq!(
            client.search_url().unwrap(),
            "https://example.test/v1alpha/projects/proj/locations/global/collections/default_collection/engines/eng/servingConfigs/default_search:search"
        );
        assert_eq!(
            client.sessions_url().unwrap(),
            "https://example.test/v1alpha/projects/proj/locations/global/collections/default_collection/engines/eng/sessions"
        );
    }

    #[tokio::test]
    async fn test_missing_identifier_fails_dispatch() {
        let mut cfg = config("http://127.0.0.1:9");
        cfg.engine_id = None;
        let client = DiscoveryEngineClient::new(cfg, Client::new());

        let err = client.search("token", &payload("q")).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(ref msg) if msg.contains("ENGINE_ID")));
    }

    #[tokio::test]
    async fn test_search_sends_bearer_token_to_serving_config() {
        let base = spawn_fake_provider().await;
        let client = DiscoveryEngineClient::new(config(&base), Client::new());

        let body = client.search("ya29.abc", &payload("refund policy")).await.unwrap();

        assert_eq!(body["authorization"], "Bearer ya29.abc");
        assert!(body["path"]
            .as_str()
            .unwrap()
            .ends_with("engines/eng/servingConfigs/default_search:search"));
    }

    #[tokio::test]
    async fn test_error_status_is_relayed() {
        let base = spawn_fake_provider().await;
        let client = DiscoveryEngineClient::new(config(&base), Client::new());

        match client.search("t", &payload("fail")).await {
            Err(ProviderError::Status { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body["error"]["message"], "denied");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_session_parses_remote_name() {
        let base = spawn_fake_provider().await;
        let client = DiscoveryEngineClient::new(config(&base), Client::new());

        let remote = client
            .create_session(
                "t",
                &CreateSessionPayload {
                    user_pseudo_id: "user_1".to_string(),
                    display_name: "chat A".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(remote.name.ends_with("engines/eng/sessions/123"));
        assert_eq!(remote.display_name.as_deref(), Some("chat A"));
        assert_eq!(remote.state.as_deref(), Some("IN_PROGRESS"));
    }
}
