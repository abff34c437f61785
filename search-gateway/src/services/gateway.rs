//! Search orchestration.
//!
//! One call to [`SearchGateway::search`] validates the query, acquires a
//! token, builds the provider payload (binding it to a session when asked),
//! dispatches exactly once, mirrors the turn locally and merges a
//! `sessionInfo` envelope into the relayed provider response.

use crate::config::SearchSettings;
use crate::error::GatewayError;
use crate::models::{CreateSessionRequest, SearchRequest, Session, SessionInfo};
use crate::services::credentials::TokenProvider;
use crate::services::metrics;
use crate::services::providers::{
    ContentSearchSpec, CreateSessionPayload, ModelPromptSpec, ModelSpec, ProviderError,
    SearchPayload, SearchProvider, SessionSpec, SnippetSpec, SummarySpec, UserInfo,
};
use crate::services::registry::SessionRegistry;
use chrono::{SecondsFormat, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use validator::Validate;

const PAGE_SIZE: u32 = 10;
const SUMMARY_RESULT_COUNT: u32 = 3;
const SUMMARY_MODEL_VERSION: &str = "stable";

/// Length of the random suffix in generated query ids.
const QUERY_ID_SUFFIX_LEN: usize = 9;

/// Generate a process-local query id: `<unix-millis>_<random alphanumerics>`.
pub fn generate_query_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(QUERY_ID_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// Merge `sessionInfo` into the provider body.
fn attach_session_info(body: Value, info: &SessionInfo) -> Value {
    let info = json!(info);
    match body {
        Value::Object(mut map) => {
            map.insert("sessionInfo".to_string(), info);
            Value::Object(map)
        }
        other => json!({ "response": other, "sessionInfo": info }),
    }
}

fn provider_error_type(err: &ProviderError) -> &'static str {
    match err {
        ProviderError::NotConfigured(_) => "not_configured",
        ProviderError::Status { .. } => "status",
        ProviderError::InvalidResponse(_) => "invalid_response",
        ProviderError::NetworkError(_) => "network",
    }
}

/// Session-bound part of a search.
struct Binding {
    session_id: String,
    query_id: String,
}

pub struct SearchGateway {
    tokens: TokenProvider,
    registry: Arc<SessionRegistry>,
    provider: Arc<dyn SearchProvider>,
    settings: SearchSettings,
}

impl SearchGateway {
    pub fn new(
        tokens: TokenProvider,
        registry: Arc<SessionRegistry>,
        provider: Arc<dyn SearchProvider>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            tokens,
            registry,
            provider,
            settings,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Build the outbound search body.
    pub fn build_payload(
        &self,
        query: &str,
        session: Option<(&str, SessionSpec)>,
    ) -> SearchPayload {
        let (session, session_spec) = match session {
            Some((id, spec)) => (Some(id.to_string()), Some(spec)),
            None => (None, None),
        };

        SearchPayload {
            query: query.to_string(),
            page_size: PAGE_SIZE,
            language_code: self.settings.language_code.clone(),
            user_info: UserInfo {
                time_zone: self.settings.time_zone.clone(),
            },
            content_search_spec: ContentSearchSpec {
                snippet_spec: SnippetSpec {
                    return_snippet: true,
                },
                summary_spec: SummarySpec {
                    use_semantic_chunks: true,
                    include_citations: true,
                    summary_result_count: SUMMARY_RESULT_COUNT,
                    model_spec: ModelSpec {
                        version: SUMMARY_MODEL_VERSION.to_string(),
                    },
                    model_prompt_spec: self.settings.preamble.clone().map(|preamble| {
                        ModelPromptSpec { preamble }
                    }),
                },
            },
            session,
            session_spec,
        }
    }

    /// Run one search, single-turn or session-bound.
    #[tracing::instrument(skip(self, request), fields(session_bound))]
    pub async fn search(&self, request: SearchRequest) -> Result<Value, GatewayError> {
        let session_id = request.session_id.clone().filter(|id| !id.trim().is_empty());
        let mode = if session_id.is_some() {
            "multi_turn"
        } else {
            "single_turn"
        };
        tracing::Span::current().record("session_bound", session_id.is_some());

        let result = self.run_search(request, session_id).await;

        match &result {
            Ok(_) => metrics::record_search(mode, "success"),
            Err(e) => {
                tracing::warn!(error = %e, "Search failed");
                metrics::record_search(mode, e.kind());
            }
        }

        result
    }

    async fn run_search(
        &self,
        request: SearchRequest,
        session_id: Option<String>,
    ) -> Result<Value, GatewayError> {
        let query = request
            .query_text()
            .ok_or_else(|| GatewayError::Validation("Query is required".to_string()))?
            .to_string();

        let token = self.tokens.acquire_token().await?;

        let binding = session_id.map(|session_id| Binding {
            session_id,
            query_id: generate_query_id(),
        });

        let payload = self.build_payload(
            &query,
            binding.as_ref().map(|b| {
                (
                    b.session_id.as_str(),
                    SessionSpec {
                        query_id: b.query_id.clone(),
                        search_result_persistence_count: request
                            .search_result_persistence_count,
                    },
                )
            }),
        );

        let start = Instant::now();
        let outcome = self.provider.search(&token, &payload).await;
        metrics::record_provider_latency(
            self.provider.name(),
            "search",
            start.elapsed().as_secs_f64(),
        );
        let body = outcome.map_err(|e| {
            metrics::record_provider_error(self.provider.name(), provider_error_type(&e));
            e
        })?;

        let info = match binding {
            Some(Binding {
                session_id,
                query_id,
            }) => {
                let turn_number = self
                    .registry
                    .record_turn(&session_id, &query, &query_id)
                    .await
                    .unwrap_or(0);

                tracing::info!(
                    session_id = %session_id,
                    query_id = %query_id,
                    turn_number,
                    "Session-bound search completed"
                );
                SessionInfo::multi_turn(session_id, query_id, turn_number)
            }
            None => {
                tracing::info!("Single-turn search completed");
                SessionInfo::single_turn()
            }
        };

        Ok(attach_session_info(body, &info))
    }

    /// Create a remote session and mirror it locally.
    #[tracing::instrument(skip(self, request))]
    pub async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<Session, GatewayError> {
        request.validate()?;

        let now = Utc::now();
        let payload = CreateSessionPayload {
            user_pseudo_id: request
                .user_pseudo_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("user_{}", now.timestamp_millis())),
            display_name: request
                .display_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| {
                    format!("Session {}", now.to_rfc3339_opts(SecondsFormat::Secs, true))
                }),
        };

        let token = self.tokens.acquire_token().await?;

        let start = Instant::now();
        let outcome = self.provider.create_session(&token, &payload).await;
        metrics::record_provider_latency(
            self.provider.name(),
            "create_session",
            start.elapsed().as_secs_f64(),
        );
        let mut remote = outcome.map_err(|e| {
            metrics::record_provider_error(self.provider.name(), provider_error_type(&e));
            tracing::error!(error = %e, "Session creation failed");
            e
        })?;

        // Not every API version echoes these back
        remote.display_name.get_or_insert(payload.display_name);
        remote.user_pseudo_id.get_or_insert(payload.user_pseudo_id);

        Ok(self.registry.create(remote).await)
    }

    pub async fn list_sessions(&self) -> Vec<Session> {
        self.registry.list().await
    }

    /// Find a locally known session by resource name or trailing id.
    pub async fn get_session(&self, id: &str) -> Result<Session, GatewayError> {
        self.registry
            .find(id)
            .await
            .ok_or_else(|| GatewayError::SessionNotFound(id.to_string()))
    }
}
