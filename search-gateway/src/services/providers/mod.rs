//! Search provider abstraction and implementations.
//!
//! The gateway never interprets search results; providers return the
//! response body as JSON so it can be relayed verbatim.

pub mod discovery_engine;
pub mod mock;

use crate::models::RemoteSession;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use discovery_engine::DiscoveryEngineClient;
pub use mock::MockSearchProvider;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Non-success status; the body is kept for relaying to the caller.
    #[error("Provider returned status {status}")]
    Status {
        status: u16,
        body: serde_json::Value,
    },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Body of a `servingConfigs/*:search` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPayload {
    pub query: String,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    pub user_info: UserInfo,
    pub content_search_spec: ContentSearchSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_spec: Option<SessionSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSearchSpec {
    pub snippet_spec: SnippetSpec,
    pub summary_spec: SummarySpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetSpec {
    pub return_snippet: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarySpec {
    pub use_semantic_chunks: bool,
    pub include_citations: bool,
    pub summary_result_count: u32,
    pub model_spec: ModelSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_prompt_spec: Option<ModelPromptSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSpec {
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelPromptSpec {
    pub preamble: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSpec {
    pub query_id: String,
    pub search_result_persistence_count: u32,
}

/// Body of a session-creation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionPayload {
    pub user_pseudo_id: String,
    pub display_name: String,
}

/// A remote search/answer service.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one search and return the raw response body.
    async fn search(
        &self,
        token: &str,
        payload: &SearchPayload,
    ) -> Result<serde_json::Value, ProviderError>;

    /// Create a conversational session.
    async fn create_session(
        &self,
        token: &str,
        payload: &CreateSessionPayload,
    ) -> Result<RemoteSession, ProviderError>;

    /// Provider name for logs and metrics.
    fn name(&self) -> &'static str;
}
