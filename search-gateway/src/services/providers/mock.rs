//! Mock search provider for testing.

use super::{CreateSessionPayload, ProviderError, SearchPayload, SearchProvider};
use crate::models::RemoteSession;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Records every payload and answers with a canned summary.
pub struct MockSearchProvider {
    enabled: bool,
    search_count: AtomicU64,
    session_count: AtomicU64,
    payloads: Mutex<Vec<SearchPayload>>,
}

impl MockSearchProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            search_count: AtomicU64::new(0),
            session_count: AtomicU64::new(0),
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn search_count(&self) -> u64 {
        self.search_count.load(Ordering::SeqCst)
    }

    /// Payloads received so far, oldest first.
    pub fn payloads(&self) -> Vec<SearchPayload> {
        self.payloads
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn last_payload(&self) -> Option<SearchPayload> {
        self.payloads().pop()
    }

    fn unavailable() -> ProviderError {
        ProviderError::Status {
            status: 503,
            body: json!({"error": {"code": 503, "message": "Mock provider not enabled"}}),
        }
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search(&self, _token: &str, payload: &SearchPayload) -> Result<Value, ProviderError> {
        self.search_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut payloads) = self.payloads.lock() {
            payloads.push(payload.clone());
        }

        if !self.enabled {
            return Err(Self::unavailable());
        }

        Ok(json!({
            "results": [{
                "id": "doc-1",
                "document": {
                    "derivedStructData": {
                        "title": "Mock document",
                        "link": "gs://mock/doc-1.pdf",
                        "snippets": [{"snippet": format!("Snippet for {}", payload.query)}]
                    }
                }
            }],
            "totalSize": 1,
            "summary": {
                "summaryText": format!("Mock summary for: {}", payload.query)
            }
        }))
    }

    async fn create_session(
        &self,
        _token: &str,
        payload: &CreateSessionPayload,
    ) -> Result<RemoteSession, ProviderError> {
        if !self.enabled {
            return Err(Self::unavailable());
        }

        let n = self.session_count.fetch_add(1, Ordering::SeqCst) + 1;

        Ok(RemoteSession {
            name: format!(
                "projects/mock/locations/global/collections/default_collection/engines/mock/sessions/{}",
                n
            ),
            display_name: Some(payload.display_name.clone()),
            user_pseudo_id: Some(payload.user_pseudo_id.clone()),
            state: Some("IN_PROGRESS".to_string()),
            start_time: None,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
