//! In-memory mirror of conversational sessions.
//!
//! The provider is the source of truth for session validity; this registry
//! only keeps what the gateway needs for turn numbering and listing. Entries
//! live for the lifetime of the process.

use crate::models::{RemoteSession, Session};
use crate::services::metrics;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct RegistryInner {
    sessions: HashMap<String, Session>,
    /// Keys in insertion order.
    order: Vec<String>,
}

/// Process-wide session store, shared through `Arc` in the application state.
#[derive(Default)]
pub struct SessionRegistry {
    inner: RwLock<RegistryInner>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the mirror of a newly created remote session.
    ///
    /// Re-creating a known key replaces the entry but keeps its position.
    pub async fn create(&self, remote: RemoteSession) -> Session {
        let session = Session::from_remote(remote);
        let mut inner = self.inner.write().await;

        if inner
            .sessions
            .insert(session.session_id.clone(), session.clone())
            .is_none()
        {
            inner.order.push(session.session_id.clone());
        }
        metrics::set_sessions_registered(inner.order.len());

        tracing::info!(
            session_id = %session.session_id,
            display_name = %session.display_name,
            "Session registered"
        );

        session
    }

    pub async fn get(&self, session_id: &str) -> Option<Session> {
        self.inner.read().await.sessions.get(session_id).cloned()
    }

    /// Look up by full resource name, falling back to the trailing id segment.
    pub async fn find(&self, id: &str) -> Option<Session> {
        let inner = self.inner.read().await;
        if let Some(session) = inner.sessions.get(id) {
            return Some(session.clone());
        }

        inner
            .order
            .iter()
            .filter_map(|key| inner.sessions.get(key))
            .find(|s| s.short_id() == id)
            .cloned()
    }

    /// All sessions in insertion order.
    pub async fn list(&self) -> Vec<Session> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|key| inner.sessions.get(key).cloned())
            .collect()
    }

    /// Count one completed turn and return the new turn count.
    ///
    /// Returns `None` when the session is not locally known.
    pub async fn record_turn(&self, session_id: &str, query: &str, query_id: &str) -> Option<u32> {
        let mut inner = self.inner.write().await;

        match inner.sessions.get_mut(session_id) {
            Some(session) => {
                session.record_turn(query.to_string(), query_id.to_string());
                tracing::debug!(
                    session_id = %session_id,
                    turn_count = session.turn_count,
                    "Recorded session turn"
                );
                Some(session.turn_count)
            }
            None => {
                tracing::warn!(
                    session_id = %session_id,
                    "Session not found in local registry, turn not recorded"
                );
                None
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
