//! Client-facing request and response shapes.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Number of prior turns the provider keeps when none is requested.
pub const DEFAULT_SEARCH_RESULT_PERSISTENCE_COUNT: u32 = 5;

fn default_persistence_count() -> u32 {
    DEFAULT_SEARCH_RESULT_PERSISTENCE_COUNT
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,

    /// Present for session-bound searches.
    #[serde(default)]
    pub session_id: Option<String>,

    #[serde(default = "default_persistence_count")]
    pub search_result_persistence_count: u32,
}

impl SearchRequest {
    pub fn single_turn(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            session_id: None,
            search_result_persistence_count: DEFAULT_SEARCH_RESULT_PERSISTENCE_COUNT,
        }
    }

    pub fn in_session(query: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            ..Self::single_turn(query)
        }
    }

    /// Query text, if present and not blank.
    pub fn query_text(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// Blank values fall back to a generated id.
    #[validate(length(max = 128, message = "userPseudoId must be at most 128 characters"))]
    pub user_pseudo_id: Option<String>,

    #[validate(length(max = 128, message = "displayName must be at most 128 characters"))]
    pub display_name: Option<String>,
}

/// Envelope merged into every search response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_number: Option<u32>,
    pub is_multi_turn: bool,
}

impl SessionInfo {
    pub fn single_turn() -> Self {
        Self {
            session_id: None,
            query_id: None,
            turn_number: None,
            is_multi_turn: false,
        }
    }

    pub fn multi_turn(session_id: String, query_id: String, turn_number: u32) -> Self {
        Self {
            session_id: Some(session_id),
            query_id: Some(query_id),
            turn_number: Some(turn_number),
            is_multi_turn: true,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionList<T: Serialize> {
    pub sessions: Vec<T>,
}
