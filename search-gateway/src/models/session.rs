//! Local mirror of provider-side conversational sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A multi-turn conversation known to this gateway.
///
/// The provider owns the session; this record only tracks what the gateway
/// observed (turn count, last query) for display and turn numbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Provider-assigned resource name, used as the registry key.
    #[serde(rename = "name")]
    pub session_id: String,

    pub display_name: String,

    pub user_pseudo_id: String,

    /// Number of successful session-bound searches.
    pub turn_count: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_query: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_query_id: Option<String>,

    /// Provider-reported lifecycle state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    pub created: DateTime<Utc>,

    pub updated: DateTime<Utc>,
}

/// Session resource as returned by the provider's session-creation call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSession {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub user_pseudo_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
}

impl Session {
    /// Build the local mirror for a freshly created remote session.
    pub fn from_remote(remote: RemoteSession) -> Self {
        let now = Utc::now();
        Self {
            display_name: remote.display_name.unwrap_or_default(),
            user_pseudo_id: remote.user_pseudo_id.unwrap_or_default(),
            turn_count: 0,
            last_query: None,
            last_query_id: None,
            state: remote.state,
            created: remote.start_time.unwrap_or(now),
            updated: now,
            session_id: remote.name,
        }
    }

    /// Last path segment of the resource name.
    pub fn short_id(&self) -> &str {
        self.session_id
            .rsplit('/')
            .next()
            .unwrap_or(&self.session_id)
    }

    /// Register one completed turn.
    pub fn record_turn(&mut self, query: String, query_id: String) {
        self.turn_count += 1;
        self.last_query = Some(query);
        self.last_query_id = Some(query_id);
        self.updated = Utc::now();
    }
}
