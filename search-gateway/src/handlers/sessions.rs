use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};

use crate::error::GatewayError;
use crate::models::{CreateSessionRequest, Session, SessionList};
use crate::startup::AppState;

/// `POST /session`. An empty body creates a session with default names.
#[tracing::instrument(skip(state, body))]
pub async fn create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Session>, GatewayError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        CreateSessionRequest::default()
    } else {
        serde_json::from_slice::<CreateSessionRequest>(&body)
            .map_err(|e| GatewayError::Validation(format!("Invalid request body: {}", e)))?
    };

    let session = state.gateway.create_session(request).await?;

    tracing::info!(
        session_id = %session.session_id,
        display_name = %session.display_name,
        "Session created"
    );

    Ok(Json(session))
}

/// `GET /sessions`, in creation order.
pub async fn list_sessions(State(state): State<AppState>) -> Json<SessionList<Session>> {
    Json(SessionList {
        sessions: state.gateway.list_sessions().await,
    })
}

/// `GET /session/*id`, by full resource name or trailing id.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>, GatewayError> {
    let session = state.gateway.get_session(id.trim_start_matches('/')).await?;
    Ok(Json(session))
}
