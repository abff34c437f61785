use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;

use crate::error::GatewayError;
use crate::models::SearchRequest;
use crate::startup::AppState;

/// `POST /search`: single-turn, or session-bound when `sessionId` is set.
///
/// The provider body is relayed as-is with a `sessionInfo` object added.
#[tracing::instrument(skip(state, payload))]
pub async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<Value>, GatewayError> {
    let Json(request) = payload.map_err(|e| GatewayError::Validation(e.body_text()))?;

    let body = state.gateway.search(request).await?;

    Ok(Json(body))
}
