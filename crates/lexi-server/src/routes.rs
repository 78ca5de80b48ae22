//! Axum router construction.
//!
//! - `POST /api/chat`: the streaming proxy
//! - `GET /health`: heartbeat

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::time::{timeout_at, Instant};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use lexi_types::{chat::ChatRequestBody, ChatError};

use crate::error::ServerError;
use crate::state::AppState;
use crate::stream::{smooth, with_deadline};

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/api/chat", post(post_chat))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn get_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Relay the model's reply to `{"messages": [...]}` as a plain-text stream.
///
/// Anything that fails before the first token (bad input, missing or
/// rejected credential, the deadline) is answered with an error status and
/// no body. Once streaming has started, a failure or the deadline cuts the
/// body short; text already sent stays sent.
async fn post_chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequestBody>, JsonRejection>,
) -> Result<Response, ServerError> {
    let Json(body) = payload.map_err(|r| ServerError::BadRequest(r.body_text()))?;

    let request_id = Uuid::new_v4();
    let config = state.proxy.config();
    let limit_ms = config.max_duration_ms();
    let deadline = Instant::now() + Duration::from_millis(limit_ms);

    info!(
        %request_id,
        turns = body.messages.len(),
        provider = state.proxy.provider_name(),
        "chat request"
    );

    let stream = match timeout_at(deadline, state.proxy.open(body.messages)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            warn!(%request_id, error = %e, "chat request rejected");
            return Err(e.into());
        }
        Err(_) => {
            warn!(%request_id, limit_ms, "upstream did not answer in time");
            return Err(ChatError::Timeout(limit_ms).into());
        }
    };

    let stream = with_deadline(smooth(stream, &config.smoothing), deadline, limit_ms)
        .inspect(move |item| {
            if let Err(e) = item {
                warn!(%request_id, error = %e, "chat stream aborted");
            }
        });

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
