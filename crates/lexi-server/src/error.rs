//! Unified server error type.
//!
//! Handlers return `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors become a JSON-body
//! (`{"error": "..."}`) response with a matching status code.
//!
//! Server misconfiguration and internal failures are logged in full; the
//! caller only gets a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use lexi_types::ChatError;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Raised by the proxy core or the upstream adapter.
    #[error(transparent)]
    Chat(#[from] ChatError),

    /// The request body could not be read as a chat request.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Chat(e) => match e {
                ChatError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                ChatError::Upstream { status: Some(s), .. } => StatusCode::from_u16(*s)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY),
                ChatError::Upstream { status: None, .. } | ChatError::Network(_) => {
                    StatusCode::BAD_GATEWAY
                }
                ChatError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let client_message = match &self {
            ServerError::Chat(ChatError::MissingCredential) => {
                error!("no upstream credential configured; set GITHUB_TOKEN");
                "internal server error".to_owned()
            }
            e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                error!(error = %e, "internal server error");
                "internal server error".to_owned()
            }
            ServerError::Chat(ChatError::InvalidRequest(m)) | ServerError::BadRequest(m) => {
                m.clone()
            }
            e => e.to_string(),
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}
