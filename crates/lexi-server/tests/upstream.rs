//! `OpenAiUpstream` against a local fake provider.
//!
//! The fake serves `/chat/completions` on an ephemeral port and answers
//! with canned SSE or an error, depending on the bearer token.

use std::net::SocketAddr;

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use futures::StreamExt;
use serde_json::{json, Value};

use lexi_core::ports::{CompletionPort, CompletionRequest};
use lexi_server::upstream::OpenAiUpstream;
use lexi_types::chat::ChatTurn;
use lexi_types::ChatError;

const GOOD_TOKEN: &str = "Bearer good-token";

async fn fake_completions(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(GOOD_TOKEN);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "message": "Bad credentials" } })),
        )
            .into_response();
    }
    if body["stream"] != json!(true) {
        return (StatusCode::BAD_REQUEST, "stream flag missing").into_response();
    }

    let sse = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hi \"}}]}\n\n",
        ": keep-alive\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"there\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    ([(header::CONTENT_TYPE, "text/event-stream")], sse).into_response()
}

async fn spawn_fake_provider() -> SocketAddr {
    let app = Router::new().route("/v1/chat/completions", post(fake_completions));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn request() -> CompletionRequest {
    CompletionRequest {
        model: "gpt-4.1-nano".to_string(),
        messages: vec![ChatTurn::system("Be brief."), ChatTurn::user("Hi")],
    }
}

#[tokio::test]
async fn streams_content_deltas() {
    let addr = spawn_fake_provider().await;
    let upstream = OpenAiUpstream::new(
        format!("http://{addr}/v1/"),
        Some("good-token".to_string()),
    );

    let stream = upstream.open_stream(request()).await.unwrap();
    let parts: Vec<String> = stream.map(|p| p.unwrap()).collect().await;
    assert_eq!(parts, vec!["Hi ", "there"]);
}

#[tokio::test]
async fn rejected_token_surfaces_status() {
    let addr = spawn_fake_provider().await;
    let upstream = OpenAiUpstream::new(format!("http://{addr}/v1"), Some("bad".to_string()));

    let err = upstream.open_stream(request()).await.err().unwrap();
    assert_eq!(err, ChatError::upstream(Some(401), "Bad credentials"));
}

#[tokio::test]
async fn missing_token_fails_without_calling_out() {
    let upstream = OpenAiUpstream::new("http://127.0.0.1:9/v1", None);
    let err = upstream.open_stream(request()).await.err().unwrap();
    assert_eq!(err, ChatError::MissingCredential);
}

#[tokio::test]
async fn unreachable_provider_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let upstream = OpenAiUpstream::new(format!("http://{addr}/v1"), Some("good-token".to_string()));
    let err = upstream.open_stream(request()).await.err().unwrap();
    assert!(matches!(err, ChatError::Network(_)));
}
