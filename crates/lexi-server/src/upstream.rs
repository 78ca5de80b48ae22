//! OpenAI-compatible upstream adapter.
//!
//! Posts the completion request with `stream: true` and turns the SSE
//! response into a [`TextStream`] of content deltas.

use std::collections::VecDeque;
use std::fmt::Display;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::{json, Value};

use lexi_core::ports::{CompletionPort, CompletionRequest, TextStream};
use lexi_core::sse::{SseDecoder, StreamEvent};
use lexi_types::{ChatError, Result};

pub struct OpenAiUpstream {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
}

impl OpenAiUpstream {
    pub fn new(api_base: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            api_key,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionPort for OpenAiUpstream {
    async fn open_stream(&self, req: CompletionRequest) -> Result<TextStream> {
        let api_key = self.api_key.as_deref().ok_or(ChatError::MissingCredential)?;

        let body = json!({
            "model": req.model,
            "messages": req.messages,
            "stream": true,
        });

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ChatError::upstream(
                Some(status.as_u16()),
                error_message(&text, status.canonical_reason().unwrap_or("request failed")),
            ));
        }

        Ok(decode_sse(response.bytes_stream().boxed()).boxed())
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}

/// Provider error bodies look like `{"error": {"message": "..."}}`.
fn error_message(body: &str, fallback: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        let error = v.get("error")?;
        error
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| error.as_str())
            .map(String::from)
    });
    match message {
        Some(m) => m,
        None if body.trim().is_empty() => fallback.to_owned(),
        None => body.trim().to_owned(),
    }
}

struct DecodeState<S> {
    bytes: S,
    decoder: SseDecoder,
    ready: VecDeque<Result<String>>,
    done: bool,
}

impl<S> DecodeState<S> {
    fn absorb(&mut self, events: impl IntoIterator<Item = StreamEvent>) {
        for event in events {
            if self.done {
                return;
            }
            match event {
                StreamEvent::Delta(text) => self.ready.push_back(Ok(text)),
                StreamEvent::Done => self.done = true,
                StreamEvent::Error(message) => {
                    self.ready.push_back(Err(ChatError::upstream(None, message)));
                    self.done = true;
                }
            }
        }
    }
}

/// Decode a raw SSE byte stream into text deltas.
///
/// Ends at `[DONE]`, at the end of the body, or after the first error.
pub fn decode_sse<S, E>(bytes: S) -> impl Stream<Item = Result<String>> + Send + 'static
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + Unpin + 'static,
    E: Display,
{
    let state = DecodeState {
        bytes,
        decoder: SseDecoder::new(),
        ready: VecDeque::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.ready.pop_front() {
                return Some((item, st));
            }
            if st.done {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = st.decoder.feed(&chunk);
                    st.absorb(events);
                }
                Some(Err(e)) => {
                    st.ready.push_back(Err(ChatError::Network(e.to_string())));
                    st.done = true;
                }
                None => {
                    let last = st.decoder.finish();
                    st.absorb(last);
                    st.done = true;
                }
            }
        }
    })
}
