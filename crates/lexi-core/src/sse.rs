//! Decoder for OpenAI-style server-sent event streams.
//!
//! Network reads split lines (and UTF-8 sequences) anywhere, so raw bytes
//! are buffered until a full line is available.

use serde_json::Value;

/// Streaming event from a chat completion response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A partial token
    Delta(String),
    /// Stream finished
    Done,
    /// Error reported inside the stream
    Error(String),
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns the events completed by them.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        self.pending.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = parse_sse_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Decode a final unterminated line, if the server closed without one.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        let rest = std::mem::take(&mut self.pending);
        parse_sse_line(&String::from_utf8_lossy(&rest))
    }
}

/// Parse one SSE line. Comments, blank lines, non-`data` fields and deltas
/// without text yield `None`.
pub fn parse_sse_line(line: &str) -> Option<StreamEvent> {
    let line = line.trim_end_matches(['\r', '\n']);
    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);

    if data == "[DONE]" {
        return Some(StreamEvent::Done);
    }

    let parsed: Value = serde_json::from_str(data).ok()?;

    if let Some(error) = parsed.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| error.to_string());
        return Some(StreamEvent::Error(message));
    }

    // {"choices": [{"delta": {"content": "..."}}]}
    let content = parsed
        .get("choices")?
        .as_array()?
        .first()?
        .get("delta")?
        .get("content")?
        .as_str()?;

    if content.is_empty() {
        None
    } else {
        Some(StreamEvent::Delta(content.to_string()))
    }
}
