//! Browser client of the streaming proxy.
//!
//! Posts a chat history to the proxy with `fetch()` (via gloo-net) and
//! reads the plain-text body chunk by chunk as it arrives.

use gloo_net::http::Request;
use js_sys::{Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::ReadableStreamDefaultReader;

use lexi_types::{
    ChatError, Result,
    chat::{ChatRequestBody, ChatTurn},
};

pub struct ProxyClient {
    url: String,
}

impl ProxyClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send `turns` and hand every decoded text chunk to `on_chunk`.
    /// Resolves with the complete reply once the body ends.
    ///
    /// A non-2xx answer fails before any chunk is delivered.
    pub async fn stream_reply(
        &self,
        turns: Vec<ChatTurn>,
        mut on_chunk: impl FnMut(&str),
    ) -> Result<String> {
        let body = ChatRequestBody { messages: turns };

        let response = Request::post(&self.url)
            .json(&body)
            .map_err(|e| ChatError::Serialization(e.to_string()))?
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        if !response.ok() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ChatError::upstream(Some(status), error_message(&text)));
        }

        let stream = response
            .body()
            .ok_or_else(|| ChatError::Network("response has no body".to_string()))?;
        let reader: ReadableStreamDefaultReader = stream.get_reader().unchecked_into();

        let mut reply = String::new();
        let mut pending = Vec::new();
        loop {
            let result = JsFuture::from(reader.read())
                .await
                .map_err(|e| ChatError::Network(format!("{:?}", e)))?;

            let done = Reflect::get(&result, &JsValue::from_str("done"))
                .map_err(|e| ChatError::JsInterop(format!("{:?}", e)))?
                .as_bool()
                .unwrap_or(true);
            if done {
                break;
            }

            let value = Reflect::get(&result, &JsValue::from_str("value"))
                .map_err(|e| ChatError::JsInterop(format!("{:?}", e)))?;
            pending.extend(Uint8Array::new(&value).to_vec());

            let text = take_utf8_prefix(&mut pending);
            if !text.is_empty() {
                on_chunk(&text);
                reply.push_str(&text);
            }
        }

        if !pending.is_empty() {
            let tail = String::from_utf8_lossy(&pending).into_owned();
            on_chunk(&tail);
            reply.push_str(&tail);
        }

        log::debug!("Proxy reply complete: {} bytes", reply.len());
        Ok(reply)
    }
}

/// Remove and decode the longest valid UTF-8 prefix of `buf`, leaving an
/// incomplete trailing sequence for the next read. Invalid bytes in the
/// middle are replaced rather than stalling the stream.
pub fn take_utf8_prefix(buf: &mut Vec<u8>) -> String {
    let valid = match std::str::from_utf8(buf) {
        Ok(_) => buf.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(_) => {
            let text = String::from_utf8_lossy(buf).into_owned();
            buf.clear();
            return text;
        }
    };
    let rest = buf.split_off(valid);
    let bytes = std::mem::replace(buf, rest);
    String::from_utf8(bytes).unwrap_or_default()
}

/// Pull `error` out of the proxy's JSON error body, or use the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string())
}
