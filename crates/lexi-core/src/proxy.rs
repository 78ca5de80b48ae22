//! Request side of the streaming proxy: turns a caller's chat history into
//! an upstream completion request and opens the token stream.
//!
//! Pacing and deadlines need a timer, so they live with the server runtime.

use std::sync::Arc;

use lexi_types::{
    ChatError, Result,
    chat::ChatTurn,
    config::ProxyConfig,
};

use crate::ports::{CompletionPort, CompletionRequest, TextStream};

pub struct ChatProxy {
    config: ProxyConfig,
    upstream: Arc<dyn CompletionPort>,
}

impl ChatProxy {
    pub fn new(config: ProxyConfig, upstream: Arc<dyn CompletionPort>) -> Self {
        Self { config, upstream }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.upstream.provider_name()
    }

    /// Prepend the system preamble and pin the model. Turns are otherwise
    /// forwarded as-is, roles included.
    pub fn build_request(&self, turns: Vec<ChatTurn>) -> Result<CompletionRequest> {
        if turns.is_empty() {
            return Err(ChatError::InvalidRequest(
                "messages must contain at least one entry".to_string(),
            ));
        }

        let mut messages = Vec::with_capacity(turns.len() + 1);
        messages.push(ChatTurn::system(&self.config.system_prompt));
        messages.extend(turns);

        Ok(CompletionRequest {
            model: self.config.model.clone(),
            messages,
        })
    }

    /// Open the upstream stream. Errors here mean nothing has been
    /// generated yet.
    pub async fn open(&self, turns: Vec<ChatTurn>) -> Result<TextStream> {
        let req = self.build_request(turns)?;
        log::debug!(
            "Opening {} stream: model={} messages={}",
            self.upstream.provider_name(),
            req.model,
            req.messages.len()
        );
        self.upstream.open_stream(req).await
    }
}
