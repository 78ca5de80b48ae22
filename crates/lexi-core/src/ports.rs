//! Port traits: the hexagonal architecture boundary.
//!
//! These traits are defined here in `lexi-core` (pure Rust).
//! Browser implementations live in `lexi-platform`, the upstream model
//! adapter lives in `lexi-server`. The core only depends on these traits.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;
use lexi_types::{Result, chat::ChatTurn};

// ─── Storage Port ────────────────────────────────────────────

/// Byte-oriented key-value store. Each call is atomic on its own;
/// nothing spans more than one key.
#[async_trait(?Send)]
pub trait StoragePort {
    /// Get a value by key
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Set a value
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete a value. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// List keys with a given prefix, in no particular order
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Check if a key exists
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── Completion Port ─────────────────────────────────────────

/// Lazy, finite stream of generated text. Dropping it cancels the upstream call.
pub type TextStream = BoxStream<'static, Result<String>>;

/// What gets sent to the hosted model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    /// System preamble first, then the caller's turns verbatim
    pub messages: Vec<ChatTurn>,
}

#[async_trait]
pub trait CompletionPort: Send + Sync {
    /// Start a streaming completion.
    ///
    /// Rejections known before the first token (bad credential, rate limit,
    /// malformed input) are returned here rather than inside the stream.
    async fn open_stream(&self, req: CompletionRequest) -> Result<TextStream>;

    /// Name of the provider (for logging/debug)
    fn provider_name(&self) -> &str;
}
