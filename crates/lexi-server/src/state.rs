//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use lexi_core::proxy::ChatProxy;

use crate::config::Config;

/// Immutable state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Request building and upstream access.
    pub proxy: Arc<ChatProxy>,
}
