use serde::{Deserialize, Serialize};

/// Configuration of the browser client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    pub storage: StorageConfig,
    /// Where the streaming proxy is mounted, relative or absolute
    pub proxy_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            proxy_url: DEFAULT_PROXY_PATH.to_string(),
        }
    }
}

/// Fixed settings of the streaming proxy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub model: String,
    pub system_prompt: String,
    pub api_base: String,
    /// Upper bound on a single request, stream included
    pub max_duration_secs: u64,
    pub smoothing: SmoothingConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            max_duration_secs: 30,
            smoothing: SmoothingConfig::default(),
        }
    }
}

impl ProxyConfig {
    pub fn max_duration_ms(&self) -> u64 {
        self.max_duration_secs * 1000
    }
}

/// Word-by-word pacing applied to the relayed token stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    pub enabled: bool,
    /// Pause between two emitted word chunks
    pub delay_ms: u64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageConfig {
    pub backend: StorageBackendType,
    pub db_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendType::Auto,
            db_name: DEFAULT_DB_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackendType {
    /// Auto-detect best available backend
    Auto,
    Memory,
    IndexedDb,
}

pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_DB_NAME: &str = "chatApp";
pub const DEFAULT_PROXY_PATH: &str = "/api/chat";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant named Lexi.";
