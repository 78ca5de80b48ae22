use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Schema version {found} is newer than supported version {supported}")]
    SchemaMismatch { found: u32, supported: u32 },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No API credential configured")]
    MissingCredential,

    #[error("Upstream error{}: {message}", http_status(.status))]
    Upstream { status: Option<u16>, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("JS interop error: {0}")]
    JsInterop(String),
}

impl ChatError {
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        ChatError::Upstream {
            status,
            message: message.into(),
        }
    }
}

fn http_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl From<serde_json::Error> for ChatError {
    fn from(e: serde_json::Error) -> Self {
        ChatError::Serialization(e.to_string())
    }
}
