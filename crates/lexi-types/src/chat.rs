use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Primary key of a chat record
pub type ChatId = u64;

/// Primary key of a message record
pub type MessageId = u64;

/// Title given to chats created without one
pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// A conversation container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: ChatId,
    pub title: String,
    /// ISO-8601, set once at creation
    pub created_at: String,
}

/// A single persisted utterance within a chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    /// Free-form originator tag, e.g. "user" or "assistant"
    pub role: String,
    pub content: String,
    pub created_at: String,
}

/// Role/content pair as exchanged with the streaming proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new("system", text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new("user", text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new("assistant", text)
    }
}

impl From<&Message> for ChatTurn {
    fn from(msg: &Message) -> Self {
        Self::new(msg.role.clone(), msg.content.clone())
    }
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequestBody {
    pub messages: Vec<ChatTurn>,
}

impl ChatRequestBody {
    /// Assemble a proxy request from a chat's stored history.
    pub fn from_history(history: &[Message]) -> Self {
        Self {
            messages: history.iter().map(ChatTurn::from).collect(),
        }
    }
}

/// Current UTC time as an ISO-8601 string with millisecond precision,
/// e.g. `2025-05-01T12:00:00.000Z`. Fixed width, so strings sort in time order.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
