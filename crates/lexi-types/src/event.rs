use serde::{Deserialize, Serialize};

use crate::chat::{ChatId, MessageId};

/// Change notifications emitted by the persistence layer.
/// The UI subscribes to these to refresh chat lists and transcripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum StoreEvent {
    ChatCreated { chat_id: ChatId },

    ChatRenamed { chat_id: ChatId, title: String },

    /// The chat and all of its messages are gone
    ChatDeleted { chat_id: ChatId },

    MessageSaved { chat_id: ChatId, message_id: MessageId },
}

impl StoreEvent {
    /// The chat this event concerns
    pub fn chat_id(&self) -> ChatId {
        match self {
            StoreEvent::ChatCreated { chat_id }
            | StoreEvent::ChatRenamed { chat_id, .. }
            | StoreEvent::ChatDeleted { chat_id }
            | StoreEvent::MessageSaved { chat_id, .. } => *chat_id,
        }
    }
}
