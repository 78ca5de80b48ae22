//! The chat database: typed access to chats and messages on top of a
//! [`StoragePort`].
//!
//! Every operation is a short sequence of single-key reads and writes.
//! Nothing spans a transaction, so multi-key operations such as
//! [`ChatDb::delete_chat`] are best-effort: a failure halfway leaves the
//! keys written so far in place.

use std::cell::Cell;
use std::rc::Rc;

use lexi_types::{
    Result,
    chat::{Chat, ChatId, Message, MessageId, DEFAULT_CHAT_TITLE, now_timestamp},
    event::StoreEvent,
};

use crate::event_bus::EventBus;
use crate::ports::StoragePort;
use crate::schema::{
    self, CHATS, MESSAGES, read_json, write_json,
    message_index_key, message_index_prefix, message_id_from_index_key,
};

pub struct ChatDb {
    storage: Rc<dyn StoragePort>,
    events: EventBus,
    /// Last ids handed out. Bumped before any await so interleaved callers
    /// on the same thread never share an id.
    last_chat_id: Cell<ChatId>,
    last_message_id: Cell<MessageId>,
}

impl ChatDb {
    /// Open the database, running pending schema migrations first.
    pub async fn open(storage: Rc<dyn StoragePort>, events: EventBus) -> Result<Self> {
        let version = schema::migrate(storage.as_ref()).await?;
        let last_chat_id = read_json::<u64>(storage.as_ref(), &CHATS.seq_key())
            .await?
            .unwrap_or(0);
        let last_message_id = read_json::<u64>(storage.as_ref(), &MESSAGES.seq_key())
            .await?
            .unwrap_or(0);

        log::info!(
            "Chat database ready on {} (schema v{}, {} chats / {} messages allocated)",
            storage.backend_name(),
            version,
            last_chat_id,
            last_message_id
        );

        Ok(Self {
            storage,
            events,
            last_chat_id: Cell::new(last_chat_id),
            last_message_id: Cell::new(last_message_id),
        })
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn backend_name(&self) -> &str {
        self.storage.backend_name()
    }

    /// Insert a chat titled `title`, or "New Chat" when absent.
    pub async fn create_chat(&self, title: Option<&str>) -> Result<ChatId> {
        let id = self.allocate_chat_id().await?;
        let chat = Chat {
            id,
            title: title.unwrap_or(DEFAULT_CHAT_TITLE).to_string(),
            created_at: now_timestamp(),
        };
        write_json(self.storage.as_ref(), &CHATS.record_key(id), &chat).await?;

        log::debug!("Created chat {} ({:?})", id, chat.title);
        self.events.emit(StoreEvent::ChatCreated { chat_id: id });
        Ok(id)
    }

    /// `None` when no chat has this id.
    pub async fn get_chat(&self, id: ChatId) -> Result<Option<Chat>> {
        read_json(self.storage.as_ref(), &CHATS.record_key(id)).await
    }

    /// All chats, newest first.
    pub async fn list_chats(&self) -> Result<Vec<Chat>> {
        let keys = self.storage.list_keys(&CHATS.prefix()).await?;
        let mut chats = Vec::with_capacity(keys.len());
        for key in keys {
            if CHATS.id_from_key(&key).is_none() {
                continue;
            }
            if let Some(chat) = read_json::<Chat>(self.storage.as_ref(), &key).await? {
                chats.push(chat);
            }
        }
        chats.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(chats)
    }

    /// Messages of a chat in creation order.
    ///
    /// With no chat id (or the never-assigned id 0) this returns an empty
    /// list without touching the store.
    pub async fn get_chat_messages(&self, chat_id: Option<ChatId>) -> Result<Vec<Message>> {
        let chat_id = match chat_id {
            Some(id) if id != 0 => id,
            _ => return Ok(Vec::new()),
        };

        let mut messages = Vec::new();
        for message_id in self.message_ids_of(chat_id).await? {
            match read_json::<Message>(self.storage.as_ref(), &MESSAGES.record_key(message_id))
                .await?
            {
                Some(msg) if msg.chat_id == chat_id => messages.push(msg),
                Some(_) | None => {
                    log::warn!("Dangling index entry: chat {} message {}", chat_id, message_id);
                }
            }
        }
        messages.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(messages)
    }

    /// Append a message and return it as stored, id included.
    pub async fn save_message(&self, chat_id: ChatId, role: &str, content: &str) -> Result<Message> {
        let id = self.allocate_message_id().await?;
        let message = Message {
            id,
            chat_id,
            role: role.to_string(),
            content: content.to_string(),
            created_at: now_timestamp(),
        };
        // Index first: delete_chat finds messages only through the index, and
        // a dangling index entry is skipped on read.
        self.storage
            .set(&message_index_key(chat_id, id), &[])
            .await?;
        write_json(self.storage.as_ref(), &MESSAGES.record_key(id), &message).await?;

        log::debug!("Saved {} message {} in chat {}", message.role, id, chat_id);
        self.events.emit(StoreEvent::MessageSaved {
            chat_id,
            message_id: id,
        });
        Ok(message)
    }

    /// Rename a chat. Returns the number of chats changed: 1, or 0 when the
    /// id is unknown (nothing is created in that case).
    pub async fn update_chat_title(&self, chat_id: ChatId, title: &str) -> Result<u32> {
        let key = CHATS.record_key(chat_id);
        let Some(mut chat) = read_json::<Chat>(self.storage.as_ref(), &key).await? else {
            return Ok(0);
        };
        chat.title = title.to_string();
        write_json(self.storage.as_ref(), &key, &chat).await?;

        self.events.emit(StoreEvent::ChatRenamed {
            chat_id,
            title: chat.title,
        });
        Ok(1)
    }

    /// Delete a chat's messages, then the chat.
    ///
    /// Not atomic: on a storage failure some messages may already be gone
    /// while the chat record remains. Calling it again finishes the job.
    pub async fn delete_chat(&self, chat_id: ChatId) -> Result<()> {
        let message_ids = self.message_ids_of(chat_id).await?;
        for message_id in &message_ids {
            self.storage.delete(&MESSAGES.record_key(*message_id)).await?;
            self.storage
                .delete(&message_index_key(chat_id, *message_id))
                .await?;
        }

        let chat_key = CHATS.record_key(chat_id);
        let existed = self.storage.exists(&chat_key).await?;
        self.storage.delete(&chat_key).await?;

        if existed || !message_ids.is_empty() {
            log::debug!("Deleted chat {} and {} messages", chat_id, message_ids.len());
            self.events.emit(StoreEvent::ChatDeleted { chat_id });
        }
        Ok(())
    }

    async fn message_ids_of(&self, chat_id: ChatId) -> Result<Vec<MessageId>> {
        let keys = self
            .storage
            .list_keys(&message_index_prefix(chat_id))
            .await?;
        Ok(keys
            .iter()
            .filter_map(|k| message_id_from_index_key(chat_id, k))
            .collect())
    }

    async fn allocate_chat_id(&self) -> Result<ChatId> {
        let id = bump(&self.last_chat_id);
        // Persist the high-water mark before the record so a crash in
        // between can only skip an id, never reuse one.
        write_json(self.storage.as_ref(), &CHATS.seq_key(), &self.last_chat_id.get()).await?;
        Ok(id)
    }

    async fn allocate_message_id(&self) -> Result<MessageId> {
        let id = bump(&self.last_message_id);
        write_json(self.storage.as_ref(), &MESSAGES.seq_key(), &self.last_message_id.get()).await?;
        Ok(id)
    }
}

fn bump(counter: &Cell<u64>) -> u64 {
    let id = counter.get() + 1;
    counter.set(id);
    id
}
