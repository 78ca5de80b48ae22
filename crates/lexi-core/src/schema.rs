//! Versioned key layout of the chat database.
//!
//! Everything lives in one key-value namespace:
//!
//! ```text
//! meta:schema_version                          -> u32
//! seq:{collection}                             -> u64, last id handed out
//! chats:{id:020}                               -> Chat
//! messages:{id:020}                            -> Message
//! idx:messages_by_chat:{chat:020}:{msg:020}    -> (empty)
//! ```
//!
//! Ids are zero-padded so keys sort in id order on backends that sort.

use serde::de::DeserializeOwned;
use serde::Serialize;
use lexi_types::{
    ChatError, Result,
    chat::{ChatId, MessageId},
};

use crate::ports::StoragePort;

pub const SCHEMA_VERSION: u32 = 1;

pub const VERSION_KEY: &str = "meta:schema_version";

const INDEX_MESSAGES_BY_CHAT: &str = "idx:messages_by_chat";

/// A record collection with its own id sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection {
    pub name: &'static str,
}

pub const CHATS: Collection = Collection { name: "chats" };
pub const MESSAGES: Collection = Collection { name: "messages" };

impl Collection {
    pub fn prefix(&self) -> String {
        format!("{}:", self.name)
    }

    pub fn record_key(&self, id: u64) -> String {
        format!("{}:{:020}", self.name, id)
    }

    pub fn seq_key(&self) -> String {
        format!("seq:{}", self.name)
    }

    /// Id encoded in a key of this collection, if it is one
    pub fn id_from_key(&self, key: &str) -> Option<u64> {
        key.strip_prefix(self.name)?
            .strip_prefix(':')?
            .parse()
            .ok()
    }
}

pub fn message_index_prefix(chat_id: ChatId) -> String {
    format!("{}:{:020}:", INDEX_MESSAGES_BY_CHAT, chat_id)
}

pub fn message_index_key(chat_id: ChatId, message_id: MessageId) -> String {
    format!("{}{:020}", message_index_prefix(chat_id), message_id)
}

pub fn message_id_from_index_key(chat_id: ChatId, key: &str) -> Option<MessageId> {
    key.strip_prefix(&message_index_prefix(chat_id))?.parse().ok()
}

/// One schema step. Applying version N brings a store from N-1 to N.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    /// Collections introduced by this step
    pub collections: &'static [Collection],
}

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "chats_and_messages",
    collections: &[CHATS, MESSAGES],
}];

/// Schema version recorded in the store; 0 for a store never initialised.
pub async fn stored_version(storage: &dyn StoragePort) -> Result<u32> {
    Ok(read_json::<u32>(storage, VERSION_KEY).await?.unwrap_or(0))
}

/// Bring the store up to [`SCHEMA_VERSION`], returning the resulting version.
///
/// Fails with [`ChatError::SchemaMismatch`] when the store was written by a
/// newer schema than this build knows about.
pub async fn migrate(storage: &dyn StoragePort) -> Result<u32> {
    let found = stored_version(storage).await?;
    if found > SCHEMA_VERSION {
        return Err(ChatError::SchemaMismatch {
            found,
            supported: SCHEMA_VERSION,
        });
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > found) {
        log::info!(
            "Applying schema migration {} ({}) on {}",
            migration.version,
            migration.name,
            storage.backend_name()
        );
        for collection in migration.collections {
            let seq_key = collection.seq_key();
            if !storage.exists(&seq_key).await? {
                write_json(storage, &seq_key, &0u64).await?;
            }
        }
        write_json(storage, VERSION_KEY, &migration.version).await?;
    }

    Ok(SCHEMA_VERSION)
}

pub(crate) async fn read_json<T: DeserializeOwned>(
    storage: &dyn StoragePort,
    key: &str,
) -> Result<Option<T>> {
    match storage.get(key).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

pub(crate) async fn write_json<T: Serialize + ?Sized>(
    storage: &dyn StoragePort,
    key: &str,
    value: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    storage.set(key, &bytes).await
}
