//! WASM-target tests for lexi-platform (Node.js runtime).
//!
//! Tests MemoryStorage and the chat database on top of it under
//! wasm32-unknown-unknown via `wasm-pack test --node`.
//!
//! IndexedDB needs a browser and is not covered here.

use wasm_bindgen_test::*;

use lexi_core::db::ChatDb;
use lexi_core::event_bus::EventBus;
use lexi_core::ports::StoragePort;
use lexi_platform::client::take_utf8_prefix;
use lexi_platform::storage::{open_storage, MemoryStorage};
use lexi_types::config::{StorageBackendType, StorageConfig};
use lexi_types::event::StoreEvent;
use std::rc::Rc;

// ─── MemoryStorage Tests ─────────────────────────────────

#[wasm_bindgen_test]
fn memory_storage_backend_name() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.backend_name(), "memory");
    assert!(storage.is_empty());
}

#[wasm_bindgen_test]
async fn memory_storage_get_missing() {
    let storage = MemoryStorage::new();
    let result = storage.get("nonexistent").await.unwrap();
    assert!(result.is_none());
}

#[wasm_bindgen_test]
async fn memory_storage_set_get_delete() {
    let storage = MemoryStorage::new();
    storage.set("key1", b"value1").await.unwrap();
    assert_eq!(storage.get("key1").await.unwrap(), Some(b"value1".to_vec()));

    storage.set("key1", b"value2").await.unwrap();
    assert_eq!(storage.get("key1").await.unwrap(), Some(b"value2".to_vec()));
    assert_eq!(storage.len(), 1);

    storage.delete("key1").await.unwrap();
    assert!(!storage.exists("key1").await.unwrap());
}

#[wasm_bindgen_test]
async fn memory_storage_list_keys_by_prefix() {
    let storage = MemoryStorage::new();
    storage.set("chats:1", b"a").await.unwrap();
    storage.set("chats:2", b"b").await.unwrap();
    storage.set("messages:1", b"c").await.unwrap();

    let mut keys = storage.list_keys("chats:").await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["chats:1", "chats:2"]);
}

#[wasm_bindgen_test]
async fn open_storage_memory_backend() {
    let config = StorageConfig {
        backend: StorageBackendType::Memory,
        ..Default::default()
    };
    let storage = open_storage(&config).await.unwrap();
    assert_eq!(storage.backend_name(), "memory");
}

// ─── ChatDb over MemoryStorage ───────────────────────────

async fn memory_db() -> (ChatDb, Rc<MemoryStorage>) {
    let storage = Rc::new(MemoryStorage::new());
    let db = ChatDb::open(storage.clone(), EventBus::new()).await.unwrap();
    (db, storage)
}

#[wasm_bindgen_test]
async fn chat_db_conversation_flow() {
    let (db, _) = memory_db().await;

    let chat_id = db.create_chat(None).await.unwrap();
    assert_eq!(chat_id, 1);
    db.save_message(chat_id, "user", "Hi").await.unwrap();
    db.save_message(chat_id, "assistant", "Hello!").await.unwrap();

    let messages = db.get_chat_messages(Some(chat_id)).await.unwrap();
    let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["Hi", "Hello!"]);

    let chat = db.get_chat(chat_id).await.unwrap().unwrap();
    assert_eq!(chat.title, "New Chat");
}

#[wasm_bindgen_test]
async fn chat_db_rename_and_delete() {
    let (db, storage) = memory_db().await;
    let chat_id = db.create_chat(Some("Trip")).await.unwrap();
    db.save_message(chat_id, "user", "Where to?").await.unwrap();

    assert_eq!(db.update_chat_title(chat_id, "Paris trip").await.unwrap(), 1);
    assert_eq!(db.update_chat_title(999, "ghost").await.unwrap(), 0);
    assert!(db.get_chat(999).await.unwrap().is_none());

    db.delete_chat(chat_id).await.unwrap();
    assert!(db.get_chat(chat_id).await.unwrap().is_none());
    assert!(db.get_chat_messages(Some(chat_id)).await.unwrap().is_empty());
    assert!(storage.list_keys("messages:").await.unwrap().is_empty());
}

#[wasm_bindgen_test]
async fn chat_db_ids_survive_reopen() {
    let (db, storage) = memory_db().await;
    let first = db.create_chat(None).await.unwrap();
    db.delete_chat(first).await.unwrap();
    drop(db);

    let reopened = ChatDb::open(storage, EventBus::new()).await.unwrap();
    let second = reopened.create_chat(None).await.unwrap();
    assert!(second > first);
}

#[wasm_bindgen_test]
async fn chat_db_emits_events() {
    let (db, _) = memory_db().await;
    let chat_id = db.create_chat(None).await.unwrap();
    let message = db.save_message(chat_id, "user", "Hi").await.unwrap();

    let events = db.events().drain();
    assert_eq!(
        events,
        vec![
            StoreEvent::ChatCreated { chat_id },
            StoreEvent::MessageSaved {
                chat_id,
                message_id: message.id,
            },
        ]
    );
}

// ─── Proxy client helpers ────────────────────────────────

#[wasm_bindgen_test]
fn utf8_prefix_waits_for_split_character() {
    let bytes = "ok ✓".as_bytes();
    let mut buf = bytes[..bytes.len() - 1].to_vec();
    assert_eq!(take_utf8_prefix(&mut buf), "ok ");
    buf.push(bytes[bytes.len() - 1]);
    assert_eq!(take_utf8_prefix(&mut buf), "✓");
}
