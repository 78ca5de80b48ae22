//! Lexi web client: WASM entry point.
//!
//! This crate is the composition root. It picks a storage backend, opens
//! the chat database on first use and exposes everything to JavaScript as
//! the promise-based [`ChatApp`] class.

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture, Shared};
use gloo_utils::format::JsValueSerdeExt;
use js_sys::Promise;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use lexi_core::db::ChatDb;
use lexi_core::event_bus::EventBus;
use lexi_platform::client::ProxyClient;
use lexi_platform::storage::open_storage;
use lexi_types::{
    ChatError, Result,
    chat::{ChatId, ChatTurn, Message},
    config::ClientConfig,
};

type OpenDb = Shared<LocalBoxFuture<'static, Result<Rc<ChatDb>>>>;

/// WASM start hook, run once when the module is instantiated
#[wasm_bindgen(start)]
pub fn start() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Lexi WASM starting...");
}

/// Chat store and proxy client, as seen from JavaScript.
///
/// Every method returns a `Promise`. Ids are plain numbers; records use
/// camelCase fields (`chatId`, `createdAt`).
#[wasm_bindgen]
pub struct ChatApp {
    inner: Rc<Inner>,
}

struct Inner {
    config: ClientConfig,
    events: EventBus,
    client: ProxyClient,
    /// In-flight or finished open; shared so concurrent first calls open once
    db: RefCell<Option<OpenDb>>,
}

impl Inner {
    fn new(config: ClientConfig) -> Self {
        Self {
            client: ProxyClient::new(config.proxy_url.clone()),
            config,
            events: EventBus::new(),
            db: RefCell::new(None),
        }
    }

    async fn db(&self) -> Result<Rc<ChatDb>> {
        let pending = self
            .db
            .borrow_mut()
            .get_or_insert_with(|| {
                open_db(self.config.clone(), self.events.clone())
                    .boxed_local()
                    .shared()
            })
            .clone();

        let result = pending.clone().await;
        if let Err(e) = &result {
            log::error!("Failed to open chat database: {}", e);
            self.forget_open(&pending);
        }
        result
    }

    /// Clear the slot so the next call retries, unless another caller has
    /// already put a fresh attempt there.
    fn forget_open(&self, failed: &OpenDb) {
        let mut slot = self.db.borrow_mut();
        if slot.as_ref().is_some_and(|current| current.ptr_eq(failed)) {
            slot.take();
        }
    }

    /// Store the user's message, stream the reply, store the reply.
    async fn send_turn(
        &self,
        chat_id: ChatId,
        content: String,
        on_chunk: js_sys::Function,
    ) -> Result<Message> {
        let db = self.db().await?;
        db.save_message(chat_id, "user", &content).await?;

        let history = db.get_chat_messages(Some(chat_id)).await?;
        let turns: Vec<ChatTurn> = history.iter().map(ChatTurn::from).collect();

        let reply = self
            .client
            .stream_reply(turns, |chunk| {
                if let Err(e) = on_chunk.call1(&JsValue::NULL, &JsValue::from_str(chunk)) {
                    log::warn!("onChunk callback threw: {:?}", e);
                }
            })
            .await?;

        db.save_message(chat_id, "assistant", &reply).await
    }
}

async fn open_db(config: ClientConfig, events: EventBus) -> Result<Rc<ChatDb>> {
    let storage = open_storage(&config.storage).await?;
    Ok(Rc::new(ChatDb::open(storage, events).await?))
}

#[wasm_bindgen]
impl ChatApp {
    /// `options` is an optional `ClientConfig` object, e.g.
    /// `{ storage: { backend: "Memory" }, proxyUrl: "/api/chat" }`.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> std::result::Result<ChatApp, JsValue> {
        let config: ClientConfig = if options.is_undefined() || options.is_null() {
            ClientConfig::default()
        } else {
            options
                .into_serde()
                .map_err(|e| to_js_error(ChatError::Serialization(e.to_string())))?
        };

        Ok(ChatApp {
            inner: Rc::new(Inner::new(config)),
        })
    }

    #[wasm_bindgen(js_name = createChat)]
    pub fn create_chat(&self, title: Option<String>) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let id = inner.db().await.map_err(to_js_error)?
                .create_chat(title.as_deref())
                .await
                .map_err(to_js_error)?;
            Ok(id_to_js(id))
        })
    }

    /// Resolves with the chat, or `undefined` when there is none.
    #[wasm_bindgen(js_name = getChat)]
    pub fn get_chat(&self, id: u32) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let chat = inner.db().await.map_err(to_js_error)?
                .get_chat(ChatId::from(id))
                .await
                .map_err(to_js_error)?;
            match chat {
                Some(chat) => to_js(&chat),
                None => Ok(JsValue::UNDEFINED),
            }
        })
    }

    #[wasm_bindgen(js_name = listChats)]
    pub fn list_chats(&self) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let chats = inner.db().await.map_err(to_js_error)?
                .list_chats()
                .await
                .map_err(to_js_error)?;
            to_js(&chats)
        })
    }

    #[wasm_bindgen(js_name = getChatMessages)]
    pub fn get_chat_messages(&self, chat_id: Option<u32>) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let chat_id = chat_id.map(ChatId::from);
            // An absent id never opens the store
            if matches!(chat_id, None | Some(0)) {
                return Ok(js_sys::Array::new().into());
            }
            let messages = inner.db().await.map_err(to_js_error)?
                .get_chat_messages(chat_id)
                .await
                .map_err(to_js_error)?;
            to_js(&messages)
        })
    }

    /// Resolves with the stored message, id included.
    #[wasm_bindgen(js_name = saveMessage)]
    pub fn save_message(&self, chat_id: u32, role: String, content: String) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let message = inner.db().await.map_err(to_js_error)?
                .save_message(ChatId::from(chat_id), &role, &content)
                .await
                .map_err(to_js_error)?;
            to_js(&message)
        })
    }

    /// Resolves with the number of chats renamed, 1 or 0.
    #[wasm_bindgen(js_name = updateChatTitle)]
    pub fn update_chat_title(&self, chat_id: u32, title: String) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let changed = inner.db().await.map_err(to_js_error)?
                .update_chat_title(ChatId::from(chat_id), &title)
                .await
                .map_err(to_js_error)?;
            Ok(JsValue::from(changed))
        })
    }

    #[wasm_bindgen(js_name = deleteChat)]
    pub fn delete_chat(&self, chat_id: u32) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            inner.db().await.map_err(to_js_error)?
                .delete_chat(ChatId::from(chat_id))
                .await
                .map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Store events since the last call, oldest first. Not a promise: the
    /// bus is in memory. Only the most recent events are kept between
    /// calls; see `droppedEvents`.
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&self) -> std::result::Result<JsValue, JsValue> {
        to_js(&self.inner.events.drain())
    }

    /// Number of events discarded since the last call because nobody
    /// drained them in time. Non-zero means views should reload.
    #[wasm_bindgen(js_name = droppedEvents)]
    pub fn dropped_events(&self) -> f64 {
        self.inner.events.take_dropped() as f64
    }

    /// Save `content` as a user message, stream the assistant's reply
    /// through `onChunk(text)` and resolve with the saved reply.
    ///
    /// If the proxy fails, the user message stays stored and no assistant
    /// message is written.
    #[wasm_bindgen(js_name = sendTurn)]
    pub fn send_turn(&self, chat_id: u32, content: String, on_chunk: js_sys::Function) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let reply = inner
                .send_turn(ChatId::from(chat_id), content, on_chunk)
                .await
                .map_err(to_js_error)?;
            to_js(&reply)
        })
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> std::result::Result<JsValue, JsValue> {
    JsValue::from_serde(value).map_err(|e| to_js_error(ChatError::Serialization(e.to_string())))
}

fn id_to_js(id: ChatId) -> JsValue {
    JsValue::from_f64(id as f64)
}

fn to_js_error(err: ChatError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

#[cfg(test)]
mod tests;
