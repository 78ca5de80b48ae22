//! IndexedDB storage backend.
//! Persistent across page reloads. Works in all modern browsers.
//! Uses web-sys bindings with wasm-bindgen-futures for async operations.
//!
//! All records share one object store; the chat schema on top of it is
//! versioned separately by `lexi_core::schema`.

use async_trait::async_trait;
use js_sys::{Array, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{IdbDatabase, IdbKeyRange, IdbObjectStore, IdbRequest, IdbTransactionMode};

use lexi_core::ports::StoragePort;
use lexi_types::{ChatError, Result};

const STORE_NAME: &str = "kv";
const DB_VERSION: u32 = 1;

pub struct IndexedDbStorage {
    db: IdbDatabase,
}

impl IndexedDbStorage {
    /// Open (or create) the named IndexedDB database.
    pub async fn open(db_name: &str) -> Result<Self> {
        let window = web_sys::window()
            .ok_or_else(|| ChatError::Storage("No window object".to_string()))?;

        let idb_factory = window
            .indexed_db()
            .map_err(js_storage_err)?
            .ok_or_else(|| ChatError::Storage("IndexedDB not available".to_string()))?;

        let open_req = idb_factory
            .open_with_u32(db_name, DB_VERSION)
            .map_err(js_storage_err)?;

        // First open (or version bump): create the object store
        let open_req_clone = open_req.clone();
        let onupgrade = Closure::once(move |_event: web_sys::Event| {
            let db = match open_req_clone.result().and_then(|r| r.dyn_into::<IdbDatabase>()) {
                Ok(db) => db,
                Err(e) => {
                    log::error!("IndexedDB upgrade without a database: {:?}", e);
                    return;
                }
            };
            if !db.object_store_names().contains(STORE_NAME) {
                if let Err(e) = db.create_object_store(STORE_NAME) {
                    log::error!("Failed to create object store {}: {:?}", STORE_NAME, e);
                }
            }
        });
        open_req.set_onupgradeneeded(Some(onupgrade.as_ref().unchecked_ref()));
        onupgrade.forget();

        let db: IdbDatabase = await_request(&open_req)
            .await?
            .dyn_into()
            .map_err(js_storage_err)?;

        log::debug!("IndexedDB {} opened at version {}", db_name, DB_VERSION);
        Ok(Self { db })
    }

    fn store(&self, mode: IdbTransactionMode) -> Result<IdbObjectStore> {
        let tx = self
            .db
            .transaction_with_str_and_mode(STORE_NAME, mode)
            .map_err(js_storage_err)?;
        tx.object_store(STORE_NAME).map_err(js_storage_err)
    }
}

#[async_trait(?Send)]
impl StoragePort for IndexedDbStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let store = self.store(IdbTransactionMode::Readonly)?;
        let req = store
            .get(&JsValue::from_str(key))
            .map_err(js_storage_err)?;

        let result = await_request(&req).await?;
        if result.is_undefined() || result.is_null() {
            return Ok(None);
        }

        let array = Uint8Array::new(&result);
        Ok(Some(array.to_vec()))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let store = self.store(IdbTransactionMode::Readwrite)?;
        let js_value = Uint8Array::from(value);
        let req = store
            .put_with_key(&js_value, &JsValue::from_str(key))
            .map_err(js_storage_err)?;
        // Wait for the write so quota errors surface to the caller
        await_request(&req).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let store = self.store(IdbTransactionMode::Readwrite)?;
        let req = store
            .delete(&JsValue::from_str(key))
            .map_err(js_storage_err)?;
        await_request(&req).await?;
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let store = self.store(IdbTransactionMode::Readonly)?;
        let req = if prefix.is_empty() {
            store.get_all_keys()
        } else {
            // Only the keys in [prefix, prefix + U+FFFF] leave the database
            let range = IdbKeyRange::bound(
                &JsValue::from_str(prefix),
                &JsValue::from_str(&prefix_upper_bound(prefix)),
            )
            .map_err(js_storage_err)?;
            store.get_all_keys_with_key(&range)
        }
        .map_err(js_storage_err)?;

        let array: Array = await_request(&req)
            .await?
            .dyn_into()
            .map_err(js_storage_err)?;

        let mut keys = Vec::with_capacity(array.length() as usize);
        for i in 0..array.length() {
            if let Some(key) = array.get(i).as_string() {
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }

    fn backend_name(&self) -> &str {
        "indexeddb"
    }
}

/// Upper end of the key range holding every key that starts with `prefix`.
/// Keys are compared by UTF-16 code unit, and U+FFFF sorts after any code
/// unit our keys contain.
fn prefix_upper_bound(prefix: &str) -> String {
    format!("{prefix}\u{ffff}")
}

fn js_storage_err(e: JsValue) -> ChatError {
    ChatError::Storage(format!("{:?}", e))
}

/// Await an IdbRequest by wrapping its callbacks in a JS Promise.
async fn await_request(req: &IdbRequest) -> Result<JsValue> {
    let req_for_success = req.clone();
    let req_for_callbacks = req.clone();

    let promise = js_sys::Promise::new(&mut move |resolve, reject| {
        let req_inner = req_for_success.clone();
        let onsuccess = Closure::once(move |_: web_sys::Event| {
            let _ = resolve.call1(
                &JsValue::NULL,
                &req_inner.result().unwrap_or(JsValue::UNDEFINED),
            );
        });
        let onerror = Closure::once(move |_: web_sys::Event| {
            let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("IDB request failed"));
        });
        req_for_callbacks.set_onsuccess(Some(onsuccess.as_ref().unchecked_ref()));
        req_for_callbacks.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onsuccess.forget();
        onerror.forget();
    });

    JsFuture::from(promise).await.map_err(js_storage_err)
}
