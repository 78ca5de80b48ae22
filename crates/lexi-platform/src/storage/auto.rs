//! Pick the storage backend the configuration asks for.
//!
//! `Auto` priority: IndexedDB → Memory (fallback, e.g. private browsing
//! modes that disable IndexedDB).

use std::rc::Rc;
use lexi_core::ports::StoragePort;
use lexi_types::{
    Result,
    config::{StorageBackendType, StorageConfig},
};
use super::{IndexedDbStorage, MemoryStorage};

/// Open the configured backend.
/// Returns a trait object so callers are backend-agnostic.
pub async fn open_storage(config: &StorageConfig) -> Result<Rc<dyn StoragePort>> {
    match config.backend {
        StorageBackendType::Memory => {
            log::info!("Storage backend: memory");
            Ok(Rc::new(MemoryStorage::new()))
        }
        StorageBackendType::IndexedDb => {
            let idb = IndexedDbStorage::open(&config.db_name).await?;
            log::info!("Storage backend: IndexedDB ({})", config.db_name);
            Ok(Rc::new(idb))
        }
        StorageBackendType::Auto => match IndexedDbStorage::open(&config.db_name).await {
            Ok(idb) => {
                log::info!("Storage backend: IndexedDB ({})", config.db_name);
                Ok(Rc::new(idb))
            }
            Err(e) => {
                log::warn!("IndexedDB unavailable ({}), falling back to memory", e);
                Ok(Rc::new(MemoryStorage::new()))
            }
        },
    }
}
