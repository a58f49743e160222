use std::sync::Arc;

use shared_config::{AppConfig, RecordStoreKind};
use shared_database::{InMemoryStore, RecordStore, SupabaseClient};

use crate::locks::SlotLocks;

/// Per-process state handed to every router. The record store is injected
/// here once and passed explicitly into each service.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn RecordStore>,
    pub slot_locks: Option<Arc<SlotLocks>>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn RecordStore>) -> Self {
        let slot_locks = config
            .serialize_slot_bookings
            .then(|| Arc::new(SlotLocks::new()));

        Self {
            config: Arc::new(config),
            store,
            slot_locks,
        }
    }

    /// Builds the record store selected by `RECORD_STORE`.
    pub fn from_config(config: AppConfig) -> Self {
        let store: Arc<dyn RecordStore> = match config.record_store {
            RecordStoreKind::Supabase => Arc::new(SupabaseClient::new(&config)),
            RecordStoreKind::Memory => Arc::new(InMemoryStore::new()),
        };
        Self::new(config, store)
    }
}
