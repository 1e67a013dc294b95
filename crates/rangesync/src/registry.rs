//! Per-handle registration table.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rangesync_core::config::SyncConfig;
use rangesync_core::messages::Sink;
use rangesync_store::Dataset;

/// Everything the responder needs to serve one sync id.
///
/// Immutable once inserted; re-registering a sync id swaps the whole entry.
/// The dataset and sink are owned here, so both outlive every frame whose
/// processing they participate in.
pub struct Registration {
    pub sync_id: String,
    pub config: SyncConfig,
    pub dataset: Arc<dyn Dataset>,
    pub sink: Sink,
}

impl Registration {
    /// Deliver one formatted envelope to the registered sink.
    pub fn emit(&self, message: String) {
        (self.sink.as_ref())(message);
    }
}

/// Sync id → registration map, shared between the control surface and the
/// handle's consumer task.
#[derive(Clone, Default)]
pub struct Registry {
    entries: Arc<RwLock<HashMap<String, Arc<Registration>>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the registration for its sync id.
    pub fn insert(&self, registration: Registration) {
        let mut entries = self.entries.write().unwrap();
        entries.insert(registration.sync_id.clone(), Arc::new(registration));
    }

    /// Fetch the registration for `sync_id`, if any.
    pub fn lookup(&self, sync_id: &str) -> Option<Arc<Registration>> {
        self.entries.read().unwrap().get(sync_id).cloned()
    }

    /// Drop every registration.
    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }
}
