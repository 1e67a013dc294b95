//! Handle allocation and the control surface.
//!
//! One [`SyncManager`] per process stands in for the usual process-wide
//! singleton: create it at startup, `release()` it at shutdown, pass it by
//! reference in between. Each handle owns a dispatcher and a registration
//! table; the manager's mutex covers only handle insert, lookup, and erase.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use rangesync_core::config::SyncConfig;
use rangesync_core::messages::Sink;
use rangesync_store::Dataset;

use crate::dispatcher::Dispatcher;
use crate::error::{Result, SyncError};
use crate::registry::{Registration, Registry};

/// Opaque identifier of one reconciliation context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u64);

struct HandleContext {
    dispatcher: Dispatcher,
    registry: Registry,
}

/// Owner of every live handle.
pub struct SyncManager {
    contexts: Mutex<HashMap<Handle, HandleContext>>,
    next_handle: AtomicU64,
}

impl SyncManager {
    pub fn new() -> Self {
        Self {
            contexts: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Allocate a fresh handle and start its dispatcher. Must be called
    /// within a tokio runtime.
    pub fn create(&self) -> Handle {
        let handle = Handle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let registry = Registry::new();
        let dispatcher = Dispatcher::spawn(registry.clone());
        self.contexts
            .lock()
            .unwrap()
            .insert(handle, HandleContext { dispatcher, registry });
        handle
    }

    /// Register (or replace) a sync id on a handle.
    ///
    /// The configuration must parse and name a recognized decoder; the
    /// dataset and sink are captured for as long as the registration lives.
    pub fn register_sync_id(
        &self,
        handle: Handle,
        sync_id: &str,
        dataset: Arc<dyn Dataset>,
        config_json: &str,
        sink: Sink,
    ) -> Result<()> {
        if sync_id.is_empty() {
            return Err(SyncError::InvalidArgument("empty sync id"));
        }
        if config_json.trim().is_empty() {
            return Err(SyncError::InvalidArgument("empty configuration"));
        }
        let config = SyncConfig::parse(config_json)?;

        let contexts = self.contexts.lock().unwrap();
        let context = contexts
            .get(&handle)
            .ok_or(SyncError::InvalidArgument("unknown handle"))?;
        context.registry.insert(Registration {
            sync_id: sync_id.to_string(),
            config,
            dataset,
            sink,
        });
        Ok(())
    }

    /// Enqueue one raw frame on a handle. Returns as soon as the frame is
    /// queued; processing happens on the handle's consumer task.
    pub fn push(&self, handle: Handle, frame: Bytes) -> Result<()> {
        if frame.is_empty() {
            return Err(SyncError::InvalidArgument("empty buffer"));
        }
        let contexts = self.contexts.lock().unwrap();
        let context = contexts
            .get(&handle)
            .ok_or(SyncError::InvalidArgument("unknown handle"))?;
        context.dispatcher.push(frame)
    }

    /// Reserved. Validates the handle and reports success.
    pub fn start_sync(&self, handle: Handle) -> Result<()> {
        let contexts = self.contexts.lock().unwrap();
        contexts
            .get(&handle)
            .map(|_| ())
            .ok_or(SyncError::InvalidArgument("unknown handle"))
    }

    /// Release one handle: the in-flight frame finishes, pending frames and
    /// all registrations are dropped.
    pub async fn close(&self, handle: Handle) -> Result<()> {
        let context = self
            .contexts
            .lock()
            .unwrap()
            .remove(&handle)
            .ok_or(SyncError::InvalidArgument("unknown handle"))?;
        context.dispatcher.shutdown().await;
        context.registry.clear();
        Ok(())
    }

    /// Release every live handle.
    pub async fn release(&self) {
        let drained: Vec<HandleContext> = {
            let mut contexts = self.contexts.lock().unwrap();
            contexts.drain().map(|(_, context)| context).collect()
        };
        for context in drained {
            context.dispatcher.shutdown().await;
            context.registry.clear();
        }
    }
}

impl Default for SyncManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rangesync_testkit::{catalog_config, catalog_memory, CollectingSink};

    fn manager() -> SyncManager {
        SyncManager::new()
    }

    #[tokio::test]
    async fn test_handles_are_distinct() {
        let manager = manager();
        let a = manager.create();
        let b = manager.create();
        assert_ne!(a, b);
        manager.release().await;
    }

    #[tokio::test]
    async fn test_register_rejects_empty_sync_id() {
        let manager = manager();
        let handle = manager.create();
        let sink = CollectingSink::new();
        let err = manager
            .register_sync_id(
                handle,
                "",
                Arc::new(catalog_memory()),
                &catalog_config(),
                sink.sink(),
            )
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidArgument(_)));
        manager.release().await;
    }

    #[tokio::test]
    async fn test_register_rejects_unknown_decoder() {
        let manager = manager();
        let handle = manager.create();
        let sink = CollectingSink::new();
        let config = catalog_config().replace("JSON_RANGE", "JSON_RANGE_INVALID");
        let err = manager
            .register_sync_id(
                handle,
                "test_id",
                Arc::new(catalog_memory()),
                &config,
                sink.sink(),
            )
            .unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
        manager.release().await;
    }

    #[tokio::test]
    async fn test_register_rejects_garbage_config() {
        let manager = manager();
        let handle = manager.create();
        let sink = CollectingSink::new();
        let err = manager
            .register_sync_id(
                handle,
                "test_id",
                Arc::new(catalog_memory()),
                r#"{"decoder_type"===="JSON_RANGE"}"#,
                sink.sink(),
            )
            .unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
        manager.release().await;
    }

    #[tokio::test]
    async fn test_push_validates_arguments() {
        let manager = manager();
        let handle = manager.create();

        assert!(matches!(
            manager.push(handle, Bytes::new()),
            Err(SyncError::InvalidArgument("empty buffer"))
        ));
        // Unregistered frames are accepted; they are dropped on the
        // consumer task.
        manager
            .push(handle, Bytes::from_static(b"test buffer"))
            .unwrap();
        manager.release().await;
    }

    #[tokio::test]
    async fn test_push_after_close_is_invalid() {
        let manager = manager();
        let handle = manager.create();
        manager.close(handle).await.unwrap();

        assert!(matches!(
            manager.push(handle, Bytes::from_static(b"x y {}")),
            Err(SyncError::InvalidArgument("unknown handle"))
        ));
        assert!(manager.close(handle).await.is_err());
    }

    #[tokio::test]
    async fn test_start_sync_is_ok_on_live_handle() {
        let manager = manager();
        let handle = manager.create();
        manager.start_sync(handle).unwrap();
        manager.close(handle).await.unwrap();
        assert!(manager.start_sync(handle).is_err());
    }

    #[tokio::test]
    async fn test_release_closes_every_handle() {
        let manager = manager();
        let a = manager.create();
        let b = manager.create();
        manager.release().await;
        assert!(manager.start_sync(a).is_err());
        assert!(manager.start_sync(b).is_err());
    }
}
