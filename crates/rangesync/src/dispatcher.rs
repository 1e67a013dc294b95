//! Per-handle message pipeline.
//!
//! Any thread may enqueue raw frames; one consumer task per handle decodes
//! them and drives the responder. Frames on one handle are strictly FIFO
//! and responder runs never overlap; distinct handles live on independent
//! tasks and make progress independently.
//!
//! Consumer-side failures (undecodable frames, unknown sync ids, dataset
//! errors) are logged and dropped: by the time they are discovered, the
//! `push` that delivered the frame has long returned.

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use rangesync_core::codec;

use crate::error::{Result, SyncError};
use crate::registry::Registry;
use crate::responder;

pub(crate) struct Dispatcher {
    ingress: mpsc::UnboundedSender<Bytes>,
    stop: Option<oneshot::Sender<()>>,
    consumer: Option<JoinHandle<()>>,
}

impl Dispatcher {
    /// Spawn the consumer task for one handle. Must run within a tokio
    /// runtime.
    pub fn spawn(registry: Registry) -> Self {
        let (ingress, frames) = mpsc::unbounded_channel();
        let (stop, stopped) = oneshot::channel();
        let consumer = tokio::spawn(consume(registry, frames, stopped));
        Self {
            ingress,
            stop: Some(stop),
            consumer: Some(consumer),
        }
    }

    /// Enqueue one frame. Never blocks on the dataset; processing happens
    /// later on the consumer task.
    pub fn push(&self, frame: Bytes) -> Result<()> {
        self.ingress
            .send(frame)
            .map_err(|_| SyncError::InvalidArgument("handle is shutting down"))
    }

    /// Stop the consumer after the in-flight frame; pending frames are
    /// dropped.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(consumer) = self.consumer.take() {
            let _ = consumer.await;
        }
    }
}

async fn consume(
    registry: Registry,
    mut frames: mpsc::UnboundedReceiver<Bytes>,
    mut stopped: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut stopped => break,
            frame = frames.recv() => match frame {
                Some(frame) => process(&registry, &frame).await,
                None => break,
            },
        }
    }
}

async fn process(registry: &Registry, frame: &[u8]) {
    let input = match codec::decode_frame(frame) {
        Ok(input) => input,
        Err(error) => {
            warn!(%error, "dropping undecodable frame");
            return;
        }
    };

    let Some(registration) = registry.lookup(&input.sync_id) else {
        warn!(sync_id = %input.sync_id, "dropping frame for unregistered sync id");
        return;
    };

    debug!(sync_id = %input.sync_id, op = ?input.op, begin = %input.begin, end = %input.end, "processing frame");
    if let Err(error) = responder::respond(&registration, &input).await {
        warn!(sync_id = %input.sync_id, %error, "response volley aborted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use rangesync_core::config::{SelectQuery, SyncConfig};
    use rangesync_store::{Dataset, DatasetError, Row, RowVisitor};
    use rangesync_testkit::{catalog_config, catalog_memory, CollectingSink};

    use crate::registry::Registration;

    fn registry_with(sync_id: &str, dataset: Arc<dyn Dataset>, sink: &CollectingSink) -> Registry {
        let registry = Registry::new();
        registry.insert(Registration {
            sync_id: sync_id.to_string(),
            config: SyncConfig::parse(&catalog_config()).unwrap(),
            dataset,
            sink: sink.sink(),
        });
        registry
    }

    #[tokio::test]
    async fn test_frames_processed_in_push_order() {
        let sink = CollectingSink::new();
        let registry = registry_with("test_id", Arc::new(catalog_memory()), &sink);
        let dispatcher = Dispatcher::spawn(registry);

        // A singleton volley (state + global) followed by a full dump.
        dispatcher
            .push(Bytes::from_static(
                br#"test_id checksum_fail {"begin":"/boot/grub2/grubenv","end":"/boot/grub2/grubenv","id":9}"#,
            ))
            .unwrap();
        dispatcher
            .push(Bytes::from_static(
                br#"test_id no_data {"begin":"","end":"","id":9}"#,
            ))
            .unwrap();

        let messages = sink.wait_for(7).await;
        let kinds: Vec<String> = messages
            .iter()
            .map(|m| {
                let value: serde_json::Value = serde_json::from_str(m).unwrap();
                value["type"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(
            kinds,
            [
                "state",
                "integrity_check_global",
                "state",
                "state",
                "state",
                "state",
                "state",
            ]
        );
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_unknown_sync_id_dropped_and_handle_stays_up() {
        let sink = CollectingSink::new();
        let registry = registry_with("test_id", Arc::new(catalog_memory()), &sink);
        let dispatcher = Dispatcher::spawn(registry);

        dispatcher
            .push(Bytes::from_static(
                br#"other_id checksum_fail {"begin":"a","end":"z","id":1}"#,
            ))
            .unwrap();
        assert!(sink.settled().await.is_empty());

        dispatcher
            .push(Bytes::from_static(
                br#"test_id checksum_fail {"begin":"/x","end":"/y","id":1}"#,
            ))
            .unwrap();
        let messages = sink.wait_for(1).await;
        assert!(messages[0].contains("integrity_clear"));
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_malformed_frames_dropped() {
        let sink = CollectingSink::new();
        let registry = registry_with("test_id", Arc::new(catalog_memory()), &sink);
        let dispatcher = Dispatcher::spawn(registry);

        dispatcher.push(Bytes::from_static(b"test_id")).unwrap();
        dispatcher
            .push(Bytes::from_static(
                br#"test_id checksum_fails {"begin":"a","end":"z","id":1}"#,
            ))
            .unwrap();
        dispatcher
            .push(Bytes::from_static(b"test_id checksum_fail not-json"))
            .unwrap();

        assert!(sink.settled().await.is_empty());
        dispatcher.shutdown().await;
    }

    /// Dataset whose count blocks until released, for isolation tests.
    struct GatedDataset {
        inner: rangesync_store::MemoryDataset,
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl Dataset for GatedDataset {
        async fn count_range(
            &self,
            query: &SelectQuery,
            count_field: &str,
            begin: &str,
            end: &str,
        ) -> std::result::Result<u64, DatasetError> {
            self.gate.notified().await;
            self.inner.count_range(query, count_field, begin, end).await
        }

        async fn row_by_index(
            &self,
            query: &SelectQuery,
            key: &str,
        ) -> std::result::Result<Option<Row>, DatasetError> {
            self.inner.row_by_index(query, key).await
        }

        async fn for_each_range(
            &self,
            query: &SelectQuery,
            begin: &str,
            end: &str,
            visit: RowVisitor<'_>,
        ) -> std::result::Result<(), DatasetError> {
            self.inner.for_each_range(query, begin, end, visit).await
        }

        async fn for_each(
            &self,
            query: &SelectQuery,
            visit: RowVisitor<'_>,
        ) -> std::result::Result<(), DatasetError> {
            self.inner.for_each(query, visit).await
        }
    }

    #[tokio::test]
    async fn test_blocked_handle_does_not_stall_others() {
        let gate = Arc::new(Notify::new());
        let gated = Arc::new(GatedDataset {
            inner: catalog_memory(),
            gate: Arc::clone(&gate),
        });

        let blocked_sink = CollectingSink::new();
        let blocked = Dispatcher::spawn(registry_with("test_id", gated, &blocked_sink));

        let free_sink = CollectingSink::new();
        let free = Dispatcher::spawn(registry_with(
            "test_id",
            Arc::new(catalog_memory()),
            &free_sink,
        ));

        let frame = Bytes::from_static(
            br#"test_id checksum_fail {"begin":"/boot/grub2/grubenv","end":"/boot/grub2/grubenv","id":3}"#,
        );
        blocked.push(frame.clone()).unwrap();
        free.push(frame).unwrap();

        // The free handle answers while the gated one is still waiting.
        let free_messages = free_sink.wait_for(2).await;
        assert_eq!(free_messages.len(), 2);
        assert!(blocked_sink.messages().is_empty());

        gate.notify_one();
        let blocked_messages = blocked_sink.wait_for(2).await;
        assert_eq!(blocked_messages.len(), 2);

        tokio::time::timeout(Duration::from_secs(1), async {
            blocked.shutdown().await;
            free.shutdown().await;
        })
        .await
        .unwrap();
    }
}
