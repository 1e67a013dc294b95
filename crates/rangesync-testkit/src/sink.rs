//! A sink that records outbound envelopes for assertions.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use rangesync_core::messages::Sink;

/// Collects every envelope delivered to it; clones share the buffer.
#[derive(Clone, Default)]
pub struct CollectingSink {
    messages: Arc<Mutex<Vec<String>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the callback to hand to `register_sync_id`.
    pub fn sink(&self) -> Sink {
        let messages = Arc::clone(&self.messages);
        Arc::new(move |message| messages.lock().unwrap().push(message))
    }

    /// Snapshot of everything collected so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    /// Wait until at least `count` envelopes arrived, panicking after five
    /// seconds. Processing happens on the handle's consumer task, so tests
    /// must await delivery rather than assert immediately after `push`.
    pub async fn wait_for(&self, count: usize) -> Vec<String> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let messages = self.messages();
            if messages.len() >= count {
                return messages;
            }
            if Instant::now() >= deadline {
                panic!(
                    "timed out waiting for {count} envelopes, have {}: {messages:#?}",
                    messages.len()
                );
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Give the consumer task time to drain, then snapshot. For asserting
    /// that nothing was emitted.
    pub async fn settled(&self) -> Vec<String> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        self.messages()
    }
}
