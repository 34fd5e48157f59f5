//! Debounced document saving
//!
//! Every local edit submits a snapshot. A background task waits until no
//! newer snapshot has arrived for the quiet period, then saves only the
//! latest one. Save failures are logged and dropped; the next edit triggers
//! another save.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::DataClient;
use crate::model::Document;
use crate::Result;

/// Quiet period after the last edit before a save is issued
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Destination of debounced saves
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn save_document(&self, document: &Document) -> Result<()>;
}

#[async_trait]
impl DocumentSink for DataClient {
    async fn save_document(&self, document: &Document) -> Result<()> {
        self.save(document).await
    }
}

pub struct SaveDebouncer {
    tx: mpsc::UnboundedSender<Document>,
    worker: JoinHandle<()>,
}

impl SaveDebouncer {
    /// Start the background saver. Must be called inside a tokio runtime.
    pub fn spawn(sink: Arc<dyn DocumentSink>, quiet_period: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run(sink, quiet_period, rx));
        Self { tx, worker }
    }

    /// Queue a snapshot; returns false if the saver has stopped.
    pub fn submit(&self, document: Document) -> bool {
        self.tx.send(document).is_ok()
    }

    /// Flush the pending snapshot (if any) and stop.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            warn!("Save worker ended abnormally: {}", e);
        }
    }
}

async fn run(
    sink: Arc<dyn DocumentSink>,
    quiet_period: Duration,
    mut rx: mpsc::UnboundedReceiver<Document>,
) {
    while let Some(mut latest) = rx.recv().await {
        let mut coalesced = 0usize;
        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(document) => {
                        latest = document;
                        coalesced += 1;
                    }
                    None => break,
                },
                _ = tokio::time::sleep(quiet_period) => break,
            }
        }

        match sink.save_document(&latest).await {
            Ok(()) => debug!(coalesced, "Debounced save complete"),
            Err(e) => warn!("Background save failed: {}", e),
        }
    }
    debug!("Save worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Post;
    use crate::Error;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        saved: Mutex<Vec<Document>>,
        fail: bool,
    }

    #[async_trait]
    impl DocumentSink for RecordingSink {
        async fn save_document(&self, document: &Document) -> Result<()> {
            self.saved.lock().await.push(document.clone());
            if self.fail {
                return Err(Error::Http("503 Service Unavailable".to_string()));
            }
            Ok(())
        }
    }

    fn doc_with_posts(n: usize) -> Document {
        Document {
            posts: (0..n)
                .map(|i| Post {
                    id: format!("p{}", i),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_burst_is_coalesced_into_latest() {
        let sink = Arc::new(RecordingSink::default());
        let saver = SaveDebouncer::spawn(sink.clone(), Duration::from_millis(50));

        for n in 1..=5 {
            assert!(saver.submit(doc_with_posts(n)));
        }
        saver.shutdown().await;

        let saved = sink.saved.lock().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].posts.len(), 5);
    }

    #[tokio::test]
    async fn test_separate_bursts_save_separately() {
        let sink = Arc::new(RecordingSink::default());
        let saver = SaveDebouncer::spawn(sink.clone(), Duration::from_millis(20));

        saver.submit(doc_with_posts(1));
        tokio::time::sleep(Duration::from_millis(200)).await;
        saver.submit(doc_with_posts(2));
        saver.shutdown().await;

        let saved = sink.saved.lock().await;
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[1].posts.len(), 2);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_worker() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let saver = SaveDebouncer::spawn(sink.clone(), Duration::from_millis(10));

        saver.submit(doc_with_posts(1));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(saver.submit(doc_with_posts(2)));
        saver.shutdown().await;

        assert_eq!(sink.saved.lock().await.len(), 2);
    }
}
