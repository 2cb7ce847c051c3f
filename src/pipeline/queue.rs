// src/pipeline/queue.rs
// =============================================================================
// The producer side of the download pipeline.
//
// Three channels tie the resolver to the workers:
// - fragments: bounded queue of (package, url) pairs waiting to be downloaded
// - reports:   unbounded channel of errors that should be surfaced, not fatal
//              unless the error itself says so
// - shutdown:  one-shot signal that no more fragments are coming
//
// `Pipeline` is the cheap, cloneable sending half that resolver tasks and
// download tasks carry around. `Intake` is the receiving half, owned by the
// worker pool.
// =============================================================================

use crate::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_QUEUE_SIZE: usize = 100;

// One artifact to download
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fragment {
    /// Package name
    pub name: String,
    /// Where the .deb lives
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    fragments: mpsc::Sender<Fragment>,
    reports: mpsc::UnboundedSender<Error>,
    shutdown: CancellationToken,
    enqueued: Arc<AtomicUsize>,
}

// Shared by every worker, so each receiver sits behind an async Mutex
#[derive(Debug)]
pub struct Intake {
    pub(super) fragments: Mutex<mpsc::Receiver<Fragment>>,
    pub(super) reports: Mutex<mpsc::UnboundedReceiver<Error>>,
    pub(super) shutdown: CancellationToken,
}

impl Pipeline {
    pub fn new(capacity: usize) -> (Self, Intake) {
        let (fragment_tx, fragment_rx) = mpsc::channel(capacity.max(1));
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let pipeline = Pipeline {
            fragments: fragment_tx,
            reports: report_tx,
            shutdown: shutdown.clone(),
            enqueued: Arc::new(AtomicUsize::new(0)),
        };
        let intake = Intake {
            fragments: Mutex::new(fragment_rx),
            reports: Mutex::new(report_rx),
            shutdown,
        };

        (pipeline, intake)
    }

    // Waits while the queue is full. Uniqueness per package is the
    // resolver's job, not ours.
    pub async fn enqueue(&self, fragment: Fragment) {
        tracing::debug!(package = %fragment.name, url = %fragment.url, "queued");
        match self.fragments.send(fragment).await {
            Ok(()) => {
                self.enqueued.fetch_add(1, Ordering::SeqCst);
            }
            Err(mpsc::error::SendError(fragment)) => {
                tracing::warn!(package = %fragment.name, "download queue is closed, dropping fragment");
            }
        }
    }

    // Never blocks
    pub fn report(&self, error: Error) {
        if let Err(mpsc::error::SendError(error)) = self.reports.send(error) {
            tracing::warn!("{:#}", anyhow::Error::from(error));
        }
    }

    // Call only once nothing else will be enqueued
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn enqueued(&self) -> usize {
        self.enqueued.load(Ordering::SeqCst)
    }
}

impl Intake {
    pub(super) async fn next_fragment(&self) -> Option<Fragment> {
        self.fragments.lock().await.recv().await
    }

    pub(super) async fn next_report(&self) -> Option<Error> {
        self.reports.lock().await.recv().await
    }

    // Whatever is still queued when shutdown arrives
    pub async fn drain_fragments(&self) -> Vec<Fragment> {
        let mut fragments = self.fragments.lock().await;
        let mut rest = Vec::new();
        while let Ok(fragment) = fragments.try_recv() {
            rest.push(fragment);
        }
        rest
    }

    pub async fn drain_reports(&self) -> Vec<Error> {
        let mut reports = self.reports.lock().await;
        let mut rest = Vec::new();
        while let Ok(error) = reports.try_recv() {
            rest.push(error);
        }
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(name: &str) -> Fragment {
        Fragment {
            name: name.to_string(),
            url: format!("http://ftp.us.debian.org/debian/pool/main/x/{name}/{name}_1_amd64.deb"),
        }
    }

    #[tokio::test]
    async fn test_enqueue_and_receive() {
        let (pipeline, intake) = Pipeline::new(4);
        pipeline.enqueue(fragment("libcap2")).await;
        pipeline.enqueue(fragment("liblz4-1")).await;

        assert_eq!(pipeline.enqueued(), 2);
        assert_eq!(intake.next_fragment().await.unwrap().name, "libcap2");
        assert_eq!(intake.drain_fragments().await, vec![fragment("liblz4-1")]);
    }

    #[tokio::test]
    async fn test_report_does_not_block() {
        let (pipeline, intake) = Pipeline::new(1);
        for _ in 0..10 {
            pipeline.report(Error::Extraction {
                what: "download heading",
                url: "https://packages.debian.org/x".to_string(),
            });
        }
        assert_eq!(intake.drain_reports().await.len(), 10);
    }

    #[tokio::test]
    async fn test_shutdown_signal() {
        let (pipeline, intake) = Pipeline::new(1);
        assert!(!intake.shutdown.is_cancelled());
        pipeline.shutdown();
        assert!(intake.shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn test_enqueue_waits_when_full() {
        let (pipeline, intake) = Pipeline::new(1);
        pipeline.enqueue(fragment("a")).await;

        let blocked = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.enqueue(fragment("b")).await })
        };
        tokio::task::yield_now().await;
        assert_eq!(pipeline.enqueued(), 1);

        assert_eq!(intake.next_fragment().await.unwrap().name, "a");
        blocked.await.unwrap();
        assert_eq!(pipeline.enqueued(), 2);
    }
}
