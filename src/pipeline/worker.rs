// src/pipeline/worker.rs
// =============================================================================
// The worker pool that consumes the pipeline.
//
// Each worker loops over three events, checked in this order:
//   1. an error report     -> log it, or stop the run if it's fatal
//   2. a new fragment      -> start its download as its own task
//   3. the shutdown signal -> hand off whatever is still queued, then exit
//
// Downloads don't run inside the worker loop. A worker only dispatches them,
// so a slow mirror never stops a worker from picking up the next fragment.
// The TaskTracker remembers every dispatched download so `join` can wait for
// all of them before returning.
//
// Rust concepts:
// - tokio::select!: wait on several futures, act on whichever is ready first
// - JoinSet: a group of spawned tasks we can await one by one
// - Arc: shared ownership of the intake and counters across workers
// =============================================================================

use super::{Downloader, Fragment, Intake, Pipeline};
use crate::error::Error;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::task::TaskTracker;

// Counters shared by workers and download tasks
#[derive(Debug, Default)]
struct Stats {
    downloaded: AtomicUsize,
    failed: AtomicUsize,
    reported: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolSummary {
    pub downloaded: usize,
    pub failed_downloads: usize,
    pub reported_errors: usize,
}

// Everything a worker needs, shared by all of them
struct Shared {
    intake: Intake,
    pipeline: Pipeline,
    downloader: Downloader,
    downloads: TaskTracker,
    stats: Stats,
}

pub struct WorkerPool {
    workers: JoinSet<Result<(), Error>>,
    shared: Arc<Shared>,
}

// Number of workers when the caller doesn't say
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl WorkerPool {
    // `pipeline` is the sending half of `intake`; download tasks use it to
    // report their failures.
    pub fn start(size: usize, intake: Intake, pipeline: Pipeline, downloader: Downloader) -> Self {
        let shared = Arc::new(Shared {
            intake,
            pipeline,
            downloader,
            downloads: TaskTracker::new(),
            stats: Stats::default(),
        });

        let mut workers = JoinSet::new();
        for id in 0..size.max(1) {
            workers.spawn(work(id, Arc::clone(&shared)));
        }
        tracing::debug!(workers = size.max(1), "worker pool started");

        Self { workers, shared }
    }

    // Resolves once every worker has exited and every dispatched download
    // has finished. Returns early with the first fatal error.
    pub async fn join(mut self) -> Result<PoolSummary, Error> {
        while let Some(result) = self.workers.join_next().await {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(fatal)) => return Err(fatal),
                Err(e) => {
                    return Err(Error::Task {
                        package: "download worker".to_string(),
                        reason: e.to_string(),
                    })
                }
            }
        }

        let shared = &self.shared;
        shared.downloads.close();
        shared.downloads.wait().await;

        // Downloads that failed after the last worker left
        for error in shared.intake.drain_reports().await {
            handle_report(error, &shared.stats)?;
        }

        Ok(PoolSummary {
            downloaded: shared.stats.downloaded.load(Ordering::SeqCst),
            failed_downloads: shared.stats.failed.load(Ordering::SeqCst),
            reported_errors: shared.stats.reported.load(Ordering::SeqCst),
        })
    }
}

async fn work(id: usize, shared: Arc<Shared>) -> Result<(), Error> {
    let intake = &shared.intake;
    loop {
        tokio::select! {
            biased;

            Some(error) = intake.next_report() => {
                handle_report(error, &shared.stats)?;
            }

            Some(fragment) = intake.next_fragment() => {
                dispatch(&shared, fragment);
            }

            _ = intake.shutdown.cancelled() => {
                for fragment in intake.drain_fragments().await {
                    dispatch(&shared, fragment);
                }
                tracing::debug!(worker = id, "worker stopped");
                return Ok(());
            }
        }
    }
}

fn dispatch(shared: &Arc<Shared>, fragment: Fragment) {
    let task_shared = Arc::clone(shared);
    shared.downloads.spawn(async move {
        let shared = task_shared;
        match shared.downloader.download(&fragment).await {
            Ok(path) => {
                shared.stats.downloaded.fetch_add(1, Ordering::SeqCst);
                tracing::info!(package = %fragment.name, path = %path.display(), "downloaded");
            }
            Err(error) => {
                shared.stats.failed.fetch_add(1, Ordering::SeqCst);
                shared.pipeline.report(error);
            }
        }
    });
}

fn handle_report(error: Error, stats: &Stats) -> Result<(), Error> {
    if error.is_fatal() {
        return Err(error);
    }
    stats.reported.fetch_add(1, Ordering::SeqCst);
    tracing::warn!("{:#}", anyhow::Error::from(error));
    Ok(())
}
