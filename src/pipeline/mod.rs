// src/pipeline/mod.rs
// =============================================================================
// The download pipeline.
//
// Submodules:
// - queue: The channels between the resolver and the workers
// - download: Transfers one .deb to disk
// - worker: The fixed-size pool that turns fragments into downloads
// =============================================================================

mod download;
mod queue;
mod worker;

// The resolver only ever sees `Pipeline`; the workers own `Intake`
pub use download::Downloader;
pub use queue::{Fragment, Intake, Pipeline, DEFAULT_QUEUE_SIZE};
pub use worker::{default_workers, WorkerPool};

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a bounded queue for fragments but an unbounded one for errors?
//    - A full fragment queue makes the resolver wait (backpressure), which
//      keeps memory flat on a huge dependency tree
//    - Reporting an error must never block: a worker reporting while the
//      queue is full could otherwise wait on itself
//
// 2. Why split Pipeline and Intake?
//    - Pipeline holds the sending halves and is cheap to clone
//    - Intake holds the receiving halves, each behind a tokio Mutex so
//      several workers can take turns receiving
//    - mpsc means "multi-producer, single-consumer"; the Mutex is what lets
//      more than one worker consume
//
// 3. What is a CancellationToken?
//    - A flag from tokio-util that tasks can await
//    - shutdown() cancels it once; every worker's select! sees it
//    - Workers still empty the queue before exiting, so nothing is lost
// -----------------------------------------------------------------------------
