// src/error.rs
// =============================================================================
// Error types shared by the resolver and the download pipeline.
//
// Most failures in a run are local to one branch of the dependency tree:
// a page that didn't load, a page that doesn't look like a package page,
// one .deb that failed to transfer. Those get reported and the run carries on.
// A few are fatal (we can't write to the output directory) and stop the run.
//
// Rust concepts:
// - thiserror: derive Display/Error for an enum instead of writing them by hand
// - #[source]: keeps the underlying error so anyhow can print the whole chain
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The request never got a response (DNS, connect, timeout, body read)
    #[error("failed to fetch {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered, but not with 2xx
    #[error("failed to fetch {url}: HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// An expected field is missing - the page isn't shaped like we assume
    #[error("page {url} has no {what}")]
    Extraction { what: &'static str, url: String },

    /// One artifact failed to transfer
    #[error("failed to download {url}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A transfer went quiet for longer than the stall timeout
    #[error("download of {url} stalled: no data for {after:?}")]
    Stalled { url: String, after: std::time::Duration },

    /// Writing an artifact to disk failed (disk full, permissions, ...)
    #[error("failed to write {}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output directory couldn't be created or used
    #[error("failed to set up directory {}", path.display())]
    Setup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A resolver task panicked
    #[error("resolver task for {package} failed: {reason}")]
    Task { package: String, reason: String },
}

impl Error {
    // Fatal errors stop the whole run. Everything else is contained to the
    // branch (or the single download) that produced it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Storage { .. } | Error::Setup { .. })
    }

    // Whether trying the same request again could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Fetch { .. } | Error::Download { .. } | Error::Stalled { .. } => true,
            Error::Status { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}
