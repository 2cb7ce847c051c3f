// src/pipeline/download.rs
// =============================================================================
// Downloads one artifact to the output directory.
//
// The file is named after the last path segment of its URL:
//   http://ftp.us.debian.org/debian/pool/main/libc/libcap2/libcap2_2.66-4_amd64.deb
//   -> {output_dir}/libcap2_2.66-4_amd64.deb
//
// An existing file with that name is overwritten. Content under a given URL
// never changes, so a retried or repeated download writes the same bytes.
//
// The body is streamed chunk by chunk into "<name>.part" and only renamed to
// its real name once the last chunk is on disk. A transfer that dies halfway
// leaves nothing behind under the real name.
//
// Timeouts: connecting gets a fixed limit, and so does each gap between two
// chunks. There is no limit on the whole transfer, so a big .deb on a slow
// but working link still finishes.
// =============================================================================

use super::Fragment;
use crate::error::Error;
use crate::retry::RetryPolicy;
use futures::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const STALL_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    output_dir: PathBuf,
    retry: RetryPolicy,
    /// Longest wait for the next chunk of a body
    stall_timeout: Duration,
}

impl Downloader {
    pub fn new(output_dir: impl Into<PathBuf>, retry: RetryPolicy) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("debfetch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            output_dir: output_dir.into(),
            retry,
            stall_timeout: STALL_TIMEOUT,
        })
    }

    pub fn with_stall_timeout(mut self, stall_timeout: Duration) -> Self {
        self.stall_timeout = stall_timeout;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    // Returns the path the artifact was written to
    pub async fn download(&self, fragment: &Fragment) -> Result<PathBuf, Error> {
        let dest = self.output_dir.join(file_name(fragment));
        self.retry
            .run(&fragment.url, || self.transfer(&fragment.url, &dest))
            .await?;
        Ok(dest)
    }

    async fn transfer(&self, url: &str, dest: &Path) -> Result<(), Error> {
        let partial = partial_path(dest);

        if let Err(e) = self.fetch_into(url, &partial).await {
            // Nothing useful in a half-written file; a missing one is fine too
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }

        tokio::fs::rename(&partial, dest)
            .await
            .map_err(|source| Error::Storage {
                path: dest.to_path_buf(),
                source,
            })
    }

    async fn fetch_into(&self, url: &str, path: &Path) -> Result<(), Error> {
        let network = |source| Error::Download {
            url: url.to_string(),
            source,
        };
        let storage = |source| Error::Storage {
            path: path.to_path_buf(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(network)?;
        if !response.status().is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let mut file = File::create(path).await.map_err(storage)?;
        let mut body = response.bytes_stream();
        loop {
            let next = tokio::time::timeout(self.stall_timeout, body.next())
                .await
                .map_err(|_| Error::Stalled {
                    url: url.to_string(),
                    after: self.stall_timeout,
                })?;
            let Some(chunk) = next else { break };
            let chunk = chunk.map_err(network)?;
            file.write_all(&chunk).await.map_err(storage)?;
        }
        file.flush().await.map_err(storage)?;

        Ok(())
    }
}

// "libcap2_2.66-4_amd64.deb" -> "libcap2_2.66-4_amd64.deb.part"
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

// Basename of the URL path. A URL ending in "/" has none, so fall back to
// the package name.
fn file_name(fragment: &Fragment) -> String {
    let path = fragment
        .url
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    match path.rsplit('/').next() {
        Some(base) if !base.is_empty() => base.to_string(),
        _ => format!("{}.deb", fragment.name),
    }
}
