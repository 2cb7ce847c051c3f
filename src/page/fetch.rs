// src/page/fetch.rs
// =============================================================================
// Fetching pages from the package index.
//
// `Fetch` is a trait so the resolver doesn't care where pages come from.
// The real implementation, HttpFetcher, uses one shared reqwest Client
// (connection pooling) and retries transient failures. Its 30s limit covers
// a whole request, which suits HTML pages; .deb transfers use their own
// client (see pipeline/download.rs).
// =============================================================================

use super::Page;
use crate::error::Error;
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Page, Error>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(retry: RetryPolicy) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("debfetch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, retry })
    }

    async fn fetch_once(&self, url: &str) -> Result<Page, Error> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| Error::Fetch {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let html = response.text().await.map_err(|source| Error::Fetch {
            url: url.to_string(),
            source,
        })?;

        Ok(Page::new(url, html))
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Page, Error> {
        tracing::debug!(%url, "fetching page");
        self.retry.run(url, || self.fetch_once(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Select;
    use mockito::Server;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn test_fetch_page() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/bookworm/amd64/libcap2")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(r#"<div id="pdownload"><h2>Download libcap2</h2></div>"#)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(fast_retry()).unwrap();
        let url = format!("{}/bookworm/amd64/libcap2", server.url());
        let page = fetcher.fetch(&url).await.unwrap();

        assert_eq!(page.url(), url);
        let headings = page.select("#pdownload h2").unwrap();
        assert_eq!(headings[0].text, "Download libcap2");
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/bookworm/amd64/nope")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(fast_retry()).unwrap();
        let result = fetcher
            .fetch(&format!("{}/bookworm/amd64/nope", server.url()))
            .await;

        assert!(matches!(result, Err(Error::Status { status, .. }) if status == 404));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/bookworm/amd64/flaky")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(fast_retry()).unwrap();
        let result = fetcher
            .fetch(&format!("{}/bookworm/amd64/flaky", server.url()))
            .await;

        assert!(result.is_err());
        m.assert_async().await;
    }
}
