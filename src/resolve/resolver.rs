// src/resolve/resolver.rs
// =============================================================================
// Walks the dependency graph and feeds the download pipeline.
//
// For every package page:
// 1. Read the package name and claim it in the visited set.
//    If somebody else already claimed it, we're done.
// 2. Start a task that finds this package's .deb and queues it.
// 3. Start one task per hard dependency: fetch its page, then recurse.
// 4. Wait for all of those tasks before returning.
//
// Because of (4), the future returned by `resolve(root)` completes only when
// the whole tree has been walked and every fragment has been queued. That's
// the moment it's safe to shut the pipeline down.
//
// Failures stay inside their branch: a dependency page that doesn't load is
// reported and its siblings carry on.
//
// Rust concepts:
// - BoxFuture: async recursion needs a boxed future (the size of the future
//   can't depend on itself)
// - JoinSet: spawn a group of tasks and wait for all of them
// - Arc<dyn Fetch>: pages can come from HTTP or from test fixtures
// =============================================================================

use super::{mirror, VisitedSet};
use crate::config::ResolutionConfig;
use crate::error::Error;
use crate::page::{self, Fetch, Page};
use crate::pipeline::{Fragment, Pipeline};
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tokio::task::JoinSet;

#[derive(Clone)]
pub struct Resolver {
    inner: Arc<Inner>,
}

struct Inner {
    config: ResolutionConfig,
    fetcher: Arc<dyn Fetch>,
    visited: VisitedSet,
    pipeline: Pipeline,
}

impl Resolver {
    pub fn new(config: ResolutionConfig, fetcher: Arc<dyn Fetch>, pipeline: Pipeline) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                fetcher,
                visited: VisitedSet::new(),
                pipeline,
            }),
        }
    }

    /// Resolves `page` and everything it depends on
    pub fn resolve(&self, page: Page) -> BoxFuture<'static, ()> {
        self.clone().resolve_page(page).boxed()
    }

    /// Distinct packages claimed so far
    pub fn resolved(&self) -> usize {
        self.inner.visited.len()
    }

    async fn resolve_page(self, page: Page) {
        let name = match page::package_name(&page) {
            Ok(name) => name,
            Err(e) => return self.inner.pipeline.report(e),
        };

        if !self.inner.visited.try_claim(&name) {
            tracing::debug!(package = %name, "already claimed");
            return;
        }
        tracing::debug!(package = %name, "resolving");

        let mut tasks = JoinSet::new();
        tasks.spawn(self.clone().resolve_artifact(name.clone(), page.clone()));

        let deps = match page::dependencies(&page, self.inner.config.allow_libc) {
            Ok(deps) => deps,
            Err(e) => {
                self.inner.pipeline.report(e);
                Vec::new()
            }
        };

        for dep in deps {
            tasks.spawn(self.clone().descend(dep));
        }

        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                self.inner.pipeline.report(Error::Task {
                    package: name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    async fn descend(self, package: String) {
        let url = self.inner.config.package_url(&package);
        match self.inner.fetcher.fetch(&url).await {
            Ok(page) => self.resolve(page).await,
            Err(e) => self.inner.pipeline.report(e),
        }
    }

    async fn resolve_artifact(self, package: String, page: Page) {
        match self.find_fragment(&package, &page).await {
            Ok(Some(fragment)) => self.inner.pipeline.enqueue(fragment).await,
            Ok(None) => {}
            Err(e) => self.inner.pipeline.report(e),
        }
    }

    // Package page -> resolution link -> resolution page -> mirror link.
    // Ok(None) means nothing matched (logged, not an error).
    async fn find_fragment(&self, package: &str, page: &Page) -> Result<Option<Fragment>, Error> {
        let config = &self.inner.config;

        let Some(link) = page::artifact_link(page, &config.arch)? else {
            tracing::warn!(%package, arch = %config.arch, "no build for this architecture");
            return Ok(None);
        };

        if link.is_rejected_for(&config.version) {
            tracing::warn!(%package, link = %link.path, version = %config.version, "resolution link is for another version");
            return Ok(None);
        }

        let resolution = self.inner.fetcher.fetch(&config.index_url(&link.path)).await?;
        let candidates = page::mirror_candidates(&resolution)?;

        let Some(url) = mirror::select(&candidates, config) else {
            tracing::warn!(%package, mirror = %config.mirror, candidates = candidates.len(), "no download link on the configured mirror");
            return Ok(None);
        };

        Ok(Some(Fragment {
            name: link.package().unwrap_or(package).to_string(),
            url: url.to_string(),
        }))
    }
}
