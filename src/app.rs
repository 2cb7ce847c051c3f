// src/app.rs
// =============================================================================
// Wires a whole run together.
//
// 1. Create the output directory ({path}/{package})
// 2. Fetch the root package's page
// 3. Start the download workers
// 4. Resolve the dependency tree; every package found is queued for download
// 5. Once the tree is done, tell the pipeline to shut down
// 6. Wait for the remaining downloads
//
// Steps 4-6 run alongside the worker pool's join, so a fatal download error
// (like a full disk) ends the run straight away instead of after the walk.
// =============================================================================

use crate::cli::Cli;
use crate::config::ResolutionConfig;
use crate::error::Error;
use crate::page::{Fetch, HttpFetcher, Page};
use crate::pipeline::{default_workers, Downloader, Pipeline, WorkerPool};
use crate::resolve::Resolver;
use crate::retry::RetryPolicy;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

#[derive(Debug, Clone)]
pub struct Settings {
    pub package: String,
    pub output_base: PathBuf,
    pub config: ResolutionConfig,
    pub workers: usize,
    pub queue_size: usize,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let index_base = Url::parse(&cli.index_url)
            .with_context(|| format!("Invalid index URL '{}'", cli.index_url))?;

        let output_base = match &cli.path {
            Some(path) => path.clone(),
            None => std::env::current_dir().context("Failed to get working directory")?,
        };

        let config = ResolutionConfig::new(index_base, &cli.version, &cli.arch, &cli.mirror)
            .with_libc(&cli.package, !cli.no_libc)
            .with_retry(RetryPolicy::with_attempts(cli.retries));

        Ok(Self {
            package: cli.package.clone(),
            output_base,
            config,
            workers: cli.workers.unwrap_or_else(default_workers),
            queue_size: cli.queue_size,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub package: String,
    pub output_dir: PathBuf,
    pub packages_resolved: usize,
    pub fragments_enqueued: usize,
    pub downloaded: usize,
    pub failed_downloads: usize,
    pub reported_errors: usize,
}

// {base}/{package}, created if needed. If that fails we fall back to `base`
// itself, as long as it is an existing directory.
pub fn setup_output_dir(base: &Path, package: &str) -> Result<PathBuf, Error> {
    let target = base.join(package);
    match std::fs::create_dir_all(&target) {
        Ok(()) => Ok(target),
        Err(e) if base.is_dir() => {
            tracing::warn!(dir = %target.display(), error = %e, "could not create package directory, using {}", base.display());
            Ok(base.to_path_buf())
        }
        Err(source) => Err(Error::Setup {
            path: target,
            source,
        }),
    }
}

pub async fn run(settings: &Settings) -> Result<RunSummary> {
    let output_dir = setup_output_dir(&settings.output_base, &settings.package)?;

    let fetcher = HttpFetcher::new(settings.config.retry).context("Failed to create HTTP client")?;
    let downloader = Downloader::new(&output_dir, settings.config.retry)
        .context("Failed to create download client")?;

    let root_url = settings.config.package_url(&settings.package);
    let root = fetcher
        .fetch(&root_url)
        .await
        .with_context(|| format!("Failed to acquire package page for '{}'", settings.package))?;

    let summary = execute(settings, Arc::new(fetcher), downloader, root).await?;
    Ok(summary)
}

// Steps 3-6, given the root page. Split out so tests can supply their own pages.
pub async fn execute(
    settings: &Settings,
    fetcher: Arc<dyn Fetch>,
    downloader: Downloader,
    root: Page,
) -> Result<RunSummary, Error> {
    let output_dir = downloader.output_dir().to_path_buf();
    let (pipeline, intake) = Pipeline::new(settings.queue_size);
    let pool = WorkerPool::start(settings.workers, intake, pipeline.clone(), downloader);
    let resolver = Resolver::new(settings.config.clone(), fetcher, pipeline.clone());

    let walk = async {
        resolver.resolve(root).await;
        tracing::debug!(packages = resolver.resolved(), "dependency tree resolved");
        pipeline.shutdown();
        Ok::<(), Error>(())
    };

    let ((), downloads) = tokio::try_join!(walk, pool.join())?;

    Ok(RunSummary {
        package: settings.package.clone(),
        output_dir,
        packages_resolved: resolver.resolved(),
        fragments_enqueued: pipeline.enqueued(),
        downloaded: downloads.downloaded,
        failed_downloads: downloads.failed_downloads,
        reported_errors: downloads.reported_errors,
    })
}
