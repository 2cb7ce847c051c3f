// src/fixtures.rs
// =============================================================================
// Test-only builders for index pages, plus a Fetch implementation that serves
// them from memory. Nothing here touches the network.
// =============================================================================

use crate::config::{ResolutionConfig, DEFAULT_INDEX, DEFAULT_MIRROR, DEFAULT_VERSION};
use crate::error::Error;
use crate::page::{Fetch, Page};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use url::Url;

pub const ARCH: &str = "amd64";

pub fn config() -> ResolutionConfig {
    ResolutionConfig::new(
        Url::parse(DEFAULT_INDEX).unwrap(),
        DEFAULT_VERSION,
        ARCH,
        DEFAULT_MIRROR,
    )
}

pub fn package_url(name: &str) -> String {
    format!("{DEFAULT_INDEX}/{DEFAULT_VERSION}/{ARCH}/{name}")
}

pub fn download_path(name: &str) -> String {
    format!("/{DEFAULT_VERSION}/{ARCH}/{name}/download")
}

// A package page listing `deps` as hard dependencies, with an amd64 build
pub fn package_page(name: &str, deps: &[&str]) -> Page {
    let relations: Vec<(&str, &str)> = deps.iter().map(|dep| ("dep:", *dep)).collect();
    package_page_with_relations(name, &relations)
}

pub fn package_page_with_relations(name: &str, relations: &[(&str, &str)]) -> Page {
    let builds = [download_path(name)];
    let builds: Vec<&str> = builds.iter().map(String::as_str).collect();
    render_package(name, relations, &builds)
}

pub fn package_page_with_builds(name: &str, builds: &[&str]) -> Page {
    render_package(name, &[], builds)
}

fn render_package(name: &str, relations: &[(&str, &str)], builds: &[&str]) -> Page {
    let relations: String = relations
        .iter()
        .map(|(kind, dep)| {
            format!(
                r#"<li><dl><dt><span class="nonvisual">{kind}</span> <a href="/{DEFAULT_VERSION}/{dep}">{dep}</a> (&gt;= 1.0)</dt><dd>{dep} library</dd></dl></li>"#
            )
        })
        .collect();

    let builds: String = builds
        .iter()
        .map(|href| {
            let label = href.split('/').nth(2).unwrap_or_default();
            format!(r#"<th><a href="{href}">{label}</a></th>"#)
        })
        .collect();

    let html = format!(
        r#"<html><body><div id="content">
<h2>Package: {name}</h2>
<div id="pdeps"><ul class="uldep">{relations}</ul></div>
<div id="pdownload"><h2>Download {name}</h2>
<table><tr><th>Architecture</th><th>Package Size</th></tr><tr>{builds}</tr></table>
</div></div></body></html>"#
    );

    Page::new(package_url(name), html)
}

// An artifact-resolution page offering `links` as download locations
pub fn download_page(name: &str, links: &[&str]) -> Page {
    let items: String = links
        .iter()
        .map(|href| {
            let label = href.split("//").nth(1).unwrap_or(href);
            format!(r#"<li><a href="{href}">{label}</a></li>"#)
        })
        .collect();

    let html = format!(
        r#"<html><body><div id="content">
<h2>Download Page for {name}</h2>
<div class="cardleft"><ul>{items}</ul></div>
</div></body></html>"#
    );

    Page::new(format!("{DEFAULT_INDEX}{}", download_path(name)), html)
}

// The usual ftp.us.debian.org link for a package
pub fn mirror_link(name: &str) -> String {
    format!("http://{DEFAULT_MIRROR}/pool/main/{}/{name}/{name}_1.0-1_{ARCH}.deb", &name[..1])
}

// Serves pages by URL. Unknown URLs answer 404.
#[derive(Default)]
pub struct FixtureFetcher {
    pages: Mutex<HashMap<String, Page>>,
    fetches: AtomicUsize,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, page: Page) {
        use crate::page::Select;
        self.pages.lock().unwrap().insert(page.url().to_string(), page);
    }

    // Registers a package page and its download page in one go
    pub fn add_package(&self, name: &str, deps: &[&str], links: &[&str]) {
        self.insert(package_page(name, deps));
        self.insert(download_page(name, links));
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetch for FixtureFetcher {
    async fn fetch(&self, url: &str) -> Result<Page, Error> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        // Let sibling tasks interleave like they would on a real network
        tokio::task::yield_now().await;

        let page = self.pages.lock().unwrap().get(url).cloned();
        page.ok_or_else(|| Error::Status {
            url: url.to_string(),
            status: reqwest::StatusCode::NOT_FOUND,
        })
    }
}
