// src/page/mod.rs
// =============================================================================
// This module is everything we know about the index service's HTML pages.
//
// Submodules:
// - fetch: Downloads a page (real HTTP, with retries)
// - extract: Pulls package names, dependencies and links out of a page
//
// The resolver never touches scraper directly. It only sees the `Select`
// capability: "give me the elements matching this CSS selector, with their
// text, attributes and next sibling". Anything that can answer that can
// stand in for a real page.
//
// Rust concepts:
// - Traits: `Select` and `Fetch` are the seams between our logic and the outside world
// - Arc<str>: A shared, immutable string that is cheap to clone across tasks
// =============================================================================

mod extract;
mod fetch;

pub use extract::{artifact_link, dependencies, mirror_candidates, package_name};
pub use fetch::{Fetch, HttpFetcher};

use crate::error::Error;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::sync::Arc;

// One matched element, copied out of the parsed document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Field {
    pub text: String,
    pub attrs: BTreeMap<String, String>,
    /// The next sibling *element* (text nodes are skipped)
    pub next_sibling: Option<Box<Field>>,
}

impl Field {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    fn from_element(element: ElementRef<'_>, with_sibling: bool) -> Self {
        let next_sibling = if with_sibling {
            element
                .next_siblings()
                .find_map(ElementRef::wrap)
                .map(|sibling| Box::new(Field::from_element(sibling, false)))
        } else {
            None
        };

        Field {
            text: element.text().collect(),
            attrs: element
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            next_sibling,
        }
    }
}

// "Given a document and a structural selector, return matching fields."
pub trait Select {
    /// Where the document came from (used in error messages)
    fn url(&self) -> &str;

    fn select(&self, selector: &str) -> Result<Vec<Field>, Error>;
}

// A fetched page.
//
// We keep the HTML source rather than the parsed tree: scraper's `Html` can't
// be sent between threads, and a page has to travel into spawned tasks.
// Each `select` parses the source it owns, so no two tasks ever share
// (or mutate) a parsed tree.
#[derive(Debug, Clone)]
pub struct Page {
    url: String,
    source: Arc<str>,
}

impl Page {
    pub fn new(url: impl Into<String>, source: impl Into<Arc<str>>) -> Self {
        Self {
            url: url.into(),
            source: source.into(),
        }
    }
}

impl Select for Page {
    fn url(&self) -> &str {
        &self.url
    }

    fn select(&self, selector: &str) -> Result<Vec<Field>, Error> {
        // Our selectors are constants, so a parse failure means a typo on our side.
        // Reported as a shape mismatch rather than a panic.
        let parsed = Selector::parse(selector).map_err(|_| Error::Extraction {
            what: "valid selector",
            url: self.url.clone(),
        })?;

        let document = Html::parse_document(&self.source);
        Ok(document
            .select(&parsed)
            .map(|element| Field::from_element(element, true))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_text_attrs_and_sibling() {
        let page = Page::new(
            "https://packages.debian.org/bookworm/x",
            r#"<dl><dt><span class="nonvisual">dep:</span> <a href="/bookworm/libc6">libc6</a> (&gt;= 2.34)</dt></dl>"#,
        );

        let spans = page.select("dt span").unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "dep:");
        assert_eq!(spans[0].attr("class"), Some("nonvisual"));

        let sibling = spans[0].next_sibling.as_ref().unwrap();
        assert_eq!(sibling.text, "libc6");
        assert_eq!(sibling.attr("href"), Some("/bookworm/libc6"));
    }

    #[test]
    fn test_select_no_matches() {
        let page = Page::new("https://packages.debian.org/x", "<p>nothing here</p>");
        assert!(page.select("#pdownload h2").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        let page = Page::new("https://packages.debian.org/x", "<p></p>");
        assert!(page.select("<<<").is_err());
    }
}
