//! Catalog-facing I/O adapters: web search, page fetching, and per-catalog
//! field extraction.
//!
//! Everything here sits at the boundary with external book catalogs. The
//! decision logic (which URL to accept, when to stop) lives in
//! `bookscout-core`; this crate only knows how to talk to the outside world.

pub mod adapters;

use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use bookscout_shared::{BookScoutError, Result};

pub use adapters::{CatalogAdapter, CatalogRegistry, url_in_domain};

/// User-Agent string for outbound requests. Catalog sites are picky about
/// obviously non-browser agents, so advertise Mozilla compatibility.
const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; BookScout/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Maximum number of redirects to follow on any fetch.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// PageFetcher
// ---------------------------------------------------------------------------

/// HTTP fetcher for catalog product pages.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Create a fetcher with the given per-request timeout.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| BookScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch a page body as text. Non-2xx statuses are errors.
    pub async fn fetch(&self, url: &Url) -> Result<String> {
        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| BookScoutError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BookScoutError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| BookScoutError::Network(format!("{url}: body read failed: {e}")))
    }
}

// ---------------------------------------------------------------------------
// SearchProvider
// ---------------------------------------------------------------------------

/// External web search collaborator.
///
/// Implementations return up to `max_results` URLs in the provider's own
/// relevance order; the caller treats that order as authoritative only up
/// to domain filtering.
pub trait SearchProvider: Send + Sync {
    /// Run a search expression and collect result URLs.
    fn search(
        &self,
        expr: &str,
        max_results: usize,
    ) -> impl Future<Output = Result<Vec<Url>>> + Send;
}

/// Search provider backed by scraping a Google results page, the same way
/// throwaway search libraries do it: request `/search?q=...` and collect
/// the `/url?q=` redirect targets.
#[derive(Debug, Clone)]
pub struct GoogleSearchProvider {
    client: Client,
    base_url: String,
}

impl GoogleSearchProvider {
    /// Create a provider against the public Google endpoint.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        Self::with_base_url("https://www.google.com/search", timeout_secs)
    }

    /// Create a provider against a custom results endpoint (tests, mirrors).
    pub fn with_base_url(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| BookScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

impl SearchProvider for GoogleSearchProvider {
    async fn search(&self, expr: &str, max_results: usize) -> Result<Vec<Url>> {
        let request_url = Url::parse_with_params(
            &self.base_url,
            &[("q", expr), ("num", &max_results.to_string())],
        )
        .map_err(|e| BookScoutError::validation(format!("bad search URL: {e}")))?;

        debug!(%request_url, "running web search");

        let response = self
            .client
            .get(request_url.as_str())
            .send()
            .await
            .map_err(|e| BookScoutError::Network(format!("search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BookScoutError::Network(format!(
                "search returned HTTP {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BookScoutError::Network(format!("search body read failed: {e}")))?;

        Ok(parse_result_links(&body, max_results))
    }
}

/// Pull outbound result links from a search results page, deduplicated and
/// bounded at `max_results`.
fn parse_result_links(body: &str, max_results: usize) -> Vec<Url> {
    let doc = Html::parse_document(body);
    let link_sel = Selector::parse("a[href]").unwrap();

    let mut links: Vec<Url> = Vec::new();

    for el in doc.select(&link_sel) {
        let Some(href) = el.value().attr("href") else {
            continue;
        };

        let target = if let Some(rest) = href.strip_prefix("/url?") {
            // Classic results markup wraps targets in a /url?q=<target> redirect.
            rest.split('&')
                .find_map(|pair| pair.strip_prefix("q="))
                .and_then(|q| percent_decode(q))
        } else if href.starts_with("http://") || href.starts_with("https://") {
            Some(href.to_string())
        } else {
            None
        };

        let Some(target) = target else { continue };
        let Ok(url) = Url::parse(&target) else {
            continue;
        };

        // Skip the search engine's own navigation links.
        if url
            .host_str()
            .is_some_and(|h| h.contains("google.") || h.contains("gstatic."))
        {
            continue;
        }

        if !links.contains(&url) {
            links.push(url);
        }
        if links.len() >= max_results {
            break;
        }
    }

    links
}

/// Minimal percent-decoding for `/url?q=` targets (only `%XX` sequences).
fn percent_decode(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = s.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out).ok()
}
