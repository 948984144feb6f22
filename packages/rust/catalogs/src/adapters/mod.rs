//! Catalog adapter trait and built-in catalog implementations.
//!
//! Each adapter knows one external book catalog: the domain that scopes
//! web searches to it, the URL pattern carrying its native book id, and
//! the selectors that locate title/author on a product page. Adding a
//! catalog means adding one implementation plus one registry entry.

mod evrit;
mod simania;
mod steimatzky;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use bookscout_shared::BookDetails;

pub use evrit::EvritAdapter;
pub use simania::SimaniaAdapter;
pub use steimatzky::SteimatzkyAdapter;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Extraction capability for one external book catalog.
pub trait CatalogAdapter: Send + Sync {
    /// Catalog name (unique key, used in `found_on_<name>` directories).
    fn name(&self) -> &'static str;

    /// Domain that scopes web searches to this catalog.
    fn domain(&self) -> &'static str;

    /// Extract the catalog-native book id from a matched URL.
    /// `None` when the URL does not carry one; this never disqualifies a match.
    fn book_id(&self, url: &Url) -> Option<String>;

    /// Extract title/author from a fetched product page.
    /// `None` when no non-empty title can be found.
    fn extract(&self, doc: &Html) -> Option<BookDetails>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds catalog adapters in fallback priority order. The order is static
/// configuration and must be stable across runs.
pub struct CatalogRegistry {
    adapters: Vec<Box<dyn CatalogAdapter>>,
}

impl CatalogRegistry {
    /// Create a registry with all built-in catalogs in fallback priority order.
    pub fn new() -> Self {
        Self::from_adapters(vec![
            Box::new(EvritAdapter),
            Box::new(SteimatzkyAdapter),
            Box::new(SimaniaAdapter),
        ])
    }

    /// Create a registry with a custom adapter set (tests, alternate deployments).
    pub fn from_adapters(adapters: Vec<Box<dyn CatalogAdapter>>) -> Self {
        Self { adapters }
    }

    /// Iterate adapters in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn CatalogAdapter> {
        self.adapters.iter().map(|a| a.as_ref())
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl Default for CatalogRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Whether a URL's host belongs to the given catalog domain (exact host or
/// a subdomain of it). Filters provider noise before any fetch happens.
pub fn url_in_domain(url: &Url, domain: &str) -> bool {
    match url.host_str() {
        Some(host) => host == domain || host.ends_with(&format!(".{domain}")),
        None => false,
    }
}

/// First regex capture group applied to the full URL string.
pub(crate) fn capture_id(pattern: &Regex, url: &Url) -> Option<String> {
    pattern
        .captures(url.as_str())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Trimmed text of the first element matching `selector`, or `None` when
/// the element is missing or empty.
pub(crate) fn select_text(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).unwrap();
    let text = doc
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())?;

    if text.is_empty() { None } else { Some(text) }
}

/// Build `BookDetails` from a title selector and an author selector.
/// A missing author degrades to an empty string; a missing title is a miss.
pub(crate) fn extract_fields(
    doc: &Html,
    title_selector: &str,
    author_selector: &str,
) -> Option<BookDetails> {
    let title = select_text(doc, title_selector)?;
    let author = select_text(doc, author_selector).unwrap_or_default();

    Some(BookDetails { title, author })
}
