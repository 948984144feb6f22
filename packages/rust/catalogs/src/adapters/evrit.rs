//! e-vrit catalog adapter.

use regex::Regex;
use scraper::Html;
use url::Url;

use bookscout_shared::BookDetails;

use super::{CatalogAdapter, capture_id, extract_fields};

/// Extracts book details from e-vrit.co.il product pages.
pub struct EvritAdapter;

impl CatalogAdapter for EvritAdapter {
    fn name(&self) -> &'static str {
        "evrit"
    }

    fn domain(&self) -> &'static str {
        "e-vrit.co.il"
    }

    fn book_id(&self, url: &Url) -> Option<String> {
        let pattern = Regex::new(r"/Product/(\d+)/").unwrap();
        capture_id(&pattern, url)
    }

    fn extract(&self, doc: &Html) -> Option<BookDetails> {
        extract_fields(doc, "h1", "a.author-link")
    }
}
