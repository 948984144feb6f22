//! Steimatzky catalog adapter.

use regex::Regex;
use scraper::Html;
use url::Url;

use bookscout_shared::BookDetails;

use super::{CatalogAdapter, capture_id, extract_fields};

/// Extracts book details from steimatzky.co.il product pages.
pub struct SteimatzkyAdapter;

impl CatalogAdapter for SteimatzkyAdapter {
    fn name(&self) -> &'static str {
        "steimatzky"
    }

    fn domain(&self) -> &'static str {
        "steimatzky.co.il"
    }

    fn book_id(&self, url: &Url) -> Option<String> {
        // Product URLs end with the numeric id.
        let pattern = Regex::new(r"/(\d+)$").unwrap();
        capture_id(&pattern, url)
    }

    fn extract(&self, doc: &Html) -> Option<BookDetails> {
        extract_fields(doc, r#"span[itemprop="name"]"#, "div.product-author")
    }
}
