//! Simania catalog adapter.

use regex::Regex;
use scraper::Html;
use url::Url;

use bookscout_shared::BookDetails;

use super::{CatalogAdapter, capture_id, extract_fields};

/// Extracts book details from simania.co.il book pages.
pub struct SimaniaAdapter;

impl CatalogAdapter for SimaniaAdapter {
    fn name(&self) -> &'static str {
        "simania"
    }

    fn domain(&self) -> &'static str {
        "simania.co.il"
    }

    fn book_id(&self, url: &Url) -> Option<String> {
        let pattern = Regex::new(r"/book/(\d+)").unwrap();
        capture_id(&pattern, url)
    }

    fn extract(&self, doc: &Html) -> Option<BookDetails> {
        // Simania's book pages put the title in the first h2 and the author
        // in the following h3.
        extract_fields(doc, "h2", "h3")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_and_author() {
        let html = r#"<html><body>
            <h2>ספר הדקדוק הפנימי</h2>
            <h3>דויד גרוסמן</h3>
        </body></html>"#;

        let doc = Html::parse_document(html);
        let details = SimaniaAdapter.extract(&doc).expect("details");
        assert_eq!(details.title, "ספר הדקדוק הפנימי");
        assert_eq!(details.author, "דויד גרוסמן");
    }

    #[test]
    fn book_id_from_book_path() {
        let url = Url::parse("https://simania.co.il/book/98765?ref=search").unwrap();
        assert_eq!(SimaniaAdapter.book_id(&url).as_deref(), Some("98765"));
    }
}
