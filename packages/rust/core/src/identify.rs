//! Catalog search orchestration: resolve a query to at most one match.

use scraper::Html;
use tracing::{debug, info, instrument, warn};
use url::Url;

use bookscout_catalogs::{
    CatalogAdapter, CatalogRegistry, PageFetcher, SearchProvider, url_in_domain,
};
use bookscout_shared::{BookDetails, CandidateMatch, Result, RunConfig};

use crate::matcher::FuzzyMatcher;
use crate::query::Query;

/// Resolves queries against catalogs in priority order, stopping at the
/// first accepted match.
pub struct Identifier<S> {
    registry: CatalogRegistry,
    fetcher: PageFetcher,
    search: S,
    matcher: FuzzyMatcher,
    max_results: usize,
}

impl<S: SearchProvider> Identifier<S> {
    /// Create an identifier with the built-in catalog registry.
    pub fn new(config: &RunConfig, search: S) -> Result<Self> {
        Ok(Self {
            registry: CatalogRegistry::new(),
            fetcher: PageFetcher::new(config.fetch_timeout_secs)?,
            search,
            matcher: FuzzyMatcher::new(config.fuzzy_threshold),
            max_results: config.max_results,
        })
    }

    /// Replace the catalog registry (tests, alternate catalog sets).
    pub fn with_registry(mut self, registry: CatalogRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Try catalogs in priority order; return the first accepted match.
    ///
    /// Absence of a match is an expected outcome, not an error. Errors from
    /// one catalog (search transport, fetch, extraction) are logged and
    /// isolated — the next catalog still gets its turn.
    #[instrument(skip_all, fields(query = %query.search_text()))]
    pub async fn identify(&self, query: &Query) -> Option<CandidateMatch> {
        for catalog in self.registry.iter() {
            debug!(catalog = catalog.name(), "trying catalog");

            match self.search_catalog(query, catalog).await {
                Ok(Some(candidate)) => {
                    info!(
                        catalog = %candidate.catalog,
                        title = %candidate.title,
                        id = candidate.id.as_deref().unwrap_or("-"),
                        "match accepted"
                    );
                    return Some(candidate);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(catalog = catalog.name(), error = %e, "catalog search failed");
                }
            }
        }

        None
    }

    /// Search one catalog: domain-scoped search, then fetch/extract/score
    /// each returned URL in provider order until one is accepted.
    async fn search_catalog(
        &self,
        query: &Query,
        catalog: &dyn CatalogAdapter,
    ) -> Result<Option<CandidateMatch>> {
        let expr = format!("site:{} {}", catalog.domain(), query.search_text());
        let urls = self.search.search(&expr, self.max_results).await?;

        for url in urls {
            if !url_in_domain(&url, catalog.domain()) {
                debug!(%url, catalog = catalog.name(), "result outside catalog domain, skipping");
                continue;
            }

            let body = match self.fetcher.fetch(&url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(%url, error = %e, "page fetch failed, skipping result");
                    continue;
                }
            };

            let Some(details) = extract_details(catalog, &body) else {
                debug!(%url, "no extractable title on page, skipping result");
                continue;
            };

            if self.matcher.accepts(query.search_text(), &details.title) {
                return Ok(Some(self.build_candidate(catalog, &url, query, details)));
            }
        }

        Ok(None)
    }

    fn build_candidate(
        &self,
        catalog: &dyn CatalogAdapter,
        url: &Url,
        query: &Query,
        details: BookDetails,
    ) -> CandidateMatch {
        // A hinted author only fills the gap when the catalog page had none.
        let author = if details.author.is_empty() {
            query.hint_author().unwrap_or_default().to_string()
        } else {
            details.author
        };

        CandidateMatch {
            catalog: catalog.name().to_string(),
            url: url.to_string(),
            id: catalog.book_id(url),
            title: details.title,
            author,
        }
    }
}

/// Parse and extract in one scope so the non-Send DOM never crosses an await.
fn extract_details(catalog: &dyn CatalogAdapter, body: &str) -> Option<BookDetails> {
    let doc = Html::parse_document(body);
    catalog.extract(&doc)
}
