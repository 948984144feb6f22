//! Batch driver: bounded-concurrency identification over a directory of
//! ebook files, followed by the sequential organize/record phase.
//!
//! One task per input file runs under a semaphore bound of `workers`.
//! Join handles are awaited in spawn order, so collected outcomes always
//! land in input enumeration order no matter which task finishes first.
//! Organization and report writing run single-threaded afterwards.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use bookscout_catalogs::SearchProvider;
use bookscout_hint::HintProvider;
use bookscout_shared::{
    BookScoutError, IdentificationOutcome, OrganizedResult, Result, RunConfig, SourceFile,
};

use crate::identify::Identifier;
use crate::organize::organize;
use crate::query::Query;
use crate::report::ResultRecorder;

// ---------------------------------------------------------------------------
// BatchSummary / ProgressReporter
// ---------------------------------------------------------------------------

/// Summary of a completed batch run.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    /// Number of files enumerated from the input directory.
    pub scanned: usize,
    /// Files with an accepted catalog match.
    pub matched: usize,
    /// Files actually relocated (a match can fail to move).
    pub moved: usize,
    /// Path of the written report, when any file was scanned.
    pub report_path: Option<std::path::PathBuf>,
    /// Total duration of the run.
    pub elapsed: Duration,
}

/// Progress callback for reporting batch status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called as each file's identification completes (in input order).
    fn file_identified(&self, file: &str, current: usize, total: usize, found: bool);
    /// Called when the batch completes.
    fn done(&self, summary: &BatchSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn file_identified(&self, _file: &str, _current: usize, _total: usize, _found: bool) {}
    fn done(&self, _summary: &BatchSummary) {}
}

// ---------------------------------------------------------------------------
// File enumeration
// ---------------------------------------------------------------------------

/// Enumerate candidate files: non-hidden regular files directly inside
/// `dir`, sorted by file name so enumeration order (and therefore report
/// order) is deterministic. Subdirectories are not traversed.
pub fn enumerate_files(dir: &Path) -> Result<Vec<SourceFile>> {
    let entries = std::fs::read_dir(dir).map_err(|e| BookScoutError::io(dir, e))?;

    let mut files: Vec<SourceFile> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BookScoutError::io(dir, e))?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(source) = SourceFile::from_path(&path) else {
            continue;
        };
        if source.file_name.starts_with('.') {
            continue;
        }

        files.push(source);
    }

    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(files)
}

// ---------------------------------------------------------------------------
// Batch run
// ---------------------------------------------------------------------------

/// Run the full identification batch over `config.input_dir`.
///
/// Every enumerated file yields exactly one report record; no per-file
/// failure (adapter errors, hint failures, task panics) terminates the
/// batch. Only an invalid configuration or an unreadable input directory
/// is fatal, and only before any work begins.
#[instrument(skip_all, fields(input = %config.input_dir.display()))]
pub async fn run_batch<S, H>(
    config: &RunConfig,
    identifier: Identifier<S>,
    hints: Option<H>,
    progress: &dyn ProgressReporter,
) -> Result<BatchSummary>
where
    S: SearchProvider + 'static,
    H: HintProvider + 'static,
{
    let start = Instant::now();
    config.validate()?;

    progress.phase("Scanning input directory");
    let files = enumerate_files(&config.input_dir)?;

    if files.is_empty() {
        warn!(dir = %config.input_dir.display(), "no files found in input directory");
        let summary = BatchSummary {
            scanned: 0,
            matched: 0,
            moved: 0,
            report_path: None,
            elapsed: start.elapsed(),
        };
        progress.done(&summary);
        return Ok(summary);
    }

    info!(
        files = files.len(),
        workers = config.workers,
        hints = hints.is_some(),
        "starting identification batch"
    );

    // --- Phase 1: concurrent identification ---
    progress.phase("Identifying books");

    let identifier = Arc::new(identifier);
    let hints = hints.map(Arc::new);
    let semaphore = Arc::new(Semaphore::new(config.workers));

    let mut handles = Vec::with_capacity(files.len());
    for file in &files {
        let identifier = identifier.clone();
        let hints = hints.clone();
        let semaphore = semaphore.clone();
        let file = file.clone();

        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire().await.expect("semaphore closed");
            identify_file(&identifier, hints.as_deref(), file).await
        }));
    }

    // Awaiting in spawn order keeps outcomes in input order regardless of
    // completion order.
    let total = handles.len();
    let mut outcomes: Vec<IdentificationOutcome> = Vec::with_capacity(total);
    for (idx, handle) in handles.into_iter().enumerate() {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(file = %files[idx].file_name, error = %e, "identification task failed");
                IdentificationOutcome::unmatched(files[idx].clone())
            }
        };

        progress.file_identified(
            &outcome.source.file_name,
            idx + 1,
            total,
            outcome.candidate.is_some(),
        );
        outcomes.push(outcome);
    }

    // --- Phase 2: sequential organize + record ---
    progress.phase("Organizing files");

    let mut recorder = ResultRecorder::new();
    let mut matched = 0;
    let mut moved = 0;

    for outcome in &outcomes {
        if outcome.candidate.is_some() {
            matched += 1;
        }

        let new_path = organize(outcome, &config.output_root);
        if new_path.is_some() {
            moved += 1;
        }

        recorder.record(OrganizedResult::new(outcome, new_path.as_deref()));
    }

    progress.phase("Writing report");
    let report_path = recorder.write(&config.input_dir)?;

    let summary = BatchSummary {
        scanned: files.len(),
        matched,
        moved,
        report_path: Some(report_path),
        elapsed: start.elapsed(),
    };

    info!(
        scanned = summary.scanned,
        matched = summary.matched,
        moved = summary.moved,
        elapsed_ms = summary.elapsed.as_millis(),
        "batch complete"
    );

    progress.done(&summary);
    Ok(summary)
}

/// Identify one file: derive the query (hint first, normalizer fallback),
/// then run the catalog search. Never fails — a broken pipeline degrades
/// to a "no match" outcome for this file only.
async fn identify_file<S, H>(
    identifier: &Identifier<S>,
    hints: Option<&H>,
    file: SourceFile,
) -> IdentificationOutcome
where
    S: SearchProvider,
    H: HintProvider,
{
    let hint = match hints {
        Some(provider) => provider.infer(&file.file_name).await,
        None => None,
    };
    let query = Query::with_hint(&file.file_name, hint);

    info!(file = %file.file_name, query = %query.search_text(), "processing");

    let candidate = identifier.identify(&query).await;
    if candidate.is_none() {
        warn!(file = %file.file_name, "no match found");
    }

    IdentificationOutcome {
        source: file,
        candidate,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use scraper::{Html, Selector};
    use url::Url;

    use bookscout_catalogs::{CatalogAdapter, CatalogRegistry};
    use bookscout_shared::{AppConfig, BookDetails};

    use super::*;
    use crate::report::REPORT_FILE_NAME;

    /// Test catalog pointing at a wiremock server (domain = loopback host).
    struct LoopbackCatalog;

    impl CatalogAdapter for LoopbackCatalog {
        fn name(&self) -> &'static str {
            "testcat"
        }

        fn domain(&self) -> &'static str {
            "127.0.0.1"
        }

        fn book_id(&self, url: &Url) -> Option<String> {
            url.path()
                .strip_prefix("/Product/")
                .and_then(|rest| rest.split('/').next())
                .map(str::to_string)
        }

        fn extract(&self, doc: &Html) -> Option<BookDetails> {
            let title_sel = Selector::parse("h1").unwrap();
            let author_sel = Selector::parse("a.author-link").unwrap();

            let title = doc
                .select(&title_sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|t| !t.is_empty())?;
            let author = doc
                .select(&author_sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .unwrap_or_default();

            Some(BookDetails { title, author })
        }
    }

    /// Search stub with canned per-query URLs and optional artificial
    /// latency, for exercising out-of-order task completion.
    #[derive(Clone, Default)]
    struct StubSearch {
        /// Keyed by a substring of the search expression.
        results: HashMap<String, Vec<Url>>,
        delays_ms: HashMap<String, u64>,
    }

    impl bookscout_catalogs::SearchProvider for StubSearch {
        async fn search(&self, expr: &str, max_results: usize) -> bookscout_shared::Result<Vec<Url>> {
            for (key, delay) in &self.delays_ms {
                if expr.contains(key.as_str()) {
                    tokio::time::sleep(Duration::from_millis(*delay)).await;
                }
            }

            for (key, urls) in &self.results {
                if expr.contains(key.as_str()) {
                    return Ok(urls.iter().take(max_results).cloned().collect());
                }
            }
            Ok(vec![])
        }
    }

    fn test_run_config(input_dir: &Path) -> RunConfig {
        let mut config = RunConfig::from_app_config(&AppConfig::default(), input_dir);
        config.workers = 2;
        config
    }

    fn temp_input_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("bookscout-pipe-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn loopback_identifier(config: &RunConfig, search: StubSearch) -> Identifier<StubSearch> {
        Identifier::new(config, search)
            .unwrap()
            .with_registry(CatalogRegistry::from_adapters(vec![Box::new(
                LoopbackCatalog,
            )]))
    }

    #[test]
    fn enumerate_skips_hidden_and_dirs_and_sorts() {
        let dir = temp_input_dir();
        std::fs::write(dir.join("b.pdf"), b"x").unwrap();
        std::fs::write(dir.join("a.epub"), b"x").unwrap();
        std::fs::write(dir.join(".hidden"), b"x").unwrap();
        std::fs::create_dir(dir.join("subdir")).unwrap();
        std::fs::write(dir.join("subdir").join("nested.pdf"), b"x").unwrap();

        let files = enumerate_files(&dir).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.epub", "b.pdf"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn empty_directory_short_circuits_without_report() {
        let dir = temp_input_dir();
        let config = test_run_config(&dir);
        let identifier = loopback_identifier(&config, StubSearch::default());

        let summary = run_batch(
            &config,
            identifier,
            None::<bookscout_hint::OllamaHintProvider>,
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(summary.scanned, 0);
        assert!(summary.report_path.is_none());
        assert!(!dir.join(REPORT_FILE_NAME).exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn missing_input_directory_is_fatal() {
        let dir = temp_input_dir();
        let mut config = test_run_config(&dir);
        config.input_dir = dir.join("nope");
        let identifier = loopback_identifier(&config, StubSearch::default());

        let err = run_batch(
            &config,
            identifier,
            None::<bookscout_hint::OllamaHintProvider>,
            &SilentProgress,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("does not exist"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn end_to_end_match_moves_file_and_writes_report() {
        let server = wiremock::MockServer::start().await;
        let body = r#"<html><body><h1>My Book</h1><a class="author-link">A. Author</a></body></html>"#;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/Product/42/my-book"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let dir = temp_input_dir();
        std::fs::write(dir.join("My_Book_(2020).pdf"), b"book bytes").unwrap();

        let config = test_run_config(&dir);
        let search = StubSearch {
            results: HashMap::from([(
                "My Book".to_string(),
                vec![Url::parse(&format!("{}/Product/42/my-book", server.uri())).unwrap()],
            )]),
            delays_ms: HashMap::new(),
        };
        let identifier = loopback_identifier(&config, search);

        let summary = run_batch(
            &config,
            identifier,
            None::<bookscout_hint::OllamaHintProvider>,
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(summary.scanned, 1);
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.moved, 1);

        let moved_to = dir.join("found_on_testcat").join("A._Author_My_Book.pdf");
        assert!(moved_to.exists());
        assert!(!dir.join("My_Book_(2020).pdf").exists());

        let report = std::fs::read_to_string(summary.report_path.unwrap()).unwrap();
        let records: Vec<OrganizedResult> = serde_json::from_str(&report).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].found);
        assert_eq!(records[0].file, "My_Book_(2020).pdf");
        assert_eq!(
            records[0].new_path.as_deref(),
            Some(moved_to.to_string_lossy().as_ref())
        );
        let meta = records[0].metadata.as_ref().unwrap();
        assert_eq!(meta.catalog, "testcat");
        assert_eq!(meta.id.as_deref(), Some("42"));
        assert_eq!(meta.author, "A. Author");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn no_match_leaves_file_and_records_nulls() {
        let dir = temp_input_dir();
        std::fs::write(dir.join("Obscure_Title.epub"), b"x").unwrap();

        let config = test_run_config(&dir);
        let identifier = loopback_identifier(&config, StubSearch::default());

        let summary = run_batch(
            &config,
            identifier,
            None::<bookscout_hint::OllamaHintProvider>,
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(summary.matched, 0);
        assert_eq!(summary.moved, 0);
        assert!(dir.join("Obscure_Title.epub").exists());

        let report = std::fs::read_to_string(dir.join(REPORT_FILE_NAME)).unwrap();
        let records: Vec<OrganizedResult> = serde_json::from_str(&report).unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].found);
        assert!(records[0].new_path.is_none());
        assert!(records[0].metadata.is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn report_order_matches_input_order_despite_reordered_completion() {
        let dir = temp_input_dir();
        let names = ["aa.pdf", "bb.pdf", "cc.pdf", "dd.pdf", "ee.pdf"];
        for name in names {
            std::fs::write(dir.join(name), b"x").unwrap();
        }

        // Earlier files stall longest, so completion order is reversed
        // relative to input order.
        let delays_ms = HashMap::from([
            ("aa".to_string(), 120u64),
            ("bb".to_string(), 90),
            ("cc".to_string(), 60),
            ("dd".to_string(), 30),
            ("ee".to_string(), 0),
        ]);
        let search = StubSearch {
            results: HashMap::new(),
            delays_ms,
        };

        let config = test_run_config(&dir);
        let identifier = loopback_identifier(&config, search);

        let summary = run_batch(
            &config,
            identifier,
            None::<bookscout_hint::OllamaHintProvider>,
            &SilentProgress,
        )
        .await
        .unwrap();
        assert_eq!(summary.scanned, 5);

        let report = std::fs::read_to_string(dir.join(REPORT_FILE_NAME)).unwrap();
        let records: Vec<OrganizedResult> = serde_json::from_str(&report).unwrap();
        let recorded: Vec<&str> = records.iter().map(|r| r.file.as_str()).collect();
        assert_eq!(recorded, names);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn batch_size_invariant_holds_for_mixed_outcomes() {
        let server = wiremock::MockServer::start().await;
        let body = r#"<html><body><h1>bb</h1></body></html>"#;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/Product/1/bb"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let dir = temp_input_dir();
        for name in ["aa.pdf", "bb.pdf", "cc.pdf"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }

        let search = StubSearch {
            results: HashMap::from([(
                "bb".to_string(),
                vec![Url::parse(&format!("{}/Product/1/bb", server.uri())).unwrap()],
            )]),
            delays_ms: HashMap::new(),
        };

        let config = test_run_config(&dir);
        let identifier = loopback_identifier(&config, search);

        let summary = run_batch(
            &config,
            identifier,
            None::<bookscout_hint::OllamaHintProvider>,
            &SilentProgress,
        )
        .await
        .unwrap();

        assert_eq!(summary.scanned, 3);
        assert_eq!(summary.matched, 1);

        let report = std::fs::read_to_string(dir.join(REPORT_FILE_NAME)).unwrap();
        let records: Vec<OrganizedResult> = serde_json::from_str(&report).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records.iter().filter(|r| r.found).count(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
