//! BookScout core: the book identification pipeline.
//!
//! Filename normalization, fuzzy matching, catalog fallback search,
//! bounded-concurrency batch orchestration, file organization, and the
//! batch result report. External I/O (web search, page fetching, catalog
//! extraction, LLM hints) lives behind the adapter traits in
//! `bookscout-catalogs` and `bookscout-hint`.

pub mod identify;
pub mod matcher;
pub mod organize;
pub mod pipeline;
pub mod query;
pub mod report;

pub use identify::Identifier;
pub use matcher::{FuzzyMatcher, token_set_ratio};
pub use pipeline::{BatchSummary, ProgressReporter, SilentProgress, run_batch};
pub use query::{Query, clean_filename};
pub use report::{REPORT_FILE_NAME, ResultRecorder};
