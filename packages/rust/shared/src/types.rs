//! Core domain types for the book identification pipeline.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SourceFile
// ---------------------------------------------------------------------------

/// A single unidentified ebook file enumerated from the input directory.
///
/// Immutable for the run; identity is the original path. Each file is
/// consumed by exactly one identification task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Original path on disk.
    pub path: PathBuf,
    /// File name component (e.g. `My_Book_(2020).pdf`).
    pub file_name: String,
    /// Extension including the leading dot (e.g. `.pdf`), or empty.
    pub extension: String,
}

impl SourceFile {
    /// Build a `SourceFile` from a path. Returns `None` when the path has
    /// no usable file name component.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let file_name = path.file_name()?.to_str()?.to_string();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();

        Some(Self {
            path,
            file_name,
            extension,
        })
    }
}

// ---------------------------------------------------------------------------
// BookDetails / CandidateMatch
// ---------------------------------------------------------------------------

/// Title/author pair extracted from a catalog product page.
///
/// The author may be empty when the page has no recognizable author element;
/// the title is never empty (extraction without a title is treated as a miss).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDetails {
    pub title: String,
    pub author: String,
}

/// An accepted match from one catalog. At most one survives per source file
/// (the first accepted one, scanning catalogs in priority order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateMatch {
    /// Catalog name (unique key, e.g. `evrit`).
    pub catalog: String,
    /// The matched product page URL.
    pub url: String,
    /// Catalog-native identifier, when the catalog's id pattern matched.
    #[serde(default)]
    pub id: Option<String>,
    /// Extracted title.
    pub title: String,
    /// Extracted author (may be empty).
    pub author: String,
}

// ---------------------------------------------------------------------------
// IdentificationOutcome
// ---------------------------------------------------------------------------

/// Per-file result of the identification pipeline.
///
/// `candidate` is `None` iff no catalog produced an accepted fuzzy match;
/// it is never partially populated.
#[derive(Debug, Clone)]
pub struct IdentificationOutcome {
    pub source: SourceFile,
    pub candidate: Option<CandidateMatch>,
}

impl IdentificationOutcome {
    /// A "no match" outcome for the given file.
    pub fn unmatched(source: SourceFile) -> Self {
        Self {
            source,
            candidate: None,
        }
    }
}

// ---------------------------------------------------------------------------
// OrganizedResult
// ---------------------------------------------------------------------------

/// One record per source file in the batch report, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizedResult {
    /// Original file name.
    pub file: String,
    /// Path the file was moved to, or `null` when it was left in place.
    pub new_path: Option<String>,
    /// Whether a catalog match was accepted (independent of the move).
    pub found: bool,
    /// Full match metadata, or `null` when no catalog matched.
    pub metadata: Option<CandidateMatch>,
    /// When this file's organization step completed (ISO-8601).
    pub timestamp: DateTime<Utc>,
}

impl OrganizedResult {
    /// Build a record from an outcome and the organizer's move result.
    pub fn new(outcome: &IdentificationOutcome, new_path: Option<&Path>) -> Self {
        Self {
            file: outcome.source.file_name.clone(),
            new_path: new_path.map(|p| p.to_string_lossy().into_owned()),
            found: outcome.candidate.is_some(),
            metadata: outcome.candidate.clone(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_file_from_path() {
        let f = SourceFile::from_path("/books/My_Book_(2020).pdf").expect("source file");
        assert_eq!(f.file_name, "My_Book_(2020).pdf");
        assert_eq!(f.extension, ".pdf");
    }

    #[test]
    fn source_file_without_extension() {
        let f = SourceFile::from_path("/books/README").expect("source file");
        assert_eq!(f.file_name, "README");
        assert_eq!(f.extension, "");
    }

    #[test]
    fn organized_result_serialization() {
        let source = SourceFile::from_path("/books/some_book.epub").unwrap();
        let outcome = IdentificationOutcome {
            source,
            candidate: Some(CandidateMatch {
                catalog: "evrit".into(),
                url: "https://www.e-vrit.co.il/Product/123/x".into(),
                id: Some("123".into()),
                title: "ספר כלשהו".into(),
                author: "מחברת".into(),
            }),
        };

        let record = OrganizedResult::new(&outcome, Some(Path::new("/books/found_on_evrit/x.epub")));
        let json = serde_json::to_string(&record).expect("serialize");

        // Non-ASCII must be preserved literally, not escaped.
        assert!(json.contains("ספר כלשהו"));
        assert!(json.contains(r#""found":true"#));

        let parsed: OrganizedResult = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.file, "some_book.epub");
        assert_eq!(parsed.metadata.unwrap().id.as_deref(), Some("123"));
    }

    #[test]
    fn unmatched_outcome_yields_null_fields() {
        let source = SourceFile::from_path("/books/unknown.mobi").unwrap();
        let record = OrganizedResult::new(&IdentificationOutcome::unmatched(source), None);
        let json = serde_json::to_string(&record).expect("serialize");

        assert!(json.contains(r#""found":false"#));
        assert!(json.contains(r#""new_path":null"#));
        assert!(json.contains(r#""metadata":null"#));
    }
}
