//! Filename-to-query normalization.

use std::path::Path;

use bookscout_hint::QueryHint;

/// Characters treated as junk separators in ebook filenames.
const SEPARATOR_CHARS: &[char] = &['(', ')', '[', ']', '.', '_', '-'];

/// Turn a raw filename into a clean search query string.
///
/// Strips the final extension, replaces `( ) [ ] . _ -` with spaces, and
/// trims. Any other character, including non-ASCII letters, is preserved
/// as-is; internal runs of spaces are tolerated by the fuzzy matcher
/// downstream. The transform is idempotent.
pub fn clean_filename(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);

    stem.chars()
        .map(|c| if SEPARATOR_CHARS.contains(&c) { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// A derived search query for one source file. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct Query {
    /// Mechanically normalized filename text.
    pub text: String,
    /// Optional structured override proposed by the hint provider.
    pub hint: Option<QueryHint>,
}

impl Query {
    /// Build a query from a filename, with no hint.
    pub fn normalized(filename: &str) -> Self {
        Self {
            text: clean_filename(filename),
            hint: None,
        }
    }

    /// Build a query from a filename plus an optional hint.
    pub fn with_hint(filename: &str, hint: Option<QueryHint>) -> Self {
        Self {
            text: clean_filename(filename),
            hint,
        }
    }

    /// The text actually used as the search term: the hint title when one
    /// was proposed, the normalized filename otherwise.
    pub fn search_text(&self) -> &str {
        match &self.hint {
            Some(hint) => &hint.title,
            None => &self.text,
        }
    }

    /// The hinted author, if any. Never used as a search term.
    pub fn hint_author(&self) -> Option<&str> {
        self.hint.as_ref()?.author.as_deref()
    }
}
