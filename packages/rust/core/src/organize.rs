//! Moving identified files into catalog-labeled directories.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use bookscout_shared::{CandidateMatch, IdentificationOutcome};

/// Placeholder used when a catalog page had no author element.
const UNKNOWN_AUTHOR: &str = "UnknownAuthor";

/// Placeholder used when an accepted match somehow carries an empty title.
const UNKNOWN_TITLE: &str = "UnknownTitle";

/// Characters that are illegal or hazardous in target file names.
const ILLEGAL_CHARS: &[char] = &['/', '*', '?', ':', '"', '<', '>', '|'];

/// Make a name filesystem-safe: strip illegal characters, trim, and
/// replace spaces with underscores. Unicode letters are kept as-is.
pub fn safe_component(name: &str) -> String {
    name.chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .replace(' ', "_")
}

/// Compute the destination path for an accepted match:
/// `{root}/found_on_{catalog}/{author}_{title}{ext}`.
pub fn target_path(candidate: &CandidateMatch, extension: &str, output_root: &Path) -> PathBuf {
    let author = if candidate.author.is_empty() {
        UNKNOWN_AUTHOR
    } else {
        &candidate.author
    };
    let title = if candidate.title.is_empty() {
        UNKNOWN_TITLE
    } else {
        &candidate.title
    };

    let file_name = format!(
        "{}_{}{extension}",
        safe_component(author),
        safe_component(title)
    );

    output_root
        .join(format!("found_on_{}", candidate.catalog))
        .join(file_name)
}

/// Move a matched file into its catalog directory.
///
/// Unmatched outcomes are left untouched. Any failure (directory creation,
/// rename across devices, permissions) is logged and yields `None` — a
/// match that could not be relocated is still a match. An existing file at
/// the destination is silently overwritten, so a batch must not be re-run
/// against an already-organized directory.
pub fn organize(outcome: &IdentificationOutcome, output_root: &Path) -> Option<PathBuf> {
    let candidate = outcome.candidate.as_ref()?;
    let dest = target_path(candidate, &outcome.source.extension, output_root);

    let dir = dest.parent()?;
    if let Err(e) = std::fs::create_dir_all(dir) {
        warn!(dir = %dir.display(), error = %e, "failed to create catalog directory");
        return None;
    }

    if let Err(e) = std::fs::rename(&outcome.source.path, &dest) {
        warn!(
            from = %outcome.source.path.display(),
            to = %dest.display(),
            error = %e,
            "failed to move file"
        );
        return None;
    }

    info!(
        file = %outcome.source.file_name,
        to = %dest.display(),
        "moved"
    );
    Some(dest)
}
