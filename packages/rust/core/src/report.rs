//! Batch result recording and the `search_results.json` artifact.

use std::path::{Path, PathBuf};

use tracing::info;

use bookscout_shared::{BookScoutError, OrganizedResult, Result};

/// Well-known report file name, written into the input directory root.
pub const REPORT_FILE_NAME: &str = "search_results.json";

/// Accumulates one record per source file, in input order, and persists
/// the whole batch in a single write at the end of the run.
#[derive(Debug, Default)]
pub struct ResultRecorder {
    results: Vec<OrganizedResult>,
}

impl ResultRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next record. Call order defines artifact order.
    pub fn record(&mut self, result: OrganizedResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[OrganizedResult] {
        &self.results
    }

    /// Serialize the full batch as pretty-printed UTF-8 JSON (non-ASCII
    /// preserved literally) and write it into `dir`.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(REPORT_FILE_NAME);
        let json = serde_json::to_string_pretty(&self.results)
            .map_err(|e| BookScoutError::parse(format!("report serialization failed: {e}")))?;

        std::fs::write(&path, json).map_err(|e| BookScoutError::io(&path, e))?;

        info!(path = %path.display(), records = self.results.len(), "report written");
        Ok(path)
    }
}
