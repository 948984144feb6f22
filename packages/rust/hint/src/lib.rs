//! Optional LLM query-hint provider.
//!
//! Given a raw ebook filename, a local inference service proposes a
//! structured (title, author) guess that replaces the mechanically
//! normalized query. The provider is strictly best-effort: every failure
//! mode (server down, timeout, free-form reply, malformed JSON) degrades
//! to "no hint" and the caller falls back to the normalized filename.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use bookscout_shared::{BookScoutError, Result};

/// Timeout for a single inference request. Local models can be slow to
/// load on first call, so this is far above the page-fetch timeout.
const INFER_TIMEOUT_SECS: u64 = 60;

// ---------------------------------------------------------------------------
// QueryHint / HintProvider
// ---------------------------------------------------------------------------

/// A structured (title, author) guess derived from a filename.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryHint {
    /// Proposed title; replaces the normalized query as the search term.
    pub title: String,
    /// Proposed author; never used as a search term.
    #[serde(default)]
    pub author: Option<String>,
}

/// External inference collaborator proposing query hints.
///
/// `None` means "no hint" — either the provider declined or it failed.
/// Implementations must swallow their own errors; a hint is never required
/// for the pipeline to proceed.
pub trait HintProvider: Send + Sync {
    fn infer(&self, filename: &str) -> impl Future<Output = Option<QueryHint>> + Send;
}

// ---------------------------------------------------------------------------
// Ollama-backed provider
// ---------------------------------------------------------------------------

/// Response from `POST /api/generate` with `stream: false`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Hint provider backed by a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaHintProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaHintProvider {
    /// Create a provider against `base_url` (e.g. `http://localhost:11434`).
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(INFER_TIMEOUT_SECS))
            .build()
            .map_err(|e| BookScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    async fn generate(&self, filename: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let prompt = build_prompt(filename);

        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BookScoutError::Hint(format!("inference request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BookScoutError::Hint(format!(
                "inference returned HTTP {status}"
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| BookScoutError::Hint(format!("bad inference response: {e}")))?;

        Ok(parsed.response)
    }
}

impl HintProvider for OllamaHintProvider {
    async fn infer(&self, filename: &str) -> Option<QueryHint> {
        let reply = match self.generate(filename).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(filename, error = %e, "hint inference failed, falling back");
                return None;
            }
        };

        match parse_hint_reply(&reply) {
            Some(hint) => {
                debug!(filename, title = %hint.title, "hint accepted");
                Some(hint)
            }
            None => {
                warn!(filename, "no usable JSON in hint reply, falling back");
                None
            }
        }
    }
}

/// Prompt asking for a strict JSON reply. Models still wrap it in prose
/// often enough that the parser has to dig the object out itself.
fn build_prompt(filename: &str) -> String {
    format!(
        "The following is the filename of an ebook: \"{filename}\"\n\
         Guess the book's title and author. Respond with a single JSON \
         object of the form {{\"title\": \"...\", \"author\": \"...\"}} \
         and nothing else. Use null for an unknown author."
    )
}

/// Parse a model reply into a hint, tolerating surrounding free text.
/// Empty titles are rejected.
fn parse_hint_reply(reply: &str) -> Option<QueryHint> {
    let json = extract_first_json_object(reply)?;
    let hint: QueryHint = serde_json::from_str(&json).ok()?;

    if hint.title.trim().is_empty() {
        return None;
    }
    Some(hint)
}

/// Extract the first balanced `{...}` object from free-form text.
///
/// Tracks string literals and escapes so braces inside values don't
/// terminate the scan early.
fn extract_first_json_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + offset + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }

    None
}
