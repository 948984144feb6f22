//! Application configuration for BookScout.
//!
//! User config lives at `~/.bookscout/bookscout.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BookScoutError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "bookscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".bookscout";

// ---------------------------------------------------------------------------
// Config structs (matching bookscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Ollama settings for the optional query hint provider.
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Concurrent identification workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Maximum search results examined per catalog.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Fuzzy-match acceptance threshold (0–100).
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: u8,

    /// Timeout in seconds for each catalog page fetch.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_results: default_max_results(),
            fuzzy_threshold: default_fuzzy_threshold(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

fn default_workers() -> usize {
    4
}
fn default_max_results() -> usize {
    3
}
fn default_fuzzy_threshold() -> u8 {
    80
}
fn default_fetch_timeout_secs() -> u64 {
    10
}

/// `[ollama]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL of the local Ollama server.
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Default model used for filename hints.
    #[serde(default = "default_ollama_model")]
    pub default_model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            default_model: default_ollama_model(),
        }
    }
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".into()
}
fn default_ollama_model() -> String {
    "llama3".into()
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime batch configuration — merged from config file + CLI flags.
///
/// Passed explicitly into the pipeline and every task it spawns; there is
/// no ambient global configuration state.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory containing the ebook files to identify.
    pub input_dir: PathBuf,
    /// Root directory for `found_on_<catalog>` subdirectories.
    /// Matches `input_dir` in the default CLI flow.
    pub output_root: PathBuf,
    /// Concurrent identification workers.
    pub workers: usize,
    /// Maximum search results examined per catalog.
    pub max_results: usize,
    /// Fuzzy-match acceptance threshold (0–100).
    pub fuzzy_threshold: u8,
    /// Timeout in seconds for each catalog page fetch.
    pub fetch_timeout_secs: u64,
    /// Whether the LLM query hint provider is enabled.
    pub use_hints: bool,
    /// Model identifier for the hint provider.
    pub model: String,
}

impl RunConfig {
    /// Build a run config for `input_dir` from app-level defaults.
    pub fn from_app_config(config: &AppConfig, input_dir: impl Into<PathBuf>) -> Self {
        let input_dir = input_dir.into();
        Self {
            output_root: input_dir.clone(),
            input_dir,
            workers: config.defaults.workers,
            max_results: config.defaults.max_results,
            fuzzy_threshold: config.defaults.fuzzy_threshold,
            fetch_timeout_secs: config.defaults.fetch_timeout_secs,
            use_hints: false,
            model: config.ollama.default_model.clone(),
        }
    }

    /// Validate settings and the input directory before any work begins.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(BookScoutError::validation("worker count must be at least 1"));
        }
        if self.fuzzy_threshold > 100 {
            return Err(BookScoutError::validation(
                "fuzzy threshold must be in the 0–100 range",
            ));
        }
        if !self.input_dir.is_dir() {
            return Err(BookScoutError::config(format!(
                "input directory {} does not exist",
                self.input_dir.display()
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.bookscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BookScoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.bookscout/bookscout.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BookScoutError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| BookScoutError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BookScoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BookScoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BookScoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
