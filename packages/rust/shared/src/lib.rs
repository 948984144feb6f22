//! Shared types, error model, and configuration for BookScout.
//!
//! This crate is the foundation depended on by all other BookScout crates.
//! It provides:
//! - [`BookScoutError`] — the unified error type
//! - Domain types ([`SourceFile`], [`CandidateMatch`], [`OrganizedResult`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, OllamaConfig, RunConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{BookScoutError, Result};
pub use types::{BookDetails, CandidateMatch, IdentificationOutcome, OrganizedResult, SourceFile};
