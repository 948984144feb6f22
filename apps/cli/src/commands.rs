//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use bookscout_catalogs::GoogleSearchProvider;
use bookscout_core::{BatchSummary, Identifier, ProgressReporter, run_batch};
use bookscout_hint::OllamaHintProvider;
use bookscout_shared::{AppConfig, RunConfig, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// BookScout — identify ebook files and file them by catalog.
#[derive(Parser)]
#[command(
    name = "bookscout",
    version,
    about = "Identify ebook files against online catalogs and organize them.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Identify every ebook in a directory and organize the matches.
    Scan {
        /// Directory containing the ebook files.
        dir: PathBuf,

        /// Root for found_on_<catalog> directories (defaults to DIR).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Concurrent identification workers.
        #[arg(short, long)]
        workers: Option<usize>,

        /// Fuzzy-match acceptance threshold (0-100).
        #[arg(short, long)]
        threshold: Option<u8>,

        /// Maximum search results examined per catalog.
        #[arg(long)]
        max_results: Option<usize>,

        /// Infer title/author hints from filenames with a local LLM.
        #[arg(long)]
        hints: bool,

        /// Ollama model for filename hints (implies --hints).
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "bookscout=info",
        1 => "bookscout=debug",
        _ => "bookscout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Scan {
            dir,
            out,
            workers,
            threshold,
            max_results,
            hints,
            model,
        } => cmd_scan(dir, out, workers, threshold, max_results, hints, model).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

#[allow(clippy::too_many_arguments)]
async fn cmd_scan(
    dir: PathBuf,
    out: Option<PathBuf>,
    workers: Option<usize>,
    threshold: Option<u8>,
    max_results: Option<usize>,
    hints: bool,
    model: Option<String>,
) -> Result<()> {
    let app_config = load_config()?;

    let mut config = RunConfig::from_app_config(&app_config, dir);
    if let Some(out) = out {
        config.output_root = out;
    }
    if let Some(workers) = workers {
        config.workers = workers;
    }
    if let Some(threshold) = threshold {
        config.fuzzy_threshold = threshold;
    }
    if let Some(max_results) = max_results {
        config.max_results = max_results;
    }
    config.use_hints = hints || model.is_some();
    if let Some(model) = model {
        config.model = model;
    }

    info!(
        dir = %config.input_dir.display(),
        workers = config.workers,
        threshold = config.fuzzy_threshold,
        hints = config.use_hints,
        "starting scan"
    );

    let search = GoogleSearchProvider::new(config.fetch_timeout_secs)?;
    let identifier = Identifier::new(&config, search)?;
    let hint_provider = config
        .use_hints
        .then(|| OllamaHintProvider::new(&app_config.ollama.base_url, &config.model))
        .transpose()?;

    let reporter = CliProgress::new();
    let summary = run_batch(&config, identifier, hint_provider, &reporter).await?;

    println!();
    println!("  Scan complete!");
    println!("  Scanned: {}", summary.scanned);
    println!("  Matched: {}", summary.matched);
    println!("  Moved:   {}", summary.moved);
    if let Some(report) = &summary.report_path {
        println!("  Report:  {}", report.display());
    }
    println!("  Time:    {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn file_identified(&self, file: &str, current: usize, total: usize, found: bool) {
        let mark = if found { "✓" } else { "✗" };
        self.spinner
            .set_message(format!("Identifying [{current}/{total}] {mark} {file}"));
    }

    fn done(&self, _summary: &BatchSummary) {
        self.spinner.finish_and_clear();
    }
}
