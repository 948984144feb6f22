//! BookScout CLI — identify and organize ebook files.
//!
//! Resolves messy ebook filenames against online book catalogs, moves
//! recognized files into per-catalog directories, and writes a JSON
//! report of the batch.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
