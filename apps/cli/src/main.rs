//! apidash CLI: browse, audit and edit the team API catalog.
//!
//! Reads the catalog from the repository behind the published dashboard
//! (or a local directory) and turns edits into change requests.

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
