//! apidash TUI: interactive dashboard over the team API catalog.
//!
//! Loads the catalog before entering the alternate screen, so startup
//! failures print as ordinary errors. Logs go to `~/.apidash/apidash-tui.log`.

mod app;
mod screens;
mod widgets;

use std::fs::OpenOptions;
use std::sync::Mutex;

use color_eyre::eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

use apidash_core::{AppContext, SilentReporter};
use apidash_discovery::ContextResolver;
use apidash_shared::{config_dir, load_config};

const LOG_FILE: &str = "apidash-tui.log";
const DEFAULT_FILTER: &str =
    "apidash_tui=info,apidash_core=info,apidash_storage=info,apidash_discovery=info";

fn main() -> Result<()> {
    color_eyre::install()?;
    init_file_logging()?;

    let mut config = load_config()?;
    if let Ok(page_url) = std::env::var("APIDASH_PAGE_URL") {
        config.repository.page_url = Some(page_url);
    }
    let resolution = ContextResolver::from_config(&config.repository)
        .resolve_str(config.repository.page_url.as_deref());

    let runtime = tokio::runtime::Runtime::new()?;
    eprintln!("Loading catalog...");
    let ctx = runtime
        .block_on(AppContext::bootstrap(config, resolution, &SilentReporter))
        .wrap_err("failed to load the API catalog")?;

    app::run(runtime, ctx)
}

/// Send tracing output to a log file; the terminal belongs to the UI.
fn init_file_logging() -> Result<()> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
