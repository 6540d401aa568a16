//! PV en Ligne CLI
//!
//! Terminal form for entering a minutes action, with `@mention`
//! autocomplete on the "Personnes impliquées" field.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use pvligne_cli::config::{self, CliOverrides};
use pvligne_cli::tui;
use pvligne_core::directory::{HttpDirectory, StaticDirectory};
use pvligne_core::tracing_init::init_file_tracing;
use pvligne_core::UserDirectory;

#[derive(Parser, Debug)]
#[command(name = "pvligne")]
#[command(version, about = "PV en Ligne minutes form with @mention autocomplete", long_about = None)]
struct Cli {
    /// Base URL of the PV en Ligne server
    #[arg(long)]
    base_url: Option<String>,

    /// Django `sessionid` cookie of a logged-in user
    #[arg(long)]
    session_cookie: Option<String>,

    /// Serve suggestions from a JSON users file instead of the server
    #[arg(long)]
    users_file: Option<PathBuf>,

    /// Delay between the last keystroke and the lookup
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Log file (defaults to the user data directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Directory holding `.pvligne/settings.json` (defaults to the current one)
    #[arg(short = 'd', long)]
    project_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The form owns the terminal, so logs go to a file.
    if let Some(path) = cli.log_file.clone().or_else(config::default_log_path) {
        init_file_tracing("pvligne_cli=info,pvligne_core=info", &path)?;
    }

    let project_dir = match cli.project_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let overrides = CliOverrides {
        base_url: cli.base_url,
        session_cookie: cli.session_cookie,
        debounce_ms: cli.debounce_ms,
    };
    let config = config::resolve(Some(&project_dir), &overrides)?;

    let directory: Arc<dyn UserDirectory> = match &cli.users_file {
        Some(path) => {
            let directory = StaticDirectory::from_json_file(path)?;
            info!(users = directory.len(), path = %path.display(), "Using users file");
            Arc::new(directory)
        }
        None => {
            info!(base_url = %config.lookup.base_url, "Using search endpoint");
            Arc::new(HttpDirectory::new(&config.lookup)?)
        }
    };

    info!(version = env!("CARGO_PKG_VERSION"), "Starting pvligne");
    if let Some(minutes) = tui::run(config, directory).await? {
        println!("{}", serde_json::to_string_pretty(&minutes)?);
    }
    Ok(())
}
