use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use pvligne_core::directory::StaticDirectory;
use pvligne_core::tracing_init::init_tracing;
use tracing::info;

use pvligne_directory::routes::{AppState, build_router};

#[derive(Parser)]
#[command(name = "pvligne-directory")]
#[command(version, about = "Stand-in for the PV en Ligne user-search endpoint", long_about = None)]
struct Args {
    /// Listen address
    #[arg(long, default_value = "127.0.0.1:8000", env = "LISTEN_ADDR")]
    addr: SocketAddr,

    /// JSON array of users to serve
    #[arg(long, env = "PVLIGNE_USERS_FILE")]
    users_file: PathBuf,

    /// Require this `sessionid` cookie on every search
    #[arg(long, env = "PVLIGNE_SESSION")]
    session: Option<String>,

    /// Emit JSON log lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing("pvligne_directory=info,tower_http=info", args.log_json);

    let directory = StaticDirectory::from_json_file(&args.users_file)?;
    info!(
        addr = %args.addr,
        users = directory.len(),
        login_required = args.session.is_some(),
        "starting pvligne-directory"
    );

    let app = build_router(AppState {
        directory: Arc::new(directory),
        session: args.session,
    });
    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
