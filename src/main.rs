//! `quay` server binary.
//!
//! Startup: configuration → database → listener. Shutdown runs the other
//! way: stop accepting and drain sessions, then drain and stop the query
//! worker, which closes the connection.
//!
//! ```text
//! RUST_LOG=debug quay --config /etc/quay/config.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use quay::config::Config;
use quay::db::QueryWorker;
use quay::{Server, handlers};

#[derive(Debug, Parser)]
#[command(version, about = "Small JSON backend")]
struct Cli {
    /// Path to the JSON config file; created with defaults if missing.
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> Result<(), quay::Error> {
    let settings = Config::load_or_init(&cli.config)?.settings()?;

    let worker = QueryWorker::open(&settings.database.path)?;
    info!(path = %settings.database.path.display(), "database connected");

    let server = Server::bind(settings.http.addr()).await?;
    info!(addr = %server.local_addr(), "up and listening");

    server.serve(handlers::app(worker.handle())).await;

    // Joining the worker blocks; keep it off the runtime's threads.
    if tokio::task::spawn_blocking(move || worker.shutdown()).await.is_err() {
        error!("query worker shutdown panicked");
    }
    info!("bye");
    Ok(())
}
