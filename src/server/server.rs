mod error;
mod handlers;
mod server_config;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use server_config::ServerConfig;
use tokio::net::TcpListener;

use zakupy::Tracker;

const SERVER_CONFIG: &str = "resources/server.toml";

#[derive(Parser, Debug)]
#[clap(version, about)]
struct Cli {
    /// Path to the server configuration file
    #[clap(short, long, value_parser, default_value = SERVER_CONFIG)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let args = Cli::parse();
    let config = ServerConfig::read_or_default(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    let tracker = Tracker::open(&config.data_file);
    let app = handlers::router(handlers::AppState { tracker }, config.static_dir.as_deref());

    let listener = TcpListener::bind(config.bind).await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    log::info!("listening on http://{}, data in {}", config.bind, config.data_file.display());

    axum::serve(listener, app).await?;
    Ok(())
}
