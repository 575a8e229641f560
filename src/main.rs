mod app;
mod error;
mod server;

use crate::error::{ErrorKind, Result};
use crate::server::{AppState, ClientConfig};
use clap::{Parser, Subcommand};
use exn::ResultExt;
use gallery_config::Config;
use gallery_library::{Order, PageRequest};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Self-hosted photo gallery.
#[derive(Debug, Parser)]
#[command(name = "gallery", version, about)]
struct Cli {
    /// TOML configuration file (defaults to `gallery.toml` in the platform
    /// configuration directory, if present).
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (the default).
    Serve,
    /// Print one page of a directory listing as JSON.
    List {
        /// Directory relative to the image root (the root itself when omitted).
        dir: Option<String>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Page size (defaults to `listing.default_limit`).
        #[arg(long)]
        limit: Option<usize>,
        /// Shuffle the listing instead of sorting by name.
        #[arg(long)]
        random: bool,
        /// Seed for `--random`; the current time when omitted.
        #[arg(long, requires = "random")]
        seed: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cli.config).await,
        Command::List {
            dir,
            offset,
            limit,
            random,
            seed,
        } => list(cli.config, dir.unwrap_or_default(), offset, limit, random, seed).await,
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = ?err, "{}", *err);
            ExitCode::FAILURE
        },
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    Config::load(path.as_deref()).map_err(|err| err.raise(ErrorKind::Config))
}

async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let gallery = app::build_gallery(&config).await?;
    if config.upload_token().is_none() {
        tracing::warn!("No upload_token configured: upload and delete are open to anyone");
    }
    let state = AppState::new(
        gallery,
        app::limits(&config),
        config.upload_token(),
        ClientConfig {
            build_id: config.build_id.clone(),
            autoplay_ms: config.autoplay_ms,
        },
    );

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr).await.or_raise(|| ErrorKind::Bind(addr.clone()))?;
    tracing::info!(addr = %addr, images_dir = %config.images_dir.display(), "Gallery listening");
    server::serve(listener, state).await.or_raise(|| ErrorKind::Serve)
}

async fn list(
    config_path: Option<PathBuf>,
    dir: String,
    offset: usize,
    limit: Option<usize>,
    random: bool,
    seed: Option<String>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let gallery = app::build_gallery(&config).await?;
    let limits = app::limits(&config);
    let request = PageRequest {
        offset,
        limit: limit.unwrap_or(limits.default_limit).clamp(1, limits.max_limit),
        order: match random {
            true => Order::parse(Some("random"), seed.as_deref()),
            false => Order::Stable,
        },
    };
    let page = gallery
        .list(&dir, &request)
        .await
        .map_err(|err| err.raise(ErrorKind::List(dir.clone())))?;
    let json = serde_json::to_string_pretty(&page).or_raise(|| ErrorKind::List(dir))?;
    println!("{json}");
    Ok(())
}
