//! logichron-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! planner store, and serves the planner API over HTTP under `/api`.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use logichron_api::AppState;
use logichron_core::clock::SystemClock;
use logichron_server::{GeminiGenerator, expand_tilde, load_config};
use logichron_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "LogiChronos planner server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = load_config(&cli.config).context("failed to load configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match store.years().await {
    Ok(years) => {
      for y in &years {
        tracing::info!(year = y.year, events = y.event_count, saved_at = %y.saved_at, "stored year");
      }
    }
    Err(e) => tracing::warn!(error = %e, "could not list stored years"),
  }

  if server_cfg.gemini.api_key.is_empty() {
    tracing::warn!("no Gemini API key configured; suggestions will be empty");
  }
  let generator =
    GeminiGenerator::new(server_cfg.gemini.clone()).context("failed to build HTTP client")?;

  let state = AppState::new(Arc::new(store), Arc::new(generator), Arc::new(SystemClock));

  let app = logichron_server::app(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
