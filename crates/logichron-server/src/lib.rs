//! HTTP server wiring for LogiChronos.
//!
//! Mounts the [`logichron_api`] router under `/api`, with the SQLite store
//! and a Gemini-backed suggestion generator behind it.

pub mod gemini;

use std::path::{Path, PathBuf};

use axum::Router;
use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use logichron_api::{AppState, api_router};
use logichron_core::{store::EventStore, suggest::Generator};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use gemini::{GeminiConfig, GeminiError, GeminiGenerator};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `LOGICHRON_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default)]
  pub gemini:     GeminiConfig,
}

fn with_defaults(
  builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
  builder
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080)?
    .set_default("store_path", "~/.local/share/logichron/planner.db")
}

/// Load configuration from the TOML file at `path` (optional) overlaid with
/// the environment. `LOGICHRON_PORT=9000` sets `port`;
/// `LOGICHRON_GEMINI__API_KEY` sets `gemini.api_key`.
pub fn load_config(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  with_defaults(Config::builder())?
    .add_source(File::from(path).required(false))
    .add_source(
      Environment::with_prefix("LOGICHRON")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()?
    .try_deserialize()
}

/// Parse configuration from an in-memory TOML document, defaults applied.
pub fn config_from_toml(toml: &str) -> Result<ServerConfig, config::ConfigError> {
  with_defaults(Config::builder())?
    .add_source(File::from_str(toml, FileFormat::Toml))
    .build()?
    .try_deserialize()
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the API under `/api`, with request tracing.
pub fn app<S, G>(state: AppState<S, G>) -> Router
where
  S: EventStore + 'static,
  G: Generator + 'static,
{
  Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}
