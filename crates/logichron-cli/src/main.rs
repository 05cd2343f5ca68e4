//! `logichron`: command-line client for the LogiChronos planner server.
//!
//! # Usage
//!
//! ```
//! logichron --url http://localhost:8080 registry --filter acme
//! logichron --year 2025 milestone PO-1042 delivery
//! logichron --config ~/.config/logichron/config.toml export > registry.csv
//! ```

mod client;
mod output;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, NewEvent};
use logichron_core::{
  clock::{Clock, SystemClock},
  event::Category,
  mutation::RegistryEdit,
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:8080";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "logichron", about = "Command-line client for the LogiChronos planner")]
struct Args {
  /// Path to a TOML config file (url, year).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the planner server (default: http://localhost:8080).
  #[arg(long, env = "LOGICHRON_URL")]
  url: Option<String>,

  /// Planning year (default: the current year).
  #[arg(short, long)]
  year: Option<i32>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List the PO registry.
  Registry {
    /// Case-insensitive substring over PO and reference.
    #[arg(short, long)]
    filter: Option<String>,
  },
  /// Show a PO's lifecycle phase by phase.
  Log { po: String },
  /// List the raw milestone log for the year.
  Events,
  /// Record a new event.
  Add {
    #[arg(long)]
    po:          String,
    /// Defaults to today.
    #[arg(long)]
    date:        Option<NaiveDate>,
    #[arg(long, value_parser = parse_category)]
    category:    Category,
    #[arg(long)]
    title:       String,
    /// AWB/BL reference.
    #[arg(long)]
    reference:   Option<String>,
    #[arg(long)]
    description: Option<String>,
  },
  /// Append a milestone to an existing PO.
  Milestone {
    po:        String,
    #[arg(value_parser = parse_category)]
    category:  Category,
    /// Defaults to today.
    #[arg(long)]
    date:      Option<NaiveDate>,
    /// Overrides the PO's AWB/BL reference on the new event.
    #[arg(long)]
    reference: Option<String>,
  },
  /// Rename a PO, set its reference, or move its start date.
  Edit {
    po:        String,
    #[arg(long)]
    rename:    Option<String>,
    #[arg(long)]
    reference: Option<String>,
    #[arg(long)]
    start:     Option<NaiveDate>,
  },
  /// Delete one event by id.
  Delete { id: String },
  /// Ask the server for suggested events and merge them into the year.
  Suggest { prompt: String },
  /// Print the registry as CSV.
  Export,
}

fn parse_category(s: &str) -> Result<Category, String> {
  Category::coerce(s).map_err(|e| e.to_string())
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug)]
struct ConfigFile {
  #[serde(default)]
  url:  String,
  year: Option<i32>,
}

/// Effective settings after layering flags over the file over defaults.
#[derive(Debug, PartialEq, Eq)]
struct Settings {
  base_url: String,
  year:     i32,
}

fn read_config(path: &Path) -> Result<ConfigFile> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading config file {}", path.display()))?;
  toml::from_str(&raw).context("parsing config file")
}

fn resolve(url: Option<String>, year: Option<i32>, file: &ConfigFile, today: NaiveDate) -> Settings {
  Settings {
    base_url: url
      .or_else(|| (!file.url.is_empty()).then(|| file.url.clone()))
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
    year:     year.or(file.year).unwrap_or_else(|| today.year()),
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg = match &args.config {
    Some(path) => read_config(path)?,
    None => ConfigFile::default(),
  };
  let settings = resolve(args.url, args.year, &file_cfg, SystemClock.today());
  let year = settings.year;
  let client = ApiClient::new(ApiConfig { base_url: settings.base_url })?;

  match args.command {
    Command::Registry { filter } => {
      let rows = client.registry(year, filter.as_deref()).await?;
      print!("{}", output::registry_table(&rows));
    }
    Command::Log { po } => {
      let phases = client.phases(year, &po).await?;
      if phases.is_empty() {
        println!("no events for {po} in {year}");
      } else {
        print!("{}", output::phase_table(&phases));
      }
    }
    Command::Events => {
      let events = client.list_events(year).await?;
      print!("{}", output::event_table(&events));
    }
    Command::Add { po, date, category, title, reference, description } => {
      let event = NewEvent { po_name: po, date, category, title, reference, description };
      let added = client.add_event(year, &event).await?;
      println!("added {}", added.id);
    }
    Command::Milestone { po, category, date, reference } => {
      match client.append_milestone(year, &po, category, date, reference.as_deref()).await? {
        Some(event) => println!("added {} ({}) on {}", event.title, event.id, event.date),
        None => println!("no PO named {po} in {year}"),
      }
    }
    Command::Edit { po, rename, reference, start } => {
      let edit = RegistryEdit { po_name: rename, awb_bl_name: reference, start_date: start };
      if edit.is_empty() {
        anyhow::bail!("nothing to edit: pass --rename, --reference or --start");
      }
      let updated = client.edit_registry(year, &po, &edit).await?;
      println!("updated {updated} event(s)");
    }
    Command::Delete { id } => {
      client.delete_event(year, &id).await?;
      println!("deleted {id}");
    }
    Command::Suggest { prompt } => {
      let added = client.suggest(year, &prompt).await;
      if added.is_empty() {
        println!("no suggestions available");
      } else {
        print!("{}", output::event_table(&added));
      }
    }
    Command::Export => {
      print!("{}", client.export_csv(year).await?);
    }
  }

  Ok(())
}
