//! [`SqliteStore`], the SQLite implementation of [`EventStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use logichron_core::{event::PlannerEvent, store::EventStore};

pub use crate::encode::YearSummary;
use crate::{
  Error, Result,
  encode::{RawYearSummary, decode_events, encode_dt, encode_events},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A LogiChronos event store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Every stored year, oldest first.
  pub async fn years(&self) -> Result<Vec<YearSummary>> {
    let raws: Vec<RawYearSummary> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT year, event_count, saved_at FROM planner_years ORDER BY year",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawYearSummary {
              year:        row.get(0)?,
              event_count: row.get(1)?,
              saved_at:    row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawYearSummary::into_summary).collect()
  }

  /// Store a raw blob for `year`, bypassing encoding.
  #[cfg(test)]
  pub(crate) async fn put_raw(&self, year: i32, blob: &str) -> Result<()> {
    let blob = blob.to_owned();
    let at = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO planner_years (year, events_json, event_count, saved_at)
           VALUES (?1, ?2, 0, ?3)",
          rusqlite::params![year, blob, at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── EventStore impl ─────────────────────────────────────────────────────────

impl EventStore for SqliteStore {
  type Error = Error;

  async fn load(&self, year: i32) -> Result<Option<Vec<PlannerEvent>>> {
    let blob: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT events_json FROM planner_years WHERE year = ?1",
              rusqlite::params![year],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    blob.map(|b| decode_events(year, &b)).transpose()
  }

  async fn save(&self, year: i32, events: &[PlannerEvent]) -> Result<()> {
    let blob = encode_events(year, events)?;
    let count = i64::try_from(events.len()).unwrap_or(i64::MAX);
    let at = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO planner_years (year, events_json, event_count, saved_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (year) DO UPDATE SET
             events_json = excluded.events_json,
             event_count = excluded.event_count,
             saved_at    = excluded.saved_at",
          rusqlite::params![year, blob, count, at],
        )?;
        Ok(())
      })
      .await?;
    tracing::debug!(year, events = events.len(), "saved planning year");
    Ok(())
  }
}
