//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings; the event collection is stored
//! as a compact JSON array in the persisted-record shape.

use chrono::{DateTime, Utc};
use logichron_core::event::PlannerEvent;

use crate::{Error, Result};

// ─── Events ───────────────────────────────────────────────────────────────────

pub fn encode_events(year: i32, events: &[PlannerEvent]) -> Result<String> {
  serde_json::to_string(events).map_err(|source| Error::Json { year, source })
}

pub fn decode_events(year: i32, blob: &str) -> Result<Vec<PlannerEvent>> {
  serde_json::from_str(blob).map_err(|source| Error::Json { year, source })
}

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Raw row types ────────────────────────────────────────────────────────────

/// A `planner_years` row minus the blob, as read from SQLite.
pub struct RawYearSummary {
  pub year:        i32,
  pub event_count: i64,
  pub saved_at:    String,
}

/// One stored year, without its events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearSummary {
  pub year:        i32,
  pub event_count: usize,
  pub saved_at:    DateTime<Utc>,
}

impl RawYearSummary {
  pub fn into_summary(self) -> Result<YearSummary> {
    Ok(YearSummary {
      year:        self.year,
      event_count: usize::try_from(self.event_count).unwrap_or_default(),
      saved_at:    decode_dt(&self.saved_at)?,
    })
  }
}
