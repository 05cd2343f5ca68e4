//! The `EventStore` trait and an in-memory implementation.
//!
//! The trait is implemented by storage backends (e.g.
//! `logichron-store-sqlite`). It persists one planning year at a time as a
//! whole collection; there are no per-event writes. Backends report failures
//! honestly; [`crate::planner::Planner`] is the layer that turns them into
//! empty results.

use std::{collections::HashMap, future::Future, sync::Mutex};

use crate::{Error, event::PlannerEvent};

/// Abstraction over per-year persistence of the milestone log.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait EventStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The stored collection for `year`, or `None` if that year was never saved.
  /// Unparsable content is an error.
  fn load(
    &self,
    year: i32,
  ) -> impl Future<Output = Result<Option<Vec<PlannerEvent>>, Self::Error>> + Send + '_;

  /// Replace everything stored for `year` with `events`.
  fn save<'a>(
    &'a self,
    year: i32,
    events: &'a [PlannerEvent],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── MemoryStore ─────────────────────────────────────────────────────────────

/// A process-local store keeping each year as its serialised JSON blob, the
/// same shape a browser-storage or file backend would hold.
#[derive(Debug, Default)]
pub struct MemoryStore {
  blobs: Mutex<HashMap<i32, String>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Overwrite the raw blob for `year`, bypassing serialisation.
  pub fn insert_raw(&self, year: i32, blob: impl Into<String>) {
    self.lock().insert(year, blob.into());
  }

  /// The raw blob for `year`, if any.
  pub fn raw(&self, year: i32) -> Option<String> { self.lock().get(&year).cloned() }

  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i32, String>> {
    self.blobs.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
  }
}

impl EventStore for MemoryStore {
  type Error = Error;

  async fn load(&self, year: i32) -> Result<Option<Vec<PlannerEvent>>, Error> {
    let blob = self.raw(year);
    blob.map(|b| serde_json::from_str(&b)).transpose().map_err(Error::from)
  }

  async fn save(&self, year: i32, events: &[PlannerEvent]) -> Result<(), Error> {
    let blob = serde_json::to_string(events)?;
    self.lock().insert(year, blob);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::event::Category;

  #[tokio::test]
  async fn missing_year_loads_as_none() {
    let store = MemoryStore::new();
    assert!(store.load(2024).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn save_replaces_whole_year() {
    let store = MemoryStore::new();
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let a = PlannerEvent::new("a", date, Category::LocalProcess);
    let b = PlannerEvent::new("b", date, Category::Delivery);

    store.save(2024, &[a.clone(), b]).await.unwrap();
    store.save(2024, std::slice::from_ref(&a)).await.unwrap();

    assert_eq!(store.load(2024).await.unwrap().unwrap(), vec![a]);
    assert!(store.load(2025).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn corrupt_blob_is_an_error_at_this_layer() {
    let store = MemoryStore::new();
    store.insert_raw(2024, "{not json");
    assert!(matches!(store.load(2024).await, Err(Error::Serialization(_))));
  }
}
