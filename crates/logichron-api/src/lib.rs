//! JSON REST API for LogiChronos.
//!
//! Exposes an axum [`Router`] backed by any [`EventStore`] and suggestion
//! [`Generator`]. Every request opens a [`logichron_core::planner::Planner`]
//! for its year, so writes are last-writer-wins per year.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", logichron_api::api_router(state))
//! ```

pub mod error;
pub mod events;
pub mod registry;
pub mod suggestions;

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use axum::{
  Router,
  routing::{delete, get, patch, post},
};
use logichron_core::{
  clock::Clock,
  planner::Planner,
  store::EventStore,
  suggest::Generator,
};
use tokio::sync::OwnedMutexGuard;

pub use error::ApiError;

// ─── Year locks ───────────────────────────────────────────────────────────────

/// One write lock per planning year. Every mutating handler holds its
/// year's lock from load through save.
#[derive(Default)]
pub struct YearLocks {
  slots: Mutex<HashMap<i32, Arc<tokio::sync::Mutex<()>>>>,
}

impl YearLocks {
  pub async fn lock(&self, year: i32) -> OwnedMutexGuard<()> {
    let slot = {
      let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
      slots.entry(year).or_default().clone()
    };
    slot.lock_owned().await
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S, G> {
  pub store:     Arc<S>,
  pub generator: Arc<G>,
  pub clock:     Arc<dyn Clock>,
  pub locks:     Arc<YearLocks>,
}

impl<S, G> Clone for AppState<S, G> {
  fn clone(&self) -> Self {
    Self {
      store:     self.store.clone(),
      generator: self.generator.clone(),
      clock:     self.clock.clone(),
      locks:     self.locks.clone(),
    }
  }
}

impl<S, G> AppState<S, G> {
  pub fn new(store: Arc<S>, generator: Arc<G>, clock: Arc<dyn Clock>) -> Self {
    Self { store, generator, clock, locks: Arc::default() }
  }
}

impl<S: EventStore, G> AppState<S, G> {
  /// A read-only view of `year`.
  async fn planner(&self, year: i32) -> Planner<S> { Planner::open(self.store.clone(), year).await }

  /// `year` opened under its write lock; drop the guard after the last save.
  async fn planner_for_write(&self, year: i32) -> (OwnedMutexGuard<()>, Planner<S>) {
    let guard = self.locks.lock(year).await;
    (guard, self.planner(year).await)
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, G>(state: AppState<S, G>) -> Router<()>
where
  S: EventStore + 'static,
  G: Generator + 'static,
{
  Router::new()
    // Events
    .route(
      "/years/{year}/events",
      get(events::list::<S, G>).put(events::upsert::<S, G>),
    )
    .route("/years/{year}/events/{id}", delete(events::remove::<S, G>))
    .route("/years/{year}/draft", get(events::draft::<S, G>))
    // Registry
    .route("/years/{year}/registry", get(registry::list::<S, G>))
    .route("/years/{year}/registry.csv", get(registry::export_csv::<S, G>))
    .route("/years/{year}/registry/{po}", patch(registry::edit::<S, G>))
    .route("/years/{year}/registry/{po}/phases", get(registry::phases::<S, G>))
    .route(
      "/years/{year}/registry/{po}/milestones",
      post(registry::milestone::<S, G>),
    )
    // Suggestions
    .route("/years/{year}/suggestions", post(suggestions::merge::<S, G>))
    .route("/generate", post(suggestions::generate::<S, G>))
    .with_state(state)
}
