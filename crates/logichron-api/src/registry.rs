//! Handlers for `/years/:year/registry` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/years/:year/registry` | `?q=&today=`; rows include `elapsedDays` and `aging` |
//! | `GET`   | `/years/:year/registry.csv` | Same rows as CSV |
//! | `PATCH` | `/years/:year/registry/:po` | Body: [`RegistryEdit`] |
//! | `GET`   | `/years/:year/registry/:po/phases` | `[]` for an unknown PO |
//! | `POST`  | `/years/:year/registry/:po/milestones` | Body: [`NewMilestone`]; `null` for an unknown PO |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use chrono::NaiveDate;
use logichron_core::{
  export::registry_csv,
  mutation::{NewMilestone, RegistryEdit},
  registry::{AgingTier, Phase, RegistryEntry},
  store::EventStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize, Default)]
pub struct RegistryParams {
  /// Case-insensitive substring over PO name and reference.
  pub q:     Option<String>,
  /// Overrides the server's notion of today.
  pub today: Option<NaiveDate>,
}

/// One registry row as served: the entry plus its display metrics.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryRow {
  #[serde(flatten)]
  pub entry:        RegistryEntry,
  pub elapsed_days: i64,
  pub aging:        AgingTier,
}

impl From<RegistryEntry> for RegistryRow {
  fn from(entry: RegistryEntry) -> Self {
    Self { elapsed_days: entry.elapsed_days(), aging: entry.aging(), entry }
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /years/:year/registry[?q=<text>][&today=<date>]`
pub async fn list<S, G>(
  State(state): State<AppState<S, G>>,
  Path(year): Path<i32>,
  Query(params): Query<RegistryParams>,
) -> Json<Vec<RegistryRow>>
where
  S: EventStore,
{
  let today = params.today.unwrap_or_else(|| state.clock.today());
  let planner = state.planner(year).await;
  let rows = planner
    .registry(today, params.q.as_deref())
    .into_iter()
    .map(RegistryRow::from)
    .collect();
  Json(rows)
}

/// `GET /years/:year/registry.csv[?q=<text>][&today=<date>]`
pub async fn export_csv<S, G>(
  State(state): State<AppState<S, G>>,
  Path(year): Path<i32>,
  Query(params): Query<RegistryParams>,
) -> impl IntoResponse
where
  S: EventStore,
{
  let today = params.today.unwrap_or_else(|| state.clock.today());
  let planner = state.planner(year).await;
  let csv = registry_csv(&planner.registry(today, params.q.as_deref()));
  ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], csv)
}

// ─── Phases ───────────────────────────────────────────────────────────────────

/// `GET /years/:year/registry/:po/phases[?today=<date>]`
pub async fn phases<S, G>(
  State(state): State<AppState<S, G>>,
  Path((year, po)): Path<(i32, String)>,
  Query(params): Query<RegistryParams>,
) -> Json<Vec<Phase>>
where
  S: EventStore,
{
  let today = params.today.unwrap_or_else(|| state.clock.today());
  let planner = state.planner(year).await;
  Json(planner.entry(today, &po).map(|e| e.phases()).unwrap_or_default())
}

// ─── Milestones ───────────────────────────────────────────────────────────────

/// `POST /years/:year/registry/:po/milestones`
pub async fn milestone<S, G>(
  State(state): State<AppState<S, G>>,
  Path((year, po)): Path<(i32, String)>,
  Json(milestone): Json<NewMilestone>,
) -> impl IntoResponse
where
  S: EventStore,
{
  let (_guard, mut planner) = state.planner_for_write(year).await;
  let added = planner
    .append_milestone(&po, &milestone, state.clock.today())
    .await;
  let status = if added.is_some() { StatusCode::CREATED } else { StatusCode::OK };
  (status, Json(added))
}

// ─── Edit ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct EditOutcome {
  /// Number of events rewritten; `0` for an unknown PO.
  pub updated: usize,
}

/// `PATCH /years/:year/registry/:po`
pub async fn edit<S, G>(
  State(state): State<AppState<S, G>>,
  Path((year, po)): Path<(i32, String)>,
  Json(edit): Json<RegistryEdit>,
) -> Result<Json<EditOutcome>, ApiError>
where
  S: EventStore,
{
  if edit.is_empty() {
    return Err(ApiError::BadRequest("registry edit has no fields".into()));
  }
  let (_guard, mut planner) = state.planner_for_write(year).await;
  let updated = planner.edit_registry(&po, &edit).await;
  Ok(Json(EditOutcome { updated }))
}
