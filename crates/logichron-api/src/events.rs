//! Handlers for `/years/:year/events` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/years/:year/events` | The raw milestone log; `[]` for an unsaved year |
//! | `PUT`    | `/years/:year/events` | Body: [`EventBody`]; 201 if inserted, 200 if replaced |
//! | `DELETE` | `/years/:year/events/:id` | Always 204, even for unknown ids |
//! | `GET`    | `/years/:year/draft` | `?po=&date=`; a pre-filled unsaved event |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use logichron_core::{
  event::{Category, EventId, PlannerEvent},
  mutation::Upsert,
  store::EventStore,
};
use serde::Deserialize;

use crate::AppState;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /years/:year/events`
pub async fn list<S, G>(
  State(state): State<AppState<S, G>>,
  Path(year): Path<i32>,
) -> Json<Vec<PlannerEvent>>
where
  S: EventStore,
{
  let planner = state.planner(year).await;
  Json(planner.events().to_vec())
}

// ─── Upsert ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `PUT /years/:year/events`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBody {
  /// Omit to create a new event.
  pub id:          Option<EventId>,
  #[serde(default)]
  pub title:       String,
  /// Defaults to today.
  pub date:        Option<NaiveDate>,
  pub po_name:     Option<String>,
  pub awb_bl_name: Option<String>,
  pub category:    Category,
  pub description: Option<String>,
}

/// `PUT /years/:year/events`
pub async fn upsert<S, G>(
  State(state): State<AppState<S, G>>,
  Path(year): Path<i32>,
  Json(body): Json<EventBody>,
) -> impl IntoResponse
where
  S: EventStore,
{
  let event = PlannerEvent {
    id:          body.id.unwrap_or_else(EventId::generate),
    title:       body.title,
    date:        body.date.unwrap_or_else(|| state.clock.today()),
    po_name:     body.po_name,
    awb_bl_name: body.awb_bl_name,
    category:    body.category,
    description: body.description,
  };

  let (_guard, mut planner) = state.planner_for_write(year).await;
  let status = match planner.upsert(event.clone()).await {
    Upsert::Inserted => StatusCode::CREATED,
    Upsert::Replaced => StatusCode::OK,
  };
  (status, Json(event))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /years/:year/events/:id`
pub async fn remove<S, G>(
  State(state): State<AppState<S, G>>,
  Path((year, id)): Path<(i32, String)>,
) -> StatusCode
where
  S: EventStore,
{
  let (_guard, mut planner) = state.planner_for_write(year).await;
  if planner.remove(&EventId::from(id)).await.is_none() {
    tracing::debug!(year, "delete of unknown event ignored");
  }
  StatusCode::NO_CONTENT
}

// ─── Draft ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DraftParams {
  pub po:   Option<String>,
  pub date: Option<NaiveDate>,
}

/// `GET /years/:year/draft[?po=<po>][&date=<date>]`
pub async fn draft<S, G>(
  State(state): State<AppState<S, G>>,
  Path(year): Path<i32>,
  Query(params): Query<DraftParams>,
) -> Json<PlannerEvent>
where
  S: EventStore,
{
  let planner = state.planner(year).await;
  let po = params.po.as_deref().filter(|p| !p.is_empty());
  Json(planner.draft(po, params.date, state.clock.today()))
}
