//! Suggestion endpoints.
//!
//! `POST /generate` is the generator proxy: it forwards `{prompt, year}` to
//! the configured [`Generator`] and answers `{"data": [...]}` unvalidated.
//! `POST /years/:year/suggestions` runs the same call and merges the
//! validated survivors into the year.

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
};
use logichron_core::{
  event::PlannerEvent,
  store::EventStore,
  suggest::{Generator, SuggestionCandidate, SuggestionRequest, request_suggestions},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

// ─── Generate ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
  pub prompt: Option<String>,
  pub year:   Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
  pub data: Vec<SuggestionCandidate>,
}

/// `POST /generate`, body: `{"prompt": "...", "year": 2024}`
pub async fn generate<S, G>(
  State(state): State<AppState<S, G>>,
  body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError>
where
  G: Generator,
{
  let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let (Some(prompt), Some(year)) =
    (body.prompt.filter(|p| !p.is_empty()), body.year.filter(|y| *y != 0))
  else {
    return Err(ApiError::BadRequest("missing prompt or year".into()));
  };

  let request = SuggestionRequest { prompt, year };
  let data = state
    .generator
    .generate(&request)
    .await
    .map_err(|e| ApiError::Generator(Box::new(e)))?;
  tracing::info!(year, candidates = data.len(), "generated suggestions");
  Ok(Json(GenerateResponse { data }))
}

// ─── Merge ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MergeBody {
  pub prompt: String,
}

/// `POST /years/:year/suggestions`, body: `{"prompt": "..."}`
///
/// Answers with the events actually inserted; a failing generator inserts
/// nothing and still answers 200.
pub async fn merge<S, G>(
  State(state): State<AppState<S, G>>,
  Path(year): Path<i32>,
  Json(body): Json<MergeBody>,
) -> Result<Json<Vec<PlannerEvent>>, ApiError>
where
  S: EventStore,
  G: Generator,
{
  if body.prompt.trim().is_empty() {
    return Err(ApiError::BadRequest("missing prompt".into()));
  }

  // No lock is held while the generator runs; the year is loaded after it
  // answers so the merge lands on the latest stored state.
  let request = SuggestionRequest { prompt: body.prompt, year };
  let candidates = request_suggestions(state.generator.as_ref(), &request).await;

  let (_guard, mut planner) = state.planner_for_write(year).await;
  let ticket = planner.suggestion_ticket();
  Ok(Json(planner.merge_suggestions(ticket, candidates).await))
}
