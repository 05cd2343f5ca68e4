//! Contract for the external "smart schedule" generator.
//!
//! A generator turns a free-text prompt and a year into candidate events.
//! Nothing it returns is trusted: candidates are coerced into
//! [`PlannerEvent`]s here, and anything that does not fit the closed
//! category set or the date format is dropped.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  event::{Category, PlannerEvent, parse_date},
};

/// How many candidates the generator is asked for. Receipt of fewer
/// (including zero) is valid.
pub const REQUESTED_SUGGESTIONS: usize = 15;

/// Body of a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRequest {
  pub prompt: String,
  pub year:   i32,
}

impl SuggestionRequest {
  /// The instruction sent to the upstream text model.
  pub fn instruction(&self) -> String {
    format!(
      "Generate a list of recommended events for a professional annual planner for the year {}. \
       Context: {}. Return at least {REQUESTED_SUGGESTIONS} events spread across the year.",
      self.year, self.prompt
    )
  }
}

/// One untrusted event as returned by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionCandidate {
  pub title:       String,
  /// Expected `YYYY-MM-DD`.
  pub date:        String,
  pub category:    String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

impl SuggestionCandidate {
  /// Validate into a fresh, PO-less event.
  pub fn into_event(self) -> Result<PlannerEvent> {
    let category = Category::coerce(&self.category)?;
    let date = parse_date(&self.date)?;
    let mut event = PlannerEvent::new(self.title, date, category);
    event.description = self.description.filter(|d| !d.is_empty());
    Ok(event)
  }
}

/// Coerce a batch, dropping (and logging) every candidate that fails to
/// validate.
pub fn coerce_candidates(candidates: Vec<SuggestionCandidate>) -> Vec<PlannerEvent> {
  let received = candidates.len();
  let events: Vec<PlannerEvent> = candidates
    .into_iter()
    .filter_map(|c| {
      let title = c.title.clone();
      c.into_event()
        .inspect_err(|e| tracing::warn!(%title, error = %e, "dropping suggestion"))
        .ok()
    })
    .collect();
  tracing::debug!(received, kept = events.len(), "coerced suggestions");
  events
}

// ─── Generator ───────────────────────────────────────────────────────────────

/// Abstraction over the remote suggestion service.
pub trait Generator: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn generate<'a>(
    &'a self,
    request: &'a SuggestionRequest,
  ) -> impl Future<Output = Result<Vec<SuggestionCandidate>, Self::Error>> + Send + 'a;
}

/// Call `generator` once; any failure becomes an empty batch.
pub async fn request_suggestions<G: Generator>(
  generator: &G,
  request: &SuggestionRequest,
) -> Vec<SuggestionCandidate> {
  match generator.generate(request).await {
    Ok(candidates) => candidates,
    Err(e) => {
      tracing::error!(year = request.year, error = %e, "suggestion generator failed");
      Vec::new()
    }
  }
}

/// A generator that always returns the same batch, or always fails.
#[derive(Debug, Clone)]
pub struct StaticGenerator {
  outcome: std::result::Result<Vec<SuggestionCandidate>, String>,
}

/// The failure reported by a failing [`StaticGenerator`].
#[derive(Debug, thiserror::Error)]
#[error("generator unavailable: {0}")]
pub struct StaticGeneratorError(String);

impl StaticGenerator {
  pub fn returning(candidates: Vec<SuggestionCandidate>) -> Self { Self { outcome: Ok(candidates) } }

  pub fn failing(reason: impl Into<String>) -> Self { Self { outcome: Err(reason.into()) } }
}

impl Generator for StaticGenerator {
  type Error = StaticGeneratorError;

  async fn generate(
    &self,
    _request: &SuggestionRequest,
  ) -> Result<Vec<SuggestionCandidate>, StaticGeneratorError> {
    self.outcome.clone().map_err(StaticGeneratorError)
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn candidate(date: &str, category: &str) -> SuggestionCandidate {
    SuggestionCandidate {
      title:       format!("{category} on {date}"),
      date:        date.into(),
      category:    category.into(),
      description: None,
    }
  }

  #[test]
  fn unknown_categories_and_bad_dates_are_dropped() {
    let events = coerce_candidates(vec![
      candidate("2024-02-01", "local_process"),
      candidate("2024-03-01", "team offsite"),
      candidate("sometime in March", "delivery"),
      candidate("2024-04-01", "Customs Clearance"),
    ]);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].category, Category::LocalProcess);
    assert_eq!(events[1].category, Category::CustomsClearance);
    assert_eq!(events[1].date, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    assert!(events.iter().all(|e| e.po_name.is_none()));
  }

  #[test]
  fn zero_candidates_is_valid() {
    assert!(coerce_candidates(Vec::new()).is_empty());
  }

  #[test]
  fn candidate_without_description_deserializes() {
    let json = r#"[{"title":"Kickoff","date":"2024-01-08","category":"delivery"}]"#;
    let parsed: Vec<SuggestionCandidate> = serde_json::from_str(json).unwrap();
    assert_eq!(parsed[0].description, None);
  }

  #[test]
  fn instruction_mentions_year_context_and_minimum() {
    let req = SuggestionRequest { prompt: "sea freight from Shenzhen".into(), year: 2025 };
    let text = req.instruction();
    assert!(text.contains("2025"));
    assert!(text.contains("sea freight from Shenzhen"));
    assert!(text.contains("at least 15"));
  }

  #[tokio::test]
  async fn generator_failure_becomes_empty_batch() {
    let req = SuggestionRequest { prompt: "x".into(), year: 2024 };
    let failing = StaticGenerator::failing("timeout");
    assert!(request_suggestions(&failing, &req).await.is_empty());

    let ok = StaticGenerator::returning(vec![candidate("2024-01-01", "delivery")]);
    assert_eq!(request_suggestions(&ok, &req).await.len(), 1);
  }
}
