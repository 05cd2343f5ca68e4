//! Async HTTP client wrapping the LogiChronos JSON API.

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use logichron_core::{
  event::{Category, PlannerEvent},
  mutation::RegistryEdit,
  registry::{AgingTier, Phase, RegistryEntry},
};
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Connection settings for the planner API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// One row of `GET /years/:year/registry`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryRow {
  #[serde(flatten)]
  pub entry:        RegistryEntry,
  pub elapsed_days: i64,
  pub aging:        AgingTier,
}

/// Fields for a new event, as given on the command line.
#[derive(Debug, Clone)]
pub struct NewEvent {
  pub po_name:     String,
  pub date:        Option<NaiveDate>,
  pub category:    Category,
  pub title:       String,
  pub reference:   Option<String>,
  pub description: Option<String>,
}

#[derive(Deserialize)]
struct EditOutcome {
  updated: usize,
}

/// Async HTTP client for the planner REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  /// `{base_url}/api/<segments...>`, each segment percent-encoded.
  pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(&self.config.base_url)
      .with_context(|| format!("invalid server url {:?}", self.config.base_url))?;
    url
      .path_segments_mut()
      .map_err(|_| anyhow!("server url {:?} cannot carry a path", self.config.base_url))?
      .pop_if_empty()
      .push("api")
      .extend(segments);
    Ok(url)
  }

  fn year_endpoint(&self, year: i32, rest: &[&str]) -> Result<Url> {
    let year = year.to_string();
    let mut segments = vec!["years", year.as_str()];
    segments.extend_from_slice(rest);
    self.endpoint(&segments)
  }

  // ── Events ────────────────────────────────────────────────────────────────

  /// `GET /api/years/:year/events`
  pub async fn list_events(&self, year: i32) -> Result<Vec<PlannerEvent>> {
    let resp = self
      .client
      .get(self.year_endpoint(year, &["events"])?)
      .send()
      .await
      .context("GET /events failed")?;
    check(resp, "GET /events")?.json().await.context("deserialising events")
  }

  /// `PUT /api/years/:year/events`
  pub async fn add_event(&self, year: i32, event: &NewEvent) -> Result<PlannerEvent> {
    let body = json!({
      "title":       event.title,
      "date":        event.date,
      "poName":      event.po_name,
      "awbBlName":   event.reference,
      "category":    event.category,
      "description": event.description,
    });
    let resp = self
      .client
      .put(self.year_endpoint(year, &["events"])?)
      .json(&body)
      .send()
      .await
      .context("PUT /events failed")?;
    check(resp, "PUT /events")?.json().await.context("deserialising event")
  }

  /// `DELETE /api/years/:year/events/:id`
  pub async fn delete_event(&self, year: i32, id: &str) -> Result<()> {
    let resp = self
      .client
      .delete(self.year_endpoint(year, &["events", id])?)
      .send()
      .await
      .context("DELETE /events failed")?;
    check(resp, "DELETE /events")?;
    Ok(())
  }

  // ── Registry ──────────────────────────────────────────────────────────────

  /// `GET /api/years/:year/registry[?q=<filter>]`
  pub async fn registry(&self, year: i32, filter: Option<&str>) -> Result<Vec<RegistryRow>> {
    let mut req = self.client.get(self.year_endpoint(year, &["registry"])?);
    if let Some(q) = filter {
      req = req.query(&[("q", q)]);
    }
    let resp = req.send().await.context("GET /registry failed")?;
    check(resp, "GET /registry")?.json().await.context("deserialising registry")
  }

  /// `GET /api/years/:year/registry/:po/phases`
  pub async fn phases(&self, year: i32, po: &str) -> Result<Vec<Phase>> {
    let resp = self
      .client
      .get(self.year_endpoint(year, &["registry", po, "phases"])?)
      .send()
      .await
      .context("GET /phases failed")?;
    check(resp, "GET /phases")?.json().await.context("deserialising phases")
  }

  /// `POST /api/years/:year/registry/:po/milestones`
  pub async fn append_milestone(
    &self,
    year: i32,
    po: &str,
    category: Category,
    date: Option<NaiveDate>,
    reference: Option<&str>,
  ) -> Result<Option<PlannerEvent>> {
    let resp = self
      .client
      .post(self.year_endpoint(year, &["registry", po, "milestones"])?)
      .json(&json!({ "category": category, "date": date, "awbBlName": reference }))
      .send()
      .await
      .context("POST /milestones failed")?;
    check(resp, "POST /milestones")?.json().await.context("deserialising milestone")
  }

  /// `PATCH /api/years/:year/registry/:po`
  pub async fn edit_registry(&self, year: i32, po: &str, edit: &RegistryEdit) -> Result<usize> {
    let resp = self
      .client
      .patch(self.year_endpoint(year, &["registry", po])?)
      .json(edit)
      .send()
      .await
      .context("PATCH /registry failed")?;
    let outcome: EditOutcome =
      check(resp, "PATCH /registry")?.json().await.context("deserialising edit outcome")?;
    Ok(outcome.updated)
  }

  /// `GET /api/years/:year/registry.csv`
  pub async fn export_csv(&self, year: i32) -> Result<String> {
    let resp = self
      .client
      .get(self.year_endpoint(year, &["registry.csv"])?)
      .send()
      .await
      .context("GET /registry.csv failed")?;
    check(resp, "GET /registry.csv")?.text().await.context("reading CSV body")
  }

  // ── Suggestions ───────────────────────────────────────────────────────────

  /// `POST /api/years/:year/suggestions`. Any failure, including an
  /// unreachable server, yields an empty batch.
  pub async fn suggest(&self, year: i32, prompt: &str) -> Vec<PlannerEvent> {
    match self.try_suggest(year, prompt).await {
      Ok(events) => events,
      Err(e) => {
        tracing::error!(error = %e, year, "suggestion request failed");
        Vec::new()
      }
    }
  }

  async fn try_suggest(&self, year: i32, prompt: &str) -> Result<Vec<PlannerEvent>> {
    let resp = self
      .client
      .post(self.year_endpoint(year, &["suggestions"])?)
      .json(&json!({ "prompt": prompt }))
      .send()
      .await
      .context("POST /suggestions failed")?;
    check(resp, "POST /suggestions")?.json().await.context("deserialising suggestions")
  }
}

fn check(resp: Response, what: &str) -> Result<Response> {
  if resp.status().is_success() {
    Ok(resp)
  } else {
    Err(anyhow!("{what} → {}", resp.status()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(base: &str) -> ApiClient {
    ApiClient::new(ApiConfig { base_url: base.into() }).unwrap()
  }

  #[test]
  fn endpoint_prefixes_api_and_encodes_segments() {
    let c = client("http://localhost:8080");
    let url = c.endpoint(&["years", "2024", "registry", "PO 7/A", "phases"]).unwrap();
    assert_eq!(url.as_str(), "http://localhost:8080/api/years/2024/registry/PO%207%2FA/phases");
  }

  #[test]
  fn endpoint_keeps_base_path() {
    let c = client("http://example.com/planner/");
    let url = c.year_endpoint(2025, &["events"]).unwrap();
    assert_eq!(url.as_str(), "http://example.com/planner/api/years/2025/events");
  }

  #[test]
  fn invalid_base_url_is_an_error() {
    assert!(client("not a url").endpoint(&["generate"]).is_err());
  }

  #[tokio::test]
  async fn unreachable_server_yields_no_suggestions() {
    let c = client("http://127.0.0.1:9");
    assert!(c.suggest(2024, "anything").await.is_empty());
  }

  #[test]
  fn registry_row_decodes_flattened_entry() {
    let raw = r#"{
      "poName": "PO-1", "awbBlName": "PENDING",
      "events": [{"id":"a","title":"Start","date":"2024-01-02","poName":"PO-1","category":"local_process"}],
      "startDate": "2024-01-02", "latestDate": "2024-01-02",
      "currentStatus": "local_process", "asOf": "2024-02-01",
      "elapsedDays": 30, "aging": "warning"
    }"#;
    let row: RegistryRow = serde_json::from_str(raw).unwrap();
    assert_eq!(row.entry.po_name, "PO-1");
    assert_eq!(row.entry.events.len(), 1);
    assert_eq!(row.elapsed_days, 30);
    assert_eq!(row.aging, AgingTier::Warning);
  }
}
