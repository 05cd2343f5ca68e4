//! [`GeminiGenerator`]: suggestion generation via the Gemini
//! `generateContent` REST endpoint.
//!
//! The model is asked for JSON matching a fixed response schema. Its text
//! output is parsed leniently: anything that is not a JSON array of
//! candidates becomes an empty batch, not an error.

use std::time::Duration;

use logichron_core::suggest::{Generator, SuggestionCandidate, SuggestionRequest};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

// ─── Configuration ────────────────────────────────────────────────────────────

/// `[gemini]` section of the server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
  /// Required for any call to succeed; an empty key fails every request.
  #[serde(default)]
  pub api_key:      String,
  #[serde(default = "default_model")]
  pub model:        String,
  #[serde(default = "default_base_url")]
  pub base_url:     String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_model() -> String { "gemini-3-flash-preview".to_string() }

fn default_base_url() -> String { "https://generativelanguage.googleapis.com".to_string() }

fn default_timeout_secs() -> u64 { 60 }

impl Default for GeminiConfig {
  fn default() -> Self {
    Self {
      api_key:      String::new(),
      model:        default_model(),
      base_url:     default_base_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum GeminiError {
  #[error("no Gemini API key configured")]
  MissingApiKey,

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("gemini returned {status}: {body}")]
  Status { status: u16, body: String },
}

// ─── Generator ────────────────────────────────────────────────────────────────

/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct GeminiGenerator {
  client: Client,
  config: GeminiConfig,
}

impl GeminiGenerator {
  pub fn new(config: GeminiConfig) -> Result<Self, GeminiError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self) -> String {
    format!(
      "{}/v1beta/models/{}:generateContent",
      self.config.base_url.trim_end_matches('/'),
      self.config.model
    )
  }
}

impl Generator for GeminiGenerator {
  type Error = GeminiError;

  async fn generate(
    &self,
    request: &SuggestionRequest,
  ) -> Result<Vec<SuggestionCandidate>, GeminiError> {
    if self.config.api_key.is_empty() {
      return Err(GeminiError::MissingApiKey);
    }

    let resp = self
      .client
      .post(self.url())
      .header("x-goog-api-key", &self.config.api_key)
      .json(&request_body(request))
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(GeminiError::Status { status: status.as_u16(), body });
    }

    let value: Value = resp.json().await?;
    Ok(candidates_from_response(&value))
  }
}

/// The `generateContent` request: the instruction plus a response schema
/// pinning the output to an array of candidate events.
pub fn request_body(request: &SuggestionRequest) -> Value {
  json!({
    "contents": [{ "parts": [{ "text": request.instruction() }] }],
    "generationConfig": {
      "responseMimeType": "application/json",
      "responseSchema": {
        "type": "ARRAY",
        "items": {
          "type": "OBJECT",
          "properties": {
            "title":       { "type": "STRING" },
            "date":        { "type": "STRING", "description": "ISO date format YYYY-MM-DD" },
            "category":    { "type": "STRING" },
            "description": { "type": "STRING" }
          },
          "required": ["title", "date", "category"]
        }
      }
    }
  })
}

/// Pull the candidate array out of a `generateContent` response. Missing text
/// or unparsable JSON yields an empty batch.
pub fn candidates_from_response(response: &Value) -> Vec<SuggestionCandidate> {
  let text = response
    .pointer("/candidates/0/content/parts/0/text")
    .and_then(Value::as_str)
    .unwrap_or("[]");

  serde_json::from_str(text).unwrap_or_else(|e| {
    tracing::warn!(error = %e, "gemini output is not a candidate array");
    Vec::new()
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn wrap(text: &str) -> Value {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
  }

  #[test]
  fn parses_candidate_array_from_text_part() {
    let resp = wrap(
      r#"[{"title":"Kickoff","date":"2025-01-06","category":"local_process","description":"start"},
          {"title":"Ship","date":"2025-03-03","category":"delivery"}]"#,
    );
    let cands = candidates_from_response(&resp);
    assert_eq!(cands.len(), 2);
    assert_eq!(cands[0].description.as_deref(), Some("start"));
    assert_eq!(cands[1].category, "delivery");
  }

  #[test]
  fn unparsable_or_missing_text_is_empty() {
    assert!(candidates_from_response(&wrap("Sorry, I can't help with that.")).is_empty());
    assert!(candidates_from_response(&json!({ "candidates": [] })).is_empty());
    assert!(candidates_from_response(&wrap(r#"{"title":"not an array"}"#)).is_empty());
  }

  #[test]
  fn request_body_carries_instruction_and_schema() {
    let req = SuggestionRequest { prompt: "customs heavy".into(), year: 2025 };
    let body = request_body(&req);
    let text = body.pointer("/contents/0/parts/0/text").and_then(Value::as_str).unwrap();
    assert!(text.contains("2025") && text.contains("customs heavy"));
    assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");
    assert_eq!(
      body["generationConfig"]["responseSchema"]["items"]["required"],
      json!(["title", "date", "category"])
    );
  }

  #[test]
  fn url_joins_base_and_model() {
    let generator = GeminiGenerator::new(GeminiConfig {
      base_url: "http://localhost:9999/".into(),
      model: "test-model".into(),
      ..GeminiConfig::default()
    })
    .unwrap();
    assert_eq!(generator.url(), "http://localhost:9999/v1beta/models/test-model:generateContent");
  }

  #[tokio::test]
  async fn missing_key_fails_without_network() {
    let generator = GeminiGenerator::new(GeminiConfig::default()).unwrap();
    let req = SuggestionRequest { prompt: "x".into(), year: 2024 };
    assert!(matches!(generator.generate(&req).await, Err(GeminiError::MissingApiKey)));
  }
}
