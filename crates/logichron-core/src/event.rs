//! Milestone events, the fundamental unit of the planner.
//!
//! An event records that a purchase order entered a phase on a calendar date.
//! The full planning year is a flat, unordered list of these; every PO view is
//! derived from that list at read time.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

/// Group key for events that carry no PO name.
pub const UNASSIGNED_PO: &str = "UNASSIGNED";

/// Displayed reference for a PO whose AWB/BL number is not yet known.
pub const PENDING_REFERENCE: &str = "PENDING";

/// Reference values that mean "not known yet" rather than a real AWB/BL.
const PLACEHOLDER_REFERENCES: [&str; 2] = [PENDING_REFERENCE, "N/A"];

// ─── Category ────────────────────────────────────────────────────────────────

/// The milestone phase an event marks. Declaration order follows the
/// shipment lifecycle; nothing in the registry relies on it.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
  LocalProcess,
  TecProcessing,
  TecApproved,
  CustomsClearance,
  Delivery,
}

/// Display attributes for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryStyle {
  pub label:  &'static str,
  /// CSS hex colour used for grid cells and status pills.
  pub colour: &'static str,
}

/// Indexed by declaration order of [`Category`].
const STYLES: [CategoryStyle; 5] = [
  CategoryStyle { label: "Local Process",  colour: "#ef4444" },
  CategoryStyle { label: "TEC Processing", colour: "#8b4513" },
  CategoryStyle { label: "Approved TEC",   colour: "#22c55e" },
  CategoryStyle { label: "CC Processing",  colour: "#2563eb" },
  CategoryStyle { label: "Delivery",       colour: "#6b7280" },
];

impl Category {
  /// Every category, in lifecycle order.
  pub const ALL: [Category; 5] = [
    Self::LocalProcess,
    Self::TecProcessing,
    Self::TecApproved,
    Self::CustomsClearance,
    Self::Delivery,
  ];

  /// The wire name, e.g. `"customs_clearance"`.
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn style(self) -> CategoryStyle { STYLES[self as usize] }

  pub fn label(self) -> &'static str { self.style().label }

  /// Parse a wire name strictly.
  pub fn parse(s: &str) -> Result<Self> {
    s.parse::<Self>().map_err(|_| Error::UnknownCategory(s.to_owned()))
  }

  /// Lenient parse for untrusted input: accepts wire names in any case, with
  /// spaces or hyphens for underscores, and display labels.
  pub fn coerce(s: &str) -> Result<Self> {
    let trimmed = s.trim();
    let snake = trimmed.to_ascii_lowercase().replace([' ', '-'], "_");
    if let Ok(c) = snake.parse::<Self>() {
      return Ok(c);
    }
    Self::ALL
      .into_iter()
      .find(|c| c.label().eq_ignore_ascii_case(trimmed))
      .ok_or_else(|| Error::UnknownCategory(s.to_owned()))
  }
}

// ─── EventId ─────────────────────────────────────────────────────────────────

/// Opaque event identifier. Never reused once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
  pub fn generate() -> Self { Self(Uuid::new_v4().simple().to_string()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for EventId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for EventId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for EventId {
  fn from(s: String) -> Self { Self(s) }
}

// ─── PlannerEvent ────────────────────────────────────────────────────────────

/// One dated milestone. Field names match the persisted record exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerEvent {
  pub id:          EventId,
  #[serde(default)]
  pub title:       String,
  pub date:        NaiveDate,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub po_name:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub awb_bl_name: Option<String>,
  pub category:    Category,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

impl PlannerEvent {
  /// A fresh event with a generated id and no PO, reference or description.
  pub fn new(title: impl Into<String>, date: NaiveDate, category: Category) -> Self {
    Self {
      id: EventId::generate(),
      title: title.into(),
      date,
      po_name: None,
      awb_bl_name: None,
      category,
      description: None,
    }
  }

  pub fn with_po(mut self, po_name: impl Into<String>) -> Self {
    self.po_name = Some(po_name.into());
    self
  }

  pub fn with_reference(mut self, awb_bl_name: impl Into<String>) -> Self {
    self.awb_bl_name = Some(awb_bl_name.into());
    self
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  /// The registry group this event belongs to; empty names fall into
  /// [`UNASSIGNED_PO`].
  pub fn po_key(&self) -> &str {
    match self.po_name.as_deref() {
      Some(name) if !name.is_empty() => name,
      _ => UNASSIGNED_PO,
    }
  }

  /// The AWB/BL reference if it is a real one.
  pub fn reference(&self) -> Option<&str> {
    self.awb_bl_name.as_deref().filter(|r| is_real_reference(r))
  }
}

/// `false` for empty strings and the "not known yet" placeholders.
pub fn is_real_reference(reference: &str) -> bool {
  !reference.is_empty() && !PLACEHOLDER_REFERENCES.contains(&reference)
}

/// Parse a `YYYY-MM-DD` date; a trailing time component (`T...`) is ignored.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
  let day = s.trim().split('T').next().unwrap_or_default();
  NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| Error::InvalidDate(s.to_owned()))
}
