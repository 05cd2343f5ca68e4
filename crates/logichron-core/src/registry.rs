//! The PO registry: the computed read model over the milestone log.
//!
//! Nothing here is stored. [`build_registry`] groups the flat event list by
//! PO on every call, and every metric on [`RegistryEntry`] is a pure function
//! of the entry and the date it was built for.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::event::{Category, EventId, PENDING_REFERENCE, PlannerEvent};

/// Elapsed days above which a PO is [`AgingTier::Warning`].
pub const WARNING_AFTER_DAYS: i64 = 14;

/// Elapsed days above which a PO is [`AgingTier::Critical`].
pub const CRITICAL_AFTER_DAYS: i64 = 30;

/// Signed whole days from `from` to `to`.
pub fn days_between(to: NaiveDate, from: NaiveDate) -> i64 { (to - from).num_days() }

// ─── Entry ───────────────────────────────────────────────────────────────────

/// The derived summary of one PO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
  pub po_name:        String,
  /// First real AWB/BL reference in arrival order, or `PENDING`.
  pub awb_bl_name:    String,
  /// Every event of the group, in arrival order.
  pub events:         Vec<PlannerEvent>,
  pub start_date:     NaiveDate,
  pub latest_date:    NaiveDate,
  pub current_status: Category,
  /// The "today" this entry was materialised for.
  pub as_of:          NaiveDate,
}

/// How long a PO has been open, bucketed for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgingTier {
  Normal,
  Warning,
  Critical,
}

impl AgingTier {
  pub fn for_days(days: i64) -> Self {
    if days > CRITICAL_AFTER_DAYS {
      Self::Critical
    } else if days > WARNING_AFTER_DAYS {
      Self::Warning
    } else {
      Self::Normal
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Normal => "normal",
      Self::Warning => "warning",
      Self::Critical => "critical",
    }
  }
}

/// One stretch of a PO's lifecycle spent in a single category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
  pub event_id: EventId,
  pub title:    String,
  pub category: Category,
  pub start:    NaiveDate,
  /// The next milestone's date, or `as_of` for the final phase.
  pub end:      NaiveDate,
  pub days:     i64,
  /// `true` for the final phase, which runs until today.
  pub ongoing:  bool,
}

impl RegistryEntry {
  /// Days since the PO started; future start dates clamp to zero.
  pub fn elapsed_days(&self) -> i64 { days_between(self.as_of, self.start_date).max(0) }

  pub fn aging(&self) -> AgingTier { AgingTier::for_days(self.elapsed_days()) }

  /// The group's events sorted by date. The sort is stable, so same-day
  /// events keep arrival order.
  pub fn chronological(&self) -> Vec<&PlannerEvent> {
    let mut sorted: Vec<&PlannerEvent> = self.events.iter().collect();
    sorted.sort_by_key(|e| e.date);
    sorted
  }

  /// Phase-duration breakdown for the audit log. Durations are not clamped,
  /// so they always sum to `as_of - start_date`.
  pub fn phases(&self) -> Vec<Phase> {
    let sorted = self.chronological();
    sorted
      .iter()
      .enumerate()
      .map(|(i, ev)| {
        let next = sorted.get(i + 1);
        let end = next.map_or(self.as_of, |n| n.date);
        Phase {
          event_id: ev.id.clone(),
          title:    ev.title.clone(),
          category: ev.category,
          start:    ev.date,
          end,
          days:     days_between(end, ev.date),
          ongoing:  next.is_none(),
        }
      })
      .collect()
  }

  /// Events falling on `date`, i.e. one cell of the year grid.
  pub fn events_on(&self, date: NaiveDate) -> impl Iterator<Item = &PlannerEvent> {
    self.events.iter().filter(move |e| e.date == date)
  }

  fn matches(&self, needle: &str) -> bool {
    self.po_name.to_lowercase().contains(needle)
      || self.awb_bl_name.to_lowercase().contains(needle)
  }
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

struct Group<'a> {
  po_name:   &'a str,
  reference: Option<&'a str>,
  events:    Vec<&'a PlannerEvent>,
}

/// Derive one [`RegistryEntry`] per PO from the flat event list.
///
/// - Groups by [`PlannerEvent::po_key`].
/// - `current_status` is the category of the latest-dated event; when several
///   share that date, the one that arrived last wins.
/// - `filter`, when non-empty, keeps entries whose PO name or reference
///   contains it, case-insensitively.
/// - Output is ordered by `start_date`; ties keep first-appearance order.
pub fn build_registry(
  events: &[PlannerEvent],
  today: NaiveDate,
  filter: Option<&str>,
) -> Vec<RegistryEntry> {
  let mut index: HashMap<&str, usize> = HashMap::new();
  let mut groups: Vec<Group<'_>> = Vec::new();

  for ev in events {
    let key = ev.po_key();
    let slot = *index.entry(key).or_insert_with(|| {
      groups.push(Group { po_name: key, reference: None, events: Vec::new() });
      groups.len() - 1
    });
    let group = &mut groups[slot];
    if group.reference.is_none() {
      group.reference = ev.reference();
    }
    group.events.push(ev);
  }

  let needle = filter.filter(|f| !f.is_empty()).map(str::to_lowercase);

  let mut entries: Vec<RegistryEntry> = groups
    .into_iter()
    .filter_map(|g| materialize(g, today))
    .filter(|entry| needle.as_deref().is_none_or(|n| entry.matches(n)))
    .collect();

  entries.sort_by_key(|e| e.start_date);
  tracing::debug!(events = events.len(), entries = entries.len(), "built registry");
  entries
}

fn materialize(group: Group<'_>, today: NaiveDate) -> Option<RegistryEntry> {
  let start_date = group.events.iter().map(|e| e.date).min()?;
  // `max_by_key` yields the last of equal maxima: the latest arrival wins.
  let latest = group.events.iter().max_by_key(|e| e.date)?;

  Some(RegistryEntry {
    po_name: group.po_name.to_owned(),
    awb_bl_name: group.reference.unwrap_or(PENDING_REFERENCE).to_owned(),
    start_date,
    latest_date: latest.date,
    current_status: latest.category,
    events: group.events.into_iter().cloned().collect(),
    as_of: today,
  })
}

/// Look up one PO's entry without filtering.
pub fn find_entry(
  events: &[PlannerEvent],
  today: NaiveDate,
  po_name: &str,
) -> Option<RegistryEntry> {
  build_registry(events, today, None)
    .into_iter()
    .find(|e| e.po_name == po_name)
}
