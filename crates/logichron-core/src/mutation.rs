//! Editing rules over the flat milestone log.
//!
//! Every function here is a pure transform of a `Vec<PlannerEvent>`. Status
//! changes append; metadata corrections rewrite the group's events in place.
//! A target PO or id that no longer exists is a silent no-op.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  event::{Category, EventId, PlannerEvent, is_real_reference},
  registry::find_entry,
};

// ─── Upsert / remove ─────────────────────────────────────────────────────────

/// What [`upsert_event`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Upsert {
  Inserted,
  Replaced,
}

/// Append `event` to the log.
pub fn append_event(events: &mut Vec<PlannerEvent>, event: PlannerEvent) { events.push(event); }

/// Swap in `event` for the stored event with the same id. Returns `false` if
/// no such event exists.
pub fn replace_event(events: &mut [PlannerEvent], event: PlannerEvent) -> bool {
  match events.iter_mut().find(|e| e.id == event.id) {
    Some(slot) => {
      *slot = event;
      true
    }
    None => false,
  }
}

/// Replace by id if present, else append.
pub fn upsert_event(events: &mut Vec<PlannerEvent>, event: PlannerEvent) -> Upsert {
  if let Some(slot) = events.iter_mut().find(|e| e.id == event.id) {
    *slot = event;
    Upsert::Replaced
  } else {
    events.push(event);
    Upsert::Inserted
  }
}

/// Remove exactly one event by id.
pub fn remove_event(events: &mut Vec<PlannerEvent>, id: &EventId) -> Option<PlannerEvent> {
  let pos = events.iter().position(|e| &e.id == id)?;
  Some(events.remove(pos))
}

// ─── Milestones ──────────────────────────────────────────────────────────────

/// A status change to append to an existing PO.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMilestone {
  pub category:    Category,
  /// Defaults to today.
  #[serde(default)]
  pub date:        Option<NaiveDate>,
  /// Overrides the entry's reference when real.
  #[serde(default)]
  pub awb_bl_name: Option<String>,
}

impl NewMilestone {
  pub fn new(category: Category) -> Self { Self { category, date: None, awb_bl_name: None } }

  pub fn on(mut self, date: NaiveDate) -> Self {
    self.date = Some(date);
    self
  }

  pub fn with_reference(mut self, awb_bl_name: impl Into<String>) -> Self {
    self.awb_bl_name = Some(awb_bl_name.into());
    self
  }
}

/// Record that `po_name` entered `category` on `date` (default: `today`).
///
/// The new event inherits the PO's reference. Returns `None` without touching
/// the log if the PO has no events.
pub fn append_milestone(
  events: &mut Vec<PlannerEvent>,
  po_name: &str,
  milestone: &NewMilestone,
  today: NaiveDate,
) -> Option<PlannerEvent> {
  let entry = find_entry(events, today, po_name)?;

  let mut event = PlannerEvent::new(
    format!("{} Milestone", milestone.category.label()),
    milestone.date.unwrap_or(today),
    milestone.category,
  );
  event.po_name = events
    .iter()
    .find(|e| e.po_key() == po_name)
    .and_then(|e| e.po_name.clone());
  event.awb_bl_name = milestone
    .awb_bl_name
    .clone()
    .filter(|r| is_real_reference(r))
    .or_else(|| Some(entry.awb_bl_name).filter(|r| is_real_reference(r)));

  events.push(event.clone());
  Some(event)
}

/// Pre-fill an unsaved event for the "new entry" form.
///
/// With a known PO the draft carries its reference and current status;
/// otherwise it starts as a blank [`Category::LocalProcess`] entry.
pub fn draft_event(
  events: &[PlannerEvent],
  po_name: Option<&str>,
  date: Option<NaiveDate>,
  today: NaiveDate,
) -> PlannerEvent {
  let entry = po_name.and_then(|po| find_entry(events, today, po));
  let category = entry.as_ref().map_or(Category::LocalProcess, |e| e.current_status);

  let mut draft = PlannerEvent::new("", date.unwrap_or(today), category);
  draft.po_name = po_name.map(str::to_owned);
  draft.awb_bl_name = entry
    .map(|e| e.awb_bl_name)
    .filter(|r| is_real_reference(r));
  draft
}

// ─── Metadata edits ──────────────────────────────────────────────────────────

/// Corrections to a PO's registry row. Empty or absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEdit {
  pub po_name:     Option<String>,
  pub awb_bl_name: Option<String>,
  /// Moves only the event(s) currently on the PO's earliest date.
  pub start_date:  Option<NaiveDate>,
}

impl RegistryEdit {
  pub fn is_empty(&self) -> bool {
    self.po_name.as_deref().is_none_or(str::is_empty)
      && self.awb_bl_name.as_deref().is_none_or(str::is_empty)
      && self.start_date.is_none()
  }
}

/// Rewrite the events of `po_name` in place. Returns how many events changed.
pub fn edit_registry(
  events: &mut [PlannerEvent],
  po_name: &str,
  edit: &RegistryEdit,
) -> usize {
  let Some(earliest) = events
    .iter()
    .filter(|e| e.po_key() == po_name)
    .map(|e| e.date)
    .min()
  else {
    return 0;
  };

  let rename = edit.po_name.as_deref().filter(|s| !s.is_empty());
  let reference = edit.awb_bl_name.as_deref().filter(|s| !s.is_empty());

  let mut changed = 0;
  for ev in events.iter_mut().filter(|e| e.po_key() == po_name) {
    let before = ev.clone();
    if let Some(name) = rename {
      ev.po_name = Some(name.to_owned());
    }
    if let Some(r) = reference {
      ev.awb_bl_name = Some(r.to_owned());
    }
    if let Some(start) = edit.start_date
      && before.date == earliest
    {
      ev.date = start;
    }
    if *ev != before {
      changed += 1;
    }
  }
  changed
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{event::parse_date, registry::build_registry};

  fn d(s: &str) -> NaiveDate { parse_date(s).unwrap() }

  fn log() -> Vec<PlannerEvent> {
    vec![
      PlannerEvent::new("start", d("2024-01-10"), Category::LocalProcess)
        .with_po("PO-1")
        .with_reference("BL-1"),
      PlannerEvent::new("tec", d("2024-01-15"), Category::TecProcessing).with_po("PO-1"),
      PlannerEvent::new("other", d("2024-01-12"), Category::LocalProcess).with_po("PO-2"),
    ]
  }

  #[test]
  fn append_milestone_adds_exactly_one_event() {
    let mut events = log();
    let before = events.clone();
    let today = d("2024-02-01");

    let m = NewMilestone::new(Category::CustomsClearance).on(d("2024-01-25"));
    let added = append_milestone(&mut events, "PO-1", &m, today).unwrap();

    assert_eq!(events.len(), before.len() + 1);
    assert_eq!(&events[..before.len()], &before[..]);
    assert_eq!(added.title, "CC Processing Milestone");
    assert_eq!(added.po_name.as_deref(), Some("PO-1"));
    assert_eq!(added.awb_bl_name.as_deref(), Some("BL-1"));
    assert_eq!(added.date, d("2024-01-25"));

    let reg = build_registry(&events, today, None);
    let po1 = reg.iter().find(|e| e.po_name == "PO-1").unwrap();
    assert_eq!(po1.current_status, Category::CustomsClearance);
  }

  #[test]
  fn append_milestone_defaults_to_today() {
    let mut events = log();
    let today = d("2024-02-01");
    let added = append_milestone(&mut events, "PO-2", &NewMilestone::new(Category::Delivery), today).unwrap();
    assert_eq!(added.date, today);
    assert_eq!(added.awb_bl_name, None);
  }

  #[test]
  fn append_milestone_reference_override() {
    let mut events = log();
    let today = d("2024-02-01");
    let m = NewMilestone::new(Category::Delivery).with_reference("AWB-9");
    assert_eq!(append_milestone(&mut events, "PO-1", &m, today).unwrap().awb_bl_name.as_deref(), Some("AWB-9"));

    let placeholder = NewMilestone::new(Category::Delivery).with_reference("N/A");
    let added = append_milestone(&mut events, "PO-1", &placeholder, today).unwrap();
    assert_eq!(added.awb_bl_name.as_deref(), Some("BL-1"));
  }

  #[test]
  fn append_milestone_on_missing_po_is_noop() {
    let mut events = log();
    let before = events.clone();
    assert!(append_milestone(&mut events, "PO-404", &NewMilestone::new(Category::Delivery), d("2024-02-01")).is_none());
    assert_eq!(events, before);
  }

  #[test]
  fn append_milestone_to_unassigned_group_keeps_it_unassigned() {
    let mut events = vec![PlannerEvent::new("loose", d("2024-01-01"), Category::LocalProcess)];
    let added =
      append_milestone(&mut events, "UNASSIGNED", &NewMilestone::new(Category::Delivery), d("2024-01-05")).unwrap();
    assert_eq!(added.po_key(), "UNASSIGNED");
    assert_eq!(build_registry(&events, d("2024-01-05"), None).len(), 1);
  }

  #[test]
  fn start_date_edit_moves_only_earliest_events() {
    let mut events = log();
    events.push(PlannerEvent::new("same day", d("2024-01-10"), Category::TecProcessing).with_po("PO-1"));

    let edit = RegistryEdit { start_date: Some(d("2024-01-05")), ..Default::default() };
    assert_eq!(edit_registry(&mut events, "PO-1", &edit), 2);

    assert_eq!(events[0].date, d("2024-01-05"));
    assert_eq!(events[1].date, d("2024-01-15"));
    assert_eq!(events[2].date, d("2024-01-12"));
    assert_eq!(events[3].date, d("2024-01-05"));
  }

  #[test]
  fn rename_and_reference_rewrite_whole_group() {
    let mut events = log();
    let edit = RegistryEdit {
      po_name:     Some("PO-1A".into()),
      awb_bl_name: Some("MAEU-9".into()),
      start_date:  None,
    };
    assert_eq!(edit_registry(&mut events, "PO-1", &edit), 2);
    let reg = build_registry(&events, d("2024-02-01"), None);
    assert!(reg.iter().all(|e| e.po_name != "PO-1"));
    let renamed = reg.iter().find(|e| e.po_name == "PO-1A").unwrap();
    assert_eq!(renamed.awb_bl_name, "MAEU-9");
    assert_eq!(renamed.events.len(), 2);
    assert_eq!(events[2].po_name.as_deref(), Some("PO-2"));
  }

  #[test]
  fn empty_edit_fields_are_ignored() {
    let mut events = log();
    let before = events.clone();
    let edit = RegistryEdit { po_name: Some(String::new()), awb_bl_name: Some(String::new()), start_date: None };
    assert!(edit.is_empty());
    assert_eq!(edit_registry(&mut events, "PO-1", &edit), 0);
    assert_eq!(events, before);
  }

  #[test]
  fn edit_of_missing_po_is_noop() {
    let mut events = log();
    let before = events.clone();
    let edit = RegistryEdit { po_name: Some("X".into()), ..Default::default() };
    assert_eq!(edit_registry(&mut events, "PO-404", &edit), 0);
    assert_eq!(events, before);
  }

  #[test]
  fn removing_last_event_drops_the_entry() {
    let mut events = log();
    let id = events[2].id.clone();
    assert!(remove_event(&mut events, &id).is_some());
    assert!(remove_event(&mut events, &id).is_none());
    let reg = build_registry(&events, d("2024-02-01"), None);
    assert!(reg.iter().all(|e| e.po_name != "PO-2"));
  }

  #[test]
  fn upsert_replaces_by_id_or_appends() {
    let mut events = log();
    let mut changed = events[1].clone();
    changed.title = "renamed".into();
    assert_eq!(upsert_event(&mut events, changed), Upsert::Replaced);
    assert_eq!(events[1].title, "renamed");

    let fresh = PlannerEvent::new("new", d("2024-01-20"), Category::Delivery);
    assert_eq!(upsert_event(&mut events, fresh), Upsert::Inserted);
    assert_eq!(events.len(), 4);
  }

  #[test]
  fn replace_of_unknown_id_is_noop() {
    let mut events = log();
    let stranger = PlannerEvent::new("x", d("2024-01-01"), Category::Delivery);
    assert!(!replace_event(&mut events, stranger));
    assert_eq!(events.len(), 3);
  }

  #[test]
  fn draft_prefills_from_known_po() {
    let events = log();
    let draft = draft_event(&events, Some("PO-1"), None, d("2024-02-01"));
    assert_eq!(draft.category, Category::TecProcessing);
    assert_eq!(draft.awb_bl_name.as_deref(), Some("BL-1"));
    assert_eq!(draft.date, d("2024-02-01"));

    let blank = draft_event(&events, None, Some(d("2024-03-03")), d("2024-02-01"));
    assert_eq!(blank.category, Category::LocalProcess);
    assert_eq!(blank.po_name, None);
    assert_eq!(blank.awb_bl_name, None);
    assert_eq!(blank.date, d("2024-03-03"));
  }
}
