//! [`Planner`]: the application state for one open planning year.
//!
//! The planner owns the in-memory milestone log for its year and is the only
//! path through which the log changes: every mutation edits the log and then
//! saves the whole year. Reads never fail. A store that errors on load yields
//! an empty year; a store that errors on save is logged and otherwise ignored.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
  event::{EventId, PlannerEvent},
  mutation::{self, NewMilestone, RegistryEdit, Upsert},
  registry::{RegistryEntry, build_registry, find_entry},
  store::EventStore,
  suggest::{SuggestionCandidate, coerce_candidates},
};

/// Identifies the planner state a suggestion request was issued against.
/// Responses carrying a ticket from an earlier state are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionTicket {
  year:  i32,
  epoch: u64,
}

impl SuggestionTicket {
  pub fn year(&self) -> i32 { self.year }
}

/// The open year plus its events, backed by a store.
pub struct Planner<S> {
  store:  Arc<S>,
  year:   i32,
  events: Vec<PlannerEvent>,
  /// Bumped whenever the log is reloaded; invalidates outstanding tickets.
  epoch:  u64,
}

impl<S: EventStore> Planner<S> {
  /// Open `year`, loading whatever the store holds for it.
  pub async fn open(store: Arc<S>, year: i32) -> Self {
    let events = load_or_empty(store.as_ref(), year).await;
    Self { store, year, events, epoch: 0 }
  }

  pub fn year(&self) -> i32 { self.year }

  pub fn events(&self) -> &[PlannerEvent] { &self.events }

  pub fn event(&self, id: &EventId) -> Option<&PlannerEvent> {
    self.events.iter().find(|e| &e.id == id)
  }

  /// Discard the in-memory log and load `year` fresh.
  pub async fn switch_year(&mut self, year: i32) {
    self.events = load_or_empty(self.store.as_ref(), year).await;
    self.year = year;
    self.epoch += 1;
    tracing::info!(year, events = self.events.len(), "switched planning year");
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub fn registry(&self, today: NaiveDate, filter: Option<&str>) -> Vec<RegistryEntry> {
    build_registry(&self.events, today, filter)
  }

  pub fn entry(&self, today: NaiveDate, po_name: &str) -> Option<RegistryEntry> {
    find_entry(&self.events, today, po_name)
  }

  /// A pre-filled, unsaved event for the "new entry" form.
  pub fn draft(&self, po_name: Option<&str>, date: Option<NaiveDate>, today: NaiveDate) -> PlannerEvent {
    mutation::draft_event(&self.events, po_name, date, today)
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  pub async fn append(&mut self, event: PlannerEvent) {
    mutation::append_event(&mut self.events, event);
    self.persist().await;
  }

  /// Returns `false` (and writes nothing) if no event has `event.id`.
  pub async fn replace(&mut self, event: PlannerEvent) -> bool {
    let replaced = mutation::replace_event(&mut self.events, event);
    if replaced {
      self.persist().await;
    }
    replaced
  }

  pub async fn upsert(&mut self, event: PlannerEvent) -> Upsert {
    let outcome = mutation::upsert_event(&mut self.events, event);
    self.persist().await;
    outcome
  }

  pub async fn remove(&mut self, id: &EventId) -> Option<PlannerEvent> {
    let removed = mutation::remove_event(&mut self.events, id)?;
    self.persist().await;
    Some(removed)
  }

  pub async fn append_milestone(
    &mut self,
    po_name: &str,
    milestone: &NewMilestone,
    today: NaiveDate,
  ) -> Option<PlannerEvent> {
    let added = mutation::append_milestone(&mut self.events, po_name, milestone, today);
    match &added {
      Some(_) => self.persist().await,
      None => tracing::debug!(po_name, "milestone for unknown PO ignored"),
    }
    added
  }

  /// Returns how many events were rewritten.
  pub async fn edit_registry(&mut self, po_name: &str, edit: &RegistryEdit) -> usize {
    let changed = mutation::edit_registry(&mut self.events, po_name, edit);
    if changed > 0 {
      self.persist().await;
    }
    changed
  }

  // ── Suggestions ───────────────────────────────────────────────────────────

  /// Take a ticket before issuing a suggestion request.
  pub fn suggestion_ticket(&self) -> SuggestionTicket {
    SuggestionTicket { year: self.year, epoch: self.epoch }
  }

  /// Batch-append the valid candidates of one suggestion response. A stale
  /// ticket merges nothing. The year is re-read from the store first, so
  /// writes made elsewhere while the request was in flight are kept.
  pub async fn merge_suggestions(
    &mut self,
    ticket: SuggestionTicket,
    candidates: Vec<SuggestionCandidate>,
  ) -> Vec<PlannerEvent> {
    if ticket != self.suggestion_ticket() {
      tracing::warn!(
        ticket_year = ticket.year,
        year = self.year,
        "discarding suggestions issued against an earlier planner state"
      );
      return Vec::new();
    }
    let accepted = coerce_candidates(candidates);
    if !accepted.is_empty() {
      self.refresh().await;
      self.events.extend(accepted.iter().cloned());
      self.persist().await;
    }
    accepted
  }

  /// Reload the open year in place. A year the store has never saved, or
  /// one it cannot read, keeps the in-memory log.
  async fn refresh(&mut self) {
    match self.store.load(self.year).await {
      Ok(Some(events)) => self.events = events,
      Ok(None) => {}
      Err(e) => {
        tracing::warn!(year = self.year, error = %e, "could not re-read planning year; merging into loaded log");
      }
    }
  }

  async fn persist(&self) {
    if let Err(e) = self.store.save(self.year, &self.events).await {
      tracing::error!(year = self.year, error = %e, "failed to save planning year");
    }
  }
}

async fn load_or_empty<S: EventStore>(store: &S, year: i32) -> Vec<PlannerEvent> {
  match store.load(year).await {
    Ok(Some(events)) => events,
    Ok(None) => Vec::new(),
    Err(e) => {
      tracing::warn!(year, error = %e, "stored planning year unreadable; starting empty");
      Vec::new()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    event::{Category, parse_date},
    store::MemoryStore,
  };

  fn d(s: &str) -> NaiveDate { parse_date(s).unwrap() }

  /// A store whose writes always fail.
  struct ReadOnlyStore(MemoryStore);

  #[derive(Debug, thiserror::Error)]
  #[error("read-only")]
  struct ReadOnly;

  impl EventStore for ReadOnlyStore {
    type Error = ReadOnly;

    async fn load(&self, year: i32) -> Result<Option<Vec<PlannerEvent>>, ReadOnly> {
      self.0.load(year).await.map_err(|_| ReadOnly)
    }

    async fn save(&self, _year: i32, _events: &[PlannerEvent]) -> Result<(), ReadOnly> {
      Err(ReadOnly)
    }
  }

  fn candidate(date: &str, category: &str) -> SuggestionCandidate {
    SuggestionCandidate {
      title:       "suggested".into(),
      date:        date.into(),
      category:    category.into(),
      description: Some("from the generator".into()),
    }
  }

  #[tokio::test]
  async fn mutations_persist_the_whole_year() {
    let store = Arc::new(MemoryStore::new());
    let mut planner = Planner::open(store.clone(), 2024).await;
    assert!(planner.events().is_empty());

    let ev = PlannerEvent::new("start", d("2024-01-10"), Category::LocalProcess).with_po("PO-1");
    planner.append(ev.clone()).await;
    planner
      .append_milestone("PO-1", &NewMilestone::new(Category::CustomsClearance).on(d("2024-01-20")), d("2024-02-01"))
      .await
      .unwrap();

    let reopened = Planner::open(store, 2024).await;
    assert_eq!(reopened.events().len(), 2);
    let reg = reopened.registry(d("2024-02-01"), None);
    assert_eq!(reg[0].current_status, Category::CustomsClearance);
    assert_eq!(reg[0].elapsed_days(), 22);
  }

  #[tokio::test]
  async fn corrupt_year_opens_empty() {
    let store = Arc::new(MemoryStore::new());
    store.insert_raw(2024, "[{\"id\": 3}]");
    let planner = Planner::open(store, 2024).await;
    assert!(planner.events().is_empty());
  }

  #[tokio::test]
  async fn failed_save_keeps_in_memory_state() {
    let store = Arc::new(ReadOnlyStore(MemoryStore::new()));
    let mut planner = Planner::open(store, 2024).await;
    planner
      .append(PlannerEvent::new("x", d("2024-03-01"), Category::Delivery).with_po("PO-5"))
      .await;
    assert_eq!(planner.registry(d("2024-03-02"), None).len(), 1);
  }

  #[tokio::test]
  async fn noop_mutations_do_not_write() {
    let store = Arc::new(MemoryStore::new());
    let mut planner = Planner::open(store.clone(), 2024).await;
    assert!(planner.remove(&EventId::from("missing")).await.is_none());
    assert_eq!(planner.edit_registry("PO-404", &RegistryEdit::default()).await, 0);
    assert!(planner.append_milestone("PO-404", &NewMilestone::new(Category::Delivery), d("2024-01-01")).await.is_none());
    assert!(store.raw(2024).is_none());
  }

  #[tokio::test]
  async fn switching_year_discards_and_reloads() {
    let store = Arc::new(MemoryStore::new());
    let mut planner = Planner::open(store.clone(), 2024).await;
    planner.append(PlannerEvent::new("a", d("2024-01-01"), Category::LocalProcess)).await;

    planner.switch_year(2025).await;
    assert_eq!(planner.year(), 2025);
    assert!(planner.events().is_empty());

    planner.switch_year(2024).await;
    assert_eq!(planner.events().len(), 1);
  }

  #[tokio::test]
  async fn two_pending_suggestion_batches_both_merge() {
    let store = Arc::new(MemoryStore::new());
    let mut planner = Planner::open(store, 2024).await;
    let first = planner.suggestion_ticket();
    let second = planner.suggestion_ticket();

    let a = planner.merge_suggestions(first, vec![candidate("2024-02-01", "delivery")]).await;
    let b = planner
      .merge_suggestions(second, vec![candidate("2024-03-01", "tec_approved"), candidate("2024-03-02", "lunch")])
      .await;

    assert_eq!(a.len(), 1);
    assert_eq!(b.len(), 1);
    assert_eq!(planner.events().len(), 2);
  }

  #[tokio::test]
  async fn stale_suggestions_after_year_switch_are_discarded() {
    let store = Arc::new(MemoryStore::new());
    let mut planner = Planner::open(store.clone(), 2024).await;
    let ticket = planner.suggestion_ticket();
    assert_eq!(ticket.year(), 2024);

    planner.switch_year(2025).await;
    let merged = planner.merge_suggestions(ticket, vec![candidate("2024-02-01", "delivery")]).await;

    assert!(merged.is_empty());
    assert!(planner.events().is_empty());
    assert!(store.raw(2025).is_none());
  }

  #[tokio::test]
  async fn merge_keeps_writes_made_while_generating() {
    let store = Arc::new(MemoryStore::new());
    let mut planner = Planner::open(store.clone(), 2024).await;
    planner.append(PlannerEvent::new("mine", d("2024-01-05"), Category::LocalProcess).with_po("PO-1")).await;
    let ticket = planner.suggestion_ticket();

    // Another writer saves the year while the generator is still working.
    let mut elsewhere = Planner::open(store.clone(), 2024).await;
    elsewhere.append(PlannerEvent::new("theirs", d("2024-01-06"), Category::Delivery).with_po("PO-2")).await;

    let merged = planner.merge_suggestions(ticket, vec![candidate("2024-02-01", "delivery")]).await;
    assert_eq!(merged.len(), 1);

    let reopened = Planner::open(store, 2024).await;
    let titles: Vec<&str> = reopened.events().iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["mine", "theirs", "suggested"]);
  }
}
