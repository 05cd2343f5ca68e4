//! Source of "today" for every derived metric.

use chrono::{Local, NaiveDate};

/// Abstraction over the calendar so aging and phase durations are
/// deterministic under test.
pub trait Clock: Send + Sync {
  /// The current calendar date.
  fn today(&self) -> NaiveDate;
}

/// Production clock: the local calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn today(&self) -> NaiveDate { Local::now().date_naive() }
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
  fn today(&self) -> NaiveDate { self.0 }
}

/// The selectable planning years around `today`: two back, two ahead.
pub fn available_years(today: NaiveDate) -> Vec<i32> {
  use chrono::Datelike as _;
  let base = today.year();
  (base - 2..=base + 2).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn available_years_span_five() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    assert_eq!(available_years(today), vec![2022, 2023, 2024, 2025, 2026]);
  }

  #[test]
  fn fixed_clock_returns_its_date() {
    let d = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    assert_eq!(FixedClock(d).today(), d);
  }
}
