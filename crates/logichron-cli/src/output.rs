//! Plain-text table rendering for terminal output.

use logichron_core::{event::PlannerEvent, registry::Phase};

use crate::client::RegistryRow;

/// Left-aligned columns separated by two spaces, with a dashed rule under
/// the header. Trailing padding is trimmed from every line.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
  let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
  for row in rows {
    for (w, cell) in widths.iter_mut().zip(row) {
      *w = (*w).max(cell.chars().count());
    }
  }

  let line = |cells: &mut dyn Iterator<Item = &str>| {
    let padded: Vec<String> = cells
      .zip(&widths)
      .map(|(c, w)| format!("{c:<w$}"))
      .collect();
    padded.join("  ").trim_end().to_string()
  };

  let mut out = String::new();
  out.push_str(&line(&mut headers.iter().copied()));
  out.push('\n');
  let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
  out.push_str(&rule.join("  "));
  out.push('\n');
  for row in rows {
    out.push_str(&line(&mut row.iter().map(String::as_str)));
    out.push('\n');
  }
  out
}

pub fn registry_table(rows: &[RegistryRow]) -> String {
  let cells: Vec<Vec<String>> = rows
    .iter()
    .map(|r| {
      vec![
        r.entry.po_name.clone(),
        r.entry.awb_bl_name.clone(),
        r.entry.start_date.to_string(),
        r.entry.current_status.label().to_string(),
        r.elapsed_days.to_string(),
        r.aging.as_str().to_string(),
      ]
    })
    .collect();
  render_table(&["PO", "REFERENCE", "START", "STATUS", "DAYS", "AGING"], &cells)
}

/// A PO's lifecycle, one phase per line; the ongoing phase is starred.
pub fn phase_table(phases: &[Phase]) -> String {
  let cells: Vec<Vec<String>> = phases
    .iter()
    .map(|p| {
      vec![
        p.start.to_string(),
        p.category.label().to_string(),
        if p.ongoing { format!("{}*", p.days) } else { p.days.to_string() },
        p.title.clone(),
        p.event_id.to_string(),
      ]
    })
    .collect();
  render_table(&["DATE", "CATEGORY", "DAYS", "TITLE", "ID"], &cells)
}

pub fn event_table(events: &[PlannerEvent]) -> String {
  let cells: Vec<Vec<String>> = events
    .iter()
    .map(|e| {
      vec![
        e.date.to_string(),
        e.po_key().to_string(),
        e.category.label().to_string(),
        e.title.clone(),
        e.id.to_string(),
      ]
    })
    .collect();
  render_table(&["DATE", "PO", "CATEGORY", "TITLE", "ID"], &cells)
}
