//! CSV export of the registry table.

use crate::registry::RegistryEntry;

const HEADER: &str = "PO,Reference,Start Date,Status,Elapsed Days,Aging";

/// Render `registry` as CSV, one row per entry, CRLF-terminated.
pub fn registry_csv(registry: &[RegistryEntry]) -> String {
  let mut out = String::from(HEADER);
  out.push_str("\r\n");
  for entry in registry {
    let row = [
      escape(&entry.po_name),
      escape(&entry.awb_bl_name),
      entry.start_date.format("%Y-%m-%d").to_string(),
      escape(entry.current_status.label()),
      entry.elapsed_days().to_string(),
      entry.aging().as_str().to_owned(),
    ];
    out.push_str(&row.join(","));
    out.push_str("\r\n");
  }
  out
}

/// Quote a field if it contains a delimiter, quote or line break.
fn escape(field: &str) -> String {
  if field.contains([',', '"', '\n', '\r']) {
    format!("\"{}\"", field.replace('"', "\"\""))
  } else {
    field.to_owned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    event::{Category, PlannerEvent, parse_date},
    registry::build_registry,
  };

  #[test]
  fn rows_follow_registry_order_with_metrics() {
    let events = vec![
      PlannerEvent::new("", parse_date("2024-01-20").unwrap(), Category::TecApproved)
        .with_po("PO-2")
        .with_reference("BL, \"east\""),
      PlannerEvent::new("", parse_date("2023-12-01").unwrap(), Category::LocalProcess).with_po("PO-1"),
    ];
    let reg = build_registry(&events, parse_date("2024-02-01").unwrap(), None);
    let csv = registry_csv(&reg);
    let lines: Vec<&str> = csv.split("\r\n").collect();
    assert_eq!(lines[0], HEADER);
    assert_eq!(lines[1], "PO-1,PENDING,2023-12-01,Local Process,62,critical");
    assert_eq!(lines[2], "PO-2,\"BL, \"\"east\"\"\",2024-01-20,Approved TEC,12,normal");
    assert_eq!(lines[3], "");
  }

  #[test]
  fn empty_registry_is_header_only() {
    assert_eq!(registry_csv(&[]), format!("{HEADER}\r\n"));
  }
}
