//! SQL schema for the LogiChronos SQLite store.
//!
//! Executed once at connection startup. The stored blob carries no schema
//! version of its own.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per planning year. The whole collection is rewritten on save.
CREATE TABLE IF NOT EXISTS planner_years (
    year        INTEGER PRIMARY KEY,
    events_json TEXT NOT NULL,     -- JSON array of PlannerEvent
    event_count INTEGER NOT NULL,
    saved_at    TEXT NOT NULL      -- ISO 8601 UTC
);

PRAGMA user_version = 1;
";
