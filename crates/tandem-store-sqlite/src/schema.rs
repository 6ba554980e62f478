//! SQL schema for the tandem SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS participants (
    participant_id       TEXT PRIMARY KEY,
    email                TEXT NOT NULL UNIQUE,
    display_name         TEXT NOT NULL,
    is_subscribed        INTEGER NOT NULL DEFAULT 1,
    schedule             TEXT NOT NULL,   -- JSON array of weekday names
    is_skipping_tomorrow INTEGER NOT NULL DEFAULT 0,
    currently_in_cohort  INTEGER NOT NULL DEFAULT 0
);

-- One row per matching run; never updated or deleted.
CREATE TABLE IF NOT EXISTS pairing_stats (
    stat_id     INTEGER PRIMARY KEY,
    recorded_at TEXT NOT NULL,   -- ISO 8601 UTC
    pair_count  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS reviews (
    review_id    INTEGER PRIMARY KEY,
    content      TEXT NOT NULL,
    submitted_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS secrets (
    namespace TEXT NOT NULL,
    key       TEXT NOT NULL,
    value     TEXT NOT NULL,
    PRIMARY KEY (namespace, key)
);

CREATE INDEX IF NOT EXISTS pairing_stats_recorded_idx ON pairing_stats(recorded_at);

PRAGMA user_version = 1;
";
