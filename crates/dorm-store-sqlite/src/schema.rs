//! SQL schema for the dormitory SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS users (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name       TEXT NOT NULL,
    room_number     TEXT NOT NULL UNIQUE,
    created_at      TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    last_active_at  TEXT NOT NULL
);

-- Append-only. Rows are never updated or deleted.
CREATE TABLE IF NOT EXISTS cleanup_logs (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    cleanup_time     TEXT NOT NULL,
    records_deleted  INTEGER NOT NULL,
    status           TEXT NOT NULL DEFAULT 'success',
    details          TEXT
);

-- Append-only ledger consulted by the login rate limiter.
CREATE TABLE IF NOT EXISTS login_attempts (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    username        TEXT NOT NULL,
    source_address  TEXT NOT NULL,
    attempted_at    TEXT NOT NULL,
    success         INTEGER NOT NULL CHECK (success IN (0, 1))
);

CREATE INDEX IF NOT EXISTS users_created_idx          ON users(created_at);
CREATE INDEX IF NOT EXISTS users_last_active_idx      ON users(last_active_at);
CREATE INDEX IF NOT EXISTS cleanup_logs_time_idx      ON cleanup_logs(cleanup_time);
CREATE INDEX IF NOT EXISTS login_attempts_source_idx  ON login_attempts(source_address, attempted_at);

PRAGMA user_version = 1;
";
