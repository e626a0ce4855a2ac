//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so that lexical order in SQL equals chronological order. Rows written by
//! older deployments used `YYYY-MM-DD HH:MM:SS[.ffffff]`; those still decode.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use dorm_core::{
  attempt::LoginAttempt,
  cleanup_log::{CleanupLogEntry, CleanupStatus},
  resident::Resident,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.with_timezone(&Utc));
  }
  NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
    .map(|naive| naive.and_utc())
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── CleanupStatus ───────────────────────────────────────────────────────────

pub fn decode_status(s: &str) -> Result<CleanupStatus> {
  CleanupStatus::from_str(s)
    .map_err(|_| Error::Core(dorm_core::Error::UnknownStatus(s.to_owned())))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawResident {
  pub id:             i64,
  pub full_name:      String,
  pub room_number:    String,
  pub created_at:     String,
  pub last_active_at: String,
}

impl RawResident {
  pub const COLUMNS: &'static str = "id, full_name, room_number, created_at, last_active_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      full_name:      row.get(1)?,
      room_number:    row.get(2)?,
      created_at:     row.get(3)?,
      last_active_at: row.get(4)?,
    })
  }

  pub fn into_resident(self) -> Result<Resident> {
    Ok(Resident {
      id:             self.id,
      full_name:      self.full_name,
      room_number:    self.room_number,
      created_at:     decode_dt(&self.created_at)?,
      last_active_at: decode_dt(&self.last_active_at)?,
    })
  }
}

/// Raw values read directly from a `cleanup_logs` row.
pub struct RawCleanupLog {
  pub id:              i64,
  pub cleanup_time:    String,
  pub records_deleted: i64,
  pub status:          String,
  pub details:         Option<String>,
}

impl RawCleanupLog {
  pub const COLUMNS: &'static str = "id, cleanup_time, records_deleted, status, details";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      cleanup_time:    row.get(1)?,
      records_deleted: row.get(2)?,
      status:          row.get(3)?,
      details:         row.get(4)?,
    })
  }

  pub fn into_entry(self) -> Result<CleanupLogEntry> {
    Ok(CleanupLogEntry {
      id:              self.id,
      cleanup_time:    decode_dt(&self.cleanup_time)?,
      records_deleted: self.records_deleted.max(0) as usize,
      status:          decode_status(&self.status)?,
      details:         self.details,
    })
  }
}

/// Raw values read directly from a `login_attempts` row.
pub struct RawLoginAttempt {
  pub id:             i64,
  pub username:       String,
  pub source_address: String,
  pub attempted_at:   String,
  pub success:        bool,
}

impl RawLoginAttempt {
  pub const COLUMNS: &'static str = "id, username, source_address, attempted_at, success";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      username:       row.get(1)?,
      source_address: row.get(2)?,
      attempted_at:   row.get(3)?,
      success:        row.get(4)?,
    })
  }

  pub fn into_attempt(self) -> Result<LoginAttempt> {
    Ok(LoginAttempt {
      id:             self.id,
      username:       self.username,
      source_address: self.source_address,
      attempted_at:   decode_dt(&self.attempted_at)?,
      success:        self.success,
    })
  }
}
