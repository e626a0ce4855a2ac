//! Wire representations.
//!
//! Timestamps are rendered as `YYYY-MM-DD HH:MM:SS` (UTC).

use chrono::{DateTime, Utc};
use dorm_core::{cleanup_log::CleanupLogEntry, resident::Resident};
use serde::Serialize;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(dt: DateTime<Utc>) -> String {
  dt.format(TIMESTAMP_FORMAT).to_string()
}

#[derive(Debug, Serialize)]
pub struct ResidentDto {
  pub id:             i64,
  pub full_name:      String,
  pub room_number:    String,
  pub created_at:     String,
  pub last_active_at: String,
}

impl From<Resident> for ResidentDto {
  fn from(r: Resident) -> Self {
    Self {
      id:             r.id,
      full_name:      r.full_name,
      room_number:    r.room_number,
      created_at:     format_timestamp(r.created_at),
      last_active_at: format_timestamp(r.last_active_at),
    }
  }
}

#[derive(Debug, Serialize)]
pub struct CleanupLogDto {
  pub id:              i64,
  pub cleanup_time:    String,
  pub records_deleted: usize,
  pub status:          &'static str,
  pub details:         Option<String>,
}

impl From<CleanupLogEntry> for CleanupLogDto {
  fn from(e: CleanupLogEntry) -> Self {
    Self {
      id:              e.id,
      cleanup_time:    format_timestamp(e.cleanup_time),
      records_deleted: e.records_deleted,
      status:          e.status.as_str(),
      details:         e.details,
    }
  }
}
