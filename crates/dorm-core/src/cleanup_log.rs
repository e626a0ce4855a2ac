//! Cleanup log: the append-only audit history of bulk deletions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Maximum number of characters of a failure description kept in an
/// [`CleanupStatus::Error`] entry.
pub const MAX_ERROR_DETAILS_LEN: usize = 200;

/// Outcome tag stored with every cleanup log entry.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CleanupStatus {
  /// Legacy tag; still accepted when reading old rows.
  Success,
  Manual,
  Automatic,
  /// The registry was already empty.
  Skipped,
  Error,
}

impl CleanupStatus {
  pub fn as_str(self) -> &'static str { self.into() }
}

/// A persisted cleanup log row. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupLogEntry {
  pub id:              i64,
  pub cleanup_time:    DateTime<Utc>,
  pub records_deleted: usize,
  pub status:          CleanupStatus,
  pub details:         Option<String>,
}

/// Input for [`DormStore::append_cleanup_log`](crate::store::DormStore::append_cleanup_log).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCleanupLogEntry {
  pub cleanup_time:    DateTime<Utc>,
  pub records_deleted: usize,
  pub status:          CleanupStatus,
  pub details:         Option<String>,
}

impl NewCleanupLogEntry {
  /// An `error` entry describing a failed cleanup. Nothing was deleted.
  pub fn failure(cleanup_time: DateTime<Utc>, description: &str) -> Self {
    let truncated: String = description.chars().take(MAX_ERROR_DETAILS_LEN).collect();
    Self {
      cleanup_time,
      records_deleted: 0,
      status: CleanupStatus::Error,
      details: Some(format!("Error: {truncated}")),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn status_tags_are_lowercase() {
    assert_eq!(CleanupStatus::Manual.to_string(), "manual");
    assert_eq!(CleanupStatus::Automatic.as_str(), "automatic");
    assert_eq!(CleanupStatus::from_str("skipped").unwrap(), CleanupStatus::Skipped);
    assert!(CleanupStatus::from_str("weekly").is_err());
  }

  #[test]
  fn failure_entry_truncates_details() {
    let long = "x".repeat(500);
    let entry = NewCleanupLogEntry::failure(Utc::now(), &long);
    assert_eq!(entry.status, CleanupStatus::Error);
    assert_eq!(entry.records_deleted, 0);
    let details = entry.details.unwrap();
    assert_eq!(details.len(), "Error: ".len() + MAX_ERROR_DETAILS_LEN);
  }
}
