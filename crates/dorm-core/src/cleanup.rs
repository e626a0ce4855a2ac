//! The cleanup job: bulk deletion of the resident registry.
//!
//! A run counts the residents, deletes them all, and appends one cleanup log
//! entry, atomically (see [`DormStore::purge_residents`]). When the store
//! reports a failure, the job appends a separate `error` entry and returns
//! the purge failure.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{
  cleanup_log::{CleanupLogEntry, CleanupStatus, NewCleanupLogEntry},
  schedule::CleanupSchedule,
  store::DormStore,
};

/// What started a cleanup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CleanupTrigger {
  /// An administrator pressed the button.
  Manual,
  /// The weekly timer fired.
  Automatic,
}

impl CleanupTrigger {
  pub fn status(self) -> CleanupStatus {
    match self {
      Self::Manual => CleanupStatus::Manual,
      Self::Automatic => CleanupStatus::Automatic,
    }
  }

  /// The log entry written for a run that saw `tally`.
  pub fn log_entry(self, tally: &PurgeTally, now: DateTime<Utc>) -> NewCleanupLogEntry {
    if tally.total_before == 0 {
      return NewCleanupLogEntry {
        cleanup_time:    now,
        records_deleted: 0,
        status:          CleanupStatus::Skipped,
        details:         Some(format!("No residents to delete ({self} trigger).")),
      };
    }

    let details = match self {
      Self::Manual => format!(
        "Manual cleanup. {} residents deleted (total {}, active {}).",
        tally.deleted, tally.total_before, tally.active_before,
      ),
      Self::Automatic => format!(
        "Automatic weekly cleanup. Total residents: {}. Active residents: {}. Deleted: {}.",
        tally.total_before, tally.active_before, tally.deleted,
      ),
    };

    NewCleanupLogEntry {
      cleanup_time:    now,
      records_deleted: tally.deleted,
      status:          self.status(),
      details:         Some(details),
    }
  }
}

/// Counts observed inside the cleanup transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PurgeTally {
  pub total_before:  usize,
  pub active_before: usize,
  pub deleted:       usize,
}

/// Outcome of a committed cleanup run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupResult {
  pub deleted:       usize,
  pub status:        CleanupStatus,
  pub total_before:  usize,
  pub active_before: usize,
  /// Id of the log entry written by the run.
  pub log_id:        i64,
}

impl CleanupResult {
  pub fn new(tally: &PurgeTally, entry: &CleanupLogEntry) -> Self {
    Self {
      deleted:       tally.deleted,
      status:        entry.status,
      total_before:  tally.total_before,
      active_before: tally.active_before,
      log_id:        entry.id,
    }
  }
}

pub struct CleanupJob<S> {
  store:    Arc<S>,
  schedule: CleanupSchedule,
}

impl<S: DormStore> CleanupJob<S> {
  pub fn new(store: Arc<S>, schedule: CleanupSchedule) -> Self { Self { store, schedule } }

  pub fn schedule(&self) -> &CleanupSchedule { &self.schedule }

  /// Run unconditionally.
  pub async fn run(
    &self,
    now: DateTime<Utc>,
    trigger: CleanupTrigger,
  ) -> Result<CleanupResult, S::Error> {
    tracing::info!(%trigger, "cleanup started");

    match self.store.purge_residents(trigger, now).await {
      Ok(result) => {
        tracing::info!(
          %trigger,
          deleted = result.deleted,
          total_before = result.total_before,
          active_before = result.active_before,
          status = %result.status,
          log_id = result.log_id,
          "cleanup finished",
        );
        Ok(result)
      }
      Err(e) => {
        tracing::error!(%trigger, error = %e, "cleanup failed, changes rolled back");
        let entry = NewCleanupLogEntry::failure(now, &e.to_string());
        if let Err(log_err) = self.store.append_cleanup_log(entry).await {
          tracing::error!(error = %log_err, "could not record cleanup failure");
        }
        Err(e)
      }
    }
  }

  /// Run the automatic trigger if the weekly window is open at `now`.
  ///
  /// Returns `Ok(None)`, writing nothing, when it is not.
  pub async fn run_scheduled(
    &self,
    now: DateTime<Utc>,
  ) -> Result<Option<CleanupResult>, S::Error> {
    if !self.schedule.is_due(now) {
      tracing::debug!(
        enabled = self.schedule.enabled,
        boundary = %self.schedule.latest_boundary(now),
        "automatic cleanup not due",
      );
      return Ok(None);
    }
    self.run(now, CleanupTrigger::Automatic).await.map(Some)
  }
}
