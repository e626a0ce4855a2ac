//! The `DormStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `dorm-store-sqlite`).
//! Higher layers (`dorm-api`, `dorm-web`) depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  attempt::{LoginAttempt, NewLoginAttempt},
  cleanup::{CleanupResult, CleanupTrigger},
  cleanup_log::{CleanupLogEntry, NewCleanupLogEntry},
  resident::{NewResident, Resident, ResidentOrder},
};

/// Abstraction over the dormitory data store.
///
/// The cleanup log and the login-attempt ledger are append-only. Residents
/// are only ever removed in bulk.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DormStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Residents ─────────────────────────────────────────────────────────

  /// Register a resident. Fails if the room number is already taken.
  fn add_resident(
    &self,
    input: NewResident,
  ) -> impl Future<Output = Result<Resident, Self::Error>> + Send + '_;

  fn list_residents(
    &self,
    order: ResidentOrder,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<Resident>, Self::Error>> + Send + '_;

  fn count_residents(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Residents whose `last_active_at` is at or after `since`.
  fn count_active_residents(
    &self,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Delete every resident and return how many rows were removed.
  fn delete_all_residents(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Cleanup ───────────────────────────────────────────────────────────

  /// Atomically count, wipe, and log.
  ///
  /// Within a single transaction: read the resident totals, delete every
  /// resident, and append the log entry produced by
  /// [`CleanupTrigger::log_entry`]. An empty registry yields a `skipped`
  /// entry. On failure nothing is committed.
  fn purge_residents(
    &self,
    trigger: CleanupTrigger,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<CleanupResult, Self::Error>> + Send + '_;

  fn append_cleanup_log(
    &self,
    entry: NewCleanupLogEntry,
  ) -> impl Future<Output = Result<CleanupLogEntry, Self::Error>> + Send + '_;

  /// Most recent entries first.
  fn list_cleanup_logs(
    &self,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<CleanupLogEntry>, Self::Error>> + Send + '_;

  fn latest_cleanup_log(
    &self,
  ) -> impl Future<Output = Result<Option<CleanupLogEntry>, Self::Error>> + Send + '_;

  fn count_cleanup_logs(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Login attempts ────────────────────────────────────────────────────

  fn record_login_attempt(
    &self,
    input: NewLoginAttempt,
  ) -> impl Future<Output = Result<LoginAttempt, Self::Error>> + Send + '_;

  /// All attempts from `source_address` recorded at or after `since`,
  /// oldest first.
  fn login_attempts_since<'a>(
    &'a self,
    source_address: &'a str,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<LoginAttempt>, Self::Error>> + Send + 'a;

  fn count_login_attempts(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
