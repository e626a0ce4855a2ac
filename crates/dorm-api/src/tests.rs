//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Method, Request, StatusCode},
};
use chrono::{DateTime, Duration, Utc};
use dorm_core::{
  attempt::{LoginAttempt, NewLoginAttempt},
  cleanup::{CleanupJob, CleanupResult, CleanupTrigger},
  cleanup_log::{CleanupLogEntry, CleanupStatus, NewCleanupLogEntry},
  resident::{NewResident, Resident, ResidentOrder},
  schedule::CleanupSchedule,
  store::DormStore,
};
use dorm_store_sqlite::SqliteStore;
use serde_json::Value;
use tower::ServiceExt as _;

use crate::api_router;

async fn make_store() -> Arc<SqliteStore> {
  Arc::new(SqliteStore::open_in_memory().await.unwrap())
}

async fn call(store: Arc<SqliteStore>, method: Method, uri: &str) -> (StatusCode, Value) {
  let cleanup = Arc::new(CleanupJob::new(store.clone(), CleanupSchedule::default()));
  let req = Request::builder()
    .method(method)
    .uri(uri)
    .body(Body::empty())
    .unwrap();
  let resp = api_router(store, cleanup).oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
  (status, json)
}

async fn seed(store: &SqliteStore, n: usize) {
  for i in 0..n {
    store
      .add_resident(NewResident::new(format!("Resident {i}"), format!("{}", 300 - i)))
      .await
      .unwrap();
  }
}

// ── /users ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn users_are_ordered_by_room_with_formatted_timestamps() {
  let store = make_store().await;
  seed(&store, 3).await;

  let (status, body) = call(store, Method::GET, "/users").await;
  assert_eq!(status, StatusCode::OK);

  let users = body.as_array().unwrap();
  assert_eq!(users.len(), 3);
  assert_eq!(users[0]["room_number"], "298");
  assert_eq!(users[2]["room_number"], "300");

  let created = users[0]["created_at"].as_str().unwrap();
  assert_eq!(created.len(), "2025-01-01 00:00:00".len());
  assert!(chrono::NaiveDateTime::parse_from_str(created, "%Y-%m-%d %H:%M:%S").is_ok());
  for key in ["id", "full_name", "room_number", "created_at", "last_active_at"] {
    assert!(users[0].get(key).is_some(), "missing {key}");
  }
}

#[tokio::test]
async fn active_count_splits_by_last_activity() {
  let store = make_store().await;
  seed(&store, 2).await;
  let mut stale = NewResident::new("Away", "999");
  stale.last_active_at = Some(Utc::now() - Duration::days(9));
  store.add_resident(stale).await.unwrap();

  let (status, body) = call(store, Method::GET, "/users/active-count").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["total_users"], 3);
  assert_eq!(body["active_users"], 2);
  assert_eq!(body["inactive_users"], 1);
}

// ── /stats ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stats_before_any_cleanup() {
  let store = make_store().await;
  seed(&store, 4).await;

  let (status, body) = call(store, Method::GET, "/stats").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["total_users"], 4);
  assert_eq!(body["last_cleanup"], "Never");
  assert_eq!(body["records_deleted_last"], 0);
  assert_eq!(body["status"], "N/A");
}

#[tokio::test]
async fn stats_reflect_latest_cleanup() {
  let store = make_store().await;
  seed(&store, 5).await;

  let (status, _) = call(store.clone(), Method::POST, "/cleanup/manual").await;
  assert_eq!(status, StatusCode::OK);

  let (_, body) = call(store, Method::GET, "/stats").await;
  assert_eq!(body["total_users"], 0);
  assert_eq!(body["records_deleted_last"], 5);
  assert_eq!(body["status"], "manual");
  assert_ne!(body["last_cleanup"], "Never");
}

// ── /cleanup ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn manual_cleanup_of_forty() {
  let store = make_store().await;
  seed(&store, 40).await;

  let (status, body) = call(store.clone(), Method::POST, "/cleanup/manual").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], true);
  assert_eq!(body["deleted"], 40);

  let logs = store.list_cleanup_logs(None).await.unwrap();
  assert_eq!(logs.len(), 1);
  assert_eq!(logs[0].status, CleanupStatus::Manual);
  assert_eq!(logs[0].records_deleted, 40);
}

#[tokio::test]
async fn manual_cleanup_on_empty_registry() {
  let store = make_store().await;

  let (status, body) = call(store.clone(), Method::POST, "/cleanup/manual").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], true);
  assert_eq!(body["deleted"], 0);

  let (_, count) = call(store, Method::GET, "/cleanup/count").await;
  assert_eq!(count["count"], 1);
}

#[tokio::test]
async fn manual_cleanup_requires_post() {
  let store = make_store().await;
  let (status, _) = call(store, Method::GET, "/cleanup/manual").await;
  assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn cleanup_logs_honour_limit() {
  let store = make_store().await;
  for _ in 0..3 {
    store
      .append_cleanup_log(NewCleanupLogEntry::failure(Utc::now(), "disk I/O error"))
      .await
      .unwrap();
  }

  let (status, body) = call(store.clone(), Method::GET, "/cleanup/logs?limit=2").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 2);
  assert_eq!(body[0]["status"], "error");

  let (status, body) = call(store, Method::GET, "/cleanup/logs?limit=0").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());
}

// ── Store failures ────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("disk I/O error")]
struct DiskError;

/// A store whose every operation fails.
struct BrokenStore;

impl DormStore for BrokenStore {
  type Error = DiskError;

  async fn add_resident(&self, _: NewResident) -> Result<Resident, DiskError> { Err(DiskError) }

  async fn list_residents(
    &self,
    _: ResidentOrder,
    _: Option<usize>,
  ) -> Result<Vec<Resident>, DiskError> {
    Err(DiskError)
  }

  async fn count_residents(&self) -> Result<usize, DiskError> { Err(DiskError) }

  async fn count_active_residents(&self, _: DateTime<Utc>) -> Result<usize, DiskError> {
    Err(DiskError)
  }

  async fn delete_all_residents(&self) -> Result<usize, DiskError> { Err(DiskError) }

  async fn purge_residents(
    &self,
    _: CleanupTrigger,
    _: DateTime<Utc>,
  ) -> Result<CleanupResult, DiskError> {
    Err(DiskError)
  }

  async fn append_cleanup_log(&self, _: NewCleanupLogEntry) -> Result<CleanupLogEntry, DiskError> {
    Err(DiskError)
  }

  async fn list_cleanup_logs(&self, _: Option<usize>) -> Result<Vec<CleanupLogEntry>, DiskError> {
    Err(DiskError)
  }

  async fn latest_cleanup_log(&self) -> Result<Option<CleanupLogEntry>, DiskError> {
    Err(DiskError)
  }

  async fn count_cleanup_logs(&self) -> Result<usize, DiskError> { Err(DiskError) }

  async fn record_login_attempt(&self, _: NewLoginAttempt) -> Result<LoginAttempt, DiskError> {
    Err(DiskError)
  }

  async fn login_attempts_since(
    &self,
    _: &str,
    _: DateTime<Utc>,
  ) -> Result<Vec<LoginAttempt>, DiskError> {
    Err(DiskError)
  }

  async fn count_login_attempts(&self) -> Result<usize, DiskError> { Err(DiskError) }
}

async fn call_broken(method: Method, uri: &str) -> (StatusCode, Value) {
  let store = Arc::new(BrokenStore);
  let cleanup = Arc::new(CleanupJob::new(store.clone(), CleanupSchedule::default()));
  let req = Request::builder()
    .method(method)
    .uri(uri)
    .body(Body::empty())
    .unwrap();
  let resp = api_router(store, cleanup).oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn store_failure_is_a_generic_500() {
  for uri in ["/users", "/users/active-count", "/stats", "/cleanup/count", "/cleanup/logs"] {
    let (status, body) = call_broken(Method::GET, uri).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
    assert_eq!(body["error"], "internal server error", "{uri}");
  }
}

#[tokio::test]
async fn failed_manual_cleanup_reports_success_false() {
  let (status, body) = call_broken(Method::POST, "/cleanup/manual").await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["success"], false);
  assert!(body["message"].as_str().unwrap().contains("no residents were deleted"));
  assert!(body.get("deleted").is_none());
}
