//! Handlers for `/cleanup` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/cleanup/manual` | Deletes every resident |
//! | `GET`  | `/cleanup/count`  | Number of log entries |
//! | `GET`  | `/cleanup/logs`   | Optional `?limit=N` (default 20, max 500) |

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::Utc;
use dorm_core::{cleanup::CleanupTrigger, store::DormStore};
use serde::{Deserialize, Serialize};

use crate::{ApiState, dto::CleanupLogDto, error::ApiError};

pub const DEFAULT_LOG_LIMIT: usize = 20;
pub const MAX_LOG_LIMIT: usize = 500;

// ─── Manual trigger ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ManualCleanupResponse {
  pub success: bool,
  pub message: String,
  pub deleted: usize,
}

/// `POST /cleanup/manual`
pub async fn manual<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<ManualCleanupResponse>, ApiError>
where
  S: DormStore,
{
  let result = state
    .cleanup
    .run(Utc::now(), CleanupTrigger::Manual)
    .await
    .map_err(|e| ApiError::Cleanup(Box::new(e)))?;

  let message = if result.deleted == 0 {
    "No residents to delete.".to_owned()
  } else {
    format!("{} residents deleted.", result.deleted)
  };

  Ok(Json(ManualCleanupResponse { success: true, message, deleted: result.deleted }))
}

// ─── Count ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CountResponse {
  pub count: usize,
}

/// `GET /cleanup/count`
pub async fn count<S>(State(state): State<ApiState<S>>) -> Result<Json<CountResponse>, ApiError>
where
  S: DormStore,
{
  let count = state
    .store
    .count_cleanup_logs()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(CountResponse { count }))
}

// ─── History ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LogParams {
  pub limit: Option<usize>,
}

/// `GET /cleanup/logs[?limit=N]`
pub async fn logs<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<LogParams>,
) -> Result<Json<Vec<CleanupLogDto>>, ApiError>
where
  S: DormStore,
{
  let limit = params.limit.unwrap_or(DEFAULT_LOG_LIMIT);
  if limit == 0 || limit > MAX_LOG_LIMIT {
    return Err(ApiError::BadRequest(format!(
      "limit must be between 1 and {MAX_LOG_LIMIT}"
    )));
  }

  let entries = state
    .store
    .list_cleanup_logs(Some(limit))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(entries.into_iter().map(CleanupLogDto::from).collect()))
}
