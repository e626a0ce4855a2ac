//! `GET /stats`: dashboard summary.

use axum::{Json, extract::State};
use dorm_core::store::DormStore;
use serde::Serialize;

use crate::{ApiState, dto::format_timestamp, error::ApiError, users::activity};

/// Shown as `last_cleanup` before the first cleanup.
pub const NEVER: &str = "Never";

/// Shown as `status` before the first cleanup.
pub const NO_STATUS: &str = "N/A";

#[derive(Debug, Serialize)]
pub struct Stats {
  pub total_users:          usize,
  pub active_users:         usize,
  pub inactive_users:       usize,
  pub last_cleanup:         String,
  pub records_deleted_last: usize,
  pub status:               String,
}

/// `GET /stats`
pub async fn handler<S>(State(state): State<ApiState<S>>) -> Result<Json<Stats>, ApiError>
where
  S: DormStore,
{
  let counts = activity(state.store.as_ref()).await?;
  let last = state
    .store
    .latest_cleanup_log()
    .await
    .map_err(ApiError::store)?;

  let (last_cleanup, records_deleted_last, status) = match last {
    Some(entry) => (
      format_timestamp(entry.cleanup_time),
      entry.records_deleted,
      entry.status.to_string(),
    ),
    None => (NEVER.to_owned(), 0, NO_STATUS.to_owned()),
  };

  Ok(Json(Stats {
    total_users: counts.total_users,
    active_users: counts.active_users,
    inactive_users: counts.inactive_users,
    last_cleanup,
    records_deleted_last,
    status,
  }))
}
