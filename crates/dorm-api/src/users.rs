//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users` | Ordered by room number |
//! | `GET`  | `/users/active-count` | Active = seen within the last 7 days |

use axum::{Json, extract::State};
use chrono::Utc;
use dorm_core::{
  resident::{ResidentOrder, active_since},
  store::DormStore,
};
use serde::Serialize;

use crate::{ApiState, dto::ResidentDto, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /users`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<ResidentDto>>, ApiError>
where
  S: DormStore,
{
  let residents = state
    .store
    .list_residents(ResidentOrder::RoomNumber, None)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(residents.into_iter().map(ResidentDto::from).collect()))
}

// ─── Active count ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ActiveCount {
  pub active_users:   usize,
  pub inactive_users: usize,
  pub total_users:    usize,
}

/// Total and active resident counts as of now.
pub(crate) async fn activity<S: DormStore>(store: &S) -> Result<ActiveCount, ApiError> {
  let total_users = store.count_residents().await.map_err(ApiError::store)?;
  let active_users = store
    .count_active_residents(active_since(Utc::now()))
    .await
    .map_err(ApiError::store)?;

  Ok(ActiveCount {
    active_users,
    inactive_users: total_users.saturating_sub(active_users),
    total_users,
  })
}

/// `GET /users/active-count`
pub async fn active_count<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<ActiveCount>, ApiError>
where
  S: DormStore,
{
  Ok(Json(activity(state.store.as_ref()).await?))
}
