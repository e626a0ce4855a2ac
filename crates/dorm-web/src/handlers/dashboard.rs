//! `GET /` and `GET /dashboard`.
//!
//! Store failures are logged and the page is rendered with empty data rather
//! than an error page.

use axum::{
  Extension,
  extract::State,
  http::StatusCode,
  response::Response,
};
use chrono::Utc;
use dorm_core::{
  resident::{ResidentOrder, active_since},
  store::DormStore,
};

use crate::{
  AppState,
  handlers::html,
  session::CurrentUser,
  views::{Dashboard, dashboard_page},
};

pub const RESIDENT_LIMIT: usize = 100;
pub const LOG_LIMIT: usize = 20;

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Extension(CurrentUser(username)): Extension<CurrentUser>,
) -> Response
where
  S: DormStore + 'static,
{
  let now = Utc::now();
  let store = state.store.as_ref();

  let loaded = async {
    let residents = store
      .list_residents(ResidentOrder::NewestFirst, Some(RESIDENT_LIMIT))
      .await?;
    let logs = store.list_cleanup_logs(Some(LOG_LIMIT)).await?;
    let total = store.count_residents().await?;
    let active = store.count_active_residents(active_since(now)).await?;
    Ok::<_, S::Error>((residents, logs, total, active))
  }
  .await;

  let (residents, logs, total, active) = loaded.unwrap_or_else(|e| {
    tracing::error!(error = %e, "failed to load dashboard data");
    Default::default()
  });

  html(
    StatusCode::OK,
    dashboard_page(&Dashboard {
      username: &username,
      residents: &residents,
      logs: &logs,
      total,
      active,
      last_cleanup: logs.first(),
      now,
    }),
  )
}
