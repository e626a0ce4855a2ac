//! `GET /logout`

use axum::{
  extract::State,
  http::{HeaderMap, header},
  response::{IntoResponse, Redirect, Response},
};
use dorm_core::store::DormStore;

use crate::{
  AppState,
  session::{SESSION_COOKIE, clear_session_cookie, read_cookie},
};

pub async fn handler<S>(State(state): State<AppState<S>>, headers: HeaderMap) -> Response
where
  S: DormStore + 'static,
{
  if let Some(value) = read_cookie(&headers, SESSION_COOKIE)
    && let Some(session) = state.sessions.remove(value)
  {
    tracing::info!(username = %session.username, "logged out");
  }

  let mut response = Redirect::to("/login").into_response();
  response
    .headers_mut()
    .insert(header::SET_COOKIE, clear_session_cookie());
  response
}
