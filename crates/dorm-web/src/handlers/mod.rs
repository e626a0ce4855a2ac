pub mod dashboard;
pub mod login;
pub mod logout;

use axum::{
  http::{StatusCode, header},
  response::{Html, IntoResponse, Response},
};

pub(super) fn html(status: StatusCode, body: String) -> Response {
  (
    status,
    [(header::CACHE_CONTROL, "no-store")],
    Html(body),
  )
    .into_response()
}

/// `GET /healthz`
pub async fn healthz() -> &'static str { "ok" }
