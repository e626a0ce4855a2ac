//! `GET /login` and `POST /login`.

use axum::{
  Form,
  extract::State,
  http::{HeaderMap, HeaderValue, StatusCode, header},
  response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use dorm_core::store::DormStore;
use serde::Deserialize;

use crate::{
  AppState,
  auth::{ClientAddr, LoginOutcome, attempt_login},
  error::Error,
  handlers::html,
  session::{current_session, session_cookie},
  views::login_page,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
  pub username: String,
  pub password: String,
}

/// `GET /login`
pub async fn form<S>(State(state): State<AppState<S>>, headers: HeaderMap) -> Response
where
  S: DormStore + 'static,
{
  if current_session(&state, &headers).is_some() {
    return Redirect::to("/dashboard").into_response();
  }
  html(StatusCode::OK, login_page(None, ""))
}

/// `POST /login`
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  ClientAddr(source): ClientAddr,
  Form(form): Form<LoginForm>,
) -> Result<Response, Error>
where
  S: DormStore + 'static,
{
  let outcome = attempt_login(
    state.store.as_ref(),
    &state.login_gate,
    &state.limiter,
    &state.credentials,
    &form.username,
    &form.password,
    &source,
  )
  .await;

  let outcome = match outcome {
    Ok(outcome) => outcome,
    Err(Error::Validation(msg)) => {
      return Ok(html(StatusCode::BAD_REQUEST, login_page(Some(&msg), &form.username)));
    }
    Err(e) => return Err(e),
  };

  let response = match outcome {
    LoginOutcome::Authenticated { username } => {
      let cookie = state.sessions.create(&username, Utc::now());
      let mut response = Redirect::to("/dashboard").into_response();
      response
        .headers_mut()
        .insert(header::SET_COOKIE, session_cookie(&cookie, state.sessions.timeout()));
      response
    }
    LoginOutcome::InvalidCredentials => html(
      StatusCode::UNAUTHORIZED,
      login_page(Some("Invalid username or password."), &form.username),
    ),
    LoginOutcome::Blocked { retry_after } => {
      let message = format!("Too many failed attempts. Try again in {retry_after}.");
      let mut response = html(
        StatusCode::TOO_MANY_REQUESTS,
        login_page(Some(&message), &form.username),
      );
      response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after.total_seconds()));
      response
    }
  };

  Ok(response)
}
