//! Server-side login sessions.
//!
//! The browser holds only an opaque token in the `dorm_session` cookie. The
//! cookie value is `<token>.<signature>`, where the signature is
//! hex(SHA-256(secret ‖ 0x00 ‖ token)). Session state, including expiry,
//! lives in [`SessionStore`]; the timeout slides on every authenticated
//! request.

use std::{
  collections::HashMap,
  sync::{Mutex, PoisonError},
};

use axum::{
  Json,
  extract::{Request, State},
  http::{HeaderMap, HeaderValue, StatusCode, header},
  middleware::Next,
  response::{IntoResponse, Redirect, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use chrono::{DateTime, Duration, Utc};
use dorm_core::store::DormStore;
use rand_core::{OsRng, RngCore};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::AppState;

pub const SESSION_COOKIE: &str = "dorm_session";

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub username:   String,
  pub created_at: DateTime<Utc>,
  pub last_seen:  DateTime<Utc>,
}

/// The authenticated administrator, inserted into request extensions by the
/// session middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

pub struct SessionStore {
  secret:   Vec<u8>,
  timeout:  Duration,
  sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
  pub fn new(secret: &str, timeout: Duration) -> Self {
    Self {
      secret: secret.as_bytes().to_vec(),
      timeout,
      sessions: Mutex::new(HashMap::new()),
    }
  }

  pub fn timeout(&self) -> Duration { self.timeout }

  /// Start a session and return the signed cookie value.
  pub fn create(&self, username: &str, now: DateTime<Utc>) -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let token = B64.encode(bytes);

    let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
    sessions.retain(|_, s| !self.is_expired(s, now));
    sessions.insert(token.clone(), Session {
      username:   username.to_owned(),
      created_at: now,
      last_seen:  now,
    });

    let signature = self.sign(&token);
    format!("{token}.{signature}")
  }

  /// Look up the session for `cookie_value`, extending it if still live.
  ///
  /// Expired sessions are removed.
  pub fn touch(&self, cookie_value: &str, now: DateTime<Utc>) -> Option<Session> {
    let token = self.verify(cookie_value)?;

    let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
    let expired = self.is_expired(sessions.get(token)?, now);
    if expired {
      sessions.remove(token);
      return None;
    }

    let session = sessions.get_mut(token)?;
    session.last_seen = now;
    Some(session.clone())
  }

  pub fn remove(&self, cookie_value: &str) -> Option<Session> {
    let token = self.verify(cookie_value)?;
    self
      .sessions
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(token)
  }

  pub fn len(&self) -> usize {
    self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
    now >= session.last_seen + self.timeout
  }

  fn sign(&self, token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(&self.secret);
    hasher.update([0u8]);
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
  }

  /// The token part of a correctly signed cookie value.
  fn verify<'a>(&self, cookie_value: &'a str) -> Option<&'a str> {
    let (token, signature) = cookie_value.rsplit_once('.')?;
    constant_time_eq(self.sign(token).as_bytes(), signature.as_bytes()).then_some(token)
  }
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
  if a.len() != b.len() {
    return false;
  }
  a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// ─── Cookies ─────────────────────────────────────────────────────────────────

/// Value of the cookie called `name`, if the request carries one.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(k, _)| *k == name)
    .map(|(_, v)| v)
}

pub fn session_cookie(value: &str, max_age: Duration) -> HeaderValue {
  let cookie = format!(
    "{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
    max_age.num_seconds(),
  );
  // Token and signature are base64url and hex, always valid header bytes.
  HeaderValue::from_str(&cookie).unwrap_or_else(|_| clear_session_cookie())
}

pub fn clear_session_cookie() -> HeaderValue {
  HeaderValue::from_static("dorm_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// The live session for this request, if any.
pub fn current_session<S>(state: &AppState<S>, headers: &HeaderMap) -> Option<Session> {
  let value = read_cookie(headers, SESSION_COOKIE)?;
  state.sessions.touch(value, Utc::now())
}

// ─── Middleware ──────────────────────────────────────────────────────────────

/// Gate for HTML pages: anonymous visitors are sent to `/login`.
pub async fn require_page_session<S>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Response
where
  S: DormStore + 'static,
{
  match current_session(&state, req.headers()) {
    Some(session) => {
      req.extensions_mut().insert(CurrentUser(session.username));
      next.run(req).await
    }
    None => Redirect::to("/login").into_response(),
  }
}

/// Gate for JSON endpoints: anonymous callers get `401 {"error": ...}`.
pub async fn require_api_session<S>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Response
where
  S: DormStore + 'static,
{
  match current_session(&state, req.headers()) {
    Some(session) => {
      req.extensions_mut().insert(CurrentUser(session.username));
      next.run(req).await
    }
    None => (
      StatusCode::UNAUTHORIZED,
      Json(json!({ "error": "authentication required" })),
    )
      .into_response(),
  }
}
