//! Login flow: client address extraction, rate limiting, credential check,
//! and the attempt ledger.

use std::{
  collections::HashMap,
  net::SocketAddr,
  sync::{Arc, Mutex, PoisonError},
};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use chrono::Utc;
use dorm_core::{
  attempt::NewLoginAttempt,
  credentials::CredentialStore,
  ratelimit::{Decision, RateLimiter, RetryAfter},
  store::DormStore,
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::{AppState, error::Error};

/// Source address used as the rate-limit key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr(pub String);

pub const UNKNOWN_ADDR: &str = "unknown";

impl ClientAddr {
  pub fn from_parts(parts: &Parts, trust_forwarded_for: bool) -> Self {
    if trust_forwarded_for
      && let Some(first) = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
      return Self(first.to_owned());
    }

    match parts.extensions.get::<ConnectInfo<SocketAddr>>() {
      Some(ConnectInfo(addr)) => Self(addr.ip().to_string()),
      None => Self(UNKNOWN_ADDR.to_owned()),
    }
  }
}

impl<S> FromRequestParts<AppState<S>> for ClientAddr
where
  S: Send + Sync,
{
  type Rejection = std::convert::Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    Ok(Self::from_parts(parts, state.config.trust_forwarded_for))
  }
}

/// Per-source locks that make the ledger read, the decision, and the ledger
/// append of one submission a single unit. Concurrent submissions from the
/// same address queue up; other addresses are unaffected.
#[derive(Debug, Default)]
pub struct LoginGate {
  locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl LoginGate {
  pub async fn lock(&self, source: &str) -> OwnedMutexGuard<()> {
    let lock = {
      let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
      // Entries nobody holds or waits on.
      locks.retain(|_, l| Arc::strong_count(l) > 1);
      locks.entry(source.to_owned()).or_default().clone()
    };
    lock.lock_owned().await
  }

  /// Addresses with a submission in flight.
  pub fn in_flight(&self) -> usize {
    self
      .locks
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .values()
      .filter(|l| Arc::strong_count(l) > 1)
      .count()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
  Authenticated { username: String },
  InvalidCredentials,
  Blocked { retry_after: RetryAfter },
}

/// Process one login submission.
///
/// Blank input is rejected before the store is touched. Any other submission
/// appends exactly one ledger entry; blocked submissions count as failures.
/// Submissions from one source are processed one at a time through `gate`,
/// and the attempt is timestamped once the gate is held so queued
/// submissions always see the entries written ahead of them.
pub async fn attempt_login<S>(
  store: &S,
  gate: &LoginGate,
  limiter: &RateLimiter,
  credentials: &CredentialStore,
  username: &str,
  password: &str,
  source: &str,
) -> Result<LoginOutcome, Error>
where
  S: DormStore,
{
  let username = username.trim();
  if username.is_empty() || password.is_empty() {
    return Err(Error::Validation("Username and password are required.".into()));
  }

  let _guard = gate.lock(source).await;
  let now = Utc::now();

  let recent = store
    .login_attempts_since(source, limiter.window_start(now))
    .await
    .map_err(Error::store)?;

  let outcome = match limiter.evaluate(&recent, source, now) {
    Decision::Blocked { retry_after } => LoginOutcome::Blocked { retry_after },
    Decision::Allowed if credentials.verify(username, password) => {
      LoginOutcome::Authenticated { username: username.to_owned() }
    }
    Decision::Allowed => LoginOutcome::InvalidCredentials,
  };

  let entry = match outcome {
    LoginOutcome::Authenticated { .. } => NewLoginAttempt::success(username, source, now),
    _ => NewLoginAttempt::failure(username, source, now),
  };
  store.record_login_attempt(entry).await.map_err(Error::store)?;

  match &outcome {
    LoginOutcome::Authenticated { .. } => tracing::info!(username, source, "login succeeded"),
    LoginOutcome::InvalidCredentials => tracing::warn!(username, source, "login failed"),
    LoginOutcome::Blocked { retry_after } => {
      tracing::warn!(username, source, %retry_after, "login blocked")
    }
  }

  Ok(outcome)
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;

  #[tokio::test]
  async fn gate_serialises_one_source_only() {
    let gate = Arc::new(LoginGate::default());
    let held = gate.lock("10.0.0.1").await;

    // Same source waits.
    let waiting = {
      let gate = gate.clone();
      tokio::spawn(async move { gate.lock("10.0.0.1").await; })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiting.is_finished());

    // Another source goes straight through.
    drop(gate.lock("10.0.0.2").await);

    drop(held);
    waiting.await.unwrap();
    assert_eq!(gate.in_flight(), 0);
  }
}
