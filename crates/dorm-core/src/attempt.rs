//! Login attempts: the append-only ledger consulted by the rate limiter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One submission of the login form. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAttempt {
  pub id:             i64,
  pub username:       String,
  pub source_address: String,
  pub attempted_at:   DateTime<Utc>,
  pub success:        bool,
}

/// Input for [`DormStore::record_login_attempt`](crate::store::DormStore::record_login_attempt).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoginAttempt {
  pub username:       String,
  pub source_address: String,
  pub attempted_at:   DateTime<Utc>,
  pub success:        bool,
}

impl NewLoginAttempt {
  pub fn failure(
    username: impl Into<String>,
    source_address: impl Into<String>,
    attempted_at: DateTime<Utc>,
  ) -> Self {
    Self {
      username: username.into(),
      source_address: source_address.into(),
      attempted_at,
      success: false,
    }
  }

  pub fn success(
    username: impl Into<String>,
    source_address: impl Into<String>,
    attempted_at: DateTime<Utc>,
  ) -> Self {
    Self { success: true, ..Self::failure(username, source_address, attempted_at) }
  }
}
