//! Error types for `dorm-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed admin account entry: {0:?}")]
  MalformedAccount(String),

  #[error("no admin accounts configured")]
  NoAccounts,

  #[error("invalid cleanup schedule: {0}")]
  InvalidSchedule(String),

  #[error("unknown cleanup status: {0:?}")]
  UnknownStatus(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
