//! Runtime configuration.
//!
//! Values come from an optional TOML file layered under the process
//! environment. Environment keys are the upper-case field names, e.g.
//! `DATABASE_URL`, `MAX_LOGIN_ATTEMPTS`, `ADMIN_USERS`.

use std::path::Path;

use chrono::Duration;
use dorm_core::{
  credentials::CredentialStore, ratelimit::RateLimitPolicy, schedule::CleanupSchedule,
};
use dorm_store_sqlite::DatabaseLocation;
use serde::Deserialize;

/// Used when `SECRET_KEY` is unset. Never suitable for production.
pub const DEV_SECRET_KEY: &str = "dev-secret-key-please-change-in-production";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                       String,
  pub port:                       u16,
  pub database_url:               String,
  pub secret_key:                 String,
  pub session_timeout_minutes:    i64,
  pub max_login_attempts:         usize,
  pub block_duration_minutes:     i64,
  pub login_window_minutes:       i64,
  pub admin_username:             String,
  pub admin_password:             String,
  /// `user:password,user2:password2`; replaces the single admin pair.
  pub admin_users:                Option<String>,
  pub cleanup_enabled:            bool,
  pub cleanup_weekday:            String,
  pub cleanup_hour:               u32,
  pub cleanup_minute:             u32,
  pub cleanup_utc_offset_minutes: i32,
  /// Take the client address from `X-Forwarded-For` (behind a proxy only).
  pub trust_forwarded_for:        bool,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                       "0.0.0.0".to_string(),
      port:                       5000,
      database_url:               "sqlite:///dorm.db".to_string(),
      secret_key:                 DEV_SECRET_KEY.to_string(),
      session_timeout_minutes:    30,
      max_login_attempts:         3,
      block_duration_minutes:     3,
      login_window_minutes:       60,
      admin_username:             "admin".to_string(),
      admin_password:             "admin123".to_string(),
      admin_users:                None,
      cleanup_enabled:            true,
      cleanup_weekday:            "monday".to_string(),
      cleanup_hour:               0,
      cleanup_minute:             0,
      cleanup_utc_offset_minutes: 300,
      trust_forwarded_for:        false,
    }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
  #[error("failed to read configuration: {0}")]
  Load(#[from] config::ConfigError),

  #[error("{field} must be positive, got {value}")]
  NotPositive { field: &'static str, value: i64 },

  #[error(transparent)]
  Core(#[from] dorm_core::Error),

  #[error(transparent)]
  Store(#[from] dorm_store_sqlite::Error),
}

impl ServerConfig {
  /// Load from `file` (if given and present) and the environment.
  pub fn load(file: Option<&Path>) -> Result<Self, SettingsError> {
    let mut builder = config::Config::builder();
    if let Some(path) = file {
      builder = builder.add_source(config::File::from(path).required(false));
    }
    let settings = builder
      .add_source(config::Environment::default())
      .build()?;

    let cfg: Self = settings.try_deserialize()?;
    cfg.validate()?;
    Ok(cfg)
  }

  pub fn validate(&self) -> Result<(), SettingsError> {
    let positive = [
      ("session_timeout_minutes", self.session_timeout_minutes),
      ("block_duration_minutes", self.block_duration_minutes),
      ("login_window_minutes", self.login_window_minutes),
      ("max_login_attempts", self.max_login_attempts as i64),
    ];
    for (field, value) in positive {
      if value <= 0 {
        return Err(SettingsError::NotPositive { field, value });
      }
    }
    self.credentials()?;
    self.cleanup_schedule()?;
    self.database_location()?;
    Ok(())
  }

  pub fn uses_dev_secret(&self) -> bool { self.secret_key == DEV_SECRET_KEY }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn session_timeout(&self) -> Duration { Duration::minutes(self.session_timeout_minutes) }

  pub fn rate_limit_policy(&self) -> RateLimitPolicy {
    RateLimitPolicy {
      max_attempts:   self.max_login_attempts,
      window:         Duration::minutes(self.login_window_minutes),
      block_duration: Duration::minutes(self.block_duration_minutes),
    }
  }

  pub fn credentials(&self) -> Result<CredentialStore, SettingsError> {
    Ok(CredentialStore::from_config(
      &self.admin_username,
      &self.admin_password,
      self.admin_users.as_deref(),
    )?)
  }

  pub fn cleanup_schedule(&self) -> Result<CleanupSchedule, SettingsError> {
    Ok(CleanupSchedule::new(
      self.cleanup_enabled,
      &self.cleanup_weekday,
      self.cleanup_hour,
      self.cleanup_minute,
      self.cleanup_utc_offset_minutes,
    )?)
  }

  pub fn database_location(&self) -> Result<DatabaseLocation, SettingsError> {
    Ok(DatabaseLocation::parse(&self.database_url)?)
  }
}
