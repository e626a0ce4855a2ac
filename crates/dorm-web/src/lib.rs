//! HTTP front end for the dormitory service.
//!
//! Serves the login page and the session-gated dashboard, and mounts the
//! JSON API from [`dorm_api`] under `/api` behind the same session check.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod views;

pub use error::Error;
pub use settings::ServerConfig;

use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use dorm_core::{
  cleanup::CleanupJob, credentials::CredentialStore, ratelimit::RateLimiter, store::DormStore,
};
use tower_http::trace::TraceLayer;

use auth::LoginGate;
use handlers::{dashboard, login, logout};
use session::{SessionStore, require_api_session, require_page_session};
use settings::SettingsError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:       Arc<S>,
  pub cleanup:     Arc<CleanupJob<S>>,
  pub config:      Arc<ServerConfig>,
  pub credentials: Arc<CredentialStore>,
  pub limiter:     Arc<RateLimiter>,
  pub login_gate:  Arc<LoginGate>,
  pub sessions:    Arc<SessionStore>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:       self.store.clone(),
      cleanup:     self.cleanup.clone(),
      config:      self.config.clone(),
      credentials: self.credentials.clone(),
      limiter:     self.limiter.clone(),
      login_gate:  self.login_gate.clone(),
      sessions:    self.sessions.clone(),
    }
  }
}

impl<S: DormStore> AppState<S> {
  /// Wire up limiter, credentials, sessions, and the cleanup job from
  /// `config`.
  pub fn from_config(store: Arc<S>, config: ServerConfig) -> Result<Self, SettingsError> {
    let cleanup = CleanupJob::new(store.clone(), config.cleanup_schedule()?);
    Ok(Self {
      cleanup:     Arc::new(cleanup),
      credentials: Arc::new(config.credentials()?),
      limiter:     Arc::new(RateLimiter::new(config.rate_limit_policy())),
      login_gate:  Arc::new(LoginGate::default()),
      sessions:    Arc::new(SessionStore::new(&config.secret_key, config.session_timeout())),
      config:      Arc::new(config),
      store,
    })
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

pub fn router<S>(state: AppState<S>) -> Router
where
  S: DormStore + 'static,
{
  let api = dorm_api::api_router(state.store.clone(), state.cleanup.clone()).layer(
    middleware::from_fn_with_state(state.clone(), require_api_session::<S>),
  );

  let pages = Router::new()
    .route("/",          get(dashboard::handler::<S>))
    .route("/dashboard", get(dashboard::handler::<S>))
    .route_layer(middleware::from_fn_with_state(state.clone(), require_page_session::<S>));

  Router::new()
    .route("/login",   get(login::form::<S>).post(login::submit::<S>))
    .route("/logout",  get(logout::handler::<S>))
    .route("/healthz", get(handlers::healthz))
    .merge(pages)
    .nest_service("/api", api)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
