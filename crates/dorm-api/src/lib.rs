//! JSON REST API for the dormitory service.
//!
//! Exposes an axum [`Router`] backed by any [`dorm_core::store::DormStore`].
//! Session checks, TLS, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", dorm_api::api_router(store.clone(), cleanup.clone()))
//! ```

pub mod cleanup;
pub mod dto;
pub mod error;
pub mod stats;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use dorm_core::{cleanup::CleanupJob, store::DormStore};

pub use error::ApiError;

/// State shared by the API handlers.
pub struct ApiState<S> {
  pub store:   Arc<S>,
  pub cleanup: Arc<CleanupJob<S>>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), cleanup: self.cleanup.clone() }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, cleanup: Arc<CleanupJob<S>>) -> Router<()>
where
  S: DormStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Residents
    .route("/users", get(users::list::<S>))
    .route("/users/active-count", get(users::active_count::<S>))
    // Statistics
    .route("/stats", get(stats::handler::<S>))
    // Cleanup
    .route("/cleanup/manual", post(cleanup::manual::<S>))
    .route("/cleanup/count", get(cleanup::count::<S>))
    .route("/cleanup/logs", get(cleanup::logs::<S>))
    .with_state(ApiState { store, cleanup })
}

#[cfg(test)]
mod tests;
