//! SQLite backend for the dormitory store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Because every call is executed on that
//! one thread, each store operation is atomic with respect to the others.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{DatabaseLocation, SqliteStore};
