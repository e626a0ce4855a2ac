//! Domain model for the dormitory administration service.
//!
//! Residents, the cleanup log, and the login-attempt ledger, together with
//! the pure policies built on them: the login rate limiter, the admin
//! credential check, and the weekly cleanup window. Persistence sits behind
//! [`store::DormStore`]; HTTP lives in `dorm-api` and `dorm-web`.

pub mod attempt;
pub mod cleanup;
pub mod cleanup_log;
pub mod credentials;
pub mod error;
pub mod ratelimit;
pub mod resident;
pub mod schedule;
pub mod store;

pub use error::{Error, Result};
