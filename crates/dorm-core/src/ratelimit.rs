//! Brute-force protection for the login form.
//!
//! The limiter is a sliding-window counter with a trailing cooldown. It keeps
//! no state of its own: every decision is recomputed from the login-attempt
//! ledger.
//!
//! A source is blocked when it has at least `max_attempts` failures inside
//! the trailing `window`. The block lasts until `block_duration` after the
//! most recent of those failures.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::attempt::LoginAttempt;

/// Thresholds for [`RateLimiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
  pub max_attempts:   usize,
  pub window:         Duration,
  pub block_duration: Duration,
}

impl Default for RateLimitPolicy {
  fn default() -> Self {
    Self {
      max_attempts:   3,
      window:         Duration::hours(1),
      block_duration: Duration::minutes(3),
    }
  }
}

/// Time left until a blocked source may try again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RetryAfter(Duration);

impl RetryAfter {
  pub fn duration(&self) -> Duration { self.0 }

  /// Whole seconds, rounded up so a pending block never reads as zero.
  pub fn total_seconds(&self) -> i64 {
    let millis = self.0.num_milliseconds();
    (millis + 999) / 1000
  }

  pub fn minutes(&self) -> i64 { self.total_seconds() / 60 }

  pub fn seconds(&self) -> i64 { self.total_seconds() % 60 }
}

impl fmt::Display for RetryAfter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} min {} s", self.minutes(), self.seconds())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Allowed,
  Blocked { retry_after: RetryAfter },
}

impl Decision {
  pub fn is_allowed(&self) -> bool { matches!(self, Self::Allowed) }
}

#[derive(Debug, Clone, Default)]
pub struct RateLimiter {
  policy: RateLimitPolicy,
}

impl RateLimiter {
  pub fn new(policy: RateLimitPolicy) -> Self { Self { policy } }

  pub fn policy(&self) -> &RateLimitPolicy { &self.policy }

  /// Oldest timestamp that can still influence a decision at `now`.
  pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
    now - self.policy.window
  }

  /// Decide whether `source_address` may attempt a login at `now`.
  ///
  /// `attempts` may contain entries for other sources, successes, or entries
  /// outside the window; they are ignored.
  pub fn evaluate(
    &self,
    attempts: &[LoginAttempt],
    source_address: &str,
    now: DateTime<Utc>,
  ) -> Decision {
    let window_start = self.window_start(now);

    let failures = attempts.iter().filter(|a| {
      !a.success
        && a.source_address == source_address
        && a.attempted_at >= window_start
        && a.attempted_at <= now
    });

    let mut count = 0usize;
    let mut latest: Option<DateTime<Utc>> = None;
    for attempt in failures {
      count += 1;
      latest = latest.max(Some(attempt.attempted_at));
    }

    let Some(latest) = latest else {
      return Decision::Allowed;
    };
    if count < self.policy.max_attempts {
      return Decision::Allowed;
    }

    let block_until = latest + self.policy.block_duration;
    if now < block_until {
      Decision::Blocked { retry_after: RetryAfter(block_until - now) }
    } else {
      Decision::Allowed
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap() }

  fn at_minute(m: i64) -> DateTime<Utc> { t0() + Duration::minutes(m) }

  fn attempt(source: &str, at: DateTime<Utc>, success: bool) -> LoginAttempt {
    LoginAttempt {
      id: 0,
      username: "admin".into(),
      source_address: source.into(),
      attempted_at: at,
      success,
    }
  }

  fn failures(source: &str, minutes: &[i64]) -> Vec<LoginAttempt> {
    minutes
      .iter()
      .map(|m| attempt(source, at_minute(*m), false))
      .collect()
  }

  #[test]
  fn no_attempts_is_allowed() {
    let limiter = RateLimiter::default();
    assert_eq!(limiter.evaluate(&[], "10.0.0.1", t0()), Decision::Allowed);
  }

  #[test]
  fn below_threshold_is_allowed() {
    let limiter = RateLimiter::default();
    let ledger = failures("10.0.0.1", &[0, 1]);
    assert!(limiter.evaluate(&ledger, "10.0.0.1", at_minute(2)).is_allowed());
  }

  #[test]
  fn threshold_reached_blocks_until_cooldown_ends() {
    let limiter = RateLimiter::default();
    let ledger = failures("A", &[0, 1, 2]);

    match limiter.evaluate(&ledger, "A", at_minute(3)) {
      Decision::Blocked { retry_after } => {
        assert_eq!(retry_after.duration(), Duration::minutes(2));
        assert_eq!(retry_after.to_string(), "2 min 0 s");
      }
      other => panic!("expected block, got {other:?}"),
    }

    assert!(limiter.evaluate(&ledger, "A", at_minute(5)).is_allowed());
    assert!(limiter.evaluate(&ledger, "A", at_minute(6)).is_allowed());
  }

  #[test]
  fn retry_after_decreases_as_time_advances() {
    let limiter = RateLimiter::default();
    let ledger = failures("A", &[0, 1, 2]);

    let mut previous: Option<RetryAfter> = None;
    for secs in [180, 200, 240, 290, 299] {
      let now = t0() + Duration::seconds(secs);
      let Decision::Blocked { retry_after } = limiter.evaluate(&ledger, "A", now) else {
        panic!("expected block at {secs}s");
      };
      if let Some(prev) = previous {
        assert!(retry_after < prev);
      }
      previous = Some(retry_after);
    }
    assert!(limiter.evaluate(&ledger, "A", t0() + Duration::seconds(300)).is_allowed());
  }

  #[test]
  fn successes_do_not_count_or_reset() {
    let limiter = RateLimiter::default();
    let mut ledger = failures("A", &[0, 1]);
    ledger.push(attempt("A", at_minute(2), true));
    assert!(limiter.evaluate(&ledger, "A", at_minute(3)).is_allowed());

    ledger.push(attempt("A", at_minute(3), false));
    assert!(!limiter.evaluate(&ledger, "A", at_minute(4)).is_allowed());
  }

  #[test]
  fn other_sources_are_ignored() {
    let limiter = RateLimiter::default();
    let ledger = failures("A", &[0, 1, 2]);
    assert!(limiter.evaluate(&ledger, "B", at_minute(3)).is_allowed());
  }

  #[test]
  fn failures_age_out_of_the_window() {
    let limiter = RateLimiter::new(RateLimitPolicy {
      max_attempts:   3,
      window:         Duration::hours(1),
      block_duration: Duration::hours(2),
    });
    let ledger = failures("A", &[0, 1, 2]);
    assert!(!limiter.evaluate(&ledger, "A", at_minute(30)).is_allowed());
    // The oldest failure has left the window, so only two remain.
    assert!(limiter.evaluate(&ledger, "A", at_minute(61)).is_allowed());
  }

  #[test]
  fn retry_after_rounds_partial_seconds_up() {
    let r = RetryAfter(Duration::milliseconds(61_200));
    assert_eq!(r.total_seconds(), 62);
    assert_eq!(r.to_string(), "1 min 2 s");
  }
}
