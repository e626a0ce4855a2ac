//! Weekly cleanup window.
//!
//! Automatic cleanup is due during the first [`DUE_WINDOW_MINUTES`] after a
//! weekly boundary, expressed as a weekday and wall-clock time in a fixed UTC
//! offset. Outside that window an automatic trigger is a no-op.

use chrono::{
  DateTime, Datelike, Duration, FixedOffset, NaiveTime, Offset, TimeZone, Utc, Weekday,
};

use crate::{Error, Result};

pub const DUE_WINDOW_MINUTES: i64 = 10;

const DEFAULT_UTC_OFFSET_SECS: i32 = 5 * 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupSchedule {
  pub enabled: bool,
  pub weekday: Weekday,
  pub time:    NaiveTime,
  pub offset:  FixedOffset,
}

impl Default for CleanupSchedule {
  /// Mondays at 00:00, UTC+05:00.
  fn default() -> Self {
    Self {
      enabled: true,
      weekday: Weekday::Mon,
      time:    NaiveTime::MIN,
      offset:  FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS).unwrap_or(Utc.fix()),
    }
  }
}

impl CleanupSchedule {
  pub fn new(
    enabled: bool,
    weekday: &str,
    hour: u32,
    minute: u32,
    utc_offset_minutes: i32,
  ) -> Result<Self> {
    let weekday: Weekday = weekday
      .trim()
      .parse()
      .map_err(|_| Error::InvalidSchedule(format!("unknown weekday {weekday:?}")))?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)
      .ok_or_else(|| Error::InvalidSchedule(format!("invalid time {hour:02}:{minute:02}")))?;
    let offset = utc_offset_minutes
      .checked_mul(60)
      .and_then(FixedOffset::east_opt)
      .ok_or_else(|| {
        Error::InvalidSchedule(format!("invalid UTC offset {utc_offset_minutes} minutes"))
      })?;

    Ok(Self { enabled, weekday, time, offset })
  }

  /// The most recent boundary at or before `now`.
  pub fn latest_boundary(&self, now: DateTime<Utc>) -> DateTime<Utc> {
    let local = now.with_timezone(&self.offset);
    let days_back = (7 + local.weekday().num_days_from_monday()
      - self.weekday.num_days_from_monday())
      % 7;
    let date = local.date_naive() - Duration::days(i64::from(days_back));

    // A fixed offset maps every local time to exactly one instant.
    let mut boundary = self
      .offset
      .from_local_datetime(&date.and_time(self.time))
      .single()
      .map(|dt| dt.with_timezone(&Utc))
      .unwrap_or(now);

    if boundary > now {
      boundary -= Duration::weeks(1);
    }
    boundary
  }

  /// Whether an automatic cleanup should proceed at `now`.
  pub fn is_due(&self, now: DateTime<Utc>) -> bool {
    if !self.enabled {
      return false;
    }
    let boundary = self.latest_boundary(now);
    now < boundary + Duration::minutes(DUE_WINDOW_MINUTES)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
  }

  #[test]
  fn default_is_monday_midnight_plus_five() {
    let s = CleanupSchedule::default();
    // 2025-03-10 is a Monday; local midnight is 19:00 UTC the day before.
    assert_eq!(s.latest_boundary(utc(2025, 3, 9, 19, 5)), utc(2025, 3, 9, 19, 0));
    assert!(s.is_due(utc(2025, 3, 9, 19, 0)));
    assert!(s.is_due(utc(2025, 3, 9, 19, 9)));
    assert!(!s.is_due(utc(2025, 3, 9, 19, 10)));
    assert!(!s.is_due(utc(2025, 3, 9, 18, 59)));
  }

  #[test]
  fn boundary_before_time_of_day_goes_back_a_week() {
    let s = CleanupSchedule::new(true, "wednesday", 12, 30, 0).unwrap();
    // Wednesday 2025-03-12, 11:00 UTC: this week's boundary is still ahead.
    assert_eq!(s.latest_boundary(utc(2025, 3, 12, 11, 0)), utc(2025, 3, 5, 12, 30));
    assert_eq!(s.latest_boundary(utc(2025, 3, 12, 12, 30)), utc(2025, 3, 12, 12, 30));
    assert_eq!(s.latest_boundary(utc(2025, 3, 15, 0, 0)), utc(2025, 3, 12, 12, 30));
  }

  #[test]
  fn disabled_schedule_is_never_due() {
    let s = CleanupSchedule::new(false, "Mon", 0, 0, 0).unwrap();
    assert!(!s.is_due(utc(2025, 3, 10, 0, 1)));
  }

  #[test]
  fn invalid_inputs_are_rejected() {
    assert!(CleanupSchedule::new(true, "someday", 0, 0, 0).is_err());
    assert!(CleanupSchedule::new(true, "mon", 24, 0, 0).is_err());
    assert!(CleanupSchedule::new(true, "mon", 0, 60, 0).is_err());
    assert!(CleanupSchedule::new(true, "mon", 0, 0, 24 * 60).is_err());
  }
}
