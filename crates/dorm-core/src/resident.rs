//! Residents, the occupants listed in the registry.
//!
//! Residents are provisioned by an external registration process and removed
//! in bulk by the weekly cleanup. The room number is the natural key.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Residents seen within this many days count as active.
pub const ACTIVE_WINDOW_DAYS: i64 = 7;

/// Maximum length of [`Resident::full_name`].
pub const MAX_FULL_NAME_LEN: usize = 100;

/// Maximum length of [`Resident::room_number`].
pub const MAX_ROOM_NUMBER_LEN: usize = 10;

/// A registered dormitory occupant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resident {
  pub id:             i64,
  pub full_name:      String,
  /// Unique across the registry.
  pub room_number:    String,
  pub created_at:     DateTime<Utc>,
  pub last_active_at: DateTime<Utc>,
}

impl Resident {
  pub fn is_active(&self, now: DateTime<Utc>) -> bool {
    self.last_active_at >= active_since(now)
  }
}

/// Input for [`DormStore::add_resident`](crate::store::DormStore::add_resident).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewResident {
  pub full_name:      String,
  pub room_number:    String,
  /// Defaults to the insertion time when `None`.
  pub last_active_at: Option<DateTime<Utc>>,
}

impl NewResident {
  pub fn new(full_name: impl Into<String>, room_number: impl Into<String>) -> Self {
    Self {
      full_name:      full_name.into(),
      room_number:    room_number.into(),
      last_active_at: None,
    }
  }

  /// Trimmed copy of the input, or a description of the first violated
  /// constraint.
  pub fn validated(self) -> Result<Self, String> {
    let full_name = self.full_name.trim().to_owned();
    let room_number = self.room_number.trim().to_owned();

    if full_name.is_empty() {
      return Err("full name must not be empty".into());
    }
    if full_name.chars().count() > MAX_FULL_NAME_LEN {
      return Err(format!("full name exceeds {MAX_FULL_NAME_LEN} characters"));
    }
    if room_number.is_empty() {
      return Err("room number must not be empty".into());
    }
    if room_number.chars().count() > MAX_ROOM_NUMBER_LEN {
      return Err(format!("room number exceeds {MAX_ROOM_NUMBER_LEN} characters"));
    }

    Ok(Self { full_name, room_number, last_active_at: self.last_active_at })
  }
}

/// Sort order for [`DormStore::list_residents`](crate::store::DormStore::list_residents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResidentOrder {
  #[default]
  RoomNumber,
  NewestFirst,
}

/// Lower bound of the activity window ending at `now`.
pub fn active_since(now: DateTime<Utc>) -> DateTime<Utc> {
  now - Duration::days(ACTIVE_WINDOW_DAYS)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn validated_trims_fields() {
    let input = NewResident::new("  Ali Valiyev ", " 101 ");
    let out = input.validated().unwrap();
    assert_eq!(out.full_name, "Ali Valiyev");
    assert_eq!(out.room_number, "101");
  }

  #[test]
  fn validated_rejects_blank_and_oversized() {
    assert!(NewResident::new(" ", "101").validated().is_err());
    assert!(NewResident::new("Ali", "").validated().is_err());
    assert!(NewResident::new("Ali", "12345678901").validated().is_err());
    assert!(NewResident::new("x".repeat(101), "101").validated().is_err());
  }

  #[test]
  fn activity_window_is_seven_days() {
    let now = Utc::now();
    let mut r = Resident {
      id:             1,
      full_name:      "Ali".into(),
      room_number:    "101".into(),
      created_at:     now,
      last_active_at: now - Duration::days(6),
    };
    assert!(r.is_active(now));
    r.last_active_at = now - Duration::days(8);
    assert!(!r.is_active(now));
  }
}
