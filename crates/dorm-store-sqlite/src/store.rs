//! [`SqliteStore`], the SQLite implementation of [`DormStore`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{ErrorCode, OptionalExtension as _};

use dorm_core::{
  attempt::{LoginAttempt, NewLoginAttempt},
  cleanup::{CleanupResult, CleanupTrigger, PurgeTally},
  cleanup_log::{CleanupLogEntry, NewCleanupLogEntry},
  resident::{NewResident, Resident, ResidentOrder, active_since},
  store::DormStore,
};

use crate::{
  Error, Result,
  encode::{RawCleanupLog, RawLoginAttempt, RawResident, encode_dt},
  schema::SCHEMA,
};

// ─── Location ────────────────────────────────────────────────────────────────

/// Where the database lives, parsed from a `DATABASE_URL`-style string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
  Memory,
  File(PathBuf),
}

impl DatabaseLocation {
  /// Accepts `sqlite::memory:`, `:memory:`, `sqlite:///relative.db`,
  /// `sqlite:////absolute.db`, `sqlite://path.db`, or a bare path. Any other
  /// URL scheme is rejected.
  pub fn parse(url: &str) -> Result<Self> {
    let url = url.trim();
    if url.is_empty() {
      return Err(Error::UnsupportedUrl(url.to_owned()));
    }
    if matches!(url, ":memory:" | "sqlite::memory:" | "sqlite://:memory:") {
      return Ok(Self::Memory);
    }

    let path = if let Some(rest) = url.strip_prefix("sqlite:///") {
      rest
    } else if let Some(rest) = url.strip_prefix("sqlite://") {
      rest
    } else if let Some(rest) = url.strip_prefix("sqlite:") {
      rest
    } else if url.contains("://") {
      return Err(Error::UnsupportedUrl(url.to_owned()));
    } else {
      url
    };

    if path.is_empty() {
      return Err(Error::UnsupportedUrl(url.to_owned()));
    }
    Ok(Self::File(PathBuf::from(path)))
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A dormitory store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "opening sqlite database");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  pub async fn open_location(location: &DatabaseLocation) -> Result<Self> {
    match location {
      DatabaseLocation::Memory => Self::open_in_memory().await,
      DatabaseLocation::File(path) => Self::open(path).await,
    }
  }

  async fn init_schema(&self) -> Result<()> {
    let version: i64 = self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(conn.query_row("PRAGMA user_version", [], |r| r.get(0))?)
      })
      .await?;
    tracing::debug!(version, "schema ready");
    Ok(())
  }

  /// Run raw SQL against the connection.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn count(&self, sql: &'static str) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(sql, [], |r| r.get(0))?))
      .await?;
    Ok(n.max(0) as usize)
  }
}

// ─── DormStore impl ──────────────────────────────────────────────────────────

impl DormStore for SqliteStore {
  type Error = Error;

  // ── Residents ─────────────────────────────────────────────────────────────

  async fn add_resident(&self, input: NewResident) -> Result<Resident> {
    let input = input.validated().map_err(Error::InvalidResident)?;

    let now = Utc::now();
    let created_at = encode_dt(now);
    let last_active_at = encode_dt(input.last_active_at.unwrap_or(now));
    let full_name = input.full_name;
    let room_number = input.room_number;

    let room = room_number.clone();
    let raw: Option<RawResident> = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO users (full_name, room_number, created_at, last_active_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![full_name, room_number, created_at, last_active_at],
        );
        match inserted {
          Ok(_) => {}
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == ErrorCode::ConstraintViolation =>
          {
            return Ok(None);
          }
          Err(e) => return Err(e.into()),
        }

        let id = conn.last_insert_rowid();
        let sql = format!("SELECT {} FROM users WHERE id = ?1", RawResident::COLUMNS);
        Ok(Some(conn.query_row(&sql, rusqlite::params![id], RawResident::from_row)?))
      })
      .await?;

    raw
      .ok_or(Error::DuplicateRoom(room))?
      .into_resident()
  }

  async fn list_residents(
    &self,
    order: ResidentOrder,
    limit: Option<usize>,
  ) -> Result<Vec<Resident>> {
    let order_by = match order {
      ResidentOrder::RoomNumber => "room_number ASC",
      ResidentOrder::NewestFirst => "created_at DESC, id DESC",
    };
    // SQLite treats a negative LIMIT as "no limit".
    let limit_val = limit.map_or(-1, |l| l as i64);

    let raws: Vec<RawResident> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM users ORDER BY {order_by} LIMIT ?1",
          RawResident::COLUMNS,
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], RawResident::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawResident::into_resident).collect()
  }

  async fn count_residents(&self) -> Result<usize> {
    self.count("SELECT COUNT(*) FROM users").await
  }

  async fn count_active_residents(&self, since: DateTime<Utc>) -> Result<usize> {
    let since_str = encode_dt(since);
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM users WHERE last_active_at >= ?1",
          rusqlite::params![since_str],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(n.max(0) as usize)
  }

  async fn delete_all_residents(&self) -> Result<usize> {
    let deleted = self
      .conn
      .call(|conn| Ok(conn.execute("DELETE FROM users", [])?))
      .await?;
    Ok(deleted)
  }

  // ── Cleanup ───────────────────────────────────────────────────────────────

  async fn purge_residents(
    &self,
    trigger: CleanupTrigger,
    now: DateTime<Utc>,
  ) -> Result<CleanupResult> {
    let since_str = encode_dt(active_since(now));

    let (tally, raw): (PurgeTally, RawCleanupLog) = self
      .conn
      .call(move |conn| {
        // Dropping the transaction without commit rolls it back.
        let tx = conn.transaction()?;

        let total_before: i64 =
          tx.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
        let active_before: i64 = tx.query_row(
          "SELECT COUNT(*) FROM users WHERE last_active_at >= ?1",
          rusqlite::params![since_str],
          |r| r.get(0),
        )?;
        let deleted = if total_before > 0 {
          tx.execute("DELETE FROM users", [])?
        } else {
          0
        };

        let tally = PurgeTally {
          total_before:  total_before.max(0) as usize,
          active_before: active_before.max(0) as usize,
          deleted,
        };
        let entry = trigger.log_entry(&tally, now);

        tx.execute(
          "INSERT INTO cleanup_logs (cleanup_time, records_deleted, status, details)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            encode_dt(entry.cleanup_time),
            entry.records_deleted as i64,
            entry.status.as_str(),
            entry.details,
          ],
        )?;
        let id = tx.last_insert_rowid();
        let sql = format!("SELECT {} FROM cleanup_logs WHERE id = ?1", RawCleanupLog::COLUMNS);
        let raw = tx.query_row(&sql, rusqlite::params![id], RawCleanupLog::from_row)?;

        tx.commit()?;
        Ok((tally, raw))
      })
      .await?;

    let entry = raw.into_entry()?;
    Ok(CleanupResult::new(&tally, &entry))
  }

  async fn append_cleanup_log(&self, entry: NewCleanupLogEntry) -> Result<CleanupLogEntry> {
    let time_str = encode_dt(entry.cleanup_time);
    let deleted = entry.records_deleted as i64;
    let status = entry.status.as_str();
    let details = entry.details;

    let raw: RawCleanupLog = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO cleanup_logs (cleanup_time, records_deleted, status, details)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![time_str, deleted, status, details],
        )?;
        let id = conn.last_insert_rowid();
        let sql = format!("SELECT {} FROM cleanup_logs WHERE id = ?1", RawCleanupLog::COLUMNS);
        Ok(conn.query_row(&sql, rusqlite::params![id], RawCleanupLog::from_row)?)
      })
      .await?;

    raw.into_entry()
  }

  async fn list_cleanup_logs(&self, limit: Option<usize>) -> Result<Vec<CleanupLogEntry>> {
    let limit_val = limit.map_or(-1, |l| l as i64);

    let raws: Vec<RawCleanupLog> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM cleanup_logs ORDER BY cleanup_time DESC, id DESC LIMIT ?1",
          RawCleanupLog::COLUMNS,
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], RawCleanupLog::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCleanupLog::into_entry).collect()
  }

  async fn latest_cleanup_log(&self) -> Result<Option<CleanupLogEntry>> {
    let raw: Option<RawCleanupLog> = self
      .conn
      .call(|conn| {
        let sql = format!(
          "SELECT {} FROM cleanup_logs ORDER BY cleanup_time DESC, id DESC LIMIT 1",
          RawCleanupLog::COLUMNS,
        );
        Ok(conn.query_row(&sql, [], RawCleanupLog::from_row).optional()?)
      })
      .await?;

    raw.map(RawCleanupLog::into_entry).transpose()
  }

  async fn count_cleanup_logs(&self) -> Result<usize> {
    self.count("SELECT COUNT(*) FROM cleanup_logs").await
  }

  // ── Login attempts ────────────────────────────────────────────────────────

  async fn record_login_attempt(&self, input: NewLoginAttempt) -> Result<LoginAttempt> {
    let at_str = encode_dt(input.attempted_at);
    let username = input.username.clone();
    let source = input.source_address.clone();
    let success = input.success;

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO login_attempts (username, source_address, attempted_at, success)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![username, source, at_str, success],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(LoginAttempt {
      id,
      username:       input.username,
      source_address: input.source_address,
      attempted_at:   input.attempted_at,
      success:        input.success,
    })
  }

  async fn login_attempts_since(
    &self,
    source_address: &str,
    since: DateTime<Utc>,
  ) -> Result<Vec<LoginAttempt>> {
    let source = source_address.to_owned();
    let since_str = encode_dt(since);

    let raws: Vec<RawLoginAttempt> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM login_attempts
           WHERE source_address = ?1 AND attempted_at >= ?2
           ORDER BY attempted_at ASC, id ASC",
          RawLoginAttempt::COLUMNS,
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![source, since_str], RawLoginAttempt::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLoginAttempt::into_attempt).collect()
  }

  async fn count_login_attempts(&self) -> Result<usize> {
    self.count("SELECT COUNT(*) FROM login_attempts").await
  }
}
