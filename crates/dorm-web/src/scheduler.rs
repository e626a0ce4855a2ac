//! In-process timer for the automatic weekly cleanup.

use std::{sync::Arc, time::Duration as StdDuration};

use chrono::{DateTime, Utc};
use dorm_core::{
  cleanup::{CleanupJob, CleanupResult},
  store::DormStore,
};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

pub const TICK_INTERVAL: StdDuration = StdDuration::from_secs(60);

/// Run one timer tick.
///
/// The job runs at most once per weekly boundary: `last_fired` remembers the
/// boundary already handled, whether or not that run succeeded.
pub async fn tick<S: DormStore>(
  job: &CleanupJob<S>,
  now: DateTime<Utc>,
  last_fired: &mut Option<DateTime<Utc>>,
) -> Option<CleanupResult> {
  let schedule = job.schedule();
  if !schedule.is_due(now) {
    return None;
  }
  let boundary = schedule.latest_boundary(now);
  if *last_fired == Some(boundary) {
    return None;
  }
  *last_fired = Some(boundary);

  match job.run_scheduled(now).await {
    Ok(result) => result,
    Err(e) => {
      tracing::error!(error = %e, %boundary, "automatic cleanup failed");
      None
    }
  }
}

/// Spawn the timer loop on the current runtime.
pub fn spawn<S>(job: Arc<CleanupJob<S>>) -> JoinHandle<()>
where
  S: DormStore + 'static,
{
  tokio::spawn(async move {
    let schedule = job.schedule();
    tracing::info!(
      enabled = schedule.enabled,
      weekday = %schedule.weekday,
      time = %schedule.time,
      offset = %schedule.offset,
      "cleanup timer started",
    );

    let mut interval = tokio::time::interval(TICK_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_fired = None;
    loop {
      interval.tick().await;
      tick(&job, Utc::now(), &mut last_fired).await;
    }
  })
}
