use crate::error::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use super::notification_service::NotificationService;

const NEVER: i64 = i64::MIN;

/// Timestamp of the last completed sweep, shared with the health endpoint.
#[derive(Debug, Clone)]
pub struct SweepHeartbeat {
    last_millis: Arc<AtomicI64>,
}

impl Default for SweepHeartbeat {
    fn default() -> Self {
        Self {
            last_millis: Arc::new(AtomicI64::new(NEVER)),
        }
    }
}

impl SweepHeartbeat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn beat(&self, at: DateTime<Utc>) {
        self.last_millis.store(at.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn last_beat(&self) -> Option<DateTime<Utc>> {
        match self.last_millis.load(Ordering::SeqCst) {
            NEVER => None,
            millis => Utc.timestamp_millis_opt(millis).single(),
        }
    }

    /// A sweep that never ran counts as stale.
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        match self.last_beat() {
            Some(last) => now - last > stale_after,
            None => true,
        }
    }
}

/// Runs one sweep and records the heartbeat when it completes.
pub async fn run_sweep(
    service: &NotificationService,
    heartbeat: &SweepHeartbeat,
    now: DateTime<Utc>,
    lookahead: Duration,
) -> Result<()> {
    service.sweep_upcoming(now, lookahead).await?;
    heartbeat.beat(now);
    Ok(())
}

/// Starts the periodic re-evaluation job. The returned scheduler must be kept alive.
pub async fn start_notification_sweep(
    service: Arc<NotificationService>,
    heartbeat: SweepHeartbeat,
    cron: &str,
    lookahead: Duration,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_uuid, _l| {
        let service = service.clone();
        let heartbeat = heartbeat.clone();

        Box::pin(async move {
            if let Err(e) = run_sweep(&service, &heartbeat, Utc::now(), lookahead).await {
                error!("Error sweeping upcoming events: {:?}", e);
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!(cron, "Notification sweep started");
    Ok(scheduler)
}
