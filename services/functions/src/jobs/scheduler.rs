//! services/functions/src/jobs/scheduler.rs
//!
//! Timer-driven jobs. Each job runs on its own loop, sleeping until the next
//! firing of its `Schedule`. A failed run is logged and the loop waits for the
//! next tick; runs are never retried.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use launchpad_core::{AiContentFetcher, FetchOutcome, Schedule, TrendingAggregator};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// A parameterless job fired by a timer.
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs once for the firing at `fired_at`. Failures are handled inside.
    async fn run(&self, fired_at: DateTime<Utc>);
}

pub struct AiFetchJob {
    fetcher: AiContentFetcher,
}

impl AiFetchJob {
    pub fn new(fetcher: AiContentFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ScheduledJob for AiFetchJob {
    fn name(&self) -> &'static str {
        "fetchAiProducts"
    }

    async fn run(&self, _fired_at: DateTime<Utc>) {
        match self.fetcher.run().await {
            FetchOutcome::Completed(report) => {
                info!("{} finished: {} added.", self.name(), report.added)
            }
            degraded => warn!("{} finished with nothing added: {:?}", self.name(), degraded),
        }
    }
}

pub struct DailyTrendingJob {
    aggregator: TrendingAggregator,
}

impl DailyTrendingJob {
    pub fn new(aggregator: TrendingAggregator) -> Self {
        Self { aggregator }
    }
}

#[async_trait]
impl ScheduledJob for DailyTrendingJob {
    fn name(&self) -> &'static str {
        "scheduledDailyTrending"
    }

    async fn run(&self, fired_at: DateTime<Utc>) {
        if let Err(e) = self.aggregator.build_trending(fired_at).await {
            error!("{} failed: {}", self.name(), e);
        }
    }
}

/// Fires `job` on `schedule` until `shutdown` is cancelled.
pub async fn run_schedule(
    schedule: Schedule,
    job: Arc<dyn ScheduledJob>,
    shutdown: CancellationToken,
) {
    info!("Scheduling {} ({:?}).", job.name(), schedule);
    let mut last_fired: Option<DateTime<Utc>> = None;

    loop {
        let now = Utc::now();
        // Never fire the same slot twice, even if the timer wakes a hair early.
        let from = last_fired.map_or(now, |fired| fired.max(now));
        let next = schedule.next_after(from);
        let wait = (next - now).to_std().unwrap_or_default();

        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Stopping {}.", job.name());
                return;
            }
            _ = tokio::time::sleep(wait) => {}
        }

        info!("Running {} for {}.", job.name(), next);
        job.run(next).await;
        last_fired = Some(next);
    }
}
