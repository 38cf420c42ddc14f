use crate::aggregator::HeadlineAggregator;
use crate::traits::HeadlineStore;
use crate::types::{AggregatorError, CycleReport, Result, ScheduleConfig};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

// Stand-in first tick when `now + interval` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Runs aggregate-then-store cycles on a fixed interval, one at a time.
pub struct Scheduler {
    aggregator: Arc<HeadlineAggregator>,
    store: Arc<dyn HeadlineStore>,
    config: ScheduleConfig,
    cycle_lock: Mutex<()>,
}

impl Scheduler {
    pub fn new(aggregator: Arc<HeadlineAggregator>, store: Arc<dyn HeadlineStore>, config: ScheduleConfig) -> Self {
        Self {
            aggregator,
            store,
            config,
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Fetch every source and persist what was found. Returns
    /// `CycleInProgress` without doing anything if another cycle is running.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let _guard = self.cycle_lock.try_lock().map_err(|_| AggregatorError::CycleInProgress)?;

        let cycle_id = Uuid::new_v4();
        let span = info_span!("cycle", %cycle_id);

        async move {
            let started_at = Utc::now();
            info!(sources = self.aggregator.sources().len(), "Starting cycle");

            let outcomes = self.aggregator.collect_sources().await;
            let sources_failed = outcomes.iter().filter(|o| !o.is_success()).count();
            let sources_ok = outcomes.len() - sources_failed;
            let items: Vec<_> = outcomes.into_iter().flat_map(|o| o.items).collect();

            let save = self.store.save(&items, self.config.duplicate_policy).await?;

            let report = CycleReport {
                cycle_id,
                started_at,
                finished_at: Utc::now(),
                sources_ok,
                sources_failed,
                items_found: items.len(),
                save,
            };

            info!(
                sources_ok,
                sources_failed,
                items_found = report.items_found,
                inserted = save.inserted,
                elapsed_ms = (report.finished_at - started_at).num_milliseconds(),
                "Cycle finished"
            );
            Ok::<_, AggregatorError>(report)
        }
        .instrument(span)
        .await
    }

    /// Tick every interval until `shutdown` resolves. The first tick comes one
    /// interval after start unless `run_on_startup` is set. Late ticks are
    /// delayed rather than replayed.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let period = self.config.interval;
        let now = Instant::now();
        let start = if self.config.run_on_startup {
            now
        } else {
            now.checked_add(period).unwrap_or_else(|| now + FAR_FUTURE)
        };

        let mut ticker = interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = period.as_secs(),
            run_on_startup = self.config.run_on_startup,
            "Scheduler started"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {
                    match self.run_cycle().await {
                        Ok(_) => {}
                        Err(AggregatorError::CycleInProgress) => warn!("Previous cycle still running, skipping tick"),
                        Err(e) => error!(error = %e, "Cycle failed"),
                    }
                }
            }
        }
    }
}
