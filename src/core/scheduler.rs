//! Fixed-interval driver for coordinator flushes.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

use crate::core::coordinator::{FlushReport, TranslationCoordinator};
use crate::error::Result;

pub struct Scheduler {
    interval: Interval,
}

impl Scheduler {
    /// The first tick fires one full period after creation. Ticks missed
    /// while a flush runs are delayed rather than bursted.
    pub fn new(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }

    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }

    /// Wait for the next tick, then flush.
    pub async fn run_once(&mut self, coordinator: &TranslationCoordinator) -> Result<FlushReport> {
        self.tick().await;
        coordinator.flush().await
    }

    /// Flush on every tick until `shutdown` completes, calling `handler`
    /// around each flush.
    ///
    /// Non-fatal flush errors are logged and the loop continues; a fatal error,
    /// or any handler error, ends it.
    pub async fn run<S, H>(
        &mut self,
        coordinator: &TranslationCoordinator,
        shutdown: S,
        handler: &mut H,
    ) -> Result<()>
    where
        S: Future<Output = ()>,
        H: TickHandler,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::debug!("scheduler stopped");
                    return Ok(());
                }
                _ = self.interval.tick() => {
                    handler.before_flush()?;
                    match coordinator.flush().await {
                        Ok(report) => handler.after_flush(&report)?,
                        Err(err) if !err.is_fatal() => tracing::warn!("{}", err),
                        Err(err) => return Err(err),
                    }
                }
            }
        }
    }
}

/// Host hooks around each scheduled flush.
pub trait TickHandler {
    /// Runs on every tick before the flush, e.g. to feed changed files.
    fn before_flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn after_flush(&mut self, report: &FlushReport) -> Result<()>;
}

impl<F> TickHandler for F
where
    F: FnMut(&FlushReport),
{
    fn after_flush(&mut self, report: &FlushReport) -> Result<()> {
        self(report);
        Ok(())
    }
}
