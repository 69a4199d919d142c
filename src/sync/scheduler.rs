//! Named, independently stoppable cadences.
//!
//! # Responsibilities
//! - Run each sync worker on its own ticker task
//! - Start and stop cadences independently of each other
//! - Skip a tick while the previous tick of the same cadence is still running
//!
//! # Design Decisions
//! - Ticks run on their own task so a slow tick never delays the ticker
//! - Stopping a cadence ends its ticker between ticks; a tick already in
//!   progress runs to completion

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::observability::metrics;
use crate::sync::pipeline::SyncContext;
use crate::sync::workers::{Cadence, SyncWorker};

#[derive(Debug, Default)]
struct CadenceStats {
    in_flight: AtomicBool,
    ticks_run: AtomicU64,
    ticks_skipped: AtomicU64,
}

struct CadenceEntry {
    interval: Duration,
    stats: Arc<CadenceStats>,
    stop: Option<watch::Sender<bool>>,
}

/// Cadence state for the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct CadenceSnapshot {
    pub name: String,
    pub interval_secs: u64,
    pub running: bool,
    pub in_flight: bool,
    pub ticks_run: u64,
    pub ticks_skipped: u64,
}

pub struct Scheduler {
    ctx: Arc<SyncContext>,
    cadences: Mutex<HashMap<String, CadenceEntry>>,
}

impl Scheduler {
    pub fn new(ctx: Arc<SyncContext>) -> Self {
        Self {
            ctx,
            cadences: Mutex::new(HashMap::new()),
        }
    }

    pub fn start_cadence(&self, cadence: &Cadence) -> bool {
        self.start(cadence.name, cadence.interval, cadence.worker.clone())
    }

    /// Start a cadence. The first tick fires one interval from now.
    /// Returns false if a cadence with this name is already running.
    pub fn start(&self, name: &str, interval: Duration, worker: Arc<dyn SyncWorker>) -> bool {
        let mut cadences = self.cadences.lock().expect("scheduler mutex poisoned");
        if cadences.get(name).is_some_and(|c| c.stop.is_some()) {
            return false;
        }

        let stats = cadences
            .get(name)
            .map(|c| c.stats.clone())
            .unwrap_or_default();
        let (stop_tx, stop_rx) = watch::channel(false);

        tokio::spawn(run_cadence(
            name.to_string(),
            interval,
            worker,
            self.ctx.clone(),
            stats.clone(),
            stop_rx,
        ));

        tracing::info!(cadence = %name, interval_secs = interval.as_secs(), "Cadence started");
        cadences.insert(
            name.to_string(),
            CadenceEntry {
                interval,
                stats,
                stop: Some(stop_tx),
            },
        );
        true
    }

    /// Stop one cadence. Returns false if it was not running.
    pub fn stop(&self, name: &str) -> bool {
        let mut cadences = self.cadences.lock().expect("scheduler mutex poisoned");
        match cadences.get_mut(name).and_then(|c| c.stop.take()) {
            Some(stop) => {
                let _ = stop.send(true);
                tracing::info!(cadence = %name, "Cadence stopped");
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&self) {
        let mut cadences = self.cadences.lock().expect("scheduler mutex poisoned");
        for (name, entry) in cadences.iter_mut() {
            if let Some(stop) = entry.stop.take() {
                let _ = stop.send(true);
                tracing::info!(cadence = %name, "Cadence stopped");
            }
        }
    }

    pub fn is_running(&self, name: &str) -> bool {
        let cadences = self.cadences.lock().expect("scheduler mutex poisoned");
        cadences.get(name).is_some_and(|c| c.stop.is_some())
    }

    pub fn snapshot(&self) -> Vec<CadenceSnapshot> {
        let cadences = self.cadences.lock().expect("scheduler mutex poisoned");
        let mut out: Vec<_> = cadences
            .iter()
            .map(|(name, c)| CadenceSnapshot {
                name: name.clone(),
                interval_secs: c.interval.as_secs(),
                running: c.stop.is_some(),
                in_flight: c.stats.in_flight.load(Ordering::Acquire),
                ticks_run: c.stats.ticks_run.load(Ordering::Relaxed),
                ticks_skipped: c.stats.ticks_skipped.load(Ordering::Relaxed),
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}

async fn run_cadence(
    name: String,
    interval: Duration,
    worker: Arc<dyn SyncWorker>,
    ctx: Arc<SyncContext>,
    stats: Arc<CadenceStats>,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if stats.in_flight.swap(true, Ordering::AcqRel) {
                    stats.ticks_skipped.fetch_add(1, Ordering::Relaxed);
                    metrics::record_tick_skipped(&name);
                    tracing::warn!(cadence = %name, "Previous tick still running, skipping");
                    continue;
                }
                stats.ticks_run.fetch_add(1, Ordering::Relaxed);
                tokio::spawn(run_tick(name.clone(), worker.clone(), ctx.clone(), stats.clone()));
            }
            _ = stop.changed() => {
                tracing::debug!(cadence = %name, "Cadence ticker exiting");
                break;
            }
        }
    }
}

async fn run_tick(name: String, worker: Arc<dyn SyncWorker>, ctx: Arc<SyncContext>, stats: Arc<CadenceStats>) {
    let started = Instant::now();
    match worker.run(&ctx).await {
        Ok(report) => tracing::info!(
            cadence = %name,
            fresh = report.fresh,
            stale = report.stale,
            failed = report.failed,
            events = report.events,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Sync tick complete"
        ),
        Err(e) => tracing::error!(cadence = %name, error = %e, "Sync tick failed"),
    }
    stats.in_flight.store(false, Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheLayer;
    use crate::config::{default_sources, CircuitBreakerConfig, RetryConfig};
    use crate::distribution::bus::EventBus;
    use crate::sync::error::SyncResult;
    use crate::sync::repository::InMemoryRepository;
    use crate::sync::workers::SyncReport;
    use crate::upstream::{HttpTransport, SyncCoordinator};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    struct SlowWorker {
        started: AtomicU32,
        finished: AtomicU32,
        work: Duration,
    }

    impl SlowWorker {
        fn new(work: Duration) -> Arc<Self> {
            Arc::new(Self {
                started: AtomicU32::new(0),
                finished: AtomicU32::new(0),
                work,
            })
        }
    }

    #[async_trait]
    impl SyncWorker for SlowWorker {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn run(&self, _ctx: &SyncContext) -> SyncResult<SyncReport> {
            self.started.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.work).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(SyncReport::default())
        }
    }

    fn scheduler() -> Scheduler {
        let transport = HttpTransport::new(&Default::default()).unwrap();
        let (bus, _rx) = EventBus::channel(8);
        let coordinator = SyncCoordinator::new(
            &default_sources(),
            &CircuitBreakerConfig::default(),
            &RetryConfig::default(),
            Arc::new(transport),
        );
        let ctx = SyncContext::new(
            Arc::new(coordinator),
            CacheLayer::new(),
            Arc::new(InMemoryRepository::new()),
            bus,
        );
        Scheduler::new(Arc::new(ctx))
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_ticks_are_skipped() {
        let scheduler = scheduler();
        let worker = SlowWorker::new(Duration::from_secs(25));
        assert!(scheduler.start("live", Duration::from_secs(10), worker.clone()));

        // Ticks at 10..=60: runs at 10 and 40, the rest overlap.
        time::sleep(Duration::from_secs(61)).await;
        assert_eq!(worker.started.load(Ordering::SeqCst), 2);

        let snap = &scheduler.snapshot()[0];
        assert_eq!(snap.ticks_run, 2);
        assert_eq!(snap.ticks_skipped, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cadences_stop_independently() {
        let scheduler = scheduler();
        let live = SlowWorker::new(Duration::ZERO);
        let scores = SlowWorker::new(Duration::ZERO);
        scheduler.start("live", Duration::from_secs(30), live.clone());
        scheduler.start("scores", Duration::from_secs(30), scores.clone());
        assert!(!scheduler.start("live", Duration::from_secs(30), live.clone()));

        time::sleep(Duration::from_secs(31)).await;
        assert!(scheduler.stop("scores"));
        assert!(!scheduler.stop("scores"));

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(live.finished.load(Ordering::SeqCst), 3);
        assert_eq!(scores.finished.load(Ordering::SeqCst), 1);
        assert!(scheduler.is_running("live"));
        assert!(!scheduler.is_running("scores"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_lets_running_tick_finish() {
        let scheduler = scheduler();
        let worker = SlowWorker::new(Duration::from_secs(20));
        scheduler.start("standings", Duration::from_secs(5), worker.clone());

        time::sleep(Duration::from_secs(6)).await;
        assert_eq!(worker.started.load(Ordering::SeqCst), 1);
        scheduler.stop_all();

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(worker.started.load(Ordering::SeqCst), 1);
        assert_eq!(worker.finished.load(Ordering::SeqCst), 1);
        assert!(!scheduler.snapshot()[0].in_flight);
    }
}
