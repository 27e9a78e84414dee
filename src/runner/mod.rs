//! Concurrent, rate-limited probe dispatch
//!
//! The runner walks the endpoint list in input order and admits one probe
//! per rate-limiter period, bounded by a concurrency semaphore. Admitted
//! probes run as spawned tasks and hand their outcomes to a single
//! aggregator task over a channel; the aggregator is the only place the
//! classification buckets are mutated. Cancellation stops admissions
//! immediately but in-flight probes always drain into the buckets.

pub mod shutdown;

use anyhow::{Context, Result};
use governor::{Quota, RateLimiter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::probe::outcome::ProbeOutcome;
use crate::probe::Prober;
use crate::report::ClassificationBuckets;
use crate::runner::shutdown::ShutdownSignal;

/// Run statistics (thread-safe)
#[derive(Debug, Default)]
pub struct RunStats {
    /// Probes admitted by the dispatch loop
    pub admitted: AtomicU64,

    /// Probes that completed (either direction)
    pub completed: AtomicU64,

    /// Probes that received a response
    pub responded: AtomicU64,

    /// Probes that failed at the transport level
    pub unreachable: AtomicU64,
}

impl RunStats {
    /// Create a new stats counter
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record an admitted probe
    pub fn record_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed probe
    pub fn record_completed(&self, outcome: &ProbeOutcome) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if outcome.status.is_some() {
            self.responded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.unreachable.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get a snapshot of current stats
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            admitted: self.admitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            responded: self.responded.load(Ordering::Relaxed),
            unreachable: self.unreachable.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of run statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub admitted: u64,
    pub completed: u64,
    pub responded: u64,
    pub unreachable: u64,
}

/// Dispatches probes under rate and concurrency limits
pub struct ProbeRunner {
    /// Shared prober
    prober: Arc<Prober>,

    /// Admission rate limiter
    rate_limiter: Arc<
        RateLimiter<
            governor::state::direct::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,

    /// Concurrency semaphore
    semaphore: Arc<Semaphore>,

    /// Run statistics
    stats: Arc<RunStats>,
}

impl ProbeRunner {
    /// Create a new runner from a validated configuration
    pub fn new(config: &Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        let prober = Prober::new(&config.probe.user_agent, config.request_timeout())
            .context("Failed to create prober")?;

        // A period-based quota holds at most one unconsumed permit, so an
        // idle stretch never lets admissions burst past the rate ceiling.
        let quota =
            Quota::with_period(config.admission_period()).context("Invalid rate limit value")?;
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        let semaphore = Arc::new(Semaphore::new(config.probe.max_concurrent));

        Ok(Self {
            prober: Arc::new(prober),
            rate_limiter,
            semaphore,
            stats: RunStats::new(),
        })
    }

    /// Probe all endpoints and aggregate the outcomes
    ///
    /// Endpoints are admitted in input order, one per rate period, at most
    /// `max_concurrent` in flight. When the shutdown signal fires the loop
    /// stops admitting and drains: already-started probes run to completion
    /// and their outcomes are aggregated.
    pub async fn run(
        &self,
        endpoints: Vec<String>,
        shutdown: &ShutdownSignal,
    ) -> Result<ClassificationBuckets> {
        let total = endpoints.len();
        tracing::info!(
            total,
            max_concurrent = self.semaphore.available_permits(),
            "Starting probe run"
        );

        let (outcome_tx, outcome_rx) = mpsc::channel::<ProbeOutcome>(total.max(1));
        let aggregator = self.spawn_aggregator(outcome_rx);

        let mut cancel_rx = shutdown.subscribe();
        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(total);

        for endpoint in endpoints {
            // Wait for a rate permit or cancellation, whichever comes
            // first. `biased` makes cancellation win the tie, so no probe
            // is admitted after the signal fires.
            tokio::select! {
                biased;
                _ = cancel_rx.wait_for(|cancelled| *cancelled) => {
                    tracing::info!("Cancellation observed, no further admissions");
                    break;
                }
                _ = self.rate_limiter.until_ready() => {}
            }

            // The concurrency gate is a second wait; cancellation must be
            // able to wake it too.
            let permit = tokio::select! {
                biased;
                _ = cancel_rx.wait_for(|cancelled| *cancelled) => {
                    tracing::info!("Cancellation observed while waiting for a slot");
                    break;
                }
                permit = Arc::clone(&self.semaphore).acquire_owned() => {
                    permit.context("Concurrency limiter closed")?
                }
            };

            self.stats.record_admitted();

            let prober = Arc::clone(&self.prober);
            let tx = outcome_tx.clone();
            handles.push(tokio::spawn(async move {
                let outcome = prober.probe(&endpoint).await;
                // The aggregator outlives every probe task; a send only
                // fails if the run itself is being torn down.
                let _ = tx.send(outcome).await;
                drop(permit);
            }));
        }

        // Draining: every already-started probe finishes, nothing new
        // starts regardless of remaining budget.
        futures::future::join_all(handles).await;

        // Dropping the last sender ends the aggregator's receive loop.
        drop(outcome_tx);
        let buckets = aggregator.await.context("Aggregator task panicked")?;

        let snapshot = self.stats.snapshot();
        tracing::info!(
            admitted = snapshot.admitted,
            completed = snapshot.completed,
            responded = snapshot.responded,
            unreachable = snapshot.unreachable,
            "Probe run finished"
        );

        Ok(buckets)
    }

    /// Spawn the single consumer that owns the classification buckets
    fn spawn_aggregator(
        &self,
        mut outcome_rx: mpsc::Receiver<ProbeOutcome>,
    ) -> JoinHandle<ClassificationBuckets> {
        let stats = Arc::clone(&self.stats);
        tokio::spawn(async move {
            let mut buckets = ClassificationBuckets::new();
            while let Some(outcome) = outcome_rx.recv().await {
                stats.record_completed(&outcome);
                buckets.insert(outcome);
            }
            buckets
        })
    }

    /// Get current run statistics
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}
