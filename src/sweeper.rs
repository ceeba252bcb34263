// src/sweeper.rs
use log::{debug, info};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use crate::config::Config;
use crate::query::{query_server, QueryTimeouts};
use crate::storage::memory::{ServerRegistry, SweepOutcome};

/// Periodically evicts stale servers and queries the survivors.
///
/// Queries are fire-and-forget, but at most `max_concurrent_queries` run at
/// once across all cycles. Waiting for a permit happens in a dispatch task,
/// never in the sweep loop itself. A new cycle drops whatever the previous
/// cycle had not yet started; queries already running are left alone.
pub struct Sweeper {
    registry: Arc<ServerRegistry>,
    interval: Duration,
    stale_after: Duration,
    timeouts: QueryTimeouts,
    permits: Arc<Semaphore>,
    pending: Mutex<Option<AbortHandle>>,
}

impl Sweeper {
    pub fn new(registry: Arc<ServerRegistry>, config: &Config) -> Self {
        Self {
            registry,
            interval: config.sweep_interval(),
            stale_after: config.stale_threshold(),
            timeouts: QueryTimeouts::from(config),
            permits: Arc::new(Semaphore::new(config.max_concurrent_queries.max(1))),
            pending: Mutex::new(None),
        }
    }

    /// One cycle: evict, then dispatch queries for everything left.
    /// The returned handle resolves once every query has been handed a permit,
    /// or is cancelled if the next cycle starts first.
    pub fn sweep(&self) -> (SweepOutcome, JoinHandle<()>) {
        let outcome = self.registry.evict_older_than(self.stale_after);
        for address in &outcome.evicted {
            info!("Server removed (timeout): {}", address);
        }
        debug!(
            "Sweep evicted {} servers, querying {}",
            outcome.evicted.len(),
            outcome.live.len()
        );

        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            if !previous.is_finished() {
                debug!("Dropping queries the previous sweep never started");
                previous.abort();
            }
        }
        let dispatch = self.dispatch(outcome.live.clone());
        *pending = Some(dispatch.abort_handle());

        (outcome, dispatch)
    }

    fn dispatch(&self, targets: Vec<SocketAddr>) -> JoinHandle<()> {
        let registry = self.registry.clone();
        let permits = self.permits.clone();
        let timeouts = self.timeouts;

        tokio::spawn(async move {
            for target in targets {
                let permit = match permits.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                if !registry.contains(&target) {
                    continue;
                }
                let registry = registry.clone();
                tokio::spawn(async move {
                    query_server(&registry, target, timeouts).await;
                    drop(permit);
                });
            }
        })
    }

    /// Sweeps forever. The first cycle runs one interval after start.
    pub async fn run(self) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Sweeping every {:?}, evicting servers silent for {:?}",
            self.interval, self.stale_after
        );

        loop {
            ticker.tick().await;
            // dispatch runs detached; the next sweep cancels what it left over
            let _ = self.sweep();
        }
    }
}
