//! Container Watcher Module
//!
//! One watcher per container runtime endpoint. Each tick it lists the
//! running containers, diffs them against what it last applied, and pushes
//! the difference into the record store.
//!
//! ## Failure policy
//!
//! A failed poll is retried on the next tick. After
//! [`MAX_CONSECUTIVE_FAILURES`] failures in a row the watcher stops for good
//! and reports [`WatcherExit::EndpointExhausted`]; the records it created
//! stay in the store.

mod diff;

pub use diff::{diff, SnapshotDelta};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::api::Metrics;
use crate::docker::{ContainerRuntime, RuntimeError};
use crate::registry::RecordStore;
use crate::types::{HostSnapshot, MAX_CONSECUTIVE_FAILURES};

/// Why a watcher stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherExit {
    /// Shutdown was requested
    Shutdown,

    /// Too many consecutive poll failures
    EndpointExhausted { failures: u32 },
}

/// Result of a single poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Poll succeeded; number of hosts removed and added
    Synced { removed: usize, added: usize },

    /// Poll failed, will retry
    Failed { consecutive: u32 },

    /// Poll failed and the failure budget is spent
    Exhausted,
}

/// Keeps the record store in sync with one runtime endpoint
pub struct ContainerWatcher {
    endpoint: String,
    runtime: Arc<dyn ContainerRuntime>,
    store: Arc<RecordStore>,
    metrics: Arc<Metrics>,
    poll_interval: Duration,

    /// Hosts as currently reflected in the store
    snapshot: HostSnapshot,

    /// Consecutive failed polls
    failures: u32,

    /// Runtime version, fetched once
    version: Option<String>,
}

impl ContainerWatcher {
    pub fn new(
        endpoint: String,
        runtime: Arc<dyn ContainerRuntime>,
        store: Arc<RecordStore>,
        metrics: Arc<Metrics>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            endpoint,
            runtime,
            store,
            metrics,
            poll_interval,
            snapshot: HostSnapshot::new(),
            failures: 0,
            version: None,
        }
    }

    pub fn snapshot(&self) -> &HostSnapshot {
        &self.snapshot
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Poll until shutdown or until the endpoint is given up on
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> WatcherExit {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                _ = interval.tick() => {}
            }

            if *shutdown.borrow() {
                break;
            }

            if self.tick().await == TickOutcome::Exhausted {
                error!(
                    "🛑 {}: reached {} consecutive failures, stopping watcher",
                    self.endpoint, MAX_CONSECUTIVE_FAILURES
                );
                return WatcherExit::EndpointExhausted {
                    failures: self.failures,
                };
            }
        }

        info!("Watcher for {} shut down", self.endpoint);
        WatcherExit::Shutdown
    }

    /// Run one poll and apply its result
    pub async fn tick(&mut self) -> TickOutcome {
        match self.poll().await {
            Ok(current) => {
                let delta = diff(&self.snapshot, &current);
                let outcome = TickOutcome::Synced {
                    removed: delta.removed.len(),
                    added: delta.added.len(),
                };

                self.apply(delta, current).await;
                self.failures = 0;
                self.metrics.inc_polls();
                self.metrics.set_records(self.store.len().await as u64);
                outcome
            }
            Err(e) => {
                self.failures += 1;
                self.metrics.inc_poll_failures();
                warn!(
                    "Request to {} failed ({}/{}): {}",
                    self.endpoint, self.failures, MAX_CONSECUTIVE_FAILURES, e
                );

                if self.failures >= MAX_CONSECUTIVE_FAILURES {
                    TickOutcome::Exhausted
                } else {
                    TickOutcome::Failed {
                        consecutive: self.failures,
                    }
                }
            }
        }
    }

    /// Fetch the current host -> address mapping from the runtime
    async fn poll(&mut self) -> Result<HostSnapshot, RuntimeError> {
        if self.version.is_none() {
            let version = self.runtime.version().await?;
            info!("👀 Started monitoring {} (Docker {})", self.endpoint, version);
            self.version = Some(version);
        }

        let mut hosts = HostSnapshot::new();

        for container in self.runtime.list_containers().await? {
            let details = match self.runtime.inspect_container(&container.id).await {
                Ok(details) => details,
                Err(RuntimeError::NotFound(id)) => {
                    debug!("Container {} vanished during poll", id);
                    continue;
                }
                Err(e) => return Err(e),
            };

            match details.ipv4_address {
                // Keyed like the store: names differing only in case collide
                Some(ip) => {
                    hosts.insert(details.hostname.to_ascii_lowercase(), ip);
                }
                None => debug!(
                    "Skipping container {} ({}): no IPv4 address",
                    container.id, details.hostname
                ),
            }
        }

        Ok(hosts)
    }

    /// Apply removals, then additions, then adopt the new snapshot
    async fn apply(&mut self, delta: SnapshotDelta, mut current: HostSnapshot) {
        if delta.is_empty() {
            return;
        }

        debug!(
            "{}: running containers changed, removed: {:?} added: {:?}",
            self.endpoint, delta.removed, delta.added
        );

        for host in &delta.removed {
            self.store.remove_record(host).await;
        }

        for (host, ip) in &delta.added {
            if let Err(e) = self.store.add_record(host, *ip).await {
                warn!("{}: not adding container host: {}", self.endpoint, e);
                current.remove(host);
            }
        }

        self.snapshot = current;
    }
}
