//! Supervisor
//!
//! Wires the record store, the DNS responder, one watcher per endpoint and
//! the optional status API together, and tears them down on shutdown.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       DOCKER DNS                         │
//! ├──────────────────────────────────────────────────────────┤
//! │  Container Watchers (1/endpoint) ──► RecordStore         │
//! │  DNS Responder (UDP 53)          ◄── RecordStore         │
//! │  HTTP API (optional)             ◄── RecordStore/Metrics │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! A watcher that gives up does not bring the service down: the responder
//! keeps serving whatever records are left.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::api::{run_api_server, ApiState, Metrics};
use crate::config::{ConfigError, DockerDnsConfig};
use crate::dns::{DnsServer, DockerDnsHandler};
use crate::docker::{ContainerRuntime, DockerClient};
use crate::registry::RecordStore;
use crate::watcher::{ContainerWatcher, WatcherExit};

/// Something the supervisor has to react to
enum Event {
    Signal,
    Watcher(String, WatcherExit),
    Responder(anyhow::Result<()>),
}

/// Running service
pub struct Supervisor {
    store: Arc<RecordStore>,
    metrics: Arc<Metrics>,
    dns_addr: SocketAddr,

    shutdown: watch::Sender<bool>,
    dns_task: Option<JoinHandle<anyhow::Result<()>>>,
    api_task: Option<JoinHandle<()>>,
    watcher_tasks: Vec<JoinHandle<()>>,

    exits: mpsc::UnboundedReceiver<(String, WatcherExit)>,
    active_watchers: usize,
}

impl Supervisor {
    /// Start against the Docker endpoints named in `config`
    pub async fn start(config: &DockerDnsConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let mut runtimes: Vec<(String, Arc<dyn ContainerRuntime>)> = Vec::new();
        for endpoint in &config.endpoints {
            // A request must not outlive the poll it belongs to
            let client: Arc<dyn ContainerRuntime> =
                Arc::new(DockerClient::new(endpoint, config.poll_interval())?);
            runtimes.push((endpoint.clone(), client));
        }

        Self::start_with_runtimes(config, runtimes).await
    }

    /// Start with already constructed runtimes, one watcher each
    pub async fn start_with_runtimes(
        config: &DockerDnsConfig,
        runtimes: Vec<(String, Arc<dyn ContainerRuntime>)>,
    ) -> anyhow::Result<Self> {
        if runtimes.is_empty() {
            return Err(ConfigError::NoEndpoints.into());
        }

        let store = Arc::new(RecordStore::new(config.domain(), config.ttl()));
        let metrics = Arc::new(Metrics::new());
        let (shutdown, shutdown_rx) = watch::channel(false);

        // DNS responder
        let handler = DockerDnsHandler::new(store.clone(), config.policy(), metrics.clone());
        let server = DnsServer::bind(config.dns_addr(), handler).await?;
        let dns_addr = server.local_addr()?;
        let dns_task = tokio::spawn(server.run(shutdown_rx.clone()));

        // Watchers
        let (exit_tx, exits) = mpsc::unbounded_channel();
        let mut watcher_tasks = Vec::with_capacity(runtimes.len());

        for (endpoint, runtime) in runtimes {
            let watcher = ContainerWatcher::new(
                endpoint.clone(),
                runtime,
                store.clone(),
                metrics.clone(),
                config.poll_interval(),
            );
            let exit_tx = exit_tx.clone();
            let metrics = metrics.clone();
            let rx = shutdown_rx.clone();

            metrics.watcher_started();
            watcher_tasks.push(tokio::spawn(async move {
                let exit = watcher.run(rx).await;
                metrics.watcher_stopped();
                let _ = exit_tx.send((endpoint, exit));
            }));
        }
        let active_watchers = watcher_tasks.len();

        // HTTP API
        let api_task = config.api_addr().map(|addr| {
            let state = Arc::new(ApiState {
                store: store.clone(),
                metrics: metrics.clone(),
            });
            let rx = shutdown_rx.clone();
            tokio::spawn(async move {
                if let Err(e) = run_api_server(addr, state, rx).await {
                    error!("HTTP API exited: {}", e);
                }
            })
        });

        info!("✅ All services started");
        info!("   Watching {} Docker endpoint(s)", active_watchers);

        Ok(Self {
            store,
            metrics,
            dns_addr,
            shutdown,
            dns_task: Some(dns_task),
            api_task,
            watcher_tasks,
            exits,
            active_watchers,
        })
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Address the DNS socket is bound to
    pub fn dns_addr(&self) -> SocketAddr {
        self.dns_addr
    }

    /// Number of watchers still running
    pub fn active_watchers(&self) -> usize {
        self.active_watchers
    }

    /// Supervise until `signal` resolves. Returns an error if the DNS
    /// responder stops on its own.
    pub async fn run_until<F>(&mut self, signal: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(signal);

        loop {
            let event = {
                let Some(dns_task) = self.dns_task.as_mut() else {
                    anyhow::bail!("DNS responder is not running");
                };

                tokio::select! {
                    _ = &mut signal => Event::Signal,
                    Some((endpoint, exit)) = self.exits.recv() => Event::Watcher(endpoint, exit),
                    joined = dns_task => Event::Responder(joined.map_err(anyhow::Error::from).and_then(|r| r)),
                }
            };

            match event {
                Event::Signal => {
                    info!("🛑 Shutdown signal received");
                    return Ok(());
                }
                Event::Watcher(endpoint, exit) => self.on_watcher_exit(&endpoint, exit),
                Event::Responder(result) => {
                    self.dns_task = None;
                    error!("DNS server exited: {:?}", result);
                    return match result {
                        Ok(()) => Err(anyhow::anyhow!("DNS server exited unexpectedly")),
                        Err(e) => Err(e),
                    };
                }
            }
        }
    }

    fn on_watcher_exit(&mut self, endpoint: &str, exit: WatcherExit) {
        self.active_watchers = self.active_watchers.saturating_sub(1);

        if let WatcherExit::EndpointExhausted { failures } = exit {
            warn!(
                "Stopped watching {} after {} failed polls, its records stay served",
                endpoint, failures
            );
        }

        if self.active_watchers == 0 {
            warn!("⚠️  No Docker endpoints left to watch, serving remaining records");
        }
    }

    /// Stop every task and wait for them. The DNS socket is closed on return.
    pub async fn shutdown(mut self) -> anyhow::Result<()> {
        let _ = self.shutdown.send(true);

        for task in self.watcher_tasks.drain(..) {
            if let Err(e) = task.await {
                error!("Watcher task failed: {}", e);
            }
        }

        if let Some(task) = self.api_task.take() {
            if let Err(e) = task.await {
                error!("HTTP API task failed: {}", e);
            }
        }

        let result = match self.dns_task.take() {
            Some(task) => task.await?,
            None => Ok(()),
        };

        info!("👋 docker-dns shut down");
        result
    }
}
