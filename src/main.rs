//! docker-dns
//!
//! Serves DNS records for running Docker containers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        DOCKER DNS                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Container Watchers  ←── Poll each Docker endpoint          │
//! │  Record Store        ←── A + PTR record per container       │
//! │  DNS Server (53)     ←── Answers A / PTR queries over UDP   │
//! │  HTTP API (optional) ←── Health, records and metrics        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each container `web` becomes `web.docker.` (suffix configurable) plus
//! the matching `in-addr.arpa.` record, and disappears when the container
//! stops.

use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing::{info, warn};

mod api;
mod config;
mod dns;
mod docker;
mod names;
mod registry;
mod supervisor;
mod types;
mod watcher;

use config::DockerDnsConfig;
use supervisor::Supervisor;

/// docker-dns - DNS names for Docker containers
#[derive(Parser, Debug)]
#[command(name = "docker-dns")]
#[command(author = "docker-dns Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Serves A and PTR records for running Docker containers", long_about = None)]
struct Args {
    /// Docker endpoints to watch, e.g. http://dockerhost:2375
    endpoints: Vec<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "docker-dns.toml")]
    config: PathBuf,

    /// Address to bind the DNS socket to
    #[arg(long)]
    dns_bind: Option<IpAddr>,

    /// DNS server port (requires root or CAP_NET_BIND_SERVICE for port 53)
    #[arg(long)]
    dns_port: Option<u16>,

    /// Domain appended to container host names ("" for none)
    #[arg(long)]
    dns_domain: Option<String>,

    /// Seconds between container polls
    #[arg(long)]
    poll_interval: Option<u64>,

    /// TTL of served records in seconds (default: poll interval + 1)
    #[arg(long)]
    ttl: Option<u64>,

    /// HTTP API port for health, records and metrics
    #[arg(long)]
    api_port: Option<u16>,

    /// Drop queries for unknown names instead of answering empty NOERROR
    #[arg(long)]
    drop_unknown: bool,

    /// Do not answer reverse (PTR) lookups
    #[arg(long)]
    no_reverse: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Shorthand for --log-level debug
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.debug { "debug".to_string() } else { args.log_level.clone() };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.into())
        )
        .init();

    info!("🐳 docker-dns v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = if args.config.exists() {
        DockerDnsConfig::load(&args.config)?
    } else {
        warn!("Config file not found, using defaults");
        DockerDnsConfig::default()
    };

    // Override config with CLI args
    let mut config = config
        .with_endpoints(args.endpoints)
        .with_bind_address(args.dns_bind)
        .with_dns_port(args.dns_port)
        .with_dns_domain(args.dns_domain)
        .with_poll_interval(args.poll_interval)
        .with_ttl(args.ttl)
        .with_api_port(args.api_port);
    if args.drop_unknown {
        config = config.with_answer_unknown(false);
    }
    if args.no_reverse {
        config = config.with_reverse_lookups(false);
    }

    config.validate()?;

    info!("⚙️  Configuration:");
    info!("   DNS: {}", config.dns_addr());
    info!("   Domain: {}", config.domain().as_deref().unwrap_or("(none)"));
    info!("   Poll interval: {}s", config.poll_interval_secs);
    info!("   TTL: {}s", config.ttl());
    for endpoint in &config.endpoints {
        info!("   Endpoint: {}", endpoint);
    }
    if let Some(addr) = config.api_addr() {
        info!("   API: {}", addr);
    }

    let mut supervisor = Supervisor::start(&config).await?;
    info!("   Press Ctrl+C to shutdown gracefully");

    // Wait for shutdown signal or responder failure
    let result = supervisor
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!(
        "📊 {} records, {} active watcher(s), {} queries served",
        supervisor.store().len().await,
        supervisor.active_watchers(),
        supervisor.metrics().dns_queries.load(Ordering::Relaxed)
    );

    supervisor.shutdown().await?;
    result
}
