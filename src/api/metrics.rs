//! Metrics Collection
//!
//! Counters updated by the DNS responder and the container watchers,
//! exported by the status API.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Metrics collector shared by all tasks
#[derive(Default)]
pub struct Metrics {
    /// Start time for uptime calculation
    start_time: Option<Instant>,

    /// Datagrams received on the DNS socket
    pub dns_queries: AtomicU64,

    /// Replies carrying at least one answer
    pub dns_answered: AtomicU64,

    /// NOERROR replies without answers
    pub dns_empty: AtomicU64,

    /// FORMERR replies
    pub dns_formerr: AtomicU64,

    /// NOTIMP replies
    pub dns_notimp: AtomicU64,

    /// Datagrams dropped without a reply
    pub dns_dropped: AtomicU64,

    /// Successful container polls
    pub polls: AtomicU64,

    /// Failed container polls
    pub poll_failures: AtomicU64,

    /// Watchers still running
    pub active_watchers: AtomicU64,

    /// Records currently held by the store
    pub records: AtomicU64,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0)
    }

    pub fn inc_dns_queries(&self) {
        self.dns_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dns_answered(&self) {
        self.dns_answered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dns_empty(&self) {
        self.dns_empty.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dns_formerr(&self) {
        self.dns_formerr.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dns_notimp(&self) {
        self.dns_notimp.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dns_dropped(&self) {
        self.dns_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_polls(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_poll_failures(&self) {
        self.poll_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn watcher_started(&self) {
        self.active_watchers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn watcher_stopped(&self) {
        self.active_watchers.fetch_sub(1, Ordering::Relaxed);
    }

    /// Update record count
    pub fn set_records(&self, count: u64) {
        self.records.store(count, Ordering::Relaxed);
    }

    /// Export metrics in Prometheus format
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();

        write_metric(&mut output, "uptime_seconds", "Uptime in seconds", "gauge", self.uptime_secs());

        // DNS
        let counters = [
            ("dns_queries_total", "DNS datagrams received", &self.dns_queries),
            ("dns_answered_total", "Replies with answers", &self.dns_answered),
            ("dns_empty_total", "NOERROR replies without answers", &self.dns_empty),
            ("dns_formerr_total", "FORMERR replies", &self.dns_formerr),
            ("dns_notimp_total", "NOTIMP replies", &self.dns_notimp),
            ("dns_dropped_total", "Datagrams dropped without reply", &self.dns_dropped),
            // Watchers
            ("polls_total", "Successful container polls", &self.polls),
            ("poll_failures_total", "Failed container polls", &self.poll_failures),
        ];
        for (name, help, value) in counters {
            write_metric(&mut output, name, help, "counter", value.load(Ordering::Relaxed));
        }

        write_metric(
            &mut output,
            "active_watchers",
            "Container watchers still running",
            "gauge",
            self.active_watchers.load(Ordering::Relaxed),
        );
        write_metric(
            &mut output,
            "records",
            "Records held by the store",
            "gauge",
            self.records.load(Ordering::Relaxed),
        );

        output
    }

    /// Export metrics as JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "uptime_secs": self.uptime_secs(),
            "dns": {
                "queries": self.dns_queries.load(Ordering::Relaxed),
                "answered": self.dns_answered.load(Ordering::Relaxed),
                "empty": self.dns_empty.load(Ordering::Relaxed),
                "formerr": self.dns_formerr.load(Ordering::Relaxed),
                "notimp": self.dns_notimp.load(Ordering::Relaxed),
                "dropped": self.dns_dropped.load(Ordering::Relaxed),
            },
            "watchers": {
                "active": self.active_watchers.load(Ordering::Relaxed),
                "polls": self.polls.load(Ordering::Relaxed),
                "poll_failures": self.poll_failures.load(Ordering::Relaxed),
            },
            "records": self.records.load(Ordering::Relaxed),
        })
    }
}

fn write_metric(output: &mut String, name: &str, help: &str, kind: &str, value: u64) {
    let _ = write!(
        output,
        "# HELP docker_dns_{name} {help}\n\
         # TYPE docker_dns_{name} {kind}\n\
         docker_dns_{name} {value}\n\n",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_increment() {
        let metrics = Metrics::new();

        metrics.inc_dns_queries();
        metrics.inc_dns_queries();
        metrics.inc_dns_notimp();

        assert_eq!(metrics.dns_queries.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.dns_notimp.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_watcher_gauge() {
        let metrics = Metrics::new();
        metrics.watcher_started();
        metrics.watcher_started();
        metrics.watcher_stopped();
        assert_eq!(metrics.active_watchers.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_prometheus_format() {
        let metrics = Metrics::new();
        metrics.set_records(4);
        metrics.inc_poll_failures();

        let output = metrics.to_prometheus();

        assert!(output.contains("# TYPE docker_dns_records gauge"));
        assert!(output.contains("docker_dns_records 4"));
        assert!(output.contains("docker_dns_poll_failures_total 1"));
    }

    #[test]
    fn test_json_format() {
        let metrics = Metrics::new();
        metrics.inc_dns_answered();

        let json = metrics.to_json();

        assert_eq!(json["dns"]["answered"], 1);
        assert_eq!(json["records"], 0);
    }
}
