//! docker-dns Configuration
//!
//! Loaded from a TOML file, then overridden by command line flags.
//! Every field has a default so a partial file is fine.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dns::ResponsePolicy;
use crate::names::{normalize_suffix, to_canonical_name};
use crate::types::{DEFAULT_DNS_PORT, DEFAULT_DOMAIN, DEFAULT_POLL_INTERVAL_SECS, TTL_MARGIN_SECS};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("No Docker endpoints configured")]
    NoEndpoints,

    #[error("Invalid endpoint {0}: expected an http:// or https:// URL")]
    InvalidEndpoint(String),

    #[error("Endpoint {0} is listed more than once")]
    DuplicateEndpoint(String),

    #[error("poll_interval_secs must be greater than zero")]
    ZeroPollInterval,

    #[error("Invalid DNS domain {domain:?}: {reason}")]
    InvalidDomain { domain: String, reason: String },
}

/// Main configuration for the docker-dns service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerDnsConfig {
    // === Network ===

    /// Address the DNS socket binds to
    pub bind_address: IpAddr,

    /// UDP port for DNS
    pub dns_port: u16,

    /// Port for the HTTP status API, disabled when unset
    pub api_port: Option<u16>,

    // === Naming ===

    /// Suffix appended to container host names; empty for none
    pub dns_domain: String,

    /// TTL of served records (seconds). Defaults to poll interval + 1
    pub ttl_secs: Option<u64>,

    // === Docker ===

    /// Docker daemon URLs, e.g. `http://dockerhost:2375`
    pub endpoints: Vec<String>,

    /// Interval between container polls (seconds)
    pub poll_interval_secs: u64,

    // === Responses ===

    /// Reply with empty NOERROR for unknown names; drop the query otherwise
    pub answer_unknown: bool,

    /// Answer PTR queries
    pub reverse_lookups: bool,
}

impl Default for DockerDnsConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            dns_port: DEFAULT_DNS_PORT,
            api_port: None,
            dns_domain: DEFAULT_DOMAIN.to_string(),
            ttl_secs: None,
            endpoints: vec![],
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            answer_unknown: true,
            reverse_lookups: true,
        }
    }
}

impl DockerDnsConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    // Builder-style methods for CLI overrides

    pub fn with_bind_address(mut self, addr: Option<IpAddr>) -> Self {
        if let Some(addr) = addr {
            self.bind_address = addr;
        }
        self
    }

    pub fn with_dns_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.dns_port = port;
        }
        self
    }

    pub fn with_api_port(mut self, port: Option<u16>) -> Self {
        if port.is_some() {
            self.api_port = port;
        }
        self
    }

    pub fn with_dns_domain(mut self, domain: Option<String>) -> Self {
        if let Some(domain) = domain {
            self.dns_domain = domain;
        }
        self
    }

    pub fn with_poll_interval(mut self, secs: Option<u64>) -> Self {
        if let Some(secs) = secs {
            self.poll_interval_secs = secs;
        }
        self
    }

    pub fn with_ttl(mut self, secs: Option<u64>) -> Self {
        if secs.is_some() {
            self.ttl_secs = secs;
        }
        self
    }

    /// Endpoints given on the command line replace the configured ones
    pub fn with_endpoints(mut self, endpoints: Vec<String>) -> Self {
        if !endpoints.is_empty() {
            self.endpoints = endpoints;
        }
        self
    }

    pub fn with_answer_unknown(mut self, answer: bool) -> Self {
        self.answer_unknown = answer;
        self
    }

    pub fn with_reverse_lookups(mut self, enabled: bool) -> Self {
        self.reverse_lookups = enabled;
        self
    }

    // Derived values

    pub fn dns_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.dns_port)
    }

    pub fn api_addr(&self) -> Option<SocketAddr> {
        self.api_port
            .map(|port| SocketAddr::new(self.bind_address, port))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Record TTL; outlives one poll so clients never cache past a refresh
    pub fn ttl(&self) -> u32 {
        let secs = self
            .ttl_secs
            .unwrap_or(self.poll_interval_secs.saturating_add(TTL_MARGIN_SECS));
        u32::try_from(secs).unwrap_or(u32::MAX)
    }

    /// Normalized suffix domain, `None` when names are not suffixed
    pub fn domain(&self) -> Option<String> {
        normalize_suffix(&self.dns_domain)
    }

    pub fn policy(&self) -> ResponsePolicy {
        ResponsePolicy {
            answer_unknown: self.answer_unknown,
            reverse_lookups: self.reverse_lookups,
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }

        let mut seen = HashSet::new();
        for endpoint in &self.endpoints {
            let url = reqwest::Url::parse(endpoint)
                .map_err(|_| ConfigError::InvalidEndpoint(endpoint.clone()))?;
            if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
                return Err(ConfigError::InvalidEndpoint(endpoint.clone()));
            }
            if !seen.insert(url.as_str().trim_end_matches('/').to_string()) {
                return Err(ConfigError::DuplicateEndpoint(endpoint.clone()));
            }
        }

        if self.poll_interval_secs == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }

        if let Some(domain) = self.domain() {
            // A one-label host under the suffix must be representable
            to_canonical_name("a", Some(&domain)).map_err(|e| ConfigError::InvalidDomain {
                domain: self.dns_domain.clone(),
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn with_endpoint() -> DockerDnsConfig {
        DockerDnsConfig::default().with_endpoints(vec!["http://dockerhost:2375".to_string()])
    }

    #[test]
    fn test_default_config() {
        let config = DockerDnsConfig::default();
        assert_eq!(config.dns_port, 53);
        assert_eq!(config.dns_domain, "docker");
        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.ttl(), 11);
        assert_eq!(config.api_addr(), None);
        assert_eq!(config.policy(), ResponsePolicy::default());
        assert_eq!(config.dns_addr().to_string(), "0.0.0.0:53");
    }

    #[test]
    fn test_config_validation() {
        assert!(matches!(
            DockerDnsConfig::default().validate(),
            Err(ConfigError::NoEndpoints)
        ));
        assert!(with_endpoint().validate().is_ok());

        let config = with_endpoint().with_poll_interval(Some(0));
        assert!(matches!(config.validate(), Err(ConfigError::ZeroPollInterval)));

        let config = DockerDnsConfig::default()
            .with_endpoints(vec!["unix:///var/run/docker.sock".to_string()]);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidEndpoint(_))));

        let config = DockerDnsConfig::default().with_endpoints(vec![
            "http://a:2375".to_string(),
            "http://a:2375/".to_string(),
        ]);
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateEndpoint(_))));

        let config = with_endpoint().with_dns_domain(Some("bad domain".to_string()));
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDomain { .. })));
    }

    #[test]
    fn test_empty_domain_means_no_suffix() {
        let config = with_endpoint().with_dns_domain(Some(".".to_string()));
        assert!(config.validate().is_ok());
        assert_eq!(config.domain(), None);

        let config = with_endpoint().with_dns_domain(Some("Corp.Local.".to_string()));
        assert_eq!(config.domain().as_deref(), Some("corp.local"));
    }

    #[test]
    fn test_builder_methods() {
        let config = DockerDnsConfig::default()
            .with_dns_port(Some(5353))
            .with_api_port(Some(9090))
            .with_poll_interval(Some(30))
            .with_bind_address(Some("127.0.0.1".parse().unwrap()))
            .with_answer_unknown(false)
            .with_reverse_lookups(false);

        assert_eq!(config.dns_port, 5353);
        assert_eq!(config.api_addr().unwrap().to_string(), "127.0.0.1:9090");
        assert_eq!(config.ttl(), 31);
        assert!(!config.policy().answer_unknown);
        assert!(!config.policy().reverse_lookups);

        // Unset overrides keep existing values
        let config = config.with_dns_port(None).with_ttl(None).with_endpoints(vec![]);
        assert_eq!(config.dns_port, 5353);
        assert_eq!(config.ttl(), 31);

        assert_eq!(config.with_ttl(Some(60)).ttl(), 60);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
dns_port = 5300
dns_domain = "containers"
endpoints = ["http://host-a:2375", "https://host-b:2376"]
reverse_lookups = false
"#
        )
        .unwrap();

        let config = DockerDnsConfig::load(file.path()).unwrap();
        assert_eq!(config.dns_port, 5300);
        assert_eq!(config.dns_domain, "containers");
        assert_eq!(config.endpoints.len(), 2);
        assert!(!config.reverse_lookups);
        // Defaults fill the rest
        assert_eq!(config.poll_interval_secs, 10);
        assert!(config.answer_unknown);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            DockerDnsConfig::load(&missing),
            Err(ConfigError::Read { .. })
        ));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "dns_port = \"not a port\"").unwrap();
        assert!(matches!(
            DockerDnsConfig::load(&bad),
            Err(ConfigError::Parse { .. })
        ));
    }
}
