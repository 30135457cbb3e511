//! Docker Engine API client
//!
//! Talks plain HTTP(S) to a Docker daemon exposed on TCP, e.g.
//! `http://dockerhost:2375`. Unix sockets are not supported.

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::debug;

use super::{ContainerDetails, ContainerRuntime, ContainerSummary, RuntimeError};

#[derive(Debug, Deserialize)]
struct VersionResponse {
    #[serde(rename = "Version")]
    version: String,

    #[serde(rename = "ApiVersion", default)]
    api_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContainerListEntry {
    #[serde(rename = "Id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct InspectResponse {
    #[serde(rename = "Config")]
    config: InspectConfig,

    #[serde(rename = "NetworkSettings", default)]
    network_settings: Option<NetworkSettings>,
}

#[derive(Debug, Deserialize)]
struct InspectConfig {
    #[serde(rename = "Hostname")]
    hostname: String,
}

#[derive(Debug, Default, Deserialize)]
struct NetworkSettings {
    #[serde(rename = "IPAddress", default)]
    ip_address: Option<String>,

    #[serde(rename = "Networks", default)]
    networks: Option<BTreeMap<String, EndpointSettings>>,
}

#[derive(Debug, Deserialize)]
struct EndpointSettings {
    #[serde(rename = "IPAddress", default)]
    ip_address: Option<String>,
}

impl NetworkSettings {
    /// Legacy top-level address first, then the first attached network
    fn ipv4_address(&self) -> Option<Ipv4Addr> {
        let parse = |s: &Option<String>| s.as_deref().and_then(|s| s.parse::<Ipv4Addr>().ok());

        parse(&self.ip_address).or_else(|| {
            self.networks
                .iter()
                .flat_map(|networks| networks.values())
                .find_map(|endpoint| parse(&endpoint.ip_address))
        })
    }
}

/// HTTP client for one Docker endpoint
pub struct DockerClient {
    http: reqwest::Client,
    base: Url,
}

impl DockerClient {
    /// Create a client for `endpoint`. Requests time out after `timeout`.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, RuntimeError> {
        let invalid = |reason: String| RuntimeError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        let base = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(invalid(format!("unsupported scheme {}", base.scheme())));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self { http, base })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base.as_str().trim_end_matches('/'), path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RuntimeError> {
        let url = self.url(path);
        debug!(url = %url, "GET request");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| RuntimeError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RuntimeError::Status {
                url,
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| RuntimeError::Http { url, source })
    }
}

#[async_trait]
impl ContainerRuntime for DockerClient {
    async fn version(&self) -> Result<String, RuntimeError> {
        let version: VersionResponse = self.get("/version").await?;
        Ok(match version.api_version {
            Some(api) => format!("{} (API {})", version.version, api),
            None => version.version,
        })
    }

    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError> {
        let entries: Vec<ContainerListEntry> = self.get("/containers/json").await?;
        Ok(entries
            .into_iter()
            .map(|entry| ContainerSummary { id: entry.id })
            .collect())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails, RuntimeError> {
        let path = format!("/containers/{}/json", id);
        let inspect: InspectResponse = match self.get(&path).await {
            Err(RuntimeError::Status { status: 404, .. }) => {
                return Err(RuntimeError::NotFound(id.to_string()))
            }
            other => other?,
        };

        Ok(ContainerDetails {
            hostname: inspect.config.hostname,
            ipv4_address: inspect
                .network_settings
                .unwrap_or_default()
                .ipv4_address(),
        })
    }
}
