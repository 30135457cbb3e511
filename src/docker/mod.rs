//! Container Runtime Module
//!
//! The watchers only see the [`ContainerRuntime`] trait; [`DockerClient`]
//! implements it over the Docker Engine HTTP API.

mod client;

pub use client::DockerClient;

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Entry of the running container list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: String,
}

/// What a watcher needs to know about one container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDetails {
    pub hostname: String,

    /// None for containers without an IPv4 address (host networking etc.)
    pub ipv4_address: Option<Ipv4Addr>,
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Container {0} not found")]
    NotFound(String),

    #[error("Invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

/// A container runtime endpoint the watchers can poll
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Runtime version string, used for logging
    async fn version(&self) -> Result<String, RuntimeError>;

    /// Currently running containers
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError>;

    /// Host name and address of one container
    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails, RuntimeError>;
}
