//! HTTP API Module
//!
//! Optional status endpoints: health, the current record set and metrics.

mod routes;
mod metrics;

pub use routes::{run_api_server, ApiState};
pub use metrics::Metrics;
