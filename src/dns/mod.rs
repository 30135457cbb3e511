//! DNS Server Module
//!
//! Answers queries for container names from the record store.
//!
//! ## DNS Records
//!
//! - A records: `<hostname>.<domain>.` -> container IPv4 address
//! - PTR records: `<reversed address>.in-addr.arpa.` -> `<hostname>.<domain>.`
//!
//! Names the store does not hold get an empty NOERROR reply, never NXDOMAIN.

mod handler;
mod server;
pub mod wire;

pub use handler::{DockerDnsHandler, ResponsePolicy};
pub use server::DnsServer;
