//! Core types shared by the record store, the DNS responder and the watchers
//!
//! A [`Record`] is what the store holds for one canonical name. Records are
//! always created in A/PTR pairs by the store; see [`crate::registry`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;

// =============================================================================
// DEFAULTS
// =============================================================================

/// Default UDP port for the DNS service
pub const DEFAULT_DNS_PORT: u16 = 53;

/// Default suffix domain appended to container host names
pub const DEFAULT_DOMAIN: &str = "docker";

/// Default interval between container list polls (seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Added to the poll interval to derive the record TTL, so a cached answer
/// expires right after the next poll could have changed it
pub const TTL_MARGIN_SECS: u64 = 1;

/// Consecutive failed polls after which a watcher gives up on its endpoint
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Host identifier -> IPv4 address, as last seen on one endpoint
pub type HostSnapshot = HashMap<String, Ipv4Addr>;

// =============================================================================
// RECORDS
// =============================================================================

/// Kind of record the store can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// Forward record, name -> IPv4 address
    A,

    /// Reverse record, in-addr.arpa name -> canonical name
    #[serde(rename = "PTR")]
    Ptr,
}

impl RecordKind {
    /// DNS RR type code
    pub fn rr_type(&self) -> u16 {
        match self {
            RecordKind::A => 1,
            RecordKind::Ptr => 12,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::A => f.write_str("A"),
            RecordKind::Ptr => f.write_str("PTR"),
        }
    }
}

/// Record payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordData {
    Address(Ipv4Addr),
    Name(String),
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordData::Address(ip) => write!(f, "{}", ip),
            RecordData::Name(name) => f.write_str(name),
        }
    }
}

/// A single record owned by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Canonical (lowercase, fully-qualified) owner name
    pub name: String,

    pub kind: RecordKind,

    pub data: RecordData,

    /// Time to live in seconds
    pub ttl: u32,
}

impl Record {
    pub fn a(name: String, address: Ipv4Addr, ttl: u32) -> Self {
        Self {
            name,
            kind: RecordKind::A,
            data: RecordData::Address(address),
            ttl,
        }
    }

    pub fn ptr(name: String, target: String, ttl: u32) -> Self {
        Self {
            name,
            kind: RecordKind::Ptr,
            data: RecordData::Name(target),
            ttl,
        }
    }

    /// Address of an A record
    pub fn address(&self) -> Option<Ipv4Addr> {
        match self.data {
            RecordData::Address(ip) => Some(ip),
            RecordData::Name(_) => None,
        }
    }

    /// Target of a PTR record
    pub fn target(&self) -> Option<&str> {
        match &self.data {
            RecordData::Name(name) => Some(name),
            RecordData::Address(_) => None,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} -> {}", self.name, self.ttl, self.kind, self.data)
    }
}
