//! In-memory record store
//!
//! One mutex guards the whole map, so an A record and its PTR partner are
//! always inserted and removed together as far as any reader can tell.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::names::{to_canonical_name, to_reverse_name, NameError};
use crate::types::{Record, RecordKind};

/// Record table shared between the DNS responder and the watchers
pub struct RecordStore {
    /// Canonical name -> record
    records: Mutex<HashMap<String, Record>>,

    /// Normalized suffix domain
    domain: Option<String>,

    /// TTL applied to every record (seconds)
    ttl: u32,
}

impl RecordStore {
    /// Create an empty store
    pub fn new(domain: Option<String>, ttl: u32) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            domain,
            ttl,
        }
    }

    /// Suffix domain records are created under
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Canonical forward name for a host identifier
    pub fn canonical_name(&self, host_id: &str) -> Result<String, NameError> {
        to_canonical_name(host_id, self.domain.as_deref())
    }

    /// Insert or replace the A/PTR pair for a host
    pub async fn add_record(&self, host_id: &str, address: Ipv4Addr) -> Result<(), NameError> {
        let name = self.canonical_name(host_id)?;
        let reverse = to_reverse_name(address);
        let a = Record::a(name.clone(), address, self.ttl);
        let ptr = Record::ptr(reverse.clone(), name.clone(), self.ttl);

        {
            let mut records = self.records.lock().await;

            // Host moved: drop the PTR left behind at the previous address
            if let Some(previous) = records.get(&name).and_then(Record::address) {
                if previous != address {
                    remove_ptr_if_owned(&mut records, previous, &name);
                }
            }

            records.insert(name, a.clone());
            records.insert(reverse, ptr.clone());
        }

        info!("Added record: {}", a);
        info!("Added record: {}", ptr);
        Ok(())
    }

    /// Remove the A/PTR pair for a host. Returns false if no A record existed.
    pub async fn remove_record(&self, host_id: &str) -> bool {
        let name = match self.canonical_name(host_id) {
            Ok(name) => name,
            Err(e) => {
                debug!("Not removing {}: {}", host_id, e);
                return false;
            }
        };

        let (removed, removed_ptr) = {
            let mut records = self.records.lock().await;
            match records.get(&name).map(|r| r.kind) {
                Some(RecordKind::A) => {
                    let removed = records.remove(&name);
                    let removed_ptr = removed
                        .as_ref()
                        .and_then(Record::address)
                        .and_then(|ip| remove_ptr_if_owned(&mut records, ip, &name));
                    (removed, removed_ptr)
                }
                _ => (None, None),
            }
        };

        match removed {
            Some(record) => {
                info!("Removed record: {}", record);
                if let Some(ptr) = removed_ptr {
                    info!("Removed record: {}", ptr);
                }
                true
            }
            None => {
                debug!("No record found for: {}", name);
                false
            }
        }
    }

    /// Exact-match lookup of a canonical (lowercase, rooted) name
    pub async fn lookup(&self, name: &str, kind: RecordKind) -> Option<Record> {
        let records = self.records.lock().await;
        records.get(name).filter(|r| r.kind == kind).cloned()
    }

    /// Whatever record is stored under a name, regardless of kind
    pub async fn get(&self, name: &str) -> Option<Record> {
        self.records.lock().await.get(name).cloned()
    }

    /// Number of records (A and PTR counted separately)
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Snapshot of all records, sorted by name
    pub async fn records(&self) -> Vec<Record> {
        let mut all: Vec<Record> = self.records.lock().await.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }
}

/// Remove the PTR record for `address` only if it still points at `owner`.
/// Another host may have claimed the address since.
fn remove_ptr_if_owned(
    records: &mut HashMap<String, Record>,
    address: Ipv4Addr,
    owner: &str,
) -> Option<Record> {
    let reverse = to_reverse_name(address);
    let owned = records
        .get(&reverse)
        .map(|r| r.kind == RecordKind::Ptr && r.target() == Some(owner))
        .unwrap_or(false);

    if owned {
        records.remove(&reverse)
    } else {
        None
    }
}
