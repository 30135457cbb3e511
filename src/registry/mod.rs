//! Record Registry Module
//!
//! Holds the A/PTR records served by the DNS responder. Written by the
//! container watchers, read on every DNS query. Nothing is persisted: the
//! table is rebuilt from the container runtimes on every start.

mod store;

pub use store::RecordStore;
