//! DNS Request Handler
//!
//! Turns one inbound datagram into at most one reply, answering from the
//! record store. Every datagram is handled on its own; nothing here can
//! fail in a way that reaches the receive loop.

use std::sync::Arc;
use tracing::debug;

use crate::api::Metrics;
use crate::dns::wire::{
    self, Header, Query, Rcode, Response, CLASS_ANY, CLASS_IN, MIN_UDP_PAYLOAD, OPCODE_QUERY,
    TYPE_ANY, TYPE_PTR,
};
use crate::registry::RecordStore;
use crate::types::RecordKind;

/// How to answer queries the store has nothing for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponsePolicy {
    /// Reply with an empty NOERROR for unknown names instead of dropping
    pub answer_unknown: bool,

    /// Serve PTR records
    pub reverse_lookups: bool,
}

impl Default for ResponsePolicy {
    fn default() -> Self {
        Self {
            answer_unknown: true,
            reverse_lookups: true,
        }
    }
}

/// DNS handler answering from the record store
pub struct DockerDnsHandler {
    store: Arc<RecordStore>,
    policy: ResponsePolicy,
    metrics: Arc<Metrics>,
}

impl DockerDnsHandler {
    /// Create a new DNS handler
    pub fn new(store: Arc<RecordStore>, policy: ResponsePolicy, metrics: Arc<Metrics>) -> Self {
        Self {
            store,
            policy,
            metrics,
        }
    }

    /// Process one datagram, returning the wire bytes to send back, if any
    pub async fn handle(&self, packet: &[u8]) -> Option<Vec<u8>> {
        self.metrics.inc_dns_queries();

        let reply = match wire::decode(packet) {
            Ok(query) => self.respond(query).await,
            Err(e) => {
                debug!("Malformed DNS packet: {}", e);
                salvage_formerr(packet)
            }
        };

        match &reply {
            Some(response) => self.count(response),
            None => self.metrics.inc_dns_dropped(),
        }

        reply.map(|(response, max_size)| response.encode(max_size))
    }

    /// Validate and resolve a decoded query
    async fn respond(&self, query: Query) -> Option<(Response, usize)> {
        let header = query.header;

        if header.is_response() {
            debug!("Ignoring response message id={}", header.id);
            return None;
        }
        if header.rcode() != Rcode::NoError as u8 {
            return Some(error(&query, Rcode::FormErr));
        }
        if header.opcode() != OPCODE_QUERY {
            return Some(error(&query, Rcode::NotImp));
        }
        if query.edns.is_some_and(|e| e.version > 0) {
            return Some(error(&query, Rcode::FormErr));
        }

        let qtype = query.question.qtype;
        if !wire::is_rr_type(qtype) && qtype != TYPE_ANY {
            return Some(error(&query, Rcode::NotImp));
        }

        let max_size = query.max_payload();
        let name = query.question.lookup_name();
        let qclass = query.question.qclass;

        let mut response = Response::reply_to(&header);
        response.edns = query.edns.is_some();

        if qclass == CLASS_IN || qclass == CLASS_ANY {
            if qtype == TYPE_PTR {
                if self.policy.reverse_lookups {
                    if let Some(record) = self.store.lookup(&name, RecordKind::Ptr).await {
                        response.set_authoritative();
                        response.answers.push(record);
                    }
                }
            } else {
                match self.store.get(&name).await {
                    Some(record)
                        if record.kind == RecordKind::Ptr && !self.policy.reverse_lookups => {}
                    Some(record) if qtype == TYPE_ANY || record.kind.rr_type() == qtype => {
                        if record.kind == RecordKind::Ptr {
                            response.set_authoritative();
                        }
                        response.answers.push(record);
                    }
                    Some(_) => {}
                    None if !self.policy.answer_unknown => {
                        debug!("No record for {}, dropping", name);
                        return None;
                    }
                    None => {}
                }
            }
        }

        debug!(
            "DNS query: {} type {} -> {} answer(s)",
            name,
            qtype,
            response.answers.len()
        );

        response.question = Some(query.question);
        response.set_rcode(Rcode::NoError);
        Some((response, max_size))
    }

    fn count(&self, (response, _): &(Response, usize)) {
        if response.rcode() == Rcode::FormErr as u8 {
            self.metrics.inc_dns_formerr();
        } else if response.rcode() == Rcode::NotImp as u8 {
            self.metrics.inc_dns_notimp();
        } else if response.answers.is_empty() {
            self.metrics.inc_dns_empty();
        } else {
            self.metrics.inc_dns_answered();
        }
    }
}

fn error(query: &Query, rcode: Rcode) -> (Response, usize) {
    let response = Response::error(&query.header, Some(query.question.clone()), rcode);
    (response, query.max_payload())
}

/// FORMERR keyed off the header of an undecodable packet
fn salvage_formerr(packet: &[u8]) -> Option<(Response, usize)> {
    let header = Header::parse(packet).ok()?;

    // Never answer something that claims to be an answer itself
    if header.is_response() {
        return None;
    }

    Some((Response::error(&header, None, Rcode::FormErr), MIN_UDP_PAYLOAD))
}
