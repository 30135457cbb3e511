//! DNS wire format
//!
//! Decoding of inbound queries (header, single question, EDNS OPT record)
//! and encoding of replies. Only what a small authoritative responder needs:
//! no zone data sections are ever interpreted beyond being skipped.

use crate::types::{Record, RecordData};

/// DNS packet constants
pub const HEADER_SIZE: usize = 12;

/// Reply size limit without EDNS
pub const MIN_UDP_PAYLOAD: usize = 512;

/// Largest reply we will build, and the payload size we advertise
pub const MAX_UDP_PAYLOAD: usize = 4096;

/// Wire length limit of a domain name
const MAX_WIRE_NAME_LEN: usize = 255;

/// Offset of the question name in every message we build
const QUESTION_OFFSET: u16 = HEADER_SIZE as u16;

/// DNS record types
pub const TYPE_A: u16 = 1;
pub const TYPE_PTR: u16 = 12;
pub const TYPE_OPT: u16 = 41;
pub const TYPE_TKEY: u16 = 249;
pub const TYPE_TSIG: u16 = 250;
pub const TYPE_IXFR: u16 = 251;
pub const TYPE_AXFR: u16 = 252;
pub const TYPE_MAILB: u16 = 253;
pub const TYPE_MAILA: u16 = 254;
pub const TYPE_ANY: u16 = 255;

/// DNS classes
pub const CLASS_IN: u16 = 1;
pub const CLASS_ANY: u16 = 255;

/// DNS flags
pub const FLAG_QR: u16 = 0x8000; // Query/Response
pub const FLAG_AA: u16 = 0x0400; // Authoritative Answer
pub const FLAG_TC: u16 = 0x0200; // Truncated
pub const FLAG_RD: u16 = 0x0100; // Recursion Desired
const OPCODE_MASK: u16 = 0x7800;
const RCODE_MASK: u16 = 0x000F;

/// Standard query opcode
pub const OPCODE_QUERY: u8 = 0;

/// Response codes we produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Rcode {
    NoError = 0,
    FormErr = 1,
    NotImp = 4,
}

/// Whether `rtype` names actual resource records, as opposed to a
/// query-only meta type or a pseudo record
pub fn is_rr_type(rtype: u16) -> bool {
    !matches!(
        rtype,
        TYPE_OPT
            | TYPE_TKEY
            | TYPE_TSIG
            | TYPE_IXFR
            | TYPE_AXFR
            | TYPE_MAILB
            | TYPE_MAILA
            | TYPE_ANY
    )
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Packet shorter than DNS header ({0} bytes)")]
    ShortHeader(usize),

    #[error("Truncated packet at offset {0}")]
    Truncated(usize),

    #[error("Unsupported label type at offset {0}")]
    BadLabel(usize),

    #[error("Domain name exceeds 255 octets")]
    NameTooLong,

    #[error("Invalid compression pointer at offset {0}")]
    BadPointer(usize),

    #[error("Expected exactly one question, got {0}")]
    QuestionCount(u16),

    #[error("Malformed OPT record")]
    BadOpt,
}

// =============================================================================
// HEADER
// =============================================================================

/// Fixed 12-byte message header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub flags: u16,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl Header {
    /// Parse the header, the only part of a malformed packet worth salvaging
    pub fn parse(packet: &[u8]) -> Result<Self, DecodeError> {
        if packet.len() < HEADER_SIZE {
            return Err(DecodeError::ShortHeader(packet.len()));
        }

        let word = |i: usize| u16::from_be_bytes([packet[i], packet[i + 1]]);

        Ok(Self {
            id: word(0),
            flags: word(2),
            qdcount: word(4),
            ancount: word(6),
            nscount: word(8),
            arcount: word(10),
        })
    }

    pub fn is_response(&self) -> bool {
        self.flags & FLAG_QR != 0
    }

    pub fn opcode(&self) -> u8 {
        ((self.flags & OPCODE_MASK) >> 11) as u8
    }

    pub fn rcode(&self) -> u8 {
        (self.flags & RCODE_MASK) as u8
    }

    pub fn recursion_desired(&self) -> bool {
        self.flags & FLAG_RD != 0
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.id.to_be_bytes());
        out.extend_from_slice(&self.flags.to_be_bytes());
        out.extend_from_slice(&self.qdcount.to_be_bytes());
        out.extend_from_slice(&self.ancount.to_be_bytes());
        out.extend_from_slice(&self.nscount.to_be_bytes());
        out.extend_from_slice(&self.arcount.to_be_bytes());
    }
}

// =============================================================================
// QUERY
// =============================================================================

/// The single question of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Raw labels, original case preserved for echoing
    pub labels: Vec<Vec<u8>>,
    pub qtype: u16,
    pub qclass: u16,
}

impl Question {
    /// Lowercase, rooted presentation name used as the store key
    pub fn lookup_name(&self) -> String {
        if self.labels.is_empty() {
            return ".".to_string();
        }

        let mut name = String::new();
        for label in &self.labels {
            name.push_str(&String::from_utf8_lossy(label).to_ascii_lowercase());
            name.push('.');
        }
        name
    }

    fn write(&self, out: &mut Vec<u8>) {
        for label in &self.labels {
            out.push(label.len() as u8);
            out.extend_from_slice(label);
        }
        out.push(0);
        out.extend_from_slice(&self.qtype.to_be_bytes());
        out.extend_from_slice(&self.qclass.to_be_bytes());
    }
}

/// EDNS parameters from the query's OPT record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edns {
    pub payload_size: u16,
    pub version: u8,
}

impl Edns {
    /// Reply size the client can accept
    pub fn max_payload(&self) -> usize {
        (self.payload_size as usize).clamp(MIN_UDP_PAYLOAD, MAX_UDP_PAYLOAD)
    }
}

/// A decoded inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub header: Header,
    pub question: Question,
    pub edns: Option<Edns>,
}

impl Query {
    /// Reply size limit negotiated by the query
    pub fn max_payload(&self) -> usize {
        self.edns.map(|e| e.max_payload()).unwrap_or(MIN_UDP_PAYLOAD)
    }
}

/// Decode a query packet
pub fn decode(packet: &[u8]) -> Result<Query, DecodeError> {
    let header = Header::parse(packet)?;

    if header.qdcount != 1 {
        return Err(DecodeError::QuestionCount(header.qdcount));
    }

    let (labels, mut offset) = read_name(packet, HEADER_SIZE)?;
    let qtype = read_u16(packet, offset)?;
    let qclass = read_u16(packet, offset + 2)?;
    offset += 4;

    // Answer and authority sections carry nothing we act on
    for _ in 0..(header.ancount as u32 + header.nscount as u32) {
        offset = skip_record(packet, offset)?.next;
    }

    let mut edns = None;
    for _ in 0..header.arcount {
        let record = skip_record(packet, offset)?;
        if record.rtype == TYPE_OPT {
            // Only one OPT, owned by the root name
            if edns.is_some() || !record.root_owner {
                return Err(DecodeError::BadOpt);
            }
            edns = Some(Edns {
                payload_size: record.class,
                version: (record.ttl >> 16) as u8,
            });
        }
        offset = record.next;
    }

    Ok(Query {
        header,
        question: Question {
            labels,
            qtype,
            qclass,
        },
        edns,
    })
}

fn read_u16(packet: &[u8], offset: usize) -> Result<u16, DecodeError> {
    match packet.get(offset..offset + 2) {
        Some(b) => Ok(u16::from_be_bytes([b[0], b[1]])),
        None => Err(DecodeError::Truncated(offset)),
    }
}

fn read_u32(packet: &[u8], offset: usize) -> Result<u32, DecodeError> {
    match packet.get(offset..offset + 4) {
        Some(b) => Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        None => Err(DecodeError::Truncated(offset)),
    }
}

/// Read a possibly compressed name starting at `offset`.
///
/// Returns the labels and the offset just past the name in the original
/// position. Compression pointers must point strictly backwards, which rules
/// out loops.
fn read_name(packet: &[u8], offset: usize) -> Result<(Vec<Vec<u8>>, usize), DecodeError> {
    let mut labels = Vec::new();
    let mut wire_len = 1; // root label
    let mut pos = offset;
    let mut resume_at = None;

    loop {
        let len = *packet.get(pos).ok_or(DecodeError::Truncated(pos))? as usize;

        match len & 0xC0 {
            0x00 => {
                if len == 0 {
                    pos += 1;
                    break;
                }

                let label = packet
                    .get(pos + 1..pos + 1 + len)
                    .ok_or(DecodeError::Truncated(pos + 1))?;

                // A dot inside a label would alias a different owner name
                if label.contains(&b'.') {
                    return Err(DecodeError::BadLabel(pos));
                }

                wire_len += len + 1;
                if wire_len > MAX_WIRE_NAME_LEN {
                    return Err(DecodeError::NameTooLong);
                }

                labels.push(label.to_vec());
                pos += 1 + len;
            }
            0xC0 => {
                let pointer = (read_u16(packet, pos)? & 0x3FFF) as usize;
                if pointer >= pos {
                    return Err(DecodeError::BadPointer(pos));
                }
                if resume_at.is_none() {
                    resume_at = Some(pos + 2);
                }
                pos = pointer;
            }
            _ => return Err(DecodeError::BadLabel(pos)),
        }
    }

    Ok((labels, resume_at.unwrap_or(pos)))
}

/// Fields of a resource record we need while skipping over it
struct SkippedRecord {
    rtype: u16,
    class: u16,
    ttl: u32,
    root_owner: bool,
    next: usize,
}

fn skip_record(packet: &[u8], offset: usize) -> Result<SkippedRecord, DecodeError> {
    let (owner, pos) = read_name(packet, offset)?;
    let rtype = read_u16(packet, pos)?;
    let class = read_u16(packet, pos + 2)?;
    let ttl = read_u32(packet, pos + 4)?;
    let rdlength = read_u16(packet, pos + 8)? as usize;

    let next = pos + 10 + rdlength;
    if next > packet.len() {
        return Err(DecodeError::Truncated(pos + 10));
    }

    Ok(SkippedRecord {
        rtype,
        class,
        ttl,
        root_owner: owner.is_empty(),
        next,
    })
}

// =============================================================================
// RESPONSE
// =============================================================================

/// A reply under construction
#[derive(Debug, Clone)]
pub struct Response {
    pub id: u16,
    pub flags: u16,
    pub question: Option<Question>,
    pub answers: Vec<Record>,
    /// Attach an OPT record advertising [`MAX_UDP_PAYLOAD`]
    pub edns: bool,
}

impl Response {
    /// Empty reply to `header`: same ID, opcode and RD bit, QR set
    pub fn reply_to(header: &Header) -> Self {
        Self {
            id: header.id,
            flags: FLAG_QR | (header.flags & (OPCODE_MASK | FLAG_RD)),
            question: None,
            answers: Vec::new(),
            edns: false,
        }
    }

    /// Error reply carrying only the header and, if decoded, the question
    pub fn error(header: &Header, question: Option<Question>, rcode: Rcode) -> Self {
        let mut response = Self::reply_to(header);
        response.question = question;
        response.set_rcode(rcode);
        response
    }

    pub fn set_rcode(&mut self, rcode: Rcode) {
        self.flags = (self.flags & !RCODE_MASK) | rcode as u16;
    }

    pub fn rcode(&self) -> u8 {
        (self.flags & RCODE_MASK) as u8
    }

    pub fn set_authoritative(&mut self) {
        self.flags |= FLAG_AA;
    }

    /// Serialize, keeping the message within `max_size` bytes.
    ///
    /// If the answers do not fit they are dropped and TC is set.
    pub fn encode(&self, max_size: usize) -> Vec<u8> {
        let full = self.encode_sections(self.flags, &self.answers);
        if full.len() <= max_size || self.answers.is_empty() {
            return full;
        }

        self.encode_sections(self.flags | FLAG_TC, &[])
    }

    fn encode_sections(&self, flags: u16, answers: &[Record]) -> Vec<u8> {
        let mut out = Vec::with_capacity(MIN_UDP_PAYLOAD);

        let header = Header {
            id: self.id,
            flags,
            qdcount: self.question.is_some() as u16,
            ancount: answers.len() as u16,
            nscount: 0,
            arcount: self.edns as u16,
        };
        header.write(&mut out);

        let question_name = self.question.as_ref().map(|q| {
            q.write(&mut out);
            q.lookup_name()
        });

        for record in answers {
            // Owner names equal to the question name point back at it
            if question_name.as_deref() == Some(record.name.as_str()) {
                out.extend_from_slice(&(0xC000 | QUESTION_OFFSET).to_be_bytes());
            } else {
                write_name(&mut out, &record.name);
            }

            out.extend_from_slice(&record.kind.rr_type().to_be_bytes());
            out.extend_from_slice(&CLASS_IN.to_be_bytes());
            out.extend_from_slice(&record.ttl.to_be_bytes());

            match &record.data {
                RecordData::Address(ip) => {
                    out.extend_from_slice(&4u16.to_be_bytes());
                    out.extend_from_slice(&ip.octets());
                }
                RecordData::Name(target) => {
                    let mut rdata = Vec::with_capacity(target.len() + 2);
                    write_name(&mut rdata, target);
                    out.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
                    out.extend_from_slice(&rdata);
                }
            }
        }

        if self.edns {
            out.push(0); // root owner
            out.extend_from_slice(&TYPE_OPT.to_be_bytes());
            out.extend_from_slice(&(MAX_UDP_PAYLOAD as u16).to_be_bytes());
            out.extend_from_slice(&0u32.to_be_bytes()); // rcode, version, flags
            out.extend_from_slice(&0u16.to_be_bytes()); // rdlength
        }

        out
    }
}

/// Write a presentation-form name (labels already validated) uncompressed
fn write_name(out: &mut Vec<u8>, name: &str) {
    for label in name.split('.').filter(|l| !l.is_empty()) {
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    /// Build a query packet for tests
    pub(crate) fn build_query(id: u16, flags: u16, name: &str, qtype: u16) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&id.to_be_bytes());
        data.extend_from_slice(&flags.to_be_bytes());
        data.extend_from_slice(&1u16.to_be_bytes()); // qdcount
        data.extend_from_slice(&[0, 0, 0, 0, 0, 0]);
        write_name(&mut data, name);
        data.extend_from_slice(&qtype.to_be_bytes());
        data.extend_from_slice(&CLASS_IN.to_be_bytes());
        data
    }

    /// Append an OPT record to a query built by [`build_query`]
    pub(crate) fn with_opt(mut packet: Vec<u8>, payload: u16, version: u8) -> Vec<u8> {
        packet[11] = 1; // arcount
        packet.push(0);
        packet.extend_from_slice(&TYPE_OPT.to_be_bytes());
        packet.extend_from_slice(&payload.to_be_bytes());
        packet.extend_from_slice(&[0, version, 0, 0]);
        packet.extend_from_slice(&0u16.to_be_bytes());
        packet
    }

    #[test]
    fn test_decode_question() {
        let packet = build_query(0x1234, FLAG_RD, "Web.Docker.", TYPE_A);
        let query = decode(&packet).unwrap();

        assert_eq!(query.header.id, 0x1234);
        assert!(query.header.recursion_desired());
        assert!(!query.header.is_response());
        assert_eq!(query.header.opcode(), OPCODE_QUERY);
        assert_eq!(query.question.qtype, TYPE_A);
        assert_eq!(query.question.qclass, CLASS_IN);
        assert_eq!(query.question.lookup_name(), "web.docker.");
        assert_eq!(query.question.labels[0], b"Web".to_vec());
        assert!(query.edns.is_none());
        assert_eq!(query.max_payload(), MIN_UDP_PAYLOAD);
    }

    #[test]
    fn test_decode_root_name() {
        let packet = build_query(1, 0, ".", TYPE_A);
        let query = decode(&packet).unwrap();
        assert!(query.question.labels.is_empty());
        assert_eq!(query.question.lookup_name(), ".");
    }

    #[test]
    fn test_decode_opt() {
        let packet = with_opt(build_query(1, 0, "web.docker.", TYPE_A), 1232, 0);
        let query = decode(&packet).unwrap();
        let edns = query.edns.unwrap();
        assert_eq!(edns.payload_size, 1232);
        assert_eq!(edns.version, 0);
        assert_eq!(query.max_payload(), 1232);

        let small = with_opt(build_query(1, 0, "web.docker.", TYPE_A), 100, 0);
        assert_eq!(decode(&small).unwrap().max_payload(), MIN_UDP_PAYLOAD);

        let huge = with_opt(build_query(1, 0, "web.docker.", TYPE_A), 65000, 1);
        let query = decode(&huge).unwrap();
        assert_eq!(query.max_payload(), MAX_UDP_PAYLOAD);
        assert_eq!(query.edns.unwrap().version, 1);
    }

    #[test]
    fn test_decode_rejects_duplicate_opt() {
        let mut packet = with_opt(build_query(1, 0, "web.docker.", TYPE_A), 1232, 0);
        packet.extend_from_slice(&[0, 0, 41, 0x04, 0xD0, 0, 0, 0, 0, 0, 0]);
        packet[11] = 2;
        assert_eq!(decode(&packet), Err(DecodeError::BadOpt));
    }

    #[test]
    fn test_decode_short_header() {
        assert_eq!(decode(&[0u8; 5]), Err(DecodeError::ShortHeader(5)));
    }

    #[test]
    fn test_decode_truncated_question() {
        let packet = build_query(1, 0, "web.docker.", TYPE_A);
        let cut = &packet[..packet.len() - 3];
        assert!(matches!(decode(cut), Err(DecodeError::Truncated(_))));

        let cut = &packet[..HEADER_SIZE + 2];
        assert!(matches!(decode(cut), Err(DecodeError::Truncated(_))));
    }

    #[test]
    fn test_decode_question_count() {
        let mut packet = build_query(1, 0, "web.docker.", TYPE_A);
        packet[5] = 0;
        assert_eq!(decode(&packet), Err(DecodeError::QuestionCount(0)));
        packet[5] = 2;
        assert_eq!(decode(&packet), Err(DecodeError::QuestionCount(2)));
    }

    #[test]
    fn test_decode_pointer_loop() {
        let mut packet = build_query(1, 0, "", TYPE_A);
        packet.truncate(HEADER_SIZE);
        // Pointer to itself
        packet.extend_from_slice(&[0xC0, HEADER_SIZE as u8, 0, 1, 0, 1]);
        assert_eq!(decode(&packet), Err(DecodeError::BadPointer(HEADER_SIZE)));
    }

    #[test]
    fn test_decode_compressed_answer_is_skipped() {
        let mut packet = build_query(7, 0, "web.docker.", TYPE_A);
        packet[7] = 1; // ancount
        packet.extend_from_slice(&[0xC0, 0x0C, 0, 1, 0, 1, 0, 0, 0, 10, 0, 4, 10, 0, 0, 5]);
        let query = decode(&packet).unwrap();
        assert_eq!(query.question.lookup_name(), "web.docker.");
    }

    #[test]
    fn test_decode_bad_label_type() {
        let mut packet = build_query(1, 0, "web.", TYPE_A);
        packet[HEADER_SIZE] = 0x40 | 3;
        assert_eq!(decode(&packet), Err(DecodeError::BadLabel(HEADER_SIZE)));
    }

    #[test]
    fn test_decode_rejects_dot_inside_label() {
        // One label "web.docker", then the root
        let mut packet = build_query(1, 0, "", TYPE_A);
        packet.truncate(HEADER_SIZE);
        packet.push(10);
        packet.extend_from_slice(b"web.docker");
        packet.push(0);
        packet.extend_from_slice(&TYPE_A.to_be_bytes());
        packet.extend_from_slice(&CLASS_IN.to_be_bytes());

        assert_eq!(decode(&packet), Err(DecodeError::BadLabel(HEADER_SIZE)));
    }

    #[test]
    fn test_decode_name_too_long() {
        let mut packet = build_query(1, 0, "", TYPE_A);
        packet.truncate(HEADER_SIZE);
        for _ in 0..5 {
            packet.push(63);
            packet.extend_from_slice(&[b'a'; 63]);
        }
        packet.extend_from_slice(&[0, 0, 1, 0, 1]);
        assert_eq!(decode(&packet), Err(DecodeError::NameTooLong));
    }

    #[test]
    fn test_meta_types() {
        assert!(is_rr_type(TYPE_A));
        assert!(is_rr_type(TYPE_PTR));
        assert!(is_rr_type(28));
        assert!(!is_rr_type(TYPE_ANY));
        assert!(!is_rr_type(TYPE_AXFR));
        assert!(!is_rr_type(TYPE_OPT));
    }

    #[test]
    fn test_encode_answer_uses_compression() {
        let query = decode(&build_query(0xBEEF, FLAG_RD, "web.docker.", TYPE_A)).unwrap();
        let mut response = Response::reply_to(&query.header);
        response.question = Some(query.question.clone());
        response.answers.push(Record::a(
            "web.docker.".to_string(),
            Ipv4Addr::new(10, 0, 0, 5),
            11,
        ));

        let bytes = response.encode(MIN_UDP_PAYLOAD);
        let header = Header::parse(&bytes).unwrap();
        assert_eq!(header.id, 0xBEEF);
        assert!(header.is_response());
        assert!(header.recursion_desired());
        assert_eq!(header.qdcount, 1);
        assert_eq!(header.ancount, 1);

        // header + question (12 name + 4) + answer (2 + 10 + 4)
        assert_eq!(bytes.len(), HEADER_SIZE + 16 + 16);
        let answer = &bytes[HEADER_SIZE + 16..];
        assert_eq!(&answer[..2], &[0xC0, 0x0C]);
        assert_eq!(&answer[answer.len() - 4..], &[10, 0, 0, 5]);
    }

    #[test]
    fn test_encode_ptr_rdata() {
        let query =
            decode(&build_query(1, 0, "5.0.0.10.in-addr.arpa.", TYPE_PTR)).unwrap();
        let mut response = Response::reply_to(&query.header);
        response.question = Some(query.question.clone());
        response.answers.push(Record::ptr(
            "5.0.0.10.in-addr.arpa.".to_string(),
            "web.docker.".to_string(),
            11,
        ));

        let bytes = response.encode(MIN_UDP_PAYLOAD);
        let rdata = b"\x03web\x06docker\x00";
        assert_eq!(&bytes[bytes.len() - rdata.len()..], rdata);
        let rdlen = &bytes[bytes.len() - rdata.len() - 2..bytes.len() - rdata.len()];
        assert_eq!(rdlen, &(rdata.len() as u16).to_be_bytes());
    }

    #[test]
    fn test_encode_truncates_when_too_large() {
        let long_name = format!("{}.docker.", vec!["a".repeat(60); 3].join("."));
        let query = decode(&build_query(1, 0, "5.0.0.10.in-addr.arpa.", TYPE_PTR)).unwrap();
        let mut response = Response::reply_to(&query.header);
        response.question = Some(query.question.clone());
        response.answers.push(Record::ptr(
            "5.0.0.10.in-addr.arpa.".to_string(),
            long_name,
            11,
        ));

        let bytes = response.encode(200);
        let header = Header::parse(&bytes).unwrap();
        assert_ne!(header.flags & FLAG_TC, 0);
        assert_eq!(header.ancount, 0);

        let bytes = response.encode(MIN_UDP_PAYLOAD);
        let header = Header::parse(&bytes).unwrap();
        assert_eq!(header.flags & FLAG_TC, 0);
        assert_eq!(header.ancount, 1);
    }

    #[test]
    fn test_encode_error_and_opt() {
        let header = Header::parse(&build_query(9, 0x2000 | FLAG_RD, "x.", TYPE_A)).unwrap();
        let response = Response::error(&header, None, Rcode::NotImp);
        let bytes = response.encode(MIN_UDP_PAYLOAD);
        let reply = Header::parse(&bytes).unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(reply.id, 9);
        assert_eq!(reply.rcode(), Rcode::NotImp as u8);
        assert_eq!(reply.opcode(), 4);
        assert!(reply.is_response());

        let mut response = Response::reply_to(&header);
        response.edns = true;
        let bytes = response.encode(MIN_UDP_PAYLOAD);
        assert_eq!(Header::parse(&bytes).unwrap().arcount, 1);
        assert_eq!(bytes.len(), HEADER_SIZE + 11);
        assert_eq!(&bytes[HEADER_SIZE + 3..HEADER_SIZE + 5], &4096u16.to_be_bytes());
    }
}
