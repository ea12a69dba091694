//! Core data model shared across the pipeline: packets, segments,
//! connections, and the direction tag that drives reassembly.

use std::fmt;

/// Which side of a bidirectional flow a [`Segment`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowDirection {
    ClientToServer,
    ServerToClient,
}

/// Endpoint addressing for one layer of a captured packet (network or
/// transport). `src`/`dst` are pre-formatted strings, matching the
/// upstream reassembler's `Src()`/`Dst()` string accessors: the pipeline
/// never needs to parse them back into structured addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowEndpoints {
    pub src: String,
    pub dst: String,
}

impl FlowEndpoints {
    pub fn new(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
        }
    }
}

/// An opaque, immutable packet as produced by the capture loop.
#[derive(Debug, Clone)]
pub struct Packet {
    /// Capture timestamp, nanoseconds since the Unix epoch.
    pub timestamp_ns: i64,
    pub link: FlowEndpoints,
    pub network: FlowEndpoints,
    pub transport: FlowEndpoints,
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn new(
        timestamp_ns: i64,
        link: FlowEndpoints,
        network: FlowEndpoints,
        transport: FlowEndpoints,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            timestamp_ns,
            link,
            network,
            transport,
            payload,
        }
    }
}

/// One direction-tagged, ordered slice of reassembled TCP bytes, as
/// delivered by an external reassembler.
#[derive(Debug, Clone)]
pub struct Segment {
    pub direction: FlowDirection,
    pub timestamp_ns: i64,
    pub raw: Vec<u8>,
}

impl Segment {
    pub fn new(direction: FlowDirection, timestamp_ns: i64, raw: Vec<u8>) -> Self {
        Self {
            direction,
            timestamp_ns,
            raw,
        }
    }
}

/// Stable 5-tuple-derived identifier for a TCP connection and its mirror.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(pub String);

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A TCP connection as delivered to the reassembly-driven reader: an
/// `Ident`/`ReverseIdent` pair, the timestamp of the first observed
/// packet, and the ordered segment list for the whole connection.
#[derive(Debug, Clone)]
pub struct Connection {
    pub ident: Ident,
    pub reverse_ident: Ident,
    pub first_packet_timestamp_ns: i64,
    pub segments: Vec<Segment>,
}

impl Connection {
    pub fn new(
        ident: Ident,
        reverse_ident: Ident,
        first_packet_timestamp_ns: i64,
        segments: Vec<Segment>,
    ) -> Self {
        Self {
            ident,
            reverse_ident,
            first_packet_timestamp_ns,
            segments,
        }
    }
}

/// Reverses a 5-tuple-derived `Ident` string of the shape
/// `"src:port-dst:port"` into `"dst:port-src:port"`. The reassembler
/// guarantees this shape; any other shape is returned unchanged rather
/// than panicking, since this is a display/grouping helper, not a
/// protocol boundary.
pub fn reverse_ident(ident: &Ident) -> Ident {
    match ident.0.split_once('-') {
        Some((a, b)) => Ident(format!("{}-{}", b, a)),
        None => ident.clone(),
    }
}
