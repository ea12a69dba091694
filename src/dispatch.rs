//! Encoder dispatch (C5): a write-once registry of per-packet encoders,
//! and a driver that runs every registered encoder against every
//! incoming packet, routing whatever each produces to a downstream sink
//! and the metric sink (C6).
//!
//! Stateless encoders (TLS ClientHello) register here as per-packet
//! functions. The SSH reader is stream-level: it doesn't fit this
//! per-packet shape, so it is dispatched separately by
//! [`Dispatcher::dispatch_connections`], one worker per connection, never
//! sharing a connection's segment list across workers.
//!
//! Parallelism uses `std::thread::scope` rather than a thread-pool crate:
//! the registry is read-only after construction and every per-item
//! closure only touches `Sync` state (`PipelineContext`, the sink), so a
//! scoped spawn per chunk is sufficient and needs no extra dependency.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::pipeline::PipelineContext;
use crate::records::AuditRecord;
use crate::ssh::SshConnectionState;
use crate::types::{Connection, Packet};

/// One per-packet encoder: a record-kind tag, a human name, optional
/// init/finalize hooks, and the function producing zero-or-one record
/// per packet.
pub struct PacketEncoder {
    pub kind: &'static str,
    pub name: &'static str,
    pub init: Option<fn()>,
    pub encode: fn(&Packet) -> Option<AuditRecord>,
    pub finalize: Option<fn()>,
}

/// Routes emitted records somewhere downstream. Serialization and
/// storage are out of scope for this crate; this trait is the seam a
/// downstream serialization sink plugs into.
pub trait RecordSink: Send + Sync {
    fn emit(&self, record: AuditRecord);
}

/// An in-memory sink, useful for tests and for embedders who want to
/// batch records before handing them to their own CSV/JSON writer.
#[derive(Default)]
pub struct VecSink(Mutex<Vec<AuditRecord>>);

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<AuditRecord> {
        self.0.into_inner().unwrap_or_default()
    }
}

impl RecordSink for VecSink {
    fn emit(&self, record: AuditRecord) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).push(record);
    }
}

/// The write-once set of per-packet encoders, plus the driver that fans
/// packets and connections out across worker threads.
pub struct Dispatcher {
    packet_encoders: Vec<PacketEncoder>,
}

impl Dispatcher {
    pub fn new(packet_encoders: Vec<PacketEncoder>) -> Self {
        for encoder in &packet_encoders {
            if let Some(init) = encoder.init {
                init();
            }
        }
        Self { packet_encoders }
    }

    /// Runs every registered per-packet encoder against every packet in
    /// `packets`, in parallel, emitting each produced record to `sink`
    /// and incrementing its metric. `cancel`, if set before a chunk
    /// starts, stops further chunks from being dispatched; chunks already
    /// running always finish.
    pub fn dispatch_packets(&self, packets: &[Packet], sink: &dyn RecordSink, cancel: &AtomicBool) {
        if packets.is_empty() {
            return;
        }
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(packets.len());
        let chunk_size = ((packets.len() + workers - 1) / workers).max(1);

        std::thread::scope(|scope| {
            for chunk in packets.chunks(chunk_size) {
                if cancel.load(Ordering::Relaxed) {
                    break;
                }
                scope.spawn(move || {
                    for packet in chunk {
                        for encoder in &self.packet_encoders {
                            if let Some(record) = (encoder.encode)(packet) {
                                record.record_metric();
                                sink.emit(record);
                            }
                        }
                    }
                });
            }
        });
    }

    /// Runs the SSH stream-level recognizer against every connection, one
    /// worker per connection (never splitting a single connection's
    /// segment list across workers, preserving per-connection ordering).
    pub fn dispatch_connections(
        &self,
        ctx: &PipelineContext,
        connections: &[Connection],
        sink: &dyn RecordSink,
        cancel: &AtomicBool,
    ) {
        std::thread::scope(|scope| {
            for connection in connections {
                if cancel.load(Ordering::Relaxed) {
                    break;
                }
                scope.spawn(move || {
                    let mut state = SshConnectionState::new();
                    let records = crate::reader::process_connection(
                        ctx,
                        &connection.ident,
                        connection.first_packet_timestamp_ns,
                        &connection.segments,
                        &mut state,
                    );
                    for record in records {
                        record.record_metric();
                        sink.emit(record);
                    }
                });
            }
        });
    }

    pub fn finalize(&self) {
        for encoder in &self.packet_encoders {
            if let Some(finalize) = encoder.finalize {
                finalize();
            }
        }
    }
}

/// The single stateless encoder this crate registers today: TLS
/// ClientHello.
pub fn tls_client_hello_encoder() -> PacketEncoder {
    PacketEncoder {
        kind: "tlsclienthello",
        name: "TLSClientHello",
        init: None,
        encode: crate::tls_encoder::encode,
        finalize: None,
    }
}
