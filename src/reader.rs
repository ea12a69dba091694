//! Reassembly-driven reader (C3): turns one TCP connection's ordered
//! [`Segment`]s into direction-coherent buffers, feeds each buffer to the
//! SSH recognizer (C2), and routes the results into the derived-entity
//! store (C4) and the audit-record stream.
//!
//! Grounded on `original_source/encoder/sshReader.go`'s `Decode` method:
//! the buffer/flush loop below is a direct translation of its
//! `for _, d := range h.parent.merged { ... }` loop. This reader takes its
//! connection data by reference on every call instead of holding a
//! `*tcpConnection` back-pointer.

use tracing::warn;

use crate::hassh;
use crate::pipeline::PipelineContext;
use crate::records::{AuditRecord, Software, SshRecord};
use crate::ssh::{self, SshConnectionState};
use crate::types::{reverse_ident, FlowDirection, Ident, Segment};

/// Processes one connection's segments against `state` (freshly created
/// or carried over from a prior call), returning the SSH audit records
/// produced and — as a side effect — inserting any derived `Software`
/// identifications into `ctx.software_store`.
///
/// The SSH recognizer is invoked exactly once per maximal
/// direction-contiguous run of `segments`, and the concatenation of
/// buffers handed to it equals the concatenation of every segment's
/// payload.
pub fn process_connection(
    ctx: &PipelineContext,
    ident: &Ident,
    first_packet_timestamp_ns: i64,
    segments: &[Segment],
    state: &mut SshConnectionState,
) -> Vec<AuditRecord> {
    let mut records = Vec::new();

    let mut flush = |buf: &[u8], records: &mut Vec<AuditRecord>| {
        if let Some(scanned) = ssh::scan(state, buf) {
            records.push(build_ssh_record(
                ident,
                first_packet_timestamp_ns,
                &scanned,
            ));
            apply_software(ctx, ident, first_packet_timestamp_ns, &scanned);
        }
    };

    let mut iter = segments.iter();
    let Some(first) = iter.next() else {
        return records;
    };

    let mut previous_dir = first.direction;
    let mut buffer: Vec<u8> = first.raw.clone();

    for segment in iter {
        if segment.direction == previous_dir {
            buffer.extend_from_slice(&segment.raw);
        } else {
            flush(&buffer, &mut records);
            buffer.clear();
            previous_dir = segment.direction;
            buffer.extend_from_slice(&segment.raw);
        }
    }
    flush(&buffer, &mut records);

    records
}

fn build_ssh_record(
    ident: &Ident,
    first_packet_timestamp_ns: i64,
    scanned: &ssh::ScannedKexInit,
) -> AuditRecord {
    let flow = if scanned.is_client {
        ident.clone()
    } else {
        reverse_ident(ident)
    };
    AuditRecord::Ssh(SshRecord {
        timestamp_ns: first_packet_timestamp_ns,
        hassh: scanned.hassh.fingerprint.clone(),
        flow: flow.to_string(),
        ident: ident.to_string(),
        algorithms: scanned.hassh.raw.clone(),
        is_client: scanned.is_client,
    })
}

/// Consults the HASSH database for every candidate software
/// identification and upserts each into the `SoftwareStore`
/// (`original_source/encoder/sshReader.go`'s `hashDBMap[hash]` loop).
fn apply_software(
    ctx: &PipelineContext,
    ident: &Ident,
    first_packet_timestamp_ns: i64,
    scanned: &ssh::ScannedKexInit,
) {
    let candidates = ctx.hashdb.lookup(&scanned.hassh.fingerprint);
    if candidates.is_empty() {
        return;
    }

    for entry in candidates {
        let (product, vendor, version, os) = hassh::parse_ssh(&entry.version);
        if product.is_empty() {
            warn!(hassh = %scanned.hassh.fingerprint, "hashdb entry did not parse into a product");
            continue;
        }

        let key = format!("{}/{}", product, version);
        let notes = format!("Likelyhood: {} Possible OS: {}", entry.likelyhood, os);
        let flow_ident = ident.to_string();

        let inserted = ctx.software_store.upsert(
            key,
            || Software {
                timestamp_ns: first_packet_timestamp_ns,
                product: product.clone(),
                vendor: vendor.clone(),
                version: version.clone(),
                service: "SSH".to_string(),
                source_name: "HASSH".to_string(),
                source_data: scanned.hassh.fingerprint.clone(),
                flows: vec![flow_ident.clone()],
                notes: notes.clone(),
            },
            |existing| {
                if !existing.flows.contains(&flow_ident) {
                    existing.flows.push(flow_ident.clone());
                }
            },
        );

        if inserted {
            crate::metrics::record_software_inserted("ssh");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineContext;

    fn segment(dir: FlowDirection, raw: &[u8]) -> Segment {
        Segment::new(dir, 0, raw.to_vec())
    }

    /// The parser is invoked once per direction-contiguous run.
    #[test]
    fn direction_flush_concatenates_contiguous_runs() {
        let ctx = PipelineContext::new_empty();
        let ident = Ident("10.0.0.1:1-10.0.0.2:2".to_string());
        let mut state = SshConnectionState::new();

        let segments = vec![
            segment(FlowDirection::ClientToServer, b"a"),
            segment(FlowDirection::ClientToServer, b"b"),
            segment(FlowDirection::ServerToClient, b"x"),
            segment(FlowDirection::ClientToServer, b"c"),
        ];

        // First two flushes are banners ("ab", then "x"); banners never
        // produce an SSH record, so the visible effect is state capture.
        let records = process_connection(&ctx, &ident, 0, &segments, &mut state);
        assert!(records.is_empty());
        assert_eq!(state.client_ident.as_deref(), Some("ab"));
        assert_eq!(state.server_ident.as_deref(), Some("x"));
    }

    #[test]
    fn banner_ordering_matches_first_two_direction_runs() {
        let ctx = PipelineContext::new_empty();
        let ident = Ident("10.0.0.1:1-10.0.0.2:2".to_string());
        let mut state = SshConnectionState::new();

        let segments = vec![
            segment(FlowDirection::ClientToServer, b"SSH-2.0-OpenSSH_8.9"),
            segment(FlowDirection::ServerToClient, b"SSH-2.0-dropbear_2020.81"),
        ];

        process_connection(&ctx, &ident, 0, &segments, &mut state);
        assert_eq!(state.client_ident.as_deref(), Some("SSH-2.0-OpenSSH_8.9"));
        assert_eq!(
            state.server_ident.as_deref(),
            Some("SSH-2.0-dropbear_2020.81")
        );
    }

    #[test]
    fn empty_segment_list_produces_no_records() {
        let ctx = PipelineContext::new_empty();
        let ident = Ident("a-b".to_string());
        let mut state = SshConnectionState::new();
        let records = process_connection(&ctx, &ident, 0, &[], &mut state);
        assert!(records.is_empty());
    }
}
