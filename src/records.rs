//! Audit records: the polymorphic output of the decoder pipeline. Every
//! variant exposes a timestamp, a CSV header/row pair, a JSON
//! representation, source/destination endpoint accessors, and a
//! metric-increment operation — the same four-method contract
//! `original_source/types/*.go` gives every netcap record type
//! (`CSVHeader`/`CSVRecord`, `JSON`, `Src`/`Dst`, `Inc`).
//!
//! CSV nesting follows the same convention as the Go source: repeated
//! values are comma-joined, and nested structures (SMTP commands here)
//! are wrapped in [`STRUCTURE_BEGIN`]/[`STRUCTURE_END`] with
//! [`FIELD_SEPARATOR`] between their own fields.

use serde::Serialize;

use crate::metrics;

/// Opens a nested structure in a CSV field.
pub const STRUCTURE_BEGIN: &str = "(";
/// Closes a nested structure in a CSV field.
pub const STRUCTURE_END: &str = ")";
/// Separates fields inside a nested structure.
pub const FIELD_SEPARATOR: &str = ";";
/// Separates repeated scalar values joined into one CSV field.
pub const JOIN_SEPARATOR: &str = ",";

fn join(values: &[String]) -> String {
    values.join(JOIN_SEPARATOR)
}

/// Lowercase hex encoding for a raw byte field (`Random`, `SessionID`).
fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Drops empty fields from a header/row pair, matching the Go `filter()`
/// helper: fields whose value is empty are omitted from both the header
/// and the row so they stay aligned.
fn filter_non_empty(fields: Vec<(&'static str, String)>) -> (Vec<String>, Vec<String>) {
    fields
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| (name.to_string(), value))
        .unzip()
}

/// SSH KexInit fingerprint record: one per recognized client or server
/// `SSH_MSG_KEXINIT` (`original_source/encoder/sshReader.go`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SshRecord {
    pub timestamp_ns: i64,
    pub hassh: String,
    /// Flow ident: the connection's ident for the client side, the
    /// reversed ident for the server side (matches
    /// `reverseIdent(h.parent.ident)` in the Go source).
    pub flow: String,
    pub ident: String,
    pub algorithms: String,
    pub is_client: bool,
}

/// TLS ClientHello record (`original_source/encoder/tlsClientHello.go`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TlsClientHelloRecord {
    pub timestamp_ns: i64,
    pub version: i32,
    pub random: Vec<u8>,
    pub session_id: Vec<u8>,
    pub cipher_suites: Vec<i32>,
    pub compression_methods: Vec<i32>,
    pub signature_algorithms: Vec<i32>,
    pub supported_groups: Vec<i32>,
    pub supported_points: Vec<i32>,
    pub extensions: Vec<i32>,
    pub sni: String,
    pub alpn: String,
    pub ocsp: bool,
    pub ja3: String,
    pub src_ip: String,
    pub dst_ip: String,
    pub src_mac: String,
    pub dst_mac: String,
    pub src_port: i32,
    pub dst_port: i32,
}

/// A derived software identification, keyed by `Product/Version`.
/// Shared between the [`crate::store::DerivedEntityStore`] entity type
/// and the `AuditRecord::Software` variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Software {
    pub timestamp_ns: i64,
    pub product: String,
    pub vendor: String,
    pub version: String,
    pub service: String,
    pub source_name: String,
    pub source_data: String,
    pub flows: Vec<String>,
    pub notes: String,
}

impl Software {
    /// The composite key, never mutated once an entry is inserted.
    pub fn composite_key(&self) -> String {
        format!("{}/{}", self.product, self.version)
    }
}

/// `original_source/types/ip6.go`. `HopByHop` is dropped: no HopByHop
/// parser exists in this pipeline, so the field would only ever be an
/// empty placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ipv6Record {
    pub timestamp_ns: i64,
    pub version: i32,
    pub traffic_class: i32,
    pub flow_label: u32,
    pub length: i32,
    pub next_header: i32,
    pub hop_limit: i32,
    pub src_ip: String,
    pub dst_ip: String,
    pub payload_entropy: f64,
    pub payload_size: i32,
}

/// `original_source/types/icmp6na.go`, `Options` dropped for the same
/// reason as `Ipv6Record::hop_by_hop`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Icmp6NeighborAdvertisementRecord {
    pub timestamp_ns: i64,
    pub flags: i32,
    pub target_address: String,
    pub src_ip: String,
    pub dst_ip: String,
}

/// `original_source/types/smtp.go`, with `*SMTPCommand` simplified to a
/// plain string and `ResponseLines` dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmtpRecord {
    pub timestamp_ns: i64,
    pub is_encrypted: bool,
    pub is_response: bool,
    pub command: String,
    pub src_ip: String,
    pub dst_ip: String,
    pub src_port: i32,
    pub dst_port: i32,
}

/// Minimal placeholder so the `AuditRecord` enum stays exhaustive over
/// every record kind the pipeline can emit; no source file backs this
/// one in the retrieval pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VulnerabilityRecord {
    pub timestamp_ns: i64,
    pub ident: String,
    pub kind: String,
    pub description: String,
}

/// The polymorphic audit record emitted by every decoder in the
/// pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum AuditRecord {
    Ssh(SshRecord),
    TlsClientHello(TlsClientHelloRecord),
    Software(Software),
    Ipv6(Ipv6Record),
    Icmp6NeighborAdvertisement(Icmp6NeighborAdvertisementRecord),
    Smtp(SmtpRecord),
    Vulnerability(VulnerabilityRecord),
}

impl AuditRecord {
    /// Lower-case record-kind tag, used as the metric label and the
    /// CSV/JSON `kind` discriminator.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ssh(_) => "ssh",
            Self::TlsClientHello(_) => "tlsclienthello",
            Self::Software(_) => "software",
            Self::Ipv6(_) => "ipv6",
            Self::Icmp6NeighborAdvertisement(_) => "icmp6na",
            Self::Smtp(_) => "smtp",
            Self::Vulnerability(_) => "vulnerability",
        }
    }

    /// Nanosecond timestamp, authoritative until [`AuditRecord::to_json`]
    /// coerces it to milliseconds.
    pub fn timestamp_ns(&self) -> i64 {
        match self {
            Self::Ssh(r) => r.timestamp_ns,
            Self::TlsClientHello(r) => r.timestamp_ns,
            Self::Software(r) => r.timestamp_ns,
            Self::Ipv6(r) => r.timestamp_ns,
            Self::Icmp6NeighborAdvertisement(r) => r.timestamp_ns,
            Self::Smtp(r) => r.timestamp_ns,
            Self::Vulnerability(r) => r.timestamp_ns,
        }
    }

    fn set_timestamp(&mut self, ms: i64) {
        match self {
            Self::Ssh(r) => r.timestamp_ns = ms,
            Self::TlsClientHello(r) => r.timestamp_ns = ms,
            Self::Software(r) => r.timestamp_ns = ms,
            Self::Ipv6(r) => r.timestamp_ns = ms,
            Self::Icmp6NeighborAdvertisement(r) => r.timestamp_ns = ms,
            Self::Smtp(r) => r.timestamp_ns = ms,
            Self::Vulnerability(r) => r.timestamp_ns = ms,
        }
    }

    /// CSV header filtered to non-empty fields.
    pub fn csv_header(&self) -> Vec<String> {
        self.csv_pairs().0
    }

    /// CSV row filtered the same way as [`AuditRecord::csv_header`], so
    /// header and row stay aligned.
    pub fn csv_record(&self) -> Vec<String> {
        self.csv_pairs().1
    }

    fn csv_pairs(&self) -> (Vec<String>, Vec<String>) {
        match self {
            Self::Ssh(r) => filter_non_empty(vec![
                ("Timestamp", r.timestamp_ns.to_string()),
                ("HASSH", r.hassh.clone()),
                ("Flow", r.flow.clone()),
                ("Ident", r.ident.clone()),
                ("Algorithms", r.algorithms.clone()),
                ("IsClient", r.is_client.to_string()),
            ]),
            Self::TlsClientHello(r) => filter_non_empty(vec![
                ("Timestamp", r.timestamp_ns.to_string()),
                ("Version", r.version.to_string()),
                ("Random", hex(&r.random)),
                ("SessionID", hex(&r.session_id)),
                (
                    "CipherSuites",
                    join(&r.cipher_suites.iter().map(i32::to_string).collect::<Vec<_>>()),
                ),
                (
                    "Extensions",
                    join(&r.extensions.iter().map(i32::to_string).collect::<Vec<_>>()),
                ),
                ("SNI", r.sni.clone()),
                ("ALPN", r.alpn.clone()),
                ("OSCP", r.ocsp.to_string()),
                ("JA3", r.ja3.clone()),
                ("SrcIP", r.src_ip.clone()),
                ("DstIP", r.dst_ip.clone()),
                ("SrcMAC", r.src_mac.clone()),
                ("DstMAC", r.dst_mac.clone()),
                ("SrcPort", r.src_port.to_string()),
                ("DstPort", r.dst_port.to_string()),
            ]),
            Self::Software(r) => filter_non_empty(vec![
                ("Timestamp", r.timestamp_ns.to_string()),
                ("Product", r.product.clone()),
                ("Vendor", r.vendor.clone()),
                ("Version", r.version.clone()),
                ("SourceName", r.source_name.clone()),
                ("Service", r.service.clone()),
                ("Flows", join(&r.flows)),
                ("SourceData", r.source_data.clone()),
                ("Notes", r.notes.clone()),
            ]),
            Self::Ipv6(r) => filter_non_empty(vec![
                ("Timestamp", r.timestamp_ns.to_string()),
                ("Version", r.version.to_string()),
                ("TrafficClass", r.traffic_class.to_string()),
                ("FlowLabel", r.flow_label.to_string()),
                ("Length", r.length.to_string()),
                ("NextHeader", r.next_header.to_string()),
                ("HopLimit", r.hop_limit.to_string()),
                ("SrcIP", r.src_ip.clone()),
                ("DstIP", r.dst_ip.clone()),
                ("PayloadEntropy", format!("{:.6}", r.payload_entropy)),
                ("PayloadSize", r.payload_size.to_string()),
            ]),
            Self::Icmp6NeighborAdvertisement(r) => filter_non_empty(vec![
                ("Timestamp", r.timestamp_ns.to_string()),
                ("Flags", r.flags.to_string()),
                ("TargetAddress", r.target_address.clone()),
                ("SrcIP", r.src_ip.clone()),
                ("DstIP", r.dst_ip.clone()),
            ]),
            Self::Smtp(r) => filter_non_empty(vec![
                ("Timestamp", r.timestamp_ns.to_string()),
                ("IsEncrypted", r.is_encrypted.to_string()),
                ("IsResponse", r.is_response.to_string()),
                (
                    "Command",
                    format!("{}{}{}", STRUCTURE_BEGIN, r.command, STRUCTURE_END),
                ),
                ("SrcIP", r.src_ip.clone()),
                ("DstIP", r.dst_ip.clone()),
                ("SrcPort", r.src_port.to_string()),
                ("DstPort", r.dst_port.to_string()),
            ]),
            Self::Vulnerability(r) => filter_non_empty(vec![
                ("Timestamp", r.timestamp_ns.to_string()),
                ("Ident", r.ident.clone()),
                ("Kind", r.kind.clone()),
                ("Description", r.description.clone()),
            ]),
        }
    }

    /// Source endpoint accessor. Records with no inherent endpoint
    /// (e.g. `Software`) return an empty string, matching
    /// `original_source/types/software.go`'s `Src()`/`Dst()`.
    pub fn src(&self) -> String {
        match self {
            Self::Ssh(r) => r.ident.clone(),
            Self::TlsClientHello(r) => r.src_ip.clone(),
            Self::Software(_) => String::new(),
            Self::Ipv6(r) => r.src_ip.clone(),
            Self::Icmp6NeighborAdvertisement(r) => r.src_ip.clone(),
            Self::Smtp(r) => r.src_ip.clone(),
            Self::Vulnerability(_) => String::new(),
        }
    }

    pub fn dst(&self) -> String {
        match self {
            Self::Ssh(r) => r.flow.clone(),
            Self::TlsClientHello(r) => r.dst_ip.clone(),
            Self::Software(_) => String::new(),
            Self::Ipv6(r) => r.dst_ip.clone(),
            Self::Icmp6NeighborAdvertisement(r) => r.dst_ip.clone(),
            Self::Smtp(r) => r.dst_ip.clone(),
            Self::Vulnerability(_) => String::new(),
        }
    }

    /// JSON representation. The nanosecond timestamp is coerced to
    /// milliseconds immediately before emission, and the in-memory
    /// record is updated to the same (lossy) value, matching
    /// `a.Timestamp /= int64(time.Millisecond)` in every Go `JSON()`
    /// method that carries a timestamp.
    pub fn to_json(&mut self) -> crate::error::Result<String> {
        self.set_timestamp(self.timestamp_ns() / 1_000_000);
        Ok(serde_json::to_string(self)?)
    }

    /// Increments this record's metric counter (and, for kinds that
    /// declare one, its payload histograms).
    pub fn record_metric(&self) {
        metrics::record_emitted(self.kind());
        if let Self::Ipv6(r) = self {
            metrics::observe_payload(self.kind(), r.payload_entropy, r.payload_size as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ssh_record() -> AuditRecord {
        AuditRecord::Ssh(SshRecord {
            timestamp_ns: 1_700_000_000_123_456_789,
            hassh: "deadbeef".to_string(),
            flow: "10.0.0.1:1-10.0.0.2:22".to_string(),
            ident: "SSH-2.0-OpenSSH_8.9".to_string(),
            algorithms: "kexA;cipherA;macA;none".to_string(),
            is_client: true,
        })
    }

    #[test]
    fn csv_header_and_record_stay_aligned() {
        let record = ssh_record();
        assert_eq!(record.csv_header().len(), record.csv_record().len());
        assert!(record.csv_header().contains(&"HASSH".to_string()));
    }

    #[test]
    fn empty_fields_are_filtered_from_both_header_and_row() {
        let record = AuditRecord::Software(Software {
            timestamp_ns: 0,
            product: "nginx".to_string(),
            vendor: String::new(),
            version: "1.25".to_string(),
            service: "SSH".to_string(),
            source_name: "HASSH".to_string(),
            source_data: "deadbeef".to_string(),
            flows: vec![],
            notes: String::new(),
        });
        assert!(!record.csv_header().contains(&"Vendor".to_string()));
        assert!(!record.csv_header().contains(&"Notes".to_string()));
        assert!(!record.csv_header().contains(&"Flows".to_string()));
    }

    /// The nanosecond timestamp coerces to milliseconds on the JSON
    /// boundary, and the in-memory value follows it.
    #[test]
    fn json_coerces_timestamp_from_nanoseconds_to_milliseconds() {
        let mut record = ssh_record();
        let json = record.to_json().unwrap();
        assert!(json.contains("1700000000123"));
        assert_eq!(record.timestamp_ns(), 1_700_000_000_123);
    }

    #[test]
    fn software_composite_key_is_product_slash_version() {
        let software = Software {
            timestamp_ns: 0,
            product: "nginx".to_string(),
            vendor: "Linux".to_string(),
            version: "1.25".to_string(),
            service: "HTTP".to_string(),
            source_name: "HASSH".to_string(),
            source_data: String::new(),
            flows: vec![],
            notes: String::new(),
        };
        assert_eq!(software.composite_key(), "nginx/1.25");
    }

    #[test]
    fn record_kind_tags_are_lowercase_and_stable() {
        assert_eq!(ssh_record().kind(), "ssh");
    }
}
