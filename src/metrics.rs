//! Per-record-type metric sink (C6).
//!
//! Every emitted [`crate::records::AuditRecord`] increments a counter
//! vector labeled by the record kind; a handful of kinds additionally
//! observe a histogram (payload entropy, payload size) with linearly
//! spaced buckets starting at 20, step 5, 5 buckets total.
//!
//! Registration happens once, process-wide, via `lazy_static`; increment
//! is O(1) and lock-free per label combination (the underlying
//! `prometheus` vectors shard internally).

use lazy_static::lazy_static;
use prometheus::{linear_buckets, opts, register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

lazy_static! {
    /// Total audit records emitted, labeled by record kind.
    pub static ref RECORDS_TOTAL: CounterVec = register_counter_vec!(
        opts!("auditcap_records_total", "Total audit records emitted"),
        &["kind"]
    )
    .unwrap();

    /// Payload entropy observed on records that carry a payload (IPv6 today).
    pub static ref PAYLOAD_ENTROPY: HistogramVec = register_histogram_vec!(
        "auditcap_payload_entropy",
        "Observed payload entropy by record kind",
        &["kind"],
        linear_buckets(20.0, 5.0, 5).unwrap()
    )
    .unwrap();

    /// Payload size in bytes observed on records that carry a payload.
    pub static ref PAYLOAD_SIZE_BYTES: HistogramVec = register_histogram_vec!(
        "auditcap_payload_size_bytes",
        "Observed payload size in bytes by record kind",
        &["kind"],
        linear_buckets(20.0, 5.0, 5).unwrap()
    )
    .unwrap();

    /// Distinct software entries stored, incremented once per insert
    /// (the `numSoftware` statistic — see [`crate::store`]).
    pub static ref SOFTWARE_STORE_SIZE: CounterVec = register_counter_vec!(
        opts!("auditcap_software_store_inserts_total", "Distinct Product/Version entries inserted"),
        &["source"]
    )
    .unwrap();
}

/// Increments the per-kind record counter. Called by
/// [`crate::records::AuditRecord::record_metric`].
pub fn record_emitted(kind: &str) {
    RECORDS_TOTAL.with_label_values(&[kind]).inc();
}

/// Observes payload entropy/size for a record kind that declares both
/// histograms (IPv6 today).
pub fn observe_payload(kind: &str, entropy: f64, size_bytes: f64) {
    PAYLOAD_ENTROPY.with_label_values(&[kind]).observe(entropy);
    PAYLOAD_SIZE_BYTES
        .with_label_values(&[kind])
        .observe(size_bytes);
}

/// Records one new `SoftwareStore` insertion under the given source
/// label. Bumps the per-kind counter on insert, never on update.
pub fn record_software_inserted(source: &str) {
    SOFTWARE_STORE_SIZE.with_label_values(&[source]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_emitted_increments_the_right_label() {
        let before = RECORDS_TOTAL.with_label_values(&["ssh"]).get();
        record_emitted("ssh");
        assert_eq!(RECORDS_TOTAL.with_label_values(&["ssh"]).get(), before + 1.0);
    }

    #[test]
    fn observe_payload_records_both_histograms() {
        let before = PAYLOAD_ENTROPY.with_label_values(&["ipv6"]).get_sample_count();
        observe_payload("ipv6", 42.0, 128.0);
        assert_eq!(
            PAYLOAD_ENTROPY.with_label_values(&["ipv6"]).get_sample_count(),
            before + 1
        );
    }

    #[test]
    fn record_software_inserted_increments_counter() {
        let before = SOFTWARE_STORE_SIZE.with_label_values(&["ssh"]).get();
        record_software_inserted("ssh");
        assert_eq!(
            SOFTWARE_STORE_SIZE.with_label_values(&["ssh"]).get(),
            before + 1.0
        );
    }
}
