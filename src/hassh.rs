//! HASSH — SSH client/server fingerprint.
//!
//! HASSH (<https://github.com/salesforce/hassh>) is the SSH analogue of
//! JA3: a stable fingerprint derived from the order-sensitive algorithm
//! lists a peer offers during key exchange.
//!
//! Format: `MD5(KexAlgos;CiphersClientServer;MACsClientServer;CompressionClientServer)`,
//! where each field is itself the comma-joined list of algorithms in the
//! order they were offered.

use crate::ssh::kex::KexInitMsg;

/// A computed HASSH fingerprint together with the raw string it was
/// hashed from (kept around for golden tests and debugging).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hassh {
    pub raw: String,
    pub fingerprint: String,
}

/// Computes the HASSH fingerprint for one side (client or server) of a
/// key exchange, from the four lists the HASSH spec fingerprints.
///
/// Order within each list is preserved verbatim and is semantically
/// significant: permuting any list changes the fingerprint.
pub fn compute(
    kex_algos: &[String],
    ciphers_client_server: &[String],
    macs_client_server: &[String],
    compression_client_server: &[String],
) -> Hassh {
    let raw = format!(
        "{};{};{};{}",
        kex_algos.join(","),
        ciphers_client_server.join(","),
        macs_client_server.join(","),
        compression_client_server.join(","),
    );
    let fingerprint = format!("{:x}", md5::compute(raw.as_bytes()));

    Hassh { raw, fingerprint }
}

/// Computes the client-side HASSH of a parsed [`KexInitMsg`].
pub fn compute_client(kex: &KexInitMsg) -> Hassh {
    compute(
        &kex.kex_algorithms,
        &kex.encryption_algorithms_client_to_server,
        &kex.mac_algorithms_client_to_server,
        &kex.compression_algorithms_client_to_server,
    )
}

/// Computes the server-side HASSH (HASSH-Server) of a parsed [`KexInitMsg`].
pub fn compute_server(kex: &KexInitMsg) -> Hassh {
    compute(
        &kex.kex_algorithms,
        &kex.encryption_algorithms_server_to_client,
        &kex.mac_algorithms_server_to_client,
        &kex.compression_algorithms_server_to_client,
    )
}

/// Parses a software-identification string from the HASSH database
/// (`examples/original_source/encoder/sshReader.go`'s `parseSSH`) into
/// `(product, vendor, version, os)`.
///
/// The expected layout is `"Product | Vendor Version"`, optionally
/// followed by `" ? OS"`. Any deviation from this layout is not an error:
/// the function fails silently and returns empty strings for whatever it
/// could not extract, matching the best-effort parsing posture of the
/// rest of the pipeline.
pub fn parse_ssh(soft: &str) -> (String, String, String, String) {
    let mut halves = soft.splitn(2, " ? ");
    let first = halves.next().unwrap_or_default();
    let os = halves.next().unwrap_or_default().to_string();

    let mut product_rest = first.splitn(2, " | ");
    let product = product_rest.next().unwrap_or_default().to_string();
    let vendor_version = product_rest.next().unwrap_or_default();

    let mut vv = vendor_version.splitn(2, ' ');
    let vendor = vv.next().unwrap_or_default().to_string();
    let version = vv.next().unwrap_or_default().to_string();

    (product, vendor, version, os)
}
