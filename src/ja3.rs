//! JA3 — TLS ClientHello fingerprint.
//!
//! JA3 (<https://github.com/salesforce/ja3>) is the MD5 hex digest of
//! `Version,Ciphers,Extensions,EllipticCurves,EllipticCurvePointFormats`,
//! each list dash-joined in parsed order after GREASE values are removed.

use crate::grease::filter_grease_values;
use crate::tls::ClientHelloBasic;

/// Computes the JA3 digest for a [`ClientHelloBasic`].
pub fn digest_hex(hello: &ClientHelloBasic) -> String {
    let ciphers = filter_grease_values(&hello.cipher_suites);
    let extensions = filter_grease_values(&hello.all_extensions);
    let curves = filter_grease_values(&hello.supported_groups);

    let ja3_string = format!(
        "{},{},{},{},{}",
        hello.version,
        join_u16(&ciphers),
        join_u16(&extensions),
        join_u16(&curves),
        join_u8(&hello.supported_points),
    );

    format!("{:x}", md5::compute(ja3_string.as_bytes()))
}

fn join_u16(values: &[u16]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("-")
}

fn join_u8(values: &[u8]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("-")
}
