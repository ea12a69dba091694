//! Stateless per-packet TLS ClientHello encoder (C5 collaborator).
//!
//! Grounded on `original_source/encoder/tlsClientHello.go`: scans a
//! packet's payload for a ClientHello, widens every integer-typed vector
//! to `i32` the way the Go encoder widens to `int32`, computes JA3, and
//! fills endpoint fields from the packet's network/link/transport flows.
//!
//! The Go encoder reads `p.TransportLayer().TransportFlow().Src()` for
//! *both* `srcPort` and `dstPort`; here `dst_port` reads the transport
//! flow's destination side instead.

use crate::ja3;
use crate::records::{AuditRecord, TlsClientHelloRecord};
use crate::tls;
use crate::types::Packet;

fn widen_u16(values: &[u16]) -> Vec<i32> {
    values.iter().map(|&v| v as i32).collect()
}

fn widen_u8(values: &[u8]) -> Vec<i32> {
    values.iter().map(|&v| v as i32).collect()
}

/// Looks for a TLS ClientHello in `packet.payload`; returns `None` if
/// none is present, matching `tlsx.GetClientHello(p)`'s `nil` case.
pub fn encode(packet: &Packet) -> Option<AuditRecord> {
    let hello = tls::find_client_hello(&packet.payload)?;
    let ja3_digest = ja3::digest_hex(&hello.basic);

    Some(AuditRecord::TlsClientHello(TlsClientHelloRecord {
        timestamp_ns: packet.timestamp_ns,
        version: hello.basic.version as i32,
        random: hello.random,
        session_id: hello.session_id,
        cipher_suites: widen_u16(&hello.basic.cipher_suites),
        compression_methods: widen_u8(&hello.compression_methods),
        signature_algorithms: widen_u16(&hello.signature_algorithms),
        supported_groups: widen_u16(&hello.basic.supported_groups),
        supported_points: widen_u8(&hello.basic.supported_points),
        extensions: widen_u16(&hello.basic.all_extensions),
        sni: hello.sni.unwrap_or_default(),
        alpn: hello.alpn.unwrap_or_default(),
        ocsp: hello.ocsp,
        ja3: ja3_digest,
        src_ip: packet.network.src.clone(),
        dst_ip: packet.network.dst.clone(),
        src_mac: packet.link.src.clone(),
        dst_mac: packet.link.dst.clone(),
        src_port: packet.transport.src.parse().unwrap_or(0),
        dst_port: packet.transport.dst.parse().unwrap_or(0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FlowEndpoints;

    fn u16_list(values: &[u16]) -> Vec<u8> {
        let mut out = Vec::new();
        for v in values {
            out.extend_from_slice(&v.to_be_bytes());
        }
        out
    }

    fn extension(ext_type: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = ext_type.to_be_bytes().to_vec();
        out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn client_hello_frame(ciphers: &[u16]) -> Vec<u8> {
        let mut body = 0x0303u16.to_be_bytes().to_vec();
        body.extend(vec![0u8; 32]);
        body.push(0); // session id len
        let cipher_bytes = u16_list(ciphers);
        body.extend_from_slice(&(cipher_bytes.len() as u16).to_be_bytes());
        body.extend(cipher_bytes);
        body.push(1);
        body.push(0);

        let extensions = extension(0x000a, &{
            let list = u16_list(&[23, 24]);
            let mut out = (list.len() as u16).to_be_bytes().to_vec();
            out.extend(list);
            out
        });
        body.extend_from_slice(&(extensions.len() as u16).to_be_bytes());
        body.extend(extensions);

        let mut handshake = vec![0x01u8];
        handshake.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
        handshake.extend(body);

        let mut record = vec![0x16, 0x03, 0x01];
        record.extend_from_slice(&(handshake.len() as u16).to_be_bytes());
        record.extend(handshake);
        record
    }

    fn packet_with_payload(payload: Vec<u8>) -> Packet {
        Packet::new(
            1_000,
            FlowEndpoints::new("aa:bb", "cc:dd"),
            FlowEndpoints::new("10.0.0.1", "10.0.0.2"),
            FlowEndpoints::new("51234", "443"),
            payload,
        )
    }

    #[test]
    fn encodes_client_hello_with_fixed_port_bug() {
        let packet = packet_with_payload(client_hello_frame(&[0x1301, 0x1302]));
        let record = encode(&packet).expect("client hello recognized");
        match record {
            AuditRecord::TlsClientHello(tls) => {
                assert_eq!(tls.src_port, 51234);
                assert_eq!(tls.dst_port, 443);
                assert_eq!(tls.cipher_suites, vec![0x1301, 0x1302]);
                assert_eq!(tls.supported_groups, vec![23, 24]);
                assert_eq!(tls.random, vec![0u8; 32]);
                assert!(tls.session_id.is_empty());
                assert_eq!(tls.ja3.len(), 32);
            }
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn returns_none_when_no_client_hello_present() {
        let packet = packet_with_payload(vec![0xff; 16]);
        assert!(encode(&packet).is_none());
    }
}
