//! TLS ClientHello parsing (C1 collaborator, TLS side).
//!
//! Scans a direction-contiguous buffer for a TLS handshake record carrying
//! a ClientHello and extracts exactly the fields JA3 and the audit record
//! need: negotiated version, cipher suites, extension types in the order
//! they appeared on the wire, supported groups (elliptic curves), EC point
//! formats, and the SNI/ALPN values worth recording alongside the
//! fingerprint.
//!
//! Malformed or truncated input is never an error here: [`find_client_hello`]
//! returns `None` and the caller moves on, matching the rest of the
//! pipeline's best-effort parsing posture.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    TooShort,
    InvalidContentType,
    InvalidHandshakeType,
    MalformedExtension,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort => write!(f, "buffer too short for a TLS record"),
            Self::InvalidContentType => write!(f, "not a TLS handshake record"),
            Self::InvalidHandshakeType => write!(f, "not a ClientHello message"),
            Self::MalformedExtension => write!(f, "malformed extension data"),
        }
    }
}

impl std::error::Error for ParseError {}

const CONTENT_TYPE_HANDSHAKE: u8 = 0x16;
const HANDSHAKE_TYPE_CLIENT_HELLO: u8 = 0x01;

const EXT_SERVER_NAME: u16 = 0x0000;
const EXT_STATUS_REQUEST: u16 = 0x0005;
const EXT_SUPPORTED_GROUPS: u16 = 0x000a;
const EXT_EC_POINT_FORMATS: u16 = 0x000b;
const EXT_SIGNATURE_ALGORITHMS: u16 = 0x000d;
const EXT_ALPN: u16 = 0x0010;

/// The subset of a parsed ClientHello that JA3 computation looks at.
/// Session ID and the raw extension payloads are discarded once parsed;
/// JA3 never needs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHelloBasic {
    pub version: u16,
    pub cipher_suites: Vec<u16>,
    pub all_extensions: Vec<u16>,
    pub supported_groups: Vec<u16>,
    pub supported_points: Vec<u8>,
}

/// A ClientHello plus the full field set the audit record carries:
/// version, random, session ID, cipher suites, compression methods,
/// extensions, SNI, ALPN, signature algorithms, supported groups,
/// supported points, OCSP flag, all-extension ordering. JA3 computation
/// only ever looks at [`ClientHello::basic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    pub basic: ClientHelloBasic,
    pub random: Vec<u8>,
    pub session_id: Vec<u8>,
    pub compression_methods: Vec<u8>,
    pub signature_algorithms: Vec<u16>,
    pub sni: Option<String>,
    pub alpn: Option<String>,
    pub ocsp: bool,
}

/// Scans `data` for a TLS handshake record containing a ClientHello and
/// parses it. Returns `None` if no record is found, the record isn't a
/// ClientHello, or the handshake body is truncated.
pub fn find_client_hello(data: &[u8]) -> Option<ClientHello> {
    let mut offset = 0;
    while offset + 5 <= data.len() {
        match parse_record_header(&data[offset..]) {
            Some((content_type, length)) => {
                let record_end = offset + 5 + length;
                if content_type == CONTENT_TYPE_HANDSHAKE && record_end <= data.len() {
                    let handshake = &data[offset + 5..record_end];
                    if let Ok(hello) = parse_client_hello(handshake) {
                        return Some(hello);
                    }
                }
                offset += 5 + length;
            }
            None => offset += 1,
        }
    }
    None
}

fn parse_record_header(data: &[u8]) -> Option<(u8, usize)> {
    if data.len() < 5 {
        return None;
    }
    let content_type = data[0];
    if !matches!(content_type, 0x14 | 0x15 | 0x16 | 0x17) {
        return None;
    }
    if data[1] != 0x03 {
        return None;
    }
    let length = u16::from_be_bytes([data[3], data[4]]) as usize;
    Some((content_type, length))
}

fn parse_client_hello(data: &[u8]) -> Result<ClientHello, ParseError> {
    if data.len() < 4 {
        return Err(ParseError::TooShort);
    }
    if data[0] != HANDSHAKE_TYPE_CLIENT_HELLO {
        return Err(ParseError::InvalidHandshakeType);
    }
    let length = u32::from_be_bytes([0, data[1], data[2], data[3]]) as usize;
    if data.len() < 4 + length {
        return Err(ParseError::TooShort);
    }
    parse_client_hello_body(&data[4..4 + length])
}

fn parse_client_hello_body(data: &[u8]) -> Result<ClientHello, ParseError> {
    // version(2) + random(32) + session_id_len(1)
    if data.len() < 35 {
        return Err(ParseError::TooShort);
    }
    let mut offset = 0;

    let version = u16::from_be_bytes([data[0], data[1]]);
    offset += 2;
    let random = data[offset..offset + 32].to_vec();
    offset += 32;

    let session_id_len = data[offset] as usize;
    offset += 1;
    if offset + session_id_len > data.len() {
        return Err(ParseError::TooShort);
    }
    let session_id = data[offset..offset + session_id_len].to_vec();
    offset += session_id_len;

    if offset + 2 > data.len() {
        return Err(ParseError::TooShort);
    }
    let cipher_suites_len = u16::from_be_bytes([data[offset], data[offset + 1]]) as usize;
    offset += 2;
    let cipher_end = offset + cipher_suites_len;
    if cipher_end > data.len() {
        return Err(ParseError::TooShort);
    }
    let cipher_suites = read_u16_list(&data[offset..cipher_end]);
    offset = cipher_end;

    if offset >= data.len() {
        return Err(ParseError::TooShort);
    }
    let compression_len = data[offset] as usize;
    let compression_methods = if offset + 1 + compression_len <= data.len() {
        data[offset + 1..offset + 1 + compression_len].to_vec()
    } else {
        Vec::new()
    };
    offset += 1 + compression_len;
    if offset > data.len() {
        return Err(ParseError::TooShort);
    }

    let mut all_extensions = Vec::new();
    let mut supported_groups = Vec::new();
    let mut supported_points = Vec::new();
    let mut signature_algorithms = Vec::new();
    let mut sni = None;
    let mut alpn = None;
    let mut ocsp = false;

    if offset + 2 <= data.len() {
        let extensions_len = u16::from_be_bytes([data[offset], data[offset + 1]]) as usize;
        offset += 2;
        let extensions_end = (offset + extensions_len).min(data.len());

        while offset + 4 <= extensions_end {
            let ext_type = u16::from_be_bytes([data[offset], data[offset + 1]]);
            let ext_len = u16::from_be_bytes([data[offset + 2], data[offset + 3]]) as usize;
            offset += 4;
            if offset + ext_len > data.len() {
                break;
            }
            let ext_data = &data[offset..offset + ext_len];
            all_extensions.push(ext_type);

            match ext_type {
                EXT_SUPPORTED_GROUPS => {
                    if let Ok(groups) = parse_u16_list_with_prefix(ext_data) {
                        supported_groups = groups;
                    }
                }
                EXT_EC_POINT_FORMATS => {
                    if let Ok(points) = parse_u8_list_with_prefix(ext_data) {
                        supported_points = points;
                    }
                }
                EXT_SERVER_NAME => {
                    if let Ok(name) = parse_sni(ext_data) {
                        sni = Some(name);
                    }
                }
                EXT_ALPN => {
                    if let Ok(proto) = parse_alpn(ext_data) {
                        alpn = Some(proto);
                    }
                }
                EXT_SIGNATURE_ALGORITHMS => {
                    if let Ok(algos) = parse_u16_list_with_prefix(ext_data) {
                        signature_algorithms = algos;
                    }
                }
                EXT_STATUS_REQUEST => {
                    ocsp = true;
                }
                _ => {}
            }

            offset += ext_len;
        }
    }

    Ok(ClientHello {
        basic: ClientHelloBasic {
            version,
            cipher_suites,
            all_extensions,
            supported_groups,
            supported_points,
        },
        random,
        session_id,
        compression_methods,
        signature_algorithms,
        sni,
        alpn,
        ocsp,
    })
}

fn read_u16_list(data: &[u8]) -> Vec<u16> {
    data.chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect()
}

fn parse_u16_list_with_prefix(data: &[u8]) -> Result<Vec<u16>, ParseError> {
    if data.len() < 2 {
        return Err(ParseError::MalformedExtension);
    }
    let list_len = u16::from_be_bytes([data[0], data[1]]) as usize;
    let end = (2 + list_len).min(data.len());
    Ok(read_u16_list(&data[2..end]))
}

fn parse_u8_list_with_prefix(data: &[u8]) -> Result<Vec<u8>, ParseError> {
    if data.is_empty() {
        return Err(ParseError::MalformedExtension);
    }
    let list_len = data[0] as usize;
    let end = (1 + list_len).min(data.len());
    Ok(data[1..end].to_vec())
}

fn parse_sni(data: &[u8]) -> Result<String, ParseError> {
    if data.len() < 5 {
        return Err(ParseError::MalformedExtension);
    }
    let name_type = data[2];
    if name_type != 0x00 {
        return Err(ParseError::MalformedExtension);
    }
    let name_len = u16::from_be_bytes([data[3], data[4]]) as usize;
    if data.len() < 5 + name_len {
        return Err(ParseError::MalformedExtension);
    }
    String::from_utf8(data[5..5 + name_len].to_vec()).map_err(|_| ParseError::MalformedExtension)
}

fn parse_alpn(data: &[u8]) -> Result<String, ParseError> {
    if data.len() < 3 {
        return Err(ParseError::MalformedExtension);
    }
    let proto_len = data[2] as usize;
    if data.len() < 3 + proto_len {
        return Err(ParseError::MalformedExtension);
    }
    String::from_utf8(data[3..3 + proto_len].to_vec()).map_err(|_| ParseError::MalformedExtension)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u16_list(values: &[u16]) -> Vec<u8> {
        let mut out = Vec::new();
        for v in values {
            out.extend_from_slice(&v.to_be_bytes());
        }
        out
    }

    fn supported_groups_ext(curves: &[u16]) -> Vec<u8> {
        let list = u16_list(curves);
        let mut out = (list.len() as u16).to_be_bytes().to_vec();
        out.extend(list);
        out
    }

    fn ec_points_ext(points: &[u8]) -> Vec<u8> {
        let mut out = vec![points.len() as u8];
        out.extend_from_slice(points);
        out
    }

    fn sni_ext(host: &str) -> Vec<u8> {
        let mut name_entry = vec![0x00];
        name_entry.extend_from_slice(&(host.len() as u16).to_be_bytes());
        name_entry.extend_from_slice(host.as_bytes());
        let mut out = (name_entry.len() as u16).to_be_bytes().to_vec();
        out.extend(name_entry);
        out
    }

    fn extension(ext_type: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = ext_type.to_be_bytes().to_vec();
        out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn client_hello_body(
        version: u16,
        ciphers: &[u16],
        extensions: Vec<u8>,
    ) -> Vec<u8> {
        let mut body = version.to_be_bytes().to_vec();
        body.extend(vec![0u8; 32]); // random
        body.push(0); // session id len
        let cipher_bytes = u16_list(ciphers);
        body.extend_from_slice(&(cipher_bytes.len() as u16).to_be_bytes());
        body.extend(cipher_bytes);
        body.push(1); // compression methods length
        body.push(0); // null compression
        body.extend_from_slice(&(extensions.len() as u16).to_be_bytes());
        body.extend(extensions);
        body
    }

    fn framed_client_hello(body: Vec<u8>) -> Vec<u8> {
        let mut handshake = vec![HANDSHAKE_TYPE_CLIENT_HELLO];
        handshake.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
        handshake.extend(body);

        let mut record = vec![CONTENT_TYPE_HANDSHAKE, 0x03, 0x01];
        record.extend_from_slice(&(handshake.len() as u16).to_be_bytes());
        record.extend(handshake);
        record
    }

    #[test]
    fn parses_client_hello_with_sni_and_curves() {
        let mut extensions = Vec::new();
        extensions.extend(extension(EXT_SERVER_NAME, &sni_ext("example.com")));
        extensions.extend(extension(EXT_SUPPORTED_GROUPS, &supported_groups_ext(&[23, 24])));
        extensions.extend(extension(EXT_EC_POINT_FORMATS, &ec_points_ext(&[0])));

        let body = client_hello_body(0x0303, &[0x1301, 0x1302], extensions);
        let frame = framed_client_hello(body);

        let hello = find_client_hello(&frame).expect("client hello recognized");
        assert_eq!(hello.basic.version, 0x0303);
        assert_eq!(hello.basic.cipher_suites, vec![0x1301, 0x1302]);
        assert_eq!(hello.basic.supported_groups, vec![23, 24]);
        assert_eq!(hello.basic.supported_points, vec![0]);
        assert_eq!(hello.sni.as_deref(), Some("example.com"));
        assert_eq!(
            hello.basic.all_extensions,
            vec![EXT_SERVER_NAME, EXT_SUPPORTED_GROUPS, EXT_EC_POINT_FORMATS]
        );
    }

    #[test]
    fn captures_random_and_session_id() {
        let random = (0u8..32).collect::<Vec<_>>();
        let session_id = vec![0xaa, 0xbb, 0xcc];

        let mut body = 0x0303u16.to_be_bytes().to_vec();
        body.extend_from_slice(&random);
        body.push(session_id.len() as u8);
        body.extend_from_slice(&session_id);
        let cipher_bytes = u16_list(&[0x1301]);
        body.extend_from_slice(&(cipher_bytes.len() as u16).to_be_bytes());
        body.extend(cipher_bytes);
        body.push(1);
        body.push(0);
        body.extend_from_slice(&0u16.to_be_bytes()); // no extensions

        let frame = framed_client_hello(body);
        let hello = find_client_hello(&frame).expect("client hello recognized");
        assert_eq!(hello.random, random);
        assert_eq!(hello.session_id, session_id);
    }

    #[test]
    fn returns_none_for_non_handshake_record() {
        let mut record = vec![0x17, 0x03, 0x03]; // application data
        record.extend_from_slice(&4u16.to_be_bytes());
        record.extend_from_slice(&[1, 2, 3, 4]);
        assert!(find_client_hello(&record).is_none());
    }

    #[test]
    fn returns_none_for_truncated_record() {
        let frame = framed_client_hello(client_hello_body(0x0303, &[0x1301], Vec::new()));
        let truncated = &frame[..frame.len() - 5];
        assert!(find_client_hello(truncated).is_none());
    }

    #[test]
    fn skips_leading_garbage_to_find_record() {
        let mut data = vec![0xff, 0xff, 0xff];
        data.extend(framed_client_hello(client_hello_body(
            0x0303,
            &[0x1301],
            Vec::new(),
        )));
        assert!(find_client_hello(&data).is_some());
    }
}
