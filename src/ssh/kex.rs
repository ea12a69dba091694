//! Wire decoding of the SSH `SSH_MSG_KEXINIT` payload (RFC 4253 §7.1).
//!
//! Layout, once the 4-byte packet-length/1-byte-padding-length prefix and
//! the padding have been stripped by the caller (see
//! [`crate::ssh::scan`]):
//!
//! ```text
//! byte       SSH_MSG_KEXINIT (0x14)
//! byte[16]   cookie (random)
//! name-list  kex_algorithms
//! name-list  server_host_key_algorithms
//! name-list  encryption_algorithms_client_to_server
//! name-list  encryption_algorithms_server_to_client
//! name-list  mac_algorithms_client_to_server
//! name-list  mac_algorithms_server_to_client
//! name-list  compression_algorithms_client_to_server
//! name-list  compression_algorithms_server_to_client
//! name-list  languages_client_to_server
//! name-list  languages_server_to_client
//! boolean    first_kex_packet_follows
//! uint32     0 (reserved)
//! ```
//!
//! Each `name-list` is a `uint32` byte length followed by that many bytes
//! of comma-separated ASCII names.

use std::fmt;

pub const SSH_MSG_KEXINIT: u8 = 0x14;
const COOKIE_LEN: usize = 16;

/// A fully decoded `SSH_MSG_KEXINIT` body. All ten algorithm lists are
/// preserved, not just the four HASSH looks at, per the data model's
/// "other fields preserved verbatim" contract.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KexInitMsg {
    pub kex_algorithms: Vec<String>,
    pub server_host_key_algorithms: Vec<String>,
    pub encryption_algorithms_client_to_server: Vec<String>,
    pub encryption_algorithms_server_to_client: Vec<String>,
    pub mac_algorithms_client_to_server: Vec<String>,
    pub mac_algorithms_server_to_client: Vec<String>,
    pub compression_algorithms_client_to_server: Vec<String>,
    pub compression_algorithms_server_to_client: Vec<String>,
    pub languages_client_to_server: Vec<String>,
    pub languages_server_to_client: Vec<String>,
    pub first_kex_packet_follows: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    TooShort,
    WrongMessageType(u8),
    TruncatedNameList,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort => write!(f, "buffer too short for a KEXINIT message"),
            Self::WrongMessageType(b) => write!(f, "expected message type 0x14, got {:#04x}", b),
            Self::TruncatedNameList => write!(f, "name-list length exceeds remaining buffer"),
        }
    }
}

impl std::error::Error for DecodeError {}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.pos + n > self.data.len() {
            return Err(DecodeError::TruncatedNameList);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn take_u32(&mut self) -> Result<u32, DecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn take_name_list(&mut self) -> Result<Vec<String>, DecodeError> {
        let len = self.take_u32()? as usize;
        let bytes = self.take(len)?;
        let text = String::from_utf8_lossy(bytes);
        if text.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(text.split(',').map(|s| s.to_string()).collect())
        }
    }
}

/// Decodes a `SSH_MSG_KEXINIT` body: message type byte, 16-byte cookie,
/// ten name-lists, the `first_kex_packet_follows` boolean, and the
/// reserved uint32 (read but discarded).
pub fn decode(data: &[u8]) -> Result<KexInitMsg, DecodeError> {
    let mut cursor = Cursor::new(data);

    let msg_type = cursor.take_u8()?;
    if msg_type != SSH_MSG_KEXINIT {
        return Err(DecodeError::WrongMessageType(msg_type));
    }
    cursor.take(COOKIE_LEN)?;

    let kex_algorithms = cursor.take_name_list()?;
    let server_host_key_algorithms = cursor.take_name_list()?;
    let encryption_algorithms_client_to_server = cursor.take_name_list()?;
    let encryption_algorithms_server_to_client = cursor.take_name_list()?;
    let mac_algorithms_client_to_server = cursor.take_name_list()?;
    let mac_algorithms_server_to_client = cursor.take_name_list()?;
    let compression_algorithms_client_to_server = cursor.take_name_list()?;
    let compression_algorithms_server_to_client = cursor.take_name_list()?;
    let languages_client_to_server = cursor.take_name_list()?;
    let languages_server_to_client = cursor.take_name_list()?;
    let first_kex_packet_follows = cursor.take_u8()? != 0;
    // reserved uint32 — allowed to be missing/truncated on best-effort input.
    let _ = cursor.take_u32();

    Ok(KexInitMsg {
        kex_algorithms,
        server_host_key_algorithms,
        encryption_algorithms_client_to_server,
        encryption_algorithms_server_to_client,
        mac_algorithms_client_to_server,
        mac_algorithms_server_to_client,
        compression_algorithms_client_to_server,
        compression_algorithms_server_to_client,
        languages_client_to_server,
        languages_server_to_client,
        first_kex_packet_follows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_list(items: &[&str]) -> Vec<u8> {
        let joined = items.join(",");
        let mut out = (joined.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(joined.as_bytes());
        out
    }

    fn build_kexinit(lists: [&[&str]; 10], follows: bool) -> Vec<u8> {
        let mut body = vec![SSH_MSG_KEXINIT];
        body.extend(vec![0u8; COOKIE_LEN]);
        for list in lists {
            body.extend(name_list(list));
        }
        body.push(follows as u8);
        body.extend_from_slice(&0u32.to_be_bytes());
        body
    }

    #[test]
    fn decodes_well_formed_kexinit() {
        let data = build_kexinit(
            [
                &["curve25519-sha256"],
                &["ssh-ed25519"],
                &["aes128-ctr"],
                &["aes256-ctr"],
                &["hmac-sha2-256"],
                &["hmac-sha2-512"],
                &["none"],
                &["none"],
                &[],
                &[],
            ],
            false,
        );

        let kex = decode(&data).unwrap();
        assert_eq!(kex.kex_algorithms, vec!["curve25519-sha256".to_string()]);
        assert_eq!(
            kex.encryption_algorithms_client_to_server,
            vec!["aes128-ctr".to_string()]
        );
        assert_eq!(
            kex.mac_algorithms_server_to_client,
            vec!["hmac-sha2-512".to_string()]
        );
        assert!(!kex.first_kex_packet_follows);
    }

    #[test]
    fn rejects_wrong_message_type() {
        let mut data = build_kexinit([&[]; 10], false);
        data[0] = 0x15;
        assert_eq!(decode(&data), Err(DecodeError::WrongMessageType(0x15)));
    }

    #[test]
    fn rejects_truncated_buffer() {
        assert_eq!(decode(&[SSH_MSG_KEXINIT]), Err(DecodeError::TruncatedNameList));
    }

    #[test]
    fn multi_item_list_preserves_order() {
        let data = build_kexinit(
            [
                &["a", "b", "c"],
                &[],
                &[],
                &[],
                &[],
                &[],
                &[],
                &[],
                &[],
                &[],
            ],
            true,
        );
        let kex = decode(&data).unwrap();
        assert_eq!(
            kex.kex_algorithms,
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(kex.first_kex_packet_follows);
    }
}
