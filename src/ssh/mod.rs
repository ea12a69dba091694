//! SSH banner/KexInit recognition (C2) and per-connection SSH state (C3
//! collaborator).
//!
//! [`scan`] implements the best-effort state machine from the design doc:
//! the first direction-contiguous buffer is the client banner, the
//! second is the server banner, and everything after that is scanned for
//! a `SSH_MSG_KEXINIT`. Any buffer that doesn't fit the expected shape is
//! dropped silently — this scanner never returns an `Err` because there
//! is nothing for a caller to do with one; malformed input just fails to
//! produce a fingerprint.

pub mod kex;

use crate::hassh::{self, Hassh};
use kex::KexInitMsg;
use tracing::debug;

/// Per-connection SSH recognition state. Created when the first segment
/// of a connection classified as SSH is observed; finalized once both
/// `client_kex_init` and `server_kex_init` are set.
#[derive(Debug, Clone, Default)]
pub struct SshConnectionState {
    pub client_ident: Option<String>,
    pub server_ident: Option<String>,
    pub client_kex_init: Option<KexInitMsg>,
    pub server_kex_init: Option<KexInitMsg>,
}

impl SshConnectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both sides of the handshake have been captured; no further
    /// scanning can change this connection's fingerprints.
    pub fn is_complete(&self) -> bool {
        self.client_kex_init.is_some() && self.server_kex_init.is_some()
    }
}

/// The fingerprint produced by successfully recognizing one side's
/// `SSH_MSG_KEXINIT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedKexInit {
    pub is_client: bool,
    pub hassh: Hassh,
    pub kex: KexInitMsg,
}

/// Feeds one direction-contiguous buffer into the SSH recognizer.
///
/// Returns `Some` exactly when a `SSH_MSG_KEXINIT` was found, decoded,
/// and assigned to the side of `state` that was previously unset.
/// Returns `None` for banner buffers, for buffers where the KexInit
/// preconditions do not hold, and once `state.is_complete()`.
pub fn scan(state: &mut SshConnectionState, data: &[u8]) -> Option<ScannedKexInit> {
    if state.is_complete() {
        return None;
    }

    if state.client_ident.is_none() {
        state.client_ident = Some(String::from_utf8_lossy(data).into_owned());
        return None;
    }
    if state.server_ident.is_none() {
        state.server_ident = Some(String::from_utf8_lossy(data).into_owned());
        return None;
    }

    let i = data.iter().position(|&b| b == kex::SSH_MSG_KEXINIT)?;

    // Preconditions from the design doc: i >= 1 (room for the padding
    // byte), the four bytes before the padding byte form a u32 length
    // prefix, and the buffer is long enough to hold the whole message.
    if i < 1 {
        return None;
    }
    if data[..i - 1].len() != 4 {
        return None;
    }
    let length = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    let padding = data[i - 1] as usize;
    if length < padding + 1 {
        return None;
    }
    let body_len = length - padding - 1;
    if data.len() < i + body_len {
        return None;
    }

    let body = &data[i..i + body_len];
    let kex = match kex::decode(body) {
        Ok(kex) => kex,
        Err(err) => {
            debug!(error = %err, "failed to decode SSH_MSG_KEXINIT");
            return None;
        }
    };

    if state.client_kex_init.is_none() {
        let hassh = hassh::compute_client(&kex);
        state.client_kex_init = Some(kex.clone());
        Some(ScannedKexInit {
            is_client: true,
            hassh,
            kex,
        })
    } else {
        let hassh = hassh::compute_server(&kex);
        state.server_kex_init = Some(kex.clone());
        Some(ScannedKexInit {
            is_client: false,
            hassh,
            kex,
        })
    }
}
