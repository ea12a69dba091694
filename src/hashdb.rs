//! Software-fingerprint database: a read-only lookup from a HASSH
//! fingerprint to the software identification strings fed into
//! [`crate::hassh::parse_ssh`].
//!
//! Grounded on `encoder/sshReader.go`'s `hashDBMap[hash]` lookup, where
//! `hash` is a HASSH fingerprint and each entry's `Version` field is raw
//! input to `parseSSH`. Loading the database is the one configuration-error
//! path in this crate: a missing or malformed database file is fatal at
//! startup.

use std::collections::HashMap;
use std::io::Read;

use serde::Deserialize;

use crate::error::{Error, Result};

/// One entry in the HASSH database: a candidate software version string
/// (raw input to `parse_ssh`) and a free-text confidence note.
///
/// `likelyhood` keeps the original's spelling verbatim — it is a
/// wire/data-format detail inherited from the upstream database, not a
/// naming choice made here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HashDbEntry {
    pub version: String,
    pub likelyhood: String,
}

/// A read-only `hassh -> [HashDbEntry]` mapping, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct HashDb {
    entries: HashMap<String, Vec<HashDbEntry>>,
}

impl HashDb {
    /// An empty database: every lookup misses. Useful when no
    /// fingerprint database was configured.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads a database from a JSON object of `{hassh: [{version,
    /// likelyhood}, ...]}`. Malformed JSON is a configuration error: a
    /// missing database file at startup is fatal and aborts initialization.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut buf = String::new();
        reader
            .read_to_string(&mut buf)
            .map_err(Error::Io)?;
        Self::from_json_str(&buf)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: HashMap<String, Vec<HashDbEntry>> =
            serde_json::from_str(json).map_err(|e| Error::Database(e.to_string()))?;
        Ok(Self { entries })
    }

    /// Looks up every candidate software identification for a HASSH
    /// fingerprint. Returns an empty slice on a miss — this is a
    /// best-effort enrichment step, never an error.
    pub fn lookup(&self, hassh: &str) -> &[HashDbEntry] {
        self.entries.get(hassh).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_well_formed_database() {
        let json = r#"{
            "aa11bb22": [
                {"version": "OpenSSH | OpenBSD 7.4 ? Linux Ubuntu", "likelyhood": "high"}
            ]
        }"#;
        let db = HashDb::from_json_str(json).unwrap();
        assert_eq!(db.len(), 1);
        let hits = db.lookup("aa11bb22");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].likelyhood, "high");
    }

    #[test]
    fn lookup_miss_returns_empty_slice() {
        let db = HashDb::empty();
        assert!(db.lookup("nonexistent").is_empty());
    }

    #[test]
    fn malformed_json_is_a_configuration_error() {
        let err = HashDb::from_json_str("not json").unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }
}
