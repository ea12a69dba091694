//! The pipeline context: a single, explicitly threaded value owning the
//! `SoftwareStore` and the HASSH database, replacing the Go source's
//! global `SoftwareStore`/`reassemblyStats` package variables.
//!
//! `Config` is the small startup-time configuration object: the
//! fingerprint-database path and a metrics namespace, constructed once
//! and passed into [`PipelineContext::new`].

use std::path::PathBuf;

use crate::error::Result;
use crate::hashdb::HashDb;
use crate::records::{AuditRecord, Software};
use crate::store::DerivedEntityStore;

/// Startup configuration for one pipeline instance.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the HASSH software-fingerprint database (JSON). `None`
    /// runs the pipeline with an empty database — every HASSH lookup
    /// misses, but nothing else is impaired.
    pub hashdb_path: Option<PathBuf>,
    /// Namespace prefix a downstream metrics exporter may apply to the
    /// counters/histograms in [`crate::metrics`]; the library's own
    /// `prometheus` statics already carry the `auditcap_` prefix, so this
    /// is informational for the embedding application rather than
    /// something this crate rewrites its metric names around.
    pub metrics_namespace: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hashdb_path: None,
            metrics_namespace: "auditcap".to_string(),
        }
    }
}

/// The explicit, non-global handle bundling everything the decoder API
/// needs beyond the connection/packet it is currently processing.
pub struct PipelineContext {
    pub software_store: DerivedEntityStore<String, Software>,
    pub hashdb: HashDb,
}

impl PipelineContext {
    /// Builds a context from `config`, loading the HASSH database from
    /// disk. A missing or malformed database file is a configuration
    /// error and aborts construction.
    pub fn new(config: &Config) -> Result<Self> {
        let hashdb = match &config.hashdb_path {
            Some(path) => {
                let file = std::fs::File::open(path).map_err(crate::error::Error::Io)?;
                HashDb::from_reader(file)?
            }
            None => HashDb::empty(),
        };

        Ok(Self {
            software_store: DerivedEntityStore::new(),
            hashdb,
        })
    }

    /// A context with an empty database, for tests and for embedders who
    /// load their database some other way.
    pub fn new_empty() -> Self {
        Self {
            software_store: DerivedEntityStore::new(),
            hashdb: HashDb::empty(),
        }
    }

    /// Snapshots the `SoftwareStore` as `AuditRecord::Software` values,
    /// for callers that want to serialize the derived-entity store
    /// alongside the streamed SSH/TLS records.
    pub fn software_records(&self) -> Vec<AuditRecord> {
        self.software_store
            .snapshot()
            .into_iter()
            .map(AuditRecord::Software)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_empty_context_has_no_database_entries() {
        let ctx = PipelineContext::new_empty();
        assert!(ctx.hashdb.is_empty());
        assert!(ctx.software_store.is_empty());
    }

    #[test]
    fn missing_database_file_is_a_configuration_error() {
        let config = Config {
            hashdb_path: Some(PathBuf::from("/nonexistent/hashdb.json")),
            ..Config::default()
        };
        assert!(PipelineContext::new(&config).is_err());
    }
}
