//! Contract configuration.

use crate::types::SchemaVersion;

/// Contract configuration.
#[derive(Clone, Debug)]
pub struct ContractConfig {
    /// Which record fields are persisted.
    pub schema: SchemaVersion,

    /// Prefix for the sample keys written by `initFidoLedger`.
    pub sample_key_prefix: String,

    /// Inclusive start of the `queryAllFidos` scan.
    pub scan_start: String,

    /// Exclusive end of the `queryAllFidos` scan.
    pub scan_end: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            schema: SchemaVersion::Legacy,
            sample_key_prefix: "FIDO".to_string(),
            scan_start: "FIDO0".to_string(),
            scan_end: "FIDO999".to_string(),
        }
    }
}

impl ContractConfig {
    /// Default configuration with the given schema.
    pub fn with_schema(schema: SchemaVersion) -> Self {
        Self {
            schema,
            ..Default::default()
        }
    }
}
