//! Encoding of range query results.
//!
//! `queryAllFidos` returns a JSON array of `{"Key":..., "Record":...}`
//! objects. Stored values are spliced in verbatim, so the array is only
//! well-formed JSON if every stored value is.

use crate::error::{LedgerResult, Result};
use crate::types::{FidoRecord, KeyValue};
use serde::{Deserialize, Serialize};

/// One element of a decoded range result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangeEntry {
    #[serde(rename = "Key")]
    pub key: String,

    #[serde(rename = "Record")]
    pub record: FidoRecord,
}

/// Build the result array from a scan.
///
/// Stops at the first failed entry; nothing built so far is returned.
pub fn encode_range_results<I>(entries: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = LedgerResult<KeyValue>>,
{
    let mut buffer = Vec::from(&b"["[..]);

    for (i, entry) in entries.into_iter().enumerate() {
        let kv = entry?;
        if i > 0 {
            buffer.push(b',');
        }
        buffer.extend_from_slice(b"{\"Key\":");
        serde_json::to_writer(&mut buffer, &kv.key)?;
        buffer.extend_from_slice(b", \"Record\":");
        buffer.extend_from_slice(&kv.value);
        buffer.push(b'}');
    }

    buffer.push(b']');
    Ok(buffer)
}

/// Parse a result array produced by [`encode_range_results`].
pub fn decode_range_results(bytes: &[u8]) -> Result<Vec<RangeEntry>> {
    Ok(serde_json::from_slice(bytes)?)
}
