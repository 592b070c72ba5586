//! Core types for the FIDO record store.

use crate::error::{ContractError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io;
use std::str::FromStr;

/// Raw success payload returned by an invocation.
///
/// An empty payload means "no content" (e.g. a point lookup on a missing key).
pub type Payload = Vec<u8>;

/// Which fields are persisted for a record.
///
/// `createFido` always takes eight arguments. Under `Legacy` only the four
/// base fields are written, keeping the stored bytes identical to data
/// written by earlier deployments. `Extended` also persists the three
/// credential activity fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    #[default]
    Legacy,
    Extended,
}

impl SchemaVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaVersion::Legacy => "legacy",
            SchemaVersion::Extended => "extended",
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaVersion {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "legacy" => Ok(SchemaVersion::Legacy),
            "extended" => Ok(SchemaVersion::Extended),
            other => Err(ContractError::UnknownSchema(other.to_string())),
        }
    }
}

/// Authenticator usage data carried alongside a registration.
///
/// All three fields are required when decoding; a stored record without
/// them decodes with `activity: None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialActivity {
    #[serde(rename = "signCounter")]
    pub sign_counter: String,

    #[serde(rename = "registrationTime")]
    pub registration_time: String,

    #[serde(rename = "lastAuthenticationTime")]
    pub last_authentication_time: String,
}

/// A FIDO credential registration stored on the ledger.
///
/// Serializes as a compact JSON object with the fixed field order
/// `bcID, aaguID, credentialID, regResp`, followed by the activity fields
/// when present. Missing base fields decode as empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FidoRecord {
    /// Blockchain-side identifier correlating the record to an off-chain entity.
    #[serde(rename = "bcID", default)]
    pub bc_id: String,

    /// Authenticator model identifier.
    #[serde(rename = "aaguID", default)]
    pub aagu_id: String,

    /// Credential identifier issued by the authenticator.
    #[serde(rename = "credentialID", default)]
    pub credential_id: String,

    /// Opaque registration response, stored verbatim.
    #[serde(rename = "regResp", default)]
    pub reg_resp: String,

    #[serde(flatten)]
    pub activity: Option<CredentialActivity>,
}

impl FidoRecord {
    /// Create a record with the four base fields.
    pub fn new(
        bc_id: impl Into<String>,
        aagu_id: impl Into<String>,
        credential_id: impl Into<String>,
        reg_resp: impl Into<String>,
    ) -> Self {
        Self {
            bc_id: bc_id.into(),
            aagu_id: aagu_id.into(),
            credential_id: credential_id.into(),
            reg_resp: reg_resp.into(),
            activity: None,
        }
    }

    /// Attach activity fields.
    pub fn with_activity(mut self, activity: CredentialActivity) -> Self {
        self.activity = Some(activity);
        self
    }

    /// Shape the record for the given schema. `Legacy` drops activity.
    pub fn for_schema(mut self, schema: SchemaVersion) -> Self {
        if schema == SchemaVersion::Legacy {
            self.activity = None;
        }
        self
    }

    /// Encode as stored on the ledger.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut out, HtmlSafeFormatter);
        self.serialize(&mut ser)?;
        Ok(out)
    }

    /// Decode a stored value.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Compact JSON that also escapes `<`, `>`, `&`, U+2028 and U+2029 as
/// `\uXXXX`, matching the bytes other ledger clients write for the same record.
struct HtmlSafeFormatter;

impl serde_json::ser::Formatter for HtmlSafeFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            let escape = match c {
                '<' => "\\u003c",
                '>' => "\\u003e",
                '&' => "\\u0026",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            writer.write_all(fragment[start..i].as_bytes())?;
            writer.write_all(escape.as_bytes())?;
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// A single entry yielded by a range scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Transaction identifier (SHA-256 over the invocation).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxId(pub [u8; 32]);

impl TxId {
    /// Derive an id from a nonce, the function name and its arguments.
    pub fn derive<S: AsRef<str>>(nonce: u64, function: &str, args: &[S]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(nonce.to_le_bytes());
        hasher.update(function.as_bytes());
        for arg in args {
            hasher.update([0u8]);
            hasher.update(arg.as_ref().as_bytes());
        }
        TxId(hasher.finalize().into())
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
