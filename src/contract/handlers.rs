//! Operation handlers.
//!
//! Each handler assumes its arity has already been checked by the
//! dispatcher.

use super::results::encode_range_results;
use crate::config::ContractConfig;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::types::{CredentialActivity, FidoRecord, Payload, SchemaVersion};
use tracing::{debug, info};

/// The ten records written by `initFidoLedger`, in key order.
pub fn sample_records(schema: SchemaVersion) -> Vec<FidoRecord> {
    ('a'..='j')
        .enumerate()
        .map(|(i, c)| {
            FidoRecord::new(
                c.to_string().repeat(3),
                c.to_string().repeat(2),
                format!("credentialID{}", i + 1),
                c.to_string(),
            )
            .with_activity(CredentialActivity {
                sign_counter: "1".to_string(),
                registration_time: "123".to_string(),
                last_authentication_time: "123".to_string(),
            })
            .for_schema(schema)
        })
        .collect()
}

/// Write the sample records under `<prefix>0` .. `<prefix>9`.
///
/// Stops at the first failed write.
pub fn seed_sample_records<L: Ledger + ?Sized>(
    config: &ContractConfig,
    ledger: &L,
) -> Result<Payload> {
    let records = sample_records(config.schema);
    let count = records.len();

    for (i, record) in records.into_iter().enumerate() {
        let key = format!("{}{}", config.sample_key_prefix, i);
        ledger.put_state(&key, record.to_json_bytes()?)?;
        debug!(key = %key, credential_id = %record.credential_id, "seeded sample record");
    }

    info!(count, "seeded sample records");
    Ok(Payload::new())
}

/// Write one record from `[key, bcID, aaguID, credentialID, regResp,
/// signCounter, registrationTime, lastAuthenticationTime]`.
pub fn create_record<L, S>(config: &ContractConfig, ledger: &L, args: &[S]) -> Result<Payload>
where
    L: Ledger + ?Sized,
    S: AsRef<str>,
{
    let arg = |i: usize| args[i].as_ref().to_string();

    let record = FidoRecord::new(arg(1), arg(2), arg(3), arg(4))
        .with_activity(CredentialActivity {
            sign_counter: arg(5),
            registration_time: arg(6),
            last_authentication_time: arg(7),
        })
        .for_schema(config.schema);

    let key = args[0].as_ref();
    ledger.put_state(key, record.to_json_bytes()?)?;
    debug!(key, schema = %config.schema, "created record");

    Ok(Payload::new())
}

/// Raw bytes stored under `key`; empty if absent.
pub fn query_record<L: Ledger + ?Sized>(ledger: &L, key: &str) -> Result<Payload> {
    Ok(ledger.get_state(key)?.unwrap_or_default())
}

/// Every record in the configured scan range as a JSON array.
pub fn query_all_records<L: Ledger + ?Sized>(
    config: &ContractConfig,
    ledger: &L,
) -> Result<Payload> {
    let scan = ledger.range(&config.scan_start, &config.scan_end)?;
    let payload = encode_range_results(scan)?;
    debug!(bytes = payload.len(), "queryAllFidos");
    Ok(payload)
}
