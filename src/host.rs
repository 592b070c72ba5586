//! Invocation host.
//!
//! Runs one contract call as a transaction: writes are buffered in a
//! [`Transaction`] and only reach the ledger if the call succeeds, so a
//! failed invocation leaves no trace. Reads see committed state only.

use crate::config::ContractConfig;
use crate::contract::FidoContract;
use crate::error::{LedgerError, LedgerResult, Result};
use crate::ledger::{Ledger, RangeScan};
use crate::types::{Payload, TxId};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, info_span, warn};

/// Write overlay for a single invocation.
pub struct Transaction<'a, L: Ledger + ?Sized> {
    ledger: &'a L,
    writes: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl<'a, L: Ledger + ?Sized> Transaction<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        Self {
            ledger,
            writes: Mutex::new(BTreeMap::new()),
        }
    }

    /// Keys written so far, in key order.
    pub fn write_set(&self) -> Vec<String> {
        self.writes.lock().keys().cloned().collect()
    }

    /// Apply buffered writes to the ledger. Returns the number of keys written.
    pub fn commit(self) -> LedgerResult<usize> {
        let writes = self.writes.into_inner();
        let count = writes.len();
        if count > 0 {
            self.ledger.commit_writes(writes)?;
        }
        Ok(count)
    }
}

impl<L: Ledger + ?Sized> Ledger for Transaction<'_, L> {
    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        self.ledger.get_state(key)
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> LedgerResult<()> {
        if key.is_empty() {
            return Err(LedgerError::EmptyKey);
        }
        self.writes.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn range(&self, start: &str, end: &str) -> LedgerResult<RangeScan<'_>> {
        self.ledger.range(start, end)
    }
}

/// Outcome of a successful invocation.
#[derive(Clone, Debug)]
pub struct Receipt {
    pub tx_id: TxId,
    pub payload: Payload,
    /// Number of keys committed.
    pub writes: usize,
}

/// Owns a ledger and runs contract invocations against it.
pub struct ChaincodeHost<L: Ledger> {
    ledger: L,
    contract: FidoContract,
    nonce: AtomicU64,
}

impl<L: Ledger> ChaincodeHost<L> {
    pub fn new(ledger: L, config: ContractConfig) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or_default();

        Self {
            ledger,
            contract: FidoContract::new(config),
            nonce: AtomicU64::new(seed),
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Give back the ledger.
    pub fn into_ledger(self) -> L {
        self.ledger
    }

    /// Instantiate the contract.
    pub fn init(&self) -> Result<Receipt> {
        let tx_id = self.next_tx_id("Init", &[] as &[&str]);
        let _span = info_span!("init", tx_id = %tx_id).entered();
        let payload = self.contract.init(&self.ledger)?;
        Ok(Receipt {
            tx_id,
            payload,
            writes: 0,
        })
    }

    /// Run an invocation and commit its writes if it succeeds.
    pub fn invoke<S: AsRef<str>>(&self, function: &str, args: &[S]) -> Result<Receipt> {
        self.execute(function, args, true)
    }

    /// Run an invocation and discard its writes.
    pub fn query<S: AsRef<str>>(&self, function: &str, args: &[S]) -> Result<Receipt> {
        self.execute(function, args, false)
    }

    fn execute<S: AsRef<str>>(&self, function: &str, args: &[S], commit: bool) -> Result<Receipt> {
        let tx_id = self.next_tx_id(function, args);
        let _span = info_span!("invoke", tx_id = %tx_id, function).entered();

        let tx = Transaction::new(&self.ledger);
        let payload = match self.contract.invoke(&tx, function, args) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, pending = tx.write_set().len(), "invocation failed, discarding writes");
                return Err(e);
            }
        };

        let writes = if commit {
            let count = tx.commit()?;
            if count > 0 {
                info!(writes = count, "committed");
            }
            count
        } else {
            0
        };

        Ok(Receipt {
            tx_id,
            payload,
            writes,
        })
    }

    fn next_tx_id<S: AsRef<str>>(&self, function: &str, args: &[S]) -> TxId {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        TxId::derive(nonce, function, args)
    }
}
