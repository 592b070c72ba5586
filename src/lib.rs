//! # FIDO Ledger
//!
//! A ledger-backed store for FIDO credential registrations, exposed as a
//! contract with four operations.
//!
//! ## Core Concepts
//!
//! - **Records**: four-field JSON objects (`bcID`, `aaguID`, `credentialID`,
//!   `regResp`) stored under caller-chosen keys
//! - **Ledger**: the external key/value world state, reached only through the
//!   [`Ledger`] trait
//! - **Contract**: a stateless dispatcher from function names to handlers
//! - **Host**: runs one invocation as a transaction that commits on success
//!
//! ## Example
//!
//! ```ignore
//! use fido_ledger::{ChaincodeHost, ContractConfig, MemoryLedger};
//!
//! let host = ChaincodeHost::new(MemoryLedger::new(), ContractConfig::default());
//! host.invoke("initFidoLedger", &[] as &[&str])?;
//!
//! let record = host.query("queryFido", &["FIDO2"])?;
//! let all = host.query("queryAllFidos", &[] as &[&str])?;
//! ```

pub mod config;
pub mod contract;
pub mod error;
pub mod host;
pub mod ledger;
pub mod types;

// Re-exports
pub use config::ContractConfig;
pub use contract::{
    decode_range_results, encode_range_results, sample_records, Arity, FidoContract, Operation,
    RangeEntry,
};
pub use error::{ContractError, LedgerError, LedgerResult, Result};
pub use host::{ChaincodeHost, Receipt, Transaction};
pub use ledger::{Ledger, MemoryLedger, RangeScan, SnapshotLedger};
pub use types::*;
