//! Error types for the contract and the ledger interface.

use crate::contract::Operation;
use thiserror::Error;

/// Errors raised by a ledger backend.
///
/// Messages are surfaced to callers verbatim through
/// [`ContractError::Ledger`].
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Backend(String),

    #[error("key must not be an empty string")]
    EmptyKey,

    #[error("Ledger snapshot is locked by another process")]
    Locked,

    #[error("Invalid snapshot format: {0}")]
    InvalidFormat(String),

    #[error("Checksum mismatch: expected {expected}, got {got}")]
    ChecksumMismatch { expected: u32, got: u32 },
}

/// Main error type for contract invocations.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("Incorrect number of arguments. Expecting {expected}")]
    InvalidArgumentCount {
        operation: Operation,
        expected: usize,
        got: usize,
    },

    #[error("Invalid Smart Contract function name.")]
    UnknownOperation(String),

    #[error("Unknown schema version: {0}")]
    UnknownSchema(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ContractError {
    fn from(e: serde_json::Error) -> Self {
        ContractError::Serialization(e.to_string())
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Result type for contract operations.
pub type Result<T> = std::result::Result<T, ContractError>;
