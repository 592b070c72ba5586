//! Operation names and their argument contracts.

use crate::error::{ContractError, Result};
use std::fmt;
use std::str::FromStr;

/// Number of arguments an operation accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many arguments.
    Exactly(usize),
    /// Arguments are ignored.
    Any,
}

/// An invocable contract operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Write the ten sample records.
    InitLedger,
    /// Write one record under a caller-chosen key.
    CreateFido,
    /// Read one record by key.
    QueryFido,
    /// Scan all records in the configured key range.
    QueryAllFidos,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::InitLedger,
        Operation::CreateFido,
        Operation::QueryFido,
        Operation::QueryAllFidos,
    ];

    /// Function name used by callers.
    pub fn name(self) -> &'static str {
        match self {
            Operation::InitLedger => "initFidoLedger",
            Operation::CreateFido => "createFido",
            Operation::QueryFido => "queryFido",
            Operation::QueryAllFidos => "queryAllFidos",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Operation::InitLedger | Operation::QueryAllFidos => Arity::Any,
            Operation::CreateFido => Arity::Exactly(8),
            Operation::QueryFido => Arity::Exactly(1),
        }
    }

    /// Fail with `InvalidArgumentCount` unless `got` satisfies the arity.
    pub fn check_arity(self, got: usize) -> Result<()> {
        match self.arity() {
            Arity::Exactly(expected) if expected != got => {
                Err(ContractError::InvalidArgumentCount {
                    operation: self,
                    expected,
                    got,
                })
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| ContractError::UnknownOperation(s.to_string()))
    }
}
