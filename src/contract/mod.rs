//! The FIDO record store contract.
//!
//! A stateless dispatcher: every call receives the ledger to work against,
//! resolves the function name to an [`Operation`], checks its argument
//! count and runs the matching handler.

mod handlers;
mod operation;
mod results;

pub use handlers::sample_records;
pub use operation::{Arity, Operation};
pub use results::{decode_range_results, encode_range_results, RangeEntry};

use crate::config::ContractConfig;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::types::Payload;

/// The contract.
#[derive(Clone, Debug, Default)]
pub struct FidoContract {
    config: ContractConfig,
}

impl FidoContract {
    pub fn new(config: ContractConfig) -> Self {
        Self { config }
    }

    /// Called once when the contract is instantiated. Writes nothing.
    pub fn init<L: Ledger + ?Sized>(&self, _ledger: &L) -> Result<Payload> {
        Ok(Payload::new())
    }

    /// Run `function` with `args` against `ledger`.
    ///
    /// Unknown names fail with `UnknownOperation` before arguments are
    /// looked at; a wrong argument count fails with `InvalidArgumentCount`
    /// before the ledger is touched.
    pub fn invoke<L, S>(&self, ledger: &L, function: &str, args: &[S]) -> Result<Payload>
    where
        L: Ledger + ?Sized,
        S: AsRef<str>,
    {
        let operation: Operation = function.parse()?;
        operation.check_arity(args.len())?;

        match operation {
            Operation::InitLedger => handlers::seed_sample_records(&self.config, ledger),
            Operation::CreateFido => handlers::create_record(&self.config, ledger, args),
            Operation::QueryFido => handlers::query_record(ledger, args[0].as_ref()),
            Operation::QueryAllFidos => handlers::query_all_records(&self.config, ledger),
        }
    }
}
