//! fido-ledger - run contract invocations against a local snapshot file.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fido_ledger::{ChaincodeHost, ContractConfig, SchemaVersion, SnapshotLedger};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fido-ledger")]
#[command(author, version, about = "Ledger-backed FIDO record store", long_about = None)]
struct Cli {
    /// Snapshot file holding the world state
    #[arg(long, global = true, default_value = "ledger.state")]
    state: PathBuf,

    /// Record schema: legacy (4 fields) or extended (7 fields)
    #[arg(long, global = true, default_value = "legacy")]
    schema: SchemaVersion,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Instantiate the contract
    Init,

    /// Run a function and commit its writes
    Invoke {
        /// Function name (e.g. createFido)
        function: String,

        /// Positional arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Run a function without committing
    Query {
        /// Function name (e.g. queryAllFidos)
        function: String,

        /// Positional arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let ledger = SnapshotLedger::open(&cli.state)
        .with_context(|| format!("opening {}", cli.state.display()))?;
    let host = ChaincodeHost::new(ledger, ContractConfig::with_schema(cli.schema));

    let receipt = match &cli.command {
        Commands::Init => host.init()?,
        Commands::Invoke { function, args } => {
            let receipt = host.invoke(function, args.as_slice())?;
            if receipt.writes > 0 {
                host.ledger()
                    .save()
                    .with_context(|| format!("saving {}", cli.state.display()))?;
            }
            receipt
        }
        Commands::Query { function, args } => host.query(function, args.as_slice())?,
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&receipt.payload)?;
    if !receipt.payload.is_empty() {
        writeln!(stdout)?;
    }
    Ok(())
}
