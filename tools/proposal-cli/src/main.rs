//! Proposal Governance CLI
//!
//! Drives the governance engine against a JSON state file. Every command
//! loads the state, runs one operation and writes the state back.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use treasury::LedgerAccount;

mod commands;
mod store;

#[derive(Parser, Debug)]
#[command(name = "proposal-cli")]
#[command(about = "Slot governance proposal and treasury CLI")]
#[command(version)]
pub struct Cli {
    /// Governance state file
    #[arg(long, global = true, default_value = "proposals.json")]
    pub state: PathBuf,

    /// TOML config file (defaults apply when missing)
    #[arg(long, global = true, default_value = "proposal-cli.toml")]
    pub config: PathBuf,

    /// Current time in unix seconds (defaults to the system clock)
    #[arg(long, global = true)]
    pub now: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new state file with a funded treasury
    Init {
        /// Genesis treasury balance (overrides the config)
        #[arg(long)]
        treasury: Option<u64>,

        /// Overwrite an existing state file
        #[arg(long)]
        force: bool,
    },

    /// Hand slots to an owner
    AssignSlots {
        #[arg(long)]
        owner: String,

        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        slot: Option<u32>,

        /// Every slot
        #[arg(long)]
        all: bool,
    },

    /// Create a proposal and reserve its budget
    Create {
        #[arg(long)]
        beneficiary: String,

        #[arg(long, default_value = "")]
        title: String,

        #[arg(long, default_value = "")]
        documents_link: String,

        /// Hex encoded document hash
        #[arg(long, default_value = "")]
        documents_hash: String,

        /// Budget period length in time units
        #[arg(long)]
        period_length: u64,

        /// Number of budget periods
        #[arg(long)]
        periods: u32,

        #[arg(long)]
        per_period: u64,
    },

    /// Prepay gas for ballot slots
    PayGas {
        #[arg(long)]
        id: u64,

        /// Number of slots (defaults to all unpaid)
        #[arg(long)]
        slots: Option<u32>,
    },

    /// Cast or change the vote of one slot
    Vote {
        #[arg(long)]
        id: u64,

        #[arg(long)]
        slot: u32,

        #[arg(long)]
        caller: String,

        #[arg(long, value_enum)]
        choice: Choice,
    },

    /// Vote with the caller's slots until an outcome is reached
    VoteUntil {
        #[arg(long)]
        id: u64,

        #[arg(long)]
        caller: String,

        #[arg(long, value_enum)]
        outcome: Outcome,
    },

    /// Re-evaluate a proposal's state
    Update {
        #[arg(long)]
        id: u64,
    },

    /// Claim budget for the current period
    Claim {
        #[arg(long)]
        id: u64,

        #[arg(long)]
        caller: String,

        #[arg(long)]
        amount: u64,
    },

    /// Show a proposal with its ballot and voting history
    Show {
        #[arg(long)]
        id: u64,
    },

    /// Show an account balance (treasury, escrow:<id> or a holder name)
    Balance {
        #[arg(long)]
        account: LedgerAccount,
    },

    /// List all proposals
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Choice {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Outcome {
    Approval,
    Rejection,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    match commands::run(&cli) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
