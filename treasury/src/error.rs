//! Treasury error types

use thiserror::Error;

use crate::ledger::LedgerAccount;

/// Ledger and budget errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreasuryError {
    #[error("Insufficient balance in {account}: requested {requested}, available {available}")]
    InsufficientBalance {
        account: LedgerAccount,
        requested: u64,
        available: u64,
    },

    #[error("Budget exceeded: requested {requested}, available {available}")]
    BudgetExceeded { requested: u64, available: u64 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Arithmetic overflow")]
    Overflow,
}

pub type Result<T> = std::result::Result<T, TreasuryError>;
