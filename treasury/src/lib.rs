//! Treasury Module
//!
//! Keeps the ledger of treasury, proposal escrow and holder balances, and
//! the arithmetic of proposal budget schedules:
//! - reservation of a proposal's full budget at creation
//! - one claimable budget per period
//! - forfeiture of unclaimed and missed periods back to the treasury

pub mod budget;
pub mod error;
pub mod ledger;

pub use budget::{budget_cap, check_budget, total_budget, BudgetSchedule, ClaimPlan};
pub use error::{Result, TreasuryError};
pub use ledger::{Ledger, LedgerAccount};

/// Denominator of every percentage setting
pub const PERCENT: u64 = 100;
