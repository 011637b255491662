//! Slot Governance Module
//!
//! Proposal registry and treasury budget management driven by slot-based
//! voting. Slot holders vote on proposals through per-proposal ballot
//! boxes; accepted proposals draw their reserved budget period by period.

pub mod ballot;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod proposal;
pub mod slots;

pub use ballot::{BallotBox, BallotState, VoteChoice};
pub use config::GovernanceConfig;
pub use engine::{ClaimReceipt, Governance, GovernanceState};
pub use error::{GovernanceError, Result};
pub use history::{HistoryWord, VotingHistory, WORD_BYTES};
pub use proposal::{Proposal, ProposalParams, ProposalState, Transition, FIRST_PROPOSAL_ID};
pub use slots::{SlotOwnership, SlotRegistry};

pub use treasury::{Ledger, LedgerAccount};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GovernanceConfig::default();
        assert_eq!(config.num_slots, 256);
        assert_eq!(config.approval_pct, 10);
        assert_eq!(FIRST_PROPOSAL_ID, 100);
    }
}
