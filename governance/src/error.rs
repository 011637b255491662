//! Governance error types

use thiserror::Error;
use treasury::TreasuryError;

use crate::proposal::ProposalState;

#[derive(Error, Debug)]
pub enum GovernanceError {
    #[error("Invalid slot owner: caller does not control slot {slot}")]
    InvalidSlotOwner { slot: u32 },

    #[error("Invalid slot {slot}: ballot has {num_slots} slots")]
    InvalidSlot { slot: u32, num_slots: u32 },

    #[error("Invalid ballot box ID: {0}")]
    InvalidBallotId(u64),

    #[error("Invalid proposal ID: {0}")]
    InvalidProposalId(u64),

    #[error("Ballot {0} is not active")]
    BallotNotActive(u64),

    #[error("Incorrect proposal state: proposal {id} is {state:?}")]
    IncorrectProposalState { id: u64, state: ProposalState },

    #[error("Too many slots: requested {requested}, unpaid {unpaid}")]
    TooManySlots { requested: u32, unpaid: u32 },

    #[error("Budget exceeded: requested {requested}, available {available}")]
    BudgetExceeded { requested: u64, available: u64 },

    #[error("Invalid budget: {0}")]
    InvalidBudget(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Treasury error: {0}")]
    Treasury(TreasuryError),
}

impl From<TreasuryError> for GovernanceError {
    fn from(err: TreasuryError) -> Self {
        match err {
            TreasuryError::BudgetExceeded {
                requested,
                available,
            } => GovernanceError::BudgetExceeded {
                requested,
                available,
            },
            other => GovernanceError::Treasury(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, GovernanceError>;
