//! Proposal records and the acceptance state machine

use serde::{Deserialize, Serialize};
use treasury::BudgetSchedule;

use crate::config::GovernanceConfig;
use crate::error::{GovernanceError, Result};
use crate::history::VotingHistory;

/// Identifiers below this are reserved
pub const FIRST_PROPOSAL_ID: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalState {
    /// Initial voting period running
    Started,
    /// Approved, budget claims allowed
    Accepted,
    /// Not approved, escrow returned
    Rejected,
    /// Support collapsed after acceptance, waiting for the contest to end
    Contested,
    /// Every budget period has been used up
    Completed,
}

impl ProposalState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalState::Rejected | ProposalState::Completed)
    }
}

/// Outcome of evaluating a proposal at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay,
    Accept,
    Reject,
    Contest { until: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: u64,
    pub beneficiary: String,
    pub title: String,
    pub documents_link: String,
    pub documents_hash: Vec<u8>,
    pub state: ProposalState,
    pub created_at: u64,
    pub initial_period_end: u64,
    pub contest_period_end: u64,
    pub budget: BudgetSchedule,
    pub history: VotingHistory,
}

/// Arguments of a new proposal
#[derive(Debug, Clone, Default)]
pub struct ProposalParams {
    pub beneficiary: String,
    pub title: String,
    pub documents_link: String,
    pub documents_hash: Vec<u8>,
    /// Budget period length in time units
    pub budget_period_length: u64,
    pub num_periods: u32,
    pub budget_per_period: u64,
}

impl Proposal {
    /// Build a Started proposal created at `now`.
    ///
    /// The first budget period opens when the initial voting period ends.
    pub(crate) fn new(
        id: u64,
        params: ProposalParams,
        config: &GovernanceConfig,
        now: u64,
    ) -> Result<Self> {
        let initial_period_end = now.saturating_add(config.initial_period_secs());
        let period_length = params
            .budget_period_length
            .checked_mul(config.time_unit_secs)
            .ok_or_else(|| GovernanceError::InvalidBudget("budget period too long".to_string()))?;
        let budget = BudgetSchedule::new(
            period_length,
            params.num_periods,
            params.budget_per_period,
            initial_period_end,
        )?;

        Ok(Self {
            id,
            beneficiary: params.beneficiary,
            title: params.title,
            documents_link: params.documents_link,
            documents_hash: params.documents_hash,
            state: ProposalState::Started,
            created_at: now,
            initial_period_end,
            contest_period_end: initial_period_end.saturating_add(config.contest_period_secs()),
            budget,
            history: VotingHistory::new(config.history_periods),
        })
    }

    pub fn remaining_periods(&self) -> u32 {
        self.budget.remaining_periods
    }

    /// Time unit of `now`, counted from creation
    pub fn time_unit_index(&self, now: u64, time_unit_secs: u64) -> u64 {
        now.saturating_sub(self.created_at) / time_unit_secs.max(1)
    }

    /// Decide the next state given the current vote difference.
    ///
    /// At most one step is taken per evaluation.
    pub fn evaluate(&self, difference: i64, now: u64, config: &GovernanceConfig) -> Transition {
        let approval = config.approval_pct as i64;
        let contest = config.contest_pct as i64;

        match self.state {
            ProposalState::Started if now >= self.initial_period_end => {
                if difference >= approval {
                    Transition::Accept
                } else {
                    Transition::Reject
                }
            }
            ProposalState::Accepted if difference <= contest => Transition::Contest {
                until: now.saturating_add(config.contest_period_secs()),
            },
            ProposalState::Contested if now >= self.contest_period_end => {
                if difference >= approval {
                    Transition::Accept
                } else {
                    Transition::Reject
                }
            }
            _ => Transition::Stay,
        }
    }
}
