//! Governance engine
//!
//! Owns the single authoritative store (ledger, proposals and ballot boxes)
//! and runs every externally invoked operation against it. Operations are
//! atomic: the store is snapshotted first and restored if the operation
//! fails, so an error never leaves partial effects.
//!
//! There is no scheduler. Time-gated transitions only happen when a caller
//! asks for them through [`Governance::update_proposal_state`] or
//! [`Governance::claim_reward`], with `now` given explicitly in unix seconds.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use treasury::{check_budget, total_budget, Ledger, LedgerAccount};

use crate::ballot::{BallotBox, VoteChoice};
use crate::config::GovernanceConfig;
use crate::error::{GovernanceError, Result};
use crate::history::VotingHistory;
use crate::proposal::{Proposal, ProposalParams, ProposalState, Transition, FIRST_PROPOSAL_ID};
use crate::slots::SlotOwnership;

/// Result of a successful claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub proposal_id: u64,
    /// Paid to the caller
    pub claimed: u64,
    /// Returned to the treasury
    pub forfeited: u64,
    pub missed_periods: u32,
    pub remaining_periods: u32,
    pub state: ProposalState,
}

/// Everything the engine mutates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceState {
    ledger: Ledger,
    proposals: BTreeMap<u64, Proposal>,
    ballots: BTreeMap<u64, BallotBox>,
    next_id: u64,
}

impl GovernanceState {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            proposals: BTreeMap::new(),
            ballots: BTreeMap::new(),
            next_id: FIRST_PROPOSAL_ID,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn create_proposal(
        &mut self,
        config: &GovernanceConfig,
        params: ProposalParams,
        now: u64,
    ) -> Result<u64> {
        if params.num_periods == 0 {
            return Err(GovernanceError::InvalidBudget(
                "at least one budget period is required".to_string(),
            ));
        }
        if params.budget_period_length < config.min_period_length {
            return Err(GovernanceError::InvalidBudget(format!(
                "budget period of {} time units is shorter than the minimum of {}",
                params.budget_period_length, config.min_period_length
            )));
        }

        let total = total_budget(params.num_periods, params.budget_per_period)?;
        check_budget(total, self.ledger.treasury_balance(), config.treasury_limit_pct)?;

        let id = self.next_id;
        let proposal = Proposal::new(id, params, config, now)?;
        self.ledger
            .transfer(&LedgerAccount::Treasury, &LedgerAccount::Escrow(id), total)?;

        log::info!(
            "Proposal {} created for {}: {} periods x {} ({} reserved)",
            id,
            proposal.beneficiary,
            proposal.budget.remaining_periods,
            proposal.budget.budget_per_period,
            total
        );

        self.proposals.insert(id, proposal);
        self.ballots.insert(id, BallotBox::new(id, config.num_slots));
        self.next_id += 1;
        Ok(id)
    }

    fn pay_for_gas(&mut self, id: u64, count: u32) -> Result<u32> {
        let ballot = self
            .ballots
            .get_mut(&id)
            .ok_or(GovernanceError::InvalidBallotId(id))?;
        let unpaid = ballot.pay_for_gas(count)?;
        log::debug!("Ballot {}: gas paid for {} slots, {} unpaid", id, count, unpaid);
        Ok(unpaid)
    }

    #[allow(clippy::too_many_arguments)]
    fn cast_vote<S: SlotOwnership>(
        &mut self,
        config: &GovernanceConfig,
        slots: &S,
        id: u64,
        caller: &str,
        slot: u32,
        choice: VoteChoice,
        now: u64,
    ) -> Result<()> {
        let ballot = self
            .ballots
            .get_mut(&id)
            .ok_or(GovernanceError::InvalidBallotId(id))?;
        let num_slots = ballot.num_slots();
        if slot >= num_slots {
            return Err(GovernanceError::InvalidSlot { slot, num_slots });
        }
        if slots.owner_of(slot) != Some(caller) {
            return Err(GovernanceError::InvalidSlotOwner { slot });
        }
        ballot.record_vote(slot, choice)?;
        let difference = ballot.vote_difference();

        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(GovernanceError::InvalidProposalId(id))?;
        let unit = proposal.time_unit_index(now, config.time_unit_secs);
        let idx = proposal.history.record(unit, difference);

        log::debug!(
            "Ballot {}: slot {} voted {:?}, difference {}% (history slot {})",
            id,
            slot,
            choice,
            difference,
            idx
        );
        Ok(())
    }

    /// Vote `choice` slot by slot from slot 0 until `reached` holds
    #[allow(clippy::too_many_arguments)]
    fn cast_votes_until<S: SlotOwnership>(
        &mut self,
        config: &GovernanceConfig,
        slots: &S,
        id: u64,
        caller: &str,
        choice: VoteChoice,
        now: u64,
        reached: impl Fn(i64) -> bool,
    ) -> Result<u32> {
        let num_slots = self
            .ballots
            .get(&id)
            .ok_or(GovernanceError::InvalidBallotId(id))?
            .num_slots();

        let mut cast = 0;
        for slot in 0..num_slots {
            let ballot = &self.ballots[&id];
            if reached(ballot.vote_difference()) {
                break;
            }
            if ballot.vote(slot) == Some(choice) {
                continue;
            }
            self.cast_vote(config, slots, id, caller, slot, choice, now)?;
            cast += 1;
        }
        Ok(cast)
    }

    fn update_proposal_state(
        &mut self,
        config: &GovernanceConfig,
        id: u64,
        now: u64,
    ) -> Result<ProposalState> {
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(GovernanceError::InvalidProposalId(id))?;
        let difference = self
            .ballots
            .get(&id)
            .map(BallotBox::vote_difference)
            .ok_or(GovernanceError::InvalidBallotId(id))?;

        match proposal.evaluate(difference, now, config) {
            Transition::Stay => return Ok(proposal.state),
            Transition::Accept => proposal.state = ProposalState::Accepted,
            Transition::Reject => proposal.state = ProposalState::Rejected,
            Transition::Contest { until } => {
                proposal.state = ProposalState::Contested;
                proposal.contest_period_end = until;
            }
        }
        let state = proposal.state;
        log::info!(
            "Proposal {} is now {:?} (vote difference {}%)",
            id,
            state,
            difference
        );

        if state == ProposalState::Rejected {
            let refunded = self.close(id)?;
            log::info!("Proposal {}: escrow of {} returned to treasury", id, refunded);
        }
        Ok(state)
    }

    fn claim_reward(
        &mut self,
        config: &GovernanceConfig,
        id: u64,
        caller: &str,
        amount: u64,
        now: u64,
    ) -> Result<ClaimReceipt> {
        let state = self.update_proposal_state(config, id, now)?;
        if state != ProposalState::Accepted {
            return Err(GovernanceError::IncorrectProposalState { id, state });
        }

        let escrow = LedgerAccount::Escrow(id);
        let escrow_balance = self.ledger.balance(&escrow);
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(GovernanceError::InvalidProposalId(id))?;
        let plan = proposal.budget.plan_claim(now, amount, escrow_balance)?;
        proposal.budget.apply(&plan);
        if proposal.budget.is_exhausted() {
            proposal.state = ProposalState::Completed;
        }
        let state = proposal.state;
        let remaining_periods = proposal.budget.remaining_periods;

        self.ledger
            .transfer(&escrow, &LedgerAccount::holder(caller), plan.payout)?;
        self.ledger
            .transfer(&escrow, &LedgerAccount::Treasury, plan.forfeited)?;

        if plan.missed_periods > 0 {
            log::warn!(
                "Proposal {}: {} budget period(s) missed and forfeited",
                id,
                plan.missed_periods
            );
        }
        if !plan.is_noop() {
            log::info!(
                "Proposal {}: {} claimed {}, {} returned to treasury, {} periods left",
                id,
                caller,
                plan.payout,
                plan.forfeited,
                remaining_periods
            );
        }

        let mut forfeited = plan.forfeited;
        if state == ProposalState::Completed {
            forfeited += self.close(id)?;
            log::info!("Proposal {} completed", id);
        }

        Ok(ClaimReceipt {
            proposal_id: id,
            claimed: plan.payout,
            forfeited,
            missed_periods: plan.missed_periods,
            remaining_periods,
            state,
        })
    }

    /// Deactivate the ballot and return any escrow left to the treasury
    fn close(&mut self, id: u64) -> Result<u64> {
        if let Some(ballot) = self.ballots.get_mut(&id) {
            ballot.deactivate();
        }
        let refunded = self
            .ledger
            .sweep(&LedgerAccount::Escrow(id), &LedgerAccount::Treasury)?;
        Ok(refunded)
    }
}

/// Run `op` against `state`, restoring the previous state if it fails
fn transact<T>(
    state: &mut GovernanceState,
    op: impl FnOnce(&mut GovernanceState) -> Result<T>,
) -> Result<T> {
    let snapshot = state.clone();
    let result = op(state);
    if result.is_err() {
        *state = snapshot;
    }
    result
}

#[derive(Serialize)]
struct SnapshotRef<'a, S> {
    config: &'a GovernanceConfig,
    state: &'a GovernanceState,
    slots: &'a S,
}

#[derive(Deserialize)]
struct Snapshot<S> {
    config: GovernanceConfig,
    state: GovernanceState,
    slots: S,
}

/// Proposal registry and treasury budget front end
#[derive(Debug, Clone)]
pub struct Governance<S> {
    config: GovernanceConfig,
    state: GovernanceState,
    slots: S,
}

impl<S: SlotOwnership> Governance<S> {
    /// Engine over a genesis ledger
    pub fn new(config: GovernanceConfig, ledger: Ledger, slots: S) -> Result<Self> {
        Self::from_parts(config, GovernanceState::new(ledger), slots)
    }

    pub fn from_parts(config: GovernanceConfig, state: GovernanceState, slots: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state,
            slots,
        })
    }

    pub fn into_parts(self) -> (GovernanceConfig, GovernanceState, S) {
        (self.config, self.state, self.slots)
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub fn state(&self) -> &GovernanceState {
        &self.state
    }

    pub fn slots(&self) -> &S {
        &self.slots
    }

    /// Slot ownership changes come from outside governance
    pub fn slots_mut(&mut self) -> &mut S {
        &mut self.slots
    }

    /// Reserve the budget and open a proposal with its ballot box
    pub fn create_proposal(&mut self, params: ProposalParams, now: u64) -> Result<u64> {
        transact(&mut self.state, |state| {
            state.create_proposal(&self.config, params, now)
        })
    }

    /// Prepay gas for `count` slots; any account may pay
    pub fn pay_for_gas(&mut self, id: u64, count: u32) -> Result<u32> {
        transact(&mut self.state, |state| state.pay_for_gas(id, count))
    }

    pub fn cast_vote(
        &mut self,
        id: u64,
        caller: &str,
        slot: u32,
        choice: VoteChoice,
        now: u64,
    ) -> Result<()> {
        transact(&mut self.state, |state| {
            state.cast_vote(&self.config, &self.slots, id, caller, slot, choice, now)
        })
    }

    /// Vote Yes from slot 0 upward until the approval threshold is met,
    /// returning the number of votes cast
    pub fn cast_votes_for_approval(&mut self, id: u64, caller: &str, now: u64) -> Result<u32> {
        let threshold = self.config.approval_pct as i64;
        transact(&mut self.state, |state| {
            state.cast_votes_until(
                &self.config,
                &self.slots,
                id,
                caller,
                VoteChoice::Yes,
                now,
                |difference| difference >= threshold,
            )
        })
    }

    /// Vote No from slot 0 upward until the difference is low enough to
    /// reject or contest, returning the number of votes cast
    pub fn cast_votes_for_rejection(&mut self, id: u64, caller: &str, now: u64) -> Result<u32> {
        let threshold = self.config.rejection_threshold();
        transact(&mut self.state, |state| {
            state.cast_votes_until(
                &self.config,
                &self.slots,
                id,
                caller,
                VoteChoice::No,
                now,
                |difference| difference <= threshold,
            )
        })
    }

    /// Re-evaluate the state machine; a no-op when nothing is due
    pub fn update_proposal_state(&mut self, id: u64, now: u64) -> Result<ProposalState> {
        transact(&mut self.state, |state| {
            state.update_proposal_state(&self.config, id, now)
        })
    }

    /// Claim up to the current period's budget for the caller
    pub fn claim_reward(
        &mut self,
        id: u64,
        caller: &str,
        amount: u64,
        now: u64,
    ) -> Result<ClaimReceipt> {
        transact(&mut self.state, |state| {
            state.claim_reward(&self.config, id, caller, amount, now)
        })
    }

    pub fn proposal(&self, id: u64) -> Result<&Proposal> {
        self.state
            .proposals
            .get(&id)
            .ok_or(GovernanceError::InvalidProposalId(id))
    }

    pub fn proposal_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.state.proposals.keys().copied()
    }

    pub fn ballot(&self, id: u64) -> Result<&BallotBox> {
        self.state
            .ballots
            .get(&id)
            .ok_or(GovernanceError::InvalidBallotId(id))
    }

    pub fn vote(&self, id: u64, slot: u32) -> Result<Option<VoteChoice>> {
        Ok(self.ballot(id)?.vote(slot))
    }

    pub fn vote_count(&self, id: u64, choice: VoteChoice) -> Result<u32> {
        Ok(self.ballot(id)?.vote_count(choice))
    }

    pub fn unpaid_slots(&self, id: u64) -> Result<u32> {
        Ok(self.ballot(id)?.unpaid_slots())
    }

    pub fn vote_difference(&self, id: u64) -> Result<i64> {
        Ok(self.ballot(id)?.vote_difference())
    }

    pub fn voting_history(&self, id: u64) -> Result<&VotingHistory> {
        Ok(&self.proposal(id)?.history)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.state.ledger
    }

    pub fn balance(&self, account: &LedgerAccount) -> u64 {
        self.state.ledger.balance(account)
    }

    pub fn treasury_balance(&self) -> u64 {
        self.state.ledger.treasury_balance()
    }

    pub fn escrow_balance(&self, id: u64) -> u64 {
        self.state.ledger.escrow_balance(id)
    }

    pub fn initial_period_secs(&self) -> u64 {
        self.config.initial_period_secs()
    }

    pub fn contest_period_secs(&self) -> u64 {
        self.config.contest_period_secs()
    }
}

impl<S: SlotOwnership + Serialize + DeserializeOwned> Governance<S> {
    /// Write config, state and slot table as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let snapshot = SnapshotRef {
            config: &self.config,
            state: &self.state,
            slots: &self.slots,
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let snapshot: Snapshot<S> = serde_json::from_str(&contents)?;
        Self::from_parts(snapshot.config, snapshot.state, snapshot.slots)
    }
}
