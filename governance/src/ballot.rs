//! Ballot boxes
//!
//! Every proposal owns one ballot box with a vote per slot. Slot storage
//! has to be prepaid before voting opens; once every slot is paid for the
//! box becomes active.

use serde::{Deserialize, Serialize};

use crate::error::{GovernanceError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteChoice {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallotState {
    /// Waiting for gas to be prepaid for every slot
    PrepayingGas,
    /// Accepting votes
    Active,
    /// Closed for good
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotBox {
    pub id: u64,
    state: BallotState,
    unpaid_slots: u32,
    votes: Vec<Option<VoteChoice>>,
    yes_count: u32,
    no_count: u32,
}

impl BallotBox {
    /// New ballot for `num_slots` slots.
    ///
    /// Creating the box covers the first slot, the rest must be prepaid.
    pub fn new(id: u64, num_slots: u32) -> Self {
        let unpaid_slots = num_slots.saturating_sub(1);
        let state = if unpaid_slots == 0 {
            BallotState::Active
        } else {
            BallotState::PrepayingGas
        };

        Self {
            id,
            state,
            unpaid_slots,
            votes: vec![None; num_slots as usize],
            yes_count: 0,
            no_count: 0,
        }
    }

    pub fn state(&self) -> BallotState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == BallotState::Active
    }

    pub fn num_slots(&self) -> u32 {
        self.votes.len() as u32
    }

    pub fn unpaid_slots(&self) -> u32 {
        self.unpaid_slots
    }

    /// Prepay gas for `count` slots, returning how many remain unpaid
    pub fn pay_for_gas(&mut self, count: u32) -> Result<u32> {
        if count > self.unpaid_slots {
            return Err(GovernanceError::TooManySlots {
                requested: count,
                unpaid: self.unpaid_slots,
            });
        }

        self.unpaid_slots -= count;
        if self.unpaid_slots == 0 && self.state == BallotState::PrepayingGas {
            self.state = BallotState::Active;
            log::info!("Ballot {} is active", self.id);
        }
        Ok(self.unpaid_slots)
    }

    /// Store `choice` for `slot`, replacing any earlier vote from that slot.
    ///
    /// Ownership is checked by the caller.
    pub fn record_vote(&mut self, slot: u32, choice: VoteChoice) -> Result<()> {
        let num_slots = self.num_slots();
        if slot >= num_slots {
            return Err(GovernanceError::InvalidSlot { slot, num_slots });
        }
        if !self.is_active() {
            return Err(GovernanceError::BallotNotActive(self.id));
        }

        let previous = self.votes[slot as usize].replace(choice);
        match previous {
            Some(VoteChoice::Yes) => self.yes_count -= 1,
            Some(VoteChoice::No) => self.no_count -= 1,
            None => {}
        }
        match choice {
            VoteChoice::Yes => self.yes_count += 1,
            VoteChoice::No => self.no_count += 1,
        }
        Ok(())
    }

    pub fn vote(&self, slot: u32) -> Option<VoteChoice> {
        self.votes.get(slot as usize).copied().flatten()
    }

    pub fn vote_count(&self, choice: VoteChoice) -> u32 {
        match choice {
            VoteChoice::Yes => self.yes_count,
            VoteChoice::No => self.no_count,
        }
    }

    /// `floor(100 * (yes - no) / num_slots)`, always within [-100, 100]
    pub fn vote_difference(&self) -> i64 {
        let num_slots = self.num_slots() as i64;
        if num_slots == 0 {
            return 0;
        }
        let margin = self.yes_count as i64 - self.no_count as i64;
        (100 * margin).div_euclid(num_slots)
    }

    pub(crate) fn deactivate(&mut self) {
        if self.state != BallotState::Inactive {
            self.state = BallotState::Inactive;
            log::info!("Ballot {} is inactive", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_box(num_slots: u32) -> BallotBox {
        let mut ballot = BallotBox::new(100, num_slots);
        ballot.pay_for_gas(num_slots - 1).unwrap();
        ballot
    }

    #[test]
    fn test_new_ballot_waits_for_gas() {
        let ballot = BallotBox::new(100, 4);
        assert_eq!(ballot.state(), BallotState::PrepayingGas);
        assert_eq!(ballot.unpaid_slots(), 3);
        assert_eq!(ballot.vote(0), None);
    }

    #[test]
    fn test_single_slot_ballot_starts_active() {
        assert!(BallotBox::new(100, 1).is_active());
    }

    #[test]
    fn test_pay_for_gas_in_chunks() {
        let mut ballot = BallotBox::new(100, 256);
        assert_eq!(ballot.pay_for_gas(64).unwrap(), 191);
        assert_eq!(ballot.pay_for_gas(64).unwrap(), 127);
        assert_eq!(ballot.pay_for_gas(64).unwrap(), 63);
        assert_eq!(ballot.state(), BallotState::PrepayingGas);
        assert_eq!(ballot.pay_for_gas(63).unwrap(), 0);
        assert!(ballot.is_active());
    }

    #[test]
    fn test_pay_for_too_many_slots() {
        let mut ballot = BallotBox::new(100, 4);
        let err = ballot.pay_for_gas(20).unwrap_err();
        assert!(matches!(
            err,
            GovernanceError::TooManySlots {
                requested: 20,
                unpaid: 3
            }
        ));
        assert_eq!(ballot.unpaid_slots(), 3);
    }

    #[test]
    fn test_vote_requires_active_ballot() {
        let mut ballot = BallotBox::new(100, 4);
        assert!(matches!(
            ballot.record_vote(0, VoteChoice::Yes),
            Err(GovernanceError::BallotNotActive(100))
        ));
    }

    #[test]
    fn test_vote_change_moves_between_buckets() {
        let mut ballot = active_box(4);

        ballot.record_vote(0, VoteChoice::Yes).unwrap();
        assert_eq!(ballot.vote(0), Some(VoteChoice::Yes));
        assert_eq!(ballot.vote_count(VoteChoice::Yes), 1);

        ballot.record_vote(0, VoteChoice::No).unwrap();
        assert_eq!(ballot.vote(0), Some(VoteChoice::No));
        assert_eq!(ballot.vote_count(VoteChoice::Yes), 0);
        assert_eq!(ballot.vote_count(VoteChoice::No), 1);

        // Repeating the same vote does not double count
        ballot.record_vote(0, VoteChoice::No).unwrap();
        assert_eq!(ballot.vote_count(VoteChoice::No), 1);
    }

    #[test]
    fn test_vote_difference_floors() {
        let mut ballot = active_box(4);
        ballot.record_vote(0, VoteChoice::No).unwrap();
        assert_eq!(ballot.vote_difference(), -25);

        let mut ballot = active_box(256);
        ballot.record_vote(0, VoteChoice::No).unwrap();
        assert_eq!(ballot.vote_difference(), -1);
        ballot.record_vote(1, VoteChoice::Yes).unwrap();
        ballot.record_vote(2, VoteChoice::Yes).unwrap();
        assert_eq!(ballot.vote_difference(), 0);
    }

    #[test]
    fn test_vote_difference_bounds() {
        for slots in [2u32, 3, 7, 256] {
            let mut ballot = active_box(slots);
            for slot in 0..slots {
                ballot.record_vote(slot, VoteChoice::Yes).unwrap();
            }
            assert_eq!(ballot.vote_difference(), 100);
            for slot in 0..slots {
                ballot.record_vote(slot, VoteChoice::No).unwrap();
            }
            assert_eq!(ballot.vote_difference(), -100);
            assert!(ballot.vote_count(VoteChoice::Yes) + ballot.vote_count(VoteChoice::No) <= slots);
        }
    }

    #[test]
    fn test_slot_out_of_range() {
        let mut ballot = active_box(4);
        assert!(matches!(
            ballot.record_vote(4, VoteChoice::Yes),
            Err(GovernanceError::InvalidSlot {
                slot: 4,
                num_slots: 4
            })
        ));
    }
}
