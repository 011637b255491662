//! Proposal budget schedules
//!
//! A proposal's budget is reserved up front and released one period at a
//! time. Each period is "use it or lose it": whatever the claimer does not
//! take from an open period, and every period that passes without a claim,
//! goes back to the treasury.
//!
//! Everything here is pure arithmetic. [`BudgetSchedule::plan_claim`]
//! returns a [`ClaimPlan`] which the caller applies to the ledger, so a
//! rejected claim never leaves partial effects behind.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TreasuryError};

/// Largest total budget a new proposal may reserve
pub fn budget_cap(treasury_balance: u64, limit_pct: u8) -> u64 {
    ((treasury_balance as u128 * limit_pct as u128) / crate::PERCENT as u128) as u64
}

/// `num_periods * budget_per_period`, rejecting overflow
pub fn total_budget(num_periods: u32, budget_per_period: u64) -> Result<u64> {
    budget_per_period
        .checked_mul(num_periods as u64)
        .ok_or(TreasuryError::Overflow)
}

/// Check a requested total against the treasury limit
pub fn check_budget(total: u64, treasury_balance: u64, limit_pct: u8) -> Result<()> {
    let cap = budget_cap(treasury_balance, limit_pct);
    if total > cap {
        return Err(TreasuryError::BudgetExceeded {
            requested: total,
            available: cap,
        });
    }
    Ok(())
}

/// Payout schedule of a single proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSchedule {
    /// Length of one budget period in seconds
    pub period_length: u64,
    pub remaining_periods: u32,
    pub budget_per_period: u64,
    /// The current period opens at this timestamp
    pub next_claim_date: u64,
}

/// Value movements of one claim, computed before anything is touched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimPlan {
    /// Whole periods that elapsed without a claim
    pub missed_periods: u32,
    /// Escrow returned to the treasury (missed periods plus the unclaimed
    /// part of the current one)
    pub forfeited: u64,
    /// Escrow paid to the claimer
    pub payout: u64,
    /// Periods this claim uses up, missed ones included
    pub periods_consumed: u32,
    pub next_claim_date: u64,
}

impl ClaimPlan {
    /// Total leaving the escrow account
    pub fn escrow_debit(&self) -> u64 {
        self.forfeited + self.payout
    }

    pub fn is_noop(&self) -> bool {
        self.periods_consumed == 0 && self.escrow_debit() == 0
    }
}

impl BudgetSchedule {
    pub fn new(
        period_length: u64,
        num_periods: u32,
        budget_per_period: u64,
        first_claim_date: u64,
    ) -> Result<Self> {
        if period_length == 0 {
            return Err(TreasuryError::InvalidAmount(
                "budget period length must be positive".to_string(),
            ));
        }
        Ok(Self {
            period_length,
            remaining_periods: num_periods,
            budget_per_period,
            next_claim_date: first_claim_date,
        })
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_periods == 0
    }

    /// Budget still scheduled for payout
    pub fn remaining_budget(&self) -> u64 {
        self.budget_per_period
            .saturating_mul(self.remaining_periods as u64)
    }

    /// Work out what claiming `amount` at `now` would move.
    ///
    /// `escrow_balance` caps everything, the schedule never pays out more
    /// than the proposal actually holds.
    pub fn plan_claim(&self, now: u64, amount: u64, escrow_balance: u64) -> Result<ClaimPlan> {
        if self.is_exhausted() || now < self.next_claim_date {
            return Ok(ClaimPlan {
                next_claim_date: self.next_claim_date,
                ..ClaimPlan::default()
            });
        }

        let elapsed = (now - self.next_claim_date) / self.period_length;
        let missed = elapsed.min(self.remaining_periods as u64) as u32;
        let missed_budget = (missed as u64)
            .saturating_mul(self.budget_per_period)
            .min(escrow_balance);
        let next_claim_date = self
            .next_claim_date
            .saturating_add((missed as u64).saturating_mul(self.period_length));

        if missed == self.remaining_periods {
            return Ok(ClaimPlan {
                missed_periods: missed,
                forfeited: missed_budget,
                payout: 0,
                periods_consumed: missed,
                next_claim_date,
            });
        }

        let available = self.budget_per_period.min(escrow_balance - missed_budget);
        if amount > available {
            return Err(TreasuryError::BudgetExceeded {
                requested: amount,
                available,
            });
        }

        Ok(ClaimPlan {
            missed_periods: missed,
            forfeited: missed_budget + (available - amount),
            payout: amount,
            periods_consumed: missed + 1,
            next_claim_date: next_claim_date.saturating_add(self.period_length),
        })
    }

    pub fn apply(&mut self, plan: &ClaimPlan) {
        self.remaining_periods = self.remaining_periods.saturating_sub(plan.periods_consumed);
        self.next_claim_date = plan.next_claim_date;
    }
}
