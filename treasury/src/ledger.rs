//! Account ledger
//!
//! Holds every balance the governance engine can move: the treasury, one
//! escrow account per proposal and ordinary holder accounts. After genesis
//! value is only transferred, so the total supply is constant.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TreasuryError};

/// An addressable balance on the ledger
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LedgerAccount {
    /// The community treasury
    Treasury,
    /// Budget reserved for a single proposal
    Escrow(u64),
    /// A regular account holder
    Holder(String),
}

impl LedgerAccount {
    pub fn holder(name: impl Into<String>) -> Self {
        LedgerAccount::Holder(name.into())
    }
}

impl fmt::Display for LedgerAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerAccount::Treasury => write!(f, "treasury"),
            LedgerAccount::Escrow(id) => write!(f, "escrow:{}", id),
            LedgerAccount::Holder(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for LedgerAccount {
    type Err = TreasuryError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TreasuryError::InvalidAmount("empty account name".to_string()));
        }
        if s.eq_ignore_ascii_case("treasury") {
            return Ok(LedgerAccount::Treasury);
        }
        if let Some(id) = s.strip_prefix("escrow:") {
            let id = id
                .parse::<u64>()
                .map_err(|_| TreasuryError::InvalidAmount(format!("invalid escrow id: {}", id)))?;
            return Ok(LedgerAccount::Escrow(id));
        }
        Ok(LedgerAccount::Holder(s.to_string()))
    }
}

/// Balances for the treasury, proposal escrows and holders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    treasury: u64,
    escrow: BTreeMap<u64, u64>,
    holders: BTreeMap<String, u64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Genesis ledger with the whole supply sitting in the treasury
    pub fn with_treasury(balance: u64) -> Self {
        Self {
            treasury: balance,
            ..Self::default()
        }
    }

    pub fn balance(&self, account: &LedgerAccount) -> u64 {
        match account {
            LedgerAccount::Treasury => self.treasury,
            LedgerAccount::Escrow(id) => self.escrow.get(id).copied().unwrap_or(0),
            LedgerAccount::Holder(name) => self.holders.get(name).copied().unwrap_or(0),
        }
    }

    pub fn treasury_balance(&self) -> u64 {
        self.treasury
    }

    pub fn escrow_balance(&self, proposal_id: u64) -> u64 {
        self.balance(&LedgerAccount::Escrow(proposal_id))
    }

    /// Sum of all balances
    pub fn total_supply(&self) -> u128 {
        let escrow: u128 = self.escrow.values().map(|b| *b as u128).sum();
        let holders: u128 = self.holders.values().map(|b| *b as u128).sum();
        self.treasury as u128 + escrow + holders
    }

    /// Holder accounts with a non-zero balance
    pub fn holders(&self) -> impl Iterator<Item = (&str, u64)> {
        self.holders
            .iter()
            .filter(|(_, b)| **b > 0)
            .map(|(name, b)| (name.as_str(), *b))
    }

    /// Move `amount` from one account to another.
    ///
    /// Either both sides are updated or neither is.
    pub fn transfer(&mut self, from: &LedgerAccount, to: &LedgerAccount, amount: u64) -> Result<()> {
        if amount == 0 || from == to {
            return Ok(());
        }

        let available = self.balance(from);
        if available < amount {
            return Err(TreasuryError::InsufficientBalance {
                account: from.clone(),
                requested: amount,
                available,
            });
        }
        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or(TreasuryError::Overflow)?;

        self.set_balance(from, available - amount);
        self.set_balance(to, credited);
        log::debug!("Ledger transfer {} -> {}: {}", from, to, amount);
        Ok(())
    }

    /// Move whatever is left on `from` to `to`, returning the amount moved
    pub fn sweep(&mut self, from: &LedgerAccount, to: &LedgerAccount) -> Result<u64> {
        let amount = self.balance(from);
        self.transfer(from, to, amount)?;
        Ok(amount)
    }

    fn set_balance(&mut self, account: &LedgerAccount, balance: u64) {
        match account {
            LedgerAccount::Treasury => self.treasury = balance,
            LedgerAccount::Escrow(id) => {
                if balance == 0 {
                    self.escrow.remove(id);
                } else {
                    self.escrow.insert(*id, balance);
                }
            }
            LedgerAccount::Holder(name) => {
                if balance == 0 {
                    self.holders.remove(name);
                } else {
                    self.holders.insert(name.clone(), balance);
                }
            }
        }
    }
}
