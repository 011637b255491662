//! Slot ownership
//!
//! How slots are won is decided elsewhere; governance only asks who owns a
//! slot right now.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read-only view of slot ownership
pub trait SlotOwnership {
    /// Account currently controlling `slot`, if any
    fn owner_of(&self, slot: u32) -> Option<&str>;
}

/// In-memory slot ownership table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRegistry {
    owners: BTreeMap<u32, String>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, slot: u32, owner: impl Into<String>) {
        self.owners.insert(slot, owner.into());
    }

    /// Give slots `0..num_slots` to a single owner
    pub fn assign_all(&mut self, num_slots: u32, owner: &str) {
        for slot in 0..num_slots {
            self.assign(slot, owner);
        }
    }

    pub fn release(&mut self, slot: u32) -> Option<String> {
        self.owners.remove(&slot)
    }

    /// Slots held by `owner`, ascending
    pub fn slots_of<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = u32> + 'a {
        self.owners
            .iter()
            .filter(move |(_, o)| o.as_str() == owner)
            .map(|(slot, _)| *slot)
    }
}

impl SlotOwnership for SlotRegistry {
    fn owner_of(&self, slot: u32) -> Option<&str> {
        self.owners.get(&slot).map(String::as_str)
    }
}
