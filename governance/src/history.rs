//! Voting history encoding
//!
//! Each proposal remembers its vote difference over time as one byte per
//! time unit (`difference + 100`, so [-100, 100] maps onto [0, 200]). The
//! bytes live in a circular buffer of `capacity` entries, laid out in
//! 32-byte words: entry `i` is byte `i % 32` of word `i / 32`, byte 0 being
//! the least significant.
//!
//! `start_idx` always points at the newest entry. A new time unit moves it
//! one slot back (wrapping), so reading forward from `start_idx` yields the
//! history newest first, and a full buffer overwrites its oldest entry.

use serde::{Deserialize, Serialize};

pub const WORD_BYTES: usize = 32;

/// One packed word of history entries
pub type HistoryWord = [u8; WORD_BYTES];

const DIFFERENCE_OFFSET: i64 = 100;

/// Pack a vote difference into an entry byte
pub fn encode_entry(difference: i64) -> u8 {
    (difference.clamp(-DIFFERENCE_OFFSET, DIFFERENCE_OFFSET) + DIFFERENCE_OFFSET) as u8
}

/// Unpack an entry byte into a vote difference
pub fn decode_entry(entry: u8) -> i64 {
    entry as i64 - DIFFERENCE_OFFSET
}

/// Number of words needed for `capacity` entries
pub fn words_for(capacity: u32) -> usize {
    (capacity as usize).div_ceil(WORD_BYTES)
}

/// Render a word as a big-endian hexadecimal number without leading zeros
pub fn word_to_hex(word: &HistoryWord) -> String {
    let mut bytes = word.iter().rev().skip_while(|b| **b == 0);
    match bytes.next() {
        None => "0".to_string(),
        Some(first) => {
            let mut hex = format!("{:x}", first);
            for b in bytes {
                hex.push_str(&format!("{:02x}", b));
            }
            hex
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingHistory {
    entries: Vec<u8>,
    capacity: u32,
    start_idx: u32,
    len: u32,
    last_unit: Option<u64>,
}

impl VotingHistory {
    pub fn new(capacity: u32) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: vec![0; words_for(capacity) * WORD_BYTES],
            capacity,
            start_idx: 0,
            len: 0,
            last_unit: None,
        }
    }

    /// Record `difference` for time unit `unit` (counted from proposal
    /// creation), returning the index written.
    ///
    /// Within the unit of the newest entry the value is overwritten; a later
    /// unit gets a fresh entry. Skipped units are not filled in.
    pub fn record(&mut self, unit: u64, difference: i64) -> u32 {
        match self.last_unit {
            None => {
                self.start_idx = 0;
                self.len = 1;
            }
            Some(last) if unit <= last => {}
            Some(_) => {
                self.start_idx = (self.start_idx + self.capacity - 1) % self.capacity;
                self.len = (self.len + 1).min(self.capacity);
            }
        }
        self.last_unit = Some(self.last_unit.map_or(unit, |last| last.max(unit)));
        self.entries[self.start_idx as usize] = encode_entry(difference);
        self.start_idx
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn start_idx(&self) -> u32 {
        self.start_idx
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raw entry byte at buffer position `idx`
    pub fn entry_at(&self, idx: u32) -> Option<u8> {
        if idx >= self.capacity {
            return None;
        }
        self.entries.get(idx as usize).copied()
    }

    /// Most recent vote difference
    pub fn latest(&self) -> Option<i64> {
        if self.is_empty() {
            return None;
        }
        Some(decode_entry(self.entries[self.start_idx as usize]))
    }

    /// Recorded differences, newest first
    pub fn differences(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.len).map(move |offset| {
            let idx = (self.start_idx + offset) % self.capacity;
            decode_entry(self.entries[idx as usize])
        })
    }

    /// Packed storage words
    pub fn words(&self) -> Vec<HistoryWord> {
        self.entries
            .chunks_exact(WORD_BYTES)
            .map(|chunk| {
                let mut word = [0u8; WORD_BYTES];
                word.copy_from_slice(chunk);
                word
            })
            .collect()
    }
}
