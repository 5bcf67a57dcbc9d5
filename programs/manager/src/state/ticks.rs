//! Sparse bitmap index of cover-expiry ticks

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::ops::Bound::{Excluded, Unbounded};

use parasol_common::ParasolError;

const WORD_BITS: u32 = 64;

/// Maps each initialized tick to the covers expiring there.
///
/// A 64-bit word bitmap keyed by `tick / 64` answers "next initialized tick
/// at or after" with one masked trailing_zeros plus an ordered range scan,
/// so lookup cost tracks the number of occupied words, not the tick span.
/// The per-tick buckets hold cover ids in insertion order; removal swaps
/// with the last element so each cover carries its slot index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickIndex {
    words: BTreeMap<u32, u64>,
    buckets: BTreeMap<u32, Vec<u64>>,
}

impl TickIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from decoded buckets; the bitmap is derived, not stored.
    pub fn from_buckets(buckets: BTreeMap<u32, Vec<u64>>) -> Self {
        let mut words = BTreeMap::new();
        for tick in buckets.keys() {
            let (word, bit) = word_pos(*tick);
            *words.entry(word).or_insert(0u64) |= 1u64 << bit;
        }
        Self { words, buckets }
    }

    pub fn is_initialized(&self, tick: u32) -> bool {
        let (word, bit) = word_pos(tick);
        self.words
            .get(&word)
            .map(|w| w & (1u64 << bit) != 0)
            .unwrap_or(false)
    }

    /// Append a cover id to the tick's bucket, returning its slot index.
    pub fn add(&mut self, tick: u32, cover_id: u64) -> u32 {
        let bucket = self.buckets.entry(tick).or_default();
        bucket.push(cover_id);
        let (word, bit) = word_pos(tick);
        *self.words.entry(word).or_insert(0u64) |= 1u64 << bit;
        (bucket.len() - 1) as u32
    }

    /// Remove a cover id from its bucket by stored slot index.
    ///
    /// Returns the id that was swapped into the vacated slot, if any; the
    /// caller must update that cover's stored index.
    pub fn remove(
        &mut self,
        tick: u32,
        cover_id: u64,
        slot: u32,
    ) -> Result<Option<u64>, ParasolError> {
        let bucket = self
            .buckets
            .get_mut(&tick)
            .ok_or(ParasolError::CoverNotFound)?;
        let slot = slot as usize;
        if slot >= bucket.len() || bucket[slot] != cover_id {
            return Err(ParasolError::CoverNotFound);
        }
        bucket.swap_remove(slot);
        let moved = bucket.get(slot).copied();
        if bucket.is_empty() {
            self.buckets.remove(&tick);
            self.clear_bit(tick);
        }
        Ok(moved)
    }

    /// Detach and return the whole bucket at `tick` (empty if none).
    pub fn take_bucket(&mut self, tick: u32) -> Vec<u64> {
        match self.buckets.remove(&tick) {
            Some(bucket) => {
                self.clear_bit(tick);
                bucket
            }
            None => Vec::new(),
        }
    }

    /// Next initialized tick at or after `tick`, if any.
    pub fn next_initialized_at_or_after(&self, tick: u32) -> Option<u32> {
        let (word, bit) = word_pos(tick);
        if let Some(bits) = self.words.get(&word) {
            let masked = bits & (!0u64 << bit);
            if masked != 0 {
                return Some(word * WORD_BITS + masked.trailing_zeros());
            }
        }
        for (word, bits) in self.words.range((Excluded(word), Unbounded)) {
            if *bits != 0 {
                return Some(word * WORD_BITS + bits.trailing_zeros());
            }
        }
        None
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&u32, &Vec<u64>)> {
        self.buckets.iter()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn clear_bit(&mut self, tick: u32) {
        let (word, bit) = word_pos(tick);
        if let Some(bits) = self.words.get_mut(&word) {
            *bits &= !(1u64 << bit);
            if *bits == 0 {
                self.words.remove(&word);
            }
        }
    }
}

fn word_pos(tick: u32) -> (u32, u32) {
    (tick / WORD_BITS, tick % WORD_BITS)
}
