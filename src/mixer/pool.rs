//! Lane id allocation
//!
//! A 256-bit occupancy set. Finding the smallest free id scans at most four
//! words, each with a single `trailing_ones`.

use crate::constants::MAX_LANES;
use crate::protocol::LaneId;

const WORD_BITS: usize = u64::BITS as usize;
const WORDS: usize = MAX_LANES / WORD_BITS;

/// Fixed-size pool of lane ids `0..MAX_LANES`
#[derive(Debug, Clone, Default)]
pub struct LanePool {
    used: [u64; WORDS],
    count: usize,
}

impl LanePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the smallest free id, `None` when the pool is exhausted
    pub fn allocate(&mut self) -> Option<LaneId> {
        let (word_index, word) = self
            .used
            .iter_mut()
            .enumerate()
            .find(|(_, w)| **w != u64::MAX)?;

        let bit = word.trailing_ones() as usize;
        *word |= 1 << bit;
        self.count += 1;

        LaneId::try_from(word_index * WORD_BITS + bit).ok()
    }

    /// Return an id to the pool, `false` if it was not allocated
    pub fn release(&mut self, id: LaneId) -> bool {
        let (word, mask) = Self::locate(id);
        if self.used[word] & mask == 0 {
            return false;
        }
        self.used[word] &= !mask;
        self.count -= 1;
        true
    }

    pub fn contains(&self, id: LaneId) -> bool {
        let (word, mask) = Self::locate(id);
        self.used[word] & mask != 0
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn locate(id: LaneId) -> (usize, u64) {
        (id.index() / WORD_BITS, 1u64 << (id.index() % WORD_BITS))
    }
}
