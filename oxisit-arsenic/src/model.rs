//! Adaptive frequency model.
//!
//! Every symbol starts with a count of `increment`. Decoding a symbol bumps its
//! count by the same step; once the total passes `limit`, all counts are
//! halved (rounding up, so no count drops to zero).

use crate::tables::{ADAPTIVE_LIMIT, END_OF_BLOCK, RANK_BANDS};

/// Adaptive frequency table over the contiguous symbols `first..=last`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyModel {
    first: u16,
    frequencies: Vec<u32>,
    total: u32,
    increment: u32,
    limit: u32,
}

impl FrequencyModel {
    /// Create a model over `first..=last`.
    pub fn new(first: u16, last: u16, increment: u32, limit: u32) -> Self {
        debug_assert!(first <= last, "empty symbol range");
        debug_assert!(increment > 0, "zero increment");

        let count = (last - first) as usize + 1;
        Self {
            first,
            frequencies: vec![increment; count],
            total: increment * count as u32,
            increment,
            limit,
        }
    }

    /// Binary model used for the stream header, block flags and bit strings.
    pub fn initial() -> Self {
        Self::new(0, 1, 1, 256)
    }

    /// Selector model driving the block body.
    pub fn selector() -> Self {
        Self::new(0, END_OF_BLOCK, 8, ADAPTIVE_LIMIT)
    }

    /// The seven rank band models, lowest band first.
    pub fn rank_bands() -> [Self; 7] {
        RANK_BANDS.map(|(first, last, increment)| Self::new(first, last, increment, ADAPTIVE_LIMIT))
    }

    /// Restore every count to the increment.
    pub fn reset(&mut self) {
        self.frequencies.fill(self.increment);
        self.total = self.increment * self.frequencies.len() as u32;
    }

    /// Sum of all counts.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Frequency limit that triggers halving.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Per-symbol counts, first symbol first.
    pub fn frequencies(&self) -> &[u32] {
        &self.frequencies
    }

    /// Find the symbol whose cumulative interval contains `target`.
    ///
    /// Returns `(symbol, low, size)` where `low` is the cumulative count before
    /// the symbol and `size` its count, both taken before the model update.
    /// A target at or past the total selects the last symbol.
    pub fn decode_symbol(&mut self, target: u32) -> (u16, u32, u32) {
        let last = self.frequencies.len() - 1;
        let mut low = 0;
        let mut index = 0;
        while index < last && low + self.frequencies[index] <= target {
            low += self.frequencies[index];
            index += 1;
        }

        let size = self.frequencies[index];
        self.bump(index);
        (self.first + index as u16, low, size)
    }

    /// Interval of `symbol` before the update, then update as a decode would.
    #[cfg(any(test, feature = "fixture"))]
    pub fn encode_symbol(&mut self, symbol: u16) -> (u32, u32) {
        let index = (symbol - self.first) as usize;
        let low = self.frequencies[..index].iter().sum();
        let size = self.frequencies[index];
        self.bump(index);
        (low, size)
    }

    fn bump(&mut self, index: usize) {
        self.frequencies[index] += self.increment;
        self.total += self.increment;

        if self.total > self.limit {
            for f in &mut self.frequencies {
                *f = (*f + 1) >> 1;
            }
            self.total = self.frequencies.iter().sum();
        }
    }
}
