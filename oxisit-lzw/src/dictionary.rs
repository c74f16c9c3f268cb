//! LZW code table.

use crate::config::LzwConfig;
use crate::error::{LzwError, Result};

/// Code table for decoding.
///
/// Starts with one entry per byte value and grows by one entry per code
/// read (after the first) until the configured limit.
#[derive(Debug)]
pub struct LzwDictionary {
    /// Code table: code -> byte sequence.
    table: Vec<Vec<u8>>,
    /// Configuration.
    config: LzwConfig,
    /// Current code bit width.
    current_bits: u8,
}

impl LzwDictionary {
    /// Create a new dictionary with the given configuration.
    pub fn new(config: LzwConfig) -> Result<Self> {
        config.validate()?;

        let mut dict = Self {
            table: Vec::with_capacity(config.table_limit as usize),
            config,
            current_bits: config.min_bits,
        };

        dict.reset();
        Ok(dict)
    }

    /// Reset the dictionary to the single-byte entries.
    pub fn reset(&mut self) {
        self.table.clear();
        self.current_bits = self.config.min_bits;
        for i in 0..self.config.literal_count() {
            self.table.push(vec![i as u8]);
        }
    }

    /// Append `prefix + first_byte` where `prefix` is the sequence of `prev`.
    ///
    /// Does nothing once the table is full. Widens the code when the table
    /// size reaches `1 << width`.
    pub fn add(&mut self, prev: u16, first_byte: u8) -> Result<()> {
        if self.is_full() {
            return Ok(());
        }

        let mut entry = self.get(prev)?.to_vec();
        entry.push(first_byte);
        self.table.push(entry);

        if self.table.len() == 1usize << self.current_bits
            && self.current_bits < self.config.max_bits
        {
            self.current_bits += 1;
            log::trace!(
                "LZW code width now {} bits at table size {}",
                self.current_bits,
                self.table.len()
            );
        }

        Ok(())
    }

    /// Get the byte sequence for a code.
    pub fn get(&self, code: u16) -> Result<&[u8]> {
        self.table
            .get(code as usize)
            .map(|v| v.as_slice())
            .ok_or(LzwError::InvalidCode {
                code,
                table_size: self.len(),
                position: 0,
            })
    }

    /// Whether `code` refers to an existing entry.
    pub fn contains(&self, code: u16) -> bool {
        (code as usize) < self.table.len()
    }

    /// Number of entries.
    pub fn len(&self) -> u16 {
        self.table.len() as u16
    }

    /// Always false: the literals are present from construction.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Check if the dictionary is full.
    pub fn is_full(&self) -> bool {
        self.table.len() >= self.config.table_limit as usize
    }

    /// Get the current bit width.
    pub fn current_bits(&self) -> u8 {
        self.current_bits
    }

    /// Get the configuration.
    pub fn config(&self) -> &LzwConfig {
        &self.config
    }
}
