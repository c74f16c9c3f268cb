//! LZW configuration.

use crate::error::{LzwError, Result};

/// LZW configuration parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LzwConfig {
    /// Starting code width in bits.
    pub min_bits: u8,
    /// Maximum code width in bits.
    pub max_bits: u8,
    /// Table size at which no more entries are added.
    pub table_limit: u16,
}

impl LzwConfig {
    /// StuffIt method 2.
    ///
    /// - LSB-first bit order
    /// - 9-12 bit codes, no clear code
    /// - Width grows when the table size reaches `1 << width`
    /// - Table frozen at 4096 entries
    /// - No end code: the reserved value 4096 does not fit in 12 bits, so the
    ///   stream ends at the declared length or where the input runs out
    pub const STUFFIT: Self = Self {
        min_bits: 9,
        max_bits: 12,
        table_limit: 4096,
    };

    /// Number of single-byte entries the table starts with.
    pub fn literal_count(&self) -> u16 {
        256
    }

    /// Check the widths describe a usable table.
    pub fn validate(&self) -> Result<()> {
        if self.min_bits < 9 || self.min_bits > self.max_bits || self.max_bits > 15 {
            return Err(LzwError::InvalidBitWidth {
                min_bits: self.min_bits,
                max_bits: self.max_bits,
            });
        }
        Ok(())
    }
}

impl Default for LzwConfig {
    fn default() -> Self {
        Self::STUFFIT
    }
}
