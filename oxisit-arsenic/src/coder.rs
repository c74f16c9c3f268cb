//! 26-bit arithmetic decoder.
//!
//! The decoder tracks `code`, the offset of the stream value from the bottom
//! of the current interval, and the interval width `range`. Bits are read
//! MSB-first; past the end of the input the reader supplies zeros.

use crate::model::FrequencyModel;
use oxisit_core::bitstream::MsbBitReader;
use oxisit_core::error::Result;
use std::io::Read;

/// Precision of the coder in bits.
pub const CODER_BITS: u8 = 26;

/// Initial interval width.
pub const CODER_ONE: u32 = 1 << (CODER_BITS - 1);

/// Renormalisation threshold.
pub const CODER_HALF: u32 = 1 << (CODER_BITS - 2);

const CODE_MASK: u32 = (1 << CODER_BITS) - 1;

/// Arithmetic decoder over an MSB-first bit source.
#[derive(Debug)]
pub struct ArithmeticDecoder<R: Read> {
    reader: MsbBitReader<R>,
    range: u32,
    code: u32,
}

impl<R: Read> ArithmeticDecoder<R> {
    /// Create a decoder and prime it with the first 26 bits.
    pub fn new(reader: R) -> Result<Self> {
        let mut reader = MsbBitReader::new(reader);
        let code = reader.read_bits(CODER_BITS)?;
        Ok(Self {
            reader,
            range: CODER_ONE,
            code,
        })
    }

    /// Scaled position of the code within a model of `total` counts.
    pub fn decode_frequency(&self, total: u32) -> u32 {
        (self.code / (self.range / total)).min(total - 1)
    }

    /// Narrow the interval to the decoded symbol and renormalise.
    pub fn remove_symbol(&mut self, low: u32, size: u32, total: u32) -> Result<()> {
        let scale = self.range / total;
        let offset = scale * low;

        self.code -= offset;
        if low + size == total {
            // The top symbol absorbs the rounding slack.
            self.range -= offset;
        } else {
            self.range = size * scale;
        }

        while self.range <= CODER_HALF {
            self.range <<= 1;
            self.code = ((self.code << 1) | self.reader.read_bit()?) & CODE_MASK;
        }
        Ok(())
    }

    /// Decode one symbol from `model` and update it.
    pub fn next_symbol(&mut self, model: &mut FrequencyModel) -> Result<u16> {
        let total = model.total();
        let target = self.decode_frequency(total);
        let (symbol, low, size) = model.decode_symbol(target);
        self.remove_symbol(low, size, total)?;
        Ok(symbol)
    }

    /// Decode `count` binary symbols, the first into bit 0.
    pub fn next_bit_string(&mut self, model: &mut FrequencyModel, count: u8) -> Result<u32> {
        debug_assert!(count <= 32);

        let mut value = 0u32;
        for i in 0..count {
            if self.next_symbol(model)? != 0 {
                value |= 1 << i;
            }
        }
        Ok(value)
    }

    /// Whether the decoder has read past the end of its input.
    pub fn is_exhausted(&self) -> bool {
        self.reader.is_exhausted()
    }

    /// Bits consumed so far, padding included.
    pub fn bit_position(&self) -> u64 {
        self.reader.bit_position()
    }
}
