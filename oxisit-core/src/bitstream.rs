//! Bit-level readers for the StuffIt codecs.
//!
//! The codec families disagree on bit order, and on what running out of input
//! means:
//!
//! - [`MsbBitReader`] hands out the most significant bit of each byte first and
//!   reads zero bits forever once the input is exhausted. The arithmetic decoder
//!   keeps renormalising past the last real byte, so end-of-input is not an
//!   error there.
//! - [`LsbBitReader`] hands out the least significant bit first and fails with
//!   [`OxiSitError::UnexpectedEof`] when a read cannot be satisfied. The Huffman
//!   and LZW streams are length-delimited, so running dry is truncation.
//!
//! # Example
//!
//! ```
//! use oxisit_core::bitstream::{LsbBitReader, MsbBitReader};
//! use std::io::Cursor;
//!
//! let mut msb = MsbBitReader::new(Cursor::new([0b1010_0000u8]));
//! assert_eq!(msb.read_bits(3).unwrap(), 0b101);
//!
//! let mut lsb = LsbBitReader::new(Cursor::new([0b0000_0101u8]));
//! assert_eq!(lsb.read_bits(3).unwrap(), 0b101);
//! ```

use crate::error::{OxiSitError, Result};
use std::io::{self, Read};

/// Read a single byte, distinguishing end-of-input from I/O failure.
fn next_byte<R: Read>(reader: &mut R) -> Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// MSB-first bit reader with silent end-of-input.
#[derive(Debug)]
pub struct MsbBitReader<R: Read> {
    reader: R,
    /// Current byte being consumed.
    current: u8,
    /// Bits remaining in `current`.
    bits_left: u8,
    /// Set once a zero bit has been synthesised past end-of-input.
    exhausted: bool,
    /// Total bits handed out, padding included.
    total_bits_read: u64,
}

impl<R: Read> MsbBitReader<R> {
    /// Create a new reader over `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            current: 0,
            bits_left: 0,
            exhausted: false,
            total_bits_read: 0,
        }
    }

    /// Read one bit. Returns 0 once the input is exhausted.
    #[inline]
    pub fn read_bit(&mut self) -> Result<u32> {
        if self.bits_left == 0 {
            if self.exhausted {
                self.total_bits_read += 1;
                return Ok(0);
            }
            match next_byte(&mut self.reader)? {
                Some(byte) => {
                    self.current = byte;
                    self.bits_left = 8;
                }
                None => {
                    self.exhausted = true;
                    self.total_bits_read += 1;
                    return Ok(0);
                }
            }
        }

        self.bits_left -= 1;
        self.total_bits_read += 1;
        Ok(((self.current >> self.bits_left) & 1) as u32)
    }

    /// Read up to 32 bits, first bit read in the most significant position.
    pub fn read_bits(&mut self, count: u8) -> Result<u32> {
        debug_assert!(count <= 32, "Cannot read more than 32 bits at once");

        let mut value = 0u32;
        for _ in 0..count {
            value = (value << 1) | self.read_bit()?;
        }
        Ok(value)
    }

    /// Whether zero padding has been produced past the end of the input.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Total bits handed out so far, including padding.
    pub fn bit_position(&self) -> u64 {
        self.total_bits_read
    }

    /// Consume this reader and return the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// LSB-first bit reader that treats end-of-input as an error.
///
/// Bits are buffered in a 64-bit accumulator, least significant first.
#[derive(Debug)]
pub struct LsbBitReader<R: Read> {
    /// Underlying reader.
    reader: R,
    /// Bit buffer (LSB-first).
    buffer: u64,
    /// Number of valid bits in buffer.
    bits_in_buffer: u8,
    /// Total bits read (for error reporting).
    total_bits_read: u64,
}

impl<R: Read> LsbBitReader<R> {
    /// Create a new reader over `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: 0,
            bits_in_buffer: 0,
            total_bits_read: 0,
        }
    }

    /// Consume this reader and return the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Get the current bit position (for error reporting).
    pub fn bit_position(&self) -> u64 {
        self.total_bits_read
    }

    /// Bits fetched from the source but not yet handed out.
    ///
    /// After a failed read this tells byte padding (fewer than 8 bits) apart
    /// from a value cut short.
    pub fn buffered_bits(&self) -> u8 {
        self.bits_in_buffer
    }

    /// Ensure at least `count` bits are buffered.
    #[inline]
    fn fill_buffer(&mut self, count: u8) -> Result<()> {
        debug_assert!(count <= 56, "Cannot fill more than 56 bits at once");

        while self.bits_in_buffer < count {
            match next_byte(&mut self.reader)? {
                Some(byte) => {
                    self.buffer |= (byte as u64) << self.bits_in_buffer;
                    self.bits_in_buffer += 8;
                }
                None => {
                    let missing = (count - self.bits_in_buffer).div_ceil(8);
                    return Err(OxiSitError::unexpected_eof(missing as usize));
                }
            }
        }

        Ok(())
    }

    /// Read one bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<u32> {
        self.read_bits(1)
    }

    /// Read up to 32 bits, first bit read in the least significant position.
    #[inline]
    pub fn read_bits(&mut self, count: u8) -> Result<u32> {
        debug_assert!(count <= 32, "Cannot read more than 32 bits at once");

        if count == 0 {
            return Ok(0);
        }

        self.fill_buffer(count)?;

        let mask = (1u64 << count).wrapping_sub(1);
        let result = (self.buffer & mask) as u32;

        self.buffer >>= count;
        self.bits_in_buffer -= count;
        self.total_bits_read += count as u64;

        Ok(result)
    }
}

/// LSB-first bit writer used to build well-formed test streams.
#[cfg(any(test, feature = "fixture"))]
#[derive(Debug, Default)]
pub struct LsbBitWriter {
    data: Vec<u8>,
    buffer: u64,
    bits_in_buffer: u8,
}

#[cfg(any(test, feature = "fixture"))]
impl LsbBitWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the low `count` bits of `value`, least significant first.
    pub fn write_bits(&mut self, value: u32, count: u8) {
        debug_assert!(count <= 32);
        if count == 0 {
            return;
        }
        let mask = (1u64 << count) - 1;
        self.buffer |= (value as u64 & mask) << self.bits_in_buffer;
        self.bits_in_buffer += count;
        while self.bits_in_buffer >= 8 {
            self.data.push(self.buffer as u8);
            self.buffer >>= 8;
            self.bits_in_buffer -= 8;
        }
    }

    /// Pad the final partial byte with zeros and return the bytes.
    pub fn finish(mut self) -> Vec<u8> {
        if self.bits_in_buffer > 0 {
            self.data.push(self.buffer as u8);
        }
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_msb_read_bits() {
        let mut reader = MsbBitReader::new(Cursor::new([0xA5u8, 0x0F]));
        assert_eq!(reader.read_bits(4).unwrap(), 0xA);
        assert_eq!(reader.read_bits(8).unwrap(), 0x50);
        assert_eq!(reader.read_bits(4).unwrap(), 0xF);
        assert!(!reader.is_exhausted());
    }

    #[test]
    fn test_msb_silent_eof() {
        let mut reader = MsbBitReader::new(Cursor::new([0xFFu8]));
        assert_eq!(reader.read_bits(8).unwrap(), 0xFF);
        assert!(!reader.is_exhausted());
        assert_eq!(reader.read_bits(26).unwrap(), 0);
        assert!(reader.is_exhausted());
        assert_eq!(reader.bit_position(), 34);
    }

    #[test]
    fn test_msb_empty_input() {
        let mut reader = MsbBitReader::new(Cursor::new(Vec::<u8>::new()));
        assert_eq!(reader.read_bits(26).unwrap(), 0);
        assert!(reader.is_exhausted());
    }

    #[test]
    fn test_lsb_read_bits() {
        let mut reader = LsbBitReader::new(Cursor::new([0b1011_0100u8, 0b0000_0001]));
        assert_eq!(reader.read_bits(2).unwrap(), 0b00);
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(reader.read_bits(4).unwrap(), 0b1101);
        assert_eq!(reader.bit_position(), 9);
    }

    #[test]
    fn test_lsb_read_across_bytes() {
        let mut reader = LsbBitReader::new(Cursor::new([0xFFu8, 0x01, 0x00]));
        assert_eq!(reader.read_bits(9).unwrap(), 0x1FF);
        assert_eq!(reader.read_bits(15).unwrap(), 0);
    }

    #[test]
    fn test_lsb_eof_is_error() {
        let mut reader = LsbBitReader::new(Cursor::new([0xABu8]));
        assert_eq!(reader.read_bits(4).unwrap(), 0xB);
        let err = reader.read_bits(9).unwrap_err();
        assert!(matches!(err, OxiSitError::UnexpectedEof { .. }));
        assert_eq!(reader.buffered_bits(), 4);
        assert_eq!(reader.bit_position(), 4);
    }

    #[test]
    fn test_lsb_writer_reader_agree() {
        let mut writer = LsbBitWriter::new();
        writer.write_bits(0b101, 3);
        writer.write_bits(0x1234, 15);
        writer.write_bits(1, 1);
        let bytes = writer.finish();

        let mut reader = LsbBitReader::new(Cursor::new(bytes));
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(reader.read_bits(15).unwrap(), 0x1234);
        assert_eq!(reader.read_bit().unwrap(), 1);
    }
}
