//! Prefix (Huffman) codes for method 13.
//!
//! Codes are matched one bit at a time: the first bit read is the most
//! significant bit of the code. Canonical codes are assigned in symbol order
//! within each length; explicit codes are stored first-bit-in-bit-0 and
//! reversed on construction.

use oxisit_core::bitstream::LsbBitReader;
use oxisit_core::error::{OxiSitError, Result};
use std::io::Read;

/// Longest code length that can be assigned.
pub const MAX_CODE_LENGTH: usize = 32;

/// One assigned code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CodeEntry {
    length: u8,
    code: u32,
    symbol: u16,
}

/// Prefix code table.
///
/// Entries are kept sorted by `(length, code)` with symbol order preserved
/// for ties, so a lookup returns the first symbol holding a code.
#[derive(Debug, Clone)]
pub struct PrefixCode {
    entries: Vec<CodeEntry>,
    /// `entries[starts[len]..starts[len + 1]]` hold the codes of length `len`.
    starts: [usize; MAX_CODE_LENGTH + 2],
    max_length: u8,
}

impl PrefixCode {
    /// Build a canonical code from per-symbol lengths.
    ///
    /// Lengths `<= 0` (and above [`MAX_CODE_LENGTH`]) give the symbol no code,
    /// as do codes that overflow their length when the lengths oversubscribe
    /// the code space.
    pub fn from_lengths(lengths: &[i32]) -> Self {
        let usable = |len: i32| len > 0 && len as usize <= MAX_CODE_LENGTH;

        let mut count = [0u64; MAX_CODE_LENGTH + 1];
        for &len in lengths.iter().filter(|&&len| usable(len)) {
            count[len as usize] += 1;
        }

        let mut next = [0u64; MAX_CODE_LENGTH + 1];
        let mut code = 0u64;
        for len in 1..=MAX_CODE_LENGTH {
            next[len] = code;
            code = (code + count[len]) << 1;
        }

        let mut entries = Vec::with_capacity(lengths.len());
        for (symbol, &len) in lengths.iter().enumerate() {
            if usable(len) {
                let l = len as usize;
                // An oversubscribed set leaves its trailing symbols unreachable.
                if next[l] < 1u64 << l {
                    entries.push(CodeEntry {
                        length: l as u8,
                        code: next[l] as u32,
                        symbol: symbol as u16,
                    });
                }
                next[l] += 1;
            }
        }

        Self::from_entries(entries)
    }

    /// Build a code from explicit codes whose first bit sits in bit 0.
    pub fn from_explicit_codes(codes: &[u32], lengths: &[u8]) -> Self {
        let entries = codes
            .iter()
            .zip(lengths)
            .enumerate()
            .filter(|&(_, (_, &len))| len > 0 && len as usize <= MAX_CODE_LENGTH)
            .map(|(symbol, (&code, &len))| CodeEntry {
                length: len,
                code: reverse_bits(code, len),
                symbol: symbol as u16,
            })
            .collect();

        Self::from_entries(entries)
    }

    fn from_entries(mut entries: Vec<CodeEntry>) -> Self {
        entries.sort_by_key(|e| (e.length, e.code));

        let mut starts = [0usize; MAX_CODE_LENGTH + 2];
        for e in &entries {
            starts[e.length as usize + 1] += 1;
        }
        for len in 1..starts.len() {
            starts[len] += starts[len - 1];
        }

        let max_length = entries.last().map_or(0, |e| e.length);
        Self {
            entries,
            starts,
            max_length,
        }
    }

    /// Longest code length in the table (0 if the table is empty).
    pub fn max_length(&self) -> u8 {
        self.max_length
    }

    /// Number of symbols with a code.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no symbol has a code.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, length: usize, code: u32) -> Option<u16> {
        let group = &self.entries[self.starts[length]..self.starts[length + 1]];
        let idx = group.partition_point(|e| e.code < code);
        group.get(idx).filter(|e| e.code == code).map(|e| e.symbol)
    }

    /// Decode one symbol.
    pub fn decode<R: Read>(&self, reader: &mut LsbBitReader<R>) -> Result<u16> {
        let mut code = 0u32;
        for length in 1..=self.max_length as usize {
            code = (code << 1) | reader.read_bit()?;
            if let Some(symbol) = self.lookup(length, code) {
                return Ok(symbol);
            }
        }

        Err(OxiSitError::invalid_huffman(reader.bit_position()))
    }

    /// Code and length for `symbol`, most significant bit read first.
    #[cfg(any(test, feature = "fixture"))]
    pub fn encoding(&self, symbol: u16) -> Option<(u32, u8)> {
        self.entries
            .iter()
            .find(|e| e.symbol == symbol)
            .map(|e| (e.code, e.length))
    }
}

/// Reverse the low `length` bits of `value`.
fn reverse_bits(value: u32, length: u8) -> u32 {
    if length == 0 {
        return 0;
    }
    value.reverse_bits() >> (32 - length as u32)
}
