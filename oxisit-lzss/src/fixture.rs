//! Method 13 stream writer for tests.
//!
//! Emits the table header and a token sequence using the same code tables
//! the decoder builds, so any token list round-trips through
//! [`Sit13Decoder`](crate::Sit13Decoder).

use crate::decoder::CodeTables;
use crate::prefix::PrefixCode;
use crate::tables::{END_OF_STREAM, META_CODE_LENGTHS, META_CODES, NUM_LITERAL_LENGTH};
use oxisit_core::bitstream::LsbBitWriter;

/// One decoded-side token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// A single byte.
    Literal(u8),
    /// Copy `length` bytes from `distance` back (length 3..=32832).
    Match {
        /// Number of bytes to copy.
        length: usize,
        /// Distance back into the window (1..=65536).
        distance: usize,
    },
    /// End-of-stream marker.
    End,
}

/// Builds method 13 streams.
///
/// # Panics
///
/// Writing a token whose symbol has no code in the active table panics.
#[derive(Debug)]
pub struct Sit13Writer {
    writer: LsbBitWriter,
    tables: CodeTables,
    use_second: bool,
}

impl Sit13Writer {
    /// Start a stream using built-in table set `set` (1..=5).
    pub fn built_in(set: u8) -> Self {
        assert!((1..=5).contains(&set), "built-in sets are 1..=5");
        let mut writer = LsbBitWriter::new();
        writer.write_bits((set as u32) << 4, 8);
        let tables = match CodeTables::built_in(set) {
            Ok(tables) => tables,
            Err(e) => panic!("built-in set {set}: {e}"),
        };
        Self {
            writer,
            tables,
            use_second: false,
        }
    }

    /// Start a stream with transmitted code lengths.
    ///
    /// `second` of `None` sets the shared-table flag. The offset table must
    /// have 10..=17 entries.
    pub fn dynamic(first: &[i32], second: Option<&[i32]>, offset: &[i32]) -> Self {
        assert_eq!(first.len(), NUM_LITERAL_LENGTH);
        assert!((10..=17).contains(&offset.len()), "offset table size");

        let mut header = (offset.len() - 10) as u32;
        if second.is_none() {
            header |= 0x08;
        }

        let mut writer = LsbBitWriter::new();
        writer.write_bits(header, 8);
        write_lengths(&mut writer, first);
        if let Some(second) = second {
            assert_eq!(second.len(), NUM_LITERAL_LENGTH);
            write_lengths(&mut writer, second);
        }
        write_lengths(&mut writer, offset);

        let first_code = PrefixCode::from_lengths(first);
        Self {
            writer,
            tables: CodeTables {
                second: second.map_or_else(|| first_code.clone(), PrefixCode::from_lengths),
                first: first_code,
                offset: PrefixCode::from_lengths(offset),
            },
            use_second: false,
        }
    }

    fn put_symbol(writer: &mut LsbBitWriter, code: &PrefixCode, symbol: u16) {
        let Some((bits, len)) = code.encoding(symbol) else {
            panic!("symbol {symbol} has no code");
        };
        for b in (0..len).rev() {
            writer.write_bits((bits >> b) & 1, 1);
        }
    }

    /// Append one token.
    pub fn token(&mut self, token: Token) {
        let current = if self.use_second {
            &self.tables.second
        } else {
            &self.tables.first
        };

        match token {
            Token::Literal(b) => {
                Self::put_symbol(&mut self.writer, current, b as u16);
                self.use_second = false;
            }
            Token::Match { length, distance } => {
                assert!((3..=32832).contains(&length), "match length {length}");
                assert!((1..=65536).contains(&distance), "match distance {distance}");

                if length <= 64 && current.encoding((length + 253) as u16).is_none() {
                    // Unreachable length symbol: copy in two steps at the same distance.
                    self.token(Token::Match {
                        length: 3,
                        distance,
                    });
                    self.token(Token::Match {
                        length: length - 3,
                        distance,
                    });
                    return;
                }

                if length <= 64 {
                    Self::put_symbol(&mut self.writer, current, (length + 253) as u16);
                } else if length - 65 < 1 << 10 {
                    Self::put_symbol(&mut self.writer, current, 318);
                    self.writer.write_bits((length - 65) as u32, 10);
                } else {
                    Self::put_symbol(&mut self.writer, current, 319);
                    self.writer.write_bits((length - 65) as u32, 15);
                }

                match distance {
                    1 => Self::put_symbol(&mut self.writer, &self.tables.offset, 0),
                    2 => Self::put_symbol(&mut self.writer, &self.tables.offset, 1),
                    d => {
                        let v = (d - 1) as u32;
                        let extra_bits = 31 - v.leading_zeros();
                        Self::put_symbol(
                            &mut self.writer,
                            &self.tables.offset,
                            (extra_bits + 1) as u16,
                        );
                        self.writer
                            .write_bits(v - (1 << extra_bits), extra_bits as u8);
                    }
                }
                self.use_second = true;
            }
            Token::End => Self::put_symbol(&mut self.writer, current, END_OF_STREAM),
        }
    }

    /// Append a literal token per byte.
    pub fn literals(&mut self, data: &[u8]) {
        for &b in data {
            self.token(Token::Literal(b));
        }
    }

    /// Return the stream bytes.
    pub fn finish(self) -> Vec<u8> {
        self.writer.finish()
    }
}

/// Write one meta symbol per length: `len - 1` for a code, 31 for none.
fn write_lengths(writer: &mut LsbBitWriter, lengths: &[i32]) {
    for &len in lengths {
        let sym = if len > 0 {
            assert!(len <= 31, "length {len} not expressible");
            (len - 1) as usize
        } else {
            31
        };
        writer.write_bits(META_CODES[sym], META_CODE_LENGTHS[sym]);
    }
}

/// Greedy tokenizer: longest earlier match of at least 3 bytes, else a literal.
///
/// Quadratic; meant for short test inputs.
pub fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let mut best = (0usize, 0usize);
        for start in pos.saturating_sub(65536)..pos {
            let mut len = 0;
            while pos + len < data.len() && len < 32832 && data[start + len] == data[pos + len] {
                len += 1;
            }
            if len > best.0 {
                best = (len, pos - start);
            }
        }

        if best.0 >= 3 {
            tokens.push(Token::Match {
                length: best.0,
                distance: best.1,
            });
            pos += best.0;
        } else {
            tokens.push(Token::Literal(data[pos]));
            pos += 1;
        }
    }

    tokens.push(Token::End);
    tokens
}
