//! StuffIt method 13 decoder.
//!
//! The stream opens with one byte selecting the code tables, followed by
//! Huffman-coded tokens over a 64 KiB window. Literal/length symbols come
//! from the first table after a literal and from the second table after a
//! match.

use crate::prefix::PrefixCode;
use crate::tables::{
    END_OF_STREAM, FIRST_CODE_LENGTHS, META_CODE_LENGTHS, META_CODES, NUM_LITERAL_LENGTH,
    OFFSET_CODE_LENGTHS, OFFSET_CODE_SIZES, SECOND_CODE_LENGTHS,
};
use oxisit_core::bitstream::LsbBitReader;
use oxisit_core::error::{OxiSitError, Result};
use oxisit_core::ringbuffer::RingBuffer;
use oxisit_core::traits::Decompressor;
use std::io::Read;

/// Table selection read from the first stream byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMode {
    /// Code lengths transmitted in the stream.
    Dynamic {
        /// The second table reuses the first.
        shared: bool,
        /// Number of offset symbols.
        offset_symbols: usize,
    },
    /// One of the five built-in sets (1..=5).
    BuiltIn(u8),
}

impl TableMode {
    /// Decode the first stream byte.
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte >> 4 {
            0 => Ok(Self::Dynamic {
                shared: byte & 0x08 != 0,
                offset_symbols: (byte & 0x07) as usize + 10,
            }),
            set @ 1..=5 => Ok(Self::BuiltIn(set)),
            other => Err(OxiSitError::corrupted(
                0,
                format!("invalid method 13 table mode {}", other),
            )),
        }
    }
}

/// The three code tables of a stream.
#[derive(Debug, Clone)]
pub struct CodeTables {
    /// Literal/length code used after a literal.
    pub first: PrefixCode,
    /// Literal/length code used after a match.
    pub second: PrefixCode,
    /// Offset bit-length code.
    pub offset: PrefixCode,
}

impl CodeTables {
    /// Tables for a built-in set (1..=5).
    pub fn built_in(set: u8) -> Result<Self> {
        let idx = match set {
            1..=5 => (set - 1) as usize,
            _ => {
                return Err(OxiSitError::corrupted(
                    0,
                    format!("no built-in method 13 table set {}", set),
                ));
            }
        };
        Ok(Self {
            first: PrefixCode::from_lengths(FIRST_CODE_LENGTHS[idx]),
            second: PrefixCode::from_lengths(SECOND_CODE_LENGTHS[idx]),
            offset: PrefixCode::from_lengths(&OFFSET_CODE_LENGTHS[idx][..OFFSET_CODE_SIZES[idx]]),
        })
    }

    /// Read the tables selected by `mode` from the stream.
    pub fn read<R: Read>(mode: TableMode, reader: &mut LsbBitReader<R>) -> Result<Self> {
        match mode {
            TableMode::BuiltIn(set) => Self::built_in(set),
            TableMode::Dynamic {
                shared,
                offset_symbols,
            } => {
                let meta = PrefixCode::from_explicit_codes(&META_CODES, &META_CODE_LENGTHS);
                let first =
                    PrefixCode::from_lengths(&read_code_lengths(reader, &meta, NUM_LITERAL_LENGTH)?);
                let second = if shared {
                    first.clone()
                } else {
                    PrefixCode::from_lengths(&read_code_lengths(reader, &meta, NUM_LITERAL_LENGTH)?)
                };
                let offset =
                    PrefixCode::from_lengths(&read_code_lengths(reader, &meta, offset_symbols)?);
                Ok(Self {
                    first,
                    second,
                    offset,
                })
            }
        }
    }
}

/// Parse `count` code lengths written in the meta-code language.
pub(crate) fn read_code_lengths<R: Read>(
    reader: &mut LsbBitReader<R>,
    meta: &PrefixCode,
    count: usize,
) -> Result<Vec<i32>> {
    let mut lengths = vec![0i32; count];
    let mut length = 0i32;
    let mut i = 0;

    while i < count {
        let mut repeat = 0usize;
        match meta.decode(reader)? {
            31 => length = -1,
            32 => length += 1,
            33 => length -= 1,
            34 => repeat = reader.read_bit()? as usize,
            35 => repeat = reader.read_bits(3)? as usize + 2,
            36 => repeat = reader.read_bits(6)? as usize + 10,
            v => length = v as i32 + 1,
        }

        // Explicit repeats, then the one store every meta symbol makes.
        for _ in 0..=repeat {
            if i == count {
                break;
            }
            lengths[i] = length;
            i += 1;
        }
    }

    Ok(lengths)
}

/// A match still being copied out of the window.
#[derive(Debug, Clone, Copy)]
struct PendingMatch {
    distance: usize,
    remaining: usize,
}

/// Pull-based decoder for StuffIt method 13.
#[derive(Debug)]
pub struct Sit13Decoder<R: Read> {
    reader: LsbBitReader<R>,
    /// Parsed on the first call to `decompress`.
    tables: Option<CodeTables>,
    mode: Option<TableMode>,
    use_second: bool,
    window: RingBuffer,
    pending: Option<PendingMatch>,
    finished: bool,
}

impl<R: Read> Sit13Decoder<R> {
    /// Create a decoder. Nothing is read until output is requested.
    pub fn new(reader: R) -> Self {
        Self {
            reader: LsbBitReader::new(reader),
            tables: None,
            mode: None,
            use_second: false,
            window: RingBuffer::method13(),
            pending: None,
            finished: false,
        }
    }

    /// The table mode, once the header byte has been read.
    pub fn mode(&self) -> Option<TableMode> {
        self.mode
    }

    fn ensure_tables(&mut self) -> Result<()> {
        if self.tables.is_some() {
            return Ok(());
        }

        let byte = self.reader.read_bits(8)? as u8;
        let mode = TableMode::from_byte(byte)?;
        log::debug!("method 13 header {:#04x}: {:?}", byte, mode);

        self.tables = Some(CodeTables::read(mode, &mut self.reader)?);
        self.mode = Some(mode);
        Ok(())
    }

    /// Decode one token. Literals are written to `out`; matches become pending.
    fn next_token(&mut self, out: &mut u8) -> Result<bool> {
        let Some(tables) = self.tables.as_ref() else {
            return Err(OxiSitError::corrupted(0, "method 13 tables not initialised"));
        };
        let current = if self.use_second {
            &tables.second
        } else {
            &tables.first
        };

        let symbol = current.decode(&mut self.reader)?;
        match symbol {
            0..=255 => {
                self.use_second = false;
                *out = symbol as u8;
                self.window.write_byte(*out);
                Ok(true)
            }
            256..=319 => {
                self.use_second = true;
                let length = match symbol {
                    318 => self.reader.read_bits(10)? as usize + 65,
                    319 => self.reader.read_bits(15)? as usize + 65,
                    _ => symbol as usize - 253,
                };

                let distance = match tables.offset.decode(&mut self.reader)? {
                    0 => 1,
                    1 => 2,
                    s => {
                        let extra_bits = s as u8 - 1;
                        (1usize << extra_bits) + self.reader.read_bits(extra_bits)? as usize + 1
                    }
                };

                if distance > self.window.len() {
                    return Err(OxiSitError::invalid_distance(distance, self.window.len()));
                }

                self.pending = Some(PendingMatch {
                    distance,
                    remaining: length,
                });
                Ok(false)
            }
            END_OF_STREAM => {
                log::debug!("method 13 end marker at bit {}", self.reader.bit_position());
                self.finished = true;
                Ok(false)
            }
            other => Err(OxiSitError::corrupted(
                self.reader.bit_position(),
                format!("literal/length symbol {} out of range", other),
            )),
        }
    }
}

impl<R: Read> Decompressor for Sit13Decoder<R> {
    fn decompress(&mut self, output: &mut [u8]) -> Result<usize> {
        if output.is_empty() {
            return Ok(0);
        }
        self.ensure_tables()?;

        let mut written = 0;
        while written < output.len() {
            if let Some(pending) = self.pending.as_mut() {
                let n = pending.remaining.min(output.len() - written);
                for slot in &mut output[written..written + n] {
                    *slot = self.window.copy_byte(pending.distance)?;
                }
                written += n;
                pending.remaining -= n;
                if pending.remaining == 0 {
                    self.pending = None;
                }
                continue;
            }

            if self.finished {
                break;
            }

            let mut literal = 0u8;
            if self.next_token(&mut literal)? {
                output[written] = literal;
                written += 1;
            }
        }

        Ok(written)
    }

    fn is_finished(&self) -> bool {
        self.finished && self.pending.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{Sit13Writer, Token};
    use oxisit_core::bitstream::LsbBitWriter;
    use std::io::Cursor;

    #[test]
    fn test_table_mode_from_byte() {
        assert_eq!(
            TableMode::from_byte(0x0B).unwrap(),
            TableMode::Dynamic {
                shared: true,
                offset_symbols: 13
            }
        );
        assert_eq!(TableMode::from_byte(0x30).unwrap(), TableMode::BuiltIn(3));
        assert!(TableMode::from_byte(0x60).is_err());
        assert!(TableMode::from_byte(0xF0).is_err());
    }

    #[test]
    fn test_built_in_tables_cover_alphabets() {
        for set in 1..=5u8 {
            let tables = CodeTables::built_in(set).unwrap();
            assert_eq!(tables.first.len(), NUM_LITERAL_LENGTH);
            // Set 4's second table oversubscribes its code space by nine codes.
            let reachable = if set == 4 { NUM_LITERAL_LENGTH - 9 } else { NUM_LITERAL_LENGTH };
            assert_eq!(tables.second.len(), reachable);
            assert_eq!(tables.offset.len(), OFFSET_CODE_SIZES[set as usize - 1]);
        }
        assert!(CodeTables::built_in(0).is_err());
    }

    #[test]
    fn test_meta_length_language() {
        let meta = PrefixCode::from_explicit_codes(&META_CODES, &META_CODE_LENGTHS);
        let mut w = LsbBitWriter::new();
        let sym = |w: &mut LsbBitWriter, s: usize| w.write_bits(META_CODES[s], META_CODE_LENGTHS[s]);

        sym(&mut w, 4); // len 5
        sym(&mut w, 32); // len 6
        sym(&mut w, 33); // len 5
        sym(&mut w, 34);
        w.write_bits(1, 1); // one extra store
        sym(&mut w, 34);
        w.write_bits(0, 1);
        sym(&mut w, 35);
        w.write_bits(1, 3); // 3 extra stores
        sym(&mut w, 36);
        w.write_bits(0, 6); // 10 extra stores
        sym(&mut w, 31); // no code
        let data = w.finish();

        let mut expected = vec![5, 6, 5];
        expected.extend([5; 2]);
        expected.extend([5; 1]);
        expected.extend([5; 4]);
        expected.extend([5; 11]);
        expected.push(-1);

        let mut reader = LsbBitReader::new(Cursor::new(data));
        let lengths = read_code_lengths(&mut reader, &meta, expected.len()).unwrap();
        assert_eq!(lengths, expected);
    }

    #[test]
    fn test_meta_repeat_clamped_to_count() {
        let meta = PrefixCode::from_explicit_codes(&META_CODES, &META_CODE_LENGTHS);
        let mut w = LsbBitWriter::new();
        w.write_bits(META_CODES[2], META_CODE_LENGTHS[2]); // len 3
        w.write_bits(META_CODES[36], META_CODE_LENGTHS[36]);
        w.write_bits(63, 6);
        let mut reader = LsbBitReader::new(Cursor::new(w.finish()));
        let lengths = read_code_lengths(&mut reader, &meta, 12).unwrap();
        assert_eq!(lengths, vec![3; 12]);
    }

    #[test]
    fn test_decode_literals_and_match() {
        let mut writer = Sit13Writer::built_in(1);
        for &b in b"abc" {
            writer.token(Token::Literal(b));
        }
        writer.token(Token::Match {
            length: 7,
            distance: 3,
        });
        writer.token(Token::End);

        let mut decoder = Sit13Decoder::new(Cursor::new(writer.finish()));
        let out = decoder.decompress_all(usize::MAX).unwrap();
        assert_eq!(out, b"abcabcabca");
        assert!(decoder.is_finished());
        assert_eq!(decoder.mode(), Some(TableMode::BuiltIn(1)));
    }

    #[test]
    fn test_match_split_across_calls() {
        let mut writer = Sit13Writer::built_in(2);
        writer.token(Token::Literal(b'z'));
        writer.token(Token::Match {
            length: 200,
            distance: 1,
        });
        writer.token(Token::End);

        let mut decoder = Sit13Decoder::new(Cursor::new(writer.finish()));
        let mut buf = [0u8; 64];
        let mut total = 0;
        loop {
            let n = decoder.decompress(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            assert!(buf[..n].iter().all(|&b| b == b'z'));
            total += n;
        }
        assert_eq!(total, 201);
    }

    #[test]
    fn test_distance_beyond_history() {
        let mut writer = Sit13Writer::built_in(1);
        writer.token(Token::Literal(b'a'));
        writer.token(Token::Match {
            length: 3,
            distance: 5,
        });
        let mut decoder = Sit13Decoder::new(Cursor::new(writer.finish()));
        let err = decoder.decompress_all(100).unwrap_err();
        assert!(matches!(err, OxiSitError::InvalidDistance { distance: 5, .. }));
    }

    #[test]
    fn test_invalid_mode() {
        let mut decoder = Sit13Decoder::new(Cursor::new(vec![0x70u8, 0, 0]));
        let err = decoder.decompress_all(10).unwrap_err();
        assert!(matches!(err, OxiSitError::CorruptedData { .. }));
    }

    #[test]
    fn test_nothing_read_for_empty_request() {
        let mut decoder = Sit13Decoder::new(Cursor::new(Vec::<u8>::new()));
        assert_eq!(decoder.decompress(&mut []).unwrap(), 0);
        assert_eq!(decoder.mode(), None);
    }
}
