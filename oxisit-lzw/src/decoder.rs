//! LZW decoder (decompression).
//!
//! Pull-based: each call to [`Decompressor::decompress`] drains the sequence
//! left over from the previous call before reading more codes, so output can
//! stop at any byte boundary.
//!
//! StuffIt LZW has no usable end code. The stream ends where the caller's
//! declared length is reached or where the input runs out on byte padding.
//! Input that stops in the middle of a code is a truncation.

use crate::config::LzwConfig;
use crate::dictionary::LzwDictionary;
use crate::error::{LzwError, Result};
use oxisit_core::bitstream::LsbBitReader;
use oxisit_core::{Decompressor, OxiSitError};
use std::io::Read;

/// LZW decoder over a compressed byte source.
#[derive(Debug)]
pub struct LzwDecoder<R: Read> {
    reader: LsbBitReader<R>,
    dict: LzwDictionary,
    /// Previous code (for dictionary building).
    prev_code: Option<u16>,
    /// Sequence of the last code, partially emitted.
    pending: Vec<u8>,
    pending_pos: usize,
    /// Error hit after some output was already produced in the same call.
    deferred: Option<LzwError>,
    finished: bool,
}

impl<R: Read> LzwDecoder<R> {
    /// Create a decoder with the given configuration.
    pub fn new(reader: R, config: LzwConfig) -> Result<Self> {
        Ok(Self {
            reader: LsbBitReader::new(reader),
            dict: LzwDictionary::new(config)?,
            prev_code: None,
            pending: Vec::new(),
            pending_pos: 0,
            deferred: None,
            finished: false,
        })
    }

    /// Create a decoder for StuffIt method 2.
    pub fn stuffit(reader: R) -> Result<Self> {
        Self::new(reader, LzwConfig::STUFFIT)
    }

    /// Current table size.
    pub fn table_size(&self) -> u16 {
        self.dict.len()
    }

    /// Current code width.
    pub fn code_bits(&self) -> u8 {
        self.dict.current_bits()
    }

    /// Read one code and stage its sequence in `pending`.
    ///
    /// Returns false when the input ended cleanly before the next code.
    fn next_sequence(&mut self) -> Result<bool> {
        let code = match self.reader.read_bits(self.dict.current_bits()) {
            Ok(c) => c as u16,
            // Only byte padding left.
            Err(OxiSitError::UnexpectedEof { .. }) if self.reader.buffered_bits() < 8 => {
                return Ok(false);
            }
            Err(OxiSitError::UnexpectedEof { .. }) => {
                return Err(LzwError::UnexpectedEof {
                    position: self.reader.bit_position(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if !self.dict.contains(code) {
            return Err(LzwError::InvalidCode {
                code,
                table_size: self.dict.len(),
                position: self.reader.bit_position(),
            });
        }

        self.pending.clear();
        self.pending.extend_from_slice(self.dict.get(code)?);
        self.pending_pos = 0;

        if let Some(prev) = self.prev_code {
            self.dict.add(prev, self.pending[0])?;
        }
        self.prev_code = Some(code);

        Ok(true)
    }

    /// Fill `output`, returning LZW-specific errors.
    ///
    /// Bytes decoded before an error are returned first; the error follows
    /// on the next call.
    pub fn decode_into(&mut self, output: &mut [u8]) -> Result<usize> {
        if let Some(err) = self.deferred.take() {
            self.finished = true;
            return Err(err);
        }

        let mut written = 0;

        while written < output.len() {
            if self.pending_pos < self.pending.len() {
                let n = (self.pending.len() - self.pending_pos).min(output.len() - written);
                output[written..written + n]
                    .copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + n]);
                self.pending_pos += n;
                written += n;
                continue;
            }

            if self.finished {
                break;
            }

            match self.next_sequence() {
                Ok(true) => {}
                Ok(false) => {
                    log::debug!(
                        "LZW input ended at bit {} (table size {})",
                        self.reader.bit_position(),
                        self.dict.len()
                    );
                    self.finished = true;
                }
                Err(e) if written > 0 => {
                    self.deferred = Some(e);
                    break;
                }
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                }
            }
        }

        Ok(written)
    }
}

impl<R: Read> Decompressor for LzwDecoder<R> {
    fn decompress(&mut self, output: &mut [u8]) -> oxisit_core::Result<usize> {
        Ok(self.decode_into(output)?)
    }

    fn is_finished(&self) -> bool {
        self.finished && self.deferred.is_none() && self.pending_pos >= self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{LzwCodeWriter, encode};
    use std::io::Cursor;

    fn decode(data: &[u8], len: usize) -> Result<Vec<u8>> {
        let mut decoder = LzwDecoder::stuffit(Cursor::new(data))?;
        let mut out = vec![0u8; len];
        let mut pos = 0;
        while pos < len {
            let n = decoder.decode_into(&mut out[pos..])?;
            if n == 0 {
                break;
            }
            pos += n;
        }
        out.truncate(pos);
        Ok(out)
    }

    #[test]
    fn test_decode_literals() {
        let mut writer = LzwCodeWriter::new();
        for &b in b"HI!" {
            writer.write_code(b as u16);
        }
        let data = writer.finish();
        assert_eq!(decode(&data, 3).unwrap(), b"HI!");
    }

    #[test]
    fn test_decode_uses_new_entries() {
        // 'A' 'B' then code 256 ("AB") then 257 ("BA")
        let mut writer = LzwCodeWriter::new();
        for code in [65u16, 66, 256, 257] {
            writer.write_code(code);
        }
        let data = writer.finish();
        assert_eq!(decode(&data, 6).unwrap(), b"ABABBA");
    }

    #[test]
    fn test_decode_repeating_pattern() {
        let original = b"ABABABABABABABABAB";
        let data = encode(original);
        assert_eq!(decode(&data, original.len()).unwrap(), original);
    }

    #[test]
    fn test_code_not_yet_in_table_is_error() {
        // Second code references the entry that the decoder adds only after it.
        let mut writer = LzwCodeWriter::new();
        writer.write_code(65);
        writer.write_code(256);
        let data = writer.finish();
        let err = decode(&data, 10).unwrap_err();
        assert!(matches!(
            err,
            LzwError::InvalidCode {
                code: 256,
                table_size: 256,
                ..
            }
        ));
    }

    #[test]
    fn test_partial_reads_resume_sequence() {
        let original = b"abcabcabcabcabcabcabc".to_vec();
        let data = encode(&original);
        let mut decoder = LzwDecoder::stuffit(Cursor::new(data)).unwrap();
        let mut out = Vec::new();
        let mut buf = [0u8; 2];
        while out.len() < original.len() {
            let n = decoder.decode_into(&mut buf).unwrap();
            assert!(n > 0);
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, original);
    }

    #[test]
    fn test_oversized_buffer_ends_on_padding() {
        let original = b"abcabcabcabcabcabcabc".to_vec();
        let data = encode(&original);
        let mut decoder = LzwDecoder::stuffit(Cursor::new(data)).unwrap();
        let mut buf = [0u8; 64];
        let n = decoder.decode_into(&mut buf).unwrap();
        assert_eq!(&buf[..n], &original[..]);
        assert!(decoder.is_finished());
        assert_eq!(decoder.decode_into(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_code_cut_short_is_truncation() {
        // Nine 9-bit codes fill 81 bits; dropping the last byte leaves eight
        // bits of the final code, more than padding can account for.
        let mut writer = LzwCodeWriter::new();
        for &b in b"ABCDEFGHI" {
            writer.write_code(b as u16);
        }
        let mut data = writer.finish();
        assert_eq!(data.len(), 11);
        data.truncate(10);

        let mut decoder = LzwDecoder::stuffit(Cursor::new(data)).unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(decoder.decode_into(&mut buf).unwrap(), 8);
        assert_eq!(&buf[..8], b"ABCDEFGH");
        assert!(!decoder.is_finished());
        let err = decoder.decode_into(&mut buf).unwrap_err();
        assert!(matches!(err, LzwError::UnexpectedEof { position: 72 }));
    }

    #[test]
    fn test_invalid_code_after_output_is_deferred() {
        let mut writer = LzwCodeWriter::new();
        writer.write_code(b'x' as u16);
        writer.write_code(400);
        let data = writer.finish();

        let mut decoder = LzwDecoder::stuffit(Cursor::new(data)).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(decoder.decode_into(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], b'x');
        let err = decoder.decode_into(&mut buf).unwrap_err();
        assert!(matches!(err, LzwError::InvalidCode { code: 400, .. }));
    }

    #[test]
    fn test_decompress_all_with_larger_cap() {
        let original = b"abcabcabcabcabcabcabc".to_vec();
        let data = encode(&original);
        let mut decoder = LzwDecoder::stuffit(Cursor::new(data)).unwrap();
        assert_eq!(decoder.decompress_all(64).unwrap(), original);
        assert!(decoder.is_finished());
    }
}
