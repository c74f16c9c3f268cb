//! Stream builders for tests.
//!
//! [`LzwCodeWriter`] packs codes at the width the decoder will read them
//! with, and [`encode`] produces a compressed stream that only references
//! entries the decoder already holds.

use crate::config::LzwConfig;
use oxisit_core::bitstream::LsbBitWriter;
use std::collections::HashMap;

/// Packs codes LSB-first, tracking the decoder's table size and width.
#[derive(Debug)]
pub struct LzwCodeWriter {
    writer: LsbBitWriter,
    config: LzwConfig,
    table_size: u32,
    bits: u8,
    first: bool,
}

impl LzwCodeWriter {
    /// Create a writer for StuffIt method 2.
    pub fn new() -> Self {
        let config = LzwConfig::STUFFIT;
        Self {
            writer: LsbBitWriter::new(),
            config,
            table_size: config.literal_count() as u32,
            bits: config.min_bits,
            first: true,
        }
    }

    /// Width the next code will be written with.
    pub fn code_bits(&self) -> u8 {
        self.bits
    }

    /// Table size the decoder will have after reading the codes so far.
    pub fn table_size(&self) -> u32 {
        self.table_size
    }

    /// Append one code.
    pub fn write_code(&mut self, code: u16) {
        self.writer.write_bits(code as u32, self.bits);
        if self.first {
            self.first = false;
        } else if self.table_size < self.config.table_limit as u32 {
            self.table_size += 1;
            if self.table_size == 1 << self.bits && self.bits < self.config.max_bits {
                self.bits += 1;
            }
        }
    }

    /// Return the packed bytes.
    pub fn finish(self) -> Vec<u8> {
        self.writer.finish()
    }
}

impl Default for LzwCodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Greedy LZW encoder whose table mirrors the decoder's.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut codes: HashMap<Vec<u8>, u16> = (0..=255u8).map(|b| (vec![b], b as u16)).collect();
    let mut writer = LzwCodeWriter::new();
    let mut next_code: u16 = 256;
    let mut prev: Option<Vec<u8>> = None;
    let mut pos = 0;

    while pos < data.len() {
        let mut len = 1;
        while pos + len < data.len() && codes.contains_key(&data[pos..pos + len + 1]) {
            len += 1;
        }
        let seq = data[pos..pos + len].to_vec();
        writer.write_code(codes[&seq]);

        if let Some(mut entry) = prev.take()
            && (next_code as u32) < writer.config.table_limit as u32
        {
            entry.push(seq[0]);
            codes.entry(entry).or_insert(next_code);
            next_code += 1;
        }

        prev = Some(seq);
        pos += len;
    }

    writer.finish()
}
