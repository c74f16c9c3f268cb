//! Arsenic block decompressor.
//!
//! Stream layout, every field arithmetic-coded:
//!
//! ```text
//! 'A' 's'           two 8-bit strings, initial model
//! exponent          4-bit string, block size = 1 << (exponent + 9)
//! end flag          initial model symbol, non-zero = no blocks
//! block*:
//!   randomized      initial model symbol
//!   index           exponent + 9 bit string, inverse transform start
//!   selectors...    selector model, rank bands; 10 ends the block
//!   end flag        initial model symbol; non-zero is followed by the
//!                   32-bit CRC of the whole output and ends the stream
//! ```
//!
//! Output is produced lazily, one block in memory at a time.

use crate::bwt;
use crate::coder::ArithmeticDecoder;
use crate::model::FrequencyModel;
use crate::mtf::MtfTable;
use crate::tables::{END_OF_BLOCK, MAGIC, MIN_BLOCK_BITS, RANDOMIZATION_TABLE};
use oxisit_core::config::{ChecksumPolicy, ChecksumStatus};
use oxisit_core::crc::Crc32;
use oxisit_core::error::{OxiSitError, Result};
use oxisit_core::traits::Decompressor;
use std::io::Read;

/// Position within the current block's output.
#[derive(Debug, Default)]
struct OutputCursor {
    /// Row of the inverse transform.
    index: usize,
    /// Bytes taken from the block so far.
    byte_count: usize,
    randomized: bool,
    rand_index: usize,
    /// Next block position whose low bit is flipped.
    rand_count: usize,
    /// Length of the current run of equal bytes, up to 4.
    run_count: u8,
    last: u8,
    /// Copies of `last` still owed from a run-length byte.
    repeat: usize,
}

impl OutputCursor {
    fn start(index: usize, randomized: bool) -> Self {
        Self {
            index,
            randomized,
            rand_count: RANDOMIZATION_TABLE[0] as usize,
            ..Self::default()
        }
    }
}

/// Streaming Arsenic (method 15) decompressor.
#[derive(Debug)]
pub struct ArsenicDecoder<R: Read> {
    coder: ArithmeticDecoder<R>,
    initial: FrequencyModel,
    selector: FrequencyModel,
    bands: [FrequencyModel; 7],
    mtf: MtfTable,
    block_bits: u8,
    block: Vec<u8>,
    transform: Vec<u32>,
    cursor: OutputCursor,
    end_of_blocks: bool,
    blocks_read: u64,
    policy: ChecksumPolicy,
    crc: Crc32,
    stored_crc: Option<u32>,
    status: ChecksumStatus,
    finished: bool,
}

impl<R: Read> ArsenicDecoder<R> {
    /// Open a stream, reporting CRC mismatches without failing.
    pub fn new(reader: R) -> Result<Self> {
        Self::with_checksum(reader, ChecksumPolicy::default())
    }

    /// Open a stream with an explicit CRC policy.
    ///
    /// Reads and checks the magic and the block size.
    pub fn with_checksum(reader: R, policy: ChecksumPolicy) -> Result<Self> {
        let mut coder = ArithmeticDecoder::new(reader)?;
        let mut initial = FrequencyModel::initial();

        let magic = [
            coder.next_bit_string(&mut initial, 8)? as u8,
            coder.next_bit_string(&mut initial, 8)? as u8,
        ];
        if magic != MAGIC {
            return Err(OxiSitError::invalid_magic(MAGIC, magic));
        }

        let block_bits = coder.next_bit_string(&mut initial, 4)? as u8 + MIN_BLOCK_BITS;
        let end_of_blocks = coder.next_symbol(&mut initial)? != 0;
        log::debug!(
            "arsenic stream: {} byte blocks{}",
            1usize << block_bits,
            if end_of_blocks { ", empty" } else { "" }
        );

        Ok(Self {
            coder,
            initial,
            selector: FrequencyModel::selector(),
            bands: FrequencyModel::rank_bands(),
            mtf: MtfTable::new(),
            block_bits,
            block: Vec::new(),
            transform: Vec::new(),
            cursor: OutputCursor::default(),
            end_of_blocks,
            blocks_read: 0,
            policy,
            crc: Crc32::new(),
            stored_crc: None,
            status: ChecksumStatus::NotPresent,
            finished: false,
        })
    }

    /// Log2 of the block capacity.
    pub fn block_bits(&self) -> u8 {
        self.block_bits
    }

    /// Block capacity in bytes.
    pub fn block_size(&self) -> usize {
        1 << self.block_bits
    }

    /// Number of blocks decoded so far.
    pub fn blocks_read(&self) -> u64 {
        self.blocks_read
    }

    /// CRC-32 carried by the stream, once its end marker has been read.
    pub fn stored_crc(&self) -> Option<u32> {
        self.stored_crc
    }

    fn push(&mut self, value: u8) -> Result<()> {
        if self.block.len() >= self.block_size() {
            return Err(OxiSitError::block_overflow(self.block_size()));
        }
        self.block.push(value);
        Ok(())
    }

    fn read_block(&mut self) -> Result<()> {
        let capacity = self.block_size();
        self.mtf.reset();
        self.block.clear();

        let randomized = self.coder.next_symbol(&mut self.initial)? != 0;
        let index = self
            .coder
            .next_bit_string(&mut self.initial, self.block_bits)? as usize;

        loop {
            let mut selector = self.coder.next_symbol(&mut self.selector)?;

            if selector < 2 {
                // Bijective base-2 run of the front byte.
                let mut state = 1usize;
                let mut run = 0usize;
                while selector < 2 {
                    run += if selector == 0 { state } else { 2 * state };
                    if self.block.len() + run > capacity {
                        return Err(OxiSitError::block_overflow(capacity));
                    }
                    state <<= 1;
                    selector = self.coder.next_symbol(&mut self.selector)?;
                }
                let value = self.mtf.decode(0);
                self.block.resize(self.block.len() + run, value);
            }

            let rank = match selector {
                END_OF_BLOCK => break,
                2 => 1,
                band => {
                    let model = &mut self.bands[(band - 3) as usize];
                    self.coder.next_symbol(model)?
                }
            };
            let value = self.mtf.decode(rank as u8);
            self.push(value)?;
        }

        if index >= self.block.len() {
            return Err(OxiSitError::invalid_transform_index(index, self.block.len()));
        }

        self.selector.reset();
        for band in &mut self.bands {
            band.reset();
        }

        if self.coder.next_symbol(&mut self.initial)? != 0 {
            self.stored_crc = Some(self.coder.next_bit_string(&mut self.initial, 32)?);
            self.end_of_blocks = true;
        }

        bwt::inverse_table_into(&self.block, &mut self.transform);
        self.cursor = OutputCursor::start(index, randomized);
        self.blocks_read += 1;

        log::trace!(
            "arsenic block {}: {} bytes, index {}, randomized {}",
            self.blocks_read,
            self.block.len(),
            index,
            randomized
        );
        Ok(())
    }

    /// Produce the next output byte, reading blocks as needed.
    fn next_byte(&mut self) -> Result<Option<u8>> {
        loop {
            let cursor = &mut self.cursor;
            if cursor.repeat > 0 {
                cursor.repeat -= 1;
                return Ok(Some(cursor.last));
            }

            if cursor.byte_count < self.block.len() {
                cursor.index = self.transform[cursor.index] as usize;
                let mut b = self.block[cursor.index];

                if cursor.randomized && cursor.rand_count == cursor.byte_count {
                    b ^= 1;
                    cursor.rand_index = (cursor.rand_index + 1) & 0xFF;
                    cursor.rand_count += RANDOMIZATION_TABLE[cursor.rand_index] as usize;
                }
                cursor.byte_count += 1;

                if cursor.run_count == 4 {
                    // Fifth position after a run of four carries a repeat count.
                    cursor.run_count = 0;
                    if b == 0 {
                        continue;
                    }
                    cursor.repeat = b as usize - 1;
                    return Ok(Some(cursor.last));
                }

                if b == cursor.last {
                    cursor.run_count += 1;
                } else {
                    cursor.run_count = 1;
                    cursor.last = b;
                }
                return Ok(Some(b));
            }

            if self.end_of_blocks {
                return Ok(None);
            }
            self.read_block()?;
        }
    }

    /// Settle the CRC once the last byte has been produced.
    fn end_stream(&mut self) -> Result<()> {
        self.finished = true;

        let Some(expected) = self.stored_crc else {
            return Ok(());
        };
        if !self.policy.is_checked() {
            return Ok(());
        }

        let computed = self.crc.value();
        self.status = ChecksumStatus::compare(expected, computed);
        if let ChecksumStatus::Mismatch { expected, computed } = self.status {
            if self.policy == ChecksumPolicy::Enforce {
                return Err(OxiSitError::crc_mismatch(expected, computed));
            }
            log::warn!(
                "arsenic CRC mismatch: stored {:#010x}, computed {:#010x}",
                expected,
                computed
            );
        }
        Ok(())
    }
}

impl<R: Read> Decompressor for ArsenicDecoder<R> {
    fn decompress(&mut self, output: &mut [u8]) -> Result<usize> {
        if self.finished {
            return Ok(0);
        }

        let mut written = 0;
        while written < output.len() {
            match self.next_byte()? {
                Some(b) => {
                    output[written] = b;
                    self.crc.update_byte(b);
                    written += 1;
                }
                None => {
                    self.end_stream()?;
                    break;
                }
            }
        }
        Ok(written)
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn checksum(&self) -> ChecksumStatus {
        self.status
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        // Read on to the end marker so the stored CRC gets compared.
        while let Some(b) = self.next_byte()? {
            self.crc.update_byte(b);
        }
        self.end_stream()
    }
}
