//! Arithmetic encoder and Arsenic stream builder for tests.
//!
//! The encoder mirrors [`ArithmeticDecoder`](crate::ArithmeticDecoder): the
//! same interval arithmetic and renormalisation threshold, with pending bits
//! resolved when the interval leaves the middle half.

use crate::bwt::forward_transform;
use crate::coder::{CODER_BITS, CODER_HALF, CODER_ONE};
use crate::model::FrequencyModel;
use crate::tables::{END_OF_BLOCK, MAGIC, MAX_BLOCK_EXPONENT, MIN_BLOCK_BITS, RANDOMIZATION_TABLE};
use oxisit_core::crc::Crc32;

/// Arithmetic encoder writing bits MSB-first.
#[derive(Debug)]
pub struct ArithmeticEncoder {
    bytes: Vec<u8>,
    current: u8,
    used: u8,
    low: u32,
    range: u32,
    pending: u32,
}

impl ArithmeticEncoder {
    /// Create an encoder with the full initial interval.
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            current: 0,
            used: 0,
            low: 0,
            range: CODER_ONE,
            pending: 0,
        }
    }

    fn put_bit(&mut self, bit: bool) {
        self.current = (self.current << 1) | bit as u8;
        self.used += 1;
        if self.used == 8 {
            self.bytes.push(self.current);
            self.current = 0;
            self.used = 0;
        }
    }

    fn put_resolved(&mut self, bit: bool) {
        self.put_bit(bit);
        while self.pending > 0 {
            self.put_bit(!bit);
            self.pending -= 1;
        }
    }

    /// Encode `symbol` with `model` and update the model.
    pub fn encode(&mut self, model: &mut FrequencyModel, symbol: u16) {
        let total = model.total();
        let (low, size) = model.encode_symbol(symbol);

        let scale = self.range / total;
        let offset = scale * low;
        self.low += offset;
        if low + size == total {
            self.range -= offset;
        } else {
            self.range = size * scale;
        }

        while self.range <= CODER_HALF {
            if self.low >= CODER_ONE {
                self.put_resolved(true);
                self.low -= CODER_ONE;
            } else if self.low + self.range <= CODER_ONE {
                self.put_resolved(false);
            } else {
                self.pending += 1;
                self.low -= CODER_HALF;
            }
            self.range <<= 1;
            self.low <<= 1;
        }
    }

    /// Encode the low `count` bits of `value` as binary symbols, bit 0 first.
    pub fn encode_bits(&mut self, model: &mut FrequencyModel, value: u32, count: u8) {
        for i in 0..count {
            self.encode(model, ((value >> i) & 1) as u16);
        }
    }

    /// Flush the interval bottom and return the stream.
    pub fn finish(mut self) -> Vec<u8> {
        for i in (0..CODER_BITS).rev() {
            self.put_resolved((self.low >> i) & 1 != 0);
        }
        if self.used > 0 {
            self.bytes.push(self.current << (8 - self.used));
        }
        self.bytes
    }
}

impl Default for ArithmeticEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds complete Arsenic streams from plain data.
///
/// Data is run-length coded, split into blocks, block-sorted, move-to-front
/// coded and arithmetic coded exactly as the decoder expects.
#[derive(Debug, Clone)]
pub struct ArsenicWriter {
    exponent: u8,
    randomized: bool,
    crc: Option<u32>,
}

impl ArsenicWriter {
    /// Writer with blocks of `1 << (exponent + 9)` bytes.
    pub fn new(exponent: u8) -> Self {
        assert!(exponent <= MAX_BLOCK_EXPONENT, "exponent {exponent}");
        Self {
            exponent,
            randomized: false,
            crc: None,
        }
    }

    /// Mark every block as randomized.
    pub fn randomized(mut self, randomized: bool) -> Self {
        self.randomized = randomized;
        self
    }

    /// Store `crc` instead of the CRC-32 of the data.
    pub fn with_crc(mut self, crc: u32) -> Self {
        self.crc = Some(crc);
        self
    }

    /// Compress `data` into a stream.
    pub fn compress(&self, data: &[u8]) -> Vec<u8> {
        let block_bits = self.exponent + MIN_BLOCK_BITS;
        let blocks = split_blocks(data, 1 << block_bits);

        let mut encoder = ArithmeticEncoder::new();
        let mut initial = FrequencyModel::initial();
        let mut selector = FrequencyModel::selector();
        let mut bands = FrequencyModel::rank_bands();

        for &b in &MAGIC {
            encoder.encode_bits(&mut initial, b as u32, 8);
        }
        encoder.encode_bits(&mut initial, self.exponent as u32, 4);
        encoder.encode(&mut initial, blocks.is_empty() as u16);

        let count = blocks.len();
        for (i, mut block) in blocks.into_iter().enumerate() {
            if self.randomized {
                randomize(&mut block);
            }
            let (last_column, index) = forward_transform(&block);

            encoder.encode(&mut initial, self.randomized as u16);
            encoder.encode_bits(&mut initial, index as u32, block_bits);
            encode_ranks(&mut encoder, &mut selector, &mut bands, &mtf_ranks(&last_column));

            selector.reset();
            for band in &mut bands {
                band.reset();
            }

            let last = i + 1 == count;
            encoder.encode(&mut initial, last as u16);
            if last {
                let crc = self.crc.unwrap_or_else(|| Crc32::compute(data));
                encoder.encode_bits(&mut initial, crc, 32);
            }
        }

        encoder.finish()
    }
}

/// Compress `data` with 4 KiB blocks.
pub fn compress(data: &[u8]) -> Vec<u8> {
    ArsenicWriter::new(3).compress(data)
}

/// Run-length code `data` and cut it into blocks of at most `size` bytes.
///
/// A run of four equal bytes is followed by a count of further copies, so a
/// run is emitted as pieces of up to 4 + 255 bytes that never straddle blocks.
fn split_blocks(data: &[u8], size: usize) -> Vec<Vec<u8>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    let mut pos = 0;
    while pos < data.len() {
        let byte = data[pos];
        let run = data[pos..]
            .iter()
            .take(4 + 255)
            .take_while(|&&b| b == byte)
            .count();

        let mut piece = vec![byte; run.min(4)];
        if run >= 4 {
            piece.push((run - 4) as u8);
        }
        if current.len() + piece.len() > size {
            blocks.push(std::mem::take(&mut current));
        }
        current.extend_from_slice(&piece);
        pos += run;
    }

    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

/// Flip the low bit at the positions the decoder flips back.
fn randomize(block: &mut [u8]) {
    let mut index = 0;
    let mut position = RANDOMIZATION_TABLE[0] as usize;
    while position < block.len() {
        block[position] ^= 1;
        index = (index + 1) & 0xFF;
        position += RANDOMIZATION_TABLE[index] as usize;
    }
}

fn mtf_ranks(data: &[u8]) -> Vec<u8> {
    let mut list: Vec<u8> = (0..=255).collect();
    data.iter()
        .map(|&b| {
            let rank = list.iter().position(|&x| x == b).unwrap_or(0);
            list.remove(rank);
            list.insert(0, b);
            rank as u8
        })
        .collect()
}

fn encode_ranks(
    encoder: &mut ArithmeticEncoder,
    selector: &mut FrequencyModel,
    bands: &mut [FrequencyModel; 7],
    ranks: &[u8],
) {
    let mut i = 0;
    while i < ranks.len() {
        let rank = ranks[i];
        if rank == 0 {
            let run = ranks[i..].iter().take_while(|&&r| r == 0).count();
            // Bijective base 2: digit 0 is worth 1, digit 1 is worth 2.
            let mut remaining = run;
            while remaining > 0 {
                let digit = if remaining % 2 == 1 { 0 } else { 1 };
                encoder.encode(selector, digit);
                remaining = (remaining - 1 - digit as usize) / 2;
            }
            i += run;
            continue;
        }

        if rank == 1 {
            encoder.encode(selector, 2);
        } else {
            // Ranks [2^(k+1), 2^(k+2)) live in band k.
            let band = (u8::BITS - rank.leading_zeros() - 2) as usize;
            encoder.encode(selector, band as u16 + 3);
            encoder.encode(&mut bands[band], rank as u16);
        }
        i += 1;
    }
    encoder.encode(selector, END_OF_BLOCK);
}
