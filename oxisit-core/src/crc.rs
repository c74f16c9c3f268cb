//! Checksums stored in StuffIt archives.
//!
//! Two reflected CRCs appear in the format:
//!
//! - [`Crc16`] (the ARC variant) guards the V1 archive header, every entry
//!   header and, for stored, LZW and method-13 forks, the uncompressed fork
//!   bytes. V5 entry headers are summed with their own CRC field zeroed.
//! - [`Crc32`] runs over the bytes an Arsenic stream produces, after run
//!   expansion. The stream carries the expected value as 32 binary symbols
//!   behind its last block.
//!
//! Arsenic forks store zero in the entry's CRC-16 field.

/// Byte-at-a-time table for a right-shifting CRC with polynomial `poly`.
const fn reflected_table(poly: u32) -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ poly } else { crc >> 1 };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

const CRC32_TABLE: [u32; 256] = reflected_table(0xEDB8_8320);

// A 16-bit polynomial never sets the upper half of the register.
const CRC16_TABLE: [u16; 256] = {
    let wide = reflected_table(0xA001);
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = wide[i] as u16;
        i += 1;
    }
    table
};

/// Running CRC-32 of Arsenic output.
///
/// Register starts at all ones and is complemented on the way out, so
/// [`value`](Self::value) can be compared with the stored trailer at any
/// point without consuming the calculator.
///
/// ```
/// use oxisit_core::crc::Crc32;
///
/// // A stream that decodes to the single byte 0x01.
/// assert_eq!(Crc32::compute(&[0x01]), 0xA505_DF1B);
/// ```
#[derive(Debug, Clone)]
pub struct Crc32 {
    register: u32,
}

impl Crc32 {
    const INIT: u32 = 0xFFFF_FFFF;

    /// Start a new checksum.
    pub fn new() -> Self {
        Self {
            register: Self::INIT,
        }
    }

    /// Forget everything fed so far.
    pub fn reset(&mut self) {
        self.register = Self::INIT;
    }

    /// Feed one decoded byte.
    #[inline(always)]
    pub fn update_byte(&mut self, byte: u8) {
        let index = (self.register as u8 ^ byte) as usize;
        self.register = CRC32_TABLE[index] ^ (self.register >> 8);
    }

    /// Feed a run of bytes.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        data.iter().for_each(|&b| self.update_byte(b));
    }

    /// Checksum of the bytes fed so far.
    #[inline(always)]
    pub fn value(&self) -> u32 {
        !self.register
    }

    /// Consume the calculator and return the checksum.
    pub fn finalize(self) -> u32 {
        self.value()
    }

    /// One-shot checksum of `data`.
    pub fn compute(data: &[u8]) -> u32 {
        let mut crc = Self::new();
        crc.update(data);
        crc.finalize()
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// CRC-16/ARC as used by StuffIt headers and forks.
///
/// Zero initial value and no final inversion, so an empty input sums to 0.
///
/// ```
/// use oxisit_core::crc::Crc16;
///
/// assert_eq!(Crc16::compute(b"123456789"), 0xBB3D);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Crc16 {
    register: u16,
}

impl Crc16 {
    /// Start a new checksum.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything fed so far.
    pub fn reset(&mut self) {
        self.register = 0;
    }

    /// Feed a run of bytes.
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            let index = (self.register as u8 ^ byte) as usize;
            self.register = CRC16_TABLE[index] ^ (self.register >> 8);
        }
    }

    /// Checksum of the bytes fed so far.
    pub fn value(&self) -> u16 {
        self.register
    }

    /// Consume the calculator and return the checksum.
    pub fn finalize(self) -> u16 {
        self.register
    }

    /// One-shot checksum of `data`.
    pub fn compute(data: &[u8]) -> u16 {
        let mut crc = Self::new();
        crc.update(data);
        crc.finalize()
    }
}
