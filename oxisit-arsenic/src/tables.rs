//! Constant tables for the Arsenic format.

/// Stream magic, each byte sent as an 8-symbol bit string.
pub const MAGIC: [u8; 2] = *b"As";

/// Block sizes are `1 << (exponent + MIN_BLOCK_BITS)`.
pub const MIN_BLOCK_BITS: u8 = 9;

/// Largest exponent a 4-bit field can carry.
pub const MAX_BLOCK_EXPONENT: u8 = 15;

/// Symbols of the selector model: 0/1 run digits, 2..=9 rank classes, 10 end of block.
pub const SELECTOR_SYMBOLS: u16 = 11;

/// Selector that terminates a block.
pub const END_OF_BLOCK: u16 = 10;

/// Rank band models as `(first, last, increment)`; all share a limit of 1024.
pub const RANK_BANDS: [(u16, u16, u32); 7] = [
    (2, 3, 8),
    (4, 7, 4),
    (8, 15, 4),
    (16, 31, 4),
    (32, 63, 2),
    (64, 127, 2),
    (128, 255, 1),
];

/// Frequency limit of the selector and rank models.
pub const ADAPTIVE_LIMIT: u32 = 1024;

/// Gaps between flipped positions in a randomized block.
///
/// The first flip happens at output position `RANDOMIZATION_TABLE[0]`; each
/// later one `RANDOMIZATION_TABLE[i]` positions after the previous, with the
/// index wrapping at 256.
pub const RANDOMIZATION_TABLE: [u16; 256] = [
    0x0ee, 0x056, 0x0f8, 0x0c3, 0x09d, 0x09f, 0x0ae, 0x02c, 0x0ad, 0x0cd, 0x024, 0x09d,
    0x0a6, 0x101, 0x018, 0x0b9, 0x0a1, 0x082, 0x075, 0x0e9, 0x09f, 0x055, 0x066, 0x06a,
    0x086, 0x071, 0x0dc, 0x084, 0x056, 0x096, 0x056, 0x0a1, 0x084, 0x078, 0x0b7, 0x032,
    0x06a, 0x003, 0x0e3, 0x002, 0x011, 0x101, 0x008, 0x044, 0x083, 0x100, 0x043, 0x0e3,
    0x01c, 0x0f0, 0x086, 0x06a, 0x06b, 0x00f, 0x003, 0x02d, 0x086, 0x017, 0x07b, 0x010,
    0x0f6, 0x080, 0x078, 0x07a, 0x0a1, 0x0e1, 0x0ef, 0x08c, 0x0f6, 0x087, 0x04b, 0x0a7,
    0x0e2, 0x077, 0x0fa, 0x0b8, 0x081, 0x0ee, 0x077, 0x0c0, 0x09d, 0x029, 0x020, 0x027,
    0x071, 0x012, 0x0e0, 0x06b, 0x0d1, 0x07c, 0x00a, 0x089, 0x07d, 0x087, 0x0c4, 0x101,
    0x0c1, 0x031, 0x0af, 0x038, 0x003, 0x068, 0x01b, 0x076, 0x079, 0x03f, 0x0db, 0x0c7,
    0x01b, 0x036, 0x07b, 0x0e2, 0x063, 0x081, 0x0ee, 0x00c, 0x063, 0x08b, 0x078, 0x038,
    0x097, 0x09b, 0x0d7, 0x08f, 0x0dd, 0x0f2, 0x0a3, 0x077, 0x08c, 0x0c3, 0x039, 0x020,
    0x0b3, 0x012, 0x011, 0x00e, 0x017, 0x042, 0x080, 0x02c, 0x0c4, 0x092, 0x059, 0x0c8,
    0x0db, 0x040, 0x076, 0x064, 0x0b4, 0x055, 0x01a, 0x09e, 0x0fe, 0x05f, 0x006, 0x03c,
    0x041, 0x0ef, 0x0d4, 0x0aa, 0x098, 0x029, 0x0cd, 0x01f, 0x002, 0x0a8, 0x087, 0x0d2,
    0x0a0, 0x093, 0x098, 0x0ef, 0x00c, 0x043, 0x0ed, 0x09d, 0x0c2, 0x0eb, 0x081, 0x0e9,
    0x064, 0x023, 0x068, 0x01e, 0x025, 0x057, 0x0de, 0x09a, 0x0cf, 0x07f, 0x0e5, 0x0ba,
    0x041, 0x0ea, 0x0ea, 0x036, 0x01a, 0x028, 0x079, 0x020, 0x05e, 0x018, 0x04e, 0x07c,
    0x08e, 0x058, 0x07a, 0x0ef, 0x091, 0x002, 0x093, 0x0bb, 0x056, 0x0a1, 0x049, 0x01b,
    0x079, 0x092, 0x0f3, 0x058, 0x04f, 0x052, 0x09c, 0x002, 0x077, 0x0af, 0x02a, 0x08f,
    0x049, 0x0d0, 0x099, 0x04d, 0x098, 0x101, 0x060, 0x093, 0x100, 0x075, 0x031, 0x0ce,
    0x049, 0x020, 0x056, 0x057, 0x0e2, 0x0f5, 0x026, 0x02b, 0x08a, 0x0bf, 0x0de, 0x0d0,
    0x083, 0x034, 0x0f4, 0x017,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_partition_ranks() {
        let mut next = 2;
        for &(first, last, _) in &RANK_BANDS {
            assert_eq!(first, next);
            assert_eq!(last, first * 2 - 1);
            next = last + 1;
        }
        assert_eq!(next, 256);
    }

    #[test]
    fn test_randomization_gaps_nonzero() {
        assert_eq!(RANDOMIZATION_TABLE[0], 0xee);
        assert!(RANDOMIZATION_TABLE.iter().all(|&gap| gap > 0));
    }
}
