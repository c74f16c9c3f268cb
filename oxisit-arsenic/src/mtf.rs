//! Move-to-front table for the Arsenic block decoder.

/// 256-entry move-to-front list.
#[derive(Debug, Clone)]
pub struct MtfTable {
    table: [u8; 256],
}

impl MtfTable {
    /// Create the identity list.
    pub fn new() -> Self {
        let mut table = [0u8; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = i as u8;
        }
        Self { table }
    }

    /// Restore the identity list.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Return the byte at `rank` and move it to the front.
    pub fn decode(&mut self, rank: u8) -> u8 {
        let rank = rank as usize;
        let value = self.table[rank];
        self.table.copy_within(0..rank, 1);
        self.table[0] = value;
        value
    }

    /// Current list order.
    pub fn as_slice(&self) -> &[u8] {
        &self.table
    }
}

impl Default for MtfTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_moves_to_front() {
        let mut mtf = MtfTable::new();
        assert_eq!(mtf.decode(3), 3);
        assert_eq!(&mtf.as_slice()[..5], &[3, 0, 1, 2, 4]);
        assert_eq!(mtf.decode(0), 3);
        assert_eq!(mtf.decode(1), 0);
        assert_eq!(&mtf.as_slice()[..5], &[0, 3, 1, 2, 4]);
    }

    #[test]
    fn test_last_rank() {
        let mut mtf = MtfTable::new();
        assert_eq!(mtf.decode(255), 255);
        assert_eq!(mtf.as_slice()[0], 255);
        assert_eq!(mtf.as_slice()[255], 254);
    }

    #[test]
    fn test_reset() {
        let mut mtf = MtfTable::new();
        mtf.decode(10);
        mtf.decode(200);
        mtf.reset();
        assert!(mtf.as_slice().iter().enumerate().all(|(i, &b)| i == b as usize));
    }
}
