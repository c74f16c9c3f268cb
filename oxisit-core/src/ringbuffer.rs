//! Ring buffer (sliding window) for LZSS decompression.
//!
//! Keeps the most recent `capacity` output bytes so back-references can be
//! resolved. StuffIt method 13 uses a 64 KiB window.

use crate::error::{OxiSitError, Result};

/// Window sizes used by the StuffIt codecs.
pub mod sizes {
    /// Window size for StuffIt method 13 (64 KB).
    pub const METHOD13: usize = 65536;
}

/// A ring buffer (circular buffer) for maintaining decompression history.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    /// The underlying buffer.
    buffer: Vec<u8>,
    /// Current write position (next byte will be written here).
    position: usize,
    /// Number of bytes written (up to capacity).
    size: usize,
    /// Mask for efficient modulo (capacity - 1).
    mask: usize,
}

impl RingBuffer {
    /// Create a new ring buffer.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is not a power of 2 or is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity.is_power_of_two(),
            "Capacity must be a power of 2, got {}",
            capacity
        );

        Self {
            buffer: vec![0; capacity],
            position: 0,
            size: 0,
            mask: capacity - 1,
        }
    }

    /// Create a window sized for StuffIt method 13.
    pub fn method13() -> Self {
        Self::new(sizes::METHOD13)
    }

    /// Get the capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Get the number of bytes of history currently held.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Write a single byte to the buffer.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buffer[self.position] = byte;
        self.position = (self.position + 1) & self.mask;
        if self.size < self.buffer.len() {
            self.size += 1;
        }
    }

    /// Read the byte `distance` positions back (1 = most recent).
    pub fn read_at_distance(&self, distance: usize) -> Result<u8> {
        if distance == 0 || distance > self.size {
            return Err(OxiSitError::invalid_distance(distance, self.size));
        }

        let index = self.position.wrapping_sub(distance) & self.mask;
        Ok(self.buffer[index])
    }

    /// Copy one byte from `distance` back to the head of the window.
    ///
    /// Calling this `length` times with the same distance reproduces an
    /// overlapping LZ77 match byte by byte.
    #[inline]
    pub fn copy_byte(&mut self, distance: usize) -> Result<u8> {
        let byte = self.read_at_distance(distance)?;
        self.write_byte(byte);
        Ok(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read() {
        let mut rb = RingBuffer::new(16);
        for &b in b"abc" {
            rb.write_byte(b);
        }
        assert_eq!(rb.len(), 3);
        assert_eq!(rb.read_at_distance(1).unwrap(), b'c');
        assert_eq!(rb.read_at_distance(3).unwrap(), b'a');
        assert!(rb.read_at_distance(4).is_err());
        assert!(rb.read_at_distance(0).is_err());
    }

    #[test]
    fn test_overlapping_copy() {
        let mut rb = RingBuffer::new(16);
        rb.write_byte(b'x');
        rb.write_byte(b'y');
        let copied: Vec<u8> = (0..5).map(|_| rb.copy_byte(2).unwrap()).collect();
        assert_eq!(copied, b"xyxyx");
    }

    #[test]
    fn test_wraparound() {
        let mut rb = RingBuffer::new(4);
        for b in 0..10u8 {
            rb.write_byte(b);
        }
        assert_eq!(rb.len(), 4);
        assert_eq!(rb.read_at_distance(1).unwrap(), 9);
        assert_eq!(rb.read_at_distance(4).unwrap(), 6);
        assert!(matches!(
            rb.read_at_distance(5),
            Err(OxiSitError::InvalidDistance { .. })
        ));
    }

    #[test]
    fn test_method13_capacity() {
        let rb = RingBuffer::method13();
        assert_eq!(rb.capacity(), 65536);
        assert!(rb.is_empty());
    }
}
