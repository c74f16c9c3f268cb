//! Core decoding trait.
//!
//! Every StuffIt codec owns its compressed source and is pulled for output:
//! the caller hands it a buffer, the codec fills as much of it as it can.

use crate::config::ChecksumStatus;
use crate::error::Result;

/// A pull-based streaming decompressor.
///
/// Implemented by the stored, LZW, LZSS and Arsenic decoders. Output is
/// produced on demand, so a caller can stop after the declared fork length
/// without decoding further.
pub trait Decompressor {
    /// Fill `output` with decoded bytes.
    ///
    /// Returns the number of bytes written. `Ok(0)` with a non-empty buffer
    /// means the stream has ended. A short read does not imply end-of-stream.
    fn decompress(&mut self, output: &mut [u8]) -> Result<usize>;

    /// Check if the decompressor has reached the end of its stream.
    fn is_finished(&self) -> bool;

    /// Integrity status so far. Final once the stream has ended.
    fn checksum(&self) -> ChecksumStatus {
        ChecksumStatus::NotPresent
    }

    /// Called once the caller has taken all output it wants.
    ///
    /// Codecs with an in-stream terminator use this to consume it, so the
    /// stream's own checksum is compared even when the declared length was
    /// reached before the terminator was seen.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    /// Decompress until the stream ends or `limit` bytes are produced.
    fn decompress_all(&mut self, limit: usize) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut buffer = vec![0u8; 32768];

        while output.len() < limit {
            let want = buffer.len().min(limit - output.len());
            let produced = self.decompress(&mut buffer[..want])?;
            if produced == 0 {
                break;
            }
            output.extend_from_slice(&buffer[..produced]);
        }

        Ok(output)
    }
}

impl<D: Decompressor + ?Sized> Decompressor for Box<D> {
    fn decompress(&mut self, output: &mut [u8]) -> Result<usize> {
        (**self).decompress(output)
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }

    fn checksum(&self) -> ChecksumStatus {
        (**self).checksum()
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Emits a fixed byte pattern a few bytes at a time.
    struct Counter {
        next: u8,
        end: u8,
    }

    impl Decompressor for Counter {
        fn decompress(&mut self, output: &mut [u8]) -> Result<usize> {
            let mut n = 0;
            while n < output.len().min(3) && self.next < self.end {
                output[n] = self.next;
                self.next += 1;
                n += 1;
            }
            Ok(n)
        }

        fn is_finished(&self) -> bool {
            self.next == self.end
        }
    }

    #[test]
    fn test_decompress_all_until_end() {
        let mut d = Counter { next: 0, end: 10 };
        let out = d.decompress_all(usize::MAX).unwrap();
        assert_eq!(out, (0..10).collect::<Vec<u8>>());
        assert!(d.is_finished());
        assert_eq!(d.checksum(), ChecksumStatus::NotPresent);
    }

    #[test]
    fn test_decompress_all_respects_limit() {
        let mut d: Box<dyn Decompressor> = Box::new(Counter { next: 0, end: 10 });
        let out = d.decompress_all(4).unwrap();
        assert_eq!(out, vec![0, 1, 2, 3]);
        assert!(!d.is_finished());
        d.finish().unwrap();
    }
}
