//! Codec dispatch by method tag.
//!
//! The container layer locates a fork and hands its compressed bytes here
//! together with the method tag and the declared uncompressed length. This
//! module picks the codec, pulls exactly the declared length out of it and
//! runs the codec's trailing checks.

use oxisit_arsenic::ArsenicDecoder;
use oxisit_core::config::{ChecksumStatus, DecodeConfig};
use oxisit_core::entry::CompressionMethod;
use oxisit_core::error::{OxiSitError, Result};
use oxisit_core::traits::Decompressor;
use oxisit_lzss::Sit13Decoder;
use oxisit_lzw::LzwDecoder;
use std::io::{self, Read, Write};

/// Pass-through decoder for method 0.
#[derive(Debug)]
pub struct StoredDecoder<R: Read> {
    reader: R,
    finished: bool,
}

impl<R: Read> StoredDecoder<R> {
    /// Wrap a source.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            finished: false,
        }
    }
}

impl<R: Read> Decompressor for StoredDecoder<R> {
    fn decompress(&mut self, output: &mut [u8]) -> Result<usize> {
        if self.finished || output.is_empty() {
            return Ok(0);
        }
        let n = loop {
            match self.reader.read(output) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        if n == 0 {
            self.finished = true;
        }
        Ok(n)
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Outcome of decoding one fork.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeReport {
    /// Method the fork was decoded with.
    pub method: CompressionMethod,
    /// Bytes written to the output.
    pub written: u64,
    /// Integrity check result.
    pub checksum: ChecksumStatus,
}

impl DecodeReport {
    /// Report for a fork that produced nothing.
    pub fn empty(method: CompressionMethod) -> Self {
        Self {
            method,
            written: 0,
            checksum: ChecksumStatus::NotPresent,
        }
    }
}

/// Build the decoder for `method` over `source`.
///
/// Unsupported methods fail here, before any byte is read.
pub fn open_decoder<'a, R: Read + 'a>(
    source: R,
    method: CompressionMethod,
    config: &DecodeConfig,
) -> Result<Box<dyn Decompressor + 'a>> {
    let decoder: Box<dyn Decompressor + 'a> = match method {
        CompressionMethod::None => Box::new(StoredDecoder::new(source)),
        CompressionMethod::Lzw => Box::new(LzwDecoder::stuffit(source)?),
        CompressionMethod::Lzss => Box::new(Sit13Decoder::new(source)),
        CompressionMethod::Arsenic => {
            Box::new(ArsenicDecoder::with_checksum(source, config.checksum)?)
        }
        other => return Err(OxiSitError::unsupported_method(other.to_string())),
    };
    Ok(decoder)
}

fn check_request(method: CompressionMethod, declared_len: u64, config: &DecodeConfig) -> Result<()> {
    if !method.is_supported() {
        return Err(OxiSitError::unsupported_method(method.to_string()));
    }
    if let Some(limit) = config.max_output
        && declared_len > limit
    {
        return Err(OxiSitError::size_limit(declared_len, limit));
    }
    Ok(())
}

/// Pull-based reader yielding exactly the declared length of a fork.
///
/// A codec that ends early surfaces as an [`io::ErrorKind::UnexpectedEof`]
/// error wrapping [`OxiSitError::Truncated`]. Once the last byte has been
/// handed out the codec's `finish` hook runs, so trailing checksums are
/// compared before the reader reports end of data.
pub struct ForkReader<'a> {
    decoder: Option<Box<dyn Decompressor + 'a>>,
    produced: u64,
    expected: u64,
    finished: bool,
}

impl<'a> ForkReader<'a> {
    /// Open a reader over `source`.
    pub fn new<R: Read + 'a>(
        source: R,
        method: CompressionMethod,
        declared_len: u64,
        config: &DecodeConfig,
    ) -> Result<Self> {
        check_request(method, declared_len, config)?;
        let decoder = if declared_len == 0 {
            None
        } else {
            Some(open_decoder(source, method, config)?)
        };
        Ok(Self {
            decoder,
            produced: 0,
            expected: declared_len,
            finished: false,
        })
    }

    /// Bytes handed out so far.
    pub fn produced(&self) -> u64 {
        self.produced
    }

    /// Declared length.
    pub fn expected(&self) -> u64 {
        self.expected
    }

    /// Integrity status of the codec.
    pub fn checksum(&self) -> ChecksumStatus {
        self.decoder
            .as_ref()
            .map_or(ChecksumStatus::NotPresent, |d| d.checksum())
    }

    fn complete(&mut self) -> Result<()> {
        if !self.finished {
            self.finished = true;
            if let Some(decoder) = self.decoder.as_mut() {
                decoder.finish()?;
            }
        }
        Ok(())
    }
}

impl Read for ForkReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.expected - self.produced;
        if remaining == 0 {
            self.complete()?;
            return Ok(0);
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let want = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        let n = match self.decoder.as_mut() {
            Some(decoder) => decoder.decompress(&mut buf[..want])?,
            None => 0,
        };
        if n == 0 {
            return Err(OxiSitError::truncated(self.produced, self.expected).into());
        }

        self.produced += n as u64;
        if self.produced == self.expected {
            self.complete()?;
        }
        Ok(n)
    }
}

/// Decode one fork into `output`.
///
/// Writes exactly `declared_len` bytes or fails. Callers should discard
/// whatever was written when an error is returned.
pub fn decompress<R: Read, W: Write + ?Sized>(
    source: R,
    method: CompressionMethod,
    declared_len: u64,
    output: &mut W,
    config: &DecodeConfig,
) -> Result<DecodeReport> {
    check_request(method, declared_len, config)?;
    if declared_len == 0 {
        return Ok(DecodeReport::empty(method));
    }

    let mut decoder = open_decoder(source, method, config)?;
    let mut buffer = vec![0u8; 32768];
    let mut written = 0u64;

    while written < declared_len {
        let want = buffer
            .len()
            .min(usize::try_from(declared_len - written).unwrap_or(usize::MAX));
        let n = decoder.decompress(&mut buffer[..want])?;
        if n == 0 {
            log::debug!(
                "{} stream ended after {} of {} bytes",
                method.name(),
                written,
                declared_len
            );
            return Err(OxiSitError::truncated(written, declared_len));
        }
        output.write_all(&buffer[..n])?;
        written += n as u64;
    }

    decoder.finish()?;

    Ok(DecodeReport {
        method,
        written,
        checksum: decoder.checksum(),
    })
}

/// Decode one in-memory fork.
pub fn decompress_to_vec(
    data: &[u8],
    method: CompressionMethod,
    declared_len: u64,
    config: &DecodeConfig,
) -> Result<Vec<u8>> {
    let capacity = usize::try_from(declared_len).unwrap_or(0).min(1 << 24);
    let mut output = Vec::with_capacity(capacity);
    decompress(data, method, declared_len, &mut output, config)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxisit_core::config::ChecksumPolicy;

    const CONFIG: DecodeConfig = DecodeConfig::DEFAULT;

    #[test]
    fn test_stored_is_identity() {
        let data = b"plain bytes, nothing to see";
        let out = decompress_to_vec(data, CompressionMethod::None, data.len() as u64, &CONFIG).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_stored_short_source_is_truncated() {
        let err = decompress_to_vec(b"abc", CompressionMethod::None, 10, &CONFIG).unwrap_err();
        assert!(matches!(
            err,
            OxiSitError::Truncated {
                produced: 3,
                expected: 10
            }
        ));
        assert!(err.is_truncation());
    }

    #[test]
    fn test_unsupported_before_output() {
        let mut out = Vec::new();
        let err = decompress(
            &b"anything"[..],
            CompressionMethod::Deflate,
            8,
            &mut out,
            &CONFIG,
        )
        .unwrap_err();
        assert!(matches!(err, OxiSitError::UnsupportedMethod { .. }));
        assert!(out.is_empty());
        assert!(open_decoder(&b""[..], CompressionMethod::Unknown(9), &CONFIG).is_err());
    }

    #[test]
    fn test_size_limit() {
        let config = DecodeConfig::new().with_max_output(4);
        let err = decompress_to_vec(b"12345", CompressionMethod::None, 5, &config).unwrap_err();
        assert!(matches!(err, OxiSitError::SizeLimit { .. }));
        assert_eq!(
            decompress_to_vec(b"1234", CompressionMethod::None, 4, &config).unwrap(),
            b"1234"
        );
    }

    #[test]
    fn test_empty_fork_reads_nothing() {
        // An Arsenic decoder would reject an empty source; nothing is opened.
        let out = decompress_to_vec(&[], CompressionMethod::Arsenic, 0, &CONFIG).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_lzw_dispatch() {
        let original = b"TOBEORNOTTOBEORTOBEORNOT".repeat(4);
        let data = oxisit_lzw::fixture::encode(&original);
        let out =
            decompress_to_vec(&data, CompressionMethod::Lzw, original.len() as u64, &CONFIG).unwrap();
        assert_eq!(out, original);
    }

    #[test]
    fn test_lzw_declared_length_past_input() {
        let original = b"TOBEORNOTTOBEORTOBEORNOT".to_vec();
        let data = oxisit_lzw::fixture::encode(&original);
        let declared = original.len() as u64 + 10;
        let err = decompress_to_vec(&data, CompressionMethod::Lzw, declared, &CONFIG).unwrap_err();
        assert!(matches!(
            err,
            OxiSitError::Truncated { produced: 24, expected: 34 }
        ));
        assert!(err.is_truncation());
    }

    #[test]
    fn test_lzss_dispatch() {
        let original = b"abcabcabcabc the end of abc".to_vec();
        let mut writer = oxisit_lzss::fixture::Sit13Writer::built_in(2);
        for token in oxisit_lzss::fixture::tokenize(&original) {
            writer.token(token);
        }
        writer.token(oxisit_lzss::fixture::Token::End);
        let data = writer.finish();
        let out =
            decompress_to_vec(&data, CompressionMethod::Lzss, original.len() as u64, &CONFIG).unwrap();
        assert_eq!(out, original);
    }

    #[test]
    fn test_arsenic_dispatch_reports_crc() {
        let original = b"arsenic arsenic arsenic".to_vec();
        let data = oxisit_arsenic::fixture::compress(&original);
        let mut out = Vec::new();
        let report = decompress(
            &data[..],
            CompressionMethod::Arsenic,
            original.len() as u64,
            &mut out,
            &CONFIG,
        )
        .unwrap();
        assert_eq!(out, original);
        assert_eq!(report.written, original.len() as u64);
        assert_eq!(report.checksum, ChecksumStatus::Verified);
    }

    #[test]
    fn test_arsenic_bad_crc_policies() {
        let original = b"checksummed".to_vec();
        let data = oxisit_arsenic::fixture::ArsenicWriter::new(0)
            .with_crc(0x1234_5678)
            .compress(&original);
        let len = original.len() as u64;

        let mut out = Vec::new();
        let report = decompress(&data[..], CompressionMethod::Arsenic, len, &mut out, &CONFIG).unwrap();
        assert!(!report.checksum.is_ok());

        let strict = DecodeConfig::STRICT;
        let err = decompress_to_vec(&data, CompressionMethod::Arsenic, len, &strict).unwrap_err();
        assert!(matches!(err, OxiSitError::CrcMismatch { .. }));

        let lax = DecodeConfig::new().with_checksum(ChecksumPolicy::Ignore);
        let mut out = Vec::new();
        let report = decompress(&data[..], CompressionMethod::Arsenic, len, &mut out, &lax).unwrap();
        assert_eq!(report.checksum, ChecksumStatus::NotPresent);
        assert_eq!(out, original);
    }

    #[test]
    fn test_fork_reader_exact_length() {
        let original = b"0123456789".repeat(50);
        let data = oxisit_arsenic::fixture::compress(&original);
        let mut reader = ForkReader::new(&data[..], CompressionMethod::Arsenic, 120, &CONFIG).unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, &original[..120]);
        assert_eq!(reader.produced(), 120);
        // finish drained the stream, so the CRC was compared.
        assert_eq!(reader.checksum(), ChecksumStatus::Verified);
    }

    #[test]
    fn test_fork_reader_truncation() {
        let mut reader = ForkReader::new(&b"short"[..], CompressionMethod::None, 9, &CONFIG).unwrap();
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(reader.produced(), 5);
    }
}
