//! Decoding configuration.
//!
//! Controls how integrity checks are treated and how much output a single
//! fork may claim before decoding is refused.

/// What to do when a stored checksum disagrees with the decoded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumPolicy {
    /// Skip checksum comparison entirely.
    Ignore,
    /// Compare, log a warning on mismatch and report it in the result.
    #[default]
    Report,
    /// Compare and fail decoding on mismatch.
    Enforce,
}

impl ChecksumPolicy {
    /// Whether checksums are compared at all.
    pub fn is_checked(&self) -> bool {
        !matches!(self, Self::Ignore)
    }
}

/// Outcome of the integrity check of a decoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumStatus {
    /// The stream carries no checksum, or it was not compared.
    #[default]
    NotPresent,
    /// The stored checksum matched.
    Verified,
    /// The stored checksum did not match.
    Mismatch {
        /// Checksum stored in the stream or header.
        expected: u32,
        /// Checksum computed over the decoded bytes.
        computed: u32,
    },
}

impl ChecksumStatus {
    /// Build a status from a stored and a computed value.
    pub fn compare(expected: u32, computed: u32) -> Self {
        if expected == computed {
            Self::Verified
        } else {
            Self::Mismatch { expected, computed }
        }
    }

    /// True unless a mismatch was detected.
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Mismatch { .. })
    }
}

impl std::fmt::Display for ChecksumStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotPresent => f.write_str("n/a"),
            Self::Verified => f.write_str("OK"),
            Self::Mismatch { expected, computed } => {
                write!(f, "mismatch ({:#x} != {:#x})", expected, computed)
            }
        }
    }
}

/// Options shared by every codec and the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Checksum handling.
    pub checksum: ChecksumPolicy,
    /// Refuse forks whose declared length exceeds this many bytes.
    pub max_output: Option<u64>,
}

impl DecodeConfig {
    /// Report mismatches, no size limit.
    pub const DEFAULT: Self = Self {
        checksum: ChecksumPolicy::Report,
        max_output: None,
    };

    /// Fail on any checksum mismatch.
    pub const STRICT: Self = Self {
        checksum: ChecksumPolicy::Enforce,
        max_output: None,
    };

    /// Create the default configuration.
    pub fn new() -> Self {
        Self::DEFAULT
    }

    /// Set the checksum policy.
    pub fn with_checksum(mut self, checksum: ChecksumPolicy) -> Self {
        self.checksum = checksum;
        self
    }

    /// Set the maximum declared output length.
    pub fn with_max_output(mut self, limit: u64) -> Self {
        self.max_output = Some(limit);
        self
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DecodeConfig::default();
        assert_eq!(config.checksum, ChecksumPolicy::Report);
        assert_eq!(config.max_output, None);
        assert!(config.checksum.is_checked());
        assert!(!ChecksumPolicy::Ignore.is_checked());
    }

    #[test]
    fn test_builders() {
        let config = DecodeConfig::new()
            .with_checksum(ChecksumPolicy::Enforce)
            .with_max_output(1024);
        assert_eq!(config.checksum, DecodeConfig::STRICT.checksum);
        assert_eq!(config.max_output, Some(1024));
    }

    #[test]
    fn test_checksum_status() {
        assert_eq!(ChecksumStatus::compare(5, 5), ChecksumStatus::Verified);
        let status = ChecksumStatus::compare(5, 6);
        assert!(!status.is_ok());
        assert!(ChecksumStatus::NotPresent.is_ok());
        assert_eq!(status.to_string(), "mismatch (0x5 != 0x6)");
    }
}
