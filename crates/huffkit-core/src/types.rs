//! Core type definitions shared by the codecs.

use serde::{Deserialize, Serialize};

/// The codec families provided by huffkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodecKind {
    /// Single characters.
    Character,
    /// Whole strings, escaping through a character codec.
    String,
    /// Lists of strings.
    StringList,
}

impl CodecKind {
    /// Get codec kind name as string.
    pub fn name(self) -> &'static str {
        match self {
            CodecKind::Character => "character",
            CodecKind::String => "string",
            CodecKind::StringList => "string-list",
        }
    }
}

impl std::fmt::Display for CodecKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Ratio between the raw and encoded size of a symbol sequence, in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompressionRatio {
    /// Size of the raw symbols in bits.
    pub raw_bits: u64,
    /// Size of the encoded stream in bits.
    pub encoded_bits: u64,
}

impl CompressionRatio {
    /// Create new ratio from sizes.
    pub fn new(raw_bits: u64, encoded_bits: u64) -> Self {
        CompressionRatio {
            raw_bits,
            encoded_bits,
        }
    }

    /// Calculate ratio (raw / encoded).
    /// Higher is better.
    pub fn ratio(&self) -> f64 {
        if self.encoded_bits == 0 {
            return 0.0;
        }
        self.raw_bits as f64 / self.encoded_bits as f64
    }

    /// Calculate space savings as percentage (0-100).
    pub fn savings_percent(&self) -> f64 {
        if self.raw_bits == 0 {
            return 0.0;
        }
        (1.0 - (self.encoded_bits as f64 / self.raw_bits as f64)) * 100.0
    }

    /// Bits saved, negative when the encoding grew.
    pub fn bits_saved(&self) -> i64 {
        self.raw_bits as i64 - self.encoded_bits as i64
    }

    /// Check if the encoding saved space.
    pub fn is_effective(&self) -> bool {
        self.encoded_bits < self.raw_bits
    }
}
