//! Codec configuration.

use huffkit_core::{Error, Registered, Result};
use serde::{Deserialize, Serialize};

/// Default bound on code lengths.
pub const DEFAULT_MAX_CODE_LENGTH: u8 = 16;

/// Hard upper bound on code lengths.
pub const MAX_CODE_LENGTH_LIMIT: u8 = 24;

/// Default decode window width in bits.
pub const DEFAULT_DECODE_TABLE_BITS: u8 = 16;

/// Largest alphabet (escape included) that can be coded within the limit.
pub const MAX_ALPHABET_SIZE: usize = 1 << MAX_CODE_LENGTH_LIMIT;

/// Configuration for building one Huffman code table.
///
/// Persisted with the codec so a loaded codec rebuilds identical tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Longest code the tree builder may produce.
    pub max_code_length: u8,

    /// Preferred decode window width. The window widens to the longest code
    /// when that is larger, with a warning.
    pub decode_table_bits: u8,

    /// Reserve an escape code for symbols missing from the table.
    pub escapes: bool,

    /// Weight given to the escape leaf.
    pub escape_weight: u64,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_code_length: DEFAULT_MAX_CODE_LENGTH,
            decode_table_bits: DEFAULT_DECODE_TABLE_BITS,
            escapes: true,
            escape_weight: 1,
        }
    }
}

impl CodecConfig {
    /// Config that rejects unknown symbols instead of escaping them.
    pub fn strict() -> Self {
        Self {
            escapes: false,
            ..Default::default()
        }
    }

    /// Config with short codes and a small decode table.
    pub fn compact() -> Self {
        Self {
            max_code_length: 12,
            decode_table_bits: 12,
            ..Default::default()
        }
    }

    /// Set the code length bound.
    pub fn with_max_code_length(mut self, bits: u8) -> Self {
        self.max_code_length = bits;
        self
    }

    /// Set the preferred decode window width.
    pub fn with_decode_table_bits(mut self, bits: u8) -> Self {
        self.decode_table_bits = bits;
        self
    }

    /// Enable or disable the escape path.
    pub fn with_escapes(mut self, escapes: bool) -> Self {
        self.escapes = escapes;
        self
    }

    /// Set the escape leaf weight.
    pub fn with_escape_weight(mut self, weight: u64) -> Self {
        self.escape_weight = weight;
        self
    }

    /// Check that every field is in range.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_CODE_LENGTH_LIMIT).contains(&self.max_code_length) {
            return Err(Error::invalid_config(format!(
                "max_code_length must be between 1 and {MAX_CODE_LENGTH_LIMIT}, got {}",
                self.max_code_length
            )));
        }
        if !(1..=MAX_CODE_LENGTH_LIMIT).contains(&self.decode_table_bits) {
            return Err(Error::invalid_config(format!(
                "decode_table_bits must be between 1 and {MAX_CODE_LENGTH_LIMIT}, got {}",
                self.decode_table_bits
            )));
        }
        if self.escapes && self.escape_weight == 0 {
            return Err(Error::invalid_config(
                "escape_weight must be at least 1 when escapes are enabled",
            ));
        }
        Ok(())
    }
}

impl Registered for CodecConfig {
    fn type_name() -> String {
        "CodecConfig".into()
    }
}

/// Configuration for the string codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StringCodecConfig {
    /// Table of whole strings.
    pub strings: CodecConfig,

    /// Table of characters used to spell escaped strings.
    pub characters: CodecConfig,

    /// Strings seen fewer times than this get no code of their own.
    pub min_string_frequency: u64,
}

impl Default for StringCodecConfig {
    fn default() -> Self {
        Self {
            strings: CodecConfig::default(),
            characters: CodecConfig::default(),
            min_string_frequency: 1,
        }
    }
}

impl StringCodecConfig {
    /// Set the minimum frequency for a string to get its own code.
    pub fn with_min_string_frequency(mut self, min: u64) -> Self {
        self.min_string_frequency = min;
        self
    }

    /// Set the string table config.
    pub fn with_strings(mut self, config: CodecConfig) -> Self {
        self.strings = config;
        self
    }

    /// Set the character table config.
    pub fn with_characters(mut self, config: CodecConfig) -> Self {
        self.characters = config;
        self
    }

    /// Check both table configs and the frequency cutoff.
    pub fn validate(&self) -> Result<()> {
        self.strings.validate()?;
        self.characters.validate()?;
        if self.min_string_frequency == 0 {
            return Err(Error::invalid_config("min_string_frequency must be at least 1"));
        }
        if self.min_string_frequency > 1 && !self.strings.escapes {
            return Err(Error::invalid_config(
                "min_string_frequency above 1 needs escapes in the string table",
            ));
        }
        Ok(())
    }
}
