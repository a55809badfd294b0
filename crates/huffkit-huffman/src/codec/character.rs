//! Character codec.

use std::io::Read;
use std::sync::Arc;

use huffkit_core::{
    CodecKind, CodecStats, EncodedStream, Listener, Registered, Result, SymbolCodec,
};
use serde::{Deserialize, Serialize};

use super::HuffmanCodec;
use crate::config::CodecConfig;
use crate::frequency::FrequencyTable;

/// Huffman codec over Unicode scalar values.
///
/// Escaped characters are written as 21-bit code points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterCodec {
    codec: HuffmanCodec<char>,
}

impl CharacterCodec {
    /// Create a trainable character codec.
    pub fn trainable(config: CodecConfig) -> Self {
        Self {
            codec: HuffmanCodec::trainable(config),
        }
    }

    /// Create a static character codec from pre-trained counts.
    pub fn from_frequencies(
        frequencies: FrequencyTable<char>,
        config: CodecConfig,
    ) -> Result<Self> {
        Ok(Self {
            codec: HuffmanCodec::from_frequencies(frequencies, config)?,
        })
    }

    /// Report warnings to `listener`.
    pub fn with_listener(self, listener: Arc<dyn Listener>) -> Self {
        Self {
            codec: self.codec.with_listener(listener),
        }
    }

    /// Count every character of a text.
    pub fn train_str(&mut self, text: &str) -> Result<()> {
        self.codec.train_all(text.chars())
    }

    /// Count every character read from `reader`.
    pub fn train_reader<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut counts = FrequencyTable::new();
        counts.train_chars(reader)?;
        self.codec.merge(&counts)
    }

    /// Freeze training and build the tables.
    pub fn build(&mut self) -> Result<()> {
        self.codec.build()
    }

    /// Encode the characters of a text.
    pub fn encode_str(&self, text: &str) -> Result<EncodedStream> {
        let chars: Vec<char> = text.chars().collect();
        self.codec.encode(&chars)
    }

    /// Decode a stream into a text.
    pub fn decode_string(&self, stream: &EncodedStream) -> Result<String> {
        Ok(self.codec.decode(stream)?.into_iter().collect())
    }

    /// Encode characters and report what the encoding cost.
    pub fn encode_with_stats(&self, symbols: &[char]) -> Result<(EncodedStream, CodecStats)> {
        let (stream, stats) = self.codec.encode_with_stats(symbols)?;
        Ok((stream, stats.with_kind(CodecKind::Character)))
    }

    /// Underlying codec.
    pub fn inner(&self) -> &HuffmanCodec<char> {
        &self.codec
    }

    /// Mutable underlying codec.
    pub fn inner_mut(&mut self) -> &mut HuffmanCodec<char> {
        &mut self.codec
    }

    /// Unwrap the underlying codec.
    pub fn into_inner(self) -> HuffmanCodec<char> {
        self.codec
    }
}

impl From<HuffmanCodec<char>> for CharacterCodec {
    fn from(codec: HuffmanCodec<char>) -> Self {
        Self { codec }
    }
}

impl SymbolCodec for CharacterCodec {
    type Symbol = char;

    fn kind(&self) -> CodecKind {
        CodecKind::Character
    }

    fn train(&mut self, symbol: &char) -> Result<()> {
        self.codec.train(symbol)
    }

    fn encode(&self, symbols: &[char]) -> Result<EncodedStream> {
        self.codec.encode(symbols)
    }

    fn decode(&self, stream: &EncodedStream) -> Result<Vec<char>> {
        self.codec.decode(stream)
    }
}

impl Registered for CharacterCodec {
    fn type_name() -> String {
        "CharacterCodec".into()
    }
}
