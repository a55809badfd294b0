//! String codec.
//!
//! Whole strings get codes from one table. A string without a code is
//! written as the escape code, its character count as a varint, then each
//! character through a second, character-level table (which has its own
//! escape for characters never seen in training). When training saw only
//! empty strings the character table is never built and escaped strings
//! fall back to their raw UTF-8 literal.

use std::sync::Arc;

use huffkit_core::{
    BitReader, BitWriter, CodecKind, CodecStats, EncodedStream, Error, Listener, Registered,
    Result, SymbolCodec, TracingListener,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::HuffmanCodec;
use crate::config::StringCodecConfig;
use crate::encoder::{Encoder, write_default_literal};
use crate::frequency::FrequencyTable;
use crate::symbol::Symbol;

/// Huffman codec over whole strings with a character fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StringCodec {
    min_string_frequency: u64,
    strings: HuffmanCodec<String>,
    characters: HuffmanCodec<char>,
}

impl StringCodec {
    /// Create a trainable string codec.
    pub fn trainable(config: StringCodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            min_string_frequency: config.min_string_frequency,
            strings: HuffmanCodec::trainable(config.strings),
            characters: HuffmanCodec::trainable(config.characters),
        })
    }

    /// Create a static string codec from pre-trained counts.
    ///
    /// An empty character table is allowed; escaped strings then use their
    /// raw literal.
    pub fn from_frequencies(
        strings: FrequencyTable<String>,
        characters: FrequencyTable<char>,
        config: StringCodecConfig,
    ) -> Result<Self> {
        config.validate()?;
        let listener: Arc<dyn Listener> = Arc::new(TracingListener);
        let strings = Self::filter(strings, config.min_string_frequency, listener.as_ref());
        let strings = HuffmanCodec::from_frequencies_with_listener(
            strings,
            config.strings,
            Arc::clone(&listener),
        )?;
        let characters = if characters.is_empty() {
            HuffmanCodec::trainable(config.characters)
        } else {
            HuffmanCodec::from_frequencies_with_listener(characters, config.characters, listener)?
        };
        Ok(Self {
            min_string_frequency: config.min_string_frequency,
            strings,
            characters,
        })
    }

    /// Report warnings from both tables to `listener`.
    pub fn with_listener(self, listener: Arc<dyn Listener>) -> Self {
        Self {
            min_string_frequency: self.min_string_frequency,
            strings: self.strings.with_listener(Arc::clone(&listener)),
            characters: self.characters.with_listener(listener),
        }
    }

    fn filter(
        strings: FrequencyTable<String>,
        min: u64,
        listener: &dyn Listener,
    ) -> FrequencyTable<String> {
        if min <= 1 {
            return strings;
        }
        let kept = strings.retain_at_least(min);
        if kept.is_empty() {
            listener.warning(&format!(
                "no string reached frequency {min}, keeping all {} strings",
                strings.len()
            ));
            return strings;
        }
        debug!(
            kept = kept.len(),
            dropped = strings.len() - kept.len(),
            min,
            "filtered rare strings"
        );
        kept
    }

    /// Count every string of a sequence.
    pub fn train_strs<'a, I>(&mut self, strings: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for s in strings {
            self.train_one(s)?;
        }
        Ok(())
    }

    fn train_one(&mut self, s: &str) -> Result<()> {
        self.strings.train(&s.to_owned())?;
        self.characters.train_all(s.chars())
    }

    /// Freeze training and build both tables.
    ///
    /// Strings seen fewer than `min_string_frequency` times lose their own
    /// code. If that would drop every string, all are kept and the listener
    /// is warned.
    pub fn build(&mut self) -> Result<()> {
        if self.strings.is_built() {
            return Err(Error::invalid_state("training", "built"));
        }
        let min = self.min_string_frequency;
        let listener = Arc::clone(self.strings.listener());
        let trained = self.strings.frequencies().len();
        let kept = Self::filter(self.strings.frequencies().clone(), min, listener.as_ref());
        if kept.len() < trained {
            self.strings.retain_at_least(min)?;
        }

        self.strings.build()?;
        if !self.characters.frequencies().is_empty() {
            self.characters.build()?;
        }
        Ok(())
    }

    /// Check if the string table is built.
    pub fn is_built(&self) -> bool {
        self.strings.is_built()
    }

    /// Minimum frequency for a string to keep its own code.
    pub fn min_string_frequency(&self) -> u64 {
        self.min_string_frequency
    }

    /// String table codec.
    pub fn strings(&self) -> &HuffmanCodec<String> {
        &self.strings
    }

    /// Character table codec.
    pub fn characters(&self) -> &HuffmanCodec<char> {
        &self.characters
    }

    fn write_escaped(&self, s: &String, writer: &mut BitWriter) -> Result<()> {
        if !self.characters.is_built() {
            return write_default_literal(s, writer);
        }
        let encoder = self.characters.encoder()?;
        writer.write_varint(s.chars().count() as u64);
        for c in s.chars() {
            encoder.write_symbol(&c, writer, &mut write_default_literal)?;
        }
        Ok(())
    }

    fn read_escaped(&self, reader: &mut BitReader<'_>) -> Result<String> {
        if !self.characters.is_built() {
            return String::read_literal(reader);
        }
        let offset = reader.position();
        let count = reader.read_varint()?;
        // Every character takes at least one bit
        if count > reader.remaining() {
            return Err(Error::malformed(
                format!("escaped string claims {count} characters"),
                offset,
            ));
        }
        let decoder = self.characters.decoder()?;
        let mut s = String::with_capacity(count as usize);
        for _ in 0..count {
            s.push(decoder.read_symbol(reader, &mut char::read_literal)?);
        }
        Ok(s)
    }

    /// Write one string; returns `true` if it was escaped.
    pub fn write_string(&self, s: &String, writer: &mut BitWriter) -> Result<bool> {
        self.strings
            .encoder()?
            .write_symbol(s, writer, &mut |s, w| self.write_escaped(s, w))
    }

    /// Read one string written by [`StringCodec::write_string`].
    pub fn read_string(&self, reader: &mut BitReader<'_>) -> Result<String> {
        self.strings
            .decoder()?
            .read_symbol(reader, &mut |r| self.read_escaped(r))
    }

    /// Encode strings and report what the encoding cost.
    pub fn encode_with_stats(&self, symbols: &[String]) -> Result<(EncodedStream, CodecStats)> {
        let encoder: Encoder<'_, String> = self.strings.encoder()?;
        let (stream, stats) =
            encoder.encode_with_stats(symbols, |s, w| self.write_escaped(s, w))?;
        Ok((stream, stats.with_kind(CodecKind::String)))
    }
}

impl SymbolCodec for StringCodec {
    type Symbol = String;

    fn kind(&self) -> CodecKind {
        CodecKind::String
    }

    fn train(&mut self, symbol: &String) -> Result<()> {
        self.train_one(symbol)
    }

    fn encode(&self, symbols: &[String]) -> Result<EncodedStream> {
        self.strings
            .encoder()?
            .encode_with(symbols, |s, w| self.write_escaped(s, w))
    }

    fn decode(&self, stream: &EncodedStream) -> Result<Vec<String>> {
        self.strings
            .decoder()?
            .decode_with(stream, |r| self.read_escaped(r))
    }
}

impl Registered for StringCodec {
    fn type_name() -> String {
        "StringCodec".into()
    }
}
