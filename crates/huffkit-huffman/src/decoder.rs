//! Table-driven Huffman decoder.
//!
//! ## Lookup Table
//!
//! The table has `2^W` entries where `W` is the longest code (escape
//! included). A code of length `L` owns the `2^(W - L)` entries whose top
//! `L` bits equal the code, so one peek of `W` bits resolves any code:
//!
//! ```text
//! window = peek W bits (zero padded past the end)
//! entry  = table[window]
//! cursor += entry.length        (not W)
//! ```
//!
//! Entries not covered by any code have length 0 and mark a corrupt stream.

use huffkit_core::{BitReader, EncodedStream, Error, Listener, Registered, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::code::{Code, CodeTable};
use crate::config::CodecConfig;
use crate::symbol::{Symbol, Token};

/// Decode `stream.symbol_count` items, then require the recorded end.
pub fn decode_sequence<T, F>(stream: &EncodedStream, mut read_one: F) -> Result<Vec<T>>
where
    F: FnMut(&mut BitReader<'_>) -> Result<T>,
{
    let mut reader = stream.reader()?;
    // Every item takes at least one bit
    let capacity = stream.symbol_count.min(stream.bit_len) as usize;
    let mut items = Vec::with_capacity(capacity);

    for decoded in 0..stream.symbol_count {
        if reader.is_at_end() {
            return Err(Error::malformed(
                format!(
                    "stream ended after {decoded} of {} symbols",
                    stream.symbol_count
                ),
                reader.position(),
            ));
        }
        items.push(read_one(&mut reader)?);
    }

    if !reader.is_at_end() {
        return Err(Error::malformed(
            format!(
                "{} bits left after {} symbols",
                reader.remaining(),
                stream.symbol_count
            ),
            reader.position(),
        ));
    }
    Ok(items)
}

/// One lookup table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecodeEntry {
    /// Index of the decoded token.
    pub token: u32,
    /// Bits consumed by the code; 0 if no code matches.
    pub length: u8,
}

impl DecodeEntry {
    /// Check if a code matches this slot.
    #[inline]
    pub fn is_match(&self) -> bool {
        self.length > 0
    }
}

impl Registered for DecodeEntry {
    fn type_name() -> String {
        "DecodeEntry".into()
    }
}

/// Fixed-width lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeTable {
    width: u8,
    entries: Vec<DecodeEntry>,
}

impl DecodeTable {
    /// Build a table of `2^width` entries; `codes[i]` decodes to token `i`.
    ///
    /// Fails if a code is longer than the window or overlaps another code.
    pub fn build(codes: &[Code], width: u8) -> Result<Self> {
        let size = 1usize << width;
        let mut entries = vec![DecodeEntry::default(); size];

        for (token, code) in codes.iter().enumerate() {
            if code.length == 0 || code.length > width || (code.bits as u64) >> code.length != 0 {
                return Err(Error::invalid_config(format!(
                    "code of length {} does not fit a {width}-bit window",
                    code.length
                )));
            }
            let spare = width - code.length;
            let base = (code.bits as usize) << spare;
            for slot in &mut entries[base..base + (1usize << spare)] {
                if slot.is_match() {
                    return Err(Error::invalid_state("prefix-free code", "overlapping codes"));
                }
                *slot = DecodeEntry {
                    token: token as u32,
                    length: code.length,
                };
            }
        }

        Ok(Self { width, entries })
    }

    /// Entry for a `width`-bit window value.
    #[inline]
    pub fn lookup(&self, window: u32) -> DecodeEntry {
        self.entries
            .get(window as usize)
            .copied()
            .unwrap_or_default()
    }

    /// Window width in bits.
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table has no slots.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of slots covered by some code.
    pub fn matched(&self) -> usize {
        self.entries.iter().filter(|e| e.is_match()).count()
    }
}

impl Registered for DecodeTable {
    fn type_name() -> String {
        "DecodeTable".into()
    }
}

/// Decoder resolving each code with one table lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "S: Symbol")]
pub struct FastDecoder<S: Symbol> {
    tokens: Vec<Token<S>>,
    table: DecodeTable,
}

impl<S: Symbol> Registered for FastDecoder<S> {
    fn type_name() -> String {
        format!("FastDecoder<{}>", S::TYPE_NAME)
    }
}

impl<S: Symbol> FastDecoder<S> {
    /// Build the decoder for a code table.
    ///
    /// The window is the longest code. If that is wider than
    /// `config.decode_table_bits` the window is widened anyway and a warning
    /// goes to `listener`.
    pub fn new(
        codes: &CodeTable<S>,
        config: &CodecConfig,
        listener: &dyn Listener,
    ) -> Result<Self> {
        let width = codes.max_length();
        if width > config.decode_table_bits {
            listener.warning(&format!(
                "longest code is {width} bits, widening decode window from {}",
                config.decode_table_bits
            ));
        }

        let tokens: Vec<Token<S>> = codes.rows().iter().map(|r| r.token.clone()).collect();
        let code_list: Vec<Code> = codes.rows().iter().map(|r| r.code).collect();
        let table = DecodeTable::build(&code_list, width)?;

        debug!(
            tokens = tokens.len(),
            width,
            matched = table.matched(),
            "built fast decode table"
        );
        Ok(Self { tokens, table })
    }

    /// Read one code and return its token.
    #[inline]
    pub fn read_token(&self, reader: &mut BitReader<'_>) -> Result<&Token<S>> {
        let offset = reader.position();
        let entry = self.table.lookup(reader.peek_padded(self.table.width));
        if !entry.is_match() {
            return Err(Error::malformed("no code matches the input bits", offset));
        }
        if entry.length as u64 > reader.remaining() {
            return Err(Error::malformed("code runs past end of stream", offset));
        }
        reader.advance(entry.length)?;
        self.tokens
            .get(entry.token as usize)
            .ok_or_else(|| Error::malformed("decode entry names a missing token", offset))
    }

    /// Read one symbol, using `literal` after an escape code.
    #[inline]
    pub fn read_symbol<F>(&self, reader: &mut BitReader<'_>, literal: &mut F) -> Result<S>
    where
        F: FnMut(&mut BitReader<'_>) -> Result<S>,
    {
        match self.read_token(reader)? {
            Token::Symbol(symbol) => Ok(symbol.clone()),
            Token::Escape => literal(reader),
        }
    }

    /// Decode a stream whose escapes carry default literals.
    pub fn decode(&self, stream: &EncodedStream) -> Result<Vec<S>> {
        self.decode_with(stream, S::read_literal)
    }

    /// Decode a stream with a custom literal reader.
    pub fn decode_with<F>(&self, stream: &EncodedStream, mut literal: F) -> Result<Vec<S>>
    where
        F: FnMut(&mut BitReader<'_>) -> Result<S>,
    {
        decode_sequence(stream, |reader| self.read_symbol(reader, &mut literal))
    }

    /// The lookup table.
    pub fn table(&self) -> &DecodeTable {
        &self.table
    }

    /// Tokens by table index.
    pub fn tokens(&self) -> &[Token<S>] {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;
    use crate::frequency::FrequencyTable;
    use crate::tree::Tree;
    use huffkit_core::{BitWriter, CollectingListener};

    fn build(text: &str, config: CodecConfig) -> (CodeTable<char>, FastDecoder<char>) {
        let listener = CollectingListener::new();
        let freq: FrequencyTable<char> = text.chars().collect();
        let tree = Tree::build(&freq, &config, &listener).unwrap();
        let codes = CodeTable::from_tree(&tree);
        let decoder = FastDecoder::new(&codes, &config, &listener).unwrap();
        (codes, decoder)
    }

    #[test]
    fn test_table_covers_every_code() {
        let (codes, decoder) = build("abracadabra", CodecConfig::default());
        let width = decoder.table().width();
        assert_eq!(width, codes.max_length());
        assert_eq!(decoder.table().len(), 1 << width);
        // A full prefix code covers every slot
        assert_eq!(decoder.table().matched(), decoder.table().len());

        for (index, row) in codes.rows().iter().enumerate() {
            let spare = width - row.code.length;
            for low in 0..(1u32 << spare) {
                let entry = decoder.table().lookup((row.code.bits << spare) | low);
                assert_eq!(entry.token as usize, index);
                assert_eq!(entry.length, row.code.length);
            }
        }
    }

    #[test]
    fn test_roundtrip() {
        let (codes, decoder) = build("the rain in spain", CodecConfig::default());
        let input: Vec<char> = "rain in spain, then snow".chars().collect();
        let stream = Encoder::new(&codes).encode(&input).unwrap();
        assert_eq!(decoder.decode(&stream).unwrap(), input);
    }

    #[test]
    fn test_single_leaf_window() {
        let (codes, decoder) = build("aaaaa", CodecConfig::strict());
        assert_eq!(decoder.table().width(), 1);
        assert!(decoder.table().lookup(0).is_match());
        assert!(!decoder.table().lookup(1).is_match());

        let stream = Encoder::new(&codes).encode(&['a'; 3]).unwrap();
        assert_eq!(decoder.decode(&stream).unwrap(), vec!['a'; 3]);

        // A set bit can never come from this table
        let bad = EncodedStream::new(vec![0b0100_0000], 3, 3);
        assert!(matches!(
            decoder.decode(&bad),
            Err(Error::MalformedStream { bit_offset: 1, .. })
        ));
    }

    #[test]
    fn test_symbol_count_mismatch() {
        let (codes, decoder) = build("abcd", CodecConfig::strict());
        let mut stream = Encoder::new(&codes).encode(&['a', 'b', 'c']).unwrap();

        stream.symbol_count = 4;
        assert!(matches!(
            decoder.decode(&stream),
            Err(Error::MalformedStream { .. })
        ));

        stream.symbol_count = 2;
        assert!(matches!(
            decoder.decode(&stream),
            Err(Error::MalformedStream { .. })
        ));
    }

    #[test]
    fn test_truncated_code() {
        let mut freq = FrequencyTable::new();
        freq.train_count(&'a', 100);
        freq.train_count(&'b', 1);
        freq.train_count(&'c', 1);
        let listener = CollectingListener::new();
        let config = CodecConfig::strict();
        let tree = Tree::build(&freq, &config, &listener).unwrap();
        let codes = CodeTable::from_tree(&tree);
        let decoder = FastDecoder::new(&codes, &config, &listener).unwrap();

        // Cut the 2-bit code for 'c' down to its first bit
        let c = codes.code_of(&'c').unwrap();
        assert_eq!(c.length, 2);
        let mut writer = BitWriter::new();
        writer.write_bits(c.bits >> 1, 1);
        let (bytes, bits) = writer.finish();
        let stream = EncodedStream::new(bytes, bits, 1);

        assert!(matches!(
            decoder.decode(&stream),
            Err(Error::MalformedStream { bit_offset: 0, .. })
        ));
    }

    #[test]
    fn test_window_widened_with_warning() {
        let listener = CollectingListener::new();
        let config = CodecConfig::default().with_decode_table_bits(2);
        let freq: FrequencyTable<char> = "abcdefgh".chars().collect();
        let tree = Tree::build(&freq, &config, &listener).unwrap();
        let codes = CodeTable::from_tree(&tree);

        let decoder = FastDecoder::new(&codes, &config, &listener).unwrap();
        assert_eq!(decoder.table().width(), codes.max_length());
        assert!(decoder.table().width() > 2);
        assert_eq!(listener.len(), 1);
    }

    #[test]
    fn test_overlapping_codes_rejected() {
        let codes = [Code::new(0b0, 1), Code::new(0b01, 2)];
        assert!(matches!(
            DecodeTable::build(&codes, 2),
            Err(Error::InvalidState {
                expected: "prefix-free code",
                ..
            })
        ));
    }

    #[test]
    fn test_empty_stream() {
        let (_, decoder) = build("ab", CodecConfig::default());
        let stream = EncodedStream::default();
        assert!(decoder.decode(&stream).unwrap().is_empty());
    }
}
