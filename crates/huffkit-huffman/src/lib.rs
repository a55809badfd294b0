//! Trainable Huffman Codecs
//!
//! Learns symbol frequencies from a corpus, builds length-limited Huffman
//! codes and encodes symbol sequences into packed bit streams that decode
//! with one table lookup per code.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Huffman Codec                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                               │
//! │  train*:  symbols ─> FrequencyTable                           │
//! │                                                               │
//! │  build:   FrequencyTable ─> Tree ─> CodeTable ─> FastDecoder  │
//! │           (+ escape leaf)   (length-limited)   (2^W entries)  │
//! │                                                               │
//! │  encode:  symbol ─> code bits        (unknown: escape+literal)│
//! │  decode:  W-bit window ─> (token, length) ─> advance          │
//! │                                                               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Codecs
//!
//! - [`CharacterCodec`]: `char` symbols, escapes carry 21-bit code points
//! - [`StringCodec`]: whole strings, escapes are spelled through a character
//!   table
//! - [`StringListCodec`]: lists of strings, each prefixed by its length
//! - [`CodecVariant`]: one of the above, chosen at runtime
//!
//! Persisted types are listed in [`huffman_registry`]; their identifiers
//! never change.
//!
//! # Example
//!
//! ```rust
//! use huffkit_huffman::{CharacterCodec, CodecConfig};
//!
//! let mut codec = CharacterCodec::trainable(CodecConfig::default());
//! codec.train_str("abracadabra")?;
//! codec.build()?;
//!
//! let stream = codec.encode_str("cadabra!")?;
//! assert_eq!(codec.decode_string(&stream)?, "cadabra!");
//! # Ok::<(), huffkit_core::Error>(())
//! ```

mod code;
mod codec;
mod config;
mod decoder;
mod encoder;
mod format;
mod frequency;
mod registration;
mod symbol;
mod tree;

pub use code::{Code, CodeTable, CodedSymbol};
pub use codec::{
    BuiltTables, CharacterCodec, CodecVariant, HuffmanCodec, Sequence, StringCodec,
    StringListCodec,
};
pub use config::{
    CodecConfig, StringCodecConfig, DEFAULT_DECODE_TABLE_BITS, DEFAULT_MAX_CODE_LENGTH,
    MAX_ALPHABET_SIZE, MAX_CODE_LENGTH_LIMIT,
};
pub use decoder::{decode_sequence, DecodeEntry, DecodeTable, FastDecoder};
pub use encoder::{encode_sequence, write_default_literal, Encoder};
pub use format::{BuildRecord, CodecFile, CodecHeader, PersistedCodec, CODEC_MAGIC, FORMAT_VERSION};
pub use frequency::FrequencyTable;
pub use registration::{
    huffman_registry, register_format, register_huffman, CODE_SERIALIZER, FORMAT_GROUP,
    HUFFMAN_GROUP,
};
pub use symbol::{Symbol, Token, CHAR_LITERAL_BITS};
pub use tree::{InternalNode, Leaf, Node, Tree};

/// File extension for persisted codecs
pub const CODEC_EXTENSION: &str = "huf";

/// Prelude for common imports
pub mod prelude {
    pub use super::{
        CharacterCodec, CodecConfig, CodecVariant, Sequence, StringCodec, StringCodecConfig,
        StringListCodec,
    };
    pub use huffkit_core::{Error, Result, SymbolCodec};
}
