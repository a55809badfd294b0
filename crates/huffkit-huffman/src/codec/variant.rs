//! Runtime choice between the codec kinds.

use huffkit_core::{CodecKind, EncodedStream, Error, Registered, Result, SymbolCodec};
use serde::{Deserialize, Serialize};

use super::{CharacterCodec, StringCodec, StringListCodec};
use crate::config::{CodecConfig, StringCodecConfig};

/// A symbol sequence of one of the codec kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sequence {
    Characters(Vec<char>),
    Strings(Vec<String>),
    StringLists(Vec<Vec<String>>),
}

impl Sequence {
    /// Codec kind that handles this sequence.
    pub fn kind(&self) -> CodecKind {
        match self {
            Sequence::Characters(_) => CodecKind::Character,
            Sequence::Strings(_) => CodecKind::String,
            Sequence::StringLists(_) => CodecKind::StringList,
        }
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        match self {
            Sequence::Characters(v) => v.len(),
            Sequence::Strings(v) => v.len(),
            Sequence::StringLists(v) => v.len(),
        }
    }

    /// Check if the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for Sequence {
    fn from(text: &str) -> Self {
        Sequence::Characters(text.chars().collect())
    }
}

/// One of the codec kinds, chosen at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CodecVariant {
    Character(CharacterCodec),
    String(StringCodec),
    StringList(StringListCodec),
}

impl CodecVariant {
    /// Create a trainable codec of the given kind.
    ///
    /// Character codecs use `config.characters`.
    pub fn trainable(kind: CodecKind, config: StringCodecConfig) -> Result<Self> {
        Ok(match kind {
            CodecKind::Character => {
                config.characters.validate()?;
                CodecVariant::Character(CharacterCodec::trainable(config.characters))
            }
            CodecKind::String => CodecVariant::String(StringCodec::trainable(config)?),
            CodecKind::StringList => {
                CodecVariant::StringList(StringListCodec::trainable(config)?)
            }
        })
    }

    /// Trainable character codec.
    pub fn characters(config: CodecConfig) -> Self {
        CodecVariant::Character(CharacterCodec::trainable(config))
    }

    /// Codec kind.
    pub fn kind(&self) -> CodecKind {
        match self {
            CodecVariant::Character(c) => c.kind(),
            CodecVariant::String(c) => c.kind(),
            CodecVariant::StringList(c) => c.kind(),
        }
    }

    /// Count every symbol of a sequence of the matching kind.
    pub fn train(&mut self, sequence: &Sequence) -> Result<()> {
        let kind = self.kind();
        match (self, sequence) {
            (CodecVariant::Character(c), Sequence::Characters(v)) => c.train_all(v),
            (CodecVariant::String(c), Sequence::Strings(v)) => c.train_all(v),
            (CodecVariant::StringList(c), Sequence::StringLists(v)) => c.train_all(v),
            _ => Err(mismatch(kind, sequence)),
        }
    }

    /// Freeze training and build the tables.
    pub fn build(&mut self) -> Result<()> {
        match self {
            CodecVariant::Character(c) => c.build(),
            CodecVariant::String(c) => c.build(),
            CodecVariant::StringList(c) => c.build(),
        }
    }

    /// Encode a sequence of the matching kind.
    pub fn encode(&self, sequence: &Sequence) -> Result<EncodedStream> {
        match (self, sequence) {
            (CodecVariant::Character(c), Sequence::Characters(v)) => c.encode(v),
            (CodecVariant::String(c), Sequence::Strings(v)) => c.encode(v),
            (CodecVariant::StringList(c), Sequence::StringLists(v)) => c.encode(v),
            _ => Err(mismatch(self.kind(), sequence)),
        }
    }

    /// Decode a stream into a sequence of this codec's kind.
    pub fn decode(&self, stream: &EncodedStream) -> Result<Sequence> {
        Ok(match self {
            CodecVariant::Character(c) => Sequence::Characters(c.decode(stream)?),
            CodecVariant::String(c) => Sequence::Strings(c.decode(stream)?),
            CodecVariant::StringList(c) => Sequence::StringLists(c.decode(stream)?),
        })
    }

    /// Verify round-trip encoding/decoding.
    pub fn verify_roundtrip(&self, sequence: &Sequence) -> Result<bool> {
        let stream = self.encode(sequence)?;
        Ok(self.decode(&stream)? == *sequence)
    }
}

fn mismatch(kind: CodecKind, sequence: &Sequence) -> Error {
    Error::unsupported(format!(
        "{kind} codec cannot handle {} symbols",
        sequence.kind()
    ))
}

impl Registered for CodecVariant {
    fn type_name() -> String {
        "CodecVariant".into()
    }
}
