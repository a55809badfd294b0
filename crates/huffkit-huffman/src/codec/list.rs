//! String list codec.

use std::sync::Arc;

use huffkit_core::{
    BitReader, BitWriter, CodecKind, EncodedStream, Error, Listener, Registered, Result,
    SymbolCodec,
};
use serde::{Deserialize, Serialize};

use super::StringCodec;
use crate::config::StringCodecConfig;
use crate::decoder::decode_sequence;
use crate::encoder::encode_sequence;

/// Codec over lists of strings.
///
/// Each list is its length as a varint followed by its strings, written by
/// a shared [`StringCodec`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringListCodec {
    strings: StringCodec,
}

impl StringListCodec {
    /// Create a trainable list codec.
    pub fn trainable(config: StringCodecConfig) -> Result<Self> {
        Ok(Self {
            strings: StringCodec::trainable(config)?,
        })
    }

    /// Report warnings to `listener`.
    pub fn with_listener(self, listener: Arc<dyn Listener>) -> Self {
        Self {
            strings: self.strings.with_listener(listener),
        }
    }

    /// Freeze training and build the tables.
    pub fn build(&mut self) -> Result<()> {
        self.strings.build()
    }

    /// Underlying string codec.
    pub fn strings(&self) -> &StringCodec {
        &self.strings
    }

    fn write_list(&self, list: &[String], writer: &mut BitWriter) -> Result<()> {
        writer.write_varint(list.len() as u64);
        for s in list {
            self.strings.write_string(s, writer)?;
        }
        Ok(())
    }

    fn read_list(&self, reader: &mut BitReader<'_>) -> Result<Vec<String>> {
        let offset = reader.position();
        let len = reader.read_varint()?;
        if len > reader.remaining() {
            return Err(Error::malformed(
                format!("list claims {len} strings"),
                offset,
            ));
        }
        (0..len).map(|_| self.strings.read_string(reader)).collect()
    }
}

impl From<StringCodec> for StringListCodec {
    fn from(strings: StringCodec) -> Self {
        Self { strings }
    }
}

impl SymbolCodec for StringListCodec {
    type Symbol = Vec<String>;

    fn kind(&self) -> CodecKind {
        CodecKind::StringList
    }

    fn train(&mut self, list: &Vec<String>) -> Result<()> {
        self.strings.train_all(list)
    }

    fn encode(&self, lists: &[Vec<String>]) -> Result<EncodedStream> {
        // Fail before writing anything if the tables are missing
        self.strings.strings().tables()?;
        encode_sequence(lists, |list, writer| self.write_list(list, writer))
    }

    fn decode(&self, stream: &EncodedStream) -> Result<Vec<Vec<String>>> {
        self.strings.strings().tables()?;
        decode_sequence(stream, |reader| self.read_list(reader))
    }
}

impl Registered for StringListCodec {
    fn type_name() -> String {
        "StringListCodec".into()
    }
}
