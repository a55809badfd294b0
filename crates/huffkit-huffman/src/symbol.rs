//! Symbol kinds and the escape token.

use std::fmt::Debug;
use std::hash::Hash;

use huffkit_core::{BitReader, BitWriter, Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Bits used for a raw `char` literal (covers every Unicode scalar value).
pub const CHAR_LITERAL_BITS: u8 = 21;

/// A value that can be given a Huffman code.
///
/// The natural ordering is the deterministic tie-break used when building
/// trees. Every symbol kind also has a raw literal form that the encoder
/// writes after the escape code when the symbol has no code of its own.
pub trait Symbol:
    Clone + Ord + Hash + Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Name used in registry type names, e.g. `Tree<char>`.
    const TYPE_NAME: &'static str;

    /// Write the raw literal form.
    fn write_literal(&self, writer: &mut BitWriter);

    /// Read a literal written by [`Symbol::write_literal`].
    fn read_literal(reader: &mut BitReader<'_>) -> Result<Self>;

    /// Size of the symbol in its raw form, for statistics.
    fn raw_bits(&self) -> u64;
}

impl Symbol for char {
    const TYPE_NAME: &'static str = "char";

    fn write_literal(&self, writer: &mut BitWriter) {
        writer.write_bits(*self as u32, CHAR_LITERAL_BITS);
    }

    fn read_literal(reader: &mut BitReader<'_>) -> Result<Self> {
        let offset = reader.position();
        let value = reader.read_bits(CHAR_LITERAL_BITS)?;
        char::from_u32(value)
            .ok_or_else(|| Error::malformed(format!("invalid code point {value:#x}"), offset))
    }

    fn raw_bits(&self) -> u64 {
        32
    }
}

impl Symbol for String {
    const TYPE_NAME: &'static str = "String";

    fn write_literal(&self, writer: &mut BitWriter) {
        writer.write_varint(self.len() as u64);
        writer.write_bytes(self.as_bytes());
    }

    fn read_literal(reader: &mut BitReader<'_>) -> Result<Self> {
        let offset = reader.position();
        let len = reader.read_varint()?;
        let len = usize::try_from(len)
            .map_err(|_| Error::malformed(format!("literal length {len} too large"), offset))?;
        let bytes = reader.read_bytes(len)?;
        String::from_utf8(bytes)
            .map_err(|e| Error::malformed(format!("literal is not UTF-8: {e}"), offset))
    }

    fn raw_bits(&self) -> u64 {
        self.len() as u64 * 8
    }
}

/// A leaf of a Huffman tree: the escape or a real symbol.
///
/// `Escape` orders before every symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Token<S> {
    /// Reserved pseudo-symbol announcing a raw literal.
    Escape,
    /// A trained symbol.
    Symbol(S),
}

impl<S> Token<S> {
    /// Check if this is the escape token.
    pub fn is_escape(&self) -> bool {
        matches!(self, Token::Escape)
    }

    /// The symbol, if this is not the escape.
    pub fn symbol(&self) -> Option<&S> {
        match self {
            Token::Escape => None,
            Token::Symbol(s) => Some(s),
        }
    }
}
