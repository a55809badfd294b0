//! Encoded stream container.

use serde::{Deserialize, Serialize};

use crate::bits::{BitReader, BitWriter};
use crate::error::Result;
use crate::registry::Registered;

/// Packed output of an encoder.
///
/// The bytes are MSB-first with the final byte zero padded. `bit_len` and
/// `symbol_count` are recorded out-of-band so the decoder knows exactly where
/// the stream ends and how many symbols it must produce.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncodedStream {
    /// Packed code bits.
    pub bytes: Vec<u8>,
    /// Number of meaningful bits in `bytes`.
    pub bit_len: u64,
    /// Number of encoded symbols.
    pub symbol_count: u64,
}

impl EncodedStream {
    /// Create a stream from its parts.
    pub fn new(bytes: Vec<u8>, bit_len: u64, symbol_count: u64) -> Self {
        Self {
            bytes,
            bit_len,
            symbol_count,
        }
    }

    /// Finish a writer into a stream of `symbol_count` symbols.
    pub fn from_writer(writer: BitWriter, symbol_count: u64) -> Self {
        let (bytes, bit_len) = writer.finish();
        Self::new(bytes, bit_len, symbol_count)
    }

    /// Bit cursor bounded by the recorded length.
    pub fn reader(&self) -> Result<BitReader<'_>> {
        BitReader::new(&self.bytes, self.bit_len)
    }

    /// Size of the packed bytes.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the stream holds no symbols.
    pub fn is_empty(&self) -> bool {
        self.symbol_count == 0
    }
}

impl Registered for EncodedStream {
    fn type_name() -> String {
        "EncodedStream".into()
    }
}
