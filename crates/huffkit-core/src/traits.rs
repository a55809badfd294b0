//! Capability trait shared by every symbol codec.
//!
//! ## Lifecycle
//!
//! ```text
//! trainable: train* -> build -> encode / decode
//! static:    (pre-built or loaded) -> encode / decode
//! ```
//!
//! Training a static codec fails with [`Error::Unsupported`]; training a
//! trainable codec after it was built fails with [`Error::InvalidState`].

use std::borrow::Borrow;

use crate::error::{Error, Result};
use crate::stream::EncodedStream;
use crate::types::CodecKind;

/// Train, encode and decode sequences of one symbol type.
pub trait SymbolCodec {
    /// Symbol type handled by the codec.
    type Symbol: Clone + PartialEq;

    /// Codec family.
    fn kind(&self) -> CodecKind;

    /// Count one occurrence of a symbol.
    ///
    /// Codecs without training support keep this default.
    fn train(&mut self, symbol: &Self::Symbol) -> Result<()> {
        let _ = symbol;
        Err(Error::unsupported(format!(
            "{} codec does not support training",
            self.kind()
        )))
    }

    /// Count every symbol of a sequence.
    fn train_all<I>(&mut self, symbols: I) -> Result<()>
    where
        Self: Sized,
        I: IntoIterator,
        I::Item: Borrow<Self::Symbol>,
    {
        for symbol in symbols {
            self.train(symbol.borrow())?;
        }
        Ok(())
    }

    /// Encode a sequence of symbols.
    fn encode(&self, symbols: &[Self::Symbol]) -> Result<EncodedStream>;

    /// Decode a stream produced by [`SymbolCodec::encode`].
    fn decode(&self, stream: &EncodedStream) -> Result<Vec<Self::Symbol>>;

    /// Verify round-trip encoding/decoding.
    fn verify_roundtrip(&self, symbols: &[Self::Symbol]) -> Result<bool> {
        let stream = self.encode(symbols)?;
        let decoded = self.decode(&stream)?;
        Ok(decoded.as_slice() == symbols)
    }
}
