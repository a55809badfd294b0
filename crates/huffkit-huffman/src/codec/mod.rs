//! Huffman codecs.
//!
//! [`HuffmanCodec`] owns the lifecycle shared by every codec: count symbols,
//! build the tree, code table and decode table once, then encode and decode
//! with the frozen tables. The public codecs wrap it for concrete symbol
//! kinds:
//!
//! | Codec | Symbol | Escaped symbols |
//! |-------|--------|-----------------|
//! | [`CharacterCodec`] | `char` | 21-bit code point |
//! | [`StringCodec`] | `String` | spelled with an inner character codec |
//! | [`StringListCodec`] | `Vec<String>` | per string, as [`StringCodec`] |
//!
//! [`CodecVariant`] is the closed sum of the three for callers that pick the
//! codec kind at runtime.

mod character;
mod list;
mod string;
mod variant;

pub use character::CharacterCodec;
pub use list::StringListCodec;
pub use string::StringCodec;
pub use variant::{CodecVariant, Sequence};

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use huffkit_core::{
    CodecStats, EncodedStream, Error, Listener, Registered, Result, TracingListener,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::code::{Code, CodeTable};
use crate::config::CodecConfig;
use crate::decoder::FastDecoder;
use crate::encoder::{Encoder, write_default_literal};
use crate::format::{BuildRecord, PersistedCodec};
use crate::frequency::FrequencyTable;
use crate::symbol::Symbol;
use crate::tree::Tree;

/// Tables derived from a frozen frequency table.
#[derive(Debug)]
pub struct BuiltTables<S: Symbol> {
    frequencies: FrequencyTable<S>,
    tree: Tree<S>,
    codes: CodeTable<S>,
    decoder: FastDecoder<S>,
}

impl<S: Symbol> BuiltTables<S> {
    /// Derive tree, code table and decode table.
    pub fn build(
        frequencies: FrequencyTable<S>,
        config: &CodecConfig,
        listener: &dyn Listener,
    ) -> Result<Self> {
        let tree = Tree::build(&frequencies, config, listener)?;
        let codes = CodeTable::from_tree(&tree);
        let decoder = FastDecoder::new(&codes, config, listener)?;
        debug!(
            symbol = S::TYPE_NAME,
            codes = codes.len(),
            max_code_length = codes.max_length(),
            average_length = codes.average_length(),
            "built codec tables"
        );
        Ok(Self {
            frequencies,
            tree,
            codes,
            decoder,
        })
    }

    /// Frozen training counts.
    pub fn frequencies(&self) -> &FrequencyTable<S> {
        &self.frequencies
    }

    /// Huffman tree.
    pub fn tree(&self) -> &Tree<S> {
        &self.tree
    }

    /// Code table.
    pub fn codes(&self) -> &CodeTable<S> {
        &self.codes
    }

    /// Fast decoder.
    pub fn decoder(&self) -> &FastDecoder<S> {
        &self.decoder
    }

    /// Values recorded when the codec is persisted.
    pub fn record(&self) -> BuildRecord {
        BuildRecord {
            escape_code: self.codes.escape_code(),
            max_code_length: self.codes.max_length(),
        }
    }
}

enum State<S: Symbol> {
    Training(FrequencyTable<S>),
    Built(Arc<BuiltTables<S>>),
}

impl<S: Symbol> Clone for State<S> {
    fn clone(&self) -> Self {
        match self {
            State::Training(frequencies) => State::Training(frequencies.clone()),
            State::Built(tables) => State::Built(Arc::clone(tables)),
        }
    }
}

impl<S: Symbol> State<S> {
    fn name(&self) -> &'static str {
        match self {
            State::Training(_) => "training",
            State::Built(_) => "built",
        }
    }
}

/// Huffman codec over one symbol kind.
///
/// A *trainable* codec counts symbols until [`HuffmanCodec::build`]; a
/// *static* codec is built from a given table and never trains. Built
/// tables sit behind an `Arc`, so clones share them.
#[derive(Clone, Serialize, Deserialize)]
#[serde(
    bound = "S: Symbol",
    into = "PersistedCodec<S>",
    try_from = "PersistedCodec<S>"
)]
pub struct HuffmanCodec<S: Symbol> {
    config: CodecConfig,
    trainable: bool,
    state: State<S>,
    listener: Arc<dyn Listener>,
}

impl<S: Symbol> HuffmanCodec<S> {
    /// Create a codec that accepts training until it is built.
    pub fn trainable(config: CodecConfig) -> Self {
        Self {
            config,
            trainable: true,
            state: State::Training(FrequencyTable::new()),
            listener: Arc::new(TracingListener),
        }
    }

    /// Create a built codec from a pre-trained table; it rejects training.
    pub fn from_frequencies(frequencies: FrequencyTable<S>, config: CodecConfig) -> Result<Self> {
        Self::from_frequencies_with_listener(frequencies, config, Arc::new(TracingListener))
    }

    /// As [`HuffmanCodec::from_frequencies`], reporting warnings to `listener`.
    pub fn from_frequencies_with_listener(
        frequencies: FrequencyTable<S>,
        config: CodecConfig,
        listener: Arc<dyn Listener>,
    ) -> Result<Self> {
        let tables = BuiltTables::build(frequencies, &config, listener.as_ref())?;
        Ok(Self {
            config,
            trainable: false,
            state: State::Built(Arc::new(tables)),
            listener,
        })
    }

    /// Report warnings to `listener` instead of `tracing`.
    pub fn with_listener(mut self, listener: Arc<dyn Listener>) -> Self {
        self.listener = listener;
        self
    }

    /// Codec configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Warning sink.
    pub fn listener(&self) -> &Arc<dyn Listener> {
        &self.listener
    }

    /// Check if the codec was created trainable.
    pub fn is_trainable(&self) -> bool {
        self.trainable
    }

    /// Check if the tables are built.
    pub fn is_built(&self) -> bool {
        matches!(self.state, State::Built(_))
    }

    fn training_table(&mut self) -> Result<&mut FrequencyTable<S>> {
        if !self.trainable {
            return Err(Error::unsupported(format!(
                "static {} codec cannot be trained",
                S::TYPE_NAME
            )));
        }
        let actual = self.state.name();
        match &mut self.state {
            State::Training(frequencies) => Ok(frequencies),
            State::Built(_) => Err(Error::invalid_state("training", actual)),
        }
    }

    /// Count one occurrence of a symbol.
    pub fn train(&mut self, symbol: &S) -> Result<()> {
        self.training_table()?.train(symbol);
        Ok(())
    }

    /// Add `count` occurrences of a symbol.
    pub fn train_count(&mut self, symbol: &S, count: u64) -> Result<()> {
        self.training_table()?.train_count(symbol, count);
        Ok(())
    }

    /// Count every symbol of a sequence.
    pub fn train_all<I>(&mut self, symbols: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Borrow<S>,
    {
        self.training_table()?.train_all(symbols);
        Ok(())
    }

    /// Add counts from an independently trained table.
    pub fn merge(&mut self, other: &FrequencyTable<S>) -> Result<()> {
        self.training_table()?.merge(other);
        Ok(())
    }

    /// Drop symbols seen fewer than `min` times; returns how many went.
    pub fn retain_at_least(&mut self, min: u64) -> Result<usize> {
        let table = self.training_table()?;
        let before = table.len();
        *table = table.retain_at_least(min);
        Ok(before - table.len())
    }

    /// Freeze training and derive the tables.
    ///
    /// On failure the codec stays in training.
    pub fn build(&mut self) -> Result<()> {
        let frequencies = match &self.state {
            State::Training(frequencies) => frequencies.clone(),
            State::Built(_) => return Err(Error::invalid_state("training", "built")),
        };
        let tables = BuiltTables::build(frequencies, &self.config, self.listener.as_ref())?;
        self.state = State::Built(Arc::new(tables));
        Ok(())
    }

    /// Built tables.
    pub fn tables(&self) -> Result<&Arc<BuiltTables<S>>> {
        match &self.state {
            State::Built(tables) => Ok(tables),
            State::Training(_) => Err(Error::invalid_state("built", "training")),
        }
    }

    /// Training counts (frozen once built).
    pub fn frequencies(&self) -> &FrequencyTable<S> {
        match &self.state {
            State::Training(frequencies) => frequencies,
            State::Built(tables) => tables.frequencies(),
        }
    }

    /// Code table.
    pub fn code_table(&self) -> Result<&CodeTable<S>> {
        Ok(self.tables()?.codes())
    }

    /// Fast decoder.
    pub fn decoder(&self) -> Result<&FastDecoder<S>> {
        Ok(self.tables()?.decoder())
    }

    /// Encoder over the code table.
    pub fn encoder(&self) -> Result<Encoder<'_, S>> {
        Ok(Encoder::new(self.code_table()?))
    }

    /// Reserved escape code, if escapes are enabled.
    pub fn escape_code(&self) -> Result<Option<Code>> {
        Ok(self.code_table()?.escape_code())
    }

    /// Encode symbols.
    pub fn encode(&self, symbols: &[S]) -> Result<EncodedStream> {
        self.encoder()?.encode(symbols)
    }

    /// Encode symbols and report what the encoding cost.
    pub fn encode_with_stats(&self, symbols: &[S]) -> Result<(EncodedStream, CodecStats)> {
        self.encoder()?
            .encode_with_stats(symbols, write_default_literal)
    }

    /// Decode a stream produced by [`HuffmanCodec::encode`].
    pub fn decode(&self, stream: &EncodedStream) -> Result<Vec<S>> {
        self.decoder()?.decode(stream)
    }

    /// Persistable form of the codec.
    pub fn to_persisted(&self) -> PersistedCodec<S> {
        PersistedCodec {
            config: self.config.clone(),
            trainable: self.trainable,
            frequencies: self.frequencies().clone(),
            built: match &self.state {
                State::Training(_) => None,
                State::Built(tables) => Some(tables.record()),
            },
        }
    }

    /// Restore a codec, rebuilding its tables when it was built.
    ///
    /// The rebuilt escape code and maximum code length must match the
    /// recorded ones.
    pub fn from_persisted(persisted: PersistedCodec<S>) -> Result<Self> {
        let PersistedCodec {
            config,
            trainable,
            frequencies,
            built,
        } = persisted;
        let listener: Arc<dyn Listener> = Arc::new(TracingListener);

        let state = match built {
            None if trainable => State::Training(frequencies),
            None => {
                return Err(Error::Serialization(
                    "static codec was persisted without tables".into(),
                ));
            }
            Some(record) => {
                let tables = BuiltTables::build(frequencies, &config, listener.as_ref())?;
                if tables.record() != record {
                    return Err(Error::Serialization(format!(
                        "rebuilt tables {:?} do not match recorded {:?}",
                        tables.record(),
                        record
                    )));
                }
                State::Built(Arc::new(tables))
            }
        };

        Ok(Self {
            config,
            trainable,
            state,
            listener,
        })
    }
}

impl<S: Symbol> From<HuffmanCodec<S>> for PersistedCodec<S> {
    fn from(codec: HuffmanCodec<S>) -> Self {
        codec.to_persisted()
    }
}

impl<S: Symbol> TryFrom<PersistedCodec<S>> for HuffmanCodec<S> {
    type Error = Error;

    fn try_from(persisted: PersistedCodec<S>) -> Result<Self> {
        Self::from_persisted(persisted)
    }
}

impl<S: Symbol> fmt::Debug for HuffmanCodec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HuffmanCodec")
            .field("symbol", &S::TYPE_NAME)
            .field("config", &self.config)
            .field("trainable", &self.trainable)
            .field("state", &self.state.name())
            .field("symbols", &self.frequencies().len())
            .finish()
    }
}

impl<S: Symbol> Registered for HuffmanCodec<S> {
    fn type_name() -> String {
        format!("HuffmanCodec<{}>", S::TYPE_NAME)
    }
}
