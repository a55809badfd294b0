//! # Huffkit Core
//!
//! Core traits, types and plumbing shared by the huffkit symbol codecs.
//!
//! ## Design Philosophy
//!
//! - **Immutable after build**: code tables and decode tables are derived once
//!   and shared read-only; every encode/decode call owns its own bit cursor
//! - **Deterministic**: the same corpus always produces the same codes
//! - **Stable persistence**: every persisted type has a registry identifier
//!   that never changes across releases
//!
//! ## Modules
//!
//! - [`bits`] - MSB-first [`BitWriter`] and bounded [`BitReader`]
//! - [`error`] - [`Error`] and the crate-wide [`Result`]
//! - [`listener`] - [`Listener`] sink for recoverable codec warnings
//! - [`registry`] - append-only [`TypeRegistry`] for binary persistence
//! - [`stats`] - [`CodecStats`] and aggregate [`Metrics`]
//! - [`stream`] - [`EncodedStream`], the packed output of an encoder
//! - [`traits`] - the [`SymbolCodec`] capability implemented by every codec
//!
//! ## Example
//!
//! ```ignore
//! use huffkit_core::SymbolCodec;
//! use huffkit_huffman::CharacterCodec;
//!
//! let mut codec = CharacterCodec::trainable(Default::default());
//! codec.train_all(&['a', 'b', 'a'])?;
//! codec.build()?;
//! let stream = codec.encode(&['a', 'b'])?;
//! assert_eq!(codec.decode(&stream)?, vec!['a', 'b']);
//! ```

pub mod bits;
pub mod error;
pub mod listener;
pub mod registry;
pub mod stats;
pub mod stream;
pub mod traits;
pub mod types;

pub use bits::{BitReader, BitWriter};
pub use error::{Error, RegistrationError, Result};
pub use listener::{CollectingListener, Listener, TracingListener};
pub use registry::{
    CustomSerializer, GroupBuilder, ManifestEntry, Registered, RegistrationGroup, TypeEntry,
    TypeRegistry, TypeRegistryBuilder, FIRST_IDENTIFIER, GROUP_CAPACITY,
};
pub use stats::{CodecStats, Metrics};
pub use stream::EncodedStream;
pub use traits::SymbolCodec;
pub use types::{CodecKind, CompressionRatio};
