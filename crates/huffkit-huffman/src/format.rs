//! Persisted codec format.
//!
//! A codec file wraps one registered value, usually a codec:
//!
//! ```text
//! Offset  Size   Field
//! ──────  ────   ─────
//! 0       4      magic ("HUFC")
//! 4       2      version (u16)
//! 6       4      registry identifier of the payload type (u32)
//! 10      8      payload length (u64)
//! 18      n      payload
//! ```
//!
//! Codecs persist as [`PersistedCodec`]: configuration, training counts and
//! the escape code and maximum code length they were built with. Loading
//! rebuilds every table from the counts and rejects the file if the rebuilt
//! values differ from the recorded ones.

use std::io::{Read, Write};
use std::path::Path;

use huffkit_core::{Error, Registered, Result, TypeRegistry};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::code::Code;
use crate::config::CodecConfig;
use crate::frequency::FrequencyTable;
use crate::symbol::Symbol;

/// Magic bytes at the start of a codec file.
pub const CODEC_MAGIC: [u8; 4] = *b"HUFC";

/// Current file format version.
pub const FORMAT_VERSION: u16 = 1;

/// Values a built codec must reproduce when its tables are rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    /// Escape code, if escapes were enabled.
    pub escape_code: Option<Code>,
    /// Longest code in the table.
    pub max_code_length: u8,
}

/// Serialized form of a codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "S: Symbol")]
pub struct PersistedCodec<S: Symbol> {
    /// Table configuration.
    pub config: CodecConfig,
    /// Whether the codec was created trainable.
    pub trainable: bool,
    /// Training counts.
    pub frequencies: FrequencyTable<S>,
    /// `None` while the codec is still training.
    pub built: Option<BuildRecord>,
}

/// Codec file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecHeader {
    /// Magic bytes
    pub magic: [u8; 4],
    /// Format version
    pub version: u16,
    /// Registry identifier of the payload type
    pub identifier: u32,
    /// Payload length in bytes
    pub payload_len: u64,
}

impl CodecHeader {
    /// Header size in bytes
    pub const SIZE: usize = 18;

    /// Create a header for a payload.
    pub fn new(identifier: u32, payload_len: u64) -> Self {
        Self {
            magic: CODEC_MAGIC,
            version: FORMAT_VERSION,
            identifier,
            payload_len,
        }
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes[6..10].copy_from_slice(&self.identifier.to_le_bytes());
        bytes[10..18].copy_from_slice(&self.payload_len.to_le_bytes());
        bytes
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let Some(bytes) = bytes.get(..Self::SIZE) else {
            return Err(Error::Serialization("codec header too short".into()));
        };

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        if magic != CODEC_MAGIC {
            return Err(Error::Serialization(format!(
                "invalid magic bytes {magic:?}"
            )));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != FORMAT_VERSION {
            return Err(Error::unsupported(format!(
                "codec file version {version}, expected {FORMAT_VERSION}"
            )));
        }

        let mut identifier = [0u8; 4];
        identifier.copy_from_slice(&bytes[6..10]);
        let mut payload_len = [0u8; 8];
        payload_len.copy_from_slice(&bytes[10..18]);

        Ok(Self {
            magic,
            version,
            identifier: u32::from_le_bytes(identifier),
            payload_len: u64::from_le_bytes(payload_len),
        })
    }
}

/// A header plus the payload of one registered value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecFile {
    /// File header
    pub header: CodecHeader,
    /// Serialized value, without its identifier prefix
    pub payload: Vec<u8>,
}

impl CodecFile {
    /// Serialize a registered value.
    pub fn pack<T: Registered>(registry: &TypeRegistry, value: &T) -> Result<Self> {
        let bytes = registry.serialize(value)?;
        let identifier = TypeRegistry::peek_identifier(&bytes)?;
        let payload = bytes[4..].to_vec();
        debug!(
            type_name = %T::type_name(),
            identifier,
            bytes = payload.len(),
            "packed codec file"
        );
        Ok(Self {
            header: CodecHeader::new(identifier, payload.len() as u64),
            payload,
        })
    }

    /// Deserialize the value, checking it is a `T`.
    pub fn unpack<T: Registered>(&self, registry: &TypeRegistry) -> Result<T> {
        let mut bytes = Vec::with_capacity(4 + self.payload.len());
        bytes.extend_from_slice(&self.header.identifier.to_le_bytes());
        bytes.extend_from_slice(&self.payload);
        registry.deserialize(&bytes)
    }

    /// Registered name of the payload type.
    pub fn type_name<'r>(&self, registry: &'r TypeRegistry) -> Option<&'r str> {
        registry
            .entry(self.header.identifier)
            .map(|entry| entry.type_name())
    }

    /// Write to a writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.header.to_bytes())?;
        writer.write_all(&self.payload)?;
        Ok(())
    }

    /// Read from a reader
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut header_bytes = [0u8; CodecHeader::SIZE];
        reader.read_exact(&mut header_bytes)?;
        let header = CodecHeader::from_bytes(&header_bytes)?;

        let len = usize::try_from(header.payload_len).map_err(|_| {
            Error::Serialization(format!("payload of {} bytes", header.payload_len))
        })?;
        let mut payload = Vec::new();
        reader.by_ref().take(header.payload_len).read_to_end(&mut payload)?;
        if payload.len() != len {
            return Err(Error::Serialization(format!(
                "payload truncated: {} of {len} bytes",
                payload.len()
            )));
        }

        Ok(Self { header, payload })
    }

    /// Write to file path
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut file = std::fs::File::create(path)?;
        self.write_to(&mut file)
    }

    /// Read from file path
    pub fn load(path: &Path) -> Result<Self> {
        let mut file = std::fs::File::open(path)?;
        Self::read_from(&mut file)
    }
}
