//! Error types for codec operations.

use thiserror::Error;

/// Result type alias for codec operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Codec error types.
#[derive(Debug, Error)]
pub enum Error {
    /// No symbol was trained before the tree was built.
    #[error("empty alphabet: no symbols were trained")]
    EmptyAlphabet,

    /// Symbol is not in the code table and the codec does not escape.
    #[error("unencodable symbol {symbol}: not in code table and escapes are disabled")]
    UnencodableSymbol { symbol: String },

    /// Encoded stream is corrupted or truncated.
    #[error("malformed stream at bit {bit_offset}: {message}")]
    MalformedStream { message: String, bit_offset: u64 },

    /// Alphabet cannot be coded within the maximum code length.
    #[error("alphabet of {size} symbols exceeds the maximum of {max}")]
    AlphabetTooLarge { size: usize, max: usize },

    /// Codec configuration is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation is not valid in the codec's current lifecycle state.
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    /// Operation is not supported by this codec.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Type registry violation.
    #[error("registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// Binary (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from an underlying byte stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a malformed stream error at a bit offset.
    pub fn malformed(message: impl Into<String>, bit_offset: u64) -> Self {
        Error::MalformedStream {
            message: message.into(),
            bit_offset,
        }
    }

    /// Create an unencodable symbol error naming the symbol.
    pub fn unencodable(symbol: impl core::fmt::Debug) -> Self {
        Error::UnencodableSymbol {
            symbol: format!("{symbol:?}"),
        }
    }

    /// Create an unsupported operation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Error::Unsupported(message.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig(message.into())
    }

    /// Create a lifecycle state error.
    pub fn invalid_state(expected: &'static str, actual: &'static str) -> Self {
        Error::InvalidState { expected, actual }
    }

    /// Check if the caller can recover by changing input or configuration.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::UnencodableSymbol { .. } | Error::InvalidConfig(_) | Error::InvalidState { .. }
        )
    }

    /// Get error category for metrics.
    pub fn category(&self) -> &'static str {
        match self {
            Error::EmptyAlphabet => "empty_alphabet",
            Error::UnencodableSymbol { .. } => "unencodable_symbol",
            Error::MalformedStream { .. } => "malformed_stream",
            Error::AlphabetTooLarge { .. } => "alphabet_too_large",
            Error::InvalidConfig(_) => "invalid_config",
            Error::InvalidState { .. } => "invalid_state",
            Error::Unsupported(_) => "unsupported",
            Error::Registration(_) => "registration",
            Error::Serialization(_) => "serialization",
            Error::Io(_) => "io_error",
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Type registry violations.
///
/// All of these are programming errors in a registration list. They are
/// returned from registry construction and must abort initialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A group name was registered twice.
    #[error("duplicate registration group {0:?}")]
    DuplicateGroup(String),

    /// A type was registered twice.
    #[error("type {type_name} registered twice (second time in group {group:?})")]
    DuplicateType { type_name: String, group: String },

    /// A group ran out of identifiers in its block.
    #[error("registration group {group:?} is full ({capacity} identifiers)")]
    GroupFull { group: String, capacity: u32 },

    /// Two types resolved to the same identifier.
    #[error("identifier {identifier} of {type_name} collides with {existing}")]
    IdentifierCollision {
        identifier: u32,
        type_name: String,
        existing: String,
    },

    /// A published identifier moved or disappeared.
    #[error("published type {type_name} expected identifier {expected}, found {actual:?}")]
    ManifestMismatch {
        type_name: String,
        expected: u32,
        actual: Option<u32>,
    },

    /// A type was used for serialization without being registered.
    #[error("type {0} is not registered")]
    UnregisteredType(String),

    /// Serialized payload carries another type's identifier.
    #[error("payload identifier {actual} does not belong to {type_name} ({expected})")]
    IdentifierMismatch {
        type_name: String,
        expected: u32,
        actual: u32,
    },
}
