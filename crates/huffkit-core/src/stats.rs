//! Statistics and metrics for encode operations.

use crate::types::{CodecKind, CompressionRatio};

/// Statistics from one encode operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodecStats {
    /// Codec family used.
    pub kind: Option<CodecKind>,

    /// Symbols encoded.
    pub symbols: u64,

    /// Symbols that went through the escape path.
    pub escaped_symbols: u64,

    /// Bits in the encoded stream, padding excluded.
    pub encoded_bits: u64,

    /// Bits the symbols occupy in their raw form.
    pub raw_bits: u64,
}

impl CodecStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag the stats with the codec family that produced them.
    pub fn with_kind(self, kind: CodecKind) -> Self {
        CodecStats {
            kind: Some(kind),
            ..self
        }
    }

    /// Get compression ratio.
    pub fn ratio(&self) -> CompressionRatio {
        CompressionRatio::new(self.raw_bits, self.encoded_bits)
    }

    /// Average encoded bits per symbol.
    pub fn bits_per_symbol(&self) -> f64 {
        if self.symbols == 0 {
            return 0.0;
        }
        self.encoded_bits as f64 / self.symbols as f64
    }

    /// Fraction of symbols that needed an escape (0.0 - 1.0).
    pub fn escape_rate(&self) -> f64 {
        if self.symbols == 0 {
            return 0.0;
        }
        self.escaped_symbols as f64 / self.symbols as f64
    }

    /// Get space savings as percentage.
    pub fn savings_percent(&self) -> f64 {
        self.ratio().savings_percent()
    }

    /// Merge stats from another operation.
    pub fn merge(&mut self, other: &CodecStats) {
        self.symbols += other.symbols;
        self.escaped_symbols += other.escaped_symbols;
        self.encoded_bits += other.encoded_bits;
        self.raw_bits += other.raw_bits;

        if self.kind != other.kind {
            self.kind = self.kind.or(other.kind);
        }
    }
}

/// Metrics collector for aggregate statistics.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    /// Total operations performed.
    pub total_operations: u64,

    /// Total symbols encoded.
    pub total_symbols: u64,

    /// Total escaped symbols.
    pub total_escaped: u64,

    /// Total raw bits consumed.
    pub total_raw_bits: u64,

    /// Total encoded bits produced.
    pub total_encoded_bits: u64,

    /// Number of errors encountered.
    pub error_count: u64,
}

impl Metrics {
    /// Create new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed operation.
    pub fn record(&mut self, stats: &CodecStats) {
        self.total_operations += 1;
        self.total_symbols += stats.symbols;
        self.total_escaped += stats.escaped_symbols;
        self.total_raw_bits += stats.raw_bits;
        self.total_encoded_bits += stats.encoded_bits;
    }

    /// Record an error.
    pub fn record_error(&mut self) {
        self.error_count += 1;
    }

    /// Get average compression ratio.
    pub fn average_ratio(&self) -> f64 {
        if self.total_encoded_bits == 0 {
            return 1.0;
        }
        self.total_raw_bits as f64 / self.total_encoded_bits as f64
    }

    /// Average encoded bits per symbol over every operation.
    pub fn average_bits_per_symbol(&self) -> f64 {
        if self.total_symbols == 0 {
            return 0.0;
        }
        self.total_encoded_bits as f64 / self.total_symbols as f64
    }

    /// Get error rate.
    pub fn error_rate(&self) -> f64 {
        let total = self.total_operations + self.error_count;
        if total == 0 {
            return 0.0;
        }
        self.error_count as f64 / total as f64
    }

    /// Reset all metrics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
