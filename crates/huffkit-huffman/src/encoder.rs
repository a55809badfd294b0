//! Symbol stream encoder.
//!
//! Each symbol's code is appended MSB-first to a [`BitWriter`]. A symbol
//! without a code is written as the escape code followed by its literal;
//! when the table has no escape the symbol is rejected.

use huffkit_core::{BitWriter, CodecStats, EncodedStream, Error, Result};

use crate::code::CodeTable;
use crate::symbol::Symbol;

/// Encode a sequence item by item into one stream.
///
/// The stream records `items.len()` as its symbol count.
pub fn encode_sequence<T, F>(items: &[T], mut write_one: F) -> Result<EncodedStream>
where
    F: FnMut(&T, &mut BitWriter) -> Result<()>,
{
    let mut writer = BitWriter::with_capacity(items.len());
    for item in items {
        write_one(item, &mut writer)?;
    }
    Ok(EncodedStream::from_writer(writer, items.len() as u64))
}

/// Encoder over a borrowed code table.
#[derive(Debug, Clone, Copy)]
pub struct Encoder<'a, S: Symbol> {
    table: &'a CodeTable<S>,
}

impl<'a, S: Symbol> Encoder<'a, S> {
    /// Create an encoder for a code table.
    pub fn new(table: &'a CodeTable<S>) -> Self {
        Self { table }
    }

    /// Write one symbol; returns `true` if it went through the escape path.
    ///
    /// `literal` writes the raw form of an escaped symbol.
    #[inline]
    pub fn write_symbol<F>(
        &self,
        symbol: &S,
        writer: &mut BitWriter,
        literal: &mut F,
    ) -> Result<bool>
    where
        F: FnMut(&S, &mut BitWriter) -> Result<()>,
    {
        if let Some(code) = self.table.code_of(symbol) {
            writer.write_bits(code.bits, code.length);
            return Ok(false);
        }
        match self.table.escape_code() {
            Some(escape) => {
                writer.write_bits(escape.bits, escape.length);
                literal(symbol, writer)?;
                Ok(true)
            }
            None => Err(Error::unencodable(symbol)),
        }
    }

    /// Encode symbols, escaping unknown ones with their default literal.
    pub fn encode(&self, symbols: &[S]) -> Result<EncodedStream> {
        self.encode_with(symbols, write_default_literal)
    }

    /// Encode symbols with a custom literal writer for escapes.
    pub fn encode_with<F>(&self, symbols: &[S], literal: F) -> Result<EncodedStream>
    where
        F: FnMut(&S, &mut BitWriter) -> Result<()>,
    {
        self.encode_with_stats(symbols, literal).map(|(stream, _)| stream)
    }

    /// Encode symbols and report what the encoding cost.
    pub fn encode_with_stats<F>(
        &self,
        symbols: &[S],
        mut literal: F,
    ) -> Result<(EncodedStream, CodecStats)>
    where
        F: FnMut(&S, &mut BitWriter) -> Result<()>,
    {
        let mut stats = CodecStats::new();
        let stream = encode_sequence(symbols, |symbol, writer| {
            if self.write_symbol(symbol, writer, &mut literal)? {
                stats.escaped_symbols += 1;
            }
            stats.raw_bits += symbol.raw_bits();
            Ok(())
        })?;
        stats.symbols = stream.symbol_count;
        stats.encoded_bits = stream.bit_len;
        Ok((stream, stats))
    }
}

/// Literal writer using the symbol's own raw form.
pub fn write_default_literal<S: Symbol>(symbol: &S, writer: &mut BitWriter) -> Result<()> {
    symbol.write_literal(writer);
    Ok(())
}
