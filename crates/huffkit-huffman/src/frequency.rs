//! Symbol frequency tables.
//!
//! Training is counting: every observed symbol bumps its entry by one. The
//! table is keyed by the symbol itself, so training order never changes the
//! result. Large corpora can be split into shards, counted independently and
//! merged.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::io::{BufRead, Read};

use huffkit_core::{Registered, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::symbol::Symbol;

/// Observed count per symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "S: Symbol")]
pub struct FrequencyTable<S: Symbol> {
    counts: BTreeMap<S, u64>,
}

impl<S: Symbol> Default for FrequencyTable<S> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }
}

impl<S: Symbol> FrequencyTable<S> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `symbol`.
    pub fn train(&mut self, symbol: &S) {
        self.train_count(symbol, 1);
    }

    /// Add `count` occurrences of `symbol`.
    pub fn train_count(&mut self, symbol: &S, count: u64) {
        if count == 0 {
            return;
        }
        match self.counts.get_mut(symbol) {
            Some(existing) => *existing = existing.saturating_add(count),
            None => {
                self.counts.insert(symbol.clone(), count);
            }
        }
    }

    /// Count every symbol of a sequence.
    pub fn train_all<I>(&mut self, symbols: I)
    where
        I: IntoIterator,
        I::Item: Borrow<S>,
    {
        for symbol in symbols {
            self.train(symbol.borrow());
        }
    }

    /// Add the counts of an independently trained table.
    pub fn merge(&mut self, other: &FrequencyTable<S>) {
        for (symbol, &count) in &other.counts {
            self.train_count(symbol, count);
        }
    }

    /// Count each shard on its own thread, then merge the shard tables.
    pub fn train_sharded<T>(shards: &[T]) -> Self
    where
        T: AsRef<[S]> + Sync,
    {
        let table = shards
            .par_iter()
            .map(|shard| {
                let mut table = FrequencyTable::new();
                table.train_all(shard.as_ref());
                table
            })
            .reduce(FrequencyTable::new, |mut left, right| {
                left.merge(&right);
                left
            });
        debug!(
            shards = shards.len(),
            symbols = table.len(),
            "trained sharded frequency table"
        );
        table
    }

    /// Count of `symbol`, zero if never seen.
    pub fn count(&self, symbol: &S) -> u64 {
        self.counts.get(symbol).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().fold(0u64, |acc, &c| acc.saturating_add(c))
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if nothing was trained.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterate `(symbol, count)` in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&S, u64)> {
        self.counts.iter().map(|(s, &c)| (s, c))
    }

    /// Copy of the table keeping only symbols seen at least `min` times.
    pub fn retain_at_least(&self, min: u64) -> Self {
        Self {
            counts: self
                .counts
                .iter()
                .filter(|&(_, &c)| c >= min)
                .map(|(s, &c)| (s.clone(), c))
                .collect(),
        }
    }
}

impl FrequencyTable<String> {
    /// Count every line of a corpus as one symbol.
    pub fn train_lines<R: BufRead>(&mut self, reader: R) -> Result<()> {
        for line in reader.lines() {
            self.train(&line?);
        }
        Ok(())
    }
}

impl FrequencyTable<char> {
    /// Count every character of a UTF-8 corpus.
    pub fn train_chars<R: Read>(&mut self, mut reader: R) -> Result<()> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        self.train_all(text.chars());
        Ok(())
    }
}

impl<S: Symbol> FromIterator<S> for FrequencyTable<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut table = Self::new();
        table.train_all(iter);
        table
    }
}

impl<S: Symbol> Registered for FrequencyTable<S> {
    fn type_name() -> String {
        format!("FrequencyTable<{}>", S::TYPE_NAME)
    }
}
