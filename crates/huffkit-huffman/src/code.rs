//! Code tables derived from a Huffman tree.

use std::collections::HashMap;
use std::fmt;

use huffkit_core::{Error, Registered, Result};
use serde::{Deserialize, Serialize};

use crate::symbol::{Symbol, Token};
use crate::tree::{Node, Tree};

/// A bit code, most significant bit first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Code {
    /// Code value in the low `length` bits.
    pub bits: u32,
    /// Number of bits in the code.
    pub length: u8,
}

impl Code {
    /// Create a new code.
    pub const fn new(bits: u32, length: u8) -> Self {
        Self { bits, length }
    }

    /// The code extended by one bit.
    #[inline]
    pub fn push(self, bit: bool) -> Self {
        Self {
            bits: (self.bits << 1) | bit as u32,
            length: self.length + 1,
        }
    }

    /// Check if `self` is a prefix of `other` (or equal to it).
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        self.length <= other.length && other.bits >> (other.length - self.length) == self.bits
    }

    /// Code bits left-aligned in a 32-bit word.
    fn aligned(&self) -> u64 {
        (self.bits as u64) << (32 - self.length as u32)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.length).rev() {
            f.write_str(if (self.bits >> i) & 1 == 1 { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl Registered for Code {
    fn type_name() -> String {
        "Code".into()
    }
}

/// One row of a code table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "S: Symbol")]
pub struct CodedSymbol<S: Symbol> {
    /// Escape or symbol.
    pub token: Token<S>,
    /// Assigned code.
    pub code: Code,
    /// Weight the code was derived from.
    pub frequency: u64,
}

impl<S: Symbol> Registered for CodedSymbol<S> {
    fn type_name() -> String {
        format!("CodedSymbol<{}>", S::TYPE_NAME)
    }
}

/// Symbol to code and code to token mapping.
///
/// Both directions are built together in one traversal of the tree and
/// never change afterward. Rows are kept in token order, so the escape (if
/// any) is row 0. Only the rows are persisted; the lookup maps are rebuilt
/// and the rows checked on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    bound = "S: Symbol",
    into = "Vec<CodedSymbol<S>>",
    try_from = "Vec<CodedSymbol<S>>"
)]
pub struct CodeTable<S: Symbol> {
    rows: Vec<CodedSymbol<S>>,
    by_symbol: HashMap<S, usize>,
    by_code: HashMap<Code, usize>,
    escape: Option<usize>,
    max_length: u8,
}

impl<S: Symbol> CodeTable<S> {
    /// Derive codes from a tree: left edges append `0`, right edges `1`.
    ///
    /// A lone-leaf root gets the one-bit code `0`.
    pub fn from_tree(tree: &Tree<S>) -> Self {
        let mut rows = Vec::with_capacity(tree.leaf_count());
        let mut stack = vec![(tree.root(), Code::default())];

        while let Some((index, code)) = stack.pop() {
            match tree.node(index) {
                Some(Node::Leaf(leaf)) => {
                    let code = if code.length == 0 {
                        Code::new(0, 1)
                    } else {
                        code
                    };
                    rows.push(CodedSymbol {
                        token: leaf.token.clone(),
                        code,
                        frequency: leaf.weight,
                    });
                }
                Some(Node::Internal(node)) => {
                    stack.push((node.right, code.push(true)));
                    stack.push((node.left, code.push(false)));
                }
                None => {}
            }
        }

        rows.sort_by(|a, b| a.token.cmp(&b.token));
        Self::from_rows(rows)
    }

    fn from_rows(rows: Vec<CodedSymbol<S>>) -> Self {
        let mut by_symbol = HashMap::with_capacity(rows.len());
        let mut by_code = HashMap::with_capacity(rows.len());
        let mut escape = None;
        let mut max_length = 0;

        for (index, row) in rows.iter().enumerate() {
            match &row.token {
                Token::Escape => escape = Some(index),
                Token::Symbol(symbol) => {
                    by_symbol.insert(symbol.clone(), index);
                }
            }
            by_code.insert(row.code, index);
            max_length = max_length.max(row.code.length);
        }

        Self {
            rows,
            by_symbol,
            by_code,
            escape,
            max_length,
        }
    }

    /// Code of a symbol, `None` if the symbol was never trained.
    #[inline]
    pub fn code_of(&self, symbol: &S) -> Option<Code> {
        self.by_symbol.get(symbol).map(|&i| self.rows[i].code)
    }

    /// Reserved escape code, if escapes are enabled.
    pub fn escape_code(&self) -> Option<Code> {
        self.escape.map(|i| self.rows[i].code)
    }

    /// Token for an exact code.
    pub fn token_of(&self, code: Code) -> Option<&Token<S>> {
        self.by_code.get(&code).map(|&i| &self.rows[i].token)
    }

    /// Rows in token order.
    pub fn rows(&self) -> &[CodedSymbol<S>] {
        &self.rows
    }

    /// Number of codes, escape included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no codes.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Longest code, escape included.
    pub fn max_length(&self) -> u8 {
        self.max_length
    }

    /// Check that no code is a prefix of another.
    pub fn verify_prefix_free(&self) -> bool {
        let mut codes: Vec<Code> = self.rows.iter().map(|r| r.code).collect();
        codes.sort_by_key(|c| (c.aligned(), c.length));
        codes.windows(2).all(|pair| !pair[0].is_prefix_of(&pair[1]))
    }

    /// Expected code length per symbol under the trained weights.
    pub fn average_length(&self) -> f64 {
        let total: u128 = self.rows.iter().map(|r| r.frequency as u128).sum();
        if total == 0 {
            return 0.0;
        }
        let weighted: u128 = self
            .rows
            .iter()
            .map(|r| r.frequency as u128 * r.code.length as u128)
            .sum();
        weighted as f64 / total as f64
    }

    /// Rebuild a table from rows, checking they form a prefix-free code.
    pub fn try_from_rows(mut rows: Vec<CodedSymbol<S>>) -> Result<Self> {
        rows.sort_by(|a, b| a.token.cmp(&b.token));
        let table = Self::from_rows(rows);
        if table.by_code.len() != table.rows.len() || !table.verify_prefix_free() {
            return Err(Error::invalid_state("prefix-free code", "overlapping code rows"));
        }
        Ok(table)
    }
}

impl<S: Symbol> From<CodeTable<S>> for Vec<CodedSymbol<S>> {
    fn from(table: CodeTable<S>) -> Self {
        table.rows
    }
}

impl<S: Symbol> TryFrom<Vec<CodedSymbol<S>>> for CodeTable<S> {
    type Error = Error;

    fn try_from(rows: Vec<CodedSymbol<S>>) -> Result<Self> {
        Self::try_from_rows(rows)
    }
}

impl<S: Symbol> Registered for CodeTable<S> {
    fn type_name() -> String {
        format!("CodeTable<{}>", S::TYPE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;
    use crate::frequency::FrequencyTable;
    use huffkit_core::CollectingListener;

    fn table_for(text: &str, config: CodecConfig) -> CodeTable<char> {
        let freq: FrequencyTable<char> = text.chars().collect();
        let tree = Tree::build(&freq, &config, &CollectingListener::new()).unwrap();
        CodeTable::from_tree(&tree)
    }

    #[test]
    fn test_code_display_and_prefix() {
        let a = Code::new(0b10, 2);
        let b = Code::new(0b101, 3);
        assert_eq!(a.to_string(), "10");
        assert!(a.is_prefix_of(&b));
        assert!(!b.is_prefix_of(&a));
        assert!(!Code::new(0b11, 2).is_prefix_of(&b));
        assert_eq!(Code::default().push(true).push(false), a);
    }

    #[test]
    fn test_single_symbol_gets_one_bit() {
        let table = table_for("aaaaa", CodecConfig::strict());
        assert_eq!(table.code_of(&'a'), Some(Code::new(0, 1)));
        assert_eq!(table.escape_code(), None);
        assert_eq!(table.max_length(), 1);
    }

    #[test]
    fn test_skewed_codes() {
        let mut freq = FrequencyTable::new();
        freq.train_count(&'a', 1000);
        freq.train_count(&'b', 10);
        freq.train_count(&'c', 1);
        let tree = Tree::build(&freq, &CodecConfig::strict(), &CollectingListener::new()).unwrap();
        let table = CodeTable::from_tree(&tree);

        assert_eq!(table.code_of(&'a').unwrap().length, 1);
        assert_eq!(table.code_of(&'b').unwrap().length, 2);
        assert_eq!(table.code_of(&'c').unwrap().length, 2);
        assert!(table.verify_prefix_free());
    }

    #[test]
    fn test_both_directions_agree() {
        let table = table_for("the quick brown fox", CodecConfig::default());
        assert!(table.escape_code().is_some());
        for row in table.rows() {
            assert_eq!(table.token_of(row.code), Some(&row.token));
            if let Token::Symbol(s) = &row.token {
                assert_eq!(table.code_of(s), Some(row.code));
            }
        }
        assert_eq!(table.rows()[0].token, Token::Escape);
        assert_eq!(table.code_of(&'z'), None);
    }

    #[test]
    fn test_prefix_violation_detected() {
        let rows = vec![
            CodedSymbol {
                token: Token::Symbol('a'),
                code: Code::new(0b0, 1),
                frequency: 1,
            },
            CodedSymbol {
                token: Token::Symbol('b'),
                code: Code::new(0b01, 2),
                frequency: 1,
            },
        ];
        assert!(matches!(
            CodeTable::try_from_rows(rows),
            Err(Error::InvalidState { .. })
        ));
    }

    #[test]
    fn test_persisted_rows_rebuild_lookups() {
        let table = table_for("abracadabra", CodecConfig::default());
        let bytes = bincode::serialize(&table).unwrap();
        let restored: CodeTable<char> = bincode::deserialize(&bytes).unwrap();

        assert_eq!(restored.rows(), table.rows());
        assert_eq!(restored.escape_code(), table.escape_code());
        assert_eq!(restored.max_length(), table.max_length());
        assert_eq!(restored.code_of(&'r'), table.code_of(&'r'));
    }

    #[test]
    fn test_overlapping_rows_fail_to_load() {
        let rows = vec![
            CodedSymbol {
                token: Token::Symbol('a'),
                code: Code::new(0b1, 1),
                frequency: 2,
            },
            CodedSymbol {
                token: Token::Symbol('b'),
                code: Code::new(0b1, 1),
                frequency: 1,
            },
        ];
        let bytes = bincode::serialize(&rows).unwrap();
        assert!(bincode::deserialize::<CodeTable<char>>(&bytes).is_err());
    }

    #[test]
    fn test_average_length() {
        let table = table_for("aabb", CodecConfig::strict());
        assert_eq!(table.average_length(), 1.0);
    }

    #[test]
    fn test_average_length_saturated_weights() {
        let mut freq = FrequencyTable::new();
        freq.train_count(&'a', u64::MAX);
        freq.train_count(&'b', 1);
        let tree = Tree::build(&freq, &CodecConfig::strict(), &CollectingListener::new()).unwrap();
        let table = CodeTable::from_tree(&tree);
        assert_eq!(table.average_length(), 1.0);
    }
}
