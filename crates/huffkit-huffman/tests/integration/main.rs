//! Integration tests for the Huffman codecs.
//!
//! These tests drive the public API end to end: training, building,
//! encoding, decoding, registry identifiers and codec files.

mod persistence;
mod registry_stability;
mod scenarios;
