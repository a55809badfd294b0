//! Registry identifiers are part of the on-disk format.

use huffkit_core::{ManifestEntry, RegistrationError, TypeRegistry};
use huffkit_huffman::{
    huffman_registry, register_format, register_huffman, Code, HuffmanCodec, FORMAT_GROUP,
    HUFFMAN_GROUP,
};

/// Identifiers as published. Never edit existing rows.
const PUBLISHED: &[(&str, &str, u32)] = &[
    ("huffman", "HuffmanCodec<String>", 100),
    ("huffman", "CharacterCodec", 101),
    ("huffman", "StringListCodec", 102),
    ("huffman", "CodedSymbol<char>", 103),
    ("huffman", "CodedSymbol<String>", 104),
    ("huffman", "Code", 105),
    ("huffman", "Leaf<char>", 106),
    ("huffman", "Leaf<String>", 107),
    ("huffman", "InternalNode", 108),
    ("huffman", "Tree<char>", 109),
    ("huffman", "Tree<String>", 110),
    ("huffman", "FrequencyTable<char>", 111),
    ("huffman", "FrequencyTable<String>", 112),
    ("huffman", "FastDecoder<char>", 113),
    ("huffman", "FastDecoder<String>", 114),
    ("huffman", "DecodeTable", 115),
    ("huffman", "DecodeEntry", 116),
    ("huffman", "StringCodec", 117),
    ("huffman", "CodeTable<char>", 118),
    ("huffman", "CodeTable<String>", 119),
    ("huffman-format", "EncodedStream", 164),
    ("huffman-format", "CodecConfig", 165),
    ("huffman-format", "CodecVariant", 166),
];

fn published() -> Vec<ManifestEntry> {
    PUBLISHED
        .iter()
        .map(|&(group, type_name, id)| ManifestEntry::new(group, type_name, id))
        .collect()
}

#[test]
fn test_manifest_matches_published() {
    let registry = huffman_registry().unwrap();
    assert_eq!(registry.manifest(), published());
    registry.verify_against(&published()).unwrap();
}

#[test]
fn test_independent_builds_agree() {
    let first = huffman_registry().unwrap();
    let second = huffman_registry().unwrap();
    assert_eq!(first.manifest(), second.manifest());
}

#[test]
fn test_appending_is_compatible() {
    let registry = TypeRegistry::builder()
        .group(HUFFMAN_GROUP, |group| {
            register_huffman(group)?;
            group.register::<HuffmanCodec<char>>()?;
            Ok(())
        })
        .unwrap()
        .group(FORMAT_GROUP, register_format)
        .unwrap()
        .build();

    registry.verify_against(&published()).unwrap();
    assert_eq!(registry.identifier_of::<HuffmanCodec<char>>(), Some(120));
}

#[test]
fn test_reordering_is_rejected() {
    let registry = TypeRegistry::builder()
        .group(HUFFMAN_GROUP, |group| {
            group.register::<Code>()?;
            group.register::<HuffmanCodec<String>>()?;
            Ok(())
        })
        .unwrap()
        .build();

    let err = registry.verify_against(&published()).unwrap_err();
    assert!(matches!(
        err,
        RegistrationError::ManifestMismatch { ref type_name, expected: 100, actual: Some(101) }
            if type_name == "HuffmanCodec<String>"
    ));
}

#[test]
fn test_duplicate_registration_is_fatal() {
    let result = TypeRegistry::builder().group(HUFFMAN_GROUP, |group| {
        register_huffman(group)?;
        group.register::<Code>()?;
        Ok(())
    });
    assert!(matches!(
        result,
        Err(RegistrationError::DuplicateType { .. })
    ));
}
