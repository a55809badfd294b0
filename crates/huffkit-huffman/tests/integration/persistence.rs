//! Codec files: save, load and rebuild.

use huffkit_core::{CodecKind, EncodedStream, Error, SymbolCodec};
use huffkit_huffman::{
    huffman_registry, CharacterCodec, CodecConfig, CodecFile, CodecVariant,
    HuffmanCodec, Sequence, StringCodec, StringCodecConfig, StringListCodec, CODEC_EXTENSION,
};
use tempfile::tempdir;

fn words(text: &str) -> Vec<String> {
    text.split_whitespace().map(String::from).collect()
}

#[test]
fn test_string_codec_file_roundtrip() {
    let registry = huffman_registry().unwrap();
    let config = StringCodecConfig::default().with_min_string_frequency(2);
    let mut codec = StringCodec::trainable(config).unwrap();
    codec
        .train_all(words("red green red blue green red"))
        .unwrap();
    codec.build().unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join(format!("strings.{CODEC_EXTENSION}"));
    CodecFile::pack(&registry, &codec).unwrap().save(&path).unwrap();

    let loaded: StringCodec = CodecFile::load(&path).unwrap().unpack(&registry).unwrap();
    assert_eq!(loaded.min_string_frequency(), 2);
    assert_eq!(
        loaded.strings().code_table().unwrap().rows(),
        codec.strings().code_table().unwrap().rows()
    );

    let input = words("blue red purple");
    let stream = codec.encode(&input).unwrap();
    assert_eq!(loaded.decode(&stream).unwrap(), input);
}

#[test]
fn test_unbuilt_codec_keeps_training_after_load() {
    let registry = huffman_registry().unwrap();
    let mut codec = HuffmanCodec::<String>::trainable(CodecConfig::default());
    codec.train_all(words("half trained")).unwrap();

    let file = CodecFile::pack(&registry, &codec).unwrap();
    let mut loaded: HuffmanCodec<String> = file.unpack(&registry).unwrap();
    assert!(!loaded.is_built());

    loaded.train(&"more".to_string()).unwrap();
    loaded.build().unwrap();
    assert_eq!(loaded.frequencies().len(), 3);
}

#[test]
fn test_variant_and_list_files() {
    let registry = huffman_registry().unwrap();

    let mut variant = CodecVariant::trainable(CodecKind::Character, StringCodecConfig::default())
        .unwrap();
    variant.train(&Sequence::from("variant")).unwrap();
    variant.build().unwrap();
    let restored: CodecVariant = CodecFile::pack(&registry, &variant)
        .unwrap()
        .unpack(&registry)
        .unwrap();
    assert!(restored.verify_roundtrip(&Sequence::from("vain")).unwrap());

    let mut lists = StringListCodec::trainable(StringCodecConfig::default()).unwrap();
    lists.train(&words("a b c")).unwrap();
    lists.build().unwrap();
    let restored: StringListCodec = CodecFile::pack(&registry, &lists)
        .unwrap()
        .unpack(&registry)
        .unwrap();
    let input = vec![words("c a"), words("d")];
    assert_eq!(restored.decode(&lists.encode(&input).unwrap()).unwrap(), input);
}

#[test]
fn test_stream_file_roundtrip() {
    let registry = huffman_registry().unwrap();
    let mut codec = CharacterCodec::trainable(CodecConfig::default());
    codec.train_str("stream").unwrap();
    codec.build().unwrap();
    let stream = codec.encode_str("master").unwrap();

    let mut bytes = Vec::new();
    CodecFile::pack(&registry, &stream)
        .unwrap()
        .write_to(&mut bytes)
        .unwrap();
    let loaded: EncodedStream = CodecFile::read_from(&mut bytes.as_slice())
        .unwrap()
        .unpack(&registry)
        .unwrap();
    assert_eq!(loaded, stream);
    assert_eq!(codec.decode_string(&loaded).unwrap(), "master");
}

#[test]
fn test_wrong_payload_type() {
    let registry = huffman_registry().unwrap();
    let mut codec = CharacterCodec::trainable(CodecConfig::default());
    codec.train_str("x").unwrap();
    codec.build().unwrap();

    let file = CodecFile::pack(&registry, &codec).unwrap();
    let err = file.unpack::<StringCodec>(&registry).unwrap_err();
    assert!(matches!(err, Error::Registration(_)));
}
