//! Concrete codec scenarios.

use std::sync::Arc;

use huffkit_core::{CollectingListener, EncodedStream, Error, Metrics, SymbolCodec};
use huffkit_huffman::{
    CharacterCodec, Code, CodecConfig, FrequencyTable, HuffmanCodec, StringCodec,
    StringCodecConfig, StringListCodec,
};

fn built(corpus: &str, config: CodecConfig) -> CharacterCodec {
    let mut codec = CharacterCodec::trainable(config);
    codec.train_str(corpus).unwrap();
    codec.build().unwrap();
    codec
}

#[test]
fn test_degenerate_alphabet() {
    let codec = built("aaaaa", CodecConfig::strict());
    let table = codec.inner().code_table().unwrap();
    assert_eq!(table.code_of(&'a'), Some(Code::new(0, 1)));
    assert_eq!(table.len(), 1);

    let stream = codec.encode_str("aaa").unwrap();
    assert_eq!(stream.bit_len, 3);
    assert_eq!(codec.decode_string(&stream).unwrap(), "aaa");
}

#[test]
fn test_skewed_frequencies() {
    let mut freq = FrequencyTable::new();
    freq.train_count(&'a', 1000);
    freq.train_count(&'b', 10);
    freq.train_count(&'c', 1);
    let codec = CharacterCodec::from_frequencies(freq, CodecConfig::strict()).unwrap();
    let table = codec.inner().code_table().unwrap();

    assert_eq!(table.code_of(&'a').unwrap().length, 1);
    assert_eq!(table.code_of(&'b').unwrap().length, 2);
    assert_eq!(table.code_of(&'c').unwrap().length, 2);

    let input: Vec<char> = "aaaaabac".chars().collect();
    let stream = codec.encode(&input).unwrap();
    assert_eq!(stream.bit_len, 6 + 2 + 2);
    assert_eq!(codec.decode(&stream).unwrap(), input);
}

#[test]
fn test_escape_path() {
    let codec = built("ab", CodecConfig::default());
    let (stream, stats) = codec.encode_with_stats(&['a', 'b', 'x']).unwrap();
    assert_eq!(stats.symbols, 3);
    assert_eq!(stats.escaped_symbols, 1);
    assert_eq!(codec.decode_string(&stream).unwrap(), "abx");
}

#[test]
fn test_unencodable_without_escape() {
    let codec = built("ab", CodecConfig::strict());
    let err = codec.encode_str("abx").unwrap_err();
    assert!(matches!(err, Error::UnencodableSymbol { .. }));
    assert_eq!(err.category(), "unencodable_symbol");
}

#[test]
fn test_static_codec_rejects_training() {
    let freq: FrequencyTable<char> = "static".chars().collect();
    let mut codec = CharacterCodec::from_frequencies(freq, CodecConfig::default()).unwrap();
    assert!(matches!(codec.train(&'s'), Err(Error::Unsupported(_))));
    assert!(codec.verify_roundtrip(&['t', 'a', 'z']).unwrap());
}

#[test]
fn test_lifecycle_errors() {
    let mut codec = CharacterCodec::trainable(CodecConfig::default());
    assert!(matches!(
        codec.encode(&['a']),
        Err(Error::InvalidState {
            expected: "built",
            ..
        })
    ));
    assert!(matches!(codec.build(), Err(Error::EmptyAlphabet)));

    codec.train_str("abc").unwrap();
    codec.build().unwrap();
    assert!(matches!(
        codec.train(&'d'),
        Err(Error::InvalidState {
            expected: "training",
            actual: "built"
        })
    ));
}

#[test]
fn test_malformed_streams() {
    let codec = built("hello world", CodecConfig::default());
    let good = codec.encode_str("hello").unwrap();

    let more = EncodedStream {
        symbol_count: good.symbol_count + 1,
        ..good.clone()
    };
    assert!(matches!(
        codec.decode(&more),
        Err(Error::MalformedStream { .. })
    ));

    let fewer = EncodedStream {
        symbol_count: good.symbol_count - 1,
        ..good.clone()
    };
    assert!(matches!(
        codec.decode(&fewer),
        Err(Error::MalformedStream { .. })
    ));

    let mut truncated = good.clone();
    truncated.bit_len = 1;
    assert!(codec.decode(&truncated).is_err());
}

#[test]
fn test_bound_widening_is_reported() {
    let listener = Arc::new(CollectingListener::new());
    let config = CodecConfig::strict().with_max_code_length(3);
    let mut codec = HuffmanCodec::<char>::trainable(config).with_listener(listener.clone());
    codec.train_all("abcdefghijklmnopqrstuvwxyz".chars()).unwrap();
    codec.build().unwrap();

    assert_eq!(listener.len(), 1);
    assert_eq!(codec.code_table().unwrap().max_length(), 5);

    let input: Vec<char> = "thequickbrownfox".chars().collect();
    let stream = codec.encode(&input).unwrap();
    assert_eq!(codec.decode(&stream).unwrap(), input);
}

#[test]
fn test_length_limit_holds() {
    let mut freq = FrequencyTable::new();
    let (mut a, mut b) = (1u64, 1u64);
    for c in 'a'..='t' {
        freq.train_count(&c, a);
        (a, b) = (b, a + b);
    }
    let config = CodecConfig::strict().with_max_code_length(8);
    let codec = CharacterCodec::from_frequencies(freq, config).unwrap();
    let table = codec.inner().code_table().unwrap();
    assert!(table.max_length() <= 8);
    assert!(table.verify_prefix_free());

    let input: Vec<char> = ('a'..='t').rev().collect();
    assert!(codec.verify_roundtrip(&input).unwrap());
}

#[test]
fn test_string_codec_composition() {
    let config = StringCodecConfig::default().with_min_string_frequency(2);
    let mut codec = StringCodec::trainable(config).unwrap();
    codec
        .train_strs(["get", "put", "get", "delete", "get", "put"])
        .unwrap();
    codec.build().unwrap();

    let input: Vec<String> = ["get", "delete", "patch", "ü"].map(String::from).to_vec();
    let (stream, stats) = codec.encode_with_stats(&input).unwrap();
    // "delete" fell below the minimum; "patch" and "ü" were never seen
    assert_eq!(stats.escaped_symbols, 3);
    assert_eq!(codec.decode(&stream).unwrap(), input);
}

#[test]
fn test_string_lists_and_metrics() {
    let mut codec = StringListCodec::trainable(StringCodecConfig::default()).unwrap();
    let corpus = vec![
        vec!["user".to_string(), "id".to_string()],
        vec!["user".to_string(), "name".to_string()],
        vec!["order".to_string()],
    ];
    codec.train_all(&corpus).unwrap();
    codec.build().unwrap();

    let mut metrics = Metrics::default();
    for list in &corpus {
        let (_, stats) = codec
            .strings()
            .encode_with_stats(list)
            .unwrap();
        metrics.record(&stats);
    }
    assert_eq!(metrics.total_operations, 3);
    assert_eq!(metrics.total_symbols, 5);
    assert!(codec.verify_roundtrip(&corpus).unwrap());
}
