//! Registration of the persisted Huffman types.
//!
//! The order below fixes the on-disk identifiers. Append new types to the
//! end of a group; never reorder or remove.

use huffkit_core::{
    CustomSerializer, EncodedStream, Error, GroupBuilder, RegistrationError, Result, TypeRegistry,
};

use crate::code::{Code, CodeTable, CodedSymbol};
use crate::codec::{CharacterCodec, CodecVariant, HuffmanCodec, StringCodec, StringListCodec};
use crate::config::CodecConfig;
use crate::decoder::{DecodeEntry, DecodeTable, FastDecoder};
use crate::frequency::FrequencyTable;
use crate::tree::{InternalNode, Leaf, Tree};

/// Group holding codecs and their building blocks.
pub const HUFFMAN_GROUP: &str = "huffman";

/// Group holding streams and configuration.
pub const FORMAT_GROUP: &str = "huffman-format";

/// Five bytes: code bits (u32 LE) then length.
pub const CODE_SERIALIZER: CustomSerializer<Code> = CustomSerializer {
    write: write_code,
    read: read_code,
};

fn write_code(code: &Code) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(5);
    bytes.extend_from_slice(&code.bits.to_le_bytes());
    bytes.push(code.length);
    Ok(bytes)
}

fn read_code(bytes: &[u8]) -> Result<Code> {
    let [b0, b1, b2, b3, length] = bytes else {
        return Err(Error::Serialization(format!(
            "code payload must be 5 bytes, got {}",
            bytes.len()
        )));
    };
    Ok(Code::new(u32::from_le_bytes([*b0, *b1, *b2, *b3]), *length))
}

/// Register the `huffman` group.
pub fn register_huffman(
    group: &mut GroupBuilder<'_>,
) -> core::result::Result<(), RegistrationError> {
    group.register::<HuffmanCodec<String>>()?;
    group.register::<CharacterCodec>()?;
    group.register::<StringListCodec>()?;
    group.register::<CodedSymbol<char>>()?;
    group.register::<CodedSymbol<String>>()?;
    group.register_with::<Code>(CODE_SERIALIZER)?;
    group.register::<Leaf<char>>()?;
    group.register::<Leaf<String>>()?;
    group.register::<InternalNode>()?;
    group.register::<Tree<char>>()?;
    group.register::<Tree<String>>()?;
    group.register::<FrequencyTable<char>>()?;
    group.register::<FrequencyTable<String>>()?;
    group.register::<FastDecoder<char>>()?;
    group.register::<FastDecoder<String>>()?;
    group.register::<DecodeTable>()?;
    group.register::<DecodeEntry>()?;
    group.register::<StringCodec>()?;
    group.register::<CodeTable<char>>()?;
    group.register::<CodeTable<String>>()?;
    Ok(())
}

/// Register the `huffman-format` group.
pub fn register_format(
    group: &mut GroupBuilder<'_>,
) -> core::result::Result<(), RegistrationError> {
    group.register::<EncodedStream>()?;
    group.register::<CodecConfig>()?;
    group.register::<CodecVariant>()?;
    Ok(())
}

/// Build the registry of every persisted Huffman type.
pub fn huffman_registry() -> core::result::Result<TypeRegistry, RegistrationError> {
    Ok(TypeRegistry::builder()
        .group(HUFFMAN_GROUP, register_huffman)?
        .group(FORMAT_GROUP, register_format)?
        .build())
}
