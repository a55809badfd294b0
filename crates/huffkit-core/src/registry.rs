//! Append-only type registry for binary persistence.
//!
//! Every persisted type is registered once, inside a named group, and gets a
//! numeric identifier that is written in front of its serialized bytes.
//! Identifiers are part of the on-disk format, so they must never move:
//!
//! - groups are placed in registration order, each owning a fixed block of
//!   [`GROUP_CAPACITY`] identifiers starting at [`FIRST_IDENTIFIER`]
//! - types take the next identifier of their group in call order
//! - new types are only ever appended to the end of a group
//!
//! [`TypeRegistry::manifest`] exposes the resulting list and
//! [`TypeRegistry::verify_against`] checks it against a published one.
//!
//! ```ignore
//! let registry = TypeRegistry::builder()
//!     .group("huffman", |group| {
//!         group.register::<Code>()?;
//!         group.register::<Tree<char>>()?;
//!         Ok(())
//!     })?
//!     .build();
//! let bytes = registry.serialize(&code)?;
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, RegistrationError, Result};

/// Identifier of the first type in the first group.
pub const FIRST_IDENTIFIER: u32 = 100;

/// Number of identifiers reserved for each group.
pub const GROUP_CAPACITY: u32 = 64;

/// Bytes used by the identifier prefix.
const IDENTIFIER_BYTES: usize = 4;

/// A type that can be stored through a [`TypeRegistry`].
pub trait Registered: Serialize + DeserializeOwned + 'static {
    /// Stable name recorded in the manifest.
    ///
    /// This must not change once published; it is how manifests are matched.
    fn type_name() -> String;
}

/// Hand-written byte encoding for a registered type.
///
/// Used instead of the default bincode payload when a type has a more
/// compact or version-tolerant representation.
pub struct CustomSerializer<T> {
    /// Encode a value to bytes.
    pub write: fn(&T) -> Result<Vec<u8>>,
    /// Decode a value from bytes.
    pub read: fn(&[u8]) -> Result<T>,
}

impl<T> Clone for CustomSerializer<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for CustomSerializer<T> {}

impl<T> fmt::Debug for CustomSerializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomSerializer").finish_non_exhaustive()
    }
}

/// One registered type.
pub struct TypeEntry {
    type_name: String,
    identifier: u32,
    serializer: Option<Box<dyn Any + Send + Sync>>,
}

impl TypeEntry {
    /// Manifest name of the type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Identifier written before the type's payload.
    pub fn identifier(&self) -> u32 {
        self.identifier
    }

    /// Check if the type uses a [`CustomSerializer`].
    pub fn has_custom_serializer(&self) -> bool {
        self.serializer.is_some()
    }

    fn custom<T: 'static>(&self) -> Option<&CustomSerializer<T>> {
        self.serializer
            .as_ref()
            .and_then(|s| s.downcast_ref::<CustomSerializer<T>>())
    }
}

impl fmt::Debug for TypeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeEntry")
            .field("type_name", &self.type_name)
            .field("identifier", &self.identifier)
            .field("custom", &self.serializer.is_some())
            .finish()
    }
}

/// Named, ordered block of registered types.
#[derive(Debug)]
pub struct RegistrationGroup {
    name: String,
    base: u32,
    entries: Vec<TypeEntry>,
}

impl RegistrationGroup {
    /// Group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First identifier of the group's block.
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Types in registration order.
    pub fn entries(&self) -> &[TypeEntry] {
        &self.entries
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the group has no types yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One row of a registry manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Group the type belongs to.
    pub group: String,
    /// Manifest name of the type.
    pub type_name: String,
    /// Assigned identifier.
    pub identifier: u32,
}

impl ManifestEntry {
    /// Create a manifest row.
    pub fn new(group: impl Into<String>, type_name: impl Into<String>, identifier: u32) -> Self {
        Self {
            group: group.into(),
            type_name: type_name.into(),
            identifier,
        }
    }
}

/// Location of a type inside the registry: (group index, entry index).
type Slot = (usize, usize);

/// Builder for a [`TypeRegistry`].
#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    groups: Vec<RegistrationGroup>,
    by_type: HashMap<TypeId, Slot>,
    by_identifier: HashMap<u32, Slot>,
}

impl TypeRegistryBuilder {
    /// Add a group in the next free identifier block.
    pub fn group<F>(self, name: &str, block: F) -> core::result::Result<Self, RegistrationError>
    where
        F: FnOnce(&mut GroupBuilder<'_>) -> core::result::Result<(), RegistrationError>,
    {
        let base = FIRST_IDENTIFIER + self.groups.len() as u32 * GROUP_CAPACITY;
        self.group_at(name, base, block)
    }

    /// Add a group whose block starts at an explicit identifier.
    ///
    /// Used to pin groups whose identifiers were published elsewhere.
    pub fn group_at<F>(
        mut self,
        name: &str,
        base: u32,
        block: F,
    ) -> core::result::Result<Self, RegistrationError>
    where
        F: FnOnce(&mut GroupBuilder<'_>) -> core::result::Result<(), RegistrationError>,
    {
        if self.groups.iter().any(|g| g.name == name) {
            return Err(RegistrationError::DuplicateGroup(name.to_string()));
        }
        self.groups.push(RegistrationGroup {
            name: name.to_string(),
            base,
            entries: Vec::new(),
        });
        let index = self.groups.len() - 1;

        let mut group = GroupBuilder {
            registry: &mut self,
            group: index,
        };
        block(&mut group)?;

        debug!(
            group = name,
            base,
            types = self.groups[index].len(),
            "registered type group"
        );
        Ok(self)
    }

    /// Freeze the registry.
    pub fn build(self) -> TypeRegistry {
        TypeRegistry {
            groups: self.groups,
            by_type: self.by_type,
            by_identifier: self.by_identifier,
        }
    }

    fn insert(
        &mut self,
        group: usize,
        type_id: TypeId,
        type_name: String,
        serializer: Option<Box<dyn Any + Send + Sync>>,
    ) -> core::result::Result<u32, RegistrationError> {
        let group_name = self.groups[group].name.clone();

        if self.by_type.contains_key(&type_id) {
            return Err(RegistrationError::DuplicateType {
                type_name,
                group: group_name,
            });
        }

        let position = self.groups[group].entries.len() as u32;
        if position >= GROUP_CAPACITY {
            return Err(RegistrationError::GroupFull {
                group: group_name,
                capacity: GROUP_CAPACITY,
            });
        }

        let identifier = self.groups[group]
            .base
            .checked_add(position)
            .ok_or_else(|| RegistrationError::GroupFull {
                group: group_name.clone(),
                capacity: GROUP_CAPACITY,
            })?;
        if let Some(&(g, e)) = self.by_identifier.get(&identifier) {
            return Err(RegistrationError::IdentifierCollision {
                identifier,
                type_name,
                existing: self.groups[g].entries[e].type_name.clone(),
            });
        }

        let slot = (group, position as usize);
        self.by_type.insert(type_id, slot);
        self.by_identifier.insert(identifier, slot);
        self.groups[group].entries.push(TypeEntry {
            type_name,
            identifier,
            serializer,
        });
        Ok(identifier)
    }
}

/// Registration handle for one group, passed to the group's block.
pub struct GroupBuilder<'a> {
    registry: &'a mut TypeRegistryBuilder,
    group: usize,
}

impl GroupBuilder<'_> {
    /// Register `T` with the default bincode payload.
    pub fn register<T: Registered>(&mut self) -> core::result::Result<u32, RegistrationError> {
        self.registry
            .insert(self.group, TypeId::of::<T>(), T::type_name(), None)
    }

    /// Register `T` with a custom serializer.
    pub fn register_with<T: Registered>(
        &mut self,
        serializer: CustomSerializer<T>,
    ) -> core::result::Result<u32, RegistrationError> {
        self.registry.insert(
            self.group,
            TypeId::of::<T>(),
            T::type_name(),
            Some(Box::new(serializer)),
        )
    }

    /// Name of the group being built.
    pub fn name(&self) -> &str {
        &self.registry.groups[self.group].name
    }
}

/// Immutable registry of persisted types.
///
/// Built once by a composition root, then shared read-only.
#[derive(Debug)]
pub struct TypeRegistry {
    groups: Vec<RegistrationGroup>,
    by_type: HashMap<TypeId, Slot>,
    by_identifier: HashMap<u32, Slot>,
}

impl TypeRegistry {
    /// Start building a registry.
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    /// Groups in registration order.
    pub fn groups(&self) -> &[RegistrationGroup] {
        &self.groups
    }

    /// Find a group by name.
    pub fn group(&self, name: &str) -> Option<&RegistrationGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Total number of registered types.
    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    /// Check if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    /// Identifier assigned to `T`, if registered.
    pub fn identifier_of<T: 'static>(&self) -> Option<u32> {
        self.entry_of::<T>().map(TypeEntry::identifier)
    }

    /// Entry for an identifier.
    pub fn entry(&self, identifier: u32) -> Option<&TypeEntry> {
        self.by_identifier
            .get(&identifier)
            .map(|&(g, e)| &self.groups[g].entries[e])
    }

    fn entry_of<T: 'static>(&self) -> Option<&TypeEntry> {
        self.by_type
            .get(&TypeId::of::<T>())
            .map(|&(g, e)| &self.groups[g].entries[e])
    }

    /// Ordered `(group, type, identifier)` list.
    pub fn manifest(&self) -> Vec<ManifestEntry> {
        self.groups
            .iter()
            .flat_map(|group| {
                group
                    .entries
                    .iter()
                    .map(move |e| ManifestEntry::new(&group.name, &e.type_name, e.identifier))
            })
            .collect()
    }

    /// Check that a published manifest is still honored.
    ///
    /// Each published group must be a prefix of the current group: same
    /// types, same order, same identifiers. Types appended after the
    /// published ones are fine.
    pub fn verify_against(
        &self,
        published: &[ManifestEntry],
    ) -> core::result::Result<(), RegistrationError> {
        let mut seen: HashMap<&str, usize> = HashMap::new();

        for expected in published {
            let position = seen.entry(expected.group.as_str()).or_insert(0);
            let current = self
                .group(&expected.group)
                .and_then(|g| g.entries.get(*position));
            *position += 1;

            let matches = current.is_some_and(|e| {
                e.type_name == expected.type_name && e.identifier == expected.identifier
            });
            if !matches {
                let actual = self
                    .groups
                    .iter()
                    .flat_map(|g| g.entries.iter())
                    .find(|e| e.type_name == expected.type_name)
                    .map(TypeEntry::identifier);
                return Err(RegistrationError::ManifestMismatch {
                    type_name: expected.type_name.clone(),
                    expected: expected.identifier,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Serialize a value behind its identifier.
    ///
    /// Layout: identifier (u32, little-endian) followed by the payload.
    pub fn serialize<T: Registered>(&self, value: &T) -> Result<Vec<u8>> {
        let entry = self
            .entry_of::<T>()
            .ok_or_else(|| RegistrationError::UnregisteredType(T::type_name()))?;

        let payload = match entry.custom::<T>() {
            Some(custom) => (custom.write)(value)?,
            None => bincode::serialize(value)?,
        };

        let mut bytes = Vec::with_capacity(IDENTIFIER_BYTES + payload.len());
        bytes.extend_from_slice(&entry.identifier.to_le_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    /// Deserialize a value written by [`TypeRegistry::serialize`].
    pub fn deserialize<T: Registered>(&self, bytes: &[u8]) -> Result<T> {
        let entry = self
            .entry_of::<T>()
            .ok_or_else(|| RegistrationError::UnregisteredType(T::type_name()))?;

        let actual = Self::peek_identifier(bytes)?;
        if actual != entry.identifier {
            return Err(RegistrationError::IdentifierMismatch {
                type_name: entry.type_name.clone(),
                expected: entry.identifier,
                actual,
            }
            .into());
        }

        let payload = &bytes[IDENTIFIER_BYTES..];
        match entry.custom::<T>() {
            Some(custom) => (custom.read)(payload),
            None => Ok(bincode::deserialize(payload)?),
        }
    }

    /// Read the identifier prefix of a serialized value.
    pub fn peek_identifier(bytes: &[u8]) -> Result<u32> {
        let prefix: [u8; IDENTIFIER_BYTES] = bytes
            .get(..IDENTIFIER_BYTES)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| {
                Error::Serialization(format!(
                    "payload of {} bytes is too short for an identifier",
                    bytes.len()
                ))
            })?;
        Ok(u32::from_le_bytes(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Alpha(u32);

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Beta {
        name: String,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Gamma(Vec<u8>);

    impl Registered for Alpha {
        fn type_name() -> String {
            "Alpha".into()
        }
    }

    impl Registered for Beta {
        fn type_name() -> String {
            "Beta".into()
        }
    }

    impl Registered for Gamma {
        fn type_name() -> String {
            "Gamma".into()
        }
    }

    fn write_gamma(value: &Gamma) -> Result<Vec<u8>> {
        let mut bytes = vec![value.0.len() as u8];
        bytes.extend_from_slice(&value.0);
        Ok(bytes)
    }

    fn read_gamma(bytes: &[u8]) -> Result<Gamma> {
        match bytes.split_first() {
            Some((&len, rest)) if rest.len() == len as usize => Ok(Gamma(rest.to_vec())),
            _ => Err(Error::Serialization("bad gamma".into())),
        }
    }

    fn sample_registry() -> TypeRegistry {
        TypeRegistry::builder()
            .group("first", |group| {
                group.register::<Alpha>()?;
                group.register::<Beta>()?;
                Ok(())
            })
            .unwrap()
            .group("second", |group| {
                group.register_with::<Gamma>(CustomSerializer {
                    write: write_gamma,
                    read: read_gamma,
                })?;
                Ok(())
            })
            .unwrap()
            .build()
    }

    #[test]
    fn test_identifiers_follow_group_blocks() {
        let registry = sample_registry();
        assert_eq!(registry.identifier_of::<Alpha>(), Some(100));
        assert_eq!(registry.identifier_of::<Beta>(), Some(101));
        assert_eq!(registry.identifier_of::<Gamma>(), Some(164));
        assert_eq!(registry.len(), 3);
        assert!(registry.entry(164).unwrap().has_custom_serializer());
    }

    #[test]
    fn test_manifest_order() {
        let manifest = sample_registry().manifest();
        assert_eq!(
            manifest,
            vec![
                ManifestEntry::new("first", "Alpha", 100),
                ManifestEntry::new("first", "Beta", 101),
                ManifestEntry::new("second", "Gamma", 164),
            ]
        );
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let result = TypeRegistry::builder().group("first", |group| {
            group.register::<Alpha>()?;
            group.register::<Alpha>()?;
            Ok(())
        });
        assert!(matches!(
            result.unwrap_err(),
            RegistrationError::DuplicateType { .. }
        ));
    }

    #[test]
    fn test_duplicate_type_across_groups_rejected() {
        let result = TypeRegistry::builder()
            .group("first", |group| group.register::<Alpha>().map(|_| ()))
            .and_then(|b| b.group("second", |group| group.register::<Alpha>().map(|_| ())));
        assert!(matches!(
            result.unwrap_err(),
            RegistrationError::DuplicateType { group, .. } if group == "second"
        ));
    }

    #[test]
    fn test_duplicate_group_rejected() {
        let result = TypeRegistry::builder()
            .group("first", |_| Ok(()))
            .and_then(|b| b.group("first", |_| Ok(())));
        assert_eq!(
            result.unwrap_err(),
            RegistrationError::DuplicateGroup("first".into())
        );
    }

    #[test]
    fn test_overlapping_blocks_collide() {
        let result = TypeRegistry::builder()
            .group("first", |group| {
                group.register::<Alpha>()?;
                group.register::<Beta>()?;
                Ok(())
            })
            .and_then(|b| b.group_at("pinned", 101, |group| group.register::<Gamma>().map(|_| ())));
        assert!(matches!(
            result.unwrap_err(),
            RegistrationError::IdentifierCollision { identifier: 101, .. }
        ));
    }

    #[test]
    fn test_appending_is_compatible() {
        let published = vec![ManifestEntry::new("first", "Alpha", 100)];
        let registry = sample_registry();
        assert!(registry.verify_against(&published).is_ok());
        assert!(registry.verify_against(&registry.manifest()).is_ok());
    }

    #[test]
    fn test_reordering_is_detected() {
        let registry = TypeRegistry::builder()
            .group("first", |group| {
                group.register::<Beta>()?;
                group.register::<Alpha>()?;
                Ok(())
            })
            .unwrap()
            .build();
        let published = vec![
            ManifestEntry::new("first", "Alpha", 100),
            ManifestEntry::new("first", "Beta", 101),
        ];
        assert_eq!(
            registry.verify_against(&published).unwrap_err(),
            RegistrationError::ManifestMismatch {
                type_name: "Alpha".into(),
                expected: 100,
                actual: Some(101),
            }
        );
    }

    #[test]
    fn test_removal_is_detected() {
        let registry = TypeRegistry::builder()
            .group("first", |group| group.register::<Alpha>().map(|_| ()))
            .unwrap()
            .build();
        let published = vec![
            ManifestEntry::new("first", "Alpha", 100),
            ManifestEntry::new("first", "Beta", 101),
        ];
        assert!(matches!(
            registry.verify_against(&published),
            Err(RegistrationError::ManifestMismatch { actual: None, .. })
        ));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let registry = sample_registry();

        let beta = Beta {
            name: "tree".into(),
        };
        let bytes = registry.serialize(&beta).unwrap();
        assert_eq!(TypeRegistry::peek_identifier(&bytes).unwrap(), 101);
        assert_eq!(registry.deserialize::<Beta>(&bytes).unwrap(), beta);

        let gamma = Gamma(vec![1, 2, 3]);
        let bytes = registry.serialize(&gamma).unwrap();
        assert_eq!(&bytes[4..], &[3, 1, 2, 3]);
        assert_eq!(registry.deserialize::<Gamma>(&bytes).unwrap(), gamma);
    }

    #[test]
    fn test_deserialize_wrong_type() {
        let registry = sample_registry();
        let bytes = registry.serialize(&Alpha(7)).unwrap();
        let err = registry.deserialize::<Beta>(&bytes).unwrap_err();
        assert!(matches!(
            err,
            Error::Registration(RegistrationError::IdentifierMismatch {
                expected: 101,
                actual: 100,
                ..
            })
        ));
    }

    #[test]
    fn test_unregistered_type() {
        let registry = TypeRegistry::builder().build();
        let err = registry.serialize(&Alpha(1)).unwrap_err();
        assert!(matches!(
            err,
            Error::Registration(RegistrationError::UnregisteredType(_))
        ));
        assert!(TypeRegistry::peek_identifier(&[1, 2]).is_err());
    }

    #[test]
    fn test_group_full() {
        let mut builder = TypeRegistry::builder().group("tiny", |_| Ok(())).unwrap();
        builder.groups[0].entries = (0..GROUP_CAPACITY)
            .map(|i| TypeEntry {
                type_name: format!("filler{i}"),
                identifier: FIRST_IDENTIFIER + i,
                serializer: None,
            })
            .collect();
        let err = builder
            .insert(0, TypeId::of::<Alpha>(), "Alpha".into(), None)
            .unwrap_err();
        assert!(matches!(err, RegistrationError::GroupFull { capacity: 64, .. }));
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TypeRegistry>();
    }
}
