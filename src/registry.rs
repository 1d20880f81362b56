//! Process-wide type registry and custom-serializer dispatch.
//!
//! The registry caches a field descriptor per record type and the set of
//! types whose wire form is supplied by user code instead of derived
//! structurally. Both tables fill in through explicit
//! [`register_type`](crate::register_type) calls or lazily the first time a
//! record passes through an encoder or decoder. Lookup is the only hot-path
//! operation and takes the read half of a single lock; registration is
//! amortized at startup, so write contention is not a concern.

use std::any::{type_name, TypeId};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use once_cell::sync::Lazy;

use crate::errors::{Error, Result};
use crate::value::Packable;

/// The capability set that overrides structural encoding for a type.
///
/// A type either derives its wire form structurally or supplies all three of
/// these operations; the trait bundles them so an implementation cannot
/// provide only some. Dispatch to a `Serializer` happens when the top-level
/// call enabled it (the `_x` entry points) and the type is known to the
/// registry.
pub trait Serializer {
    /// Exact number of bytes [`encode`](Serializer::encode) will write.
    ///
    /// Called on a freshly decoded value to learn how many input bytes
    /// [`decode`](Serializer::decode) consumed, so it must be consistent
    /// with the decoded state.
    fn size(&self) -> usize;

    /// Write the value into `dst` and return the number of bytes written,
    /// which must equal [`size`](Serializer::size).
    fn encode(&self, dst: &mut [u8]) -> Result<usize>;

    /// Parse the value from the front of `src`.
    fn decode(&mut self, src: &[u8]) -> Result<()>;
}

/// Registered description of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDesc {
    /// Field name as declared.
    pub name: &'static str,
    /// Declared shape, as written in the record definition.
    pub shape: &'static str,
    /// The field's annotation, or `""` when unannotated.
    pub tag: &'static str,
}

struct StructEntry {
    name: &'static str,
    fields: &'static [FieldDesc],
}

#[derive(Default)]
struct Registry {
    structs: HashMap<TypeId, StructEntry>,
    serializers: HashSet<TypeId>,
}

static REGISTRY: Lazy<RwLock<Registry>> = Lazy::new(|| RwLock::new(Registry::default()));

fn read_registry() -> std::sync::RwLockReadGuard<'static, Registry> {
    REGISTRY.read().unwrap_or_else(|e| e.into_inner())
}

fn write_registry() -> std::sync::RwLockWriteGuard<'static, Registry> {
    REGISTRY.write().unwrap_or_else(|e| e.into_inner())
}

/// Whether the record annotation `tag` is one the codec understands.
fn known_tag(tag: &str) -> bool {
    matches!(tag, "" | "ignore" | "packed")
}

pub(crate) fn serializer_registered(id: TypeId) -> bool {
    read_registry().serializers.contains(&id)
}

/// Returns the registered field descriptors of `T`, if any.
pub fn registered_fields<T: Packable>() -> Option<&'static [FieldDesc]> {
    read_registry()
        .structs
        .get(&TypeId::of::<T>())
        .map(|e| e.fields)
}

/// Returns whether `T` is registered as a custom serializer.
pub fn has_serializer<T: Packable>() -> bool {
    serializer_registered(TypeId::of::<T>())
}

#[doc(hidden)]
pub fn __note_struct<T: 'static>(fields: &'static [FieldDesc]) -> bool {
    let id = TypeId::of::<T>();
    if read_registry().structs.contains_key(&id) {
        return false;
    }
    match write_registry().structs.entry(id) {
        Entry::Occupied(_) => false,
        Entry::Vacant(slot) => {
            let _ = slot.insert(StructEntry {
                name: type_name::<T>(),
                fields,
            });
            true
        }
    }
}

#[doc(hidden)]
pub fn __note_serializer<T: 'static>() {
    let _ = write_registry().serializers.insert(TypeId::of::<T>());
}

pub(crate) fn register_serializer_explicit<T: 'static>() -> Result<()> {
    if write_registry().serializers.insert(TypeId::of::<T>()) {
        Ok(())
    } else {
        Err(Error::DuplicateRegistration(type_name::<T>()))
    }
}

#[doc(hidden)]
pub fn __register_struct<T: 'static>(fields: &'static [FieldDesc]) -> Result<()> {
    for field in fields {
        if !known_tag(field.tag) {
            return Err(Error::UnrecognizedAnnotation(field.tag));
        }
    }
    let id = TypeId::of::<T>();
    match write_registry().structs.entry(id) {
        Entry::Occupied(existing) => Err(Error::DuplicateRegistration(existing.get().name)),
        Entry::Vacant(slot) => {
            let _ = slot.insert(StructEntry {
                name: type_name::<T>(),
                fields,
            });
            Ok(())
        }
    }
}

/// Switch threading serializer dispatch through a walk.
///
/// `Check` consults the registry once per encountered value type; the result
/// is cached into the sub-walk as `CheckFalse` or `CheckOk`, so all elements
/// of a sequence and all pairs of a mapping share one registry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializerSwitch {
    /// No serializer dispatch occurs.
    Disable,
    /// Dispatch is enabled but this type has not been looked up yet.
    Check,
    /// Looked up: not a custom serializer.
    CheckFalse,
    /// Looked up: a custom serializer.
    CheckOk,
}

impl SerializerSwitch {
    pub(crate) fn top_level(enable: bool) -> SerializerSwitch {
        if enable {
            SerializerSwitch::Check
        } else {
            SerializerSwitch::Disable
        }
    }

    /// Returns whether serializer dispatch is enabled at all.
    pub fn enabled(self) -> bool {
        self != SerializerSwitch::Disable
    }

    /// Returns whether the registry still needs to be consulted.
    pub fn need_check(self) -> bool {
        self == SerializerSwitch::Check
    }

    /// Returns whether the lookup already confirmed a custom serializer.
    pub fn check_ok(self) -> bool {
        self == SerializerSwitch::CheckOk
    }

    /// The switch to carry into the elements of an aggregate whose element
    /// type is `T`. Performs the registry decision once for the whole
    /// aggregate.
    pub fn sub_switch<T: Packable>(self) -> SerializerSwitch {
        if !self.enabled() {
            return SerializerSwitch::Disable;
        }
        if T::is_custom() {
            SerializerSwitch::CheckOk
        } else {
            SerializerSwitch::CheckFalse
        }
    }

    #[doc(hidden)]
    pub fn use_custom<T: Packable>(self) -> bool {
        match self {
            SerializerSwitch::CheckOk => true,
            SerializerSwitch::Check => T::is_custom(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_switch_stays_disabled_in_sub_walks() {
        let sw = SerializerSwitch::Disable;
        assert!(!sw.enabled());
        assert_eq!(SerializerSwitch::Disable, sw.sub_switch::<u32>());
    }

    #[test]
    fn plain_types_check_false() {
        let sw = SerializerSwitch::Check;
        assert_eq!(SerializerSwitch::CheckFalse, sw.sub_switch::<u32>());
        assert!(!sw.use_custom::<u32>());
    }

    #[test]
    fn unknown_tags_are_recognized_as_such() {
        assert!(known_tag(""));
        assert!(known_tag("ignore"));
        assert!(known_tag("packed"));
        assert!(!known_tag("varint"));
    }
}
