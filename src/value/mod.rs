//! The recursive value walker.
//!
//! [`Packable`] is the codec's core trait: it carries the exact-size oracle,
//! the encode and decode walks, and skip-by-type. Implementations exist for
//! every encodable shape; records get theirs from
//! [`packable_struct!`](crate::packable_struct).
//!
//! Sequence layout is controlled by the *element* type through the `seq_*`
//! hooks, so `Vec<bool>` and `[bool; N]` share the packed bool-array format
//! and primitive sequences compile down to direct buffer loops instead of
//! the generic recursion.

use std::any::{type_name, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::errors::{Error, Result};
use crate::registry;
use crate::registry::SerializerSwitch;
use crate::varint;

mod primitives;


/// Number of bits the uvarint count prefix for `len` elements occupies.
fn count_bits(len: usize) -> u64 {
    8 * varint::sizeof_uvarint(len as u64) as u64
}

/// A value the codec can put on the wire and read back.
///
/// The `packed` argument reflects the `packed` annotation of the enclosing
/// record field (`false` at the top level); it turns fixed 16/32/64-bit
/// integers into varints and cascades into sequences of such integers, but
/// not into nested records. The [`SerializerSwitch`] threads custom
/// serializer dispatch through the walk.
pub trait Packable: 'static {
    /// Exact encoded size in bits. Booleans occupy single bits; everything
    /// else occupies whole bytes. The top level rounds up once.
    fn bits(&self, packed: bool, sw: SerializerSwitch) -> Result<u64>;

    /// Encode one value.
    fn pack(&self, enc: &mut Encoder<'_>, packed: bool, sw: SerializerSwitch) -> Result<()>;

    /// Decode one value in place.
    fn unpack(&mut self, dec: &mut Decoder<'_>, packed: bool, sw: SerializerSwitch) -> Result<()>;

    /// Consume one encoded value of this type without materializing it.
    ///
    /// Used when the wire carries more elements than the target has room
    /// for. Skipping is structural: a custom serializer whose layout
    /// diverges from the structural one cannot be skipped.
    fn skip(dec: &mut Decoder<'_>, packed: bool) -> Result<()>
    where
        Self: Sized;

    #[doc(hidden)]
    fn root_bits(&self, sw: SerializerSwitch) -> Result<u64> {
        self.bits(false, sw)
    }

    #[doc(hidden)]
    fn root_pack(&self, enc: &mut Encoder<'_>, sw: SerializerSwitch) -> Result<()> {
        self.pack(enc, false, sw)
    }

    #[doc(hidden)]
    fn root_unpack(&mut self, dec: &mut Decoder<'_>, sw: SerializerSwitch) -> Result<()> {
        self.unpack(dec, false, sw)
    }

    /// Whether this type's wire form is supplied by a custom
    /// [`Serializer`](crate::Serializer). Nullable references are
    /// transparent: `Option<T>` and `Box<T>` answer for `T`.
    #[doc(hidden)]
    fn is_custom() -> bool
    where
        Self: Sized,
    {
        registry::serializer_registered(TypeId::of::<Self>())
    }

    #[doc(hidden)]
    fn lazy_register()
    where
        Self: Sized,
    {
    }

    #[doc(hidden)]
    fn explicit_register() -> Result<()>
    where
        Self: Sized,
    {
        Err(Error::NotRegistrable(type_name::<Self>()))
    }

    // Sequence plumbing. The count prefix is the caller's job; these cover
    // the payload after it.

    #[doc(hidden)]
    fn seq_bits(items: &[Self], packed: bool, sw: SerializerSwitch) -> Result<u64>
    where
        Self: Sized,
    {
        let sub = sw.sub_switch::<Self>();
        let mut total = 0u64;
        for item in items {
            total += item.bits(packed, sub)?;
        }
        Ok(total)
    }

    #[doc(hidden)]
    fn seq_pack(
        items: &[Self],
        enc: &mut Encoder<'_>,
        packed: bool,
        sw: SerializerSwitch,
    ) -> Result<()>
    where
        Self: Sized,
    {
        let sub = sw.sub_switch::<Self>();
        for item in items {
            item.pack(enc, packed, sub)?;
        }
        Ok(())
    }

    #[doc(hidden)]
    fn seq_unpack(
        items: &mut [Self],
        wire_count: usize,
        dec: &mut Decoder<'_>,
        packed: bool,
        sw: SerializerSwitch,
    ) -> Result<()>
    where
        Self: Sized,
    {
        let sub = sw.sub_switch::<Self>();
        let n = items.len().min(wire_count);
        for item in items[..n].iter_mut() {
            item.unpack(dec, packed, sub)?;
        }
        for _ in n..wire_count {
            Self::skip(dec, packed)?;
        }
        Ok(())
    }

    #[doc(hidden)]
    fn seq_skip(wire_count: usize, dec: &mut Decoder<'_>, packed: bool) -> Result<()>
    where
        Self: Sized,
    {
        for _ in 0..wire_count {
            Self::skip(dec, packed)?;
        }
        Ok(())
    }
}

impl<T: Packable + Default> Packable for Vec<T> {
    fn bits(&self, packed: bool, sw: SerializerSwitch) -> Result<u64> {
        Ok(count_bits(self.len()) + T::seq_bits(self, packed, sw)?)
    }

    fn pack(&self, enc: &mut Encoder<'_>, packed: bool, sw: SerializerSwitch) -> Result<()> {
        enc.write_uvarint(self.len() as u64)?;
        T::seq_pack(self, enc, packed, sw)
    }

    fn unpack(&mut self, dec: &mut Decoder<'_>, packed: bool, sw: SerializerSwitch) -> Result<()> {
        let wire_count = dec.read_count()?;
        self.resize_with(wire_count, T::default);
        T::seq_unpack(self, wire_count, dec, packed, sw)
    }

    fn skip(dec: &mut Decoder<'_>, packed: bool) -> Result<()> {
        let wire_count = dec.read_count()?;
        T::seq_skip(wire_count, dec, packed)
    }

    fn lazy_register() {
        T::lazy_register();
    }
}

impl<T: Packable, const N: usize> Packable for [T; N] {
    fn bits(&self, packed: bool, sw: SerializerSwitch) -> Result<u64> {
        Ok(count_bits(N) + T::seq_bits(self, packed, sw)?)
    }

    fn pack(&self, enc: &mut Encoder<'_>, packed: bool, sw: SerializerSwitch) -> Result<()> {
        enc.write_uvarint(N as u64)?;
        T::seq_pack(self, enc, packed, sw)
    }

    fn unpack(&mut self, dec: &mut Decoder<'_>, packed: bool, sw: SerializerSwitch) -> Result<()> {
        let wire_count = dec.read_count()?;
        T::seq_unpack(self, wire_count, dec, packed, sw)
    }

    fn skip(dec: &mut Decoder<'_>, packed: bool) -> Result<()> {
        let wire_count = dec.read_count()?;
        T::seq_skip(wire_count, dec, packed)
    }

    fn lazy_register() {
        T::lazy_register();
    }
}

impl<T: Packable + Default> Packable for Option<T> {
    fn bits(&self, packed: bool, sw: SerializerSwitch) -> Result<u64> {
        match self {
            Some(v) => Ok(1 + v.bits(packed, sw)?),
            None => Ok(1),
        }
    }

    fn pack(&self, enc: &mut Encoder<'_>, packed: bool, sw: SerializerSwitch) -> Result<()> {
        match self {
            Some(v) => {
                enc.write_bool(true)?;
                v.pack(enc, packed, sw)
            }
            None => enc.write_bool(false),
        }
    }

    fn unpack(&mut self, dec: &mut Decoder<'_>, packed: bool, sw: SerializerSwitch) -> Result<()> {
        if dec.read_bool()? {
            self.get_or_insert_with(T::default).unpack(dec, packed, sw)
        } else {
            *self = None;
            Ok(())
        }
    }

    fn skip(dec: &mut Decoder<'_>, packed: bool) -> Result<()> {
        if dec.read_bool()? {
            T::skip(dec, packed)
        } else {
            Ok(())
        }
    }

    // At the top level null is not representable on the wire: the presence
    // bit is omitted and a `None` is refused.

    fn root_bits(&self, sw: SerializerSwitch) -> Result<u64> {
        match self {
            Some(v) => v.bits(false, sw),
            None => Err(Error::UnsupportedType(type_name::<Self>())),
        }
    }

    fn root_pack(&self, enc: &mut Encoder<'_>, sw: SerializerSwitch) -> Result<()> {
        match self {
            Some(v) => v.pack(enc, false, sw),
            None => Err(Error::UnsupportedType(type_name::<Self>())),
        }
    }

    fn root_unpack(&mut self, dec: &mut Decoder<'_>, sw: SerializerSwitch) -> Result<()> {
        self.get_or_insert_with(T::default).unpack(dec, false, sw)
    }

    fn is_custom() -> bool {
        T::is_custom()
    }

    fn lazy_register() {
        T::lazy_register();
    }
}

impl<T: Packable> Packable for Box<T> {
    fn bits(&self, packed: bool, sw: SerializerSwitch) -> Result<u64> {
        (**self).bits(packed, sw)
    }

    fn pack(&self, enc: &mut Encoder<'_>, packed: bool, sw: SerializerSwitch) -> Result<()> {
        (**self).pack(enc, packed, sw)
    }

    fn unpack(&mut self, dec: &mut Decoder<'_>, packed: bool, sw: SerializerSwitch) -> Result<()> {
        (**self).unpack(dec, packed, sw)
    }

    fn skip(dec: &mut Decoder<'_>, packed: bool) -> Result<()> {
        T::skip(dec, packed)
    }

    fn root_bits(&self, sw: SerializerSwitch) -> Result<u64> {
        (**self).root_bits(sw)
    }

    fn root_pack(&self, enc: &mut Encoder<'_>, sw: SerializerSwitch) -> Result<()> {
        (**self).root_pack(enc, sw)
    }

    fn root_unpack(&mut self, dec: &mut Decoder<'_>, sw: SerializerSwitch) -> Result<()> {
        (**self).root_unpack(dec, sw)
    }

    fn is_custom() -> bool {
        T::is_custom()
    }

    fn lazy_register() {
        T::lazy_register();
    }
}

impl<K, V> Packable for HashMap<K, V>
where
    K: Packable + Default + Eq + Hash,
    V: Packable + Default,
{
    fn bits(&self, _packed: bool, sw: SerializerSwitch) -> Result<u64> {
        let sub_k = sw.sub_switch::<K>();
        let sub_v = sw.sub_switch::<V>();
        let mut total = count_bits(self.len());
        for (k, v) in self {
            total += k.bits(false, sub_k)? + v.bits(false, sub_v)?;
        }
        Ok(total)
    }

    fn pack(&self, enc: &mut Encoder<'_>, _packed: bool, sw: SerializerSwitch) -> Result<()> {
        enc.write_uvarint(self.len() as u64)?;
        let sub_k = sw.sub_switch::<K>();
        let sub_v = sw.sub_switch::<V>();
        for (k, v) in self {
            k.pack(enc, false, sub_k)?;
            v.pack(enc, false, sub_v)?;
        }
        Ok(())
    }

    fn unpack(&mut self, dec: &mut Decoder<'_>, _packed: bool, sw: SerializerSwitch) -> Result<()> {
        let wire_count = dec.read_count()?;
        self.clear();
        let sub_k = sw.sub_switch::<K>();
        let sub_v = sw.sub_switch::<V>();
        for _ in 0..wire_count {
            let mut k = K::default();
            k.unpack(dec, false, sub_k)?;
            let mut v = V::default();
            v.unpack(dec, false, sub_v)?;
            let _ = self.insert(k, v);
        }
        Ok(())
    }

    fn skip(dec: &mut Decoder<'_>, _packed: bool) -> Result<()> {
        let wire_count = dec.read_count()?;
        for _ in 0..wire_count {
            K::skip(dec, false)?;
            V::skip(dec, false)?;
        }
        Ok(())
    }

    fn lazy_register() {
        K::lazy_register();
        V::lazy_register();
    }
}

impl<K, V> Packable for BTreeMap<K, V>
where
    K: Packable + Default + Ord,
    V: Packable + Default,
{
    fn bits(&self, _packed: bool, sw: SerializerSwitch) -> Result<u64> {
        let sub_k = sw.sub_switch::<K>();
        let sub_v = sw.sub_switch::<V>();
        let mut total = count_bits(self.len());
        for (k, v) in self {
            total += k.bits(false, sub_k)? + v.bits(false, sub_v)?;
        }
        Ok(total)
    }

    fn pack(&self, enc: &mut Encoder<'_>, _packed: bool, sw: SerializerSwitch) -> Result<()> {
        enc.write_uvarint(self.len() as u64)?;
        let sub_k = sw.sub_switch::<K>();
        let sub_v = sw.sub_switch::<V>();
        for (k, v) in self {
            k.pack(enc, false, sub_k)?;
            v.pack(enc, false, sub_v)?;
        }
        Ok(())
    }

    fn unpack(&mut self, dec: &mut Decoder<'_>, _packed: bool, sw: SerializerSwitch) -> Result<()> {
        let wire_count = dec.read_count()?;
        self.clear();
        let sub_k = sw.sub_switch::<K>();
        let sub_v = sw.sub_switch::<V>();
        for _ in 0..wire_count {
            let mut k = K::default();
            k.unpack(dec, false, sub_k)?;
            let mut v = V::default();
            v.unpack(dec, false, sub_v)?;
            let _ = self.insert(k, v);
        }
        Ok(())
    }

    fn skip(dec: &mut Decoder<'_>, _packed: bool) -> Result<()> {
        let wire_count = dec.read_count()?;
        for _ in 0..wire_count {
            K::skip(dec, false)?;
            V::skip(dec, false)?;
        }
        Ok(())
    }

    fn lazy_register() {
        K::lazy_register();
        V::lazy_register();
    }
}
