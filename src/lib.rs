//! packbin is a compact binary codec for structured in-memory values. It
//! maps a closed set of primitive and composite shapes onto a byte sequence
//! and parses that sequence back, targeting on-the-wire and persisted-state
//! use: bit-exact deterministic output for fixed-width numbers, a compact
//! length-prefixed variable-length encoding for integers where most values
//! are small, and user-defined override of the default encoding for any
//! given type.
//!
//! The format is not self-describing and carries no field tags or version
//! numbers: writer and reader agree on the type out of band, and values form
//! a tree (no cycles).
//!
//! # Shapes
//!
//! | shape | wire form |
//! |-------|-----------|
//! | `bool` | one bit, shared with neighboring booleans (see below) |
//! | `u8`-`u64`, `i8`-`i64` | natural width in the chosen byte order |
//! | `usize`, `isize` | always uvarint / zig-zag varint, 64-bit range |
//! | `f32`, `f64` | IEEE-754 bit pattern at natural width |
//! | `Complex32`, `Complex64` | real then imaginary part |
//! | `String` | uvarint byte count, then raw bytes |
//! | `Vec<T>`, `[T; N]` | uvarint count, then elements |
//! | `Vec<bool>`, `[bool; N]` | uvarint count, then ⌈count/8⌉ packed bytes |
//! | `HashMap`, `BTreeMap` | uvarint count, then key/value pairs |
//! | records | field encodings in declaration order |
//! | `Option<T>` | one presence bit, then the value if present |
//!
//! Booleans are packed: within one top-level [`encode`] or [`decode`] call,
//! the first boolean claims a byte at the current position and the next
//! seven booleans (and `Option` presence bits) land in the same byte, no
//! matter what non-boolean values are written in between. Homogeneous bool
//! sequences instead use a self-contained packed format.
//!
//! Records are declared through [`packable_struct!`], which also accepts
//! per-field annotations: `#[bin(ignore)]` keeps a field off the wire
//! entirely, and `#[bin(packed)]` stores a fixed 16/32/64-bit integer field
//! as a varint instead of its natural width.
//!
//! # Example
//!
//! ```
//! use packbin::packable_struct;
//!
//! packable_struct! {
//!     #[derive(Debug, Default, PartialEq)]
//!     pub struct Sample {
//!         pub id: u32,
//!         #[bin(packed)]
//!         pub revision: u64,
//!         pub tags: Vec<String>,
//!         pub deleted: bool,
//!     }
//! }
//!
//! let sample = Sample {
//!     id: 17,
//!     revision: 3,
//!     tags: vec!["a".to_owned(), "b".to_owned()],
//!     deleted: false,
//! };
//!
//! let bytes = packbin::encode(&sample).unwrap();
//! assert_eq!(bytes.len(), packbin::size(&sample).unwrap());
//!
//! let mut back = Sample::default();
//! packbin::decode(&bytes, &mut back).unwrap();
//! assert_eq!(sample, back);
//! ```
//!
//! # Sizing and buffers
//!
//! [`size`] is an exact oracle, not an estimate: [`encode`] writes exactly
//! that many bytes, so a caller can allocate once. [`encode_into`] borrows
//! the caller's buffer instead of allocating and fails with
//! [`Error::ShortBuffer`] when it is smaller than `size` requires.
//!
//! # Byte order
//!
//! Multi-byte fixed-width values honor the [`Endian`] captured when the
//! encoder or decoder is constructed; the top-level helpers use
//! [`DEFAULT_ENDIAN`] (little). Varints have a fixed layout and are
//! unaffected.
//!
//! # Custom serializers
//!
//! A record can take over its own wire form by implementing [`Serializer`]
//! and declaring itself with `@serializer`; the `_x` entry points
//! ([`encode_x`], [`decode_x`], ...) then dispatch to it. See
//! [`Serializer`] for the contract.
//!
//! # Errors
//!
//! Everything returns [`Result`]; encoding and decoding abort on the first
//! error. A failed decode may have partially mutated the target, which
//! should then be treated as undefined.

#![deny(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_results,
    variant_size_differences
)]

use num_traits::ToPrimitive;
use std::io;

pub mod errors;
pub mod varint;

mod decoder;
mod encoder;
mod endian;
mod macros;
mod registry;
mod value;

pub use crate::decoder::Decoder;
pub use crate::encoder::Encoder;
pub use crate::endian::{Endian, DEFAULT_ENDIAN};
pub use crate::errors::{Error, Result};
pub use crate::registry::{has_serializer, registered_fields, FieldDesc, Serializer, SerializerSwitch};
pub use crate::value::Packable;

#[doc(hidden)]
pub use crate::registry::{
    __note_serializer as __registry_note_serializer, __note_struct as __registry_note_struct,
    __register_struct as __registry_register_struct,
};

use crate::registry::SerializerSwitch as Switch;

fn bits_to_bytes(bits: u64) -> Result<usize> {
    ((bits + 7) / 8).to_usize().ok_or(Error::UsizeTypeTooSmall)
}

/// Exact number of bytes [`encode`] will produce for `value`.
pub fn size<T: Packable>(value: &T) -> Result<usize> {
    size_x(value, false)
}

/// Exact number of bytes [`encode_x`] will produce for `value`.
pub fn size_x<T: Packable>(value: &T, enable_serializer: bool) -> Result<usize> {
    bits_to_bytes(value.root_bits(Switch::top_level(enable_serializer))?)
}

/// Encode `value` into a freshly allocated buffer of exactly
/// [`size`]`(value)` bytes.
pub fn encode<T: Packable>(value: &T) -> Result<Vec<u8>> {
    encode_x(value, false)
}

/// [`encode`] with an explicit serializer switch.
pub fn encode_x<T: Packable>(value: &T, enable_serializer: bool) -> Result<Vec<u8>> {
    let n = size_x(value, enable_serializer)?;
    let mut enc = Encoder::new(n);
    enc.write_value_x(value, enable_serializer)?;
    Ok(enc.into_vec())
}

/// Encode `value` into the front of `buf` and return the encoded region,
/// which aliases `buf`.
///
/// Fails with [`Error::ShortBuffer`] when `buf` holds fewer than
/// [`size`]`(value)` bytes.
pub fn encode_into<'a, T: Packable>(value: &T, buf: &'a mut [u8]) -> Result<&'a [u8]> {
    encode_into_x(value, buf, false)
}

/// [`encode_into`] with an explicit serializer switch.
pub fn encode_into_x<'a, T: Packable>(
    value: &T,
    buf: &'a mut [u8],
    enable_serializer: bool,
) -> Result<&'a [u8]> {
    let n = size_x(value, enable_serializer)?;
    if buf.len() < n {
        return Err(Error::ShortBuffer);
    }
    {
        let mut enc = Encoder::from_slice(&mut buf[..n]);
        enc.write_value_x(value, enable_serializer)?;
    }
    Ok(&buf[..n])
}

/// Decode a value from `buf` into `value`, mutating it in place.
pub fn decode<T: Packable>(buf: &[u8], value: &mut T) -> Result<()> {
    decode_x(buf, value, false)
}

/// [`decode`] with an explicit serializer switch.
pub fn decode_x<T: Packable>(buf: &[u8], value: &mut T, enable_serializer: bool) -> Result<()> {
    let mut dec = Decoder::new(buf);
    dec.read_value_x(value, enable_serializer)
}

/// Explicitly register a record or custom-serializer type.
///
/// Registration is otherwise lazy: the first encode or decode of a record
/// registers it (and its field types) silently. Explicit registration
/// additionally validates field annotations and reports
/// [`Error::DuplicateRegistration`] when the type was already registered.
pub fn register_type<T: Packable>() -> Result<()> {
    T::explicit_register()
}

/// Explicitly register `T`'s [`Serializer`] implementation for dispatch.
///
/// Records declared with `packable_struct!(@serializer ...)` enter the
/// serializer set on their own, lazily or through [`register_type`]; this
/// entry point covers hand-written [`Packable`] implementations, whose
/// walk consults the set through the
/// [`SerializerSwitch`](SerializerSwitch::sub_switch). Reports
/// [`Error::DuplicateRegistration`] when `T` is already in the set.
pub fn register_serializer<T: Packable + Serializer>() -> Result<()> {
    registry::register_serializer_explicit::<T>()?;
    T::lazy_register();
    Ok(())
}

/// Encode `value` with the given byte order and write the bytes to `w`.
///
/// Internally allocates a size-exact buffer and delegates to the slice
/// codec.
pub fn write<W: io::Write, T: Packable>(w: &mut W, endian: Endian, value: &T) -> Result<()> {
    let n = size(value)?;
    let mut enc = Encoder::with_endian(n, endian);
    enc.write_value(value)?;
    w.write_all(enc.buffer())?;
    Ok(())
}

/// Read [`size`]`(value)` bytes from `r` and decode them into `value` with
/// the given byte order.
///
/// The byte count is taken from the target's current shape, so this works
/// for fixed-size values and for containers pre-shaped to match the wire
/// (a freshly grown `Vec`, a `String` of the right length, and so on). A
/// reader with fewer bytes fails with [`Error::UnexpectedEof`].
pub fn read<R: io::Read, T: Packable>(r: &mut R, endian: Endian, value: &mut T) -> Result<()> {
    let n = size(value)?;
    let mut buf = vec![0; n];
    r.read_exact(&mut buf)?;
    let mut dec = Decoder::with_endian(&buf, endian);
    dec.read_value(value)
}
