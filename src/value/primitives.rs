//! `Packable` implementations for the primitive shapes, including the
//! sequence fast paths the generic recursion defers to.

use num_complex::{Complex32, Complex64};
use num_traits::ToPrimitive;

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::errors::{Error, Result};
use crate::registry::SerializerSwitch;
use crate::value::Packable;
use crate::varint;

fn u64_to_u16(x: u64) -> Result<u16> {
    x.to_u16().ok_or(Error::PackedOverflow)
}

fn u64_to_u32(x: u64) -> Result<u32> {
    x.to_u32().ok_or(Error::PackedOverflow)
}

fn u64_to_u64(x: u64) -> Result<u64> {
    Ok(x)
}

fn i64_to_i16(x: i64) -> Result<i16> {
    x.to_i16().ok_or(Error::PackedOverflow)
}

fn i64_to_i32(x: i64) -> Result<i32> {
    x.to_i32().ok_or(Error::PackedOverflow)
}

fn i64_to_i64(x: i64) -> Result<i64> {
    Ok(x)
}

impl Packable for bool {
    fn bits(&self, _packed: bool, _sw: SerializerSwitch) -> Result<u64> {
        Ok(1)
    }

    fn pack(&self, enc: &mut Encoder<'_>, _packed: bool, _sw: SerializerSwitch) -> Result<()> {
        enc.write_bool(*self)
    }

    fn unpack(&mut self, dec: &mut Decoder<'_>, _packed: bool, _sw: SerializerSwitch) -> Result<()> {
        *self = dec.read_bool()?;
        Ok(())
    }

    fn skip(dec: &mut Decoder<'_>, _packed: bool) -> Result<()> {
        let _ = dec.read_bool()?;
        Ok(())
    }

    // Bool sequences use the self-contained packed representation: bit
    // (8k + b) of payload byte k holds element 8k + b. The shared bool-bit
    // cursor is not involved.

    fn seq_bits(items: &[bool], _packed: bool, _sw: SerializerSwitch) -> Result<u64> {
        Ok(8 * ((items.len() as u64 + 7) / 8))
    }

    fn seq_pack(
        items: &[bool],
        enc: &mut Encoder<'_>,
        _packed: bool,
        _sw: SerializerSwitch,
    ) -> Result<()> {
        let nbytes = (items.len() + 7) / 8;
        let payload = enc.reserve(nbytes)?;
        for slot in payload.iter_mut() {
            *slot = 0;
        }
        for (i, &x) in items.iter().enumerate() {
            if x {
                payload[i / 8] |= 1 << (i % 8);
            }
        }
        Ok(())
    }

    fn seq_unpack(
        items: &mut [bool],
        wire_count: usize,
        dec: &mut Decoder<'_>,
        _packed: bool,
        _sw: SerializerSwitch,
    ) -> Result<()> {
        let nbytes = (wire_count + 7) / 8;
        let payload = dec.read_bytes(nbytes)?;
        for (i, item) in items.iter_mut().enumerate().take(wire_count) {
            *item = payload[i / 8] & (1 << (i % 8)) != 0;
        }
        Ok(())
    }

    fn seq_skip(wire_count: usize, dec: &mut Decoder<'_>, _packed: bool) -> Result<()> {
        dec.skip((wire_count + 7) / 8)
    }
}

impl Packable for u8 {
    fn bits(&self, _packed: bool, _sw: SerializerSwitch) -> Result<u64> {
        Ok(8)
    }

    fn pack(&self, enc: &mut Encoder<'_>, _packed: bool, _sw: SerializerSwitch) -> Result<()> {
        enc.write_u8(*self)
    }

    fn unpack(&mut self, dec: &mut Decoder<'_>, _packed: bool, _sw: SerializerSwitch) -> Result<()> {
        *self = dec.read_u8()?;
        Ok(())
    }

    fn skip(dec: &mut Decoder<'_>, _packed: bool) -> Result<()> {
        dec.skip(1)
    }

    fn seq_bits(items: &[u8], _packed: bool, _sw: SerializerSwitch) -> Result<u64> {
        Ok(8 * items.len() as u64)
    }

    fn seq_pack(
        items: &[u8],
        enc: &mut Encoder<'_>,
        _packed: bool,
        _sw: SerializerSwitch,
    ) -> Result<()> {
        enc.write_bytes(items)
    }

    fn seq_unpack(
        items: &mut [u8],
        wire_count: usize,
        dec: &mut Decoder<'_>,
        _packed: bool,
        _sw: SerializerSwitch,
    ) -> Result<()> {
        let n = items.len().min(wire_count);
        items[..n].copy_from_slice(dec.read_bytes(n)?);
        dec.skip(wire_count - n)
    }

    fn seq_skip(wire_count: usize, dec: &mut Decoder<'_>, _packed: bool) -> Result<()> {
        dec.skip(wire_count)
    }
}

impl Packable for i8 {
    fn bits(&self, _packed: bool, _sw: SerializerSwitch) -> Result<u64> {
        Ok(8)
    }

    fn pack(&self, enc: &mut Encoder<'_>, _packed: bool, _sw: SerializerSwitch) -> Result<()> {
        enc.write_i8(*self)
    }

    fn unpack(&mut self, dec: &mut Decoder<'_>, _packed: bool, _sw: SerializerSwitch) -> Result<()> {
        *self = dec.read_i8()?;
        Ok(())
    }

    fn skip(dec: &mut Decoder<'_>, _packed: bool) -> Result<()> {
        dec.skip(1)
    }

    fn seq_bits(items: &[i8], _packed: bool, _sw: SerializerSwitch) -> Result<u64> {
        Ok(8 * items.len() as u64)
    }

    fn seq_pack(
        items: &[i8],
        enc: &mut Encoder<'_>,
        _packed: bool,
        _sw: SerializerSwitch,
    ) -> Result<()> {
        for x in items {
            enc.write_i8(*x)?;
        }
        Ok(())
    }

    fn seq_unpack(
        items: &mut [i8],
        wire_count: usize,
        dec: &mut Decoder<'_>,
        _packed: bool,
        _sw: SerializerSwitch,
    ) -> Result<()> {
        let n = items.len().min(wire_count);
        for item in items[..n].iter_mut() {
            *item = dec.read_i8()?;
        }
        dec.skip(wire_count - n)
    }

    fn seq_skip(wire_count: usize, dec: &mut Decoder<'_>, _packed: bool) -> Result<()> {
        dec.skip(wire_count)
    }
}

// Fixed-width integers of 16/32/64 bits honor the `packed` flag: it swaps
// the natural-width encoding for a uvarint (unsigned) or zig-zag varint
// (signed), element-wise in sequences.

macro_rules! packable_fixed_uint {
    ($ty:ty, $width_bits:expr, $width_bytes:expr, $write:ident, $read:ident, $from_wire:path) => {
        impl Packable for $ty {
            fn bits(&self, packed: bool, _sw: SerializerSwitch) -> Result<u64> {
                Ok(if packed {
                    8 * varint::sizeof_uvarint(u64::from(*self)) as u64
                } else {
                    $width_bits
                })
            }

            fn pack(
                &self,
                enc: &mut Encoder<'_>,
                packed: bool,
                _sw: SerializerSwitch,
            ) -> Result<()> {
                if packed {
                    enc.write_uvarint(u64::from(*self))
                } else {
                    enc.$write(*self)
                }
            }

            fn unpack(
                &mut self,
                dec: &mut Decoder<'_>,
                packed: bool,
                _sw: SerializerSwitch,
            ) -> Result<()> {
                *self = if packed {
                    $from_wire(dec.read_uvarint()?)?
                } else {
                    dec.$read()?
                };
                Ok(())
            }

            fn skip(dec: &mut Decoder<'_>, packed: bool) -> Result<()> {
                if packed {
                    dec.skip_uvarint()
                } else {
                    dec.skip($width_bytes)
                }
            }

            fn seq_bits(items: &[$ty], packed: bool, _sw: SerializerSwitch) -> Result<u64> {
                if packed {
                    let mut total = 0u64;
                    for x in items {
                        total += 8 * varint::sizeof_uvarint(u64::from(*x)) as u64;
                    }
                    Ok(total)
                } else {
                    Ok($width_bits * items.len() as u64)
                }
            }

            fn seq_pack(
                items: &[$ty],
                enc: &mut Encoder<'_>,
                packed: bool,
                _sw: SerializerSwitch,
            ) -> Result<()> {
                if packed {
                    for x in items {
                        enc.write_uvarint(u64::from(*x))?;
                    }
                } else {
                    for x in items {
                        enc.$write(*x)?;
                    }
                }
                Ok(())
            }

            fn seq_unpack(
                items: &mut [$ty],
                wire_count: usize,
                dec: &mut Decoder<'_>,
                packed: bool,
                _sw: SerializerSwitch,
            ) -> Result<()> {
                let n = items.len().min(wire_count);
                if packed {
                    for item in items[..n].iter_mut() {
                        *item = $from_wire(dec.read_uvarint()?)?;
                    }
                    for _ in n..wire_count {
                        dec.skip_uvarint()?;
                    }
                    Ok(())
                } else {
                    for item in items[..n].iter_mut() {
                        *item = dec.$read()?;
                    }
                    let excess = (wire_count - n)
                        .checked_mul($width_bytes)
                        .ok_or(Error::UsizeTypeTooSmall)?;
                    dec.skip(excess)
                }
            }

            fn seq_skip(wire_count: usize, dec: &mut Decoder<'_>, packed: bool) -> Result<()> {
                if packed {
                    for _ in 0..wire_count {
                        dec.skip_uvarint()?;
                    }
                    Ok(())
                } else {
                    let total = wire_count
                        .checked_mul($width_bytes)
                        .ok_or(Error::UsizeTypeTooSmall)?;
                    dec.skip(total)
                }
            }
        }
    };
}

macro_rules! packable_fixed_int {
    ($ty:ty, $width_bits:expr, $width_bytes:expr, $write:ident, $read:ident, $from_wire:path) => {
        impl Packable for $ty {
            fn bits(&self, packed: bool, _sw: SerializerSwitch) -> Result<u64> {
                Ok(if packed {
                    8 * varint::sizeof_varint(i64::from(*self)) as u64
                } else {
                    $width_bits
                })
            }

            fn pack(
                &self,
                enc: &mut Encoder<'_>,
                packed: bool,
                _sw: SerializerSwitch,
            ) -> Result<()> {
                if packed {
                    enc.write_varint(i64::from(*self))
                } else {
                    enc.$write(*self)
                }
            }

            fn unpack(
                &mut self,
                dec: &mut Decoder<'_>,
                packed: bool,
                _sw: SerializerSwitch,
            ) -> Result<()> {
                *self = if packed {
                    $from_wire(dec.read_varint()?)?
                } else {
                    dec.$read()?
                };
                Ok(())
            }

            fn skip(dec: &mut Decoder<'_>, packed: bool) -> Result<()> {
                if packed {
                    dec.skip_uvarint()
                } else {
                    dec.skip($width_bytes)
                }
            }

            fn seq_bits(items: &[$ty], packed: bool, _sw: SerializerSwitch) -> Result<u64> {
                if packed {
                    let mut total = 0u64;
                    for x in items {
                        total += 8 * varint::sizeof_varint(i64::from(*x)) as u64;
                    }
                    Ok(total)
                } else {
                    Ok($width_bits * items.len() as u64)
                }
            }

            fn seq_pack(
                items: &[$ty],
                enc: &mut Encoder<'_>,
                packed: bool,
                _sw: SerializerSwitch,
            ) -> Result<()> {
                if packed {
                    for x in items {
                        enc.write_varint(i64::from(*x))?;
                    }
                } else {
                    for x in items {
                        enc.$write(*x)?;
                    }
                }
                Ok(())
            }

            fn seq_unpack(
                items: &mut [$ty],
                wire_count: usize,
                dec: &mut Decoder<'_>,
                packed: bool,
                _sw: SerializerSwitch,
            ) -> Result<()> {
                let n = items.len().min(wire_count);
                if packed {
                    for item in items[..n].iter_mut() {
                        *item = $from_wire(dec.read_varint()?)?;
                    }
                    for _ in n..wire_count {
                        dec.skip_uvarint()?;
                    }
                    Ok(())
                } else {
                    for item in items[..n].iter_mut() {
                        *item = dec.$read()?;
                    }
                    let excess = (wire_count - n)
                        .checked_mul($width_bytes)
                        .ok_or(Error::UsizeTypeTooSmall)?;
                    dec.skip(excess)
                }
            }

            fn seq_skip(wire_count: usize, dec: &mut Decoder<'_>, packed: bool) -> Result<()> {
                if packed {
                    for _ in 0..wire_count {
                        dec.skip_uvarint()?;
                    }
                    Ok(())
                } else {
                    let total = wire_count
                        .checked_mul($width_bytes)
                        .ok_or(Error::UsizeTypeTooSmall)?;
                    dec.skip(total)
                }
            }
        }
    };
}

packable_fixed_uint!(u16, 16u64, 2usize, write_u16, read_u16, u64_to_u16);
packable_fixed_uint!(u32, 32u64, 4usize, write_u32, read_u32, u64_to_u32);
packable_fixed_uint!(u64, 64u64, 8usize, write_u64, read_u64, u64_to_u64);
packable_fixed_int!(i16, 16u64, 2usize, write_i16, read_i16, i64_to_i16);
packable_fixed_int!(i32, 32u64, 4usize, write_i32, read_i32, i64_to_i32);
packable_fixed_int!(i64, 64u64, 8usize, write_i64, read_i64, i64_to_i64);

// Platform-width integers always travel as varints, independent of the
// `packed` flag, so their encoding does not depend on the platform.

impl Packable for usize {
    fn bits(&self, _packed: bool, _sw: SerializerSwitch) -> Result<u64> {
        Ok(8 * varint::sizeof_uvarint(*self as u64) as u64)
    }

    fn pack(&self, enc: &mut Encoder<'_>, _packed: bool, _sw: SerializerSwitch) -> Result<()> {
        enc.write_uvarint(*self as u64)
    }

    fn unpack(&mut self, dec: &mut Decoder<'_>, _packed: bool, _sw: SerializerSwitch) -> Result<()> {
        *self = dec
            .read_uvarint()?
            .to_usize()
            .ok_or(Error::UsizeTypeTooSmall)?;
        Ok(())
    }

    fn skip(dec: &mut Decoder<'_>, _packed: bool) -> Result<()> {
        dec.skip_uvarint()
    }
}

impl Packable for isize {
    fn bits(&self, _packed: bool, _sw: SerializerSwitch) -> Result<u64> {
        Ok(8 * varint::sizeof_varint(*self as i64) as u64)
    }

    fn pack(&self, enc: &mut Encoder<'_>, _packed: bool, _sw: SerializerSwitch) -> Result<()> {
        enc.write_varint(*self as i64)
    }

    fn unpack(&mut self, dec: &mut Decoder<'_>, _packed: bool, _sw: SerializerSwitch) -> Result<()> {
        *self = dec
            .read_varint()?
            .to_isize()
            .ok_or(Error::UsizeTypeTooSmall)?;
        Ok(())
    }

    fn skip(dec: &mut Decoder<'_>, _packed: bool) -> Result<()> {
        dec.skip_uvarint()
    }
}

macro_rules! packable_float {
    ($ty:ty, $width_bits:expr, $width_bytes:expr, $write:ident, $read:ident) => {
        impl Packable for $ty {
            fn bits(&self, _packed: bool, _sw: SerializerSwitch) -> Result<u64> {
                Ok($width_bits)
            }

            fn pack(
                &self,
                enc: &mut Encoder<'_>,
                _packed: bool,
                _sw: SerializerSwitch,
            ) -> Result<()> {
                enc.$write(*self)
            }

            fn unpack(
                &mut self,
                dec: &mut Decoder<'_>,
                _packed: bool,
                _sw: SerializerSwitch,
            ) -> Result<()> {
                *self = dec.$read()?;
                Ok(())
            }

            fn skip(dec: &mut Decoder<'_>, _packed: bool) -> Result<()> {
                dec.skip($width_bytes)
            }

            fn seq_bits(items: &[$ty], _packed: bool, _sw: SerializerSwitch) -> Result<u64> {
                Ok($width_bits * items.len() as u64)
            }

            fn seq_pack(
                items: &[$ty],
                enc: &mut Encoder<'_>,
                _packed: bool,
                _sw: SerializerSwitch,
            ) -> Result<()> {
                for x in items {
                    enc.$write(*x)?;
                }
                Ok(())
            }

            fn seq_unpack(
                items: &mut [$ty],
                wire_count: usize,
                dec: &mut Decoder<'_>,
                _packed: bool,
                _sw: SerializerSwitch,
            ) -> Result<()> {
                let n = items.len().min(wire_count);
                for item in items[..n].iter_mut() {
                    *item = dec.$read()?;
                }
                let excess = (wire_count - n)
                    .checked_mul($width_bytes)
                    .ok_or(Error::UsizeTypeTooSmall)?;
                dec.skip(excess)
            }

            fn seq_skip(wire_count: usize, dec: &mut Decoder<'_>, _packed: bool) -> Result<()> {
                let total = wire_count
                    .checked_mul($width_bytes)
                    .ok_or(Error::UsizeTypeTooSmall)?;
                dec.skip(total)
            }
        }
    };
}

packable_float!(f32, 32u64, 4usize, write_f32, read_f32);
packable_float!(f64, 64u64, 8usize, write_f64, read_f64);
packable_float!(Complex32, 64u64, 8usize, write_complex32, read_complex32);
packable_float!(Complex64, 128u64, 16usize, write_complex64, read_complex64);

impl Packable for String {
    fn bits(&self, _packed: bool, _sw: SerializerSwitch) -> Result<u64> {
        Ok(8 * (varint::sizeof_uvarint(self.len() as u64) + self.len()) as u64)
    }

    fn pack(&self, enc: &mut Encoder<'_>, _packed: bool, _sw: SerializerSwitch) -> Result<()> {
        enc.write_str(self)
    }

    fn unpack(&mut self, dec: &mut Decoder<'_>, _packed: bool, _sw: SerializerSwitch) -> Result<()> {
        *self = dec.read_str()?;
        Ok(())
    }

    fn skip(dec: &mut Decoder<'_>, _packed: bool) -> Result<()> {
        let size = dec.read_count()?;
        dec.skip(size)
    }
}
