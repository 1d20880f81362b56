//! The stateful read cursor values are decoded through.

use num_complex::{Complex32, Complex64};
use num_traits::ToPrimitive;

use crate::endian::{Endian, DEFAULT_ENDIAN};
use crate::errors::{Error, Result};
use crate::value::Packable;
use crate::varint;

/// Decoder reads values back out of a borrowed byte slice.
///
/// Every read checks the remaining input first and fails with
/// [`Error::ShortBuffer`] without moving the cursor, so a failed decode
/// leaves the decoder usable for inspection.
///
/// A decoder is single-threaded; distinct decoders over disjoint buffers
/// are fully independent.
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
    endian: Endian,
    /// Last byte read for packed booleans.
    bool_byte: u8,
    /// Bit index of the next boolean; 0 means no byte is currently cached.
    bool_bit: u32,
}

impl<'a> Decoder<'a> {
    /// Create a decoder over `buf`, using the default byte order.
    pub fn new(buf: &'a [u8]) -> Decoder<'a> {
        Decoder::with_endian(buf, DEFAULT_ENDIAN)
    }

    /// Create a decoder over `buf`.
    pub fn with_endian(buf: &'a [u8], endian: Endian) -> Decoder<'a> {
        Decoder {
            buf,
            pos: 0,
            endian,
            bool_byte: 0,
            bool_bit: 0,
        }
    }

    /// Number of bytes consumed so far.
    pub fn len(&self) -> usize {
        self.pos
    }

    /// Returns `true` if nothing has been consumed yet.
    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }

    /// Total length of the underlying input.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// The input bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        let buf = self.buf;
        &buf[self.pos..]
    }

    /// Advance the cursor past `size` bytes without reading them.
    pub fn skip(&mut self, size: usize) -> Result<()> {
        let _ = self.reserve(size)?;
        Ok(())
    }

    /// Move the cursor back to the beginning and reset the bool-bit cursor.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.reset_bools();
    }

    pub(crate) fn reset_bools(&mut self) {
        self.bool_bit = 0;
    }

    fn reserve(&mut self, size: usize) -> Result<&'a [u8]> {
        let new_pos = self.pos.checked_add(size).ok_or(Error::ShortBuffer)?;
        if new_pos > self.buf.len() {
            return Err(Error::ShortBuffer);
        }
        let buf = self.buf;
        let b = &buf[self.pos..new_pos];
        self.pos = new_pos;
        Ok(b)
    }

    /// Read one boolean bit, sharing bytes the same way
    /// [`Encoder::write_bool`](crate::Encoder::write_bool) does.
    pub fn read_bool(&mut self) -> Result<bool> {
        if self.bool_bit == 0 {
            let b = self.read_u8()?;
            self.bool_byte = b;
            self.bool_bit = 1;
            Ok(b & 1 != 0)
        } else {
            let x = (self.bool_byte >> self.bool_bit) & 1 != 0;
            self.bool_bit = (self.bool_bit + 1) % 8;
            Ok(x)
        }
    }

    /// Read a `u8`.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.reserve(1)?[0])
    }

    /// Read an `i8`.
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Read a `u16` in the decoder's byte order.
    pub fn read_u16(&mut self) -> Result<u16> {
        let endian = self.endian;
        Ok(endian.get_u16(self.reserve(2)?))
    }

    /// Read an `i16` in the decoder's byte order.
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    /// Read a `u32` in the decoder's byte order.
    pub fn read_u32(&mut self) -> Result<u32> {
        let endian = self.endian;
        Ok(endian.get_u32(self.reserve(4)?))
    }

    /// Read an `i32` in the decoder's byte order.
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    /// Read a `u64` in the decoder's byte order.
    pub fn read_u64(&mut self) -> Result<u64> {
        let endian = self.endian;
        Ok(endian.get_u64(self.reserve(8)?))
    }

    /// Read an `i64` in the decoder's byte order.
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(self.read_u64()? as i64)
    }

    /// Read an `f32` from its IEEE-754 bit pattern.
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Read an `f64` from its IEEE-754 bit pattern.
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Read a complex number, real part then imaginary part.
    pub fn read_complex32(&mut self) -> Result<Complex32> {
        let re = self.read_f32()?;
        let im = self.read_f32()?;
        Ok(Complex32::new(re, im))
    }

    /// Read a complex number, real part then imaginary part.
    pub fn read_complex64(&mut self) -> Result<Complex64> {
        let re = self.read_f64()?;
        let im = self.read_f64()?;
        Ok(Complex64::new(re, im))
    }

    /// Read a uvarint.
    pub fn read_uvarint(&mut self) -> Result<u64> {
        let (x, n) = varint::read_uvarint(self.remaining())?;
        self.pos += n;
        Ok(x)
    }

    /// Read a zig-zag varint.
    pub fn read_varint(&mut self) -> Result<i64> {
        Ok(varint::zig_zag_decode(self.read_uvarint()?))
    }

    /// Read a uvarint element or sequence count, narrowed to `usize`.
    pub(crate) fn read_count(&mut self) -> Result<usize> {
        self.read_uvarint()?
            .to_usize()
            .ok_or(Error::UsizeTypeTooSmall)
    }

    /// Skip an encoded uvarint, whatever its length.
    pub(crate) fn skip_uvarint(&mut self) -> Result<()> {
        let first = *self.remaining().first().ok_or(Error::ShortBuffer)?;
        self.skip(varint::uvarint_len(first)?)
    }

    /// Read raw bytes with no length prefix.
    pub fn read_bytes(&mut self, size: usize) -> Result<&'a [u8]> {
        self.reserve(size)
    }

    /// Read a uvarint byte count followed by that many bytes of UTF-8.
    pub fn read_str(&mut self) -> Result<String> {
        let size = self.read_count()?;
        let b = self.reserve(size)?;
        String::from_utf8(b.to_vec()).map_err(|_| Error::InvalidUtf8)
    }

    /// Decode a whole value into `value`.
    ///
    /// Each call is a fresh top level: the bool-bit cursor is reset first.
    /// On error the target may be partially mutated and should be treated
    /// as undefined.
    pub fn read_value<T: Packable>(&mut self, value: &mut T) -> Result<()> {
        self.read_value_x(value, false)
    }

    /// Decode a whole value, optionally dispatching to registered custom
    /// serializers.
    pub fn read_value_x<T: Packable>(&mut self, value: &mut T, enable_serializer: bool) -> Result<()> {
        self.reset_bools();
        value.root_unpack(self, crate::SerializerSwitch::top_level(enable_serializer))
    }
}
