//! Byte-order selection for fixed-width values.
//!
//! The wire format stores multi-byte fixed-width integers (and therefore
//! floats and complex numbers) in the byte order the encoder was constructed
//! with. The choice is captured once at construction and does not vary
//! mid-stream.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Byte order used for fixed-width values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// Least-significant byte first.
    Little,
    /// Most-significant byte first.
    Big,
}

/// Byte order used when none is specified.
pub const DEFAULT_ENDIAN: Endian = Endian::Little;

impl Default for Endian {
    fn default() -> Self {
        DEFAULT_ENDIAN
    }
}

impl Endian {
    pub(crate) fn put_u16(self, buf: &mut [u8], x: u16) {
        match self {
            Endian::Little => LittleEndian::write_u16(buf, x),
            Endian::Big => BigEndian::write_u16(buf, x),
        }
    }

    pub(crate) fn put_u32(self, buf: &mut [u8], x: u32) {
        match self {
            Endian::Little => LittleEndian::write_u32(buf, x),
            Endian::Big => BigEndian::write_u32(buf, x),
        }
    }

    pub(crate) fn put_u64(self, buf: &mut [u8], x: u64) {
        match self {
            Endian::Little => LittleEndian::write_u64(buf, x),
            Endian::Big => BigEndian::write_u64(buf, x),
        }
    }

    pub(crate) fn get_u16(self, buf: &[u8]) -> u16 {
        match self {
            Endian::Little => LittleEndian::read_u16(buf),
            Endian::Big => BigEndian::read_u16(buf),
        }
    }

    pub(crate) fn get_u32(self, buf: &[u8]) -> u32 {
        match self {
            Endian::Little => LittleEndian::read_u32(buf),
            Endian::Big => BigEndian::read_u32(buf),
        }
    }

    pub(crate) fn get_u64(self, buf: &[u8]) -> u64 {
        match self {
            Endian::Little => LittleEndian::read_u64(buf),
            Endian::Big => BigEndian::read_u64(buf),
        }
    }
}
