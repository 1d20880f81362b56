//! Error types used throughout this library
use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Errors that can occur while sizing, encoding, decoding, or registering
/// values.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum Error {
    /// The value contains a shape the codec cannot put on the wire, such as
    /// a `None` at the top level of an encode call. Most unsupported shapes
    /// are rejected at compile time by the `Packable` bound; this variant
    /// covers the cases the type system cannot see.
    UnsupportedType(&'static str),
    /// The encode cursor would run past the end of the output buffer, or the
    /// decode cursor would run past the end of the input.
    ShortBuffer,
    /// A decoded uvarint declared a total length above the 9-byte cap, or
    /// carried value bits beyond bit 63.
    VarintOverflow,
    /// A decoded packed varint does not fit the field's declared 16- or
    /// 32-bit width.
    PackedOverflow,
    /// The underlying reader of a stream adapter returned fewer bytes than
    /// the value requires.
    UnexpectedEof,
    /// An i/o operation other than a short read failed.
    Io(io::ErrorKind),
    /// A custom [`Serializer`](crate::Serializer) implementation wrote a
    /// different number of bytes than its `size()` reported.
    BadCustomSerializer(&'static str),
    /// The type was already present in the registry when it was explicitly
    /// registered a second time. Lazy registration from a containing record
    /// tolerates duplicates silently.
    DuplicateRegistration(&'static str),
    /// A field annotation other than `ignore` or `packed` was found during
    /// explicit registration. Unknown annotations are reserved.
    UnrecognizedAnnotation(&'static str),
    /// Explicit registration was attempted for a type that is neither a
    /// record nor a custom serializer.
    NotRegistrable(&'static str),
    /// A decoded count does not fit in this platform's `usize`.
    UsizeTypeTooSmall,
    /// A decoded string is not valid UTF-8. The wire format carries raw
    /// bytes; Rust strings cannot.
    InvalidUtf8,
}

/// A `Result` alias where the `Err` case is [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnsupportedType(t) => write!(f, "unsupported type or shape: {}", t),
            Error::ShortBuffer => write!(f, "not enough space in buffer"),
            Error::VarintOverflow => write!(f, "uvarint overflows a 64-bit integer"),
            Error::PackedOverflow => {
                write!(f, "packed value does not fit the field's declared width")
            }
            Error::UnexpectedEof => write!(f, "reader returned fewer bytes than required"),
            Error::Io(kind) => write!(f, "an i/o operation failed: {:?}", kind),
            Error::BadCustomSerializer(t) => write!(
                f,
                "custom serializer for {} wrote a byte count different from its size()",
                t
            ),
            Error::DuplicateRegistration(t) => write!(f, "duplicate registration of type {}", t),
            Error::UnrecognizedAnnotation(tag) => {
                write!(f, "unrecognized field annotation `{}`", tag)
            }
            Error::NotRegistrable(t) => {
                write!(f, "expected a record or serializer type, got {}", t)
            }
            Error::UsizeTypeTooSmall => {
                write!(f, "decoded count cannot be represented in `usize`")
            }
            Error::InvalidUtf8 => write!(f, "decoded string is not valid UTF-8"),
        }
    }
}

impl StdError for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::UnexpectedEof,
            kind => Error::Io(kind),
        }
    }
}
