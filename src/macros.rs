//! Record declaration macro.

/// Declare a record type and derive its codec implementation.
///
/// The macro defines the struct as written and implements
/// [`Packable`](crate::Packable) for it: fields encode in declaration order,
/// honoring the per-field annotations
///
/// - `#[bin(ignore)]`: the field never appears on the wire; decoding
///   leaves it at its prior value.
/// - `#[bin(packed)]`: a fixed 16/32/64-bit integer field (or a sequence
///   of such integers) is encoded as a varint/uvarint instead of its
///   natural width.
///
/// Unknown annotations are reserved: they behave like no annotation until
/// the type is explicitly registered, at which point
/// [`register_type`](crate::register_type) rejects them.
///
/// ```
/// use packbin::packable_struct;
///
/// packable_struct! {
///     #[derive(Debug, Default, PartialEq)]
///     pub struct Header {
///         pub kind: u32,
///         #[bin(packed)]
///         pub sequence: u64,
///         #[bin(ignore)]
///         pub scratch: String,
///     }
/// }
///
/// let h = Header { kind: 7, sequence: 1, scratch: "not encoded".into() };
/// let bytes = packbin::encode(&h).unwrap();
/// assert_eq!(5, bytes.len()); // 4 fixed + 1 packed
/// ```
///
/// Prefixing the body with `@serializer` additionally wires the record's
/// [`Serializer`](crate::Serializer) implementation (which you provide)
/// into the registry, so the `_x` entry points dispatch to it.
#[macro_export]
macro_rules! packable_struct {
    (
        @serializer
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[bin($tag:ident)])? $fvis:vis $fname:ident : $fty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $fvis $fname : $fty, )*
        }

        $crate::__packable_structural! { $name { $( ( $($tag)? ) $fname : $fty, )* } }

        impl $crate::Packable for $name {
            fn bits(&self, packed: bool, sw: $crate::SerializerSwitch) -> $crate::Result<u64> {
                <Self as $crate::Packable>::lazy_register();
                if sw.use_custom::<Self>() {
                    return Ok(8 * $crate::Serializer::size(self) as u64);
                }
                self.__packbin_bits(packed, sw)
            }

            fn pack(
                &self,
                enc: &mut $crate::Encoder<'_>,
                packed: bool,
                sw: $crate::SerializerSwitch,
            ) -> $crate::Result<()> {
                <Self as $crate::Packable>::lazy_register();
                if sw.use_custom::<Self>() {
                    let want = $crate::Serializer::size(self);
                    let wrote = $crate::Serializer::encode(self, enc.reserve(want)?)?;
                    if wrote != want {
                        return Err($crate::Error::BadCustomSerializer(
                            ::std::any::type_name::<Self>(),
                        ));
                    }
                    return Ok(());
                }
                self.__packbin_pack(enc, packed, sw)
            }

            fn unpack(
                &mut self,
                dec: &mut $crate::Decoder<'_>,
                packed: bool,
                sw: $crate::SerializerSwitch,
            ) -> $crate::Result<()> {
                <Self as $crate::Packable>::lazy_register();
                if sw.use_custom::<Self>() {
                    $crate::Serializer::decode(self, dec.remaining())?;
                    return dec.skip($crate::Serializer::size(self));
                }
                self.__packbin_unpack(dec, packed, sw)
            }

            fn skip(dec: &mut $crate::Decoder<'_>, packed: bool) -> $crate::Result<()> {
                Self::__packbin_skip(dec, packed)
            }

            fn is_custom() -> bool {
                true
            }

            fn lazy_register() {
                if $crate::__registry_note_struct::<Self>(Self::__PACKBIN_FIELDS) {
                    $crate::__registry_note_serializer::<Self>();
                    $( <$fty as $crate::Packable>::lazy_register(); )*
                }
            }

            fn explicit_register() -> $crate::Result<()> {
                $crate::__registry_register_struct::<Self>(Self::__PACKBIN_FIELDS)?;
                $crate::__registry_note_serializer::<Self>();
                $( <$fty as $crate::Packable>::lazy_register(); )*
                Ok(())
            }
        }
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[bin($tag:ident)])? $fvis:vis $fname:ident : $fty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $fvis $fname : $fty, )*
        }

        $crate::__packable_structural! { $name { $( ( $($tag)? ) $fname : $fty, )* } }

        impl $crate::Packable for $name {
            fn bits(&self, packed: bool, sw: $crate::SerializerSwitch) -> $crate::Result<u64> {
                <Self as $crate::Packable>::lazy_register();
                self.__packbin_bits(packed, sw)
            }

            fn pack(
                &self,
                enc: &mut $crate::Encoder<'_>,
                packed: bool,
                sw: $crate::SerializerSwitch,
            ) -> $crate::Result<()> {
                <Self as $crate::Packable>::lazy_register();
                self.__packbin_pack(enc, packed, sw)
            }

            fn unpack(
                &mut self,
                dec: &mut $crate::Decoder<'_>,
                packed: bool,
                sw: $crate::SerializerSwitch,
            ) -> $crate::Result<()> {
                <Self as $crate::Packable>::lazy_register();
                self.__packbin_unpack(dec, packed, sw)
            }

            fn skip(dec: &mut $crate::Decoder<'_>, packed: bool) -> $crate::Result<()> {
                Self::__packbin_skip(dec, packed)
            }

            fn lazy_register() {
                if $crate::__registry_note_struct::<Self>(Self::__PACKBIN_FIELDS) {
                    $( <$fty as $crate::Packable>::lazy_register(); )*
                }
            }

            fn explicit_register() -> $crate::Result<()> {
                $crate::__registry_register_struct::<Self>(Self::__PACKBIN_FIELDS)?;
                $( <$fty as $crate::Packable>::lazy_register(); )*
                Ok(())
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __packable_structural {
    ( $name:ident { $( ( $($tag:ident)? ) $fname:ident : $fty:ty, )* } ) => {
        impl $name {
            #[doc(hidden)]
            pub const __PACKBIN_FIELDS: &'static [$crate::FieldDesc] = &[
                $(
                    $crate::FieldDesc {
                        name: stringify!($fname),
                        shape: stringify!($fty),
                        tag: $crate::__packable_tag!($($tag)?),
                    },
                )*
            ];

            fn __packbin_bits(
                &self,
                _packed: bool,
                sw: $crate::SerializerSwitch,
            ) -> $crate::Result<u64> {
                let mut total: u64 = 0;
                $( total += $crate::__packable_field_bits!( ($($tag)?) self.$fname, $fty, sw ); )*
                Ok(total)
            }

            fn __packbin_pack(
                &self,
                enc: &mut $crate::Encoder<'_>,
                _packed: bool,
                sw: $crate::SerializerSwitch,
            ) -> $crate::Result<()> {
                $( $crate::__packable_field_pack!( ($($tag)?) self.$fname, $fty, enc, sw ); )*
                Ok(())
            }

            fn __packbin_unpack(
                &mut self,
                dec: &mut $crate::Decoder<'_>,
                _packed: bool,
                sw: $crate::SerializerSwitch,
            ) -> $crate::Result<()> {
                $( $crate::__packable_field_unpack!( ($($tag)?) self.$fname, $fty, dec, sw ); )*
                Ok(())
            }

            fn __packbin_skip(
                dec: &mut $crate::Decoder<'_>,
                _packed: bool,
            ) -> $crate::Result<()> {
                $( $crate::__packable_field_skip!( ($($tag)?) $fty, dec ); )*
                Ok(())
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __packable_tag {
    () => {
        ""
    };
    ( $tag:ident ) => {
        stringify!($tag)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __packable_field_bits {
    ( (ignore) $e:expr, $fty:ty, $sw:expr ) => {
        0u64
    };
    ( (packed) $e:expr, $fty:ty, $sw:expr ) => {
        $crate::Packable::bits(&$e, true, $sw.sub_switch::<$fty>())?
    };
    ( ($other:ident) $e:expr, $fty:ty, $sw:expr ) => {
        $crate::Packable::bits(&$e, false, $sw.sub_switch::<$fty>())?
    };
    ( () $e:expr, $fty:ty, $sw:expr ) => {
        $crate::Packable::bits(&$e, false, $sw.sub_switch::<$fty>())?
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __packable_field_pack {
    ( (ignore) $e:expr, $fty:ty, $enc:expr, $sw:expr ) => {
        ()
    };
    ( (packed) $e:expr, $fty:ty, $enc:expr, $sw:expr ) => {
        $crate::Packable::pack(&$e, $enc, true, $sw.sub_switch::<$fty>())?
    };
    ( ($other:ident) $e:expr, $fty:ty, $enc:expr, $sw:expr ) => {
        $crate::Packable::pack(&$e, $enc, false, $sw.sub_switch::<$fty>())?
    };
    ( () $e:expr, $fty:ty, $enc:expr, $sw:expr ) => {
        $crate::Packable::pack(&$e, $enc, false, $sw.sub_switch::<$fty>())?
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __packable_field_unpack {
    ( (ignore) $e:expr, $fty:ty, $dec:expr, $sw:expr ) => {
        ()
    };
    ( (packed) $e:expr, $fty:ty, $dec:expr, $sw:expr ) => {
        $crate::Packable::unpack(&mut $e, $dec, true, $sw.sub_switch::<$fty>())?
    };
    ( ($other:ident) $e:expr, $fty:ty, $dec:expr, $sw:expr ) => {
        $crate::Packable::unpack(&mut $e, $dec, false, $sw.sub_switch::<$fty>())?
    };
    ( () $e:expr, $fty:ty, $dec:expr, $sw:expr ) => {
        $crate::Packable::unpack(&mut $e, $dec, false, $sw.sub_switch::<$fty>())?
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __packable_field_skip {
    ( (ignore) $fty:ty, $dec:expr ) => {
        ()
    };
    ( (packed) $fty:ty, $dec:expr ) => {
        <$fty as $crate::Packable>::skip($dec, true)?
    };
    ( ($other:ident) $fty:ty, $dec:expr ) => {
        <$fty as $crate::Packable>::skip($dec, false)?
    };
    ( () $fty:ty, $dec:expr ) => {
        <$fty as $crate::Packable>::skip($dec, false)?
    };
}
