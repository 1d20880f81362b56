//! Registration and custom-serializer dispatch.

use packbin::{packable_struct, Error, Packable, Result, Serializer};

packable_struct! {
    @serializer
    #[derive(Debug, Default, PartialEq, Clone)]
    pub struct Rgb {
        pub color: u32,
    }
}

// Structurally an Rgb is 4 bytes; the custom form drops the unused high
// byte.
impl Serializer for Rgb {
    fn size(&self) -> usize {
        3
    }

    fn encode(&self, dst: &mut [u8]) -> Result<usize> {
        if dst.len() < 3 {
            return Err(Error::ShortBuffer);
        }
        dst[0] = (self.color >> 16) as u8;
        dst[1] = (self.color >> 8) as u8;
        dst[2] = self.color as u8;
        Ok(3)
    }

    fn decode(&mut self, src: &[u8]) -> Result<()> {
        if src.len() < 3 {
            return Err(Error::ShortBuffer);
        }
        self.color =
            (u32::from(src[0]) << 16) | (u32::from(src[1]) << 8) | u32::from(src[2]);
        Ok(())
    }
}

#[test]
fn serializer_dispatch_is_opt_in() {
    let v = Rgb { color: 0x0011_2233 };

    // default entry points stay structural
    let plain = packbin::encode(&v).unwrap();
    assert_eq!(vec![0x33, 0x22, 0x11, 0x00], plain);

    // the _x entry points use the custom form
    let custom = packbin::encode_x(&v, true).unwrap();
    assert_eq!(vec![0x11, 0x22, 0x33], custom);
    assert_eq!(3, packbin::size_x(&v, true).unwrap());

    let mut back = Rgb::default();
    packbin::decode_x(&custom, &mut back, true).unwrap();
    assert_eq!(v, back);

    let mut back = Rgb::default();
    packbin::decode(&plain, &mut back).unwrap();
    assert_eq!(v, back);
}

#[test]
fn aggregates_share_one_serializer_decision() {
    let v = vec![
        Rgb { color: 0x0A_0B0C },
        Rgb { color: 0x0D_0E0F },
    ];
    let custom = packbin::encode_x(&v, true).unwrap();
    assert_eq!(vec![0x02, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F], custom);

    let mut back: Vec<Rgb> = Vec::new();
    packbin::decode_x(&custom, &mut back, true).unwrap();
    assert_eq!(v, back);

    // disabled: 2 * 4 structural bytes after the count
    assert_eq!(9, packbin::encode(&v).unwrap().len());
}

#[test]
fn options_are_transparent_to_the_serializer_check() {
    let v: Option<Rgb> = Some(Rgb { color: 0x61_6263 });
    let custom = packbin::encode_x(&v, true).unwrap();
    // top-level option drops the presence bit, then the custom bytes
    assert_eq!(vec![0x61, 0x62, 0x63], custom);
}

#[test]
fn lazy_registration_populates_the_registry() {
    let _ = packbin::encode(&Rgb::default()).unwrap();
    assert!(packbin::has_serializer::<Rgb>());
    let fields = packbin::registered_fields::<Rgb>().unwrap();
    assert_eq!(1, fields.len());
    assert_eq!("color", fields[0].name);
    assert_eq!("u32", fields[0].shape);
    assert_eq!("", fields[0].tag);
}

packable_struct! {
    #[derive(Debug, Default, PartialEq)]
    pub struct Registered {
        #[bin(packed)]
        pub n: u64,
    }
}

#[test]
fn explicit_reregistration_is_an_error() {
    packbin::register_type::<Registered>().unwrap();
    match packbin::register_type::<Registered>() {
        Err(Error::DuplicateRegistration(_)) => {}
        other => panic!("expected DuplicateRegistration, got {:?}", other),
    }
    // lazy use after explicit registration stays silent
    let bytes = packbin::encode(&Registered { n: 1 }).unwrap();
    assert_eq!(vec![0x01], bytes);
}

#[test]
fn primitives_are_not_registrable() {
    match packbin::register_type::<u32>() {
        Err(Error::NotRegistrable(_)) => {}
        other => panic!("expected NotRegistrable, got {:?}", other),
    }
}

packable_struct! {
    #[derive(Debug, Default, PartialEq)]
    pub struct FutureTagged {
        #[bin(zigzag)]
        pub n: u64,
    }
}

#[test]
fn unknown_annotations_are_rejected_at_explicit_registration() {
    // lazily the unknown tag behaves like no annotation at all
    let bytes = packbin::encode(&FutureTagged { n: 1 }).unwrap();
    assert_eq!(8, bytes.len());

    match packbin::register_type::<FutureTagged>() {
        Err(Error::UnrecognizedAnnotation("zigzag")) => {}
        other => panic!("expected UnrecognizedAnnotation, got {:?}", other),
    }
}

packable_struct! {
    @serializer
    #[derive(Debug, Default, PartialEq)]
    pub struct Lying {
        pub x: u8,
    }
}

impl Serializer for Lying {
    fn size(&self) -> usize {
        2
    }

    fn encode(&self, dst: &mut [u8]) -> Result<usize> {
        dst[0] = self.x;
        Ok(1) // claims less than size()
    }

    fn decode(&mut self, src: &[u8]) -> Result<()> {
        self.x = *src.first().ok_or(Error::ShortBuffer)?;
        Ok(())
    }
}

#[test]
fn serializers_must_write_exactly_their_reported_size() {
    match packbin::encode_x(&Lying { x: 1 }, true) {
        Err(Error::BadCustomSerializer(_)) => {}
        other => panic!("expected BadCustomSerializer, got {:?}", other),
    }
}

// A custom serializer on a hand-rolled `Packable`: dispatch is driven by
// the runtime serializer set, so the type must go through
// `register_serializer` before the switch can find it.
#[derive(Debug, Default, PartialEq)]
struct Ticks {
    raw: u64,
}

impl Serializer for Ticks {
    fn size(&self) -> usize {
        packbin::varint::sizeof_uvarint(self.raw)
    }

    fn encode(&self, dst: &mut [u8]) -> Result<usize> {
        Ok(packbin::varint::write_uvarint(self.raw, dst))
    }

    fn decode(&mut self, src: &[u8]) -> Result<()> {
        let (x, _) = packbin::varint::read_uvarint(src)?;
        self.raw = x;
        Ok(())
    }
}

impl Packable for Ticks {
    fn bits(&self, packed: bool, sw: packbin::SerializerSwitch) -> Result<u64> {
        if sw.use_custom::<Self>() {
            return Ok(8 * Serializer::size(self) as u64);
        }
        self.raw.bits(packed, sw)
    }

    fn pack(
        &self,
        enc: &mut packbin::Encoder<'_>,
        packed: bool,
        sw: packbin::SerializerSwitch,
    ) -> Result<()> {
        if sw.use_custom::<Self>() {
            let want = Serializer::size(self);
            let _ = Serializer::encode(self, enc.reserve(want)?)?;
            return Ok(());
        }
        self.raw.pack(enc, packed, sw)
    }

    fn unpack(
        &mut self,
        dec: &mut packbin::Decoder<'_>,
        packed: bool,
        sw: packbin::SerializerSwitch,
    ) -> Result<()> {
        if sw.use_custom::<Self>() {
            Serializer::decode(self, dec.remaining())?;
            return dec.skip(Serializer::size(self));
        }
        self.raw.unpack(dec, packed, sw)
    }

    fn skip(dec: &mut packbin::Decoder<'_>, packed: bool) -> Result<()> {
        <u64 as Packable>::skip(dec, packed)
    }
}

#[test]
fn register_serializer_enables_dispatch_for_hand_written_impls() {
    packbin::register_serializer::<Ticks>().unwrap();
    assert!(packbin::has_serializer::<Ticks>());

    let v = Ticks { raw: 5 };
    // structural form is a fixed 8 bytes; the custom form is one varint
    assert_eq!(8, packbin::encode(&v).unwrap().len());
    let custom = packbin::encode_x(&v, true).unwrap();
    assert_eq!(vec![0x05], custom);

    let mut back = Ticks::default();
    packbin::decode_x(&custom, &mut back, true).unwrap();
    assert_eq!(v, back);

    match packbin::register_serializer::<Ticks>() {
        Err(Error::DuplicateRegistration(_)) => {}
        other => panic!("expected DuplicateRegistration, got {:?}", other),
    }
}

packable_struct! {
    #[derive(Debug, Default, PartialEq)]
    pub struct SharedAcrossThreads {
        pub a: u32,
        pub b: Vec<bool>,
    }
}

#[test]
fn registry_lookup_is_safe_under_concurrent_encodes() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            std::thread::spawn(move || {
                for j in 0..200u32 {
                    let v = SharedAcrossThreads {
                        a: i * 1000 + j,
                        b: vec![j % 2 == 0; (j % 11) as usize],
                    };
                    let bytes = packbin::encode(&v).unwrap();
                    let mut back = SharedAcrossThreads::default();
                    packbin::decode(&bytes, &mut back).unwrap();
                    assert_eq!(v, back);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}
