//! Round-trip and size-fidelity properties over random values.

use std::collections::HashMap;

use rand::distributions::{Distribution, Uniform};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use packbin::varint::{read_uvarint, read_varint, sizeof_uvarint, write_uvarint, write_varint};
use packbin::{packable_struct, Packable};

/// Largest number in our varint encoding that takes the given number of
/// bytes.
fn largest_number_in_n_byte_varint(byte_length: usize) -> u64 {
    // value-bit capacities per total length: 7, 14, 19, then +8 per byte
    match byte_length {
        1 => 0x7F,
        2 => 0x3FFF,
        9 => u64::max_value(),
        n => (1u64 << (19 + 8 * (n - 3))) - 1,
    }
}

/// Smallest number in our varint encoding that takes the given number of
/// bytes.
fn smallest_number_in_n_byte_varint(byte_length: usize) -> u64 {
    match byte_length {
        1 => 0,
        n => largest_number_in_n_byte_varint(n - 1) + 1,
    }
}

/// Evenly distributed random u64s are almost all 9 bytes long when varint
/// encoded, so pick the encoded length uniformly first and then a value
/// within it. Exercises every length without a bias towards big numbers.
struct RandomVarintLengthIter<R: Rng> {
    ranges: Vec<Uniform<u64>>,
    pick: Uniform<usize>,
    rng: R,
}

impl<R: Rng> RandomVarintLengthIter<R> {
    fn new(rng: R) -> RandomVarintLengthIter<R> {
        let ranges = (1..=9)
            .map(|len| {
                Uniform::new_inclusive(
                    smallest_number_in_n_byte_varint(len),
                    largest_number_in_n_byte_varint(len),
                )
            })
            .collect();
        RandomVarintLengthIter {
            ranges,
            pick: Uniform::new(0, 9),
            rng,
        }
    }
}

impl<R: Rng> Iterator for RandomVarintLengthIter<R> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let range = self.ranges[self.pick.sample(&mut self.rng)];
        Some(range.sample(&mut self.rng))
    }
}

#[test]
fn varint_length_boundaries_are_exact() {
    for len in 1..=9 {
        assert_eq!(len, sizeof_uvarint(smallest_number_in_n_byte_varint(len)));
        assert_eq!(len, sizeof_uvarint(largest_number_in_n_byte_varint(len)));
        if len > 1 {
            assert_eq!(
                len - 1,
                sizeof_uvarint(smallest_number_in_n_byte_varint(len) - 1)
            );
        }
    }
}

#[test]
fn uvarint_roundtrip_random_all_lengths() {
    let rng = SmallRng::seed_from_u64(0xB0A7);
    let mut buf = [0u8; 9];
    for x in RandomVarintLengthIter::new(rng).take(100_000) {
        let n = write_uvarint(x, &mut buf);
        assert_eq!(n, sizeof_uvarint(x));
        let (y, m) = read_uvarint(&buf).unwrap();
        assert_eq!(x, y);
        assert_eq!(n, m);
    }
}

#[test]
fn varint_roundtrip_random() {
    let mut rng = SmallRng::seed_from_u64(0x51D);
    let mut buf = [0u8; 9];
    for _ in 0..100_000 {
        let x = rng.gen::<i64>();
        let n = write_varint(x, &mut buf);
        let (y, m) = read_varint(&buf).unwrap();
        assert_eq!(x, y);
        assert_eq!(n, m);
    }
}

packable_struct! {
    #[derive(Debug, Default, PartialEq, Clone)]
    pub struct Everything {
        pub flag: bool,
        pub tiny: u8,
        pub small: i16,
        pub medium: u32,
        #[bin(packed)]
        pub wide: u64,
        pub plat: usize,
        pub splat: isize,
        pub real: f64,
        pub name: String,
        pub data: Vec<u8>,
        pub longs: Vec<i64>,
        pub bits: Vec<bool>,
        pub lookup: HashMap<u16, String>,
        pub maybe: Option<u32>,
    }
}

fn random_string<R: Rng>(rng: &mut R, max_len: usize) -> String {
    let len = rng.gen_range(0..=max_len);
    (0..len).map(|_| rng.gen_range('a'..='z')).collect()
}

fn random_everything<R: Rng>(rng: &mut R) -> Everything {
    let mut lookup = HashMap::new();
    for _ in 0..rng.gen_range(0..8) {
        let _ = lookup.insert(rng.gen(), random_string(rng, 12));
    }
    Everything {
        flag: rng.gen(),
        tiny: rng.gen(),
        small: rng.gen(),
        medium: rng.gen(),
        wide: rng.gen(),
        plat: rng.gen(),
        splat: rng.gen(),
        real: rng.gen(),
        name: random_string(rng, 24),
        data: (0..rng.gen_range(0..32)).map(|_| rng.gen()).collect(),
        longs: (0..rng.gen_range(0..16)).map(|_| rng.gen()).collect(),
        bits: (0..rng.gen_range(0..40)).map(|_| rng.gen()).collect(),
        lookup,
        maybe: if rng.gen() { Some(rng.gen()) } else { None },
    }
}

#[test]
fn random_records_roundtrip_with_exact_sizes() {
    let mut rng = SmallRng::seed_from_u64(0xE7E7);
    for _ in 0..500 {
        let v = random_everything(&mut rng);
        let bytes = packbin::encode(&v).unwrap();
        assert_eq!(bytes.len(), packbin::size(&v).unwrap());

        let mut back = Everything::default();
        packbin::decode(&bytes, &mut back).unwrap();
        assert_eq!(v, back);
    }
}

#[test]
fn decode_into_a_dirty_target_still_matches() {
    let mut rng = SmallRng::seed_from_u64(0xD1271);
    for _ in 0..200 {
        let v = random_everything(&mut rng);
        let bytes = packbin::encode(&v).unwrap();

        let mut target = random_everything(&mut rng);
        packbin::decode(&bytes, &mut target).unwrap();
        assert_eq!(v, target);
    }
}

#[test]
fn every_truncation_of_a_record_is_short() {
    let mut rng = SmallRng::seed_from_u64(0x5407);
    let v = random_everything(&mut rng);
    let bytes = packbin::encode(&v).unwrap();
    for take in 0..bytes.len() {
        let mut target = Everything::default();
        assert!(
            packbin::decode(&bytes[..take], &mut target).is_err(),
            "prefix of {} of {} bytes decoded successfully",
            take,
            bytes.len()
        );
    }
}

#[test]
fn packed_sequences_roundtrip_random() {
    let mut rng = SmallRng::seed_from_u64(0xACC);

    packable_struct! {
        #[derive(Debug, Default, PartialEq)]
        pub struct PackedSeqs {
            #[bin(packed)]
            pub unsigned: Vec<u64>,
            #[bin(packed)]
            pub signed: Vec<i32>,
        }
    }

    let length_iter = RandomVarintLengthIter::new(SmallRng::seed_from_u64(0x1E2));
    let unsigned: Vec<u64> = length_iter.take(64).collect();
    let v = PackedSeqs {
        unsigned,
        signed: (0..64).map(|_| rng.gen()).collect(),
    };
    let bytes = packbin::encode(&v).unwrap();
    assert_eq!(bytes.len(), packbin::size(&v).unwrap());

    let mut back = PackedSeqs::default();
    packbin::decode(&bytes, &mut back).unwrap();
    assert_eq!(v, back);
}

#[test]
fn size_counts_shared_bool_bits_once() {
    // a run of n booleans plus fixed fields occupies ceil(n/8) extra bytes
    packable_struct! {
        #[derive(Debug, Default, PartialEq)]
        pub struct Flags {
            pub head: u8,
            pub f0: bool,
            pub f1: bool,
            pub f2: bool,
            pub tail: u8,
        }
    }

    let v = Flags::default();
    assert_eq!(3, packbin::size(&v).unwrap());
    assert_eq!(3, packbin::encode(&v).unwrap().len());
}

#[test]
fn seq_hooks_agree_with_element_walks() {
    // the fast path and the generic loop must produce identical bytes
    let values = vec![0u16, 1, 0x7FFF, 0xFFFF];
    let via_vec = packbin::encode(&values).unwrap();

    let mut enc = packbin::Encoder::new(via_vec.len());
    enc.write_uvarint(values.len() as u64).unwrap();
    for x in &values {
        enc.write_u16(*x).unwrap();
    }
    assert_eq!(via_vec, enc.buffer());
    let _ = values.bits(false, packbin::SerializerSwitch::Disable).unwrap();
}
