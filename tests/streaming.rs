use std::collections::HashMap;
use std::hash::{BuildHasher, Hash, Hasher};
use std::io;

use proptest::prelude::*;
use spookyhash::{hash128, SpookyBuildHasher, SpookyHasher, SHORT_THRESHOLD, STRIPE_LEN};

fn chunked_sequences() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..=160), 1..=12)
}

/// A message and a set of cut points into it.
fn message_and_cuts() -> impl Strategy<Value = (Vec<u8>, Vec<usize>)> {
    prop::collection::vec(any::<u8>(), 0..=1024).prop_flat_map(|message| {
        let len = message.len();
        (
            Just(message),
            prop::collection::vec(0..=len, 0..=16).prop_map(|mut cuts| {
                cuts.sort_unstable();
                cuts
            }),
        )
    })
}

proptest! {
    #[test]
    fn chunked_update_matches_one_shot(chunks in chunked_sequences(), seed0 in any::<u64>(), seed1 in any::<u64>()) {
        let mut hasher = SpookyHasher::new(seed0, seed1);
        let mut concatenated = Vec::new();

        for chunk in &chunks {
            hasher.update(chunk);
            concatenated.extend_from_slice(chunk);
        }

        prop_assert_eq!(hasher.finalize(), hash128(&concatenated, seed0, seed1));
        prop_assert_eq!(hasher.total_len(), Some(concatenated.len()));
    }

    #[test]
    fn any_partition_matches_one_shot((message, cuts) in message_and_cuts(), seed0 in any::<u64>(), seed1 in any::<u64>()) {
        let mut hasher = SpookyHasher::new(seed0, seed1);
        let mut start = 0;
        for cut in cuts {
            hasher.update(&message[start..cut]);
            start = cut;
        }
        hasher.update(&message[start..]);

        prop_assert_eq!(hasher.finalize(), hash128(&message, seed0, seed1));
    }

    #[test]
    fn digest_ignores_alignment(message in prop::collection::vec(any::<u8>(), 0..=600), shift in 1usize..8) {
        let mut storage = vec![0u8; shift + message.len()];
        storage[shift..].copy_from_slice(&message);

        prop_assert_eq!(hash128(&storage[shift..], 3, 5), hash128(&message, 3, 5));
    }

    #[test]
    fn finalize_between_updates(chunks in chunked_sequences()) {
        let mut hasher = SpookyHasher::new(9, 10);
        let mut concatenated = Vec::new();

        for chunk in &chunks {
            hasher.update(chunk);
            concatenated.extend_from_slice(chunk);
            prop_assert_eq!(hasher.finalize(), hash128(&concatenated, 9, 10));
        }
    }
}

#[test]
fn empty_updates_change_nothing() {
    let message: Vec<u8> = (0..500u32).map(|i| (i * 31) as u8).collect();
    let mut hasher = SpookyHasher::new(1, 2);

    hasher.update(&[]);
    for piece in message.chunks(37) {
        hasher.update(piece);
        hasher.update(&[]);
    }

    assert_eq!(hasher.finalize(), hash128(&message, 1, 2));
}

#[test]
fn byte_at_a_time_across_threshold() {
    let message: Vec<u8> = (0..(SHORT_THRESHOLD + 2 * STRIPE_LEN + 5) as u32)
        .map(|i| (i ^ 0x5a) as u8)
        .collect();
    let mut hasher = SpookyHasher::default();

    for (i, byte) in message.iter().enumerate() {
        hasher.update(std::slice::from_ref(byte));
        assert_eq!(
            hasher.finalize(),
            hash128(&message[..=i], 0, 0),
            "after {} bytes",
            i + 1
        );
    }
}

#[test]
fn finalize_is_repeatable() {
    let mut hasher = SpookyHasher::new(4, 4);
    hasher.update(&[0xab; 300]);

    let first = hasher.finalize();
    assert_eq!(hasher.finalize(), first);
    assert_eq!(hasher.clone().finalize(), first);
    assert_eq!(hasher.finalize64(), first.0);
}

#[test]
fn std_hasher_matches_update() {
    let mut via_trait = SpookyHasher::new(5, 6);
    Hasher::write(&mut via_trait, b"abc");
    Hasher::write(&mut via_trait, b"def");

    assert_eq!(via_trait.finish(), hash128(b"abcdef", 5, 6).0);
}

#[test]
fn build_hasher_is_deterministic() {
    let builder = SpookyBuildHasher::new(17, 19);
    let hash_of = |value: &str| {
        let mut hasher = builder.build_hasher();
        value.hash(&mut hasher);
        hasher.finish()
    };

    assert_eq!(hash_of("spooky"), hash_of("spooky"));
    assert_ne!(hash_of("spooky"), hash_of("kooky"));

    let mut map = HashMap::with_hasher(builder);
    for i in 0..1000 {
        map.insert(i, i * 2);
    }
    assert_eq!(map.len(), 1000);
    assert_eq!(map.get(&512), Some(&1024));
}

#[test]
fn io_copy_matches_one_shot() {
    let message: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
    let mut hasher = SpookyHasher::new(8, 9);

    let copied = io::copy(&mut message.as_slice(), &mut hasher).expect("copy into hasher");

    assert_eq!(copied, message.len() as u64);
    assert_eq!(hasher.finalize(), hash128(&message, 8, 9));
}
