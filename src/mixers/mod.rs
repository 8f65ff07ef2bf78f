//! The mixing components of SpookyHash V2.
//!
//! Every module exposes the primitive the hash itself is built from, plus a
//! `mix_input` adapter (with its `IN_SIZE_BYTES`, `OUT_SIZE_BYTES` and
//! `DIGEST_SIZE_BYTES`) so the component can be fed to
//! [`compute_stats`](crate::stats::compute_stats) in isolation.

pub mod finish;
pub mod short;
pub mod stripe;

use crate::stats::Mixer;

/// The whole 128-bit hash over `N`-byte messages, seeds zero.
pub fn full_hash_input<const N: usize>(in_bytes: &[u8], out_bytes: &mut [u8]) {
    assert!(in_bytes.len() == N);
    assert!(out_bytes.len() == 16);

    let (h0, h1) = crate::hash128(in_bytes, 0, 0);
    out_bytes[0..8].copy_from_slice(&h0.to_le_bytes());
    out_bytes[8..16].copy_from_slice(&h1.to_le_bytes());
}

pub const MIXERS: &[Mixer] = &[
    Mixer {
        name: "Short path end",
        mix_function: &short::mix_input,
        input_size: short::IN_SIZE_BYTES,
        output_size: short::OUT_SIZE_BYTES,
        digest_size: short::DIGEST_SIZE_BYTES,
    },
    Mixer {
        name: "Stripe absorber",
        mix_function: &stripe::mix_input,
        input_size: stripe::IN_SIZE_BYTES,
        output_size: stripe::OUT_SIZE_BYTES,
        digest_size: stripe::DIGEST_SIZE_BYTES,
    },
    Mixer {
        name: "Final mix, 3 rounds",
        mix_function: &finish::mix_input,
        input_size: finish::IN_SIZE_BYTES,
        output_size: finish::OUT_SIZE_BYTES,
        digest_size: finish::DIGEST_SIZE_BYTES,
    },
    Mixer {
        name: "SpookyHash128, 32-byte messages",
        mix_function: &full_hash_input::<32>,
        input_size: 32,
        output_size: 16,
        digest_size: 16,
    },
    // Two stripes exactly: the shortest input on the bulk path.
    Mixer {
        name: "SpookyHash128, 192-byte messages",
        mix_function: &full_hash_input::<{ crate::SHORT_THRESHOLD }>,
        input_size: crate::SHORT_THRESHOLD,
        output_size: 16,
        digest_size: 16,
    },
];
