//! The short-message path: inputs below `SHORT_THRESHOLD` bytes are hashed
//! with four working words and never touch the 12-word accumulator.

use crate::util::{read_partial_u64, read_u64};
use crate::SEED_FILLER;

pub const IN_SIZE_BYTES: usize = 256 / 8;
pub const OUT_SIZE_BYTES: usize = 256 / 8;
pub const DIGEST_SIZE_BYTES: usize = 128 / 8;

/// Hashes `message` (shorter than `SHORT_THRESHOLD`) with the given seeds.
pub(crate) fn hash_short(message: &[u8], seed0: u64, seed1: u64) -> (u64, u64) {
    debug_assert!(message.len() < crate::SHORT_THRESHOLD);

    let mut state = [seed0, seed1, SEED_FILLER, SEED_FILLER];

    let mut rest = message;
    if message.len() > 15 {
        let mut stripes = message.chunks_exact(32);
        for stripe in &mut stripes {
            state[2] = state[2].wrapping_add(read_u64(stripe, 0));
            state[3] = state[3].wrapping_add(read_u64(stripe, 8));
            short_mix(&mut state);
            state[0] = state[0].wrapping_add(read_u64(stripe, 16));
            state[1] = state[1].wrapping_add(read_u64(stripe, 24));
        }
        rest = stripes.remainder();

        // Half a stripe left over.
        if rest.len() >= 16 {
            state[2] = state[2].wrapping_add(read_u64(rest, 0));
            state[3] = state[3].wrapping_add(read_u64(rest, 8));
            short_mix(&mut state);
            rest = &rest[16..];
        }
    }

    // The length lands in the top byte of `d`.  The message is always
    // shorter than 256 bytes, so nothing is shifted out.
    state[3] = state[3].wrapping_add((message.len() as u64) << 56);

    // Byte `i` of the 0..15 byte tail is added at bit `8 * (i % 8)` of `c`
    // (i < 8) or `d` (i >= 8).  The bytes never overlap, so adding the
    // assembled words is the same as adding them one at a time.
    match rest.len() {
        0 => {
            state[2] = state[2].wrapping_add(SEED_FILLER);
            state[3] = state[3].wrapping_add(SEED_FILLER);
        }
        1..=7 => {
            state[2] = state[2].wrapping_add(read_partial_u64(rest));
        }
        _ => {
            state[2] = state[2].wrapping_add(read_u64(rest, 0));
            state[3] = state[3].wrapping_add(read_partial_u64(&rest[8..]));
        }
    }

    short_end(&mut state);

    (state[0], state[1])
}

/// The 12-step mix applied to every 16 bytes absorbed into `c` and `d`.
#[inline(always)]
#[rustfmt::skip]
pub fn short_mix(state: &mut [u64; 4]) {
    let [a, b, c, d] = state;

    *c = c.rotate_left(50); *c = c.wrapping_add(*d); *a ^= *c;
    *d = d.rotate_left(52); *d = d.wrapping_add(*a); *b ^= *d;
    *a = a.rotate_left(30); *a = a.wrapping_add(*b); *c ^= *a;
    *b = b.rotate_left(41); *b = b.wrapping_add(*c); *d ^= *b;
    *c = c.rotate_left(54); *c = c.wrapping_add(*d); *a ^= *c;
    *d = d.rotate_left(48); *d = d.wrapping_add(*a); *b ^= *d;
    *a = a.rotate_left(38); *a = a.wrapping_add(*b); *c ^= *a;
    *b = b.rotate_left(37); *b = b.wrapping_add(*c); *d ^= *b;
    *c = c.rotate_left(62); *c = c.wrapping_add(*d); *a ^= *c;
    *d = d.rotate_left(34); *d = d.wrapping_add(*a); *b ^= *d;
    *a = a.rotate_left(5);  *a = a.wrapping_add(*b); *c ^= *a;
    *b = b.rotate_left(36); *b = b.wrapping_add(*c); *d ^= *b;
}

/// Final avalanche of the short path.
#[inline(always)]
pub fn short_end(state: &mut [u64; 4]) {
    // Each step xors the next word with the current one, rotates the current
    // one, and adds it back in.  The words are visited round-robin.
    const ROTATIONS: [u32; 11] = [15, 52, 26, 51, 28, 9, 47, 54, 32, 25, 63];

    for (i, &rot) in ROTATIONS.iter().enumerate() {
        let cur = (i + 2) % 4;
        let next = (i + 3) % 4;
        state[next] ^= state[cur];
        state[cur] = state[cur].rotate_left(rot);
        state[next] = state[next].wrapping_add(state[cur]);
    }
}

// The final avalanche round of the short path, on its own.
pub fn mix_input(in_bytes: &[u8], out_bytes: &mut [u8]) {
    assert!(in_bytes.len() == IN_SIZE_BYTES);
    assert!(out_bytes.len() == OUT_SIZE_BYTES);

    let mut state = [
        read_u64(in_bytes, 0),
        read_u64(in_bytes, 8),
        read_u64(in_bytes, 16),
        read_u64(in_bytes, 24),
    ];

    short_end(&mut state);

    // Copy the mixed state to the output.
    for (chunk, word) in out_bytes.chunks_exact_mut(8).zip(state) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
}
