//! The end of the bulk path: the length-tagged final block and the three
//! diffusion rounds that turn the accumulator into a digest.

use super::stripe::{mix_stripes, seed_state};
use crate::util::read_u64;
use crate::{NUM_WORDS, STRIPE_LEN};

pub const IN_SIZE_BYTES: usize = 768 / 8;
pub const OUT_SIZE_BYTES: usize = 768 / 8;
pub const DIGEST_SIZE_BYTES: usize = 128 / 8;

const ROTATIONS: [u32; NUM_WORDS] = [44, 15, 34, 21, 38, 33, 10, 13, 38, 53, 42, 54];
const ROUNDS: usize = 3;

/// One-shot bulk hash.  Used for messages of `SHORT_THRESHOLD` bytes or more,
/// but valid for any length.
pub fn hash_long(message: &[u8], seed0: u64, seed1: u64) -> (u64, u64) {
    let mut h = seed_state(seed0, seed1);
    let tail = mix_stripes(&mut h, message);
    absorb_tail(&mut h, tail);
    final_mix(&mut h);
    (h[0], h[1])
}

/// Adds the final partial block to the accumulator.
///
/// `tail` (shorter than a stripe) is zero-padded to a full stripe whose last
/// byte is then overwritten with the tail length.
#[inline]
pub(crate) fn absorb_tail(h: &mut [u64; NUM_WORDS], tail: &[u8]) {
    debug_assert!(tail.len() < STRIPE_LEN);

    let mut block = [0u8; STRIPE_LEN];
    block[..tail.len()].copy_from_slice(tail);
    block[STRIPE_LEN - 1] = tail.len() as u8;

    for (i, word) in h.iter_mut().enumerate() {
        *word = word.wrapping_add(read_u64(&block, 8 * i));
    }
}

/// Three rounds of the 12-word diffusion.
#[inline]
pub fn final_mix(h: &mut [u64; NUM_WORDS]) {
    for _ in 0..ROUNDS {
        for (i, &rot) in ROTATIONS.iter().enumerate() {
            let prev = (i + 11) % NUM_WORDS;
            let next = (i + 1) % NUM_WORDS;
            h[prev] = h[prev].wrapping_add(h[next]);
            h[(i + 2) % NUM_WORDS] ^= h[prev];
            h[next] = h[next].rotate_left(rot);
        }
    }
}

// The final diffusion rounds.
pub fn mix_input(in_bytes: &[u8], out_bytes: &mut [u8]) {
    assert!(in_bytes.len() == IN_SIZE_BYTES);
    assert!(out_bytes.len() == OUT_SIZE_BYTES);

    let mut state = [0u64; NUM_WORDS];
    for (i, word) in state.iter_mut().enumerate() {
        *word = read_u64(in_bytes, 8 * i);
    }

    final_mix(&mut state);

    for (chunk, word) in out_bytes.chunks_exact_mut(8).zip(state) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    fn final_round_unrolled(h: &mut [u64; NUM_WORDS]) {
        h[11] = h[11].wrapping_add(h[1]);  h[2]  ^= h[11]; h[1]  = h[1].rotate_left(44);
        h[0]  = h[0].wrapping_add(h[2]);   h[3]  ^= h[0];  h[2]  = h[2].rotate_left(15);
        h[1]  = h[1].wrapping_add(h[3]);   h[4]  ^= h[1];  h[3]  = h[3].rotate_left(34);
        h[2]  = h[2].wrapping_add(h[4]);   h[5]  ^= h[2];  h[4]  = h[4].rotate_left(21);
        h[3]  = h[3].wrapping_add(h[5]);   h[6]  ^= h[3];  h[5]  = h[5].rotate_left(38);
        h[4]  = h[4].wrapping_add(h[6]);   h[7]  ^= h[4];  h[6]  = h[6].rotate_left(33);
        h[5]  = h[5].wrapping_add(h[7]);   h[8]  ^= h[5];  h[7]  = h[7].rotate_left(10);
        h[6]  = h[6].wrapping_add(h[8]);   h[9]  ^= h[6];  h[8]  = h[8].rotate_left(13);
        h[7]  = h[7].wrapping_add(h[9]);   h[10] ^= h[7];  h[9]  = h[9].rotate_left(38);
        h[8]  = h[8].wrapping_add(h[10]);  h[11] ^= h[8];  h[10] = h[10].rotate_left(53);
        h[9]  = h[9].wrapping_add(h[11]);  h[0]  ^= h[9];  h[11] = h[11].rotate_left(42);
        h[10] = h[10].wrapping_add(h[0]);  h[1]  ^= h[10]; h[0]  = h[0].rotate_left(54);
    }

    #[test]
    fn final_mix_is_three_unrolled_rounds() {
        let mut looped = seed_state(0xfeed, 0xface);
        looped[4] = 0x0123_4567_89ab_cdef;
        let mut unrolled = looped;

        final_mix(&mut looped);
        for _ in 0..3 {
            final_round_unrolled(&mut unrolled);
        }
        assert_eq!(looped, unrolled);
    }

    #[test]
    fn tail_block_is_length_tagged() {
        let mut empty = [0u64; NUM_WORDS];
        absorb_tail(&mut empty, &[]);
        assert_eq!(&empty[..11], &[0u64; 11]);
        assert_eq!(empty[11], 0);

        let mut three = [0u64; NUM_WORDS];
        absorb_tail(&mut three, &[1, 2, 3]);
        assert_eq!(three[0], 0x03_0201);
        assert_eq!(three[11], 3 << 56);

        // A 95-byte tail has its last byte replaced by the length tag.
        let tail = [0xffu8; STRIPE_LEN - 1];
        let mut full = [0u64; NUM_WORDS];
        absorb_tail(&mut full, &tail);
        assert_eq!(full[10], u64::MAX);
        assert_eq!(full[11], 0x5fff_ffff_ffff_ffff);
    }

    #[test]
    fn stripe_aligned_messages_still_get_a_tail_block() {
        let message = vec![7u8; STRIPE_LEN * 3];
        let mut h = seed_state(1, 2);
        let tail = mix_stripes(&mut h, &message);
        assert!(tail.is_empty());
        absorb_tail(&mut h, tail);
        final_mix(&mut h);
        assert_eq!(hash_long(&message, 1, 2), (h[0], h[1]));
    }
}
