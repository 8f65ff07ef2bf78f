use crate::util::read_u64;
use crate::{NUM_WORDS, SEED_FILLER, STRIPE_LEN};

pub const IN_SIZE_BYTES: usize = 768 / 8;
pub const OUT_SIZE_BYTES: usize = 768 / 8;
pub const DIGEST_SIZE_BYTES: usize = 128 / 8;

/// The accumulator as it stands before any stripe has been absorbed.
#[inline]
#[rustfmt::skip]
pub const fn seed_state(seed0: u64, seed1: u64) -> [u64; NUM_WORDS] {
    [
        seed0, seed1, SEED_FILLER,
        seed0, seed1, SEED_FILLER,
        seed0, seed1, SEED_FILLER,
        seed0, seed1, SEED_FILLER,
    ]
}

/// Absorbs one 96-byte stripe into the accumulator.
///
/// Word `i` takes the `i`th message word, two of its neighbours get xored,
/// word `i` is rotated, and it is then added into its predecessor.
///
/// # Panics
///
/// Panics if `stripe` is shorter than `STRIPE_LEN` bytes.
#[inline(always)]
#[rustfmt::skip]
pub fn mix_stripe(h: &mut [u64; NUM_WORDS], stripe: &[u8]) {
    debug_assert!(stripe.len() >= STRIPE_LEN);
    let w = |i: usize| read_u64(stripe, 8 * i);

    h[0]  = h[0].wrapping_add(w(0));   h[2]  ^= h[10]; h[11] ^= h[0];  h[0]  = h[0].rotate_left(11);  h[11] = h[11].wrapping_add(h[1]);
    h[1]  = h[1].wrapping_add(w(1));   h[3]  ^= h[11]; h[0]  ^= h[1];  h[1]  = h[1].rotate_left(32);  h[0]  = h[0].wrapping_add(h[2]);
    h[2]  = h[2].wrapping_add(w(2));   h[4]  ^= h[0];  h[1]  ^= h[2];  h[2]  = h[2].rotate_left(43);  h[1]  = h[1].wrapping_add(h[3]);
    h[3]  = h[3].wrapping_add(w(3));   h[5]  ^= h[1];  h[2]  ^= h[3];  h[3]  = h[3].rotate_left(31);  h[2]  = h[2].wrapping_add(h[4]);
    h[4]  = h[4].wrapping_add(w(4));   h[6]  ^= h[2];  h[3]  ^= h[4];  h[4]  = h[4].rotate_left(17);  h[3]  = h[3].wrapping_add(h[5]);
    h[5]  = h[5].wrapping_add(w(5));   h[7]  ^= h[3];  h[4]  ^= h[5];  h[5]  = h[5].rotate_left(28);  h[4]  = h[4].wrapping_add(h[6]);
    h[6]  = h[6].wrapping_add(w(6));   h[8]  ^= h[4];  h[5]  ^= h[6];  h[6]  = h[6].rotate_left(39);  h[5]  = h[5].wrapping_add(h[7]);
    h[7]  = h[7].wrapping_add(w(7));   h[9]  ^= h[5];  h[6]  ^= h[7];  h[7]  = h[7].rotate_left(57);  h[6]  = h[6].wrapping_add(h[8]);
    h[8]  = h[8].wrapping_add(w(8));   h[10] ^= h[6];  h[7]  ^= h[8];  h[8]  = h[8].rotate_left(55);  h[7]  = h[7].wrapping_add(h[9]);
    h[9]  = h[9].wrapping_add(w(9));   h[11] ^= h[7];  h[8]  ^= h[9];  h[9]  = h[9].rotate_left(54);  h[8]  = h[8].wrapping_add(h[10]);
    h[10] = h[10].wrapping_add(w(10)); h[0]  ^= h[8];  h[9]  ^= h[10]; h[10] = h[10].rotate_left(22); h[9]  = h[9].wrapping_add(h[11]);
    h[11] = h[11].wrapping_add(w(11)); h[1]  ^= h[9];  h[10] ^= h[11]; h[11] = h[11].rotate_left(46); h[10] = h[10].wrapping_add(h[0]);
}

/// Absorbs every complete stripe of `data`, returning the bytes left over.
#[inline]
pub fn mix_stripes<'a>(h: &mut [u64; NUM_WORDS], data: &'a [u8]) -> &'a [u8] {
    let mut stripes = data.chunks_exact(STRIPE_LEN);
    for stripe in &mut stripes {
        mix_stripe(h, stripe);
    }
    stripes.remainder()
}

// The stripe absorber.
pub fn mix_input(in_bytes: &[u8], out_bytes: &mut [u8]) {
    assert!(in_bytes.len() == IN_SIZE_BYTES);
    assert!(out_bytes.len() == OUT_SIZE_BYTES);

    let mut state = [0u64; NUM_WORDS];
    mix_stripe(&mut state, in_bytes);

    // Copy the mixed state to the output.
    for (chunk, word) in out_bytes.chunks_exact_mut(8).zip(state) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
}
