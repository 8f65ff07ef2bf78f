//! SpookyHash V2: a fast 128-bit non-cryptographic hash for checksums and
//! hash table keys.
//!
//! Messages shorter than [`SHORT_THRESHOLD`] bytes go through a compact
//! four-word mixer.  Longer ones are absorbed 96 bytes at a time into a
//! twelve-word accumulator which is then diffused into the digest.  The
//! streaming [`SpookyHasher`] produces the same digest as the one-shot
//! functions however the input is split up.
//!
//! Words are always read little-endian, so digests do not depend on the host
//! or on buffer alignment.
//!
//! ```
//! let one_shot = spookyhash::hash128(b"some bytes", 0, 0);
//!
//! let mut hasher = spookyhash::SpookyHasher::new(0, 0);
//! hasher.update(b"some ");
//! hasher.update(b"bytes");
//! assert_eq!(hasher.finalize(), one_shot);
//! ```

mod error;
mod hasher;
pub mod mixers;
pub mod stats;
mod util;

pub use error::AnalysisError;
pub use hasher::{SpookyBuildHasher, SpookyHasher};

/// Filler for the accumulator words the seeds don't cover.
pub const SEED_FILLER: u64 = 0xdead_beef_dead_beef;

/// Number of 64-bit words in the accumulator.
pub const NUM_WORDS: usize = 12;

/// Bytes absorbed per bulk mixing round.
pub const STRIPE_LEN: usize = NUM_WORDS * 8;

/// Messages shorter than this take the short path.
pub const SHORT_THRESHOLD: usize = 2 * STRIPE_LEN;

/// 128-bit hash of `message`, returned as two words.
#[must_use]
pub fn hash128(message: &[u8], seed0: u64, seed1: u64) -> (u64, u64) {
    if message.len() < SHORT_THRESHOLD {
        mixers::short::hash_short(message, seed0, seed1)
    } else {
        mixers::finish::hash_long(message, seed0, seed1)
    }
}

/// 64-bit hash of `message`.  The seed is used for both seed words.
#[must_use]
pub fn hash64(message: &[u8], seed: u64) -> u64 {
    hash128(message, seed, seed).0
}

/// 32-bit hash of `message`: the low half of [`hash64`] with the seed
/// zero-extended.
#[must_use]
pub fn hash32(message: &[u8], seed: u32) -> u32 {
    hash64(message, u64::from(seed)) as u32
}
