//! Incremental hashing.
//!
//! [`SpookyHasher`] accepts the message through any number of
//! [`update`](SpookyHasher::update) calls and produces exactly the digest
//! [`hash128`](crate::hash128) would produce for the concatenated bytes.
//!
//! Until `SHORT_THRESHOLD` bytes have arrived everything is buffered, since
//! the message may still turn out to be short enough for the short path.
//! After that, whole stripes are folded into the accumulator as soon as they
//! are available and at most one partial stripe is kept around.

use std::fmt;
use std::hash::{BuildHasher, Hasher};
use std::io;

use tracing::trace;

use crate::mixers::finish::{absorb_tail, final_mix};
use crate::mixers::short::hash_short;
use crate::mixers::stripe::{mix_stripe, mix_stripes, seed_state};
use crate::{NUM_WORDS, SHORT_THRESHOLD, STRIPE_LEN};

/// Streaming SpookyHash V2 state.
///
/// # Examples
///
/// ```
/// use spookyhash::{hash128, SpookyHasher};
///
/// let mut hasher = SpookyHasher::new(1, 2);
/// hasher.update(b"hello ");
/// hasher.update(b"world");
/// assert_eq!(hasher.finalize(), hash128(b"hello world", 1, 2));
/// ```
#[derive(Clone)]
pub struct SpookyHasher {
    // While nothing has been absorbed, words 0 and 1 still hold the seeds.
    state: [u64; NUM_WORDS],

    // Bytes not yet folded into `state`.  Holds up to `SHORT_THRESHOLD - 1`
    // bytes before the first stripe is absorbed, less than a stripe after.
    carry: [u8; SHORT_THRESHOLD],
    carry_len: usize,

    // Bytes folded into `state`, always a multiple of `STRIPE_LEN` unless it
    // has wrapped, in which case `overflowed` is set for good.
    processed: usize,
    overflowed: bool,
}

impl SpookyHasher {
    /// Creates a hasher seeded with `seed0` and `seed1`.
    #[must_use]
    pub const fn new(seed0: u64, seed1: u64) -> Self {
        Self {
            state: seed_state(seed0, seed1),
            carry: [0; SHORT_THRESHOLD],
            carry_len: 0,
            processed: 0,
            overflowed: false,
        }
    }

    /// Appends `data` to the message.
    pub fn update(&mut self, mut data: &[u8]) {
        if data.is_empty() {
            return;
        }

        // Still small enough for the short path: just buffer.
        if !self.overflowed {
            let total = self
                .processed
                .checked_add(self.carry_len)
                .and_then(|n| n.checked_add(data.len()));
            if matches!(total, Some(n) if n < SHORT_THRESHOLD) {
                self.carry[self.carry_len..(self.carry_len + data.len())].copy_from_slice(data);
                self.carry_len += data.len();
                return;
            }
        }

        if self.processed == 0 && !self.overflowed {
            trace!(
                buffered = self.carry_len,
                incoming = data.len(),
                "spooky hasher leaving short mode"
            );
        }

        // The first time the threshold is crossed there can be more than a
        // stripe buffered.
        if self.carry_len >= STRIPE_LEN {
            mix_stripe(&mut self.state, &self.carry[..STRIPE_LEN]);
            self.carry.copy_within(STRIPE_LEN..self.carry_len, 0);
            self.carry_len -= STRIPE_LEN;
            self.add_processed(STRIPE_LEN);
        }

        // Top up and flush the partial stripe so the rest can be absorbed
        // straight from `data`.
        if self.carry_len > 0 {
            let fill = STRIPE_LEN - self.carry_len;
            if data.len() < fill {
                self.carry[self.carry_len..(self.carry_len + data.len())].copy_from_slice(data);
                self.carry_len += data.len();
                return;
            }

            self.carry[self.carry_len..STRIPE_LEN].copy_from_slice(&data[..fill]);
            mix_stripe(&mut self.state, &self.carry[..STRIPE_LEN]);
            self.carry_len = 0;
            self.add_processed(STRIPE_LEN);
            data = &data[fill..];
        }

        let tail = mix_stripes(&mut self.state, data);
        self.add_processed(data.len() - tail.len());

        self.carry[..tail.len()].copy_from_slice(tail);
        self.carry_len = tail.len();
    }

    /// Returns the 128-bit digest of everything passed to
    /// [`update`](Self::update) so far.  The hasher is left untouched, so
    /// more data may follow.
    #[must_use]
    pub fn finalize(&self) -> (u64, u64) {
        if self.is_short() {
            return hash_short(&self.carry[..self.carry_len], self.state[0], self.state[1]);
        }

        let mut h = self.state;
        absorb_tail(&mut h, &self.carry[..self.carry_len]);
        final_mix(&mut h);
        (h[0], h[1])
    }

    /// First word of [`finalize`](Self::finalize).
    #[must_use]
    pub fn finalize64(&self) -> u64 {
        self.finalize().0
    }

    /// Total number of bytes fed in so far, or `None` once the count no
    /// longer fits in a `usize`.
    #[must_use]
    pub fn total_len(&self) -> Option<usize> {
        if self.overflowed {
            None
        } else {
            self.processed.checked_add(self.carry_len)
        }
    }

    fn is_short(&self) -> bool {
        !self.overflowed
            && self.processed == 0
            && matches!(self.total_len(), Some(n) if n < SHORT_THRESHOLD)
    }

    fn add_processed(&mut self, len: usize) {
        let (processed, wrapped) = self.processed.overflowing_add(len);
        if wrapped && !self.overflowed {
            trace!("spooky hasher byte count overflowed, short path disabled");
        }
        self.processed = processed;
        self.overflowed |= wrapped;
    }
}

impl Default for SpookyHasher {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl fmt::Debug for SpookyHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpookyHasher")
            .field("processed", &self.processed)
            .field("carry_len", &self.carry_len)
            .field("overflowed", &self.overflowed)
            .finish_non_exhaustive()
    }
}

impl Hasher for SpookyHasher {
    fn write(&mut self, bytes: &[u8]) {
        self.update(bytes);
    }

    fn finish(&self) -> u64 {
        self.finalize64()
    }
}

impl io::Write for SpookyHasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Builds seeded [`SpookyHasher`]s, for use as a `HashMap` hasher.
///
/// ```
/// use std::collections::HashMap;
/// use spookyhash::SpookyBuildHasher;
///
/// let mut map = HashMap::with_hasher(SpookyBuildHasher::new(7, 11));
/// map.insert("key", 1);
/// assert_eq!(map.get("key"), Some(&1));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpookyBuildHasher {
    pub seed0: u64,
    pub seed1: u64,
}

impl SpookyBuildHasher {
    pub const fn new(seed0: u64, seed1: u64) -> Self {
        Self { seed0, seed1 }
    }
}

impl BuildHasher for SpookyBuildHasher {
    type Hasher = SpookyHasher;

    fn build_hasher(&self) -> SpookyHasher {
        SpookyHasher::new(self.seed0, self.seed1)
    }
}
