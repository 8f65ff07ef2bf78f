//! Alignment-agnostic word loads.
//!
//! Every load assembles its word from bytes in little-endian order, so the
//! digest never depends on where the caller's buffer starts or on the host's
//! byte order.

/// Reads the little-endian `u64` at byte offset `offset`.
#[inline(always)]
pub(crate) fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[offset..(offset + 8)]);
    u64::from_le_bytes(word)
}

/// Zero-extended little-endian value of up to 8 bytes.
#[inline(always)]
pub(crate) fn read_partial_u64(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8);
    let mut word = [0u8; 8];
    word[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(word)
}
