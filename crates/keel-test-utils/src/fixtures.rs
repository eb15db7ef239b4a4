//! Deterministic byte fixtures.
//!
//! Payloads that differ by length and seed, so a test can tell frames
//! apart after they have been through a pool or queue.

/// `len` bytes derived from `seed`; distinct seeds give distinct sequences.
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

/// A frame whose first byte is its index, padded with `pattern` to `len`.
///
/// `len` must be at least 1.
pub fn frame(index: u8, len: usize) -> Vec<u8> {
    let mut bytes = pattern(len, index);
    bytes[0] = index;
    bytes
}
