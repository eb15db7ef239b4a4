//! Workload generators shared by the Keel benchmarks.
//!
//! - [`churn_sizes`]: deterministic mixed allocation sizes
//! - [`frame_lengths`]: deterministic frame lengths for queue traffic

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

/// `count` allocation sizes in `1..=max`, skewed towards small requests.
///
/// Same `seed`, same sequence: benchmarks compare like with like across
/// runs.
pub fn churn_sizes(seed: u64, count: usize, max: usize) -> Vec<usize> {
    let mut state = seed | 1;
    (0..count)
        .map(|_| {
            state = xorshift(state);
            let r = state as usize;
            // Three in four requests fall in the bottom eighth of the range.
            let span = if r % 4 == 0 { max } else { (max / 8).max(1) };
            1 + (r >> 2) % span
        })
        .collect()
}

/// `count` frame payload lengths in `0..=max`.
pub fn frame_lengths(seed: u64, count: usize, max: usize) -> Vec<usize> {
    let mut state = seed | 1;
    (0..count)
        .map(|_| {
            state = xorshift(state);
            state as usize % (max + 1)
        })
        .collect()
}

fn xorshift(mut x: u64) -> u64 {
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x
}
