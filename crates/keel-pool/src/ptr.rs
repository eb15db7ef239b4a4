//! Allocation handles.

use std::fmt;

/// Address of an allocation handed out by a [`MemoryPool`](crate::MemoryPool).
///
/// The address lies inside the owning block's payload, possibly shifted
/// forward from the payload start to honour the requested alignment. The
/// pool recovers the owning block from the address alone, so a `PoolPtr`
/// carries nothing else.
///
/// Handles are plain values: copying one does not duplicate the
/// allocation. Releasing a handle whose block is already free is ignored,
/// but once the address has been handed out again a stale copy resolves
/// to the new owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[must_use]
pub struct PoolPtr(pub(crate) usize);

impl PoolPtr {
    /// The absolute address.
    pub fn addr(self) -> usize {
        self.0
    }

    /// Whether the address is a multiple of `alignment`.
    ///
    /// Always true for `alignment` of 0 or 1.
    pub fn is_aligned_to(self, alignment: usize) -> bool {
        alignment <= 1 || self.0 % alignment == 0
    }
}

impl fmt::Display for PoolPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolPtr({:#x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_check() {
        let p = PoolPtr(4096);
        assert!(p.is_aligned_to(0));
        assert!(p.is_aligned_to(1));
        assert!(p.is_aligned_to(4096));
        assert!(!PoolPtr(4100).is_aligned_to(8));
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(PoolPtr(255).to_string(), "PoolPtr(0xff)");
    }
}
