//! Frame prefix codec and wrap-aware copies.
//!
//! The arena is treated as a circle: a copy that starts near the end
//! continues at offset 0. Prefixes are staged in a small stack buffer and
//! go through the same split copy as payloads.

/// Largest prefix width any [`LengthPrefix`] uses.
pub(crate) const MAX_PREFIX: usize = 4;

/// Width of the little-endian length field that heads every frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LengthPrefix {
    /// Two bytes; items up to `u16::MAX` bytes.
    U16,
    /// Four bytes; items up to `u32::MAX` bytes.
    #[default]
    U32,
}

impl LengthPrefix {
    /// Bytes the prefix occupies in the arena.
    pub const fn width(self) -> usize {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }

    /// Largest item length the prefix can record.
    pub fn max_len(self) -> usize {
        match self {
            Self::U16 => usize::from(u16::MAX),
            Self::U32 => usize::try_from(u32::MAX).unwrap_or(usize::MAX),
        }
    }

    /// Encode `len` into the first [`width`](Self::width) bytes of `out`.
    ///
    /// The caller has already checked `len <= max_len()`.
    pub(crate) fn encode(self, len: usize, out: &mut [u8; MAX_PREFIX]) -> &[u8] {
        match self {
            Self::U16 => out[..2].copy_from_slice(&(len as u16).to_le_bytes()),
            Self::U32 => out[..4].copy_from_slice(&(len as u32).to_le_bytes()),
        }
        &out[..self.width()]
    }

    /// Decode a prefix previously produced by [`encode`](Self::encode).
    pub(crate) fn decode(self, raw: &[u8; MAX_PREFIX]) -> usize {
        match self {
            Self::U16 => usize::from(u16::from_le_bytes([raw[0], raw[1]])),
            Self::U32 => u32::from_le_bytes(*raw) as usize,
        }
    }
}

/// Copy `bytes` into `arena` starting at `at`, wrapping at the end.
///
/// `at < arena.len()` and `bytes.len() <= arena.len()`.
pub(crate) fn write_wrapped(arena: &mut [u8], at: usize, bytes: &[u8]) {
    let head = bytes.len().min(arena.len() - at);
    let (first, rest) = bytes.split_at(head);
    arena[at..at + head].copy_from_slice(first);
    arena[..rest.len()].copy_from_slice(rest);
}

/// Fill `out` from `arena` starting at `at`, wrapping at the end.
///
/// `at < arena.len()` and `out.len() <= arena.len()`.
pub(crate) fn read_wrapped(arena: &[u8], at: usize, out: &mut [u8]) {
    let head = out.len().min(arena.len() - at);
    let (first, rest) = out.split_at_mut(head);
    first.copy_from_slice(&arena[at..at + head]);
    let tail = rest.len();
    rest.copy_from_slice(&arena[..tail]);
}
