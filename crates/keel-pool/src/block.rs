//! Block header layout and the list walk over it.
//!
//! Each block begins with a packed little-endian header:
//!
//! ```text
//! +0   size        u64   payload bytes after the header
//! +8   free        u32   1 = free, 0 = in use
//! +12  next        u64   arena offset of the next header, u64::MAX = none
//! +20  align slot  u64   alignment shift, 0 for an unshifted payload
//! +28  payload ...
//! ```
//!
//! The align slot is the last field so that it sits in the 8 bytes just
//! before an unshifted payload. When an allocation is shifted forward,
//! the shift is written into the 8 bytes before the shifted address
//! instead; either way the word before the caller's address holds the
//! distance back to the payload start.

/// Size of the per-block metadata record in bytes.
pub const HEADER_SIZE: usize = 28;

/// Width of the alignment-shift word stored before a returned address.
pub(crate) const ALIGN_SLOT_SIZE: usize = 8;

const SIZE_AT: usize = 0;
const FREE_AT: usize = 8;
const NEXT_AT: usize = 12;
const ALIGN_SLOT_AT: usize = 20;
const NO_NEXT: u64 = u64::MAX;

/// Decoded form of a block header (align slot excluded).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BlockHeader {
    pub size: usize,
    pub free: bool,
    pub next: Option<usize>,
}

impl BlockHeader {
    /// Decode the header stored at `at`.
    pub fn read(arena: &[u8], at: usize) -> Self {
        let size = read_u64(arena, at + SIZE_AT) as usize;
        let free = read_u32(arena, at + FREE_AT) != 0;
        let next = match read_u64(arena, at + NEXT_AT) {
            NO_NEXT => None,
            offset => Some(offset as usize),
        };
        Self { size, free, next }
    }

    /// Encode this header at `at`, leaving the align slot untouched.
    pub fn write(&self, arena: &mut [u8], at: usize) {
        write_u64(arena, at + SIZE_AT, self.size as u64);
        write_u32(arena, at + FREE_AT, u32::from(self.free));
        let next = self.next.map_or(NO_NEXT, |n| n as u64);
        write_u64(arena, at + NEXT_AT, next);
    }

    /// Arena offset one past the end of this block's payload.
    pub fn payload_end(&self, at: usize) -> usize {
        at + HEADER_SIZE + self.size
    }
}

/// Zero the align slot of the header at `at`.
pub(crate) fn clear_align_slot(arena: &mut [u8], at: usize) {
    write_u64(arena, at + ALIGN_SLOT_AT, 0);
}

/// Public snapshot of one block, in list order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Arena offset of the block's header.
    pub offset: usize,
    /// Payload capacity in bytes, excluding the header.
    pub size: usize,
    /// Whether the block is free.
    pub free: bool,
}

/// Iterator over `(offset, header)` pairs, starting at the list head.
pub(crate) struct BlockWalk<'a> {
    arena: &'a [u8],
    next: Option<usize>,
}

impl<'a> BlockWalk<'a> {
    pub fn new(arena: &'a [u8]) -> Self {
        Self {
            arena,
            next: Some(0),
        }
    }
}

impl Iterator for BlockWalk<'_> {
    type Item = (usize, BlockHeader);

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.next?;
        let header = BlockHeader::read(self.arena, at);
        self.next = header.next;
        Some((at, header))
    }
}

pub(crate) fn read_u64(arena: &[u8], at: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&arena[at..at + 8]);
    u64::from_le_bytes(raw)
}

pub(crate) fn write_u64(arena: &mut [u8], at: usize, value: u64) {
    arena[at..at + 8].copy_from_slice(&value.to_le_bytes());
}

fn read_u32(arena: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&arena[at..at + 4]);
    u32::from_le_bytes(raw)
}

fn write_u32(arena: &mut [u8], at: usize, value: u32) {
    arena[at..at + 4].copy_from_slice(&value.to_le_bytes());
}
