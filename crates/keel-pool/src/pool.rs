//! The [`MemoryPool`] allocator.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

use keel_core::{HeapMemory, RawMemory};

use crate::block::{
    clear_align_slot, read_u64, write_u64, BlockHeader, BlockInfo, BlockWalk, ALIGN_SLOT_SIZE,
    HEADER_SIZE,
};
use crate::error::PoolError;
use crate::ptr::PoolPtr;

/// Backing bytes of a pool: either obtained from a provider (and returned
/// to it on drop) or borrowed from the caller.
enum Arena<'a> {
    Owned(Box<[u8]>),
    Borrowed(&'a mut [u8]),
}

impl Deref for Arena<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Owned(bytes) => bytes,
            Self::Borrowed(bytes) => bytes,
        }
    }
}

impl DerefMut for Arena<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        match self {
            Self::Owned(bytes) => bytes,
            Self::Borrowed(bytes) => bytes,
        }
    }
}

/// Summary of a pool's block list at one instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolStats {
    /// Arena capacity in bytes.
    pub capacity: usize,
    /// Number of blocks in the list.
    pub blocks: usize,
    /// Number of free blocks.
    pub free_blocks: usize,
    /// Payload bytes held by free blocks.
    pub free_bytes: usize,
    /// Payload bytes held by used blocks.
    pub used_bytes: usize,
    /// Payload size of the largest free block.
    pub largest_free: usize,
}

impl PoolStats {
    /// Bytes consumed by block headers.
    pub fn overhead_bytes(&self) -> usize {
        self.blocks * HEADER_SIZE
    }
}

/// First-fit, block-splitting allocator over a fixed byte arena.
///
/// The arena is either owned (obtained from a [`RawMemory`] provider at
/// construction and handed back on drop) or borrowed from the caller for
/// the pool's lifetime `'a`.
///
/// Every operation takes the pool's single lock for its whole duration,
/// so concurrent calls on one pool are serialised and never interleave at
/// the block-list level. Lock hold time is bounded by the list length.
pub struct MemoryPool<'a, M: RawMemory = HeapMemory> {
    arena: Mutex<Arena<'a>>,
    memory: M,
    base: usize,
    capacity: usize,
}

// Compile-time assertion: pools can be shared across threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<MemoryPool<'static>>();
};

impl MemoryPool<'static, HeapMemory> {
    /// Create a pool with a `capacity`-byte arena from the global heap.
    pub fn new(capacity: usize) -> Result<Self, PoolError> {
        Self::with_memory(capacity, HeapMemory)
    }
}

impl<M: RawMemory> MemoryPool<'static, M> {
    /// Create a pool whose arena is obtained from `memory`.
    ///
    /// The arena is returned to `memory` when the pool is dropped.
    pub fn with_memory(capacity: usize, memory: M) -> Result<Self, PoolError> {
        check_capacity(capacity)?;
        let bytes = memory
            .allocate(capacity)
            .map_err(PoolError::ArenaUnavailable)?;
        Ok(Self::init(Arena::Owned(bytes), memory))
    }
}

impl<'a> MemoryPool<'a, HeapMemory> {
    /// Create a pool over a caller-owned arena.
    ///
    /// The pool borrows `arena` for its lifetime and never frees it. Any
    /// existing contents are overwritten by the initial block header.
    pub fn with_arena(arena: &'a mut [u8]) -> Result<Self, PoolError> {
        check_capacity(arena.len())?;
        Ok(Self::init(Arena::Borrowed(arena), HeapMemory))
    }
}

impl<'a, M: RawMemory> MemoryPool<'a, M> {
    fn init(mut arena: Arena<'a>, memory: M) -> Self {
        let capacity = arena.len();
        let base = arena.as_ptr() as usize;
        BlockHeader {
            size: capacity - HEADER_SIZE,
            free: true,
            next: None,
        }
        .write(&mut arena, 0);
        clear_align_slot(&mut arena, 0);
        tracing::debug!(capacity, base, "memory pool initialised");
        Self {
            arena: Mutex::new(arena),
            memory,
            base,
            capacity,
        }
    }

    /// Arena capacity in bytes, headers included.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Address of the first arena byte.
    pub fn base_addr(&self) -> usize {
        self.base
    }

    /// Allocate `size` bytes with no alignment requirement.
    pub fn alloc(&self, size: usize) -> Result<PoolPtr, PoolError> {
        self.allocate(size, 0)
    }

    /// Allocate `size` bytes whose address is a multiple of `alignment`.
    ///
    /// `alignment` must be zero (no requirement) or a power of two. The
    /// block reserved is `size + alignment` bytes: the returned address may
    /// sit up to `alignment - 1` bytes past the payload start, with the
    /// shift recorded in the word just before it.
    ///
    /// Placement is first-fit over the whole list. A free block is taken
    /// whole when its size equals the request exactly, and split when it
    /// exceeds the request by more than one header. A free block with
    /// less slack than that is too tight to split: it is skipped and the
    /// scan moves on to later blocks, so it never fails the request alone.
    pub fn allocate(&self, size: usize, alignment: usize) -> Result<PoolPtr, PoolError> {
        if size == 0 {
            return Err(PoolError::ZeroSize);
        }
        if alignment != 0 && !alignment.is_power_of_two() {
            return Err(PoolError::InvalidAlignment { alignment });
        }

        let mut guard = self.lock();
        let arena: &mut [u8] = &mut guard;

        let Some(total) = size.checked_add(alignment) else {
            return Err(PoolError::OutOfMemory {
                requested: usize::MAX,
                largest_free: largest_free(arena),
            });
        };

        let Some(at) = find_fit(arena, total) else {
            let largest_free = largest_free(arena);
            tracing::trace!(size, alignment, largest_free, "pool allocation failed");
            return Err(PoolError::OutOfMemory {
                requested: total,
                largest_free,
            });
        };

        let mut header = BlockHeader::read(arena, at);
        if header.size != total {
            split(arena, at, &mut header, total);
        }
        header.free = false;
        header.write(arena, at);
        clear_align_slot(arena, at);

        let payload = at + HEADER_SIZE;
        let shift = align_shift(self.base + payload, alignment);
        if shift > 0 {
            write_u64(arena, payload + shift - ALIGN_SLOT_SIZE, shift as u64);
        }
        Ok(PoolPtr(self.base + payload + shift))
    }

    /// Return an allocation to the pool.
    ///
    /// This is a silent no-op when `ptr` is outside the arena, does not
    /// resolve to a block in the list, or resolves to a block that is
    /// already free. Such calls are tolerated rather than reported, so
    /// callers must not treat a return from `release` as proof the
    /// pointer was valid; use [`try_release`](Self::try_release) to find
    /// out.
    pub fn release(&self, ptr: PoolPtr) {
        let _ = self.try_release(ptr);
    }

    /// Like [`release`](Self::release), but reports whether a block was
    /// actually freed.
    pub fn try_release(&self, ptr: PoolPtr) -> bool {
        let mut guard = self.lock();
        let arena: &mut [u8] = &mut guard;

        let Some((at, mut header)) = self.locate(arena, ptr) else {
            tracing::trace!(addr = ptr.addr(), "release ignored");
            return false;
        };
        header.free = true;
        header.write(arena, at);
        coalesce(arena);
        true
    }

    /// Copy `data` into the allocation at `ptr`, starting `offset` bytes in.
    pub fn write(&self, ptr: PoolPtr, offset: usize, data: &[u8]) -> Result<(), PoolError> {
        let mut guard = self.lock();
        let arena: &mut [u8] = &mut guard;
        let start = self.checked_range(arena, ptr, offset, data.len())?;
        arena[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Copy bytes out of the allocation at `ptr`, starting `offset` bytes
    /// in, filling `buf` completely.
    pub fn read(&self, ptr: PoolPtr, offset: usize, buf: &mut [u8]) -> Result<(), PoolError> {
        let guard = self.lock();
        let arena: &[u8] = &guard;
        let start = self.checked_range(arena, ptr, offset, buf.len())?;
        buf.copy_from_slice(&arena[start..start + buf.len()]);
        Ok(())
    }

    /// Bytes addressable from `ptr` to the end of its block, or `None` if
    /// `ptr` is not a live allocation.
    ///
    /// Always at least the size that was requested for `ptr`.
    pub fn usable_size(&self, ptr: PoolPtr) -> Option<usize> {
        let guard = self.lock();
        let (at, header) = self.locate(&guard, ptr)?;
        Some(header.payload_end(at) - (ptr.addr() - self.base))
    }

    /// Snapshot of the block list in list order.
    pub fn blocks(&self) -> Vec<BlockInfo> {
        let guard = self.lock();
        BlockWalk::new(&guard)
            .map(|(offset, header)| BlockInfo {
                offset,
                size: header.size,
                free: header.free,
            })
            .collect()
    }

    /// Aggregate statistics over the block list.
    pub fn stats(&self) -> PoolStats {
        let guard = self.lock();
        let mut stats = PoolStats {
            capacity: self.capacity,
            blocks: 0,
            free_blocks: 0,
            free_bytes: 0,
            used_bytes: 0,
            largest_free: 0,
        };
        for (_, header) in BlockWalk::new(&guard) {
            stats.blocks += 1;
            if header.free {
                stats.free_blocks += 1;
                stats.free_bytes += header.size;
                stats.largest_free = stats.largest_free.max(header.size);
            } else {
                stats.used_bytes += header.size;
            }
        }
        stats
    }

    /// Resolve `ptr` to the live block that owns it.
    ///
    /// Reads the shift word before `ptr`, rewinds to the payload start and
    /// then to the header, and accepts the result only if that offset is a
    /// used block in the list.
    fn locate(&self, arena: &[u8], ptr: PoolPtr) -> Option<(usize, BlockHeader)> {
        let offset = ptr.addr().checked_sub(self.base)?;
        if offset < ALIGN_SLOT_SIZE || offset > self.capacity {
            return None;
        }
        let shift = usize::try_from(read_u64(arena, offset - ALIGN_SLOT_SIZE)).ok()?;
        let at = offset.checked_sub(shift)?.checked_sub(HEADER_SIZE)?;
        BlockWalk::new(arena).find(|&(candidate, header)| {
            candidate == at && !header.free && offset <= header.payload_end(at)
        })
    }

    /// Validate a payload access and return its starting arena offset.
    fn checked_range(
        &self,
        arena: &[u8],
        ptr: PoolPtr,
        offset: usize,
        len: usize,
    ) -> Result<usize, PoolError> {
        let (at, header) = self
            .locate(arena, ptr)
            .ok_or(PoolError::InvalidPointer { addr: ptr.addr() })?;
        let start = ptr.addr() - self.base;
        let available = header.payload_end(at) - start;
        match offset.checked_add(len) {
            Some(end) if end <= available => Ok(start + offset),
            _ => Err(PoolError::OutOfBounds {
                offset,
                len,
                available,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Arena<'a>> {
        self.arena.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<M: RawMemory> Drop for MemoryPool<'_, M> {
    fn drop(&mut self) {
        let arena = self.arena.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Arena::Owned(bytes) = arena {
            self.memory.release(std::mem::take(bytes));
            tracing::debug!(capacity = self.capacity, "memory pool arena released");
        }
    }
}

impl<M: RawMemory> fmt::Debug for MemoryPool<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPool")
            .field("base", &format_args!("{:#x}", self.base))
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

fn check_capacity(capacity: usize) -> Result<(), PoolError> {
    if capacity <= HEADER_SIZE {
        return Err(PoolError::ArenaTooSmall {
            capacity,
            minimum: HEADER_SIZE + 1,
        });
    }
    Ok(())
}

/// First block, in list order, that can hold `total` bytes either exactly
/// or with room left over for a new header and at least one payload byte.
fn find_fit(arena: &[u8], total: usize) -> Option<usize> {
    BlockWalk::new(arena)
        .find(|(_, header)| {
            header.free
                && header
                    .size
                    .checked_sub(total)
                    .is_some_and(|slack| slack == 0 || slack > HEADER_SIZE)
        })
        .map(|(at, _)| at)
}

/// Carve a free remainder off the block at `at`, shrinking it to `total`.
fn split(arena: &mut [u8], at: usize, header: &mut BlockHeader, total: usize) {
    let rest_at = at + HEADER_SIZE + total;
    BlockHeader {
        size: header.size - total - HEADER_SIZE,
        free: true,
        next: header.next,
    }
    .write(arena, rest_at);
    clear_align_slot(arena, rest_at);
    header.size = total;
    header.next = Some(rest_at);
}

/// Merge free neighbours, pass after pass, until a pass merges nothing.
fn coalesce(arena: &mut [u8]) {
    loop {
        let mut merged = false;
        let mut cursor = Some(0);
        while let Some(at) = cursor {
            let mut header = BlockHeader::read(arena, at);
            let Some(next_at) = header.next else {
                break;
            };
            let next = BlockHeader::read(arena, next_at);
            if header.free && next.free {
                header.size += next.size + HEADER_SIZE;
                header.next = next.next;
                header.write(arena, at);
                merged = true;
            }
            cursor = header.next;
        }
        if !merged {
            break;
        }
    }
}

fn largest_free(arena: &[u8]) -> usize {
    BlockWalk::new(arena)
        .filter(|(_, header)| header.free)
        .map(|(_, header)| header.size)
        .max()
        .unwrap_or(0)
}

/// Distance from `addr` forward to the next multiple of `alignment`.
fn align_shift(addr: usize, alignment: usize) -> usize {
    if alignment == 0 {
        return 0;
    }
    match addr & (alignment - 1) {
        0 => 0,
        over => alignment - over,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::RawMemoryError;
    use keel_test_utils::{BudgetMemory, CountingMemory, FailingMemory};

    fn assert_conserved(pool: &MemoryPool<'_, impl RawMemory>) {
        let blocks = pool.blocks();
        let total: usize = blocks.iter().map(|b| b.size + HEADER_SIZE).sum();
        assert_eq!(total, pool.capacity());
    }

    fn assert_no_adjacent_free(pool: &MemoryPool<'_, impl RawMemory>) {
        let blocks = pool.blocks();
        for pair in blocks.windows(2) {
            assert!(
                !(pair[0].free && pair[1].free),
                "adjacent free blocks at {} and {}",
                pair[0].offset,
                pair[1].offset
            );
        }
    }

    #[test]
    fn new_pool_is_one_free_block() {
        let pool = MemoryPool::new(1024).unwrap();
        assert_eq!(
            pool.blocks(),
            vec![BlockInfo {
                offset: 0,
                size: 1024 - HEADER_SIZE,
                free: true,
            }]
        );
    }

    #[test]
    fn construction_rejects_tiny_arena() {
        assert_eq!(
            MemoryPool::new(HEADER_SIZE).unwrap_err(),
            PoolError::ArenaTooSmall {
                capacity: HEADER_SIZE,
                minimum: HEADER_SIZE + 1,
            }
        );
        assert!(MemoryPool::new(HEADER_SIZE + 1).is_ok());
    }

    #[test]
    fn construction_surfaces_provider_failure() {
        let err = MemoryPool::with_memory(1024, FailingMemory).unwrap_err();
        assert_eq!(
            err,
            PoolError::ArenaUnavailable(RawMemoryError::Exhausted { requested: 1024 })
        );
    }

    #[test]
    fn owned_arena_is_returned_to_provider_on_drop() {
        let memory = CountingMemory::new();
        {
            let pool = MemoryPool::with_memory(512, &memory).unwrap();
            assert_eq!(memory.outstanding_bytes(), 512);
            let p = pool.alloc(10).unwrap();
            pool.release(p);
        }
        assert_eq!(memory.outstanding_bytes(), 0);
        assert_eq!(memory.allocations(), 1);
        assert_eq!(memory.releases(), 1);
    }

    #[test]
    fn pools_sharing_a_provider_respect_its_ceiling() {
        let memory = BudgetMemory::new(768);
        let first = MemoryPool::with_memory(512, &memory).unwrap();
        assert_eq!(
            MemoryPool::with_memory(512, &memory).unwrap_err(),
            PoolError::ArenaUnavailable(RawMemoryError::BudgetExceeded {
                requested: 512,
                available: 256,
            })
        );
        let small = MemoryPool::with_memory(256, &memory).unwrap();
        assert_eq!(memory.available(), 0);

        drop(first);
        assert_eq!(memory.available(), 512);
        assert!(MemoryPool::with_memory(512, &memory).is_ok());
        drop(small);
    }

    #[test]
    fn borrowed_arena_is_used_in_place() {
        let mut backing = vec![0u8; 256];
        let base = backing.as_ptr() as usize;
        {
            let pool = MemoryPool::with_arena(&mut backing).unwrap();
            assert_eq!(pool.base_addr(), base);
            let p = pool.alloc(4).unwrap();
            assert_eq!(p.addr(), base + HEADER_SIZE);
            pool.write(p, 0, b"keel").unwrap();
        }
        assert_eq!(&backing[HEADER_SIZE..HEADER_SIZE + 4], b"keel");
    }

    #[test]
    fn rejects_zero_size_and_bad_alignment() {
        let pool = MemoryPool::new(1024).unwrap();
        assert_eq!(pool.allocate(0, 0).unwrap_err(), PoolError::ZeroSize);
        assert_eq!(
            pool.allocate(8, 3).unwrap_err(),
            PoolError::InvalidAlignment { alignment: 3 }
        );
        assert_eq!(
            pool.allocate(8, 24).unwrap_err(),
            PoolError::InvalidAlignment { alignment: 24 }
        );
    }

    #[test]
    fn alignment_larger_than_arena_fails() {
        let pool = MemoryPool::new(1024).unwrap();
        let err = pool.allocate(111, 1024).unwrap_err();
        assert_eq!(
            err,
            PoolError::OutOfMemory {
                requested: 1135,
                largest_free: 1024 - HEADER_SIZE,
            }
        );
        assert_eq!(pool.stats().blocks, 1);
    }

    #[test]
    fn alloc_then_release_restores_full_capacity() {
        let pool = MemoryPool::new(1024).unwrap();
        let p = pool.allocate(100, 0).unwrap();
        assert_eq!(pool.stats().blocks, 2);
        pool.release(p);
        let stats = pool.stats();
        assert_eq!(stats.blocks, 1);
        assert_eq!(stats.free_bytes, 1024 - HEADER_SIZE);
    }

    #[test]
    fn split_leaves_free_remainder() {
        let pool = MemoryPool::new(1024).unwrap();
        let _p = pool.alloc(100).unwrap();
        let blocks = pool.blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].size, 100);
        assert!(!blocks[0].free);
        assert_eq!(blocks[1].offset, HEADER_SIZE + 100);
        assert_eq!(blocks[1].size, 1024 - 2 * HEADER_SIZE - 100);
        assert!(blocks[1].free);
        assert_conserved(&pool);
    }

    #[test]
    fn exact_fit_consumes_whole_block() {
        let pool = MemoryPool::new(1024).unwrap();
        let p = pool.alloc(1024 - HEADER_SIZE).unwrap();
        assert_eq!(pool.stats().free_blocks, 0);
        assert!(matches!(
            pool.alloc(1).unwrap_err(),
            PoolError::OutOfMemory { largest_free: 0, .. }
        ));
        pool.release(p);
        assert_eq!(pool.stats().free_bytes, 1024 - HEADER_SIZE);
    }

    #[test]
    fn block_without_split_slack_is_skipped() {
        // One free block of 996 bytes: a request leaving 1..=HEADER_SIZE
        // bytes of slack can neither be an exact fit nor split.
        let pool = MemoryPool::new(1024).unwrap();
        let err = pool.alloc(1024 - HEADER_SIZE - 10).unwrap_err();
        assert!(matches!(err, PoolError::OutOfMemory { .. }));
    }

    #[test]
    fn scan_continues_past_unusable_free_block() {
        let pool = MemoryPool::new(1024).unwrap();
        let a = pool.alloc(40).unwrap();
        let _b = pool.alloc(16).unwrap();
        pool.release(a);
        // The 40-byte hole has 10 bytes of slack for a 30-byte request:
        // too little to split, so placement moves on to the tail block.
        let c = pool.alloc(30).unwrap();
        assert!(c.addr() > a.addr());
        let blocks = pool.blocks();
        assert!(blocks[0].free);
        assert_eq!(blocks[0].size, 40);
    }

    #[test]
    fn first_fit_reuses_earliest_hole() {
        let pool = MemoryPool::new(2048).unwrap();
        let a = pool.alloc(200).unwrap();
        let _b = pool.alloc(50).unwrap();
        let c = pool.alloc(200).unwrap();
        let _d = pool.alloc(50).unwrap();
        pool.release(a);
        pool.release(c);
        let e = pool.alloc(100).unwrap();
        assert_eq!(e, a);
    }

    #[test]
    fn aligned_allocation_is_aligned_and_releasable() {
        let pool = MemoryPool::new(4096).unwrap();
        for alignment in [1usize, 2, 4, 8, 16, 64, 128, 256] {
            let p = pool.allocate(10, alignment).unwrap();
            assert!(p.is_aligned_to(alignment), "{p} not aligned to {alignment}");
            assert!(pool.usable_size(p).unwrap() >= 10);
            pool.write(p, 0, &[0xEE; 10]).unwrap();
        }
        let live: Vec<BlockInfo> = pool.blocks().into_iter().filter(|b| !b.free).collect();
        assert_eq!(live.len(), 8);
    }

    #[test]
    fn aligned_release_recovers_block_start() {
        let pool = MemoryPool::new(4096).unwrap();
        let pad = pool.alloc(3).unwrap();
        let p = pool.allocate(100, 128).unwrap();
        assert!(p.is_aligned_to(128));
        assert!(pool.try_release(p));
        pool.release(pad);
        assert_eq!(pool.stats().blocks, 1);
    }

    #[test]
    fn release_of_foreign_or_stale_pointer_is_ignored() {
        let pool = MemoryPool::new(1024).unwrap();
        let p = pool.alloc(64).unwrap();

        assert!(!pool.try_release(PoolPtr(0)));
        assert!(!pool.try_release(PoolPtr(pool.base_addr() + 4)));
        assert!(!pool.try_release(PoolPtr(pool.base_addr() + 4096)));
        assert!(!pool.try_release(PoolPtr(p.addr() + 8)));
        assert_eq!(pool.stats().free_blocks, 1);

        assert!(pool.try_release(p));
        assert!(!pool.try_release(p));
        assert_eq!(pool.stats().blocks, 1);
    }

    #[test]
    fn release_is_by_address_only() {
        let pool = MemoryPool::new(1024).unwrap();
        let a = pool.alloc(64).unwrap();
        let _guard = pool.alloc(64).unwrap();
        pool.release(a);
        let b = pool.alloc(64).unwrap();
        assert_eq!(a, b);
        // Same address, now owned by `b`: releasing `a` again frees `b`.
        assert!(pool.try_release(a));
        assert!(!pool.try_release(b));
    }

    #[test]
    fn payload_access_is_bounded_by_block() {
        let pool = MemoryPool::new(1024).unwrap();
        let p = pool.alloc(16).unwrap();
        pool.write(p, 0, b"0123456789abcdef").unwrap();

        let mut buf = [0u8; 6];
        pool.read(p, 10, &mut buf).unwrap();
        assert_eq!(&buf, b"abcdef");

        assert_eq!(
            pool.write(p, 12, b"overflow").unwrap_err(),
            PoolError::OutOfBounds {
                offset: 12,
                len: 8,
                available: 16,
            }
        );
        pool.release(p);
        assert_eq!(
            pool.read(p, 0, &mut buf).unwrap_err(),
            PoolError::InvalidPointer { addr: p.addr() }
        );
    }

    #[test]
    fn releasing_middle_block_merges_both_sides() {
        let pool = MemoryPool::new(1024).unwrap();
        let a = pool.alloc(32).unwrap();
        let b = pool.alloc(32).unwrap();
        let c = pool.alloc(32).unwrap();
        pool.release(a);
        pool.release(c);
        assert_no_adjacent_free(&pool);
        assert_eq!(pool.stats().blocks, 3);
        pool.release(b);
        assert_eq!(pool.stats().blocks, 1);
        assert_conserved(&pool);
    }

    #[test]
    fn align_shift_rounds_up() {
        assert_eq!(align_shift(4096, 0), 0);
        assert_eq!(align_shift(4096, 64), 0);
        assert_eq!(align_shift(4097, 64), 63);
        assert_eq!(align_shift(4100, 8), 4);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Alloc { size: usize, align_pow: u32 },
            Release { slot: usize },
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                3 => (1usize..300, 0u32..8).prop_map(|(size, align_pow)| Op::Alloc { size, align_pow }),
                2 => (0usize..32).prop_map(|slot| Op::Release { slot }),
            ]
        }

        fn alignment(align_pow: u32) -> usize {
            if align_pow == 0 { 0 } else { 1 << align_pow }
        }

        proptest! {
            #[test]
            fn blocks_always_cover_capacity(ops in proptest::collection::vec(op(), 1..80)) {
                let pool = MemoryPool::new(8192).unwrap();
                let mut live: Vec<PoolPtr> = Vec::new();
                for op in ops {
                    match op {
                        Op::Alloc { size, align_pow } => {
                            if let Ok(p) = pool.allocate(size, alignment(align_pow)) {
                                live.push(p);
                            }
                        }
                        Op::Release { slot } => {
                            if !live.is_empty() {
                                let p = live.swap_remove(slot % live.len());
                                prop_assert!(pool.try_release(p));
                            }
                        }
                    }
                    let covered: usize = pool.blocks().iter().map(|b| b.size + HEADER_SIZE).sum();
                    prop_assert_eq!(covered, pool.capacity());
                }
            }

            #[test]
            fn live_allocations_never_overlap(ops in proptest::collection::vec(op(), 1..80)) {
                let pool = MemoryPool::new(8192).unwrap();
                let mut live: Vec<(PoolPtr, usize)> = Vec::new();
                for op in ops {
                    match op {
                        Op::Alloc { size, align_pow } => {
                            if let Ok(p) = pool.allocate(size, alignment(align_pow)) {
                                live.push((p, size));
                            }
                        }
                        Op::Release { slot } => {
                            if !live.is_empty() {
                                let (p, _) = live.swap_remove(slot % live.len());
                                pool.release(p);
                            }
                        }
                    }
                    let mut ranges: Vec<(usize, usize)> =
                        live.iter().map(|(p, size)| (p.addr(), p.addr() + size)).collect();
                    ranges.sort_unstable();
                    for pair in ranges.windows(2) {
                        prop_assert!(pair[0].1 <= pair[1].0, "overlap: {:?}", pair);
                    }
                }
            }

            #[test]
            fn releasing_everything_leaves_one_block(
                sizes in proptest::collection::vec((1usize..400, 0u32..7), 1..40),
                order in proptest::collection::vec(any::<prop::sample::Index>(), 40),
            ) {
                let pool = MemoryPool::new(16384).unwrap();
                let mut live: Vec<PoolPtr> = sizes
                    .iter()
                    .filter_map(|&(size, pow)| pool.allocate(size, alignment(pow)).ok())
                    .collect();
                for pick in order {
                    if live.is_empty() {
                        break;
                    }
                    let p = live.swap_remove(pick.index(live.len()));
                    pool.release(p);
                }
                let blocks = pool.blocks();
                prop_assert_eq!(blocks.len(), 1);
                prop_assert!(blocks[0].free);
                prop_assert_eq!(blocks[0].size, pool.capacity() - HEADER_SIZE);
            }

            #[test]
            fn aligned_addresses_are_multiples(
                requests in proptest::collection::vec((1usize..200, 1u32..10), 1..20),
            ) {
                let pool = MemoryPool::new(65536).unwrap();
                for (size, pow) in requests {
                    let align = 1usize << pow;
                    if let Ok(p) = pool.allocate(size, align) {
                        prop_assert_eq!(p.addr() % align, 0);
                        prop_assert!(pool.usable_size(p).unwrap() >= size);
                    }
                }
            }
        }
    }
}
