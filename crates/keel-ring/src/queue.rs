//! The [`FrameQueue`] ring buffer.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use keel_core::{HeapMemory, RawMemory};

use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::frame::{read_wrapped, write_wrapped, LengthPrefix, MAX_PREFIX};

/// Point-in-time view of a queue's cursors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueCursors {
    /// Offset of the oldest frame's prefix.
    pub front: usize,
    /// Offset where the next frame will be written.
    pub rear: usize,
    /// Number of frames held.
    pub count: usize,
    /// Unused bytes.
    pub free: usize,
    /// Arena size in bytes.
    pub capacity: usize,
}

/// Arena plus cursors of an initialised queue.
struct Ring {
    arena: Box<[u8]>,
    front: usize,
    rear: usize,
    count: usize,
    free: usize,
}

impl Ring {
    fn capacity(&self) -> usize {
        self.arena.len()
    }

    /// Payload length of the front frame. Requires `count > 0`.
    fn front_len(&self, prefix: LengthPrefix) -> usize {
        let mut raw = [0u8; MAX_PREFIX];
        read_wrapped(&self.arena, self.front, &mut raw[..prefix.width()]);
        prefix.decode(&raw)
    }

    /// Copy the front frame's payload into the start of `out`.
    fn copy_front(&self, prefix: LengthPrefix, out: &mut [u8]) {
        let at = (self.front + prefix.width()) % self.capacity();
        read_wrapped(&self.arena, at, out);
    }

    fn pop_front(&mut self, prefix: LengthPrefix, len: usize) {
        let total = prefix.width() + len;
        self.front = (self.front + total) % self.capacity();
        self.free += total;
        self.count -= 1;
    }

    fn cursors(&self) -> QueueCursors {
        QueueCursors {
            front: self.front,
            rear: self.rear,
            count: self.count,
            free: self.free,
            capacity: self.capacity(),
        }
    }
}

/// FIFO of variable-length byte frames in a fixed-capacity arena.
///
/// A queue starts uninitialised unless built with
/// [`with_capacity`](Self::with_capacity) or
/// [`from_config`](Self::from_config); every data operation on an
/// uninitialised queue returns [`QueueError::Uninitialized`]. The arena
/// comes from the queue's [`RawMemory`] provider and goes back to it on
/// [`destroy`](Self::destroy), re-[`init`](Self::init), or drop.
///
/// All methods take `&self`; the queue can be shared behind an `Arc` by
/// producers and consumers on different threads.
pub struct FrameQueue<M: RawMemory = HeapMemory> {
    ring: Mutex<Option<Ring>>,
    memory: M,
    prefix: LengthPrefix,
}

// Compile-time assertion: queues can be shared across threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<FrameQueue>();
};

impl FrameQueue<HeapMemory> {
    /// Uninitialised heap-backed queue with the default length prefix.
    pub fn new() -> Self {
        Self::with_memory(HeapMemory, LengthPrefix::default())
    }

    /// Heap-backed queue initialised to `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Result<Self, QueueError> {
        let queue = Self::new();
        queue.init(capacity)?;
        Ok(queue)
    }
}

impl Default for FrameQueue<HeapMemory> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMemory> FrameQueue<M> {
    /// Uninitialised queue drawing its arena from `memory`.
    pub fn with_memory(memory: M, prefix: LengthPrefix) -> Self {
        Self {
            ring: Mutex::new(None),
            memory,
            prefix,
        }
    }

    /// Validate `config` and build an initialised queue from it.
    pub fn from_config(config: QueueConfig, memory: M) -> Result<Self, QueueError> {
        config.validate()?;
        let queue = Self::with_memory(memory, config.prefix);
        queue.init(config.capacity)?;
        Ok(queue)
    }

    /// The queue's length-prefix width.
    pub fn prefix(&self) -> LengthPrefix {
        self.prefix
    }

    /// Give the queue a fresh, empty arena of `capacity` bytes.
    ///
    /// An existing arena is handed back to the provider first, discarding
    /// any frames it held. If the provider then fails, the queue is left
    /// uninitialised.
    pub fn init(&self, capacity: usize) -> Result<(), QueueError> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }
        let mut ring = self.lock();
        if let Some(old) = ring.take() {
            tracing::debug!(
                old_capacity = old.capacity(),
                capacity,
                "frame queue re-initialising"
            );
            self.memory.release(old.arena);
        }
        let arena = self
            .memory
            .allocate(capacity)
            .map_err(QueueError::ArenaUnavailable)?;
        *ring = Some(Ring {
            arena,
            front: 0,
            rear: 0,
            count: 0,
            free: capacity,
        });
        tracing::debug!(capacity, prefix = ?self.prefix, "frame queue initialised");
        Ok(())
    }

    /// Return the arena to the provider and drop all frames.
    ///
    /// A no-op on an uninitialised queue. The queue can be
    /// [`init`](Self::init)ialised again afterwards.
    pub fn destroy(&self) {
        if let Some(ring) = self.lock().take() {
            tracing::debug!(capacity = ring.capacity(), "frame queue destroyed");
            self.memory.release(ring.arena);
        }
    }

    /// Whether the queue currently has an arena.
    pub fn is_initialized(&self) -> bool {
        self.lock().is_some()
    }

    /// Append `item` as one frame.
    ///
    /// Fails without touching the queue if the item length cannot be
    /// recorded in the prefix or the frame does not fit in the free bytes.
    pub fn enqueue(&self, item: &[u8]) -> Result<(), QueueError> {
        let mut guard = self.lock();
        let ring = guard.as_mut().ok_or(QueueError::Uninitialized)?;

        let max = self.prefix.max_len();
        if item.len() > max {
            return Err(QueueError::ItemTooLarge {
                len: item.len(),
                max,
            });
        }
        let needed = self.prefix.width() + item.len();
        if needed > ring.free {
            return Err(QueueError::InsufficientSpace {
                needed,
                free: ring.free,
            });
        }

        let mut raw = [0u8; MAX_PREFIX];
        let header = self.prefix.encode(item.len(), &mut raw);
        let capacity = ring.capacity();
        write_wrapped(&mut ring.arena, ring.rear, header);
        let payload_at = (ring.rear + header.len()) % capacity;
        write_wrapped(&mut ring.arena, payload_at, item);

        ring.rear = (ring.rear + needed) % capacity;
        ring.free -= needed;
        ring.count += 1;
        Ok(())
    }

    /// Copy the front frame into `buf` without removing it.
    ///
    /// Returns the frame's payload length; bytes of `buf` past that length
    /// are left untouched.
    pub fn peek(&self, buf: &mut [u8]) -> Result<usize, QueueError> {
        let guard = self.lock();
        let ring = guard.as_ref().ok_or(QueueError::Uninitialized)?;
        self.read_front(ring, buf)
    }

    /// Remove the front frame, copying it into `buf`.
    ///
    /// Returns the frame's payload length. If `buf` is too short the call
    /// fails with [`QueueError::BufferTooSmall`] and the frame stays queued.
    pub fn dequeue(&self, buf: &mut [u8]) -> Result<usize, QueueError> {
        let mut guard = self.lock();
        let ring = guard.as_mut().ok_or(QueueError::Uninitialized)?;
        let len = self.read_front(ring, buf)?;
        ring.pop_front(self.prefix, len);
        Ok(len)
    }

    /// Remove the front frame into a freshly allocated, exactly sized `Vec`.
    pub fn dequeue_vec(&self) -> Result<Vec<u8>, QueueError> {
        let mut guard = self.lock();
        let ring = guard.as_mut().ok_or(QueueError::Uninitialized)?;
        if ring.count == 0 {
            return Err(QueueError::Empty);
        }
        let len = ring.front_len(self.prefix);
        let mut out = vec![0u8; len];
        ring.copy_front(self.prefix, &mut out);
        ring.pop_front(self.prefix, len);
        Ok(out)
    }

    /// Number of frames held. Zero when uninitialised.
    pub fn len(&self) -> usize {
        self.lock().as_ref().map_or(0, |ring| ring.count)
    }

    /// Whether the queue holds no frames.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unused bytes. Zero when uninitialised.
    pub fn free_bytes(&self) -> usize {
        self.lock().as_ref().map_or(0, |ring| ring.free)
    }

    /// Arena size in bytes. Zero when uninitialised.
    pub fn capacity(&self) -> usize {
        self.lock().as_ref().map_or(0, Ring::capacity)
    }

    /// Snapshot of the cursors, or `None` when uninitialised.
    pub fn cursors(&self) -> Option<QueueCursors> {
        self.lock().as_ref().map(Ring::cursors)
    }

    fn read_front(&self, ring: &Ring, buf: &mut [u8]) -> Result<usize, QueueError> {
        if ring.count == 0 {
            return Err(QueueError::Empty);
        }
        let len = ring.front_len(self.prefix);
        if len > buf.len() {
            return Err(QueueError::BufferTooSmall {
                required: len,
                provided: buf.len(),
            });
        }
        ring.copy_front(self.prefix, &mut buf[..len]);
        Ok(len)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Ring>> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<M: RawMemory> Drop for FrameQueue<M> {
    fn drop(&mut self) {
        let ring = self.ring.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(ring) = ring.take() {
            tracing::debug!(capacity = ring.capacity(), "frame queue destroyed");
            self.memory.release(ring.arena);
        }
    }
}

impl<M: RawMemory> fmt::Debug for FrameQueue<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameQueue")
            .field("prefix", &self.prefix)
            .field("cursors", &self.cursors())
            .finish_non_exhaustive()
    }
}
