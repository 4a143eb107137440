//! Mutex-Guarded Fixed-Capacity Integer Ring Buffer
//!
//! Every operation takes the single per-instance lock for its whole body,
//! inspection accessors included, so observers always see a consistent state.
//! Nothing blocks: `write` on a full buffer and `read` on an empty one fail
//! immediately. Waiting semantics live in [`super::BlockingRingBuffer`].

use std::fmt;

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::error::{BufferError, Result};

/// Element type stored in the buffer.
pub type Value = i64;

/// Cursor and slot state, only ever touched under the lock.
///
/// Invariants:
/// - `occupied <= slots.len()`
/// - `write == (read + occupied) % slots.len()`
/// - exactly the `occupied` cells starting at `read` (wrapping) are `Some`
#[derive(Debug)]
struct State {
    slots: Box<[Option<Value>]>,
    occupied: usize,
    read: usize,
    write: usize,
}

impl State {
    fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity].into_boxed_slice(),
            occupied: 0,
            read: 0,
            write: 0,
        }
    }

    #[inline(always)]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline(always)]
    fn advance(&self, cursor: usize) -> usize {
        (cursor + 1) % self.capacity()
    }

    #[inline(always)]
    fn debug_check(&self) {
        debug_assert!(self.occupied <= self.capacity());
        debug_assert_eq!(self.write, (self.read + self.occupied) % self.capacity());
        debug_assert_eq!(
            self.slots.iter().filter(|cell| cell.is_some()).count(),
            self.occupied
        );
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            capacity: self.capacity(),
            occupied: self.occupied,
            read_cursor: self.read,
            write_cursor: self.write,
            cells: self.slots.to_vec(),
        }
    }
}

/// Point-in-time copy of the whole buffer, taken under one lock acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub capacity: usize,
    pub occupied: usize,
    pub read_cursor: usize,
    pub write_cursor: usize,
    /// Cell contents in index order, `None` for an empty cell.
    pub cells: Vec<Option<Value>>,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[")?;
        writeln!(f, " capacity: {}", self.capacity)?;
        writeln!(f, " occupied: {}", self.occupied)?;
        writeln!(f, " read cursor: {}", self.read_cursor)?;
        writeln!(f, " write cursor: {}", self.write_cursor)?;
        writeln!(f, " cells:")?;
        for (index, cell) in self.cells.iter().enumerate() {
            match cell {
                Some(value) => writeln!(f, "  [{}: {}]", index, value)?,
                None => writeln!(f, "  [{}: empty]", index)?,
            }
        }
        write!(f, "]")
    }
}

/// Thread-safe circular buffer of [`Value`]s with a capacity fixed at construction.
///
/// Share it between threads with `Arc<RingBuffer>`; all methods take `&self`.
#[derive(Debug)]
pub struct RingBuffer {
    state: Mutex<State>,
}

impl RingBuffer {
    /// Creates a buffer with `capacity` empty cells and both cursors at 0.
    ///
    /// # Errors
    /// [`BufferError::ZeroCapacity`] if `capacity == 0`.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(BufferError::ZeroCapacity);
        }

        debug!(capacity, "ring buffer created");

        Ok(Self {
            state: Mutex::new(State::new(capacity)),
        })
    }

    /// Removes and returns the oldest value.
    ///
    /// The cell is cleared, not just skipped.
    ///
    /// # Errors
    /// [`BufferError::Empty`] if nothing is stored. State is left untouched.
    pub fn read(&self) -> Result<Value> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if state.occupied == 0 {
            trace!("read rejected: buffer empty");
            return Err(BufferError::Empty);
        }

        let value = state.slots[state.read].take().ok_or(BufferError::Empty)?;
        state.read = state.advance(state.read);
        state.occupied -= 1;

        state.debug_check();
        Ok(value)
    }

    /// Stores `value` at the tail.
    ///
    /// # Errors
    /// [`BufferError::Full`] if every cell is occupied. State is left untouched.
    pub fn write(&self, value: Value) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if state.occupied == state.capacity() {
            trace!(value, "write rejected: buffer full");
            return Err(BufferError::Full);
        }

        state.slots[state.write] = Some(value);
        state.write = state.advance(state.write);
        state.occupied += 1;

        state.debug_check();
        Ok(())
    }

    /// Removes every stored value in one critical section, oldest first.
    ///
    /// The walk is bounded by the occupied count: a full buffer has
    /// `read == write` before the walk starts and must still yield every cell.
    pub fn drain(&self) -> Vec<Value> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let count = state.occupied;
        let mut drained = Vec::with_capacity(count);
        let mut cursor = state.read;

        for _ in 0..count {
            let cell = state.slots[cursor].take();
            debug_assert!(cell.is_some(), "occupied cell {} was empty", cursor);
            drained.extend(cell);
            cursor = state.advance(cursor);
        }

        state.read = state.write;
        state.occupied = 0;

        trace!(drained = drained.len(), "buffer drained");
        state.debug_check();
        drained
    }

    /// Number of cells.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.state.lock().capacity()
    }

    /// Number of occupied cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.state.lock().occupied
    }

    /// Number of free cells.
    #[inline]
    pub fn available(&self) -> usize {
        let state = self.state.lock();
        state.capacity() - state.occupied
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.state.lock().occupied == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        let state = self.state.lock();
        state.occupied == state.capacity()
    }

    /// Index of the next cell to read.
    #[inline]
    pub fn read_cursor(&self) -> usize {
        self.state.lock().read
    }

    /// Index of the next cell to write.
    #[inline]
    pub fn write_cursor(&self) -> usize {
        self.state.lock().write
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.lock().snapshot()
    }

    /// Human-readable dump of capacity, count, cursors and every cell.
    pub fn describe(&self) -> String {
        self.snapshot().to_string()
    }
}

impl fmt::Display for RingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Copy out first so the lock is not held while the formatter writes.
        let snapshot = self.snapshot();
        fmt::Display::fmt(&snapshot, f)
    }
}
