//! Opt-in waiting layer over [`RingBuffer`]
//!
//! The core buffer fails fast. This wrapper adds producer/consumer waiting
//! with condition variables without touching the core's behavior:
//! - `*_timeout` waits at most the given duration, then reports the core error
//! - `*_blocking` waits until the operation succeeds
//! - `try_*` and `drain` never wait, but still wake waiters
//!
//! Waiters are only woken by operations issued through this wrapper.
//! Mutating the inner buffer directly bypasses the wake-ups.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::trace;

use super::error::{BufferError, Result};
use super::ring_buffer::{RingBuffer, Value};

#[derive(Debug)]
pub struct BlockingRingBuffer {
    buffer: RingBuffer,
    // Held from a failed attempt until the thread is parked, so a wake-up
    // sent in between cannot be lost.
    signal: Mutex<()>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl BlockingRingBuffer {
    /// # Errors
    /// [`BufferError::ZeroCapacity`] if `capacity == 0`.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self::from_buffer(RingBuffer::new(capacity)?))
    }

    pub fn from_buffer(buffer: RingBuffer) -> Self {
        Self {
            buffer,
            signal: Mutex::new(()),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    /// Shared access to the wrapped buffer, for inspection.
    pub fn buffer(&self) -> &RingBuffer {
        &self.buffer
    }

    pub fn into_inner(self) -> RingBuffer {
        self.buffer
    }

    /// Non-waiting read; same contract as [`RingBuffer::read`].
    pub fn try_read(&self) -> Result<Value> {
        let value = self.buffer.read()?;
        self.wake(&self.not_full, false);
        Ok(value)
    }

    /// Non-waiting write; same contract as [`RingBuffer::write`].
    pub fn try_write(&self, value: Value) -> Result<()> {
        self.buffer.write(value)?;
        self.wake(&self.not_empty, false);
        Ok(())
    }

    /// Same contract as [`RingBuffer::drain`]. Wakes every blocked writer.
    pub fn drain(&self) -> Vec<Value> {
        let drained = self.buffer.drain();
        if !drained.is_empty() {
            self.wake(&self.not_full, true);
        }
        drained
    }

    /// Waits up to `timeout` for a value.
    ///
    /// # Errors
    /// [`BufferError::Empty`] if the buffer stayed empty for the whole timeout.
    pub fn read_timeout(&self, timeout: Duration) -> Result<Value> {
        let value = self.wait_for(&self.not_empty, Some(timeout), || self.buffer.read())?;
        self.wake(&self.not_full, false);
        Ok(value)
    }

    /// Waits up to `timeout` for a free cell.
    ///
    /// # Errors
    /// [`BufferError::Full`] if the buffer stayed full for the whole timeout.
    pub fn write_timeout(&self, value: Value, timeout: Duration) -> Result<()> {
        self.wait_for(&self.not_full, Some(timeout), || self.buffer.write(value))?;
        self.wake(&self.not_empty, false);
        Ok(())
    }

    /// Waits until a value is available.
    pub fn read_blocking(&self) -> Value {
        loop {
            if let Ok(value) = self.wait_for(&self.not_empty, None, || self.buffer.read()) {
                self.wake(&self.not_full, false);
                return value;
            }
        }
    }

    /// Waits until a free cell is available.
    pub fn write_blocking(&self, value: Value) {
        loop {
            if self
                .wait_for(&self.not_full, None, || self.buffer.write(value))
                .is_ok()
            {
                self.wake(&self.not_empty, false);
                return;
            }
        }
    }

    /// Retries `attempt` until it succeeds or `timeout` elapses, parking on
    /// `condvar` between attempts. `None` waits indefinitely.
    fn wait_for<T>(
        &self,
        condvar: &Condvar,
        timeout: Option<Duration>,
        mut attempt: impl FnMut() -> Result<T>,
    ) -> Result<T> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut guard = self.signal.lock();

        loop {
            let err = match attempt() {
                Ok(value) => return Ok(value),
                Err(err @ (BufferError::Empty | BufferError::Full)) => err,
                Err(err) => return Err(err),
            };

            match deadline {
                Some(deadline) => {
                    if condvar.wait_until(&mut guard, deadline).timed_out() {
                        // One last attempt: the wake-up may have raced the deadline
                        return attempt().map_err(|_| {
                            trace!(error = %err, "wait timed out");
                            err
                        });
                    }
                }
                None => condvar.wait(&mut guard),
            }
        }
    }

    fn wake(&self, condvar: &Condvar, all: bool) {
        let _guard = self.signal.lock();
        if all {
            condvar.notify_all();
        } else {
            condvar.notify_one();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_try_ops_match_core() {
        let rb = BlockingRingBuffer::new(1).unwrap();

        assert_eq!(rb.try_read(), Err(BufferError::Empty));
        rb.try_write(9).unwrap();
        assert_eq!(rb.try_write(10), Err(BufferError::Full));
        assert_eq!(rb.try_read(), Ok(9));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            BlockingRingBuffer::new(0).unwrap_err(),
            BufferError::ZeroCapacity
        );
    }

    #[test]
    fn test_read_timeout_expires_on_empty() {
        let rb = BlockingRingBuffer::new(2).unwrap();
        let start = Instant::now();

        assert_eq!(
            rb.read_timeout(Duration::from_millis(20)),
            Err(BufferError::Empty)
        );
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_write_timeout_expires_on_full() {
        let rb = BlockingRingBuffer::new(1).unwrap();
        rb.try_write(1).unwrap();

        assert_eq!(
            rb.write_timeout(2, Duration::from_millis(20)),
            Err(BufferError::Full)
        );
        assert_eq!(rb.buffer().drain(), vec![1]);
    }

    #[test]
    fn test_blocked_reader_woken_by_writer() {
        let rb = Arc::new(BlockingRingBuffer::new(2).unwrap());

        let reader = {
            let rb = Arc::clone(&rb);
            thread::spawn(move || rb.read_blocking())
        };

        thread::sleep(Duration::from_millis(10));
        rb.try_write(77).unwrap();

        assert_eq!(reader.join().unwrap(), 77);
        assert!(rb.buffer().is_empty());
    }

    #[test]
    fn test_blocked_writer_woken_by_drain() {
        let rb = Arc::new(BlockingRingBuffer::new(2).unwrap());
        rb.try_write(1).unwrap();
        rb.try_write(2).unwrap();

        let writer = {
            let rb = Arc::clone(&rb);
            thread::spawn(move || rb.write_timeout(3, Duration::from_secs(5)))
        };

        thread::sleep(Duration::from_millis(10));
        assert_eq!(rb.drain(), vec![1, 2]);

        assert_eq!(writer.join().unwrap(), Ok(()));
        assert_eq!(rb.drain(), vec![3]);
    }

    #[test]
    fn test_blocking_producer_consumer_keeps_order() {
        const ITEMS: Value = 1_000;
        let rb = Arc::new(BlockingRingBuffer::new(4).unwrap());

        let producer = {
            let rb = Arc::clone(&rb);
            thread::spawn(move || {
                for v in 0..ITEMS {
                    rb.write_blocking(v);
                }
            })
        };

        let received: Vec<Value> = (0..ITEMS).map(|_| rb.read_blocking()).collect();
        producer.join().unwrap();

        assert_eq!(received, (0..ITEMS).collect::<Vec<_>>());
        assert!(rb.buffer().is_empty());
    }
}
