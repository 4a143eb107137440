//! intring - Concurrent Fixed-Capacity Integer Ring Buffer
//!
//! Architecture:
//! - `core::RingBuffer`: circular slot array, read/write cursors and an
//!   occupied count behind a single mutex
//! - `core::BlockingRingBuffer`: optional condition-variable waiting on top
//!
//! ```
//! use intring::{BufferError, RingBuffer};
//!
//! let rb = RingBuffer::new(2)?;
//! rb.write(10)?;
//! rb.write(20)?;
//! assert_eq!(rb.write(30), Err(BufferError::Full));
//! assert_eq!(rb.read()?, 10);
//! rb.write(30)?;
//! assert_eq!(rb.drain(), vec![20, 30]);
//! assert!(rb.is_empty());
//! # Ok::<(), BufferError>(())
//! ```

pub mod core;

pub use crate::core::{BlockingRingBuffer, BufferError, RingBuffer, Snapshot, Value};
