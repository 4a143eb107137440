//! Core module: mutex-guarded fixed-capacity integer ring buffer
//!
//! Design principles:
//! - One lock per instance: every operation, inspection included, holds it
//!   for its whole body
//! - Fail fast: full/empty conditions are reported, never waited on
//! - No resizing: all cells are allocated at construction
//! - Waiting is opt-in through `BlockingRingBuffer`

mod blocking;
mod error;
mod ring_buffer;

pub use blocking::BlockingRingBuffer;
pub use error::{BufferError, Result};
pub use ring_buffer::{RingBuffer, Snapshot, Value};
