//! Conversation memory implementations for LedgerLoop.

pub mod buffer;
pub mod noop;

pub use buffer::{BufferMemory, Turn};
pub use noop::NoopMemory;
