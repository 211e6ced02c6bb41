//! Game console side of the bridge.
//!
//! This module contains:
//! - The `Console` trait the session calls into
//! - An in-memory console implementation

pub mod console;
pub mod memory;

pub use console::{Console, OutputSink};
pub use memory::MemoryConsole;
