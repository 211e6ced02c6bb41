//! IRC protocol layer: line codec, message parsing, typed events,
//! case mapping, mode parsing, colors and output framing.

pub mod casemap;
pub mod codec;
pub mod colors;
pub mod event;
pub mod framer;
pub mod message;
pub mod modes;

pub use event::{Event, EventKind};
pub use framer::Framer;
pub use message::Message;
