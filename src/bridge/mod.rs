//! Bridge between the game console and IRC.
//!
//! ## Module Structure
//!
//! - `channels`: Communication channel structures
//! - `filter`: Live chat filtering
//! - `orchestrator`: Main bridge orchestrator (`Bridge` struct)

pub mod channels;
pub mod filter;
pub mod orchestrator;

pub use channels::ChannelBundle;
pub use orchestrator::Bridge;
