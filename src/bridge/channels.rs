//! Bridge channel management.
//!
//! Groups the channels connecting the game console, the IRC session and
//! the shutdown control.

use tokio::sync::{mpsc, watch};

use crate::common::messages::ConsoleEvent;

/// Channels for the IRC session.
///
/// These are the receivers the session task listens on.
pub struct SessionChannels {
    /// Receiver for game console events.
    pub console_rx: mpsc::UnboundedReceiver<ConsoleEvent>,
    /// Receiver for the shutdown signal.
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Channels for the game console side.
pub struct ConsoleChannels {
    /// Sender the console publishes its events on.
    pub event_tx: mpsc::UnboundedSender<ConsoleEvent>,
}

/// Control channels for shutdown coordination.
pub struct ControlChannels {
    /// Sender to trigger shutdown.
    pub shutdown_tx: watch::Sender<bool>,
}

/// Bundle of all channels created by the bridge.
pub struct ChannelBundle {
    pub session: SessionChannels,
    pub console: ConsoleChannels,
    pub control: ControlChannels,
}

impl ChannelBundle {
    /// Create a new set of bridge channels.
    pub fn new() -> Self {
        let (event_tx, console_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            session: SessionChannels {
                console_rx,
                shutdown_rx,
            },
            console: ConsoleChannels { event_tx },
            control: ControlChannels { shutdown_tx },
        }
    }
}

impl Default for ChannelBundle {
    fn default() -> Self {
        Self::new()
    }
}
