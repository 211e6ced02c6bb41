//! IRC session engine and the state it owns.
//!
//! This module contains:
//! - `Bot`: nickname, joined channels and the link to the server
//! - Channel and client state tracking
//! - The outbound queue and its writer task
//! - Admin bridge operations against the game console
//! - The session loop and its event handlers

pub mod admin;
pub mod channel;
pub mod client;
mod handlers;
pub mod outbox;
pub mod session;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::common::error::ProtocolResult;
use crate::config::Config;
use crate::game::Console;
use crate::irc::casemap::{irc_eq, irc_to_lower};
use crate::irc::framer::Framer;
use crate::irc::modes::Features;

pub use channel::Channel;
pub use client::Client;
pub use outbox::Outbox;
pub use session::Session;

/// Where the session is in its connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    /// Socket open, registration not yet confirmed.
    Connected,
    Registered,
    JoinedChannel,
}

/// Requests a command handler can leave for the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Reconnect,
}

/// State owned by the session task.
pub struct Bot {
    config: Arc<Config>,
    console: Arc<dyn Console>,
    outbox: Outbox,
    /// Cleared by the writer task when the socket fails.
    link: Option<Arc<AtomicBool>>,
    nickname: String,
    state: LinkState,
    /// Keyed by folded channel name.
    channels: HashMap<String, Channel>,
    features: Features,
    request: Option<Request>,
}

impl Bot {
    pub fn new(config: Arc<Config>, console: Arc<dyn Console>) -> Self {
        let outbox = Outbox::detached(Framer::new(config.irc.wrap_width));
        let nickname = config.irc.nickname.clone();
        Self {
            config,
            console,
            outbox,
            link: None,
            nickname,
            state: LinkState::Disconnected,
            channels: HashMap::new(),
            features: Features::default(),
            request: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn console(&self) -> &Arc<dyn Console> {
        &self.console
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Current nickname as confirmed by the server.
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn set_nickname(&mut self, nickname: &str) {
        if self.nickname != nickname {
            info!("Nickname is now {}", nickname);
            self.nickname = nickname.to_string();
        }
    }

    /// True when `nick` is this bot.
    pub fn is_me(&self, nick: &str) -> bool {
        irc_eq(&self.nickname, nick)
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn set_state(&mut self, state: LinkState) {
        if self.state != state {
            debug!("Link state {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Bind to a fresh connection.
    pub fn attach(&mut self, outbox: Outbox, link: Arc<AtomicBool>) {
        self.outbox = outbox;
        self.link = Some(link);
        self.nickname = self.config.irc.nickname.clone();
        self.set_state(LinkState::Connected);
    }

    /// Drop the connection and every piece of channel state built on it.
    pub fn detach(&mut self) {
        self.channels.clear();
        self.features = Features::default();
        self.outbox = Outbox::detached(Framer::new(self.config.irc.wrap_width));
        self.link = None;
        self.set_state(LinkState::Disconnected);
    }

    /// Link health as seen by the writer; a missing link counts as healthy.
    pub fn is_connected(&self) -> bool {
        self.link
            .as_ref()
            .map_or(true, |link| link.load(Ordering::SeqCst))
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut Features {
        &mut self.features
    }

    // ---- channels ----

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(&irc_to_lower(name))
    }

    pub fn channel_mut(&mut self, name: &str) -> Option<&mut Channel> {
        self.channels.get_mut(&irc_to_lower(name))
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut Channel> {
        self.channels.values_mut()
    }

    /// Create fresh state for a channel the bot just joined.
    pub fn add_channel(&mut self, name: &str) -> &mut Channel {
        let settings = &self.config.settings;
        let mut channel = Channel::new(name, self.outbox.clone());
        channel.show_bans = settings.showbans;
        channel.show_kicks = settings.showkicks;
        channel.show_game = settings.showgame;
        channel.live_chat = settings.livechat;

        info!(channel = %name, "Joined channel");
        self.set_state(LinkState::JoinedChannel);
        match self.channels.entry(irc_to_lower(name)) {
            Entry::Occupied(mut entry) => {
                entry.insert(channel);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(channel),
        }
    }

    pub fn remove_channel(&mut self, name: &str) -> Option<Channel> {
        let removed = self.channels.remove(&irc_to_lower(name));
        if removed.is_some() {
            debug!(channel = %name, "Dropped channel state");
        }
        removed
    }

    // ---- requests ----

    pub fn request(&mut self, request: Request) {
        self.request = Some(request);
    }

    pub fn take_request(&mut self) -> Option<Request> {
        self.request.take()
    }

    pub fn quit(&self, reason: &str) -> ProtocolResult<()> {
        self.outbox.quit(reason)
    }
}
