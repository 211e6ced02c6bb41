//! IRC-side user handle.

use crate::bot::channel::Channel;
use crate::bot::outbox::Outbox;
use crate::common::error::ProtocolResult;
use crate::irc::colors::convert_colors;

/// A user seen in a channel.
///
/// Holds the channel by name only; privilege questions are answered by the
/// owning [`Channel`].
#[derive(Debug, Clone)]
pub struct Client {
    nick: String,
    channel: String,
    outbox: Outbox,
}

impl Client {
    pub(crate) fn new(nick: &str, channel: &str, outbox: Outbox) -> Self {
        Self {
            nick: nick.to_string(),
            channel: channel.to_string(),
            outbox,
        }
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Name of the channel this handle belongs to.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub(crate) fn rename(&mut self, nick: &str) {
        self.nick = nick.to_string();
    }

    /// Send a private notice to this user.
    pub fn message(&self, text: &str) -> ProtocolResult<()> {
        self.outbox.notice(&self.nick, &convert_colors(text))
    }

    pub fn is_oper(&self, channel: &Channel) -> bool {
        channel.is_oper(self)
    }

    pub fn is_voiced(&self, channel: &Channel) -> bool {
        channel.is_voiced(self)
    }

    pub fn is_owner(&self, channel: &Channel) -> bool {
        channel.is_owner(self)
    }

    pub fn is_halfop(&self, channel: &Channel) -> bool {
        channel.is_halfop(self)
    }
}

impl AsRef<str> for Client {
    fn as_ref(&self) -> &str {
        &self.nick
    }
}
