//! IRC commands (`!help`, `!lookup`, `@status`, ...).
//!
//! Handles command registration, privilege gating and execution.

pub mod builtin;
pub mod dispatch;
pub mod registry;

use std::fmt;

use crate::bot::{Bot, Channel, Client};
use crate::common::error::ProtocolResult;

pub use dispatch::{on_pubmsg, parse_command};
pub use registry::CommandRegistry;

/// Minimum channel privilege needed to run a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Anyone in the channel.
    User = 0,
    /// Voiced users and operators.
    Voiced = 1,
    Operator = 2,
}

impl Level {
    /// Clamp a configured level into the known range.
    pub fn clamp(level: i64) -> Self {
        match level {
            i64::MIN..=0 => Level::User,
            1 => Level::Voiced,
            _ => Level::Operator,
        }
    }
}

/// Signature of a command handler: context and the data after the addressing token.
pub type Handler = fn(&mut Context<'_>, &str) -> anyhow::Result<()>;

/// A registered command.
#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub level: Level,
    pub handler: Handler,
    pub help: &'static str,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

impl Command {
    /// Whether `client` holds enough privilege in `channel`.
    pub fn can_use(&self, channel: Option<&Channel>, client: &Client) -> bool {
        match self.level {
            Level::User => true,
            Level::Voiced => {
                channel.is_some_and(|ch| client.is_voiced(ch) || client.is_oper(ch))
            }
            Level::Operator => channel.is_some_and(|ch| client.is_oper(ch)),
        }
    }
}

/// Per-invocation execution context.
pub struct Context<'a> {
    pub bot: &'a mut Bot,
    pub registry: &'a CommandRegistry,
    pub invoker: Client,
    /// Replies go to the channel instead of a private notice.
    pub loud: bool,
}

impl<'a> Context<'a> {
    /// The channel the command was issued in.
    pub fn channel(&self) -> Option<&Channel> {
        self.bot.channel(self.invoker.channel())
    }

    pub fn channel_mut(&mut self) -> Option<&mut Channel> {
        self.bot.channel_mut(self.invoker.channel())
    }

    /// Answer in the channel when loud, privately otherwise.
    pub fn reply(&self, text: &str) -> ProtocolResult<()> {
        match self.channel().filter(|_| self.loud) {
            Some(channel) => channel.message(text),
            None => self.invoker.message(text),
        }
    }

    /// Answer privately regardless of loudness.
    pub fn tell(&self, text: &str) -> ProtocolResult<()> {
        self.invoker.message(text)
    }

    /// Message the whole channel.
    pub fn announce(&self, text: &str) -> ProtocolResult<()> {
        match self.channel() {
            Some(channel) => channel.message(text),
            None => self.invoker.message(text),
        }
    }

    /// The quiet command prefix, for usage hints.
    pub fn prefix(&self) -> char {
        self.registry.prefix()
    }
}
