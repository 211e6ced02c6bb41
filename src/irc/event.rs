//! Typed protocol events.
//!
//! Every parsed [`Message`] becomes an [`Event`] with a closed
//! [`EventKind`]. Commands the session has no use for map to
//! [`EventKind::Other`].

use crate::irc::message::{is_channel, Message, NickMask};

/// Kinds of events the session can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Welcome,
    FeatureList,
    NamesReply,
    NicknameInUse,
    Join,
    Part,
    Quit,
    Kick,
    Nick,
    Mode,
    UserMode,
    Ping,
    PubMsg,
    PrivMsg,
    PubNotice,
    PrivNotice,
    Ctcp,
    Error,
    Other,
}

/// A protocol event with its routing information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    /// Raw command word or numeric.
    pub command: String,
    pub source: Option<String>,
    pub target: Option<String>,
    pub args: Vec<String>,
}

impl Event {
    /// Nickname part of the source, if the source is a user.
    pub fn source_nick(&self) -> Option<String> {
        self.source.as_deref().map(|s| NickMask::parse(s).nick)
    }

    /// First argument, or empty.
    pub fn arg(&self, index: usize) -> &str {
        self.args.get(index).map(String::as_str).unwrap_or("")
    }
}

impl From<Message> for Event {
    fn from(message: Message) -> Self {
        let Message {
            prefix,
            command,
            mut params,
        } = message;

        let (kind, target, args) = match command.as_str() {
            "PRIVMSG" | "NOTICE" => {
                let target = first(&mut params);
                let text = params.into_iter().next().unwrap_or_default();
                let to_channel = target.as_deref().is_some_and(is_channel);
                match ctcp_payload(&text) {
                    Some(inner) => {
                        let (word, rest) = inner.split_once(' ').unwrap_or((inner, ""));
                        let args = vec![word.to_string(), rest.to_string()];
                        (EventKind::Ctcp, target, args)
                    }
                    None => {
                        let kind = match (command.as_str(), to_channel) {
                            ("PRIVMSG", true) => EventKind::PubMsg,
                            ("PRIVMSG", false) => EventKind::PrivMsg,
                            (_, true) => EventKind::PubNotice,
                            (_, false) => EventKind::PrivNotice,
                        };
                        (kind, target, vec![text])
                    }
                }
            }
            "QUIT" => (EventKind::Quit, None, params),
            "PING" => {
                let target = params.first().cloned();
                (EventKind::Ping, target, params)
            }
            "MODE" => {
                let target = first(&mut params);
                let kind = if target.as_deref().is_some_and(is_channel) {
                    EventKind::Mode
                } else {
                    EventKind::UserMode
                };
                (kind, target, params)
            }
            other => {
                let kind = match other {
                    "001" => EventKind::Welcome,
                    "005" => EventKind::FeatureList,
                    "353" => EventKind::NamesReply,
                    "433" => EventKind::NicknameInUse,
                    "JOIN" => EventKind::Join,
                    "PART" => EventKind::Part,
                    "KICK" => EventKind::Kick,
                    "NICK" => EventKind::Nick,
                    "ERROR" => EventKind::Error,
                    _ => EventKind::Other,
                };
                let target = first(&mut params);
                (kind, target, params)
            }
        };

        Event {
            kind,
            command,
            source: prefix,
            target,
            args,
        }
    }
}

fn first(params: &mut Vec<String>) -> Option<String> {
    if params.is_empty() {
        None
    } else {
        Some(params.remove(0))
    }
}

fn ctcp_payload(text: &str) -> Option<&str> {
    text.strip_prefix('\x01')
        .map(|inner| inner.strip_suffix('\x01').unwrap_or(inner))
}
