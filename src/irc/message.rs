//! RFC 1459 message parsing.
//!
//! `[:prefix SPACE] command [params] [SPACE :trailing]`

use crate::common::error::{ProtocolError, ProtocolResult};

/// A parsed protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub prefix: Option<String>,
    /// Command word, uppercased, or a three digit numeric.
    pub command: String,
    pub params: Vec<String>,
}

impl Message {
    /// Parse a single line (without CRLF).
    pub fn parse(line: &str) -> ProtocolResult<Self> {
        let mut rest = line.trim_start_matches(' ');

        // IRCv3 tags are not negotiated but may still show up on some servers.
        if rest.starts_with('@') {
            rest = rest.split_once(' ').map(|(_, r)| r).unwrap_or("");
        }

        let prefix = if let Some(stripped) = rest.strip_prefix(':') {
            let (prefix, remainder) = stripped.split_once(' ').unwrap_or((stripped, ""));
            rest = remainder;
            Some(prefix.to_string())
        } else {
            None
        };

        let rest = rest.trim_start_matches(' ');
        let (command, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
        if command.is_empty() {
            return Err(ProtocolError::Malformed {
                message: format!("no command in line '{}'", line),
            });
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            let (param, remainder) = rest.split_once(' ').unwrap_or((rest, ""));
            params.push(param.to_string());
            rest = remainder;
        }

        Ok(Self {
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }
}

/// Source of a message split into `nick!user@host`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NickMask {
    pub nick: String,
    pub user: Option<String>,
    pub host: Option<String>,
}

impl NickMask {
    pub fn parse(prefix: &str) -> Self {
        let (nick_user, host) = match prefix.split_once('@') {
            Some((left, host)) => (left, Some(host.to_string())),
            None => (prefix, None),
        };
        let (nick, user) = match nick_user.split_once('!') {
            Some((nick, user)) => (nick, Some(user.to_string())),
            None => (nick_user, None),
        };
        Self {
            nick: nick.to_string(),
            user,
            host,
        }
    }
}

/// True when `target` names a channel rather than a nickname.
pub fn is_channel(target: &str) -> bool {
    target.starts_with(['#', '&', '+', '!'])
}
