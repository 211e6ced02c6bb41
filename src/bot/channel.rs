//! Per-channel membership, privilege and mode state.
//!
//! Nicknames are keyed by their RFC 1459 folded form. The four privilege
//! tables hold keys into the membership table, so a nick can only carry a
//! privilege while it is a member.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::bot::client::Client;
use crate::bot::outbox::Outbox;
use crate::common::error::{ChannelError, ProtocolResult};
use crate::common::messages::Toggle;
use crate::irc::casemap::irc_to_lower;
use crate::irc::colors::convert_colors;

/// Channel privileges tracked per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Privilege {
    Operator,
    Voice,
    Owner,
    HalfOp,
}

impl Privilege {
    pub const ALL: [Privilege; 4] = [
        Privilege::Operator,
        Privilege::Voice,
        Privilege::Owner,
        Privilege::HalfOp,
    ];

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'o' => Some(Privilege::Operator),
            'v' => Some(Privilege::Voice),
            'q' => Some(Privilege::Owner),
            'h' => Some(Privilege::HalfOp),
            _ => None,
        }
    }
}

/// A joined IRC channel.
#[derive(Debug)]
pub struct Channel {
    name: String,
    /// Channel mode letters, in the order they were set.
    modes: Vec<char>,
    users: HashMap<String, Client>,
    opers: HashSet<String>,
    voiced: HashSet<String>,
    owners: HashSet<String>,
    halfops: HashSet<String>,
    pub show_bans: bool,
    pub show_kicks: bool,
    pub show_game: bool,
    pub live_chat: bool,
    outbox: Outbox,
}

impl Channel {
    pub fn new(name: &str, outbox: Outbox) -> Self {
        Self {
            name: name.to_string(),
            modes: Vec::new(),
            users: HashMap::new(),
            opers: HashSet::new(),
            voiced: HashSet::new(),
            owners: HashSet::new(),
            halfops: HashSet::new(),
            show_bans: true,
            show_kicks: true,
            show_game: true,
            live_chat: false,
            outbox,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read a broadcast switch.
    pub fn flag(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::LiveChat => self.live_chat,
            Toggle::ShowBans => self.show_bans,
            Toggle::ShowKicks => self.show_kicks,
            Toggle::ShowGame => self.show_game,
        }
    }

    /// Set a broadcast switch, returning whether it changed.
    pub fn set_flag(&mut self, toggle: Toggle, on: bool) -> bool {
        let slot = match toggle {
            Toggle::LiveChat => &mut self.live_chat,
            Toggle::ShowBans => &mut self.show_bans,
            Toggle::ShowKicks => &mut self.show_kicks,
            Toggle::ShowGame => &mut self.show_game,
        };
        let changed = *slot != on;
        *slot = on;
        changed
    }

    fn table(&self, privilege: Privilege) -> &HashSet<String> {
        match privilege {
            Privilege::Operator => &self.opers,
            Privilege::Voice => &self.voiced,
            Privilege::Owner => &self.owners,
            Privilege::HalfOp => &self.halfops,
        }
    }

    fn table_mut(&mut self, privilege: Privilege) -> &mut HashSet<String> {
        match privilege {
            Privilege::Operator => &mut self.opers,
            Privilege::Voice => &mut self.voiced,
            Privilege::Owner => &mut self.owners,
            Privilege::HalfOp => &mut self.halfops,
        }
    }

    // ---- membership ----

    /// Nicknames of every member.
    pub fn users(&self) -> impl Iterator<Item = &str> {
        self.users.values().map(Client::nick)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Add a member; a no-op when already present.
    pub fn add_user(&mut self, nick: &str) {
        let key = irc_to_lower(nick);
        if self.users.contains_key(&key) {
            return;
        }
        debug!(channel = %self.name, "adding user {}", nick);
        let client = Client::new(nick, &self.name, self.outbox.clone());
        self.users.insert(key, client);
    }

    /// Drop a member and every privilege it held.
    pub fn remove_user(&mut self, nick: impl AsRef<str>) {
        let key = irc_to_lower(nick.as_ref());
        if self.users.remove(&key).is_some() {
            debug!(channel = %self.name, "removing user {}", nick.as_ref());
        }
        for privilege in Privilege::ALL {
            self.table_mut(privilege).remove(&key);
        }
    }

    pub fn has_user(&self, nick: impl AsRef<str>) -> bool {
        self.users.contains_key(&irc_to_lower(nick.as_ref()))
    }

    pub fn get_user(&self, nick: impl AsRef<str>) -> Option<&Client> {
        self.users.get(&irc_to_lower(nick.as_ref()))
    }

    fn has_privilege(&self, privilege: Privilege, nick: &str) -> bool {
        self.table(privilege).contains(&irc_to_lower(nick))
    }

    pub fn is_oper(&self, nick: impl AsRef<str>) -> bool {
        self.has_privilege(Privilege::Operator, nick.as_ref())
    }

    pub fn is_voiced(&self, nick: impl AsRef<str>) -> bool {
        self.has_privilege(Privilege::Voice, nick.as_ref())
    }

    pub fn is_owner(&self, nick: impl AsRef<str>) -> bool {
        self.has_privilege(Privilege::Owner, nick.as_ref())
    }

    pub fn is_halfop(&self, nick: impl AsRef<str>) -> bool {
        self.has_privilege(Privilege::HalfOp, nick.as_ref())
    }

    /// Apply a signed privilege change such as `+o` or `-v` to a member.
    pub fn set_usermode(&mut self, mode: &str, nick: impl AsRef<str>) -> Result<(), ChannelError> {
        let (sign, privilege) = parse_delta(mode)
            .and_then(|(sign, letter)| Privilege::from_letter(letter).map(|p| (sign, p)))
            .ok_or_else(|| ChannelError::InvalidMode {
                mode: mode.to_string(),
            })?;

        let nick = nick.as_ref();
        let key = irc_to_lower(nick);
        if sign == '+' {
            if !self.users.contains_key(&key) {
                return Err(ChannelError::NoSuchUser {
                    channel: self.name.clone(),
                    nick: nick.to_string(),
                });
            }
            debug!(channel = %self.name, "setting mode {} for {}", mode, nick);
            self.table_mut(privilege).insert(key);
        } else if self.table_mut(privilege).remove(&key) {
            debug!(channel = %self.name, "setting mode {} for {}", mode, nick);
        }
        Ok(())
    }

    /// Rename a member across membership and every privilege table.
    ///
    /// Returns false when `old` is not a member.
    pub fn change_nick(&mut self, old: &str, new: &str) -> bool {
        let old_key = irc_to_lower(old);
        let Some(mut client) = self.users.remove(&old_key) else {
            return false;
        };
        let new_key = irc_to_lower(new);
        client.rename(new);
        self.users.insert(new_key.clone(), client);

        for privilege in Privilege::ALL {
            let table = self.table_mut(privilege);
            if table.remove(&old_key) {
                table.insert(new_key.clone());
            }
        }
        debug!(channel = %self.name, "renamed {} to {}", old, new);
        true
    }

    // ---- channel modes ----

    /// Apply a signed channel mode such as `+m` or `-t`.
    pub fn set_mode(&mut self, mode: &str) -> Result<(), ChannelError> {
        let (sign, letter) = parse_delta(mode).ok_or_else(|| ChannelError::InvalidMode {
            mode: mode.to_string(),
        })?;

        debug!(channel = %self.name, "setting mode {}", mode);
        if sign == '+' {
            if !self.modes.contains(&letter) {
                self.modes.push(letter);
            }
        } else {
            self.modes.retain(|&m| m != letter);
        }
        Ok(())
    }

    pub fn modes(&self) -> &[char] {
        &self.modes
    }

    pub fn has_mode(&self, mode: char) -> bool {
        self.modes.contains(&mode)
    }

    pub fn is_moderated(&self) -> bool {
        self.has_mode('m')
    }

    pub fn is_secret(&self) -> bool {
        self.has_mode('s')
    }

    pub fn is_protected(&self) -> bool {
        self.has_mode('p')
    }

    pub fn has_topic_lock(&self) -> bool {
        self.has_mode('t')
    }

    pub fn is_invite_only(&self) -> bool {
        self.has_mode('i')
    }

    /// True when `+n` (no external messages) is set.
    pub fn has_allow_external_messages(&self) -> bool {
        self.has_mode('n')
    }

    pub fn has_limit(&self) -> bool {
        self.has_mode('l')
    }

    pub fn has_key(&self) -> bool {
        self.has_mode('k')
    }

    // ---- output ----

    /// Send `text` to the whole channel.
    pub fn message(&self, text: &str) -> ProtocolResult<()> {
        self.outbox.privmsg(&self.name, &convert_colors(text))
    }
}

/// Split `+x` / `-x` into sign and letter.
fn parse_delta(mode: &str) -> Option<(char, char)> {
    let mut chars = mode.chars();
    let sign = chars.next().filter(|c| matches!(c, '+' | '-'))?;
    let letter = chars.next()?;
    chars.next().is_none().then_some((sign, letter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::outbox::{drain, test_outbox};

    fn channel() -> Channel {
        let (outbox, _rx) = test_outbox();
        Channel::new("#test", outbox)
    }

    #[test]
    fn test_add_user_idempotent_and_case_insensitive() {
        let mut ch = channel();
        ch.add_user("Alice");
        ch.add_user("alice");
        assert_eq!(ch.user_count(), 1);
        assert!(ch.has_user("ALICE"));
        assert_eq!(ch.get_user("alice").unwrap().nick(), "Alice");
    }

    #[test]
    fn test_usermode_idempotent_for_every_letter() {
        for letter in ['o', 'v', 'q', 'h'] {
            let mut ch = channel();
            ch.add_user("alice");
            let plus = format!("+{}", letter);
            let minus = format!("-{}", letter);

            ch.set_usermode(&plus, "alice").unwrap();
            ch.set_usermode(&plus, "alice").unwrap();
            let privilege = Privilege::from_letter(letter).unwrap();
            assert!(ch.has_privilege(privilege, "alice"));
            assert_eq!(ch.table(privilege).len(), 1);

            ch.set_usermode(&minus, "alice").unwrap();
            assert!(!ch.has_privilege(privilege, "alice"));
            // removing again, or from someone who never had it, is a no-op
            ch.set_usermode(&minus, "alice").unwrap();
            ch.set_usermode(&minus, "nobody").unwrap();
            assert!(ch.table(privilege).is_empty());
        }
    }

    #[test]
    fn test_usermode_invalid() {
        let mut ch = channel();
        ch.add_user("alice");
        for bad in ["+x", "*o", "o", "", "+ov"] {
            assert_eq!(
                ch.set_usermode(bad, "alice"),
                Err(ChannelError::InvalidMode {
                    mode: bad.to_string()
                })
            );
        }
    }

    #[test]
    fn test_usermode_requires_membership() {
        let mut ch = channel();
        assert!(matches!(
            ch.set_usermode("+o", "ghost"),
            Err(ChannelError::NoSuchUser { .. })
        ));
        assert!(!ch.is_oper("ghost"));
    }

    #[test]
    fn test_remove_user_clears_all_privileges() {
        let mut ch = channel();
        ch.add_user("alice");
        for mode in ["+o", "+v", "+q", "+h"] {
            ch.set_usermode(mode, "alice").unwrap();
        }
        ch.remove_user("alice");

        assert!(!ch.has_user("alice"));
        assert!(!ch.is_oper("alice"));
        assert!(!ch.is_voiced("alice"));
        assert!(!ch.is_owner("alice"));
        assert!(!ch.is_halfop("alice"));
    }

    #[test]
    fn test_change_nick_moves_everything() {
        let mut ch = channel();
        ch.add_user("alice");
        ch.add_user("bob");
        ch.set_usermode("+o", "alice").unwrap();
        ch.set_usermode("+h", "alice").unwrap();
        ch.set_usermode("+v", "bob").unwrap();

        assert!(ch.change_nick("alice", "Alicia"));

        assert!(!ch.has_user("alice"));
        assert!(!ch.is_oper("alice"));
        assert!(!ch.is_halfop("alice"));
        assert!(ch.has_user("alicia"));
        assert!(ch.is_oper("Alicia"));
        assert!(ch.is_halfop("Alicia"));
        assert!(!ch.is_voiced("Alicia"));
        assert_eq!(ch.get_user("alicia").unwrap().nick(), "Alicia");
        // bob untouched
        assert!(ch.is_voiced("bob"));
        assert_eq!(ch.user_count(), 2);
    }

    #[test]
    fn test_change_nick_unknown_user() {
        let mut ch = channel();
        assert!(!ch.change_nick("ghost", "spirit"));
        assert_eq!(ch.user_count(), 0);
    }

    #[test]
    fn test_channel_modes() {
        let mut ch = channel();
        ch.set_mode("+n").unwrap();
        ch.set_mode("+t").unwrap();
        ch.set_mode("+n").unwrap();
        assert_eq!(ch.modes(), &['n', 't']);
        assert!(ch.has_allow_external_messages());
        assert!(ch.has_topic_lock());
        assert!(!ch.is_moderated());

        ch.set_mode("-n").unwrap();
        ch.set_mode("-s").unwrap();
        assert_eq!(ch.modes(), &['t']);
        assert!(ch.set_mode("n").is_err());
    }

    #[test]
    fn test_mode_predicates() {
        let mut ch = channel();
        for mode in ["+m", "+s", "+p", "+i", "+l", "+k"] {
            ch.set_mode(mode).unwrap();
        }
        assert!(ch.is_moderated());
        assert!(ch.is_secret());
        assert!(ch.is_protected());
        assert!(ch.is_invite_only());
        assert!(ch.has_limit());
        assert!(ch.has_key());
    }

    #[test]
    fn test_flags() {
        let mut ch = channel();
        assert!(ch.flag(Toggle::ShowBans));
        assert!(!ch.flag(Toggle::LiveChat));
        assert!(ch.set_flag(Toggle::LiveChat, true));
        assert!(!ch.set_flag(Toggle::LiveChat, true));
        assert!(ch.live_chat);
    }

    #[test]
    fn test_message_goes_to_channel() {
        let (outbox, mut rx) = test_outbox();
        let ch = Channel::new("#test", outbox);
        ch.message("hello").unwrap();
        let lines = drain(&mut rx);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("PRIVMSG #test :"));
        assert!(lines[0].contains("hello"));
    }
}
