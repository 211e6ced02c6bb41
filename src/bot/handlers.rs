//! Protocol event handlers.
//!
//! Each handler keeps the channel and user tables in step with what the
//! server reports. The session looks handlers up in a table built once;
//! event kinds without an entry are ignored.

use std::collections::HashMap;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::bot::channel::Privilege;
use crate::bot::session::{EventHandler, Session};
use crate::bot::LinkState;
use crate::commands::on_pubmsg;
use crate::irc::event::{Event, EventKind};
use crate::irc::modes::parse_channel_modes;

/// The fixed event table.
pub(super) fn event_table() -> HashMap<EventKind, EventHandler> {
    HashMap::from([
        (EventKind::Welcome, on_welcome as EventHandler),
        (EventKind::FeatureList, on_featurelist),
        (EventKind::NamesReply, on_namreply),
        (EventKind::NicknameInUse, on_nicknameinuse),
        (EventKind::Join, on_join),
        (EventKind::Part, on_part),
        (EventKind::Quit, on_quit),
        (EventKind::Kick, on_kick),
        (EventKind::Nick, on_nick),
        (EventKind::Mode, on_mode),
        (EventKind::Ping, on_ping),
        (EventKind::PubMsg, on_pubmsg_event),
        (EventKind::Error, on_error),
    ])
}

fn on_welcome(session: &mut Session, event: &Event) -> Result<()> {
    if let Some(nick) = event.target.as_deref() {
        session.bot.set_nickname(nick);
    }
    session.bot.set_state(LinkState::Registered);
    info!("Registered on IRC as {}", session.bot.nickname());

    let outbox = session.bot.outbox().clone();
    let perform = session.config.irc.perform.clone();
    let delay = session.config.perform_delay();
    let channel = session.config.irc.channel.clone();

    if let Some(previous) = session.perform.take() {
        previous.abort();
    }
    // runs off the receive loop so PINGs are still answered
    session.perform = Some(tokio::spawn(async move {
        for line in perform {
            debug!("Auto-perform: {}", line);
            if let Err(e) = outbox.send_raw(line) {
                warn!("Auto-perform line rejected: {}", e);
            }
            tokio::time::sleep(delay).await;
        }
        if let Err(e) = outbox.join(&channel) {
            warn!("Failed to join {}: {}", channel, e);
        }
    }));
    Ok(())
}

fn on_featurelist(session: &mut Session, event: &Event) -> Result<()> {
    session.bot.features_mut().load(&event.args);
    Ok(())
}

fn on_namreply(session: &mut Session, event: &Event) -> Result<()> {
    // args: [visibility, channel, names]
    let name = event.arg(1);
    if name == "*" {
        return Ok(());
    }

    let entries: Vec<(Vec<char>, String)> = event
        .arg(2)
        .split_whitespace()
        .map(|entry| {
            let (letters, nick) = session.bot.features().split_nick(entry);
            (letters, nick.to_string())
        })
        .collect();

    let Some(channel) = session.bot.channel_mut(name) else {
        debug!(channel = %name, "Names for a channel we are not in");
        return Ok(());
    };
    for (letters, nick) in entries {
        channel.add_user(&nick);
        for letter in letters {
            if let Err(e) = channel.set_usermode(&format!("+{}", letter), &nick) {
                debug!(channel = %name, "Ignoring names prefix: {}", e);
            }
        }
    }
    Ok(())
}

fn on_nicknameinuse(session: &mut Session, event: &Event) -> Result<()> {
    let taken = match event.arg(0) {
        "" => session.bot.nickname().to_string(),
        nick => nick.to_string(),
    };
    let nick = format!("{}_", taken);
    warn!("Nickname {} is in use, trying {}", taken, nick);
    session.bot.set_nickname(&nick);
    session.bot.outbox().nick(&nick)?;
    Ok(())
}

fn on_join(session: &mut Session, event: &Event) -> Result<()> {
    let (Some(nick), Some(name)) = (event.source_nick(), event.target.as_deref()) else {
        return Ok(());
    };
    if session.bot.is_me(&nick) {
        session.bot.add_channel(name);
    }
    match session.bot.channel_mut(name) {
        Some(channel) => channel.add_user(&nick),
        None => debug!(channel = %name, "{} joined a channel we are not in", nick),
    }
    Ok(())
}

fn on_part(session: &mut Session, event: &Event) -> Result<()> {
    let (Some(nick), Some(name)) = (event.source_nick(), event.target.as_deref()) else {
        return Ok(());
    };
    if session.bot.is_me(&nick) {
        info!(channel = %name, "Left channel");
        session.bot.remove_channel(name);
    } else if let Some(channel) = session.bot.channel_mut(name) {
        channel.remove_user(&nick);
    }
    Ok(())
}

fn on_quit(session: &mut Session, event: &Event) -> Result<()> {
    let Some(nick) = event.source_nick() else {
        return Ok(());
    };
    for channel in session.bot.channels_mut() {
        channel.remove_user(&nick);
    }
    Ok(())
}

fn on_kick(session: &mut Session, event: &Event) -> Result<()> {
    let Some(name) = event.target.as_deref() else {
        return Ok(());
    };
    let kicked = event.arg(0);

    if session.bot.is_me(kicked) {
        warn!(channel = %name, "Kicked by {}: {}", event.source_nick().unwrap_or_default(), event.arg(1));
        session.bot.remove_channel(name);
        session.bot.outbox().join(&session.config.irc.channel)?;
    } else if let Some(channel) = session.bot.channel_mut(name) {
        channel.remove_user(kicked);
    }
    Ok(())
}

fn on_nick(session: &mut Session, event: &Event) -> Result<()> {
    let (Some(old), Some(new)) = (event.source_nick(), event.target.as_deref()) else {
        return Ok(());
    };
    let is_me = session.bot.is_me(&old);
    for channel in session.bot.channels_mut() {
        channel.change_nick(&old, new);
    }
    if is_me {
        session.bot.set_nickname(new);
    }
    Ok(())
}

fn on_mode(session: &mut Session, event: &Event) -> Result<()> {
    let Some(name) = event.target.as_deref() else {
        return Ok(());
    };
    let Some(channel) = session.bot.channel_mut(name) else {
        return Ok(());
    };

    for change in parse_channel_modes(&event.args) {
        let delta = change.delta();
        match (change.letter, change.arg.as_deref()) {
            // list modes
            ('b' | 'e' | 'I', _) => {}
            (letter, nick) if Privilege::from_letter(letter).is_some() => {
                if let Some(nick) = nick.filter(|n| channel.has_user(n)) {
                    channel.set_usermode(&delta, nick)?;
                }
            }
            _ => channel.set_mode(&delta)?,
        }
    }
    Ok(())
}

fn on_ping(session: &mut Session, event: &Event) -> Result<()> {
    let server = event.target.as_deref().unwrap_or_default();
    session.bot.outbox().pong(server)?;
    Ok(())
}

fn on_pubmsg_event(session: &mut Session, event: &Event) -> Result<()> {
    let (Some(nick), Some(channel)) = (event.source_nick(), event.target.as_deref()) else {
        return Ok(());
    };
    let Session {
        bot,
        registry,
        bridge,
        ..
    } = session;
    on_pubmsg(bot, registry, bridge, channel, &nick, event.arg(0))
}

fn on_error(_session: &mut Session, event: &Event) -> Result<()> {
    warn!(
        "Server error: {}",
        event.target.as_deref().unwrap_or("connection closed")
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use super::*;
    use crate::bot::outbox::{drain, test_outbox};
    use crate::bridge::ChannelBundle;
    use crate::config::types::test_config;
    use crate::game::MemoryConsole;

    fn session() -> (Session, mpsc::UnboundedReceiver<String>) {
        let console = Arc::new(MemoryConsole::new("iourt42"));
        let mut session = Session::new(
            Arc::new(test_config()),
            console,
            ChannelBundle::new().session,
        );
        let (outbox, rx) = test_outbox();
        session.bot.attach(outbox, Arc::new(AtomicBool::new(true)));
        (session, rx)
    }

    fn joined() -> (Session, mpsc::UnboundedReceiver<String>) {
        let (mut session, rx) = session();
        session.on_line(":b3bot!b3@host JOIN #test");
        session.on_line(":srv 353 b3bot = #test :@alice bob +carol");
        (session, rx)
    }

    #[test]
    fn test_names_reply_sets_privileges() {
        let (session, _rx) = joined();
        let channel = session.bot.channel("#test").unwrap();

        assert!(channel.has_user("b3bot"));
        assert!(channel.is_oper("alice"));
        assert!(channel.is_voiced("carol"));
        assert!(channel.has_user("bob"));
        assert!(!channel.is_oper("bob"));
        assert!(!channel.is_voiced("bob"));
    }

    #[test]
    fn test_isupport_prefix_map() {
        let (mut session, _rx) = session();
        session.on_line(":srv 005 b3bot PREFIX=(qohv)~@%+ :are supported");
        session.on_line(":b3bot!b3@host JOIN #test");
        session.on_line(":srv 353 b3bot @ #test :~dave %erin @+frank");

        let channel = session.bot.channel("#test").unwrap();
        assert!(channel.is_owner("dave"));
        assert!(channel.is_halfop("erin"));
        assert!(channel.is_oper("frank"));
        assert!(channel.is_voiced("frank"));
    }

    #[test]
    fn test_mode_changes() {
        let (mut session, _rx) = joined();
        session.on_line(":alice!a@h MODE #test +o-o bob alice");
        session.on_line(":alice!a@h MODE #test +mtl-n 10");
        session.on_line(":alice!a@h MODE #test +b *!*@spam.example");
        session.on_line(":alice!a@h MODE #test +v ghost");

        let channel = session.bot.channel("#test").unwrap();
        assert!(channel.is_oper("bob"));
        assert!(!channel.is_oper("alice"));
        assert!(channel.is_moderated());
        assert!(channel.has_topic_lock());
        assert!(channel.has_limit());
        assert!(!channel.has_mode('b'));
        assert!(!channel.has_user("ghost"));
    }

    #[test]
    fn test_nick_change_keeps_privileges() {
        let (mut session, _rx) = joined();
        session.on_line(":carol!c@h NICK :caroline");
        session.on_line(":b3bot!b3@host NICK :b3bot_");

        let channel = session.bot.channel("#test").unwrap();
        assert!(!channel.has_user("carol"));
        assert!(channel.is_voiced("caroline"));
        assert_eq!(session.bot.nickname(), "b3bot_");
    }

    #[test]
    fn test_part_quit_kick() {
        let (mut session, mut rx) = joined();
        session.on_line(":bob!b@h PART #test");
        session.on_line(":carol!c@h QUIT :Ping timeout");
        session.on_line(":alice!a@h KICK #test alice :self kick");

        let channel = session.bot.channel("#test").unwrap();
        assert!(!channel.has_user("bob"));
        assert!(!channel.has_user("carol"));
        assert!(!channel.has_user("alice"));
        assert!(!channel.is_oper("alice"));

        session.on_line(":op!o@h KICK #test b3bot :bye");
        assert!(session.bot.channel("#test").is_none());
        assert_eq!(drain(&mut rx), vec!["JOIN #test"]);
    }

    #[test]
    fn test_own_part_drops_channel() {
        let (mut session, _rx) = joined();
        session.on_line(":b3bot!b3@host PART #test :bye");
        assert_eq!(session.bot.channels().count(), 0);
    }

    #[test]
    fn test_nickname_in_use_appends_underscore() {
        let (mut session, mut rx) = session();
        session.on_line(":srv 433 * b3bot :Nickname is already in use");
        session.on_line(":srv 433 * b3bot_ :Nickname is already in use");
        assert_eq!(drain(&mut rx), vec!["NICK b3bot_", "NICK b3bot__"]);
        assert_eq!(session.bot.nickname(), "b3bot__");
    }

    #[test]
    fn test_ping_and_unknown_events() {
        let (mut session, mut rx) = session();
        session.on_line("PING :irc.example.org");
        session.on_line(":srv 372 b3bot :- message of the day");
        session.on_line(":alice!a@h PRIVMSG b3bot :psst");
        session.on_line("this is not : a valid line");
        assert_eq!(drain(&mut rx), vec!["PONG :irc.example.org"]);
    }

    #[tokio::test]
    async fn test_welcome_runs_perform_then_joins() {
        let mut config = test_config();
        config.irc.perform = vec!["MODE b3bot +x".to_string(), "bad\nline".to_string()];
        let console = Arc::new(MemoryConsole::new("iourt42"));
        let mut session = Session::new(Arc::new(config), console, ChannelBundle::new().session);
        let (outbox, mut rx) = test_outbox();
        session.bot.attach(outbox, Arc::new(AtomicBool::new(true)));

        session.on_line(":srv 001 b3bot_ :Welcome to the network");
        assert_eq!(session.bot.nickname(), "b3bot_");
        assert_eq!(session.bot.state(), LinkState::Registered);

        session.perform.take().unwrap().await.unwrap();
        assert_eq!(drain(&mut rx), vec!["MODE b3bot +x", "JOIN #test"]);
    }
}
