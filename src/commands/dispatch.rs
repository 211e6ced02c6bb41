//! Routing of public channel messages.
//!
//! A message is either live chat, relayed into the game, or a prefixed
//! command addressed to this bot (or to `all`).

use anyhow::Result;
use tracing::{debug, error, warn};

use crate::bot::Bot;
use crate::bridge::Bridge;
use crate::commands::{CommandRegistry, Context};
use crate::irc::casemap::irc_eq;
use crate::irc::colors::{ORANGE, RED};

/// Token that addresses every bridge bot in the channel.
const GLOBAL_TOKEN: &str = "all";

/// Split `!name rest` into prefix, command word and trimmed remainder.
pub fn parse_command(message: &str) -> Option<(char, &str, &str)> {
    let mut chars = message.chars();
    let prefix = chars.next()?;
    let body = chars.as_str();
    let (name, rest) = body.split_once(char::is_whitespace).unwrap_or((body, ""));
    Some((prefix, name, rest.trim()))
}

/// Whether the addressing token selects this bot.
pub fn is_addressed(token: &str, own_nick: &str, listen_global: bool) -> bool {
    irc_eq(token, own_nick) || (listen_global && token.eq_ignore_ascii_case(GLOBAL_TOKEN))
}

/// Handle one public message from `nick` on `channel`.
pub fn on_pubmsg(
    bot: &mut Bot,
    registry: &CommandRegistry,
    bridge: &Bridge,
    channel: &str,
    nick: &str,
    message: &str,
) -> Result<()> {
    let Some(state) = bot.channel_mut(channel) else {
        debug!(channel = %channel, "Message for a channel we are not in");
        return Ok(());
    };
    if !state.has_user(nick) {
        warn!(channel = %channel, "Message from unknown user {}, adding", nick);
        state.add_user(nick);
    }
    let Some(client) = state.get_user(nick).cloned() else {
        return Ok(());
    };

    let message = message.trim();
    let (quiet, loud) = (bot.config().prefix(), bot.config().loud_prefix());
    let is_command = message.chars().count() > 2 && message.starts_with([quiet, loud]);
    if !is_command {
        bridge.relay_to_game(bot, &client, message);
        return Ok(());
    }

    let Some((prefix, name, rest)) = parse_command(message) else {
        return Ok(());
    };
    let (token, data) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    if !is_addressed(token, bot.nickname(), bot.config().settings.listen_global) {
        return Ok(());
    }
    let data = data.trim();

    let Some(command) = registry.get(name) else {
        client.message(&format!(
            "invalid command: {}{}{}{}",
            ORANGE,
            registry.prefix(),
            RED,
            name
        ))?;
        return Ok(());
    };
    if !command.can_use(bot.channel(channel), &client) {
        client.message(&format!(
            "no sufficient access to command {}{}{}{}",
            ORANGE,
            registry.prefix(),
            RED,
            command.name
        ))?;
        return Ok(());
    }

    debug!(channel = %channel, "{} runs {}{} {}", nick, prefix, command.name, data);
    let handler = command.handler;
    let mut ctx = Context {
        bot,
        registry,
        invoker: client.clone(),
        loud: prefix == loud,
    };
    if let Err(e) = handler(&mut ctx, data) {
        error!(channel = %channel, "Command {} from {} failed: {:#}", command.name, nick, e);
        client.message("could not execute command")?;
    }
    Ok(())
}
