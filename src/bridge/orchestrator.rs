//! Bridge orchestrator that ties the game console and IRC together.
//!
//! Turns console events into channel notices, relays IRC live chat into
//! the game, and applies the in-game toggle commands to every channel.
//! Filtering is handled centrally here.

use tracing::{debug, info, warn};

use crate::bot::{Bot, Client};
use crate::common::messages::{parse_switch, ConsoleEvent, Toggle};
use crate::common::time::minutes_str;
use crate::common::types::GameClient;
use crate::config::types::Config;
use crate::irc::casemap::irc_eq;
use crate::irc::colors::{strip_irc_formatting, BLUE, GREEN, ORANGE, RED, RESET};

use super::filter::{FilterDirection, MessageFilter};

/// Nicknames never relayed into the game (network services).
const SERVICE_NICKS: [&str; 3] = ["Q", "S", "D"];

/// Nicknames containing this are other bridge bots.
const BOT_MARKER: &str = "warbot";

/// The main bridge that orchestrates message flow.
pub struct Bridge {
    /// Live chat filter for both directions.
    filter: MessageFilter,
    /// Quiet prefix, for usage hints sent to game admins.
    prefix: char,
}

impl Bridge {
    /// Create a new bridge from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            filter: MessageFilter::from_config(config.filters.as_ref()),
            prefix: config.prefix(),
        }
    }

    // ---- IRC -> game ----

    /// Relay a plain channel message into game chat when live chat is on.
    pub fn relay_to_game(&self, bot: &Bot, client: &Client, message: &str) {
        let Some(channel) = bot.channel(client.channel()) else {
            return;
        };
        if !channel.live_chat || self.is_excluded(bot, client.nick()) {
            return;
        }

        let text = strip_irc_formatting(message);
        if self.filter.should_filter(FilterDirection::IrcToGame, &text) {
            info!(channel = %channel.name(), "FILTERED IRC -> game: {}: {}", client.nick(), text);
            return;
        }

        debug!(channel = %channel.name(), "IRC -> game: {}: {}", client.nick(), text);
        bot.console()
            .say(&format!("^7[^1IRC^7] {}: ^3{}", client.nick(), text));
    }

    fn is_excluded(&self, bot: &Bot, nick: &str) -> bool {
        SERVICE_NICKS.contains(&nick) || irc_eq(nick, bot.nickname()) || nick.contains(BOT_MARKER)
    }

    // ---- game -> IRC ----

    /// Handle one event raised by the game console.
    pub fn handle_console_event(&self, bot: &mut Bot, event: ConsoleEvent) {
        match event {
            ConsoleEvent::Say { client, text } => self.on_say(bot, &client, &text),
            ConsoleEvent::Ban {
                client,
                admin,
                reason,
            } => self.on_ban(bot, &client, admin.as_ref(), reason.as_deref(), None),
            ConsoleEvent::TempBan {
                client,
                admin,
                reason,
                duration,
            } => self.on_ban(bot, &client, admin.as_ref(), reason.as_deref(), Some(duration)),
            ConsoleEvent::Kick {
                client,
                admin,
                reason,
            } => self.on_kick(bot, &client, admin.as_ref(), reason.as_deref()),
            ConsoleEvent::MapChange { new_map } => self.on_map_change(bot, &new_map),
            ConsoleEvent::Command {
                client,
                toggle,
                data,
            } => self.on_toggle(bot, &client, toggle, &data),
        }
    }

    fn on_say(&self, bot: &Bot, client: &GameClient, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if self.filter.should_filter(FilterDirection::GameToIrc, text) {
            info!("FILTERED game -> IRC: {}: {}", client.name, text);
            return;
        }

        let message = format!("[{}CHAT{}] {}{}{}: {}", RED, RESET, ORANGE, client.name, RESET, text);
        broadcast(bot, Toggle::LiveChat, &message);
    }

    fn on_ban(
        &self,
        bot: &Bot,
        client: &GameClient,
        admin: Option<&GameClient>,
        reason: Option<&str>,
        duration: Option<f64>,
    ) {
        // automatic penalties are never shown
        let Some(admin) = admin else {
            debug!("Ban of {} has no admin, not shown", client.name);
            return;
        };

        let mut message = format!(
            "[{}BAN{}] {}{}{} banned {}{}{}",
            RED, RESET, ORANGE, admin.name, RESET, ORANGE, client.name, RESET
        );
        if let Some(reason) = reason.filter(|r| !r.is_empty()) {
            let reason = bot.console().strip_colors(reason);
            message.push_str(&format!(" [reason : {}{}{}]", RED, reason, RESET));
        }
        let duration = duration.map_or_else(|| "permanent".to_string(), minutes_str);
        message.push_str(&format!(" [duration : {}{}{}]", RED, duration, RESET));

        broadcast(bot, Toggle::ShowBans, &message);
    }

    fn on_kick(&self, bot: &Bot, client: &GameClient, admin: Option<&GameClient>, reason: Option<&str>) {
        let Some(admin) = admin else {
            debug!("Kick of {} has no admin, not shown", client.name);
            return;
        };

        let mut message = format!(
            "[{}KICK{}] {}{}{} kicked {}{}{}",
            RED, RESET, ORANGE, admin.name, RESET, ORANGE, client.name, RESET
        );
        if let Some(reason) = reason.filter(|r| !r.is_empty()) {
            let reason = bot.console().strip_colors(reason);
            message.push_str(&format!(" [reason : {}{}{}]", RED, reason, RESET));
        }

        broadcast(bot, Toggle::ShowKicks, &message);
    }

    fn on_map_change(&self, bot: &Bot, map_name: &str) {
        let console = bot.console();
        let players = console.connected_clients().len();
        if players == 0 {
            debug!("Map changed to {} on an empty server, not shown", map_name);
            return;
        }

        let message = format!(
            "[{}GAME{}] mapname: {}{}{} - players: {}{}{}/{} - join: {}/connect {}",
            BLUE,
            RESET,
            GREEN,
            map_name,
            RESET,
            GREEN,
            players,
            RESET,
            console.max_clients(),
            BLUE,
            bot.config().join_address()
        );
        broadcast(bot, Toggle::ShowGame, &message);
    }

    /// Apply an in-game toggle command to every channel.
    fn on_toggle(&self, bot: &mut Bot, client: &GameClient, toggle: Toggle, data: &str) {
        let name = toggle.name();
        let data = data.trim();

        if data.is_empty() {
            let mut channels: Vec<_> = bot.channels().collect();
            channels.sort_by(|a, b| a.name().cmp(b.name()));
            let mut status = format!("^7{}:", name);
            for channel in channels {
                let state = if channel.flag(toggle) { "^2ON" } else { "^1OFF" };
                status.push_str(&format!(" ^7{}^3:{}", channel.name(), state));
            }
            bot.console().message(client, &status);
            return;
        }

        let Some(on) = parse_switch(data) else {
            let hint = format!("^7invalid data, try ^3{}^7help {}", self.prefix, name);
            bot.console().message(client, &hint);
            return;
        };

        let notice = if on {
            format!("{}: {}ON", name, GREEN)
        } else {
            format!("{}: {}OFF", name, RED)
        };
        for channel in bot.channels_mut() {
            if channel.set_flag(toggle, on) {
                info!(channel = %channel.name(), "{} set to {} by {}", name, on, client.name);
                if let Err(e) = channel.message(&notice) {
                    warn!(channel = %channel.name(), "Failed to announce {}: {}", name, e);
                }
            }
        }

        let confirmation = if on {
            format!("^7{}: ^2ON", name)
        } else {
            format!("^7{}: ^1OFF", name)
        };
        bot.console().message(client, &confirmation);
    }
}

/// Send `text` to every channel with `toggle` enabled.
fn broadcast(bot: &Bot, toggle: Toggle, text: &str) {
    for channel in bot.channels().filter(|c| c.flag(toggle)) {
        if let Err(e) = channel.message(text) {
            warn!(channel = %channel.name(), "Failed to send notice: {}", e);
        }
    }
}
