//! Built-in IRC command handlers.
//!
//! Every handler receives the execution context and the data that followed
//! the addressing token. Usage problems are reported to the invoker and
//! count as success; only console and transport failures are errors.

use std::sync::LazyLock;

use anyhow::Result;
use fancy_regex::Regex;
use tracing::{debug, info, warn};

use crate::bot::admin::{get_reason, parse_user_cmd};
use crate::bot::Request;
use crate::commands::{parse_command, Context, Handler};
use crate::common::error::ConsoleError;
use crate::common::messages::{parse_switch, Toggle};
use crate::common::time::{format_timestamp, minutes_str, minutes_until, time_to_minutes};
use crate::common::types::PenaltyKind;
use crate::game::OutputSink;
use crate::irc::colors::{GREEN, ORANGE, RED, RESET};

/// A handler shipped with the bridge, looked up by name at registration.
pub struct Builtin {
    pub name: &'static str,
    pub handler: Handler,
    pub help: &'static str,
}

static BUILTINS: &[Builtin] = &[
    Builtin {
        name: "alias",
        handler: cmd_alias,
        help: "<client> - display a client's aliases",
    },
    Builtin {
        name: "b3",
        handler: cmd_b3,
        help: "- display the console version and uptime",
    },
    Builtin {
        name: "ban",
        handler: cmd_ban,
        help: "<client> [<reason>] - ban a client for the default duration",
    },
    Builtin {
        name: "cvar",
        handler: cmd_cvar,
        help: "<name> [<value>] - get or set a server cvar",
    },
    Builtin {
        name: "exec",
        handler: cmd_exec,
        help: "<command> [<data>] - execute a console admin command",
    },
    Builtin {
        name: "help",
        handler: cmd_help,
        help: "[<command>] - display the help text",
    },
    Builtin {
        name: "kick",
        handler: cmd_kick,
        help: "<client> [<reason>] - kick a client from the server",
    },
    Builtin {
        name: "list",
        handler: cmd_list,
        help: "- display the list of online clients",
    },
    Builtin {
        name: "listbans",
        handler: cmd_listbans,
        help: "<client> - list a client's active bans",
    },
    Builtin {
        name: "livechat",
        handler: cmd_livechat,
        help: "[<on|off>] - enable or disable the live chat",
    },
    Builtin {
        name: "lookup",
        handler: cmd_lookup,
        help: "<client> - retrieve information on a client",
    },
    Builtin {
        name: "permban",
        handler: cmd_permban,
        help: "<client> [<reason>] - ban a client permanently",
    },
    Builtin {
        name: "plugins",
        handler: cmd_plugins,
        help: "- display the list of loaded plugins",
    },
    Builtin {
        name: "reconnect",
        handler: cmd_reconnect,
        help: "- reconnect to the IRC network",
    },
    Builtin {
        name: "showbans",
        handler: cmd_showbans,
        help: "[<on|off>] - enable or disable ban notices",
    },
    Builtin {
        name: "showgame",
        handler: cmd_showgame,
        help: "[<on|off>] - enable or disable map change notices",
    },
    Builtin {
        name: "showkicks",
        handler: cmd_showkicks,
        help: "[<on|off>] - enable or disable kick notices",
    },
    Builtin {
        name: "status",
        handler: cmd_status,
        help: "- display the current server status",
    },
    Builtin {
        name: "tempban",
        handler: cmd_tempban,
        help: "<client> <duration> [<reason>] - ban a client for a given time",
    },
    Builtin {
        name: "unban",
        handler: cmd_unban,
        help: "<client> [<reason>] - lift a client's bans",
    },
    Builtin {
        name: "version",
        handler: cmd_version,
        help: "- display the bridge version",
    },
];

/// Built-in handler registered under `name`.
pub fn find(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name.eq_ignore_ascii_case(name))
}

/// Duration and optional reason of a tempban.
static TEMPBAN_ARGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([0-9]+[dwhsm]*)(?:\s+(.+))?$").expect("tempban pattern is valid")
});

// ---- helpers ----

fn missing_data(ctx: &Context<'_>, name: &str) -> Result<()> {
    ctx.tell(&format!(
        "missing data, try {}{}{}help {}",
        ORANGE,
        ctx.prefix(),
        RESET,
        name
    ))?;
    Ok(())
}

fn invalid_data(ctx: &Context<'_>, name: &str) -> Result<()> {
    ctx.tell(&format!(
        "invalid data, try {}{}{}help {}",
        ORANGE,
        ctx.prefix(),
        RESET,
        name
    ))?;
    Ok(())
}

/// Expanded reason and the keyword it came from, if it was one.
fn reason_and_keyword(ctx: &Context<'_>, rest: Option<&str>) -> (Option<String>, Option<String>) {
    let reason = ctx.bot.resolve_reason(rest);
    let keyword = rest
        .map(str::trim)
        .filter(|k| ctx.bot.config().admin.reasons.contains_key(*k))
        .map(str::to_string);
    (reason, keyword)
}

fn switch_status(name: &str, on: bool) -> String {
    if on {
        format!("{}: {}ON", name, GREEN)
    } else {
        format!("{}: {}OFF", name, RED)
    }
}

/// Routes console admin command output back to the invoker.
struct ReplySink<'c, 'b> {
    ctx: &'c Context<'b>,
}

impl OutputSink for ReplySink<'_, '_> {
    fn say(&mut self, text: &str) {
        if let Err(e) = self.ctx.reply(text) {
            warn!("Could not relay console output: {}", e);
        }
    }

    fn message(&mut self, text: &str) {
        if let Err(e) = self.ctx.tell(text) {
            warn!("Could not relay console output: {}", e);
        }
    }
}

// ---- handlers ----

fn cmd_alias(ctx: &mut Context<'_>, data: &str) -> Result<()> {
    if data.is_empty() {
        return missing_data(ctx, "alias");
    }
    let Some(client) = ctx.bot.lookup_client(data, Some(&ctx.invoker)) else {
        return Ok(());
    };

    if client.aliases.is_empty() {
        ctx.reply(&format!("{}{}{} has no aliases", ORANGE, client.name, RESET))?;
        return Ok(());
    }
    let aliases: Vec<_> = client
        .aliases
        .iter()
        .map(|a| format!("{} ({}x{}{})", a.alias, GREEN, a.times_used, RESET))
        .collect();
    ctx.reply(&format!(
        "{}{}{} aliases: {}",
        ORANGE,
        client.name,
        RESET,
        aliases.join(", ")
    ))?;
    Ok(())
}

fn cmd_b3(ctx: &mut Context<'_>, _data: &str) -> Result<()> {
    let console = ctx.bot.console();
    let uptime = console.uptime().as_secs_f64() / 60.0;
    ctx.reply(&format!(
        "{} - uptime: [{}{}{}]",
        console.version(),
        GREEN,
        minutes_str(uptime),
        RESET
    ))?;
    Ok(())
}

fn ban_with(ctx: &mut Context<'_>, data: &str, name: &str, duration: Option<f64>) -> Result<()> {
    let Some((handle, rest)) = parse_user_cmd(data) else {
        return missing_data(ctx, name);
    };
    let Some(target) = ctx.bot.lookup_client(handle, Some(&ctx.invoker)) else {
        return Ok(());
    };
    let (reason, keyword) = reason_and_keyword(ctx, rest);
    ctx.bot.ban(
        &target,
        &ctx.invoker,
        reason.as_deref(),
        keyword.as_deref(),
        duration,
    )
}

fn cmd_ban(ctx: &mut Context<'_>, data: &str) -> Result<()> {
    let duration = time_to_minutes(&ctx.bot.config().admin.ban_duration).filter(|m| *m > 0.0);
    ban_with(ctx, data, "ban", duration)
}

fn cmd_permban(ctx: &mut Context<'_>, data: &str) -> Result<()> {
    ban_with(ctx, data, "permban", None)
}

fn cmd_tempban(ctx: &mut Context<'_>, data: &str) -> Result<()> {
    let Some((handle, rest)) = parse_user_cmd(data) else {
        return missing_data(ctx, "tempban");
    };
    let Some(target) = ctx.bot.lookup_client(handle, Some(&ctx.invoker)) else {
        return Ok(());
    };
    let Some(rest) = rest else {
        return missing_data(ctx, "tempban");
    };

    let Some(captures) = TEMPBAN_ARGS.captures(rest)? else {
        return invalid_data(ctx, "tempban");
    };
    let duration = captures
        .get(1)
        .and_then(|m| time_to_minutes(m.as_str()))
        .filter(|m| *m > 0.0);
    let Some(duration) = duration else {
        return invalid_data(ctx, "tempban");
    };

    let (reason, keyword) = reason_and_keyword(ctx, captures.get(2).map(|m| m.as_str()));
    ctx.bot.ban(
        &target,
        &ctx.invoker,
        reason.as_deref(),
        keyword.as_deref(),
        Some(duration),
    )
}

fn cmd_cvar(ctx: &mut Context<'_>, data: &str) -> Result<()> {
    if data.is_empty() {
        return missing_data(ctx, "cvar");
    }
    let (name, value) = match data.split_once(char::is_whitespace) {
        Some((name, value)) => (name, Some(value.trim()).filter(|v| !v.is_empty())),
        None => (data, None),
    };
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        ctx.tell("invalid cvar name supplied")?;
        return Ok(());
    }

    let console = ctx.bot.console().clone();
    let result = match value {
        Some(value) => console
            .set_cvar(name, value)
            .and_then(|()| console.get_cvar(name)),
        None => console.get_cvar(name),
    };
    match result {
        Ok(Some(cvar)) => ctx.reply(&format!(
            "CVAR [{}{}{}] : [{}{}{}]",
            ORANGE, cvar.name, RESET, ORANGE, cvar.value, RESET
        ))?,
        Ok(None) => ctx.tell("invalid cvar name supplied")?,
        Err(ConsoleError::CvarUnsupported { game }) => ctx.tell(&format!(
            "{}{}{} parser does not support cvar get/set",
            RED, game, RESET
        ))?,
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn cmd_exec(ctx: &mut Context<'_>, data: &str) -> Result<()> {
    if data.is_empty() {
        return missing_data(ctx, "exec");
    }
    let prefixes = [ctx.bot.config().prefix(), ctx.bot.config().loud_prefix()];
    let line = if data.starts_with(prefixes) {
        data.to_string()
    } else {
        format!("{}{}", ctx.prefix(), data)
    };
    let Some((_, name, args)) = parse_command(&line) else {
        return missing_data(ctx, "exec");
    };
    let name = name.to_lowercase();

    let console = ctx.bot.console().clone();
    if !console.has_admin_command(&name) {
        ctx.tell(&format!(
            "invalid b3 command supplied: {}{}{}{}",
            ORANGE,
            ctx.prefix(),
            RESET,
            name
        ))?;
        return Ok(());
    }

    let mut sink = ReplySink { ctx: &*ctx };
    if let Err(e) = console.execute_admin_command(&name, args, ctx.invoker.nick(), &mut sink) {
        debug!("Admin command {} from {} failed: {}", name, ctx.invoker.nick(), e);
        ctx.tell(&format!("could not execute b3 command: {}", e))?;
    }
    Ok(())
}

fn cmd_help(ctx: &mut Context<'_>, data: &str) -> Result<()> {
    let prefix = ctx.prefix();
    let channel = ctx.channel();

    if data.is_empty() {
        let usable: Vec<_> = ctx
            .registry
            .iter()
            .filter(|c| c.can_use(channel, &ctx.invoker))
            .map(|c| format!("{}{}", prefix, c.name))
            .collect();
        if usable.is_empty() {
            ctx.tell("you have no available command")?;
        } else {
            ctx.reply(&format!("command list: {}", usable.join(", ")))?;
        }
        return Ok(());
    }

    let name = data
        .split_whitespace()
        .next()
        .unwrap_or(data)
        .trim_start_matches([prefix, ctx.bot.config().loud_prefix()]);
    match ctx.registry.get(name) {
        None => ctx.tell(&format!("command not found: {}{}{}{}", ORANGE, prefix, RED, name))?,
        Some(command) if !command.can_use(channel, &ctx.invoker) => ctx.tell(&format!(
            "you have no sufficient access to {}{}{}{}",
            ORANGE, prefix, RED, command.name
        ))?,
        Some(command) => ctx.reply(&format!("{}{} {}", prefix, command.name, command.help))?,
    }
    Ok(())
}

fn cmd_kick(ctx: &mut Context<'_>, data: &str) -> Result<()> {
    let Some((handle, rest)) = parse_user_cmd(data) else {
        return missing_data(ctx, "kick");
    };
    let Some(target) = ctx.bot.lookup_client(handle, Some(&ctx.invoker)) else {
        return Ok(());
    };
    if !target.is_connected() {
        ctx.tell(&format!("{}{}{} is not connected", ORANGE, target.name, RESET))?;
        return Ok(());
    }
    if let Some(refusal) = ctx.bot.protected_refusal(&target, "kicked") {
        ctx.tell(&refusal)?;
        return Ok(());
    }

    let (reason, keyword) = reason_and_keyword(ctx, rest);
    ctx.bot
        .console()
        .kick(target.id, &get_reason(reason.as_deref()), keyword.as_deref())?;
    debug!("{} kicked @{} from IRC", ctx.invoker.nick(), target.id);

    let mut message = format!(
        "{}{}{} was kicked by {}{}{}",
        ORANGE,
        target.name,
        RESET,
        ORANGE,
        ctx.invoker.nick(),
        RESET
    );
    if let Some(reason) = reason {
        message.push_str(&format!(" [reason: {}{}{}]", RED, reason, RESET));
    }
    ctx.announce(&message)?;
    Ok(())
}

fn cmd_list(ctx: &mut Context<'_>, _data: &str) -> Result<()> {
    let clients = ctx.bot.console().connected_clients();
    if clients.is_empty() {
        ctx.reply("no clients online")?;
        return Ok(());
    }
    let entries: Vec<_> = clients
        .iter()
        .map(|c| {
            let slot = c.slot.map_or_else(|| "?".to_string(), |s| s.to_string());
            format!("[{}{}{}] {}", ORANGE, slot, RESET, c.name)
        })
        .collect();
    ctx.reply(&format!("online clients: {}", entries.join(", ")))?;
    Ok(())
}

fn cmd_listbans(ctx: &mut Context<'_>, data: &str) -> Result<()> {
    if data.is_empty() {
        return missing_data(ctx, "listbans");
    }
    let Some(client) = ctx.bot.lookup_client(data, Some(&ctx.invoker)) else {
        return Ok(());
    };

    let console = ctx.bot.console().clone();
    let bans = console.penalties(client.id, &[PenaltyKind::Ban, PenaltyKind::TempBan]);
    if bans.is_empty() {
        ctx.reply(&format!("{}{}{} has no active bans", ORANGE, client.name, RESET))?;
        return Ok(());
    }

    for ban in bans {
        let mut line = format!("ban: {}@{}{}", ORANGE, ban.id, RESET);
        if let Some(admin) = ban
            .admin_id
            .and_then(|id| console.clients_by_id(id).into_iter().next())
        {
            line.push_str(&format!(" - issued by: {}{}{}", ORANGE, admin.name, RESET));
        }
        if let Some(reason) = ban.reason.as_deref().filter(|r| !r.is_empty()) {
            line.push_str(&format!(
                " - reason: {}{}{}",
                ORANGE,
                console.strip_colors(reason),
                RESET
            ));
        }
        let expire = if ban.is_permanent() {
            "never".to_string()
        } else {
            minutes_str(minutes_until(ban.time_expire))
        };
        line.push_str(&format!(" - expire: {}{}{}", RED, expire, RESET));
        ctx.reply(&line)?;
    }
    Ok(())
}

fn switch(ctx: &mut Context<'_>, data: &str, toggle: Toggle) -> Result<()> {
    let name = toggle.name();
    let Some(current) = ctx.channel().map(|c| c.flag(toggle)) else {
        return Ok(());
    };

    if data.is_empty() {
        ctx.reply(&switch_status(name, current))?;
        return Ok(());
    }
    let Some(on) = parse_switch(data) else {
        return invalid_data(ctx, name);
    };

    if let Some(channel) = ctx.channel_mut() {
        if channel.set_flag(toggle, on) {
            info!(channel = %channel.name(), "{} set to {} from IRC", name, on);
        }
    }
    ctx.reply(&switch_status(name, on))?;
    Ok(())
}

fn cmd_livechat(ctx: &mut Context<'_>, data: &str) -> Result<()> {
    switch(ctx, data, Toggle::LiveChat)
}

fn cmd_showbans(ctx: &mut Context<'_>, data: &str) -> Result<()> {
    switch(ctx, data, Toggle::ShowBans)
}

fn cmd_showkicks(ctx: &mut Context<'_>, data: &str) -> Result<()> {
    switch(ctx, data, Toggle::ShowKicks)
}

fn cmd_showgame(ctx: &mut Context<'_>, data: &str) -> Result<()> {
    switch(ctx, data, Toggle::ShowGame)
}

fn cmd_lookup(ctx: &mut Context<'_>, data: &str) -> Result<()> {
    if data.is_empty() {
        return missing_data(ctx, "lookup");
    }
    let Some(client) = ctx.bot.lookup_client(data, Some(&ctx.invoker)) else {
        return Ok(());
    };

    let console = ctx.bot.console();
    let level = console
        .group_for_level(client.max_level)
        .map_or_else(|| client.max_level.to_string(), |g| g.keyword);
    let seen = console.strip_colors(&format_timestamp(client.last_seen));
    let first = format!(
        "name: {g}{}{r} - id: {g}@{}{r} - pbid: {g}{}{r} - level: {g}{}{r} - seen: {g}{}",
        client.name,
        client.id,
        client.pbid.as_deref().unwrap_or("n/a"),
        level,
        seen,
        g = GREEN,
        r = RESET
    );
    let second = format!(
        "ip: {g}{}{r} - guid: {g}{}{r} - connections: {g}{}{r} - warnings: {g}{}{r} - bans: {g}{}",
        client.ip,
        client.guid,
        client.connections,
        client.warnings,
        client.bans,
        g = GREEN,
        r = RESET
    );
    ctx.reply(&first)?;
    ctx.reply(&second)?;
    Ok(())
}

fn cmd_plugins(ctx: &mut Context<'_>, _data: &str) -> Result<()> {
    let plugins = ctx.bot.console().plugins();
    if plugins.is_empty() {
        ctx.reply("no plugins loaded")?;
        return Ok(());
    }
    let entries: Vec<_> = plugins
        .iter()
        .map(|p| {
            let state = if p.enabled {
                format!("{}ON", GREEN)
            } else {
                format!("{}OFF", RED)
            };
            format!("{}: {}{}", p.name, state, RESET)
        })
        .collect();
    ctx.reply(&format!("plugins: {}", entries.join(", ")))?;
    Ok(())
}

fn cmd_reconnect(ctx: &mut Context<'_>, _data: &str) -> Result<()> {
    info!("Reconnect requested by {}", ctx.invoker.nick());
    ctx.bot.request(Request::Reconnect);
    Ok(())
}

fn cmd_status(ctx: &mut Context<'_>, _data: &str) -> Result<()> {
    let console = ctx.bot.console();
    ctx.reply(&format!(
        "mapname: {g}{}{r} - players: {g}{}{r}/{} - nextmap: {g}{}",
        console.map_name(),
        console.connected_clients().len(),
        console.max_clients(),
        console.next_map(),
        g = GREEN,
        r = RESET
    ))?;
    Ok(())
}

fn cmd_unban(ctx: &mut Context<'_>, data: &str) -> Result<()> {
    let Some((handle, rest)) = parse_user_cmd(data) else {
        return missing_data(ctx, "unban");
    };
    let Some(target) = ctx.bot.lookup_client(handle, Some(&ctx.invoker)) else {
        return Ok(());
    };

    let (reason, _) = reason_and_keyword(ctx, rest);
    ctx.bot
        .console()
        .unban(target.id, &get_reason(reason.as_deref()))?;

    let mut message = format!(
        "{}{}{} was un-banned by {}{}{}",
        ORANGE,
        target.name,
        RESET,
        ORANGE,
        ctx.invoker.nick(),
        RESET
    );
    if let Some(reason) = reason {
        message.push_str(&format!(" [reason: {}{}{}]", RED, reason, RESET));
    }
    ctx.announce(&message)?;
    Ok(())
}

fn cmd_version(ctx: &mut Context<'_>, _data: &str) -> Result<()> {
    ctx.reply(&format!(
        "{}{}{} - IRC bot for BigBrotherBot({}B3{}) - version {}{}{}",
        ORANGE,
        env!("CARGO_PKG_NAME"),
        RESET,
        GREEN,
        RESET,
        ORANGE,
        env!("CARGO_PKG_VERSION"),
        RESET
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    use super::*;
    use crate::bot::outbox::{drain, test_outbox};
    use crate::bot::testing::{harness_with, Harness};
    use crate::bot::Bot;
    use crate::bridge::Bridge;
    use crate::commands::{on_pubmsg, CommandRegistry};
    use crate::common::types::{Alias, GameClient, Group, Penalty, PERMANENT};
    use crate::config::types::test_config;
    use crate::game::{Console, MemoryConsole};

    struct Setup {
        h: Harness,
        registry: CommandRegistry,
        bridge: Bridge,
    }

    impl Setup {
        fn new() -> Self {
            let mut config = test_config();
            config
                .admin
                .reasons
                .insert("wh".to_string(), "wallhack".to_string());
            let mut h = harness_with(config.clone());
            let channel = h.bot.add_channel("#test");
            channel.add_user("alice");
            channel.add_user("bob");
            channel.set_usermode("+o", "alice").unwrap();

            let mut fenix = GameClient::new(10, "Fenix").in_slot(1);
            fenix.aliases.push(Alias {
                alias: "fnx".to_string(),
                times_used: 3,
            });
            h.console.add_client(fenix);
            h.console.add_client(GameClient::new(11, "Offline"));
            h.console.add_client(
                GameClient::new(12, "Boss")
                    .in_slot(2)
                    .with_group(&Group::new(128, "superadmin", "Super Admin", 100)),
            );

            Self {
                h,
                registry: CommandRegistry::from_config(&config),
                bridge: Bridge::new(&config),
            }
        }

        /// Run `line` from `nick` and return every line sent.
        fn run(&mut self, nick: &str, line: &str) -> Vec<String> {
            on_pubmsg(
                &mut self.h.bot,
                &self.registry,
                &self.bridge,
                "#test",
                nick,
                line,
            )
            .unwrap();
            drain(&mut self.h.rx)
        }
    }

    #[test]
    fn test_every_default_command_has_a_builtin() {
        for key in crate::config::types::default_commands().keys() {
            let name = key.split('-').next().unwrap();
            assert!(find(name).is_some(), "{}", name);
        }
    }

    #[test]
    fn test_help_lists_usable_commands() {
        let mut s = Setup::new();

        let lines = s.run("bob", "!help b3bot");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("NOTICE bob :"));
        assert!(lines[0].contains("command list: "));
        assert!(lines[0].contains("!help"));
        assert!(!lines[0].contains("!ban"));

        let lines = s.run("alice", "!help b3bot !kick");
        assert!(lines[0].contains("!kick <client>"));

        let lines = s.run("bob", "!help b3bot kick");
        assert!(lines[0].contains("you have no sufficient access to "));

        let lines = s.run("bob", "!help b3bot nothing");
        assert!(lines[0].contains("command not found: "));
    }

    #[test]
    fn test_loud_status_goes_to_channel() {
        let mut s = Setup::new();
        s.h.console.set_map("ut4_casa", "ut4_abbey");

        let lines = s.run("bob", "@status b3bot");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("PRIVMSG #test :"));
        assert!(lines[0].contains("ut4_casa"));
        assert!(lines[0].contains("ut4_abbey"));
    }

    #[test]
    fn test_missing_data_hint() {
        let mut s = Setup::new();
        let lines = s.run("alice", "!lookup b3bot");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("missing data, try "));
        assert!(lines[0].contains("help lookup"));
    }

    #[test]
    fn test_list() {
        let mut s = Setup::new();
        let lines = s.run("alice", "!list b3bot");
        assert!(lines[0].contains("online clients: "));
        assert!(lines[0].contains("Fenix"));
        assert!(lines[0].contains("Boss"));
        assert!(!lines[0].contains("Offline"));
    }

    #[test]
    fn test_lookup_and_alias() {
        let mut s = Setup::new();
        let lines = s.run("alice", "!l b3bot @10");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Fenix"));
        assert!(lines[0].contains("n/a"));
        assert!(lines[1].contains("connections: "));

        let lines = s.run("alice", "!alias b3bot fenix");
        assert!(lines[0].contains("fnx"));
    }

    #[test]
    fn test_kick() {
        let mut s = Setup::new();

        let lines = s.run("alice", "!k b3bot offline");
        assert!(lines[0].contains("is not connected"));

        let lines = s.run("alice", "!kick b3bot boss");
        assert!(lines[0].contains("can't be kicked"));

        let lines = s.run("alice", "!kick b3bot fenix wh");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("PRIVMSG #test :"));
        assert!(lines[0].contains("was kicked by"));
        assert!(lines[0].contains("wallhack"));
        assert!(!s.h.console.client(10).unwrap().is_connected());
    }

    #[test]
    fn test_ban_uses_configured_duration() {
        let mut s = Setup::new();
        let lines = s.run("alice", "!ban b3bot fenix");
        assert!(lines[0].contains("2 weeks"));
        assert_eq!(s.h.console.penalties(10, &[PenaltyKind::TempBan]).len(), 1);
    }

    #[test]
    fn test_permban_and_unban() {
        let mut s = Setup::new();
        s.run("alice", "!permban b3bot fenix");
        assert_eq!(s.h.console.penalties(10, &[PenaltyKind::Ban]).len(), 1);

        let lines = s.run("alice", "!listbans b3bot @10");
        assert!(lines[0].contains("ban: "));
        assert!(lines[0].contains("never"));

        let lines = s.run("alice", "!unban b3bot @10 mistake");
        assert!(lines[0].contains("was un-banned by"));
        assert!(s.h.console.penalties(10, &[PenaltyKind::Ban]).is_empty());

        let lines = s.run("alice", "!listbans b3bot @10");
        assert!(lines[0].contains("has no active bans"));
    }

    #[test]
    fn test_listbans_shows_issuer_and_reason() {
        let mut s = Setup::new();
        s.h.console.add_penalty(Penalty {
            id: 7,
            kind: PenaltyKind::Ban,
            client_id: 11,
            admin_id: Some(12),
            reason: Some("^1aimbot".to_string()),
            keyword: None,
            time_expire: PERMANENT,
            active: true,
        });

        let lines = s.run("alice", "!listbans b3bot @11");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("@7"));
        assert!(lines[0].contains("issued by: "));
        assert!(lines[0].contains("Boss"));
        assert!(lines[0].contains("aimbot"));
        assert!(!lines[0].contains("^1"));
    }

    #[test]
    fn test_tempban() {
        let mut s = Setup::new();

        let lines = s.run("alice", "!tempban b3bot fenix soon");
        assert!(lines[0].contains("invalid data, try "));
        assert!(s.h.console.penalties(10, &[PenaltyKind::TempBan]).is_empty());

        let lines = s.run("alice", "!tempban b3bot fenix 2h camping");
        assert!(lines[0].contains("2 hours"));
        assert!(lines[0].contains("camping"));
        let bans = s.h.console.penalties(10, &[PenaltyKind::TempBan]);
        assert_eq!(bans[0].reason.as_deref(), Some("camping (by an IRC admin)"));
    }

    #[test]
    fn test_tempban_rejects_out_of_range_duration() {
        let mut s = Setup::new();

        for line in [
            "!tempban b3bot fenix 99999999999999999999w spam",
            "!tempban b3bot fenix 600w spam",
        ] {
            let lines = s.run("alice", line);
            assert_eq!(lines.len(), 1, "{}", line);
            assert!(lines[0].starts_with("NOTICE alice :"));
            assert!(lines[0].contains("invalid data, try "));
        }
        assert!(s.h.console.penalties(10, &[PenaltyKind::TempBan]).is_empty());
    }

    #[test]
    fn test_cvar() {
        let mut s = Setup::new();

        let lines = s.run("alice", "!cvar b3bot sv_maxclients");
        assert!(lines[0].contains("CVAR ["));
        assert!(lines[0].contains("16"));

        let lines = s.run("alice", "!cvar b3bot g_gear 0");
        assert!(lines[0].contains("g_gear"));
        assert_eq!(s.h.console.get_cvar("g_gear").unwrap().unwrap().value, "0");

        let lines = s.run("alice", "!cvar b3bot nope");
        assert!(lines[0].contains("invalid cvar name supplied"));
        let lines = s.run("alice", "!cvar b3bot bad;name");
        assert!(lines[0].contains("invalid cvar name supplied"));
    }

    #[test]
    fn test_cvar_unsupported_game() {
        let config = Arc::new(test_config());
        let console = Arc::new(MemoryConsole::new("bfbc2").without_cvars());
        let mut bot = Bot::new(config.clone(), console);
        let (outbox, mut rx) = test_outbox();
        bot.attach(outbox, Arc::new(AtomicBool::new(true)));
        let channel = bot.add_channel("#test");
        channel.add_user("alice");
        channel.set_usermode("+o", "alice").unwrap();
        let registry = CommandRegistry::from_config(&config);
        let bridge = Bridge::new(&config);

        on_pubmsg(&mut bot, &registry, &bridge, "#test", "alice", "!cvar b3bot g_gear").unwrap();
        let lines = drain(&mut rx);
        assert!(lines[0].contains("bfbc2"));
        assert!(lines[0].contains("does not support cvar get/set"));
    }

    #[test]
    fn test_exec_routes_output_to_invoker() {
        let mut s = Setup::new();

        let lines = s.run("alice", "!exec b3bot say hello");
        assert_eq!(s.h.console.said(), vec!["^7alice^7: ^3hello"]);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("NOTICE alice :"));

        let lines = s.run("alice", "@exec b3bot !LIST");
        assert!(lines[0].starts_with("NOTICE alice :"));
        assert!(lines[0].contains("1:Fenix"));

        let lines = s.run("alice", "!exec b3bot rcon quit");
        assert!(lines[0].contains("invalid b3 command supplied: "));

        let lines = s.run("alice", "!exec b3bot map");
        assert!(lines[0].contains("could not execute b3 command: "));
    }

    #[test]
    fn test_toggle_from_irc() {
        let mut s = Setup::new();

        let lines = s.run("alice", "!livechat b3bot");
        assert!(lines[0].contains("livechat: "));
        assert!(lines[0].contains("OFF"));

        s.run("alice", "!livechat b3bot on");
        assert!(s.h.bot.channel("#test").unwrap().live_chat);

        let lines = s.run("alice", "!showbans b3bot sometimes");
        assert!(lines[0].contains("invalid data, try "));
        assert!(s.h.bot.channel("#test").unwrap().show_bans);

        s.run("alice", "!showbans b3bot off");
        assert!(!s.h.bot.channel("#test").unwrap().show_bans);
    }

    #[test]
    fn test_plugins_b3_version() {
        let mut s = Setup::new();
        s.h.console.add_plugin("admin", true);
        s.h.console.add_plugin("spamcontrol", false);

        let lines = s.run("alice", "!plugins b3bot");
        assert!(lines[0].contains("plugins: admin: "));
        assert!(lines[0].contains("spamcontrol: "));

        let lines = s.run("bob", "!b3 b3bot");
        assert!(lines[0].contains("uptime: "));

        let lines = s.run("bob", "!version all");
        assert!(lines[0].contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_reconnect_leaves_request() {
        let mut s = Setup::new();
        assert!(s.run("alice", "!reconnect b3bot").is_empty());
        assert_eq!(s.h.bot.take_request(), Some(Request::Reconnect));
    }
}
