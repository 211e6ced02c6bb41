//! Admin bridge operations: client lookup and bans issued from IRC.

use anyhow::Result;
use tracing::{debug, warn};

use crate::bot::client::Client;
use crate::bot::Bot;
use crate::common::time::minutes_str;
use crate::common::types::GameClient;
use crate::irc::colors::{ORANGE, RED, RESET};

/// Reason recorded for penalties issued from IRC.
pub fn get_reason(reason: Option<&str>) -> String {
    match reason.filter(|r| !r.is_empty()) {
        Some(reason) => format!("{} (by an IRC admin)", reason),
        None => "banned by an IRC admin".to_string(),
    }
}

/// Split `<client> [rest]` arguments.
pub fn parse_user_cmd(data: &str) -> Option<(&str, Option<&str>)> {
    let data = data.trim();
    if data.is_empty() {
        return None;
    }
    match data.split_once(char::is_whitespace) {
        Some((handle, rest)) => {
            let rest = rest.trim();
            Some((handle, (!rest.is_empty()).then_some(rest)))
        }
        None => Some((data, None)),
    }
}

/// How a lookup handle is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handle<'a> {
    Slot(&'a str),
    DatabaseId(&'a str),
    Name(&'a str),
}

impl<'a> Handle<'a> {
    fn parse(data: &'a str) -> Self {
        let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if is_digits(data) {
            Handle::Slot(data)
        } else if let Some(id) = data.strip_prefix('@').filter(|id| is_digits(id)) {
            Handle::DatabaseId(id)
        } else {
            Handle::Name(data)
        }
    }
}

impl Bot {
    /// Resolve a slot id, `@database-id` or partial name to exactly one client.
    ///
    /// Misses and ambiguous matches are reported to `invoker` when given.
    pub fn lookup_client(&self, data: &str, invoker: Option<&Client>) -> Option<GameClient> {
        let console = self.console();
        let mut matches: Vec<GameClient> = match Handle::parse(data) {
            Handle::Slot(slot) => slot
                .parse()
                .ok()
                .and_then(|slot| console.client_by_slot(slot))
                .into_iter()
                .collect(),
            Handle::DatabaseId(id) => id
                .parse()
                .map(|id| console.clients_by_id(id))
                .unwrap_or_default(),
            Handle::Name(name) => console.lookup_by_name(name),
        };

        let report = |text: String| {
            if let Some(invoker) = invoker {
                if let Err(e) = invoker.message(&text) {
                    warn!("Could not notify {}: {}", invoker.nick(), e);
                }
            }
        };

        match matches.len() {
            0 => {
                report(format!("no client found matching {}{}", RED, data));
                None
            }
            1 => matches.pop(),
            _ => {
                let collection: Vec<_> = matches
                    .iter()
                    .map(|c| format!("[{}@{}{}] {}", ORANGE, c.id, RESET, c.name))
                    .collect();
                report(format!(
                    "multiple clients matching {}{}{}: {}",
                    RED,
                    data,
                    RESET,
                    collection.join(", ")
                ));
                None
            }
        }
    }

    /// Expand a reason keyword from `admin.reasons`, or use the text as given.
    pub fn resolve_reason(&self, keyword: Option<&str>) -> Option<String> {
        let keyword = keyword?.trim();
        if keyword.is_empty() {
            return None;
        }
        let reasons = &self.config().admin.reasons;
        let expanded = reasons
            .get(keyword)
            .or_else(|| reasons.get(&keyword.to_lowercase()));
        Some(expanded.map_or_else(|| keyword.to_string(), Clone::clone))
    }

    /// Refusal text when `target` is in the protected group.
    pub fn protected_refusal(&self, target: &GameClient, action: &str) -> Option<String> {
        let group = self.console().group(&self.config().admin.superadmin_group)?;
        target.in_group(&group).then(|| {
            format!(
                "{}{}{} is a {}{}{} and can't be {}",
                ORANGE, target.name, RESET, ORANGE, group.name, RESET, action
            )
        })
    }

    /// Ban `target` on behalf of `invoker` and announce it in the invoker's channel.
    ///
    /// `duration` in minutes makes it a tempban.
    pub fn ban(
        &self,
        target: &GameClient,
        invoker: &Client,
        reason: Option<&str>,
        keyword: Option<&str>,
        duration: Option<f64>,
    ) -> Result<()> {
        if let Some(refusal) = self.protected_refusal(target, "banned") {
            invoker.message(&refusal)?;
            return Ok(());
        }

        let console = self.console();
        console.set_group_bits(target.id, 0)?;
        let recorded = get_reason(reason);
        match duration {
            Some(minutes) => console.tempban(target.id, &recorded, keyword, minutes)?,
            None => console.ban(target.id, &recorded, keyword)?,
        }
        debug!("{} banned @{} from IRC", invoker.nick(), target.id);

        let mut message = format!(
            "{}{}{} was banned by {}{}{}",
            ORANGE,
            target.name,
            RESET,
            ORANGE,
            invoker.nick(),
            RESET
        );
        if let Some(minutes) = duration {
            message.push_str(&format!(" for {}{}{}", RED, minutes_str(minutes), RESET));
        }
        if let Some(reason) = reason.filter(|r| !r.is_empty()) {
            message.push_str(&format!(" [reason: {}{}{}]", RED, reason, RESET));
        }

        match self.channel(invoker.channel()) {
            Some(channel) => channel.message(&message)?,
            None => warn!("Channel {} is gone, ban not announced", invoker.channel()),
        }
        Ok(())
    }
}
