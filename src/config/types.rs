//! Configuration type definitions.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

/// Longest health check interval, in minutes.
pub const MAX_HEALTH_INTERVAL: u64 = 1440;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub irc: IrcConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// IRC command name (optionally `name-alias`) to minimum level.
    #[serde(default = "default_commands")]
    pub commands: BTreeMap<String, i64>,
    pub filters: Option<FiltersConfig>,
}

/// IRC network connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IrcConfig {
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub nickname: String,
    pub realname: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub channel: String,
    /// Maximum outbound lines per second; zero disables rate limiting.
    #[serde(default = "default_maxrate")]
    pub maxrate: f64,
    /// Raw lines sent once after the welcome message.
    #[serde(default)]
    pub perform: Vec<String>,
    /// Seconds to wait after each auto-perform line.
    #[serde(default = "default_perform_delay")]
    pub perform_delay: u64,
    /// Preferred maximum payload size of a single outbound message, in bytes.
    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,
    /// Reason sent with QUIT on shutdown.
    #[serde(default = "default_quit_message")]
    pub quit_message: String,
}

/// Bot behaviour settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsConfig {
    /// Health check interval in minutes.
    #[serde(default = "default_interval")]
    pub interval: u64,
    /// Also answer commands addressed to `all`.
    #[serde(default = "default_true")]
    pub listen_global: bool,
    #[serde(default = "default_true")]
    pub showbans: bool,
    #[serde(default = "default_true")]
    pub showkicks: bool,
    #[serde(default = "default_true")]
    pub showgame: bool,
    #[serde(default)]
    pub livechat: bool,
    /// Log every raw line sent and received.
    #[serde(default)]
    pub dev: bool,
}

/// Admin command settings shared with the game console.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_loud_prefix")]
    pub loud_prefix: String,
    /// Duration used by the plain `ban` command.
    #[serde(default = "default_ban_duration")]
    pub ban_duration: String,
    /// Keyword of the group that can never be banned or kicked from IRC.
    #[serde(default = "default_superadmin_group")]
    pub superadmin_group: String,
    /// Reason keywords, e.g. `spam = "do not spam"`.
    #[serde(default)]
    pub reasons: BTreeMap<String, String>,
}

/// Public address of the game server, advertised on map change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub public_ip: String,
    #[serde(default)]
    pub port: u16,
}

/// Message filtering configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FiltersConfig {
    /// Patterns to filter out from IRC chat relayed into the game
    pub irc_to_game: Option<Vec<String>>,
    /// Patterns to filter out from game chat relayed into IRC
    pub game_to_irc: Option<Vec<String>>,
}

impl Config {
    /// Health check period.
    pub fn health_interval(&self) -> Duration {
        let minutes = self.settings.interval.clamp(1, MAX_HEALTH_INTERVAL);
        Duration::from_secs(minutes.saturating_mul(60))
    }

    /// Delay between auto-perform lines.
    pub fn perform_delay(&self) -> Duration {
        Duration::from_secs(self.irc.perform_delay)
    }

    /// Quiet command prefix.
    pub fn prefix(&self) -> char {
        self.admin.prefix.chars().next().unwrap_or('!')
    }

    /// Loud command prefix.
    pub fn loud_prefix(&self) -> char {
        self.admin.loud_prefix.chars().next().unwrap_or('@')
    }

    /// Address players use to join, as `ip:port`.
    pub fn join_address(&self) -> String {
        format!("{}:{}", self.server.public_ip, self.server.port)
    }
}

impl Default for IrcConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            port: default_port(),
            nickname: String::new(),
            realname: None,
            password: None,
            channel: String::new(),
            maxrate: default_maxrate(),
            perform: Vec::new(),
            perform_delay: default_perform_delay(),
            wrap_width: default_wrap_width(),
            quit_message: default_quit_message(),
        }
    }
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            listen_global: true,
            showbans: true,
            showkicks: true,
            showgame: true,
            livechat: false,
            dev: false,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            loud_prefix: default_loud_prefix(),
            ban_duration: default_ban_duration(),
            superadmin_group: default_superadmin_group(),
            reasons: BTreeMap::new(),
        }
    }
}

fn default_port() -> u16 {
    6667
}

fn default_maxrate() -> f64 {
    1.0
}

fn default_perform_delay() -> u64 {
    2
}

fn default_wrap_width() -> usize {
    400
}

fn default_quit_message() -> String {
    "B3 is going offline".to_string()
}

fn default_interval() -> u64 {
    1
}

fn default_true() -> bool {
    true
}

fn default_prefix() -> String {
    "!".to_string()
}

fn default_loud_prefix() -> String {
    "@".to_string()
}

fn default_ban_duration() -> String {
    "2w".to_string()
}

fn default_superadmin_group() -> String {
    "superadmin".to_string()
}

/// Built-in command table used when the config has no `commands` section.
pub fn default_commands() -> BTreeMap<String, i64> {
    [
        ("alias", 2),
        ("b3", 0),
        ("ban", 2),
        ("cvar", 2),
        ("exec", 2),
        ("help-h", 0),
        ("kick-k", 2),
        ("list", 1),
        ("listbans", 2),
        ("livechat", 2),
        ("lookup-l", 2),
        ("permban", 2),
        ("plugins", 2),
        ("reconnect", 2),
        ("showbans", 2),
        ("showgame", 2),
        ("showkicks", 2),
        ("status", 0),
        ("tempban", 2),
        ("unban", 2),
        ("version", 0),
    ]
    .into_iter()
    .map(|(name, level)| (name.to_string(), level))
    .collect()
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        irc: IrcConfig {
            address: "irc.example.org".to_string(),
            port: 6667,
            nickname: "b3bot".to_string(),
            realname: None,
            password: None,
            channel: "#test".to_string(),
            maxrate: 0.0,
            perform: Vec::new(),
            perform_delay: 0,
            wrap_width: default_wrap_width(),
            quit_message: default_quit_message(),
        },
        settings: SettingsConfig::default(),
        admin: AdminConfig::default(),
        server: ServerConfig {
            public_ip: "1.2.3.4".to_string(),
            port: 27960,
        },
        commands: default_commands(),
        filters: None,
    }
}
