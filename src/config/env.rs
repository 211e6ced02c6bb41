//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `IRCBRIDGE_ADDRESS` - IRC server host
//! - `IRCBRIDGE_PORT` - IRC server port
//! - `IRCBRIDGE_NICKNAME` - Bot nickname
//! - `IRCBRIDGE_CHANNEL` - Channel to join
//! - `IRCBRIDGE_PASSWORD` - Server password

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "IRCBRIDGE";

/// Apply environment variable overrides to a config.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(address) = env::var(format!("{}_ADDRESS", ENV_PREFIX)) {
        config.irc.address = address;
    }
    if let Ok(port) = env::var(format!("{}_PORT", ENV_PREFIX)) {
        if let Ok(port) = port.parse() {
            config.irc.port = port;
        }
    }
    if let Ok(nickname) = env::var(format!("{}_NICKNAME", ENV_PREFIX)) {
        config.irc.nickname = nickname;
    }
    if let Ok(channel) = env::var(format!("{}_CHANNEL", ENV_PREFIX)) {
        config.irc.channel = channel;
    }
    if let Ok(password) = env::var(format!("{}_PASSWORD", ENV_PREFIX)) {
        config.irc.password = Some(password).filter(|p| !p.is_empty());
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `IRCBRIDGE_CONFIG` environment variable, otherwise returns "ircbridge.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "ircbridge.conf".to_string())
}
