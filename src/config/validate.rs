//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.
//! A config that fails here disables the bridge entirely.

use fancy_regex::Regex;

use crate::common::error::ConfigError;
use crate::common::time::time_to_minutes;
use crate::config::types::{Config, MAX_HEALTH_INTERVAL};

/// Largest payload that still fits in a 512 byte line with a short command.
const MAX_WRAP_WIDTH: usize = 500;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Connection settings
    if config.irc.address.is_empty() {
        errors.push("irc.address is required".to_string());
    }
    if config.irc.port == 0 {
        errors.push("irc.port must be non-zero".to_string());
    }
    if config.irc.nickname.is_empty() {
        errors.push("irc.nickname is required".to_string());
    } else if config.irc.nickname.contains(char::is_whitespace) {
        errors.push(format!(
            "irc.nickname '{}' must not contain whitespace",
            config.irc.nickname
        ));
    }
    if config.irc.channel.is_empty() {
        errors.push("irc.channel is required".to_string());
    } else if !config.irc.channel.starts_with(['#', '&', '+', '!']) {
        errors.push(format!(
            "irc.channel '{}' is not a channel name (must start with #, &, + or !)",
            config.irc.channel
        ));
    }
    if config.irc.maxrate < 0.0 {
        errors.push("irc.maxrate must not be negative".to_string());
    }
    if config.irc.wrap_width == 0 || config.irc.wrap_width > MAX_WRAP_WIDTH {
        errors.push(format!(
            "irc.wrap_width must be between 1 and {} (got {})",
            MAX_WRAP_WIDTH, config.irc.wrap_width
        ));
    }
    if !(1..=MAX_HEALTH_INTERVAL).contains(&config.settings.interval) {
        errors.push(format!(
            "settings.interval must be between 1 and {} minutes (got {})",
            MAX_HEALTH_INTERVAL, config.settings.interval
        ));
    }
    for (i, line) in config.irc.perform.iter().enumerate() {
        if line.contains(['\r', '\n']) {
            errors.push(format!("irc.perform[{}] contains a line break", i));
        }
    }

    // Admin settings
    if config.admin.prefix.chars().count() != 1 {
        errors.push("admin.prefix must be a single character".to_string());
    }
    if config.admin.loud_prefix.chars().count() != 1 {
        errors.push("admin.loud_prefix must be a single character".to_string());
    }
    if config.admin.prefix == config.admin.loud_prefix {
        errors.push("admin.prefix and admin.loud_prefix must differ".to_string());
    }
    if !time_to_minutes(&config.admin.ban_duration).is_some_and(|m| m > 0.0) {
        errors.push(format!(
            "admin.ban_duration '{}' is not a positive duration of at most ten years",
            config.admin.ban_duration
        ));
    }

    // Command table
    for name in config.commands.keys() {
        if name.is_empty() || name.contains(char::is_whitespace) {
            errors.push(format!("commands.'{}' is not a valid command name", name));
        }
    }

    // Validate filter patterns (try to compile them)
    if let Some(ref filters) = config.filters {
        if let Some(ref patterns) = filters.irc_to_game {
            for (i, pattern) in patterns.iter().enumerate() {
                if Regex::new(pattern).is_err() {
                    errors.push(format!(
                        "filters.irc_to_game[{}] is not a valid regex: '{}'",
                        i, pattern
                    ));
                }
            }
        }
        if let Some(ref patterns) = filters.game_to_irc {
            for (i, pattern) in patterns.iter().enumerate() {
                if Regex::new(pattern).is_err() {
                    errors.push(format!(
                        "filters.game_to_irc[{}] is not a valid regex: '{}'",
                        i, pattern
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::types::{test_config, FiltersConfig};

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&test_config()).is_ok());
    }

    #[test]
    fn test_missing_required_fields_all_reported() {
        let mut config = test_config();
        config.irc.nickname = String::new();
        config.irc.address = String::new();
        config.irc.channel = String::new();

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("irc.nickname is required"));
        assert!(message.contains("irc.address is required"));
        assert!(message.contains("irc.channel is required"));
    }

    #[test]
    fn test_channel_without_prefix_fails() {
        let mut config = test_config();
        config.irc.channel = "clan".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("not a channel name"));
    }

    #[test]
    fn test_perform_line_break_fails() {
        let mut config = test_config();
        config.irc.perform = vec!["MODE b3bot +x\r\nQUIT".to_string()];

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("irc.perform[0]"));
    }

    #[test]
    fn test_same_prefixes_fail() {
        let mut config = test_config();
        config.admin.loud_prefix = "!".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("must differ"));
    }

    #[test]
    fn test_bad_ban_duration_fails() {
        let mut config = test_config();
        config.admin.ban_duration = "forever".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("ban_duration"));
    }

    #[test]
    fn test_health_interval_bounds() {
        let mut config = test_config();
        config.settings.interval = u64::MAX;

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("settings.interval"));
        assert_eq!(config.health_interval(), Duration::from_secs(MAX_HEALTH_INTERVAL * 60));

        config.settings.interval = 0;
        assert!(validate_config(&config).is_err());
        assert_eq!(config.health_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_infinite_ban_duration_fails() {
        for duration in ["inf", "NaN", "1e300", "0", "-2w", "9999999999w"] {
            let mut config = test_config();
            config.admin.ban_duration = duration.to_string();

            let result = validate_config(&config);
            assert!(
                result.unwrap_err().to_string().contains("ban_duration"),
                "{}",
                duration
            );
        }
    }

    #[test]
    fn test_invalid_regex_filter_fails() {
        let mut config = test_config();
        config.filters = Some(FiltersConfig {
            irc_to_game: Some(vec!["[invalid".to_string()]),
            game_to_irc: None,
        });

        let result = validate_config(&config);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("not a valid regex"));
    }
}
