//! Live chat drop filters.
//!
//! Each relay direction has its own list of regex patterns; a message
//! matching any pattern of its direction is not relayed.

use fancy_regex::Regex;
use tracing::{debug, warn};

use crate::config::types::FiltersConfig;

/// Which way a chat line is being relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDirection {
    /// Game chat relayed into IRC.
    GameToIrc,
    /// IRC chat relayed into the game.
    IrcToGame,
}

/// Patterns for one direction, kept with their source text for logging.
#[derive(Debug, Clone, Default)]
struct PatternSet(Vec<(String, Regex)>);

impl PatternSet {
    /// Compile `patterns`; invalid ones are logged and skipped.
    fn compile(patterns: &[String]) -> Self {
        let compiled = patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some((pattern.clone(), regex)),
                Err(e) => {
                    warn!("Skipping invalid filter pattern '{}': {}", pattern, e);
                    None
                }
            })
            .collect();
        Self(compiled)
    }

    fn first_match(&self, text: &str) -> Option<&str> {
        self.0.iter().find_map(|(pattern, regex)| match regex.is_match(text) {
            Ok(true) => Some(pattern.as_str()),
            Ok(false) => None,
            Err(e) => {
                // backtrack limit and similar runtime failures
                warn!("Filter pattern '{}' failed on input: {}", pattern, e);
                None
            }
        })
    }
}

/// Drop filters for both relay directions.
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    game_to_irc: PatternSet,
    irc_to_game: PatternSet,
}

impl MessageFilter {
    pub fn new(game_to_irc: &[String], irc_to_game: &[String]) -> Self {
        Self {
            game_to_irc: PatternSet::compile(game_to_irc),
            irc_to_game: PatternSet::compile(irc_to_game),
        }
    }

    /// Build from the optional `filters` config section.
    pub fn from_config(filters: Option<&FiltersConfig>) -> Self {
        let Some(filters) = filters else {
            return Self::default();
        };
        Self::new(
            filters.game_to_irc.as_deref().unwrap_or_default(),
            filters.irc_to_game.as_deref().unwrap_or_default(),
        )
    }

    /// True when `text` must not be relayed in `direction`.
    pub fn should_filter(&self, direction: FilterDirection, text: &str) -> bool {
        let set = match direction {
            FilterDirection::GameToIrc => &self.game_to_irc,
            FilterDirection::IrcToGame => &self.irc_to_game,
        };
        match set.first_match(text) {
            Some(pattern) => {
                debug!("{:?} relay dropped by pattern '{}'", direction, pattern);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_empty_filter_allows_all() {
        let filter = MessageFilter::default();
        assert!(!filter.should_filter(FilterDirection::GameToIrc, "any message"));
        assert!(!filter.should_filter(FilterDirection::IrcToGame, "any message"));
    }

    #[test]
    fn test_partial_match_filter() {
        let filter = MessageFilter::new(&patterns(&["join.*discord"]), &[]);
        assert!(filter.should_filter(FilterDirection::GameToIrc, "come join our discord now"));
        assert!(!filter.should_filter(FilterDirection::GameToIrc, "nice shot"));
    }

    #[test]
    fn test_directions_are_independent() {
        let filter = MessageFilter::new(&[], &patterns(&["^!"]));
        assert!(!filter.should_filter(FilterDirection::GameToIrc, "!help"));
        assert!(filter.should_filter(FilterDirection::IrcToGame, "!help"));
    }

    #[test]
    fn test_from_config() {
        let filters = FiltersConfig {
            irc_to_game: Some(patterns(&["(?i)spam"])),
            game_to_irc: None,
        };
        let filter = MessageFilter::from_config(Some(&filters));
        assert!(filter.should_filter(FilterDirection::IrcToGame, "SPAM"));
        assert!(!filter.should_filter(FilterDirection::GameToIrc, "SPAM"));

        let open = MessageFilter::from_config(None);
        assert!(!open.should_filter(FilterDirection::IrcToGame, "SPAM"));
    }

    #[test]
    fn test_invalid_pattern_skipped() {
        let filter = MessageFilter::new(&patterns(&["[invalid", "valid"]), &[]);
        assert!(filter.should_filter(FilterDirection::GameToIrc, "valid pattern"));
        assert!(!filter.should_filter(FilterDirection::GameToIrc, "[invalid"));
    }

    #[test]
    fn test_negative_lookahead() {
        // "rush" then "b" unless "no" appears in between
        let filter = MessageFilter::new(&patterns(&["(?i)rush(((?!no).)*)b"]), &[]);
        assert!(filter.should_filter(FilterDirection::GameToIrc, "rush to b"));
        assert!(!filter.should_filter(FilterDirection::GameToIrc, "rush no b"));
    }
}
