//! Command registration from configuration.

use std::collections::BTreeMap;

use tracing::{debug, error, warn};

use crate::commands::{builtin, Command, Handler, Level};
use crate::config::Config;

/// Registered commands, keyed by lowercase name.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Command>,
    prefix: char,
}

impl CommandRegistry {
    pub fn new(prefix: char) -> Self {
        Self {
            commands: BTreeMap::new(),
            prefix,
        }
    }

    /// Register every command named in the `commands` section.
    ///
    /// A `name-alias` key registers the handler under both names. Names with
    /// no built-in handler are logged and skipped.
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::new(config.prefix());

        for (key, &level) in &config.commands {
            let (name, alias) = match key.split_once('-') {
                Some((name, alias)) => (name, Some(alias).filter(|a| !a.is_empty())),
                None => (key.as_str(), None),
            };

            let Some(builtin) = builtin::find(name) else {
                error!("Could not register command {}: no such handler", name);
                continue;
            };

            registry.register(name, level, builtin.handler, builtin.help);
            if let Some(alias) = alias {
                registry.register(alias, level, builtin.handler, builtin.help);
            }
        }

        debug!("Registered {} IRC commands", registry.len());
        registry
    }

    /// Register a handler; a duplicate name is rejected and the first one kept.
    pub fn register(&mut self, name: &str, level: i64, handler: Handler, help: &'static str) -> bool {
        let name = name.to_lowercase();
        if self.commands.contains_key(&name) {
            warn!("Command {} is already registered", name);
            return false;
        }

        let level = Level::clamp(level);
        debug!("Registered command {} ({:?})", name, level);
        self.commands.insert(
            name.clone(),
            Command {
                name,
                level,
                handler,
                help,
            },
        );
        true
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(&name.to_lowercase())
    }

    /// Commands in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Quiet prefix shown in help and usage hints.
    pub fn prefix(&self) -> char {
        self.prefix
    }
}
