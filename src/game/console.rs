//! Interface to the game administration console.
//!
//! The bridge never owns game state: every client, group, penalty and
//! cvar is read from and written to the console through [`Console`].

use std::time::Duration;

use crate::common::error::ConsoleResult;
use crate::common::types::{ClientId, Cvar, GameClient, Group, Penalty, PenaltyKind, PluginStatus};
use crate::irc::colors::strip_game_colors;

/// Receives the output of a bridged admin command.
pub trait OutputSink {
    /// Public output, normally broadcast to the whole server.
    fn say(&mut self, text: &str);

    /// Output addressed to the invoker only.
    fn message(&mut self, text: &str);
}

/// The game administration console the bridge talks to.
///
/// Calls are synchronous and cheap; implementations guard their own state.
pub trait Console: Send + Sync {
    /// Name of the game the console administers.
    fn game_name(&self) -> String;

    /// Console version string, may contain game color codes.
    fn version(&self) -> String;

    fn uptime(&self) -> Duration;

    /// Broadcast a chat line on the game server.
    fn say(&self, text: &str);

    /// Send a private line to a player.
    fn message(&self, client: &GameClient, text: &str);

    fn strip_colors(&self, text: &str) -> String {
        strip_game_colors(text)
    }

    // ---- clients ----

    /// Players currently connected.
    fn connected_clients(&self) -> Vec<GameClient>;

    fn client_by_slot(&self, slot: u32) -> Option<GameClient>;

    /// Database lookup; zero or one result.
    fn clients_by_id(&self, id: ClientId) -> Vec<GameClient>;

    /// Partial, case-insensitive name search over connected and stored clients.
    fn lookup_by_name(&self, name: &str) -> Vec<GameClient>;

    fn group(&self, keyword: &str) -> Option<Group>;

    /// Group matching an exact admin level.
    fn group_for_level(&self, level: u32) -> Option<Group>;

    fn set_group_bits(&self, client: ClientId, bits: u32) -> ConsoleResult<()>;

    // ---- penalties ----

    fn ban(&self, client: ClientId, reason: &str, keyword: Option<&str>) -> ConsoleResult<()>;

    fn tempban(
        &self,
        client: ClientId,
        reason: &str,
        keyword: Option<&str>,
        minutes: f64,
    ) -> ConsoleResult<()>;

    fn kick(&self, client: ClientId, reason: &str, keyword: Option<&str>) -> ConsoleResult<()>;

    fn unban(&self, client: ClientId, reason: &str) -> ConsoleResult<()>;

    /// Active penalties of the given kinds.
    fn penalties(&self, client: ClientId, kinds: &[PenaltyKind]) -> Vec<Penalty>;

    // ---- server ----

    /// `Ok(None)` for an unknown cvar, `Err(CvarUnsupported)` when the game has no cvars.
    fn get_cvar(&self, name: &str) -> ConsoleResult<Option<Cvar>>;

    fn set_cvar(&self, name: &str, value: &str) -> ConsoleResult<()>;

    fn map_name(&self) -> String;

    fn next_map(&self) -> String;

    fn max_clients(&self) -> u32;

    fn plugins(&self) -> Vec<PluginStatus>;

    // ---- admin commands ----

    fn has_admin_command(&self, name: &str) -> bool;

    /// Run an admin command on behalf of an IRC user, writing its output to `sink`.
    fn execute_admin_command(
        &self,
        name: &str,
        args: &str,
        invoker: &str,
        sink: &mut dyn OutputSink,
    ) -> ConsoleResult<()>;
}
