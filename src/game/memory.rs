//! In-memory game console.
//!
//! Keeps clients, groups, penalties and cvars in process. Used by the
//! standalone binary and as the console behind the session tests.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::common::error::{ConsoleError, ConsoleResult};
use crate::common::messages::ConsoleEvent;
use crate::common::types::{
    ClientId, Cvar, GameClient, Group, Penalty, PenaltyKind, PluginStatus, PERMANENT,
};
use crate::game::console::{Console, OutputSink};

const ADMIN_COMMANDS: [&str; 3] = ["say", "map", "list"];

#[derive(Debug, Default)]
struct MemoryState {
    clients: Vec<GameClient>,
    groups: Vec<Group>,
    penalties: Vec<Penalty>,
    cvars: BTreeMap<String, String>,
    map_name: String,
    next_map: String,
    plugins: Vec<PluginStatus>,
    said: Vec<String>,
    messages: Vec<(ClientId, String)>,
    next_penalty_id: u64,
}

/// A [`Console`] backed by process memory.
#[derive(Debug)]
pub struct MemoryConsole {
    game_name: String,
    version: String,
    started: Instant,
    supports_cvars: bool,
    state: RwLock<MemoryState>,
    events: Option<mpsc::UnboundedSender<ConsoleEvent>>,
}

impl MemoryConsole {
    pub fn new(game_name: &str) -> Self {
        let groups = vec![
            Group::new(0, "guest", "Guest", 0),
            Group::new(1, "user", "User", 1),
            Group::new(2, "reg", "Regular", 2),
            Group::new(8, "mod", "Moderator", 20),
            Group::new(16, "admin", "Admin", 40),
            Group::new(32, "fulladmin", "Full Admin", 60),
            Group::new(64, "senioradmin", "Senior Admin", 80),
            Group::new(128, "superadmin", "Super Admin", 100),
        ];
        let cvars = BTreeMap::from([("sv_maxclients".to_string(), "16".to_string())]);

        Self {
            game_name: game_name.to_string(),
            version: format!("^0(^8b3^0) ^9ircbridge ^9v{}", env!("CARGO_PKG_VERSION")),
            started: Instant::now(),
            supports_cvars: true,
            state: RwLock::new(MemoryState {
                groups,
                cvars,
                next_penalty_id: 1,
                ..Default::default()
            }),
            events: None,
        }
    }

    /// Publish bans, kicks and map changes on `tx`.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<ConsoleEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Behave like a game without cvar support.
    pub fn without_cvars(mut self) -> Self {
        self.supports_cvars = false;
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ConsoleEvent) {
        if let Some(tx) = &self.events {
            if let Err(e) = tx.send(event) {
                debug!("Console event dropped, session gone: {}", e);
            }
        }
    }

    pub fn add_client(&self, client: GameClient) {
        let mut state = self.write();
        state.clients.retain(|c| c.id != client.id);
        state.clients.push(client);
    }

    pub fn add_plugin(&self, name: &str, enabled: bool) {
        self.write().plugins.push(PluginStatus {
            name: name.to_string(),
            enabled,
        });
    }

    pub fn add_penalty(&self, penalty: Penalty) {
        let mut state = self.write();
        state.next_penalty_id = state.next_penalty_id.max(penalty.id + 1);
        state.penalties.push(penalty);
    }

    pub fn set_map(&self, map_name: &str, next_map: &str) {
        let mut state = self.write();
        state.map_name = map_name.to_string();
        state.next_map = next_map.to_string();
    }

    /// Switch maps and publish the change.
    pub fn change_map(&self, map_name: &str) {
        self.write().map_name = map_name.to_string();
        info!("Map changed to {}", map_name);
        self.emit(ConsoleEvent::MapChange {
            new_map: map_name.to_string(),
        });
    }

    pub fn client(&self, id: ClientId) -> Option<GameClient> {
        self.read().clients.iter().find(|c| c.id == id).cloned()
    }

    /// Everything broadcast with [`Console::say`] so far.
    pub fn said(&self) -> Vec<String> {
        self.read().said.clone()
    }

    /// Private lines sent with [`Console::message`] so far.
    pub fn messages(&self) -> Vec<(ClientId, String)> {
        self.read().messages.clone()
    }

    fn add_penalty_for(
        &self,
        client: ClientId,
        kind: PenaltyKind,
        reason: &str,
        keyword: Option<&str>,
        time_expire: i64,
    ) -> ConsoleResult<GameClient> {
        let mut state = self.write();
        let id = state.next_penalty_id;
        state.next_penalty_id += 1;

        let target = state
            .clients
            .iter_mut()
            .find(|c| c.id == client)
            .ok_or_else(|| ConsoleError::ClientNotFound {
                handle: format!("@{}", client),
            })?;
        if kind != PenaltyKind::Warning {
            target.slot = None;
        }
        match kind {
            PenaltyKind::Ban | PenaltyKind::TempBan => target.bans += 1,
            PenaltyKind::Warning => target.warnings += 1,
            PenaltyKind::Kick => {}
        }
        let target = target.clone();

        state.penalties.push(Penalty {
            id,
            kind,
            client_id: client,
            admin_id: None,
            reason: Some(reason.to_string()),
            keyword: keyword.map(str::to_string),
            time_expire,
            active: kind != PenaltyKind::Kick,
        });
        Ok(target)
    }
}

impl Console for MemoryConsole {
    fn game_name(&self) -> String {
        self.game_name.clone()
    }

    fn version(&self) -> String {
        self.version.clone()
    }

    fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    fn say(&self, text: &str) {
        info!("[SAY] {}", self.strip_colors(text));
        self.write().said.push(text.to_string());
    }

    fn message(&self, client: &GameClient, text: &str) {
        info!("[PM {}] {}", client.name, self.strip_colors(text));
        self.write().messages.push((client.id, text.to_string()));
    }

    fn connected_clients(&self) -> Vec<GameClient> {
        let mut clients: Vec<_> = self
            .read()
            .clients
            .iter()
            .filter(|c| c.is_connected())
            .cloned()
            .collect();
        clients.sort_by_key(|c| c.slot);
        clients
    }

    fn client_by_slot(&self, slot: u32) -> Option<GameClient> {
        self.read()
            .clients
            .iter()
            .find(|c| c.slot == Some(slot))
            .cloned()
    }

    fn clients_by_id(&self, id: ClientId) -> Vec<GameClient> {
        self.client(id).into_iter().collect()
    }

    fn lookup_by_name(&self, name: &str) -> Vec<GameClient> {
        let needle = self.strip_colors(name).to_lowercase();
        self.read()
            .clients
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    fn group(&self, keyword: &str) -> Option<Group> {
        self.read()
            .groups
            .iter()
            .find(|g| g.keyword == keyword)
            .cloned()
    }

    fn group_for_level(&self, level: u32) -> Option<Group> {
        self.read().groups.iter().find(|g| g.level == level).cloned()
    }

    fn set_group_bits(&self, client: ClientId, bits: u32) -> ConsoleResult<()> {
        let mut state = self.write();
        let target = state
            .clients
            .iter_mut()
            .find(|c| c.id == client)
            .ok_or_else(|| ConsoleError::ClientNotFound {
                handle: format!("@{}", client),
            })?;
        target.group_bits = bits;
        if bits == 0 {
            target.max_level = 0;
        }
        Ok(())
    }

    fn ban(&self, client: ClientId, reason: &str, keyword: Option<&str>) -> ConsoleResult<()> {
        let target = self.add_penalty_for(client, PenaltyKind::Ban, reason, keyword, PERMANENT)?;
        self.emit(ConsoleEvent::Ban {
            client: target,
            admin: None,
            reason: Some(reason.to_string()),
        });
        Ok(())
    }

    fn tempban(
        &self,
        client: ClientId,
        reason: &str,
        keyword: Option<&str>,
        minutes: f64,
    ) -> ConsoleResult<()> {
        // float-to-int casts saturate
        let expire = Utc::now().timestamp().saturating_add((minutes * 60.0) as i64);
        let target = self.add_penalty_for(client, PenaltyKind::TempBan, reason, keyword, expire)?;
        self.emit(ConsoleEvent::TempBan {
            client: target,
            admin: None,
            reason: Some(reason.to_string()),
            duration: minutes,
        });
        Ok(())
    }

    fn kick(&self, client: ClientId, reason: &str, keyword: Option<&str>) -> ConsoleResult<()> {
        let target = self.add_penalty_for(client, PenaltyKind::Kick, reason, keyword, 0)?;
        self.emit(ConsoleEvent::Kick {
            client: target,
            admin: None,
            reason: Some(reason.to_string()),
        });
        Ok(())
    }

    fn unban(&self, client: ClientId, reason: &str) -> ConsoleResult<()> {
        let mut state = self.write();
        if !state.clients.iter().any(|c| c.id == client) {
            return Err(ConsoleError::ClientNotFound {
                handle: format!("@{}", client),
            });
        }
        for penalty in state.penalties.iter_mut().filter(|p| {
            p.client_id == client && matches!(p.kind, PenaltyKind::Ban | PenaltyKind::TempBan)
        }) {
            penalty.active = false;
        }
        debug!("Unbanned @{}: {}", client, reason);
        Ok(())
    }

    fn penalties(&self, client: ClientId, kinds: &[PenaltyKind]) -> Vec<Penalty> {
        self.read()
            .penalties
            .iter()
            .filter(|p| p.client_id == client && p.active && kinds.contains(&p.kind))
            .cloned()
            .collect()
    }

    fn get_cvar(&self, name: &str) -> ConsoleResult<Option<Cvar>> {
        if !self.supports_cvars {
            return Err(ConsoleError::CvarUnsupported {
                game: self.game_name.clone(),
            });
        }
        Ok(self.read().cvars.get(name).map(|value| Cvar {
            name: name.to_string(),
            value: value.clone(),
        }))
    }

    fn set_cvar(&self, name: &str, value: &str) -> ConsoleResult<()> {
        if !self.supports_cvars {
            return Err(ConsoleError::CvarUnsupported {
                game: self.game_name.clone(),
            });
        }
        self.write()
            .cvars
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn map_name(&self) -> String {
        self.read().map_name.clone()
    }

    fn next_map(&self) -> String {
        self.read().next_map.clone()
    }

    fn max_clients(&self) -> u32 {
        self.read()
            .cvars
            .get("sv_maxclients")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    fn plugins(&self) -> Vec<PluginStatus> {
        let mut plugins = self.read().plugins.clone();
        plugins.sort_by(|a, b| a.name.cmp(&b.name));
        plugins
    }

    fn has_admin_command(&self, name: &str) -> bool {
        ADMIN_COMMANDS.contains(&name)
    }

    fn execute_admin_command(
        &self,
        name: &str,
        args: &str,
        invoker: &str,
        sink: &mut dyn OutputSink,
    ) -> ConsoleResult<()> {
        debug!("{} runs admin command {} {}", invoker, name, args);
        match name {
            "say" => {
                let text = format!("^7{}^7: ^3{}", invoker, args);
                self.say(&text);
                sink.say(&text);
                Ok(())
            }
            "map" => {
                let map = args.trim();
                if map.is_empty() {
                    return Err(ConsoleError::Failed {
                        message: "missing map name".to_string(),
                    });
                }
                sink.say(&format!("^7Changing map to ^2{}", map));
                self.change_map(map);
                Ok(())
            }
            "list" => {
                let names: Vec<_> = self
                    .connected_clients()
                    .into_iter()
                    .map(|c| format!("{}:{}", c.slot.unwrap_or_default(), c.name))
                    .collect();
                sink.message(&format!("^7{}", names.join(", ")));
                Ok(())
            }
            _ => Err(ConsoleError::UnknownCommand {
                name: name.to_string(),
            }),
        }
    }
}
