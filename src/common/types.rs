//! Shared types used across the application.
//!
//! These are read-only projections of records owned by the game console.

/// Database identifier of a console client.
pub type ClientId = u64;

/// Sentinel expiry for penalties that never expire.
pub const PERMANENT: i64 = -1;

/// A player known to the game console.
#[derive(Debug, Clone, PartialEq)]
pub struct GameClient {
    /// Database id, shown as `@id`.
    pub id: ClientId,
    /// In-game slot while connected.
    pub slot: Option<u32>,
    pub name: String,
    pub ip: String,
    pub guid: String,
    pub pbid: Option<String>,
    pub group_bits: u32,
    pub max_level: u32,
    pub connections: u32,
    pub warnings: u32,
    pub bans: u32,
    /// Unix timestamp of the last update to this record.
    pub last_seen: i64,
    pub aliases: Vec<Alias>,
}

impl GameClient {
    pub fn new(id: ClientId, name: impl Into<String>) -> Self {
        Self {
            id,
            slot: None,
            name: name.into(),
            ip: String::new(),
            guid: String::new(),
            pbid: None,
            group_bits: 0,
            max_level: 0,
            connections: 0,
            warnings: 0,
            bans: 0,
            last_seen: 0,
            aliases: Vec::new(),
        }
    }

    /// Builder-style slot assignment.
    pub fn in_slot(mut self, slot: u32) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Builder-style group membership.
    pub fn with_group(mut self, group: &Group) -> Self {
        self.group_bits |= group.bits;
        self.max_level = self.max_level.max(group.level);
        self
    }

    pub fn is_connected(&self) -> bool {
        self.slot.is_some()
    }

    pub fn in_group(&self, group: &Group) -> bool {
        self.group_bits & group.bits != 0
    }
}

/// An alias a client has been seen using.
#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    pub alias: String,
    pub times_used: u32,
}

/// Admin group definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub bits: u32,
    pub keyword: String,
    pub name: String,
    pub level: u32,
}

impl Group {
    pub fn new(bits: u32, keyword: &str, name: &str, level: u32) -> Self {
        Self {
            bits,
            keyword: keyword.to_string(),
            name: name.to_string(),
            level,
        }
    }
}

/// Kind of penalty stored by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenaltyKind {
    Ban,
    TempBan,
    Kick,
    Warning,
}

/// A penalty record.
#[derive(Debug, Clone, PartialEq)]
pub struct Penalty {
    pub id: u64,
    pub kind: PenaltyKind,
    pub client_id: ClientId,
    pub admin_id: Option<ClientId>,
    pub reason: Option<String>,
    pub keyword: Option<String>,
    /// Unix timestamp, or [`PERMANENT`].
    pub time_expire: i64,
    pub active: bool,
}

impl Penalty {
    pub fn is_permanent(&self) -> bool {
        self.time_expire == PERMANENT
    }
}

/// A server cvar.
#[derive(Debug, Clone, PartialEq)]
pub struct Cvar {
    pub name: String,
    pub value: String,
}

/// Plugin loaded by the console.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginStatus {
    pub name: String,
    pub enabled: bool,
}
