//! Canonical message types flowing from the game console into the IRC session.

use crate::common::types::GameClient;

/// Event raised by the game console.
#[derive(Debug, Clone)]
pub enum ConsoleEvent {
    /// A player said something in game chat.
    Say { client: GameClient, text: String },
    /// A player was banned permanently.
    Ban {
        client: GameClient,
        admin: Option<GameClient>,
        reason: Option<String>,
    },
    /// A player was banned for a number of minutes.
    TempBan {
        client: GameClient,
        admin: Option<GameClient>,
        reason: Option<String>,
        duration: f64,
    },
    /// A player was kicked.
    Kick {
        client: GameClient,
        admin: Option<GameClient>,
        reason: Option<String>,
    },
    /// The server switched maps.
    MapChange { new_map: String },
    /// A game admin issued one of the bridge toggles from inside the game.
    Command {
        client: GameClient,
        toggle: Toggle,
        data: String,
    },
}

/// Per-channel broadcast switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toggle {
    LiveChat,
    ShowBans,
    ShowKicks,
    ShowGame,
}

impl Toggle {
    pub const ALL: [Toggle; 4] = [
        Toggle::LiveChat,
        Toggle::ShowBans,
        Toggle::ShowKicks,
        Toggle::ShowGame,
    ];

    /// Command word for this toggle.
    pub fn name(self) -> &'static str {
        match self {
            Toggle::LiveChat => "livechat",
            Toggle::ShowBans => "showbans",
            Toggle::ShowKicks => "showkicks",
            Toggle::ShowGame => "showgame",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }
}

/// Parsed `on`/`off` argument of a toggle command.
pub fn parse_switch(data: &str) -> Option<bool> {
    match data.trim().to_lowercase().as_str() {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}
