//! Server -> client messages.

use serde::{Deserialize, Serialize};

use crate::ItemKind;

use super::{ItemState, LeaderInfo, PlayerState, ScoreEntry, WorldSnapshot};

/// A newly granted achievement, with its display message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementNotice {
    pub kind: crate::AchievementKind,
    pub message: String,
}

/// Messages sent from the server to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full state snapshot, sent once to a client that just joined.
    Welcome {
        player_id: u32,
        state: WorldSnapshot,
    },

    /// Another player joined the game.
    PlayerJoined { player: PlayerState },

    /// A player moved; carries the score so pickups need no extra read.
    PlayerMoved {
        id: u32,
        x: f32,
        y: f32,
        score: u32,
    },

    /// A new item appeared on the map.
    ItemSpawned { item: ItemState },

    /// A player collected an item.
    ItemCollected {
        item_id: u64,
        player_id: u32,
        player_name: String,
        kind: ItemKind,
        points: u32,
        new_score: u32,
        scores: Vec<ScoreEntry>,
        /// Present only when at least two players are registered.
        new_leader: Option<LeaderInfo>,
        /// True when the collecting player just took the lead.
        is_new_leader: bool,
    },

    /// Achievements earned by the receiving player (targeted, batched).
    Achievements { achievements: Vec<AchievementNotice> },

    /// A player disconnected.
    PlayerLeft {
        id: u32,
        name: String,
        scores: Vec<ScoreEntry>,
    },

    /// Low-frequency push of the live item set, used to deliver items
    /// spawned by the maintenance sweep without per-item event noise.
    WorldRefresh { items: Vec<ItemState> },

    /// Chat relay.
    Chat {
        player_id: u32,
        player_name: String,
        message: String,
        timestamp: u64,
    },

    /// Read-only statistics surface.
    Stats {
        players_online: usize,
        items_available: usize,
        top_players: Vec<ScoreEntry>,
        uptime_secs: u64,
    },

    /// Liveness reply.
    Pong,

    /// Generic failure report (only the join path produces one).
    Error { message: String },
}

impl ServerMessage {
    /// Encode as a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a JSON text frame.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
