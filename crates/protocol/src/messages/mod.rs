//! Wire message definitions.
//!
//! All messages travel as JSON text frames, tagged by a `type` field.

mod client;
mod server;

pub use client::*;
pub use server::*;

use serde::{Deserialize, Serialize};

use crate::{Color, ItemKind};

/// A player as seen on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: u32,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub color: Color,
    pub score: u32,
}

/// A live item as seen on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemState {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub kind: ItemKind,
    pub value: u32,
    /// Expiry timestamp in epoch milliseconds.
    pub expires_at: u64,
}

/// A static wall rectangle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WallState {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One row of the global score table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub id: u32,
    pub name: String,
    pub score: u32,
    pub items_collected: u32,
    pub coins_collected: u32,
    pub gems_collected: u32,
    pub diamonds_collected: u32,
    /// Join timestamp in epoch milliseconds.
    pub joined_at: u64,
}

/// The current top-scoring player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderInfo {
    pub id: u32,
    pub name: String,
    pub score: u32,
}

/// Full world state sent to a newly joined client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub players: Vec<PlayerState>,
    pub items: Vec<ItemState>,
    pub walls: Vec<WallState>,
    pub scores: Vec<ScoreEntry>,
}
