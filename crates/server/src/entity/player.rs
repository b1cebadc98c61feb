//! Player entity.

use crate::collision::Rect;
use glam::Vec2;
use protocol::Color;
use protocol::messages::PlayerState;

/// A connected, active player. Owned exclusively by the world engine.
#[derive(Debug, Clone)]
pub struct Player {
    /// Connection handle, assigned by the server.
    pub id: u32,
    /// Sanitized display name.
    pub name: String,
    /// Display color.
    pub color: Color,
    /// Top-left corner of the player's square.
    pub position: Vec2,
    /// Cumulative score. Never decreases while connected.
    pub score: u32,
    /// Epoch-millisecond timestamp of the last accepted mutation.
    pub last_update: u64,
}

impl Player {
    pub fn new(id: u32, name: String, color: Color, position: Vec2, now: u64) -> Self {
        Self {
            id,
            name,
            color,
            position,
            score: 0,
            last_update: now,
        }
    }

    /// Commit an accepted move.
    pub fn update_position(&mut self, position: Vec2, now: u64) {
        self.position = position;
        self.last_update = now;
    }

    /// Grant points; returns the new total.
    pub fn add_score(&mut self, points: u32) -> u32 {
        self.score += points;
        self.score
    }

    /// The player's collision rectangle.
    pub fn rect(&self, size: f32) -> Rect {
        Rect::square(self.position, size)
    }

    /// Wire representation.
    pub fn to_state(&self) -> PlayerState {
        PlayerState {
            id: self.id,
            name: self.name.clone(),
            x: self.position.x,
            y: self.position.y,
            color: self.color,
            score: self.score,
        }
    }
}

/// Sanitize a raw display name: strip angle brackets, trim, cap length,
/// and substitute `Player_{id}` when nothing is left.
pub fn sanitize_name(raw: &str, id: u32, max_len: usize) -> String {
    let cleaned: String = raw.chars().filter(|c| *c != '<' && *c != '>').collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return format!("Player_{id}");
    }
    trimmed.chars().take(max_len).collect()
}
