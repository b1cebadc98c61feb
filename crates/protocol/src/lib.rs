//! Shared protocol crate for gridloot.
//!
//! This crate contains:
//! - JSON message definitions for both directions of the wire
//! - Shared types (Color, Direction, ItemKind, snapshot structs)

mod error;
pub mod messages;

pub use error::ProtocolError;
pub use messages::{ClientMessage, ServerMessage};

use serde::{Deserialize, Serialize};

/// Represents a 2D position using glam's Vec2.
pub type Position = glam::Vec2;

/// RGB color, carried on the wire as a `#RRGGBB` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#RRGGBB` hex string. Returns `None` for anything else.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    /// Format as a `#RRGGBB` hex string.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).ok_or_else(|| serde::de::Error::custom("expected #RRGGBB color"))
    }
}

/// A movement command, one axis-aligned step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Collectible item kinds. The point value is a pure function of the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Coin,
    Gem,
    Diamond,
}

impl ItemKind {
    /// Points granted when an item of this kind is collected.
    pub const fn value(self) -> u32 {
        match self {
            ItemKind::Coin => 10,
            ItemKind::Gem => 25,
            ItemKind::Diamond => 50,
        }
    }

    /// Relative spawn weight (out of 100): coin 60, gem 30, diamond 10.
    pub const fn spawn_weight(self) -> u32 {
        match self {
            ItemKind::Coin => 60,
            ItemKind::Gem => 30,
            ItemKind::Diamond => 10,
        }
    }

    pub const ALL: [ItemKind; 3] = [ItemKind::Coin, ItemKind::Gem, ItemKind::Diamond];
}

/// One-time achievements, granted at most once per player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    /// First item ever collected.
    FirstPickup,
    /// Ten items collected.
    Collector,
    /// Score reached 100.
    Centurion,
}

impl AchievementKind {
    /// Human-readable message shown to the player.
    pub const fn message(self) -> &'static str {
        match self {
            AchievementKind::FirstPickup => "First pickup!",
            AchievementKind::Collector => "Collector - 10 items!",
            AchievementKind::Centurion => "Centurion - 100 points!",
        }
    }
}
