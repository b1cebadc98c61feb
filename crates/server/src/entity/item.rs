//! Collectible item entity.

use crate::collision::Rect;
use glam::Vec2;
use protocol::ItemKind;
use protocol::messages::ItemState;
use rand::Rng;

/// Item identity. Ids come from a monotonic counter and are never reused.
pub type ItemId = u64;

/// A live collectible item.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    /// Top-left corner of the item's square.
    pub position: Vec2,
    /// Epoch-millisecond creation timestamp.
    pub created_at: u64,
    /// Epoch-millisecond expiry timestamp.
    pub expires_at: u64,
}

impl Item {
    pub fn new(id: ItemId, kind: ItemKind, position: Vec2, now: u64, lifespan_ms: u64) -> Self {
        Self {
            id,
            kind,
            position,
            created_at: now,
            expires_at: now + lifespan_ms,
        }
    }

    /// Points granted on pickup. A pure function of the kind.
    pub fn value(&self) -> u32 {
        self.kind.value()
    }

    /// An item is expired strictly after its expiry timestamp.
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.expires_at
    }

    /// The item's collision rectangle.
    pub fn rect(&self, size: f32) -> Rect {
        Rect::square(self.position, size)
    }

    /// Wire representation.
    pub fn to_state(&self) -> ItemState {
        ItemState {
            id: self.id,
            x: self.position.x,
            y: self.position.y,
            kind: self.kind,
            value: self.value(),
            expires_at: self.expires_at,
        }
    }
}

/// Draw an item kind with the fixed weights (coin 60, gem 30, diamond 10).
pub fn random_kind<R: Rng>(rng: &mut R) -> ItemKind {
    let total: u32 = ItemKind::ALL.iter().map(|k| k.spawn_weight()).sum();
    let mut roll = rng.random_range(0..total);
    for kind in ItemKind::ALL {
        if roll < kind.spawn_weight() {
            return kind;
        }
        roll -= kind.spawn_weight();
    }
    // Unreachable: the weights cover the whole roll range.
    ItemKind::Coin
}
