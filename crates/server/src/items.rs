//! Item lifecycle registry.
//!
//! Owns the set of live collectible items: weighted spawn, time-based
//! expiry, snapshots. Knows nothing about players or scoring.

use crate::collision::{CollisionMap, Rect};
use crate::config::{ItemConfig, SpawnConfig};
use crate::entity::{Item, ItemId, random_kind};
use protocol::messages::ItemState;
use rand::Rng;
use tracing::debug;

/// The live item set, kept in insertion order so that pickup iteration
/// is deterministic.
#[derive(Debug)]
pub struct ItemRegistry {
    items: Vec<Item>,
    next_item_id: ItemId,
    config: ItemConfig,
}

impl ItemRegistry {
    pub fn new(config: ItemConfig) -> Self {
        Self {
            items: Vec::with_capacity(config.max_count),
            next_item_id: 1,
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_size(&self) -> f32 {
        self.config.size
    }

    /// Spawn one item with a weighted random kind at a valid position.
    ///
    /// Returns `None` when the live set is already at the configured
    /// maximum or no valid position can be found; neither is an error.
    pub fn spawn<R: Rng>(
        &mut self,
        collision: &CollisionMap,
        spawn: &SpawnConfig,
        now: u64,
        rng: &mut R,
    ) -> Option<&Item> {
        if self.items.len() >= self.config.max_count {
            return None;
        }

        let position = collision.find_spawn_position(self.config.size, spawn, rng)?;
        let kind = random_kind(rng);
        let id = self.next_item_id;
        self.next_item_id += 1;

        let item = Item::new(id, kind, position, now, self.config.lifespan_ms);
        debug!("Spawned item {} ({:?}) at ({:.1}, {:.1})", id, kind, position.x, position.y);
        self.items.push(item);
        self.items.last()
    }

    /// Remove every item whose expiry timestamp has passed.
    ///
    /// Two-phase: collect expired ids first, then remove, so the scan
    /// never mutates the set it is walking. Returns the removed ids.
    pub fn sweep_expired(&mut self, now: u64) -> Vec<ItemId> {
        let expired: Vec<ItemId> = self
            .items
            .iter()
            .filter(|item| item.is_expired(now))
            .map(|item| item.id)
            .collect();

        if !expired.is_empty() {
            self.items.retain(|item| !item.is_expired(now));
        }
        expired
    }

    /// First live, non-expired item overlapping `rect`, in insertion
    /// order. Technically-expired items are treated as already gone
    /// even when the periodic sweep has not run yet.
    pub fn first_overlapping(&self, rect: &Rect, now: u64) -> Option<&Item> {
        self.items
            .iter()
            .filter(|item| !item.is_expired(now))
            .find(|item| rect.overlaps(&item.rect(self.config.size)))
    }

    /// Remove a specific item (pickup path).
    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        let idx = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(idx))
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Insert a pre-built item at a pinned position (tests only).
    #[cfg(test)]
    pub(crate) fn insert_for_test(&mut self, item: Item) {
        self.items.push(item);
    }

    /// Point-in-time listing of all live items for transmission.
    pub fn snapshot(&self) -> Vec<ItemState> {
        self.items.iter().map(Item::to_state).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use glam::Vec2;
    use protocol::ItemKind;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn open_collision() -> CollisionMap {
        let map = MapConfig::default();
        CollisionMap::new(Vec::new(), map.width, map.height)
    }

    fn registry() -> ItemRegistry {
        ItemRegistry::new(ItemConfig::default())
    }

    fn push_item(reg: &mut ItemRegistry, id: ItemId, pos: Vec2, now: u64) {
        reg.items
            .push(Item::new(id, ItemKind::Coin, pos, now, reg.config.lifespan_ms));
    }

    #[test]
    fn spawn_stops_at_the_cap() {
        let collision = open_collision();
        let spawn = SpawnConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut reg = registry();

        for _ in 0..reg.config.max_count {
            assert!(reg.spawn(&collision, &spawn, 0, &mut rng).is_some());
        }
        assert_eq!(reg.len(), reg.config.max_count);
        assert!(reg.spawn(&collision, &spawn, 0, &mut rng).is_none());
        assert_eq!(reg.len(), reg.config.max_count);
    }

    #[test]
    fn item_ids_are_monotonic_and_never_reused() {
        let collision = open_collision();
        let spawn = SpawnConfig::default();
        let mut rng = StdRng::seed_from_u64(5);
        let mut reg = registry();

        let first = reg.spawn(&collision, &spawn, 0, &mut rng).unwrap().id;
        let second = reg.spawn(&collision, &spawn, 0, &mut rng).unwrap().id;
        assert!(second > first);

        reg.remove(second).unwrap();
        let third = reg.spawn(&collision, &spawn, 0, &mut rng).unwrap().id;
        assert!(third > second);
    }

    #[test]
    fn sweep_removes_only_expired() {
        let mut reg = registry();
        push_item(&mut reg, 1, Vec2::new(10.0, 10.0), 0);
        push_item(&mut reg, 2, Vec2::new(50.0, 50.0), 20_000);

        // Item 1 expires at 30_000, item 2 at 50_000.
        let removed = reg.sweep_expired(40_000);
        assert_eq!(removed, vec![1]);
        assert_eq!(reg.len(), 1);
        assert!(reg.get(2).is_some());

        assert!(reg.sweep_expired(40_000).is_empty());
    }

    #[test]
    fn expired_items_are_never_collectible() {
        let mut reg = registry();
        push_item(&mut reg, 1, Vec2::new(100.0, 100.0), 0);

        let rect = Rect::new(95.0, 95.0, 30.0, 30.0);
        assert!(reg.first_overlapping(&rect, 29_000).is_some());
        // Past expiry but before any sweep: already gone.
        assert!(reg.first_overlapping(&rect, 30_001).is_none());
    }

    #[test]
    fn first_overlap_wins_in_insertion_order() {
        let mut reg = registry();
        push_item(&mut reg, 1, Vec2::new(100.0, 100.0), 0);
        push_item(&mut reg, 2, Vec2::new(105.0, 105.0), 0);

        let rect = Rect::new(95.0, 95.0, 30.0, 30.0);
        assert_eq!(reg.first_overlapping(&rect, 0).unwrap().id, 1);
    }

    #[test]
    fn snapshot_lists_items_in_insertion_order() {
        let mut reg = registry();
        push_item(&mut reg, 3, Vec2::new(10.0, 10.0), 0);
        push_item(&mut reg, 5, Vec2::new(20.0, 20.0), 0);

        let snapshot = reg.snapshot();
        let ids: Vec<u64> = snapshot.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![3, 5]);
    }
}
