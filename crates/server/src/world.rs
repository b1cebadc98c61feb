//! World state engine.
//!
//! Owns the player set and composes the collision oracle, the item
//! registry, and the score ledger. All world mutation funnels through
//! the operations here; callers serialize access (the transport wraps
//! the world in one exclusive lock).

use crate::collision::{CollisionMap, Rect};
use crate::config::Config;
use crate::entity::{self, Item, ItemId, Player};
use crate::items::ItemRegistry;
use crate::score::ScoreLedger;
use glam::Vec2;
use protocol::messages::{ItemState, WallState, WorldSnapshot};
use protocol::{AchievementKind, Color, Direction, ItemKind};
use rand::Rng;
use std::collections::HashMap;
use tracing::{debug, info};

/// Result of a movement command for a known player.
#[derive(Debug, Clone)]
pub struct MoveResult {
    /// False when the candidate position was rejected; the player's
    /// position is then unchanged.
    pub moved: bool,
    pub x: f32,
    pub y: f32,
    pub score: u32,
    pub pickup: Option<Pickup>,
}

/// An item collected by an accepted move. At most one per move.
#[derive(Debug, Clone)]
pub struct Pickup {
    pub item_id: ItemId,
    pub kind: ItemKind,
    pub points: u32,
    pub total_score: u32,
    pub achievements: Vec<AchievementKind>,
}

/// Result of an expiry sweep plus bounded refill.
#[derive(Debug, Clone, Copy)]
pub struct CleanupReport {
    pub expired: usize,
    pub spawned: usize,
    pub total: usize,
}

/// The authoritative game world.
#[derive(Debug)]
pub struct World {
    config: Config,
    collision: CollisionMap,
    players: HashMap<u32, Player>,
    items: ItemRegistry,
    ledger: ScoreLedger,
}

impl World {
    /// Create a world with the standard wall layout.
    pub fn new(config: &Config) -> Self {
        let walls = entity::standard_layout(&config.map);
        Self::with_walls(config, walls)
    }

    /// Create a world with an explicit wall layout (tests, custom maps).
    pub fn with_walls(config: &Config, walls: Vec<Rect>) -> Self {
        let collision = CollisionMap::new(walls, config.map.width, config.map.height);
        Self {
            collision,
            players: HashMap::new(),
            items: ItemRegistry::new(config.item.clone()),
            ledger: ScoreLedger::new(),
            config: config.clone(),
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn ledger(&self) -> &ScoreLedger {
        &self.ledger
    }

    pub fn player(&self, id: u32) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Fill the map up to the configured minimum item count (startup).
    pub fn populate_initial_items<R: Rng>(&mut self, now: u64, rng: &mut R) -> usize {
        let mut spawned = 0;
        while self.items.len() < self.config.item.min_count {
            if self
                .items
                .spawn(&self.collision, &self.config.spawn, now, rng)
                .is_none()
            {
                break;
            }
            spawned += 1;
        }
        spawned
    }

    /// Add a player: sanitize the name, validate the color (random
    /// fallback), find a spawn position, register with the ledger.
    ///
    /// Returns `None` when the player cap is reached or no valid spawn
    /// position exists.
    pub fn add_player<R: Rng>(
        &mut self,
        id: u32,
        raw_name: &str,
        raw_color: Option<&str>,
        now: u64,
        rng: &mut R,
    ) -> Option<&Player> {
        if self.players.contains_key(&id) {
            return self.players.get(&id);
        }
        if self.players.len() >= self.config.server.max_players {
            debug!("Join rejected for {}: player cap reached", id);
            return None;
        }

        let position =
            self.collision
                .find_spawn_position(self.config.player.size, &self.config.spawn, rng)?;

        let name = entity::sanitize_name(raw_name, id, self.config.player.max_name_length);
        let color = raw_color
            .and_then(Color::from_hex)
            .unwrap_or_else(|| random_color(rng));

        let player = Player::new(id, name, color, position, now);
        self.ledger.register_player(id, &player.name, now);
        info!("{} joined at ({:.1}, {:.1})", player.name, position.x, position.y);
        self.players.insert(id, player);
        self.players.get(&id)
    }

    /// Remove a player; returns the display name if they existed.
    pub fn remove_player(&mut self, id: u32) -> Option<String> {
        let player = self.players.remove(&id)?;
        self.ledger.unregister_player(id);
        info!("{} left the game", player.name);
        Some(player.name)
    }

    /// Apply a movement command.
    ///
    /// Returns `None` for an unknown player. The move is rejected (no
    /// state change) when the candidate rectangle leaves the map, hits
    /// a wall, or overlaps another player. On acceptance the new
    /// rectangle is checked against the live items; the first overlap
    /// in insertion order is collected, at most one per move.
    pub fn move_player(&mut self, id: u32, direction: Direction, now: u64) -> Option<MoveResult> {
        let size = self.config.player.size;
        let speed = self.config.player.speed;

        let player = self.players.get(&id)?;
        let candidate = player.position + step(direction, speed);

        if !self.collision.is_valid_position(candidate, size)
            || self.overlaps_other_player(id, Rect::square(candidate, size))
        {
            return Some(MoveResult {
                moved: false,
                x: player.position.x,
                y: player.position.y,
                score: player.score,
                pickup: None,
            });
        }

        let player = self.players.get_mut(&id)?;
        player.update_position(candidate, now);
        let rect = player.rect(size);

        let overlapping = self.items.first_overlapping(&rect, now).map(|item| item.id);
        let collected = overlapping.and_then(|item_id| self.collect_item(id, item_id));

        let player = self.players.get(&id)?;
        Some(MoveResult {
            moved: true,
            x: player.position.x,
            y: player.position.y,
            score: player.score,
            pickup: collected,
        })
    }

    /// Does `rect` overlap any player other than `id`?
    fn overlaps_other_player(&self, id: u32, rect: Rect) -> bool {
        let size = self.config.player.size;
        self.players
            .values()
            .filter(|other| other.id != id)
            .any(|other| rect.overlaps(&other.rect(size)))
    }

    /// Grant an item to a player: score, ledger update, removal.
    fn collect_item(&mut self, player_id: u32, item_id: ItemId) -> Option<Pickup> {
        let item = self.items.remove(item_id)?;
        let points = item.value();

        let player = self.players.get_mut(&player_id)?;
        let total_score = player.add_score(points);
        let achievements = self.ledger.apply_pickup(player_id, points, item.kind);

        debug!(
            "{} collected item {} ({:?}) for {} points",
            player.name, item.id, item.kind, points
        );
        Some(Pickup {
            item_id: item.id,
            kind: item.kind,
            points,
            total_score,
            achievements,
        })
    }

    /// Spawn one item (maintenance path). The registry enforces the cap.
    pub fn spawn_item<R: Rng>(&mut self, now: u64, rng: &mut R) -> Option<ItemState> {
        self.items
            .spawn(&self.collision, &self.config.spawn, now, rng)
            .map(Item::to_state)
    }

    /// True when the live item count is below the configured minimum.
    pub fn needs_items(&self) -> bool {
        self.items.len() < self.config.item.min_count
    }

    /// Sweep expired items, then spawn replacements up to the
    /// configured minimum but never more than just expired — bounded
    /// catch-up, not an unbounded refill burst.
    pub fn cleanup_expired_items<R: Rng>(&mut self, now: u64, rng: &mut R) -> CleanupReport {
        let expired = self.items.sweep_expired(now).len();

        let deficit = self.config.item.min_count.saturating_sub(self.items.len());
        let to_spawn = deficit.min(expired);

        let mut spawned = 0;
        for _ in 0..to_spawn {
            if self
                .items
                .spawn(&self.collision, &self.config.spawn, now, rng)
                .is_none()
            {
                break;
            }
            spawned += 1;
        }

        CleanupReport {
            expired,
            spawned,
            total: self.items.len(),
        }
    }

    /// Insert a pre-built item at a pinned position (tests only).
    #[cfg(test)]
    pub(crate) fn insert_item_for_test(&mut self, item: Item) {
        self.items.insert_for_test(item);
    }

    /// Pin a player's position (tests only).
    #[cfg(test)]
    pub(crate) fn set_player_position_for_test(&mut self, id: u32, position: Vec2) {
        if let Some(player) = self.players.get_mut(&id) {
            player.position = position;
        }
    }

    /// Full world state for a newly joined client.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            players: self.players.values().map(Player::to_state).collect(),
            items: self.items.snapshot(),
            walls: self
                .collision
                .walls()
                .iter()
                .map(|wall| WallState {
                    x: wall.x,
                    y: wall.y,
                    width: wall.width,
                    height: wall.height,
                })
                .collect(),
            scores: self.ledger.snapshot(),
        }
    }
}

/// Candidate offset for one movement command.
fn step(direction: Direction, speed: f32) -> Vec2 {
    match direction {
        Direction::Left => Vec2::new(-speed, 0.0),
        Direction::Right => Vec2::new(speed, 0.0),
        Direction::Up => Vec2::new(0.0, -speed),
        Direction::Down => Vec2::new(0.0, speed),
    }
}

/// Generate a bright random color.
pub fn random_color<R: Rng>(rng: &mut R) -> Color {
    Color::new(
        rng.random_range(50..=255),
        rng.random_range(50..=255),
        rng.random_range(50..=255),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(99)
    }

    /// World with only border walls, so the interior is wide open.
    fn open_world() -> World {
        let config = Config::default();
        let t = config.map.wall_thickness;
        let (w, h) = (config.map.width, config.map.height);
        World::with_walls(
            &config,
            vec![
                Rect::new(0.0, 0.0, w, t),
                Rect::new(0.0, h - t, w, t),
                Rect::new(0.0, 0.0, t, h),
                Rect::new(w - t, 0.0, t, h),
            ],
        )
    }

    fn place_player(world: &mut World, id: u32, name: &str, pos: Vec2) {
        let mut r = rng();
        world.add_player(id, name, None, 0, &mut r).unwrap();
        world.players.get_mut(&id).unwrap().position = pos;
    }

    fn place_item(world: &mut World, id: ItemId, kind: ItemKind, pos: Vec2, now: u64) {
        let lifespan = world.config.item.lifespan_ms;
        let item = Item::new(id, kind, pos, now, lifespan);
        // Bypass the spawn search to pin the position.
        world.items.insert_for_test(item);
    }

    #[test]
    fn accepted_move_shifts_by_one_step() {
        let mut world = open_world();
        place_player(&mut world, 1, "alice", Vec2::new(100.0, 100.0));

        let result = world.move_player(1, Direction::Right, 1).unwrap();
        assert!(result.moved);
        assert_eq!((result.x, result.y), (105.0, 100.0));

        let result = world.move_player(1, Direction::Up, 2).unwrap();
        assert!(result.moved);
        assert_eq!((result.x, result.y), (105.0, 95.0));
    }

    #[test]
    fn move_into_wall_is_rejected() {
        let config = Config::default();
        let mut world = World::with_walls(&config, vec![Rect::new(130.0, 0.0, 10.0, 400.0)]);
        place_player(&mut world, 1, "alice", Vec2::new(100.0, 100.0));

        // The player's right edge (x=130) exactly abuts the wall:
        // touching is not collision, but any step right would overlap.
        let result = world.move_player(1, Direction::Right, 1).unwrap();
        assert!(!result.moved);
        assert_eq!((result.x, result.y), (100.0, 100.0));

        // Moving away is still fine.
        let result = world.move_player(1, Direction::Left, 2).unwrap();
        assert!(result.moved);
    }

    #[test]
    fn move_out_of_bounds_is_rejected() {
        let mut world = World::with_walls(&Config::default(), Vec::new());
        place_player(&mut world, 1, "alice", Vec2::new(2.0, 100.0));

        let result = world.move_player(1, Direction::Left, 1).unwrap();
        assert!(!result.moved);
        assert_eq!(world.player(1).unwrap().position, Vec2::new(2.0, 100.0));
    }

    #[test]
    fn move_into_another_player_is_rejected() {
        let mut world = open_world();
        place_player(&mut world, 1, "alice", Vec2::new(100.0, 100.0));
        place_player(&mut world, 2, "bob", Vec2::new(132.0, 100.0));

        let result = world.move_player(1, Direction::Right, 1).unwrap();
        assert!(!result.moved);
        assert_eq!(world.player(1).unwrap().position, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn unknown_player_move_is_none() {
        let mut world = open_world();
        assert!(world.move_player(42, Direction::Down, 0).is_none());
    }

    #[test]
    fn pickup_grants_points_and_removes_item() {
        let mut world = open_world();
        place_player(&mut world, 1, "alice", Vec2::new(100.0, 100.0));
        place_item(&mut world, 7, ItemKind::Coin, Vec2::new(110.0, 100.0), 0);

        let result = world.move_player(1, Direction::Right, 1).unwrap();
        assert!(result.moved);
        let pickup = result.pickup.unwrap();
        assert_eq!(pickup.item_id, 7);
        assert_eq!(pickup.points, 10);
        assert_eq!(pickup.total_score, 10);
        assert_eq!(pickup.achievements, vec![AchievementKind::FirstPickup]);
        assert_eq!(world.item_count(), 0);
        assert_eq!(world.player(1).unwrap().score, 10);
    }

    #[test]
    fn at_most_one_item_per_move() {
        let mut world = open_world();
        place_player(&mut world, 1, "alice", Vec2::new(100.0, 100.0));
        place_item(&mut world, 1, ItemKind::Coin, Vec2::new(108.0, 100.0), 0);
        place_item(&mut world, 2, ItemKind::Gem, Vec2::new(112.0, 100.0), 0);

        let result = world.move_player(1, Direction::Right, 1).unwrap();
        let pickup = result.pickup.unwrap();
        // First overlap in insertion order wins.
        assert_eq!(pickup.item_id, 1);
        assert_eq!(world.item_count(), 1);
    }

    #[test]
    fn expired_item_is_not_collectible_before_sweep() {
        let mut world = open_world();
        place_player(&mut world, 1, "alice", Vec2::new(100.0, 100.0));
        place_item(&mut world, 1, ItemKind::Coin, Vec2::new(110.0, 100.0), 0);

        // Lifespan is 30s; move at t=31s without any sweep having run.
        let result = world.move_player(1, Direction::Right, 31_000).unwrap();
        assert!(result.moved);
        assert!(result.pickup.is_none());
        assert_eq!(world.player(1).unwrap().score, 0);
    }

    #[test]
    fn score_is_monotonic_over_a_session() {
        let mut world = open_world();
        place_player(&mut world, 1, "alice", Vec2::new(100.0, 100.0));
        place_item(&mut world, 1, ItemKind::Gem, Vec2::new(130.0, 100.0), 0);

        let mut last_score = 0;
        for tick in 0..20 {
            let direction = if tick % 2 == 0 {
                Direction::Right
            } else {
                Direction::Down
            };
            let result = world.move_player(1, direction, tick).unwrap();
            assert!(result.score >= last_score);
            last_score = result.score;
        }
    }

    #[test]
    fn two_player_coin_scenario_fires_leadership() {
        let mut world = open_world();
        place_player(&mut world, 1, "a", Vec2::new(100.0, 100.0));
        place_player(&mut world, 2, "b", Vec2::new(300.0, 300.0));
        place_item(&mut world, 1, ItemKind::Coin, Vec2::new(110.0, 100.0), 0);

        let result = world.move_player(1, Direction::Right, 1).unwrap();
        let pickup = result.pickup.unwrap();
        assert_eq!(pickup.points, 10);
        assert_eq!(world.player(1).unwrap().score, 10);
        assert_eq!(world.item_count(), 0);

        // Two players registered and A is strictly ahead: the
        // leadership payload names A.
        assert!(world.ledger().should_announce_leadership());
        assert_eq!(world.ledger().leader().unwrap().id, 1);
    }

    #[test]
    fn solo_player_never_announces_leadership() {
        let mut world = open_world();
        place_player(&mut world, 1, "a", Vec2::new(100.0, 100.0));
        place_item(&mut world, 1, ItemKind::Diamond, Vec2::new(110.0, 100.0), 0);

        world.move_player(1, Direction::Right, 1).unwrap();
        assert!(!world.ledger().should_announce_leadership());
    }

    #[test]
    fn cleanup_refill_is_bounded_by_expirations() {
        let mut world = open_world();
        // Three items that will expire, well below the minimum of 5.
        for id in 1..=3 {
            place_item(&mut world, id, ItemKind::Coin, Vec2::new(50.0 * id as f32, 50.0), 0);
        }

        let mut r = rng();
        let report = world.cleanup_expired_items(31_000, &mut r);
        assert_eq!(report.expired, 3);
        // Deficit is 5, but only 3 expired: refill stops at 3.
        assert_eq!(report.spawned, 3);
        assert_eq!(report.total, 3);
    }

    #[test]
    fn cleanup_with_nothing_expired_spawns_nothing() {
        let mut world = open_world();
        place_item(&mut world, 1, ItemKind::Coin, Vec2::new(50.0, 50.0), 30_000);

        let mut r = rng();
        let report = world.cleanup_expired_items(31_000, &mut r);
        assert_eq!(report.expired, 0);
        assert_eq!(report.spawned, 0);
        assert_eq!(report.total, 1);
    }

    #[test]
    fn join_sanitizes_name_and_falls_back_on_bad_color() {
        let mut world = open_world();
        let mut r = rng();
        let player = world
            .add_player(5, "  <script>Eve</script>  ", Some("not-a-color"), 0, &mut r)
            .unwrap();
        assert_eq!(player.name, "scriptEve/scrip");
        // Bad color fell back to a generated one; just confirm it
        // serializes as a well-formed hex string.
        assert!(Color::from_hex(&player.color.to_hex()).is_some());
    }

    #[test]
    fn join_rejected_at_player_cap() {
        let mut config = Config::default();
        config.server.max_players = 2;
        let mut world = World::with_walls(&config, Vec::new());
        let mut r = rng();

        assert!(world.add_player(1, "a", None, 0, &mut r).is_some());
        assert!(world.add_player(2, "b", None, 0, &mut r).is_some());
        assert!(world.add_player(3, "c", None, 0, &mut r).is_none());
        assert_eq!(world.player_count(), 2);
    }

    #[test]
    fn duplicate_join_is_idempotent() {
        let mut world = open_world();
        let mut r = rng();
        world.add_player(1, "alice", None, 0, &mut r).unwrap();
        let again = world.add_player(1, "other", None, 5, &mut r).unwrap();
        assert_eq!(again.name, "alice");
        assert_eq!(world.player_count(), 1);
    }

    #[test]
    fn remove_player_clears_ledger_and_returns_name() {
        let mut world = open_world();
        place_player(&mut world, 1, "alice", Vec2::new(100.0, 100.0));

        assert_eq!(world.remove_player(1).as_deref(), Some("alice"));
        assert!(world.remove_player(1).is_none());
        assert_eq!(world.ledger().len(), 0);
    }

    #[test]
    fn snapshot_covers_every_collection() {
        let mut world = World::new(&Config::default());
        let mut r = rng();
        world.add_player(1, "alice", None, 0, &mut r).unwrap();
        world.populate_initial_items(0, &mut r);

        let snapshot = world.snapshot();
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.items.len(), 5);
        assert!(!snapshot.walls.is_empty());
        assert_eq!(snapshot.scores.len(), 1);
    }
}
