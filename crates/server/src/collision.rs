//! Collision detection.
//!
//! Pure rectangle tests against the static wall layout and the map
//! bounds. Overlap uses half-open semantics: rectangles that merely
//! touch along an edge do not collide.

use crate::config::SpawnConfig;
use glam::Vec2;
use rand::Rng;

/// An axis-aligned rectangle (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Square rect at `pos` with side `size`.
    pub fn square(pos: Vec2, size: f32) -> Self {
        Self::new(pos.x, pos.y, size, size)
    }

    /// Half-open overlap test: true iff the overlap area is positive.
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

/// The static collision oracle: wall layout plus map bounds.
///
/// Stateless apart from the wall list; never mutates and never fails.
#[derive(Debug, Clone)]
pub struct CollisionMap {
    walls: Vec<Rect>,
    map_width: f32,
    map_height: f32,
}

impl CollisionMap {
    pub fn new(walls: Vec<Rect>, map_width: f32, map_height: f32) -> Self {
        Self {
            walls,
            map_width,
            map_height,
        }
    }

    pub fn walls(&self) -> &[Rect] {
        &self.walls
    }

    /// Does the rect intersect any wall?
    pub fn hits_wall(&self, rect: &Rect) -> bool {
        self.walls.iter().any(|wall| rect.overlaps(wall))
    }

    /// Is the rect entirely inside the map?
    pub fn in_bounds(&self, rect: &Rect) -> bool {
        rect.x >= 0.0
            && rect.y >= 0.0
            && rect.x + rect.width <= self.map_width
            && rect.y + rect.height <= self.map_height
    }

    /// A position is valid iff in-bounds and clear of every wall.
    pub fn is_valid_position(&self, pos: Vec2, size: f32) -> bool {
        let rect = Rect::square(pos, size);
        self.in_bounds(&rect) && !self.hits_wall(&rect)
    }

    /// Find a valid position for a square of side `size`.
    ///
    /// Samples random in-margin positions up to `spawn.max_attempts`
    /// times, then walks the fixed fallback list, then gives up.
    pub fn find_spawn_position<R: Rng>(
        &self,
        size: f32,
        spawn: &SpawnConfig,
        rng: &mut R,
    ) -> Option<Vec2> {
        let max_x = self.map_width - size - spawn.margin * 2.0;
        let max_y = self.map_height - size - spawn.margin * 2.0;

        if max_x > 0.0 && max_y > 0.0 {
            for _ in 0..spawn.max_attempts {
                let pos = Vec2::new(
                    rng.random_range(0.0..max_x) + spawn.margin,
                    rng.random_range(0.0..max_y) + spawn.margin,
                );
                if self.is_valid_position(pos, size) {
                    return Some(pos);
                }
            }
        }

        spawn
            .safe_positions
            .iter()
            .map(|&[x, y]| Vec2::new(x, y))
            .find(|&pos| self.is_valid_position(pos, size))
    }
}
