//! Game entities.

mod item;
mod player;
mod walls;

pub use item::{Item, ItemId, random_kind};
pub use player::{Player, sanitize_name};
pub use walls::standard_layout;
