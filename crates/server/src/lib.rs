//! Gridloot game server library.

pub mod collision;
pub mod config;
pub mod entity;
pub mod items;
pub mod score;
pub mod server;
pub mod world;

// Re-export commonly used types
pub use config::Config;
pub use server::{Broadcast, BroadcastTarget, run};
pub use world::World;
