//! Server configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub item: ItemConfig,
    #[serde(default)]
    pub spawn: SpawnConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("config.toml");
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("No config.toml found, creating default config");
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            map: MapConfig::default(),
            player: PlayerConfig::default(),
            item: ItemConfig::default(),
            spawn: SpawnConfig::default(),
        }
    }
}

/// Server networking and scheduling settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Server name shown to clients.
    #[serde(default = "default_name")]
    pub name: String,
    /// Maximum connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Connections per IP limit.
    #[serde(default = "default_ip_limit")]
    pub ip_limit: usize,
    /// Maximum simultaneously joined players.
    #[serde(default = "default_max_players")]
    pub max_players: usize,
    /// Interval between expiry sweeps, in milliseconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_ms: u64,
    /// Interval between spawn-if-below-minimum checks, in milliseconds.
    #[serde(default = "default_spawn_interval")]
    pub spawn_interval_ms: u64,
    /// Interval between status log lines, in milliseconds.
    #[serde(default = "default_status_interval")]
    pub status_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            name: default_name(),
            max_connections: default_max_connections(),
            ip_limit: default_ip_limit(),
            max_players: default_max_players(),
            sweep_interval_ms: default_sweep_interval(),
            spawn_interval_ms: default_spawn_interval(),
            status_interval_ms: default_status_interval(),
        }
    }
}

fn default_port() -> u16 {
    3000
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_name() -> String {
    "Gridloot".to_string()
}
fn default_max_connections() -> usize {
    100
}
fn default_ip_limit() -> usize {
    8
}
fn default_max_players() -> usize {
    10
}
fn default_sweep_interval() -> u64 {
    10_000
}
fn default_spawn_interval() -> u64 {
    2_000
}
fn default_status_interval() -> u64 {
    60_000
}

/// Map dimensions and wall thickness.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MapConfig {
    #[serde(default = "default_map_width")]
    pub width: f32,
    #[serde(default = "default_map_height")]
    pub height: f32,
    #[serde(default = "default_wall_thickness")]
    pub wall_thickness: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: default_map_width(),
            height: default_map_height(),
            wall_thickness: default_wall_thickness(),
        }
    }
}

fn default_map_width() -> f32 {
    600.0
}
fn default_map_height() -> f32 {
    400.0
}
fn default_wall_thickness() -> f32 {
    10.0
}

/// Player configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    /// Side length of a player's square, in pixels.
    #[serde(default = "default_player_size")]
    pub size: f32,
    /// Distance covered by one accepted move.
    #[serde(default = "default_player_speed")]
    pub speed: f32,
    /// Maximum display name length after trimming.
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            size: default_player_size(),
            speed: default_player_speed(),
            max_name_length: default_max_name_length(),
        }
    }
}

fn default_player_size() -> f32 {
    30.0
}
fn default_player_speed() -> f32 {
    5.0
}
fn default_max_name_length() -> usize {
    15
}

/// Item configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ItemConfig {
    /// Side length of an item's square, in pixels.
    #[serde(default = "default_item_size")]
    pub size: f32,
    /// Time from spawn to expiry, in milliseconds.
    #[serde(default = "default_item_lifespan")]
    pub lifespan_ms: u64,
    /// The maintenance loop keeps at least this many items live.
    #[serde(default = "default_item_min_count")]
    pub min_count: usize,
    /// Hard cap on live items.
    #[serde(default = "default_item_max_count")]
    pub max_count: usize,
}

impl Default for ItemConfig {
    fn default() -> Self {
        Self {
            size: default_item_size(),
            lifespan_ms: default_item_lifespan(),
            min_count: default_item_min_count(),
            max_count: default_item_max_count(),
        }
    }
}

fn default_item_size() -> f32 {
    15.0
}
fn default_item_lifespan() -> u64 {
    30_000
}
fn default_item_min_count() -> usize {
    5
}
fn default_item_max_count() -> usize {
    12
}

/// Random position search parameters, shared by player and item spawns.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpawnConfig {
    /// Maximum random placement attempts before using the fallback list.
    #[serde(default = "default_spawn_attempts")]
    pub max_attempts: u32,
    /// Margin kept from the map edge during random placement.
    #[serde(default = "default_spawn_margin")]
    pub margin: f32,
    /// Known-safe fixed positions tried when random placement fails.
    #[serde(default = "default_safe_positions")]
    pub safe_positions: Vec<[f32; 2]>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_spawn_attempts(),
            margin: default_spawn_margin(),
            safe_positions: default_safe_positions(),
        }
    }
}

fn default_spawn_attempts() -> u32 {
    100
}
fn default_spawn_margin() -> f32 {
    20.0
}
fn default_safe_positions() -> Vec<[f32; 2]> {
    // Corner pockets and central gaps of the standard 600x400 layout,
    // all clear of the interior walls for a 30px player.
    vec![
        [15.0, 15.0],
        [555.0, 15.0],
        [15.0, 355.0],
        [555.0, 355.0],
        [285.0, 95.0],
        [285.0, 245.0],
    ]
}
