//! Shared game state, command dispatch, and the maintenance loop.

use crate::config::Config;
use crate::world::World;
use protocol::messages::AchievementNotice;
use protocol::{ClientMessage, ServerMessage};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::client::Client;
use super::{Broadcast, BroadcastTarget};

/// Current time as epoch milliseconds.
pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Main game state: the world plus the connected sessions.
///
/// Wrapped in one `RwLock` by the server; every mutating entry point
/// (client command, maintenance tick) runs under the write lock, so
/// all world mutations are serialized.
pub struct GameState {
    pub config: Config,
    pub world: World,
    pub clients: HashMap<u32, Client>,
    pub start_time: std::time::Instant,

    next_client_id: u32,

    // Single fan-out channel; one channel (not one per topic) keeps
    // cross-topic ordering intact for every subscriber.
    broadcast_tx: broadcast::Sender<Broadcast>,
}

impl GameState {
    pub fn new(config: Config, broadcast_tx: broadcast::Sender<Broadcast>) -> Self {
        let world = World::new(&config);
        Self {
            config,
            world,
            clients: HashMap::new(),
            start_time: std::time::Instant::now(),
            next_client_id: 1,
            broadcast_tx,
        }
    }

    /// Add a new client session.
    pub fn add_client(&mut self, addr: SocketAddr) -> u32 {
        let id = self.next_client_id;
        self.next_client_id += 1;
        self.clients.insert(id, Client::new(id, addr));
        info!("Client {} connected from {}", id, addr);
        id
    }

    /// Remove a client session and, if joined, their player.
    pub fn remove_client(&mut self, id: u32) {
        let Some(client) = self.clients.remove(&id) else {
            return;
        };
        info!("Client {} ({}) disconnected", id, client.addr);

        if let Some(name) = self.world.remove_player(id) {
            let scores = self.world.ledger().snapshot();
            self.send(BroadcastTarget::All, ServerMessage::PlayerLeft { id, name, scores });
        }
    }

    /// Handle one decoded command from a client.
    ///
    /// Called per-command under the write lock; an `Err` here is logged
    /// at the connection task and never tears anything down.
    pub fn handle_message(&mut self, client_id: u32, message: ClientMessage) -> anyhow::Result<()> {
        let client = self
            .clients
            .get_mut(&client_id)
            .ok_or_else(|| anyhow::anyhow!("client {client_id} not found"))?;
        client.touch();

        match message {
            ClientMessage::Join { name, color } => self.handle_join(client_id, &name, color.as_deref()),
            ClientMessage::Move { direction } => self.handle_move(client_id, direction),
            ClientMessage::Chat { message } => self.handle_chat(client_id, &message),
            ClientMessage::Stats => self.handle_stats(client_id),
            ClientMessage::Ping => {
                self.send(BroadcastTarget::Client(client_id), ServerMessage::Pong);
                Ok(())
            }
        }
    }

    fn handle_join(&mut self, client_id: u32, name: &str, color: Option<&str>) -> anyhow::Result<()> {
        if self.clients.get(&client_id).is_some_and(|c| c.joined) {
            debug!("Client {} sent a duplicate join", client_id);
            return Ok(());
        }

        let now = epoch_ms();
        let mut rng = rand::rng();
        let Some(player) = self.world.add_player(client_id, name, color, now, &mut rng) else {
            self.send(
                BroadcastTarget::Client(client_id),
                ServerMessage::Error {
                    message: "could not join the game".to_string(),
                },
            );
            return Ok(());
        };
        let player_state = player.to_state();

        if let Some(client) = self.clients.get_mut(&client_id) {
            client.joined = true;
            client.name = player_state.name.clone();
        }

        self.send(
            BroadcastTarget::Client(client_id),
            ServerMessage::Welcome {
                player_id: client_id,
                state: self.world.snapshot(),
            },
        );
        self.send(
            BroadcastTarget::Others(client_id),
            ServerMessage::PlayerJoined { player: player_state },
        );
        Ok(())
    }

    fn handle_move(&mut self, client_id: u32, direction: protocol::Direction) -> anyhow::Result<()> {
        if !self.clients.get(&client_id).is_some_and(|c| c.joined) {
            return Ok(());
        }

        let now = epoch_ms();
        let Some(result) = self.world.move_player(client_id, direction, now) else {
            return Ok(());
        };
        if !result.moved {
            return Ok(());
        }

        self.send(
            BroadcastTarget::All,
            ServerMessage::PlayerMoved {
                id: client_id,
                x: result.x,
                y: result.y,
                score: result.score,
            },
        );

        let Some(pickup) = result.pickup else {
            return Ok(());
        };

        let player_name = self
            .clients
            .get(&client_id)
            .map(|c| c.name.clone())
            .unwrap_or_default();

        let ledger = self.world.ledger();
        let announce = ledger.should_announce_leadership();
        let new_leader = if announce { ledger.leader() } else { None };
        let is_new_leader = new_leader.as_ref().is_some_and(|leader| leader.id == client_id);

        self.send(
            BroadcastTarget::All,
            ServerMessage::ItemCollected {
                item_id: pickup.item_id,
                player_id: client_id,
                player_name,
                kind: pickup.kind,
                points: pickup.points,
                new_score: pickup.total_score,
                scores: self.world.ledger().snapshot(),
                new_leader,
                is_new_leader,
            },
        );

        if !pickup.achievements.is_empty() {
            let achievements = pickup
                .achievements
                .iter()
                .map(|&kind| AchievementNotice {
                    kind,
                    message: kind.message().to_string(),
                })
                .collect();
            self.send(
                BroadcastTarget::Client(client_id),
                ServerMessage::Achievements { achievements },
            );
        }

        // Replace the collected item right away when below the minimum.
        if self.world.needs_items() {
            let mut rng = rand::rng();
            if let Some(item) = self.world.spawn_item(now, &mut rng) {
                self.send(BroadcastTarget::All, ServerMessage::ItemSpawned { item });
            }
        }
        Ok(())
    }

    fn handle_chat(&mut self, client_id: u32, raw: &str) -> anyhow::Result<()> {
        let Some(client) = self.clients.get(&client_id) else {
            return Ok(());
        };
        if !client.joined {
            return Ok(());
        }

        let message = sanitize_chat(raw);
        if message.is_empty() {
            return Ok(());
        }

        self.send(
            BroadcastTarget::All,
            ServerMessage::Chat {
                player_id: client_id,
                player_name: client.name.clone(),
                message,
                timestamp: epoch_ms(),
            },
        );
        Ok(())
    }

    fn handle_stats(&mut self, client_id: u32) -> anyhow::Result<()> {
        self.send(
            BroadcastTarget::Client(client_id),
            ServerMessage::Stats {
                players_online: self.world.player_count(),
                items_available: self.world.item_count(),
                top_players: self.world.ledger().top_entries(10),
                uptime_secs: self.start_time.elapsed().as_secs(),
            },
        );
        Ok(())
    }

    /// Run one expiry sweep plus bounded refill, pushing the refreshed
    /// item set to all clients when anything was spawned.
    pub fn sweep_and_refill(&mut self) {
        let now = epoch_ms();
        let mut rng = rand::rng();
        let report = self.world.cleanup_expired_items(now, &mut rng);

        if report.expired > 0 {
            info!(
                "Sweep: {} expired, {} spawned, {} live",
                report.expired, report.spawned, report.total
            );
        }
        if report.spawned > 0 {
            self.send(
                BroadcastTarget::All,
                ServerMessage::WorldRefresh {
                    items: self.world.snapshot().items,
                },
            );
        }
    }

    /// Top the item set up by one when below the minimum.
    pub fn spawn_if_below_minimum(&mut self) {
        if !self.world.needs_items() {
            return;
        }
        let mut rng = rand::rng();
        if let Some(item) = self.world.spawn_item(epoch_ms(), &mut rng) {
            self.send(BroadcastTarget::All, ServerMessage::ItemSpawned { item });
        }
    }

    fn send(&self, target: BroadcastTarget, message: ServerMessage) {
        // Send errors just mean no subscriber is listening yet.
        let _ = self.broadcast_tx.send(Broadcast { target, message });
    }
}

/// Strip markup characters and cap chat length.
fn sanitize_chat(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '<' && *c != '>')
        .take(100)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Run the background maintenance loop: periodic expiry sweeps,
/// spawn-if-below-minimum checks, and a status log line. Each tick
/// takes the same write lock as the command path, so maintenance never
/// observes a half-applied mutation.
pub async fn run_maintenance_loop(state: Arc<RwLock<GameState>>) {
    let (sweep_ms, spawn_ms, status_ms) = {
        let game = state.read().await;
        (
            game.config.server.sweep_interval_ms,
            game.config.server.spawn_interval_ms,
            game.config.server.status_interval_ms,
        )
    };

    let mut sweep_tick = tokio::time::interval(Duration::from_millis(sweep_ms));
    let mut spawn_tick = tokio::time::interval(Duration::from_millis(spawn_ms));
    let mut status_tick = tokio::time::interval(Duration::from_millis(status_ms));
    sweep_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    spawn_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    status_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = sweep_tick.tick() => {
                let mut game = state.write().await;
                game.sweep_and_refill();
            }
            _ = spawn_tick.tick() => {
                let mut game = state.write().await;
                game.spawn_if_below_minimum();
            }
            _ = status_tick.tick() => {
                let game = state.read().await;
                info!(
                    "Status: {} players, {} items",
                    game.world.player_count(),
                    game.world.item_count()
                );
            }
        }
    }
}
