//! WebSocket transport.
//!
//! One task per connection, all game mutation behind a single shared
//! `RwLock<GameState>`. Outbound traffic rides one broadcast channel of
//! targeted messages; each connection task filters for itself, so every
//! client observes events in the order the game produced them.

use crate::config::Config;
use futures_util::{SinkExt, StreamExt};
use protocol::{ClientMessage, ServerMessage};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, broadcast};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};

pub mod client;
pub mod game;

pub use game::{GameState, epoch_ms, run_maintenance_loop};

/// An outbound game event with its delivery target.
#[derive(Debug, Clone)]
pub struct Broadcast {
    pub target: BroadcastTarget,
    pub message: ServerMessage,
}

/// Who a broadcast is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastTarget {
    /// Every connected client.
    All,
    /// One specific client.
    Client(u32),
    /// Everyone except one client.
    Others(u32),
}

impl BroadcastTarget {
    fn includes(&self, client_id: u32) -> bool {
        match *self {
            BroadcastTarget::All => true,
            BroadcastTarget::Client(id) => id == client_id,
            BroadcastTarget::Others(id) => id != client_id,
        }
    }
}

/// Connection tracking state (shared across connection handlers).
struct ConnectionState {
    /// Number of connections per IP address.
    ip_connections: HashMap<IpAddr, usize>,
    /// Total number of connections.
    total_connections: usize,
}

impl ConnectionState {
    fn new() -> Self {
        Self {
            ip_connections: HashMap::new(),
            total_connections: 0,
        }
    }

    /// Try to add a connection, returns true if allowed.
    fn try_add_connection(&mut self, ip: IpAddr, max_total: usize, max_per_ip: usize) -> bool {
        if self.total_connections >= max_total {
            return false;
        }

        let current = self.ip_connections.get(&ip).copied().unwrap_or(0);
        if current >= max_per_ip {
            return false;
        }

        *self.ip_connections.entry(ip).or_insert(0) += 1;
        self.total_connections += 1;
        true
    }

    /// Remove a connection.
    fn remove_connection(&mut self, ip: IpAddr) {
        if let Some(count) = self.ip_connections.get_mut(&ip) {
            if *count > 0 {
                *count -= 1;
                self.total_connections = self.total_connections.saturating_sub(1);
            }
            if *count == 0 {
                self.ip_connections.remove(&ip);
            }
        }
    }
}

/// Run the game server.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("{} listening on ws://{}", config.server.name, addr);

    let conn_state = Arc::new(RwLock::new(ConnectionState::new()));

    let (broadcast_tx, _broadcast_rx) = broadcast::channel::<Broadcast>(256);

    let game_state = Arc::new(RwLock::new(GameState::new(config.clone(), broadcast_tx.clone())));

    // Seed the map before anyone connects.
    {
        let mut state = game_state.write().await;
        let mut rng = rand::rng();
        let spawned = state.world.populate_initial_items(epoch_ms(), &mut rng);
        info!("Placed {} initial items", spawned);
    }

    // Start the maintenance loop (expiry sweeps, refills, status).
    let maintenance_state = Arc::clone(&game_state);
    tokio::spawn(async move {
        run_maintenance_loop(maintenance_state).await;
    });

    let max_connections = config.server.max_connections;
    let ip_limit = config.server.ip_limit;

    loop {
        let (stream, addr) = listener.accept().await?;
        let ip = addr.ip();

        {
            let mut state = conn_state.write().await;
            if !state.try_add_connection(ip, max_connections, ip_limit) {
                warn!("Connection rejected (limit reached): {}", addr);
                continue;
            }
        }

        let game_state = Arc::clone(&game_state);
        let conn_state = Arc::clone(&conn_state);
        let broadcast_rx = broadcast_tx.subscribe();

        tokio::spawn(async move {
            let result = handle_connection(stream, addr, game_state, broadcast_rx).await;

            {
                let mut state = conn_state.write().await;
                state.remove_connection(addr.ip());
            }

            if let Err(e) = result {
                error!("Connection error from {}: {}", addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
///
/// Inbound text frames are decoded and dispatched under the write lock;
/// a bad command is logged and the connection keeps going. Outbound
/// broadcasts are filtered by target and serialized to JSON here.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    game_state: Arc<RwLock<GameState>>,
    mut broadcast_rx: broadcast::Receiver<Broadcast>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;

    let (mut write, mut read) = ws_stream.split();

    let client_id = {
        let mut state = game_state.write().await;
        state.add_client(addr)
    };

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match ClientMessage::parse(&text) {
                            Ok(command) => {
                                let mut state = game_state.write().await;
                                if let Err(e) = state.handle_message(client_id, command) {
                                    warn!("Command error from {}: {}", addr, e);
                                }
                            }
                            Err(e) => {
                                warn!("Bad message from {}: {}", addr, e);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if write.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    None => {
                        break;
                    }
                    _ => {}
                }
            }
            event = broadcast_rx.recv() => {
                match event {
                    Ok(event) => {
                        if !event.target.includes(client_id) {
                            continue;
                        }
                        let json = event.message.to_json()?;
                        if let Err(e) = write.send(Message::Text(json.into())).await {
                            warn!("Failed to send to {}: {}", addr, e);
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // The client fell behind the event stream; it is
                        // now missing deltas, so cut it loose rather than
                        // feed it an inconsistent world.
                        warn!("Client {} lagged by {} events, dropping", addr, skipped);
                        break;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        }
    }

    {
        let mut state = game_state.write().await;
        state.remove_client(client_id);
    }

    Ok(())
}
