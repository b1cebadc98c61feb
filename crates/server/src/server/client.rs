//! Client session state.

use std::net::SocketAddr;
use std::time::Instant;

/// A connected client session.
///
/// A session starts unjoined; it becomes an active player once a join
/// command passes validation, and only active players can move.
#[derive(Debug)]
pub struct Client {
    /// Unique client ID, also the player's connection handle.
    pub id: u32,
    /// Remote address.
    pub addr: SocketAddr,
    /// Whether a join command has been accepted.
    pub joined: bool,
    /// Display name, set on join.
    pub name: String,
    /// Last activity timestamp.
    pub last_activity: Instant,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            joined: false,
            name: String::new(),
            last_activity: Instant::now(),
        }
    }

    /// Update activity timestamp.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }
}
