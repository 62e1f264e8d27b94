//! Connection tracking for the broadcast path
//!
//! This module manages the server-side registry of live connections:
//! - Mapping each player id to its connection's outbound queue
//! - Producing the recipient snapshot every broadcast fans out over
//! - Idempotent teardown when a connection closes
//!
//! The registry is the sole authority on who receives snapshots. It owns
//! the queue handles only; game-state fields belong to the world.

use log::info;
use shared::PlayerId;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// How many snapshots a connection may fall behind before newer ones are
/// dropped for it. Each snapshot fully replaces the last, so dropping a
/// frame on a lagging connection loses nothing once it catches up.
pub const OUTBOUND_QUEUE: usize = 32;

/// Tracks every live connection's outbound queue, keyed by player id.
///
/// A connection is "active" exactly while its sender is present here.
/// Registration happens once per connection after the handshake, and
/// deregistration once when the connection closes; a second deregistration
/// is a no-op rather than an error, so the close path never has to care
/// whether cleanup already ran.
pub struct ConnectionRegistry {
    connections: HashMap<PlayerId, mpsc::Sender<Message>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    /// Adds a connection's outbound queue to the active set.
    ///
    /// The player id was allocated by the world when the player record was
    /// created; ids are never reused, so an insert can never displace a
    /// different live connection.
    pub fn register(&mut self, id: PlayerId, sender: mpsc::Sender<Message>) {
        self.connections.insert(id, sender);
        info!("Connection registered for player {}", id);
    }

    /// Removes a connection from the active set.
    ///
    /// Returns true if the connection was present and removed, false if it
    /// was already gone. Dropping the sender here is what ends the
    /// connection's writer task once it has drained any queued frames.
    pub fn deregister(&mut self, id: PlayerId) -> bool {
        if self.connections.remove(&id).is_some() {
            info!("Connection deregistered for player {}", id);
            true
        } else {
            false
        }
    }

    /// Point-in-time snapshot of the active connections for one broadcast.
    ///
    /// Reflects every registration and deregistration that happened before
    /// the call; a connection deregistered earlier is never handed to the
    /// broadcast engine again.
    pub fn senders(&self) -> Vec<(PlayerId, mpsc::Sender<Message>)> {
        self.connections
            .iter()
            .map(|(id, sender)| (*id, sender.clone()))
            .collect()
    }

    /// Returns the number of currently registered connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns true if no connections are currently registered.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
