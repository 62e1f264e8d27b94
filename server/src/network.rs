//! Server network layer: the WebSocket listener and the per-connection
//! lifecycle (accept, register, receive intents, clean up on close).

use crate::broadcast::broadcast_world;
use crate::game::WorldState;
use crate::registry::{ConnectionRegistry, OUTBOUND_QUEUE};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::{ClientMessage, PlayerId};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

/// Accepts persistent client connections and spawns one handler task per
/// connection, all sharing the same world and registry.
pub struct Server {
    listener: TcpListener,
    world: Arc<RwLock<WorldState>>,
    registry: Arc<RwLock<ConnectionRegistry>>,
}

impl Server {
    /// Binds the listening endpoint. Failure here is fatal at startup:
    /// without its endpoint the server cannot do anything, so the error
    /// propagates instead of being retried.
    pub async fn bind(
        addr: &str,
        world: Arc<RwLock<WorldState>>,
        registry: Arc<RwLock<ConnectionRegistry>>,
    ) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            world,
            registry,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop. A failed accept is logged and does not stop the
    /// listener; each accepted connection runs in its own task.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let world = Arc::clone(&self.world);
                    let registry = Arc::clone(&self.registry);
                    tokio::spawn(handle_connection(stream, addr, world, registry));
                }
                Err(e) => warn!("Failed to accept connection: {}", e),
            }
        }
    }
}

/// One connection's full lifecycle: handshake, registration, the receive
/// loop, and teardown.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    world: Arc<RwLock<WorldState>>,
    registry: Arc<RwLock<ConnectionRegistry>>,
) {
    let socket = match accept_async(stream).await {
        Ok(socket) => socket,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };
    let (sink, mut messages) = socket.split();

    // Register before reading anything: the player record and the outbound
    // queue exist for the whole Active phase.
    let (sender, outbound) = mpsc::channel::<Message>(OUTBOUND_QUEUE);
    let player_id = { world.write().await.add_player() };
    { registry.write().await.register(player_id, sender) };
    info!("Player {} connected from {}", player_id, addr);

    let writer = tokio::spawn(write_outbound(sink, outbound));

    while let Some(incoming) = messages.next().await {
        match incoming {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Move { dx, dy }) => {
                    apply_intent(&world, player_id, dx, dy).await;
                    broadcast_world(&world, &registry).await;
                }
                Ok(ClientMessage::Unknown) => {
                    debug!("Player {} sent an unrecognized message type", player_id);
                }
                Err(e) => {
                    // Undecodable payload ends this session; nobody else
                    // is affected.
                    warn!("Undecodable payload from player {}: {}", player_id, e);
                    break;
                }
            },
            Ok(Message::Close(_)) => break,
            // Ping/pong/binary frames carry no intent.
            Ok(_) => {}
            Err(e) => {
                debug!("WebSocket error for player {}: {}", player_id, e);
                break;
            }
        }
    }

    // Teardown runs exactly once per connection: drop the queue first so no
    // further broadcast reaches it, then release the player record. The
    // next triggered broadcast reflects the removal.
    { registry.write().await.deregister(player_id) };
    { world.write().await.remove_player(player_id) };
    let _ = writer.await;
    info!("Player {} disconnected", player_id);
}

/// Applies one movement intent and resolves collisions for the mover. The
/// write lock spans only the in-memory mutation, never any I/O. A move for
/// an id that is already gone is a silent no-op.
async fn apply_intent(world: &RwLock<WorldState>, player_id: PlayerId, dx: f64, dy: f64) {
    let mut world = world.write().await;
    if world.apply_move(player_id, dx, dy) {
        world.collect_resources(player_id);
    }
}

/// Drains one connection's outbound queue into its WebSocket sink. Ends
/// when the registry drops the sender (normal teardown) or the peer stops
/// accepting writes; either way the receive half observes the close and
/// runs cleanup.
async fn write_outbound(
    mut sink: SplitSink<WebSocketStream<TcpStream>, Message>,
    mut outbound: mpsc::Receiver<Message>,
) {
    while let Some(message) = outbound.recv().await {
        if sink.send(message).await.is_err() {
            break;
        }
    }
    let _ = sink.close().await;
}
