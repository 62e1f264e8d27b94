//! # Authoritative Game Server Library
//!
//! This library implements the authoritative server for a small multiplayer
//! collection game. Clients connect over persistent WebSocket connections,
//! submit movement intents, and receive full-state snapshots; the server
//! alone decides final game-state values.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative State
//! All player positions, scores and collectible resources live in a single
//! [`game::WorldState`]. Clients submit deltas, never final state, and every
//! snapshot a client receives fully replaces whatever it held before.
//!
//! ### Connection Lifecycle
//! Each connection is handled by its own task: handshake, player creation
//! and registration, the receive loop, and exactly-once teardown when the
//! channel closes for any reason (peer disconnect, network error, or an
//! undecodable payload).
//!
//! ### State Broadcasting
//! After every applied move and every resource spawn the whole world is
//! serialized once and fanned out to all registered connections. Each
//! recipient is an independent failure boundary: a slow or dead connection
//! cannot delay or abort delivery to the others.
//!
//! ## Module Organization
//!
//! - [`game`]: world state, movement application, collision resolution
//! - [`registry`]: live-connection tracking and the broadcast recipient set
//! - [`broadcast`]: snapshot serialization and fan-out
//! - [`spawner`]: the periodic resource-spawning task
//! - [`network`]: the WebSocket listener and per-connection handlers
//!
//! ## Concurrency Model
//!
//! One task per connection plus one background spawner task, all sharing
//! the world and the registry behind `tokio::sync::RwLock`. Write locks
//! span only in-memory mutations and are never held across connection I/O,
//! so one stalled client cannot stall anyone else's mutations. Outbound
//! traffic goes through bounded per-connection queues drained by dedicated
//! writer tasks.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::game::{GameConfig, WorldState};
//! use server::network::Server;
//! use server::registry::ConnectionRegistry;
//! use server::spawner;
//! use std::sync::Arc;
//! use tokio::sync::RwLock;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GameConfig::default();
//!     let world = Arc::new(RwLock::new(WorldState::new(config)));
//!     let registry = Arc::new(RwLock::new(ConnectionRegistry::new()));
//!
//!     // Bind the endpoint, start the resource spawner, then serve.
//!     let server = Server::bind(
//!         "127.0.0.1:8765",
//!         Arc::clone(&world),
//!         Arc::clone(&registry),
//!     )
//!     .await?;
//!     tokio::spawn(spawner::run(
//!         Arc::clone(&world),
//!         Arc::clone(&registry),
//!         config.spawn_interval,
//!     ));
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod game;
pub mod network;
pub mod registry;
pub mod spawner;
