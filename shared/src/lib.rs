use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const BOARD_WIDTH: f64 = 800.0;
pub const BOARD_HEIGHT: f64 = 600.0;
pub const PLAYER_SIZE: f64 = 32.0;
pub const PLAYER_HALF_SIZE: f64 = PLAYER_SIZE / 2.0;
pub const SPAWN_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_PORT: u16 = 8765;

pub type PlayerId = u64;
pub type ResourceId = u64;

/// A player as it appears in the world table and on the wire. The id lives
/// in the enclosing map key.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Player {
    pub x: f64,
    pub y: f64,
    pub score: u32,
}

impl Player {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, score: 0 }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub x: f64,
    pub y: f64,
}

/// Messages a client may send. Recognized-but-unhandled `type` values fall
/// into `Unknown` and are dropped; payloads that fail to decode entirely are
/// a fatal condition for that connection.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Move { dx: f64, dy: f64 },
    #[serde(other)]
    Unknown,
}

/// Messages the server sends. A snapshot fully replaces whatever state the
/// client held before.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Update {
        players: HashMap<PlayerId, Player>,
        resources: Vec<Resource>,
    },
}

/// Axis-aligned overlap between a player and a resource, both treated as
/// points with the player's half-size extent. Each axis is tested
/// independently (a rectangle, not a radius); the boundary itself does not
/// overlap.
pub fn overlaps(player: &Player, resource: &Resource, half_size: f64) -> bool {
    (player.x - resource.x).abs() < half_size && (player.y - resource.y).abs() < half_size
}
