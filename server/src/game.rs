use log::{debug, info};
use rand::Rng;
use shared::{
    overlaps, Player, PlayerId, Resource, ResourceId, ServerMessage, BOARD_HEIGHT, BOARD_WIDTH,
    PLAYER_HALF_SIZE, SPAWN_INTERVAL_SECS,
};
use std::collections::HashMap;
use std::time::Duration;

/// Tunables for one world instance, filled from the command line with the
/// shared constants as defaults.
#[derive(Debug, Clone, Copy)]
pub struct GameConfig {
    pub board_width: f64,
    pub board_height: f64,
    pub half_size: f64,
    pub spawn_interval: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_width: BOARD_WIDTH,
            board_height: BOARD_HEIGHT,
            half_size: PLAYER_HALF_SIZE,
            spawn_interval: Duration::from_secs(SPAWN_INTERVAL_SECS),
        }
    }
}

/// The authoritative world: player table, resource field, and the id
/// counters backing both. All mutation goes through these methods.
#[derive(Debug)]
pub struct WorldState {
    pub players: HashMap<PlayerId, Player>,
    pub resources: HashMap<ResourceId, Resource>,
    config: GameConfig,
    next_player_id: PlayerId,
    next_resource_id: ResourceId,
}

impl WorldState {
    pub fn new(config: GameConfig) -> Self {
        Self {
            players: HashMap::new(),
            resources: HashMap::new(),
            config,
            next_player_id: 1,
            next_resource_id: 1,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Creates a player at a random position fully inside the board.
    pub fn add_player(&mut self) -> PlayerId {
        let (x, y) = self.random_position();
        self.add_player_at(x, y)
    }

    pub fn add_player_at(&mut self, x: f64, y: f64) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id += 1;
        self.players.insert(id, Player::new(x, y));
        info!("Player {} joined at ({:.1}, {:.1})", id, x, y);
        id
    }

    /// Removes a player. Safe to call again after the player is gone.
    pub fn remove_player(&mut self, id: PlayerId) -> bool {
        if self.players.remove(&id).is_some() {
            info!("Player {} left", id);
            true
        } else {
            false
        }
    }

    /// Adds a movement delta to the player's position. There is no bounds
    /// clamping and no magnitude validation; the position is wherever the
    /// summed deltas put it. Returns false when the id is already gone
    /// (a close raced a pending move), which callers treat as a no-op.
    pub fn apply_move(&mut self, id: PlayerId, dx: f64, dy: f64) -> bool {
        match self.players.get_mut(&id) {
            Some(player) => {
                player.x += dx;
                player.y += dy;
                true
            }
            None => false,
        }
    }

    /// Collision resolution for one mover: removes every resource whose
    /// box overlaps the player's and credits one point per resource
    /// removed. Returns the collected ids.
    pub fn collect_resources(&mut self, id: PlayerId) -> Vec<ResourceId> {
        let half_size = self.config.half_size;
        let Some(player) = self.players.get(&id) else {
            return Vec::new();
        };

        let collected: Vec<ResourceId> = self
            .resources
            .values()
            .filter(|resource| overlaps(player, resource, half_size))
            .map(|resource| resource.id)
            .collect();

        for resource_id in &collected {
            self.resources.remove(resource_id);
        }
        if !collected.is_empty() {
            if let Some(player) = self.players.get_mut(&id) {
                player.score += collected.len() as u32;
            }
            debug!("Player {} collected {} resource(s)", id, collected.len());
        }

        collected
    }

    /// Places a new resource at a random position fully inside the board.
    pub fn spawn_resource(&mut self) -> ResourceId {
        let (x, y) = self.random_position();
        self.spawn_resource_at(x, y)
    }

    pub fn spawn_resource_at(&mut self, x: f64, y: f64) -> ResourceId {
        let id = self.next_resource_id;
        self.next_resource_id += 1;
        self.resources.insert(id, Resource { id, x, y });
        id
    }

    /// Serializable copy of the entire world for one broadcast.
    pub fn snapshot(&self) -> ServerMessage {
        ServerMessage::Update {
            players: self.players.clone(),
            resources: self.resources.values().cloned().collect(),
        }
    }

    fn random_position(&self) -> (f64, f64) {
        let mut rng = rand::thread_rng();
        let margin = self.config.half_size * 2.0;
        let x = rng.gen_range(margin..self.config.board_width - margin);
        let y = rng.gen_range(margin..self.config.board_height - margin);
        (x, y)
    }
}
