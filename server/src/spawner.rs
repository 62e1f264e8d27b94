//! Periodic resource spawner.
//!
//! Runs as its own task, independent of any connection activity: every
//! interval it drops one resource at a random in-bounds position and
//! triggers a broadcast so idle clients still see the world fill up.

use crate::broadcast::broadcast_world;
use crate::game::WorldState;
use crate::registry::ConnectionRegistry;
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{interval, MissedTickBehavior};

pub async fn run(
    world: Arc<RwLock<WorldState>>,
    registry: Arc<RwLock<ConnectionRegistry>>,
    period: Duration,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // Skip the first tick since it fires immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let id = {
            let mut world = world.write().await;
            world.spawn_resource()
        };
        debug!("Spawned resource {}", id);

        broadcast_world(&world, &registry).await;
    }
}
