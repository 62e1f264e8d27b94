//! Snapshot fan-out to every registered connection.
//!
//! The world is serialized once per trigger and the resulting frame is
//! pushed onto each connection's bounded queue without awaiting. Each
//! recipient is its own failure boundary: a lagging connection drops the
//! frame, a closed one is left for its own teardown path, and neither can
//! delay or abort delivery to the rest.

use crate::game::WorldState;
use crate::registry::ConnectionRegistry;
use log::{debug, error, warn};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::RwLock;
use tokio_tungstenite::tungstenite::Message;

/// Serializes the current world state and queues it for every active
/// connection. Called after every applied move and every spawn tick.
pub async fn broadcast_world(world: &RwLock<WorldState>, registry: &RwLock<ConnectionRegistry>) {
    let recipients = { registry.read().await.senders() };
    if recipients.is_empty() {
        return;
    }

    let frame = {
        let world = world.read().await;
        match serde_json::to_string(&world.snapshot()) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to serialize world snapshot: {}", e);
                return;
            }
        }
    };

    for (id, sender) in recipients {
        match sender.try_send(Message::Text(frame.clone())) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Player {} is lagging, dropped a snapshot", id);
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Player {} closed mid-broadcast", id);
            }
        }
    }
}
