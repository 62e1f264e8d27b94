//! Integration tests for the state-synchronization server
//!
//! These tests validate cross-component interactions and real network
//! behavior: live WebSocket sessions against a running server instance,
//! plus world-level properties under concurrent mutation.

use futures_util::{SinkExt, StreamExt};
use server::game::{GameConfig, WorldState};
use server::network::Server;
use server::registry::ConnectionRegistry;
use shared::{ClientMessage, Player, PlayerId, Resource, ServerMessage};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Starts a server on an ephemeral port without the resource spawner, so
/// client moves are the only broadcast triggers and every sent move pairs
/// with exactly one snapshot. Resources are injected through the returned
/// world handle where a test needs them.
async fn start_server() -> (SocketAddr, Arc<RwLock<WorldState>>) {
    let world = Arc::new(RwLock::new(WorldState::new(GameConfig::default())));
    let registry = Arc::new(RwLock::new(ConnectionRegistry::new()));

    let server = Server::bind("127.0.0.1:0", Arc::clone(&world), Arc::clone(&registry))
        .await
        .expect("Failed to bind test server");
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());

    (addr, world)
}

async fn connect(addr: SocketAddr) -> Client {
    let url = format!("ws://{}", addr);
    let (socket, _response) = timeout(Duration::from_secs(5), connect_async(url.as_str()))
        .await
        .expect("Timed out connecting")
        .expect("Failed to connect");
    socket
}

async fn send_move(client: &mut Client, dx: f64, dy: f64) {
    let text = serde_json::to_string(&ClientMessage::Move { dx, dy }).unwrap();
    client.send(Message::Text(text)).await.unwrap();
}

async fn next_update(client: &mut Client) -> (HashMap<PlayerId, Player>, Vec<Resource>) {
    loop {
        let frame = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("Timed out waiting for a snapshot")
            .expect("Connection closed while waiting for a snapshot")
            .expect("WebSocket error while waiting for a snapshot");
        if let Message::Text(text) = frame {
            let ServerMessage::Update { players, resources } =
                serde_json::from_str(&text).expect("Snapshot did not decode");
            return (players, resources);
        }
    }
}

/// Sends a zero move and returns the players map from the snapshot it
/// triggers. Used to poll membership without disturbing positions.
async fn poll_players(client: &mut Client) -> HashMap<PlayerId, Player> {
    send_move(client, 0.0, 0.0).await;
    next_update(client).await.0
}

async fn poll_until_player_count(client: &mut Client, count: usize) -> HashMap<PlayerId, Player> {
    let mut players = poll_players(client).await;
    for _ in 0..50 {
        if players.len() == count {
            return players;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        players = poll_players(client).await;
    }
    panic!(
        "Player count never reached {} (last seen {})",
        count,
        players.len()
    );
}

/// LIVE SESSION TESTS
mod session_tests {
    use super::*;

    /// A player's position is its random start plus the vector sum of
    /// every applied delta.
    #[tokio::test]
    async fn move_deltas_accumulate() {
        let (addr, _world) = start_server().await;
        let mut client = connect(addr).await;

        let players = poll_players(&mut client).await;
        assert_eq!(players.len(), 1);
        let (&id, start) = players.iter().next().unwrap();
        let start = start.clone();

        send_move(&mut client, 3.5, -2.25).await;
        let (players, _) = next_update(&mut client).await;
        let moved = &players[&id];
        assert!((moved.x - (start.x + 3.5)).abs() < 1e-9);
        assert!((moved.y - (start.y - 2.25)).abs() < 1e-9);

        send_move(&mut client, -0.5, 10.0).await;
        let (players, _) = next_update(&mut client).await;
        let moved = &players[&id];
        assert!((moved.x - (start.x + 3.0)).abs() < 1e-9);
        assert!((moved.y - (start.y + 7.75)).abs() < 1e-9);
    }

    /// Moving onto a spawned resource removes it from the next snapshot
    /// and credits exactly one point in the same step.
    #[tokio::test]
    async fn collecting_a_resource_increments_score() {
        let (addr, world) = start_server().await;
        let mut client = connect(addr).await;

        let players = poll_players(&mut client).await;
        let (&id, me) = players.iter().next().unwrap();
        assert_eq!(me.score, 0);

        let resource_id = world.write().await.spawn_resource_at(100.0, 100.0);

        // Step straight onto the resource.
        send_move(&mut client, 100.0 - me.x, 100.0 - me.y).await;
        let (players, resources) = next_update(&mut client).await;

        assert!(resources.iter().all(|r| r.id != resource_id));
        assert_eq!(players[&id].score, 1);
    }

    /// After a connection closes, the next broadcast contains exactly the
    /// remaining player.
    #[tokio::test]
    async fn disconnect_removes_player_from_broadcasts() {
        let (addr, _world) = start_server().await;
        let mut first = connect(addr).await;

        let players = poll_players(&mut first).await;
        assert_eq!(players.len(), 1);
        let &first_id = players.keys().next().unwrap();

        let mut second = connect(addr).await;
        let players = poll_until_player_count(&mut first, 2).await;
        assert!(players.contains_key(&first_id));

        second.close(None).await.unwrap();

        let players = poll_until_player_count(&mut first, 1).await;
        assert!(players.contains_key(&first_id));
    }

    /// An undecodable payload terminates only the offending session; a
    /// well-behaved connection keeps receiving correct snapshots.
    #[tokio::test]
    async fn malformed_payload_only_kills_that_connection() {
        let (addr, _world) = start_server().await;
        let mut good = connect(addr).await;
        let mut bad = connect(addr).await;

        poll_until_player_count(&mut good, 2).await;

        bad.send(Message::Text("this is not json".to_string()))
            .await
            .unwrap();

        // The offender gets closed by the server.
        loop {
            match timeout(Duration::from_secs(5), bad.next())
                .await
                .expect("Timed out waiting for the close")
            {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                Some(Ok(_)) => {}
            }
        }

        // The well-behaved connection is unaffected and sees the removal.
        let players = poll_until_player_count(&mut good, 1).await;
        assert_eq!(players.len(), 1);
    }

    /// Unrecognized message types are dropped without closing the session
    /// and without triggering a broadcast.
    #[tokio::test]
    async fn unknown_message_type_is_ignored() {
        let (addr, _world) = start_server().await;
        let mut client = connect(addr).await;

        client
            .send(Message::Text(
                r#"{"type": "chat", "text": "hello"}"#.to_string(),
            ))
            .await
            .unwrap();

        // No broadcast arrives for it.
        assert!(
            timeout(Duration::from_millis(200), client.next())
                .await
                .is_err(),
            "Unrecognized message must not trigger a broadcast"
        );

        // The session is still alive and the next move round-trips.
        let players = poll_players(&mut client).await;
        assert_eq!(players.len(), 1);
        assert_eq!(players.values().next().unwrap().score, 0);
    }
}

/// WORLD STATE CONCURRENCY TESTS
mod world_tests {
    use super::*;

    /// Moves from two tasks against disjoint resources resolve
    /// independently regardless of interleaving.
    #[tokio::test]
    async fn interleaved_collection_resolves_independently() {
        let world = Arc::new(RwLock::new(WorldState::new(GameConfig::default())));

        let (first, second) = {
            let mut world = world.write().await;
            let first = world.add_player_at(100.0, 100.0);
            let second = world.add_player_at(600.0, 400.0);
            world.spawn_resource_at(150.0, 100.0);
            world.spawn_resource_at(650.0, 400.0);
            (first, second)
        };

        let walk = |world: Arc<RwLock<WorldState>>, id: PlayerId| async move {
            // 50 small steps to the right, colliding after each one.
            for _ in 0..50 {
                let mut world = world.write().await;
                world.apply_move(id, 1.0, 0.0);
                world.collect_resources(id);
            }
        };

        let first_task = tokio::spawn(walk(Arc::clone(&world), first));
        let second_task = tokio::spawn(walk(Arc::clone(&world), second));
        first_task.await.unwrap();
        second_task.await.unwrap();

        let world = world.read().await;
        assert!(world.resources.is_empty());
        assert_eq!(world.players[&first].score, 1);
        assert_eq!(world.players[&second].score, 1);
    }

    /// A pending move that arrives after its player disconnected is a
    /// silent no-op, and double deregistration is safe.
    #[tokio::test]
    async fn stale_mutations_are_noops() {
        let world = Arc::new(RwLock::new(WorldState::new(GameConfig::default())));
        let registry = Arc::new(RwLock::new(ConnectionRegistry::new()));

        let (sender, _receiver) = tokio::sync::mpsc::channel(4);
        let id = world.write().await.add_player_at(100.0, 100.0);
        registry.write().await.register(id, sender);

        // Close path runs once...
        assert!(registry.write().await.deregister(id));
        assert!(world.write().await.remove_player(id));

        // ...then a straggler move and a duplicate teardown arrive.
        assert!(!world.write().await.apply_move(id, 5.0, 5.0));
        assert!(!registry.write().await.deregister(id));
        assert!(!world.write().await.remove_player(id));

        assert!(world.read().await.players.is_empty());
        assert!(registry.read().await.is_empty());
    }
}
