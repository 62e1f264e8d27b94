use futures_util::{SinkExt, StreamExt};
use shared::{ClientMessage, ServerMessage};
use std::time::Duration;
use tokio::time::sleep;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// Headless probe client: connects, sends a scripted sequence of movement
/// intents, and prints every snapshot it receives.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:8765".to_string());

    println!("Connecting to {}", url);
    let (socket, _response) = connect_async(url.as_str()).await?;
    println!("Connected");
    let (mut sink, mut stream) = socket.split();

    // Send a move every second for 10 seconds, wandering in a circle
    for step in 0..10 {
        let angle = step as f64 / 5.0;
        let movement = ClientMessage::Move {
            dx: angle.sin() * 10.0,
            dy: angle.cos() * 10.0,
        };
        let text = serde_json::to_string(&movement)?;
        println!("Sending move: {}", text);
        sink.send(Message::Text(text)).await?;

        // Each move triggers a snapshot back to us
        match stream.next().await {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerMessage>(&text) {
                Ok(ServerMessage::Update { players, resources }) => {
                    println!(
                        "Update - players: {}, resources: {}",
                        players.len(),
                        resources.len()
                    );
                    for (id, player) in &players {
                        println!(
                            "  Player {}: pos=({:.1}, {:.1}), score={}",
                            id, player.x, player.y, player.score
                        );
                    }
                }
                Err(e) => println!("Failed to decode update: {}", e),
            },
            Some(Ok(other)) => println!("Unexpected frame: {:?}", other),
            Some(Err(e)) => {
                println!("Error receiving update: {}", e);
                break;
            }
            None => {
                println!("Server closed the connection");
                break;
            }
        }

        sleep(Duration::from_secs(1)).await;
    }

    sink.send(Message::Close(None)).await?;
    println!("Test client finished");

    Ok(())
}
