use clap::Parser;
use server::game::{GameConfig, WorldState};
use server::network::Server;
use server::registry::ConnectionRegistry;
use server::spawner;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Main-method of the application.
/// Parses command-line arguments, then starts the resource spawner and the
/// connection listener over shared world state.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value_t = shared::DEFAULT_PORT)]
        port: u16,
        /// Seconds between resource spawns
        #[clap(short, long, default_value_t = shared::SPAWN_INTERVAL_SECS)]
        spawn_interval: u64,
        /// Player sprite half-size used for collision bounds
        #[clap(long, default_value_t = shared::PLAYER_HALF_SIZE)]
        half_size: f64,
        /// Board width used for random placement bounds
        #[clap(long, default_value_t = shared::BOARD_WIDTH)]
        width: f64,
        /// Board height used for random placement bounds
        #[clap(long, default_value_t = shared::BOARD_HEIGHT)]
        height: f64,
    }

    env_logger::init();

    // Parse command line arguments
    let args = Args::parse();
    let config = GameConfig {
        board_width: args.width,
        board_height: args.height,
        half_size: args.half_size,
        spawn_interval: Duration::from_secs(args.spawn_interval),
    };

    // Create shared state with read-write locks
    let world = Arc::new(RwLock::new(WorldState::new(config)));
    let registry = Arc::new(RwLock::new(ConnectionRegistry::new()));

    // Bind the listening endpoint; failure here aborts startup
    let address = format!("{}:{}", args.host, args.port);
    let server = Server::bind(&address, Arc::clone(&world), Arc::clone(&registry)).await?;

    // Spawn the resource spawner task
    let spawner_handle = {
        let world = Arc::clone(&world);
        let registry = Arc::clone(&registry);
        tokio::spawn(spawner::run(world, registry, config.spawn_interval))
    };

    // Spawn the accept loop
    let server_handle = tokio::spawn(server.run());

    // Handle shutdown gracefully
    tokio::select! {
        result = server_handle => {
            if let Err(e) = result {
                eprintln!("Network task panicked: {}", e);
            }
        }
        result = spawner_handle => {
            if let Err(e) = result {
                eprintln!("Spawner task panicked: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
