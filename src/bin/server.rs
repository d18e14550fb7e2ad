use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;

use mile_hub::config::ServerConfig;
use mile_hub::constants::WS_PATH;
use mile_hub::core::{Hub, RankingPublisher};
use mile_hub::handlers::routes;
use mile_hub::storage::MemoryPlayerStore;

#[tokio::main]
async fn main() {
    // Load .env before the logger so RUST_LOG can come from it
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    env_logger::init();

    match dotenv {
        Ok(path) => info!("Environment variables loaded from {}", path.display()),
        Err(e) => warn!("No .env file loaded: {}", e),
    };

    // Load config from environment
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Configuration: host={}, port={}, pong_wait={:?}, outbox_capacity={}",
        config.host, config.port, config.hub.pong_wait, config.hub.outbox_capacity
    );

    // Construct the hub once; everything else gets a handle to it
    let hub = Hub::start(config.hub.clone());
    let publisher = RankingPublisher::new(Arc::new(MemoryPlayerStore::new()), hub);

    // Build the server address
    let addr: SocketAddr = match config.bind_addr().parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to parse server address: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting Mile Hub server on {}", addr);
    info!("WebSocket endpoint: ws://{}/{}", addr, WS_PATH);

    warp::serve(routes(publisher)).run(addr).await;
}
