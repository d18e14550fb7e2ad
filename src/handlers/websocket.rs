use std::convert::Infallible;

use log::info;
use warp::ws::{WebSocket, Ws};
use warp::{Filter, Rejection, Reply};

use crate::constants::WS_PATH;
use crate::core::hub::Hub;

/// `GET /ws`. Any origin is accepted.
pub fn ws_route(hub: Hub) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path(WS_PATH)
        .and(warp::path::end())
        .and(warp::ws())
        .and(with_hub(hub))
        .map(|ws: Ws, hub: Hub| {
            let max_size = hub.settings().max_message_size;
            ws.max_message_size(max_size)
                .max_frame_size(max_size)
                .on_upgrade(move |socket| handle_ws_client(socket, hub))
        })
}

// Handle an upgraded WebSocket connection
pub async fn handle_ws_client(ws: WebSocket, hub: Hub) {
    let peer_id = hub.accept(ws);
    info!("New websocket connection: {}", peer_id);
}

// Helper function to include the hub in request state
pub fn with_hub(hub: Hub) -> impl Filter<Extract = (Hub,), Error = Infallible> + Clone {
    warp::any().map(move || hub.clone())
}
