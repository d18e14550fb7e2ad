//! Request handlers for different server endpoints

pub mod api;
pub mod websocket;

use std::convert::Infallible;

use log::{error, warn};
use serde_json::json;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::core::ranking::RankingPublisher;

// Re-export the websocket handler
pub use websocket::handle_ws_client;

/// Every route the server exposes, with rejections turned into JSON errors
pub fn routes(
    publisher: RankingPublisher,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let hub = publisher.hub().clone();
    websocket::ws_route(hub.clone())
        .or(api::health_route(hub))
        .or(api::api_routes(publisher))
        .recover(handle_rejection)
}

/// Convert a rejection into a JSON error reply. Failed WebSocket handshakes
/// land here as missing or invalid upgrade headers.
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(e) = err.find::<warp::reject::MissingHeader>() {
        warn!("Rejected request without {} header", e.name());
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidHeader>() {
        warn!("Rejected request with invalid {} header", e.name());
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&json!({ "error": message })),
        status,
    ))
}
