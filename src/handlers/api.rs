//! HTTP endpoints around the hub: health, players and ranking

use std::convert::Infallible;

use log::{error, info};
use serde_json::json;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::{Filter, Rejection, Reply};

use crate::constants::{API_PATH, DEFAULT_AVATAR, HEALTH_PATH};
use crate::core::hub::Hub;
use crate::core::message::{CreatePlayerRequest, UpdateScoreRequest};
use crate::core::ranking::RankingPublisher;
use crate::error::MileHubError;

/// Largest JSON body accepted by the API
const MAX_BODY_BYTES: u64 = 16 * 1024;
const MAX_NAME_CHARS: usize = 100;

/// `GET /health`
pub fn health_route(hub: Hub) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path(HEALTH_PATH)
        .and(warp::path::end())
        .and(warp::get())
        .map(move || {
            reply::json(&json!({
                "status": "ok",
                "websocket_clients": hub.live_count(),
            }))
        })
}

/// Everything under `/api`
pub fn api_routes(
    publisher: RankingPublisher,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let with_publisher = warp::any().map(move || publisher.clone());

    let ranking_route = warp::path!("ranking")
        .and(warp::get())
        .and(with_publisher.clone())
        .and_then(get_ranking);

    let list_players_route = warp::path!("players")
        .and(warp::get())
        .and(with_publisher.clone())
        .and_then(list_players);

    let get_player_route = warp::path!("players" / Uuid)
        .and(warp::get())
        .and(with_publisher.clone())
        .and_then(get_player);

    let create_player_route = warp::path!("players")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_publisher.clone())
        .and_then(create_player);

    let update_score_route = warp::path!("players" / Uuid / "score")
        .and(warp::put())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_publisher)
        .and_then(update_score);

    warp::path(API_PATH).and(
        ranking_route
            .or(list_players_route)
            .or(get_player_route)
            .or(create_player_route)
            .or(update_score_route),
    )
}

async fn get_ranking(publisher: RankingPublisher) -> Result<Response, Infallible> {
    Ok(match publisher.current_ranking().await {
        Ok(ranking) => reply::json(&ranking).into_response(),
        Err(e) => error_response(e),
    })
}

async fn list_players(publisher: RankingPublisher) -> Result<Response, Infallible> {
    Ok(match publisher.store().list_players().await {
        Ok(players) => reply::json(&players).into_response(),
        Err(e) => error_response(e),
    })
}

async fn get_player(id: Uuid, publisher: RankingPublisher) -> Result<Response, Infallible> {
    Ok(match publisher.store().get_player(id).await {
        Ok(player) => reply::json(&player).into_response(),
        Err(e) => error_response(e),
    })
}

async fn create_player(
    request: CreatePlayerRequest,
    publisher: RankingPublisher,
) -> Result<Response, Infallible> {
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Ok(error_response(MileHubError::ValidationError(
            "name is required".to_string(),
        )));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Ok(error_response(MileHubError::ValidationError(format!(
            "name must be at most {} characters",
            MAX_NAME_CHARS
        ))));
    }

    let avatar = request
        .avatar
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| DEFAULT_AVATAR.to_string());

    Ok(match publisher.store().create_player(name, avatar).await {
        Ok(player) => {
            info!("Player created: {}", player.id);
            reply::with_status(reply::json(&player), StatusCode::CREATED).into_response()
        }
        Err(e) => error_response(e),
    })
}

async fn update_score(
    id: Uuid,
    request: UpdateScoreRequest,
    publisher: RankingPublisher,
) -> Result<Response, Infallible> {
    Ok(match publisher.record_score(id, request.score).await {
        Ok(player) => reply::json(&json!({
            "score": player.score,
            "message": "Score updated successfully",
        }))
        .into_response(),
        Err(e) => error_response(e),
    })
}

/// Map a crate error onto a JSON error reply
pub fn error_response(err: MileHubError) -> Response {
    let status = match &err {
        MileHubError::PlayerNotFound(_) => StatusCode::NOT_FOUND,
        MileHubError::ValidationError(_) => StatusCode::BAD_REQUEST,
        _ => {
            error!("Request failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    reply::with_status(reply::json(&json!({ "error": err.to_string() })), status).into_response()
}
