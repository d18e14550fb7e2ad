use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::RANKING_UPDATE_TYPE;
use crate::error::Result;

/// A registered player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
}

impl Player {
    pub fn new(name: String, avatar: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            avatar,
            score: 0,
            created_at: Utc::now(),
        }
    }
}

/// One line of the ranking. Positions are 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry<P = Player> {
    pub position: usize,
    pub player: P,
}

/// Turn an already ordered list into ranking entries
pub fn rank<P>(ordered: impl IntoIterator<Item = P>) -> Vec<RankingEntry<P>> {
    ordered
        .into_iter()
        .enumerate()
        .map(|(i, player)| RankingEntry {
            position: i + 1,
            player,
        })
        .collect()
}

/// Envelope pushed to every connected client
#[derive(Debug, Serialize)]
pub struct RankingUpdate<'a, P> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub ranking: &'a [RankingEntry<P>],
}

impl<'a, P: Serialize> RankingUpdate<'a, P> {
    pub fn new(ranking: &'a [RankingEntry<P>]) -> Self {
        Self {
            kind: RANKING_UPDATE_TYPE,
            ranking,
        }
    }

    /// Serialize once; the same text is fanned out to every peer
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Body of `POST /api/players`
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlayerRequest {
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Body of `PUT /api/players/:id/score`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateScoreRequest {
    pub score: i64,
}
