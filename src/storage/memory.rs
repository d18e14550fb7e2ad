//! In-memory storage implementation for development and testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::traits::PlayerStore;
use crate::core::message::Player;
use crate::error::{MileHubError, Result};

/// In-memory player storage
#[derive(Default)]
pub struct MemoryPlayerStore {
    players: Arc<RwLock<HashMap<Uuid, Player>>>,
}

impl MemoryPlayerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlayerStore for MemoryPlayerStore {
    async fn create_player(&self, name: String, avatar: String) -> Result<Player> {
        let player = Player::new(name, avatar);
        self.players.write().await.insert(player.id, player.clone());
        Ok(player)
    }

    async fn get_player(&self, id: Uuid) -> Result<Player> {
        self.players
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| MileHubError::PlayerNotFound(id.to_string()))
    }

    async fn list_players(&self) -> Result<Vec<Player>> {
        let mut players: Vec<Player> = self.players.read().await.values().cloned().collect();
        // Ties go to whoever registered first
        players.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(players)
    }

    async fn update_score(&self, id: Uuid, score: i64) -> Result<Player> {
        let mut players = self.players.write().await;
        match players.get_mut(&id) {
            Some(player) => {
                player.score = score;
                Ok(player.clone())
            }
            None => Err(MileHubError::PlayerNotFound(id.to_string())),
        }
    }
}
