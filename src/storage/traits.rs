//! Abstract storage interface for player data
//!
//! The hub itself never touches storage. Producers read the ordered player
//! list through this trait after they have persisted a score.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::message::Player;
use crate::error::Result;

/// Player storage interface
#[async_trait]
pub trait PlayerStore: Send + Sync {
    /// Persist a new player with a zero score
    async fn create_player(&self, name: String, avatar: String) -> Result<Player>;

    /// Fetch a single player
    async fn get_player(&self, id: Uuid) -> Result<Player>;

    /// All players, highest score first
    async fn list_players(&self) -> Result<Vec<Player>>;

    /// Overwrite a player's score
    async fn update_score(&self, id: Uuid, score: i64) -> Result<Player>;
}

/// Shared handle to whichever backend the server was started with
pub type SharedPlayerStore = Arc<dyn PlayerStore>;
