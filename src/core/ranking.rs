//! Ranking producer
//!
//! Anything that changes a score goes through [`RankingPublisher`]: persist
//! first, then read back the full ordered list and hand it to the hub.

use log::warn;
use uuid::Uuid;

use crate::core::hub::Hub;
use crate::core::message::{rank, Player, RankingEntry};
use crate::error::Result;
use crate::storage::SharedPlayerStore;

#[derive(Clone)]
pub struct RankingPublisher {
    store: SharedPlayerStore,
    hub: Hub,
}

impl RankingPublisher {
    pub fn new(store: SharedPlayerStore, hub: Hub) -> Self {
        Self { store, hub }
    }

    pub fn store(&self) -> &SharedPlayerStore {
        &self.store
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Current ranking, highest score first, positions starting at 1
    pub async fn current_ranking(&self) -> Result<Vec<RankingEntry<Player>>> {
        Ok(rank(self.store.list_players().await?))
    }

    /// Broadcast the current ranking to every connected client
    pub async fn publish(&self) -> Result<()> {
        let ranking = self.current_ranking().await?;
        self.hub.broadcast_ranking(&ranking)
    }

    /// Persist a new score and push the resulting ranking.
    ///
    /// A failed broadcast does not undo the update; clients pick up the
    /// change with the next one.
    pub async fn record_score(&self, id: Uuid, score: i64) -> Result<Player> {
        let player = self.store.update_score(id, score).await?;
        if let Err(e) = self.publish().await {
            warn!("Score for {} saved but ranking broadcast failed: {}", id, e);
        }
        Ok(player)
    }
}
