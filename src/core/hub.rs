//! Ranking broadcast hub
//!
//! A single control loop owns the set of live peers. Registration, removal and
//! broadcasts all arrive as events and are applied one at a time, so the set
//! itself needs no lock. The only state readable from outside the loop is the
//! live-peer counter, which sits behind its own `RwLock`.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, RwLock};

use futures_util::sink::Sink;
use futures_util::stream::Stream;
use log::{debug, error, info};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use warp::ws::Message;

use crate::config::HubSettings;
use crate::core::message::{RankingEntry, RankingUpdate};
use crate::core::peer::{Peer, PeerHandle, PeerId};
use crate::error::{MileHubError, Result};

/// Cloneable handle to the hub. Every clone talks to the same control loop.
#[derive(Clone)]
pub struct Hub {
    register_tx: mpsc::UnboundedSender<PeerHandle>,
    unregister_tx: mpsc::UnboundedSender<PeerId>,
    broadcast_tx: mpsc::UnboundedSender<Arc<str>>,
    live_count: Arc<RwLock<usize>>,
    settings: HubSettings,
}

impl Hub {
    /// Build a hub and the control loop that serves it. The loop does nothing
    /// until it is run; see [`Hub::start`].
    pub fn new(settings: HubSettings) -> (Self, ControlLoop) {
        let (register_tx, register_rx) = mpsc::unbounded_channel();
        let (unregister_tx, unregister_rx) = mpsc::unbounded_channel();
        let (broadcast_tx, broadcast_rx) = mpsc::unbounded_channel();
        let live_count = Arc::new(RwLock::new(0));

        let hub = Self {
            register_tx,
            unregister_tx,
            broadcast_tx,
            live_count: live_count.clone(),
            settings,
        };
        let control = ControlLoop {
            peers: HashMap::new(),
            register_rx,
            unregister_rx,
            broadcast_rx,
            live_count,
        };
        (hub, control)
    }

    /// Build a hub and spawn its control loop on the current runtime
    pub fn start(settings: HubSettings) -> Self {
        let (hub, control) = Self::new(settings);
        tokio::spawn(control.run());
        hub
    }

    pub fn settings(&self) -> &HubSettings {
        &self.settings
    }

    /// Make a peer eligible for future broadcasts
    pub fn register(&self, peer: PeerHandle) {
        if self.register_tx.send(peer).is_err() {
            error!("Hub control loop is gone, cannot register peer");
        }
    }

    /// Remove a peer and close its outbox. Unknown ids are ignored.
    pub fn unregister(&self, id: PeerId) {
        if self.unregister_tx.send(id).is_err() {
            debug!("Hub control loop is gone, peer {} already released", id);
        }
    }

    /// Serialize the ranking once and fan it out to every registered peer
    pub fn broadcast_ranking<P: Serialize>(&self, ranking: &[RankingEntry<P>]) -> Result<()> {
        let payload = RankingUpdate::new(ranking).to_json().map_err(|e| {
            error!("Error serializing ranking: {}", e);
            e
        })?;
        self.broadcast(payload)?;
        info!("Ranking with {} entries queued for broadcast", ranking.len());
        Ok(())
    }

    /// Fan out an already serialized message to every registered peer
    pub fn broadcast(&self, payload: impl Into<Arc<str>>) -> Result<()> {
        self.broadcast_tx
            .send(payload.into())
            .map_err(|_| MileHubError::HubStopped)
    }

    /// Turn an upgraded transport into a registered peer with both pumps
    /// running. The transport is moved into the peer and never handed back.
    pub fn accept<T, E>(&self, transport: T) -> PeerId
    where
        T: Stream<Item = std::result::Result<Message, E>>
            + Sink<Message, Error = E>
            + Send
            + 'static,
        E: Display + Send + 'static,
    {
        let (handle, outbox) = PeerHandle::new(self.settings.outbox_capacity);
        let id = handle.id();
        self.register(handle);
        Peer::new(id, transport, outbox, self.settings.clone()).spawn(self.clone());
        id
    }

    /// Number of registered peers, for health reporting
    pub fn live_count(&self) -> usize {
        match self.live_count.read() {
            Ok(count) => *count,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// The hub's event loop. Sole owner of the peer set.
pub struct ControlLoop {
    peers: HashMap<PeerId, PeerHandle>,
    register_rx: mpsc::UnboundedReceiver<PeerHandle>,
    unregister_rx: mpsc::UnboundedReceiver<PeerId>,
    broadcast_rx: mpsc::UnboundedReceiver<Arc<str>>,
    live_count: Arc<RwLock<usize>>,
}

impl ControlLoop {
    /// Process events until every [`Hub`] handle has been dropped
    pub async fn run(mut self) {
        info!("Hub control loop started");
        loop {
            // Registrations are polled first: a peer that dies right after
            // connecting has its unregister queued after its register, and the
            // two must be applied in that order. Broadcasts get no such
            // ordering, so one queued before a registration can still reach
            // the newly registered peer.
            tokio::select! {
                biased;
                Some(peer) = self.register_rx.recv() => self.on_register(peer),
                Some(id) = self.unregister_rx.recv() => self.on_unregister(id),
                Some(payload) = self.broadcast_rx.recv() => self.on_broadcast(payload),
                else => break,
            }
        }
        info!("Hub control loop stopped");
    }

    fn on_register(&mut self, peer: PeerHandle) {
        let id = peer.id();
        self.peers.insert(id, peer);
        self.sync_live_count();
        info!("Peer {} connected. Total: {}", id, self.peers.len());
    }

    fn on_unregister(&mut self, id: PeerId) {
        // Dropping the handle closes the outbox; remove() makes that happen once
        if self.peers.remove(&id).is_some() {
            self.sync_live_count();
            info!("Peer {} disconnected. Total: {}", id, self.peers.len());
        }
    }

    fn on_broadcast(&mut self, payload: Arc<str>) {
        let mut delivered = 0;
        let mut evicted = Vec::new();

        for (id, peer) in &self.peers {
            match peer.try_deliver(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    debug!("Peer {} is not keeping up, evicting", id);
                    evicted.push(*id);
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("Peer {} outbox already closed, evicting", id);
                    evicted.push(*id);
                }
            }
        }

        if !evicted.is_empty() {
            for id in &evicted {
                self.peers.remove(id);
            }
            self.sync_live_count();
        }

        debug!(
            "Broadcast delivered to {} peers, {} evicted",
            delivered,
            evicted.len()
        );
    }

    fn sync_live_count(&self) {
        match self.live_count.write() {
            Ok(mut count) => *count = self.peers.len(),
            Err(poisoned) => *poisoned.into_inner() = self.peers.len(),
        }
    }
}
