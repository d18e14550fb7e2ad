//! Per-connection state and the two pumps that drive it
//!
//! A peer owns its transport outright. The transport is split once: the read
//! half goes to the inbound pump, the write half to the outbound pump, so there
//! is never more than one reader and one writer. The hub only ever sees the
//! sending side of the outbox.

use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::sink::{Sink, SinkExt};
use futures_util::stream::{Stream, StreamExt};
use log::{debug, info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, timeout, timeout_at, Interval, MissedTickBehavior};
use uuid::Uuid;
use warp::ws::Message;

use crate::config::HubSettings;
use crate::core::hub::Hub;
use crate::error::{MileHubError, Result};

pub type PeerId = Uuid;

/// The hub's side of a peer: its id and the sending half of its outbox.
/// Dropping the handle closes the outbox.
#[derive(Debug)]
pub struct PeerHandle {
    id: PeerId,
    outbox: mpsc::Sender<Arc<str>>,
}

impl PeerHandle {
    /// Create a handle together with the outbox it feeds
    pub fn new(capacity: usize) -> (Self, Outbox) {
        let (tx, rx) = mpsc::channel(capacity);
        let handle = Self {
            id: Uuid::new_v4(),
            outbox: tx,
        };
        (handle, Outbox { rx })
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    /// Queue a message without waiting. Fails when the outbox is full or its
    /// reader is gone.
    pub(crate) fn try_deliver(
        &self,
        payload: Arc<str>,
    ) -> std::result::Result<(), mpsc::error::TrySendError<Arc<str>>> {
        self.outbox.try_send(payload)
    }
}

/// Receiving side of a peer's bounded outbound queue
#[derive(Debug)]
pub struct Outbox {
    rx: mpsc::Receiver<Arc<str>>,
}

impl Outbox {
    /// Next queued message, or `None` once the hub has closed the outbox and
    /// everything queued before that has been drained
    pub async fn next(&mut self) -> Option<Arc<str>> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`Outbox::next`]
    pub fn try_next(&mut self) -> Option<Arc<str>> {
        self.rx.try_recv().ok()
    }
}

/// A freshly upgraded connection that has not started pumping yet
pub struct Peer<T> {
    id: PeerId,
    transport: T,
    outbox: Outbox,
    settings: HubSettings,
    connected_at: Instant,
}

impl<T, E> Peer<T>
where
    T: Stream<Item = std::result::Result<Message, E>> + Sink<Message, Error = E> + Send + 'static,
    E: Display + Send + 'static,
{
    pub fn new(id: PeerId, transport: T, outbox: Outbox, settings: HubSettings) -> Self {
        Self {
            id,
            transport,
            outbox,
            settings,
            connected_at: Instant::now(),
        }
    }

    /// Start both pumps. The inbound pump reports the peer gone to `hub`
    /// exactly once when it stops.
    pub fn spawn(self, hub: Hub) {
        let Peer {
            id,
            transport,
            outbox,
            settings,
            connected_at,
        } = self;
        let (sink, stream) = StreamExt::split::<Message>(transport);
        let (writer_done_tx, writer_done_rx) = oneshot::channel::<()>();

        let write_settings = settings.clone();
        tokio::spawn(async move {
            if let Err(e) = write_pump(id, sink, outbox, &write_settings).await {
                debug!("Outbound pump for peer {} stopped: {}", id, e);
            }
            // Dropping the sender wakes the inbound pump either way
            drop(writer_done_tx);
        });

        tokio::spawn(async move {
            match read_pump(id, stream, writer_done_rx, &settings).await {
                Ok(()) => debug!("Peer {} disconnected", id),
                Err(MileHubError::ConnectionError(e)) => warn!("WebSocket error on peer {}: {}", id, e),
                Err(e) => info!("Dropping peer {}: {}", id, e),
            }
            hub.unregister(id);
            debug!(
                "Peer {} was connected for {:?}",
                id,
                connected_at.elapsed()
            );
        });
    }
}

/// Keep the read side alive until the remote goes away.
///
/// Inbound payloads carry no meaning and are discarded; only pongs matter, each
/// one pushing the read deadline `pong_wait` into the future. Returns `Ok` for
/// an orderly end (close frame, end of stream, writer already gone).
pub async fn read_pump<R, E>(
    id: PeerId,
    mut stream: R,
    mut writer_done: oneshot::Receiver<()>,
    settings: &HubSettings,
) -> Result<()>
where
    R: Stream<Item = std::result::Result<Message, E>> + Unpin,
    E: Display,
{
    let mut deadline = tokio::time::Instant::now() + settings.pong_wait;

    loop {
        tokio::select! {
            _ = &mut writer_done => return Ok(()),
            next = timeout_at(deadline, stream.next()) => match next {
                Err(_) => {
                    return Err(MileHubError::Timeout(format!(
                        "no pong within {:?}",
                        settings.pong_wait
                    )))
                }
                Ok(None) => return Ok(()),
                Ok(Some(Err(e))) => return Err(MileHubError::ConnectionError(e.to_string())),
                Ok(Some(Ok(message))) => {
                    let size = message.as_bytes().len();
                    if size > settings.max_message_size {
                        return Err(MileHubError::MessageTooLarge(size));
                    }
                    if message.is_close() {
                        return Ok(());
                    }
                    if message.is_pong() {
                        deadline = tokio::time::Instant::now() + settings.pong_wait;
                    } else {
                        log::trace!("Ignoring {} byte message from peer {}", size, id);
                    }
                }
            }
        }
    }
}

/// Sole writer for a peer's transport.
///
/// Drains the outbox and pings on every keepalive tick. When the outbox is
/// closed a close frame is written and the pump ends. The sink is closed once,
/// on the way out, whatever the reason.
pub async fn write_pump<S>(
    id: PeerId,
    mut sink: S,
    mut outbox: Outbox,
    settings: &HubSettings,
) -> Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let mut ticker = keepalive_ticker(settings.ping_period());

    let outcome = loop {
        tokio::select! {
            next = outbox.next() => match next {
                Some(payload) => {
                    let message = Message::text(&*payload);
                    if let Err(e) = write(&mut sink, message, settings.write_wait).await {
                        break Err(e);
                    }
                }
                None => {
                    debug!("Outbox of peer {} closed, sending close frame", id);
                    break write(&mut sink, Message::close(), settings.write_wait).await;
                }
            },
            _ = ticker.tick() => {
                if let Err(e) = write(&mut sink, Message::ping(Vec::new()), settings.write_wait).await {
                    break Err(e);
                }
            }
        }
    };

    match timeout(settings.write_wait, sink.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("Error closing transport of peer {}: {}", id, e),
        Err(_) => debug!("Timed out closing transport of peer {}", id),
    }
    outcome
}

/// First tick one period from now. Ticks missed behind a slow write are not
/// replayed back to back.
fn keepalive_ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn write<S>(sink: &mut S, message: Message, write_wait: Duration) -> Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    match timeout(write_wait, sink.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(MileHubError::ConnectionError(e.to_string())),
        Err(_) => Err(MileHubError::Timeout(format!(
            "write took longer than {:?}",
            write_wait
        ))),
    }
}
