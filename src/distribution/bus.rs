//! In-process event bus.
//!
//! A bounded mpsc channel: sync workers publish, the broadcast dispatcher is
//! the single consumer. A full bus applies back-pressure to publishers; a
//! closed bus (dispatcher gone) is reported as [`BusClosed`].

use thiserror::Error;
use tokio::sync::mpsc;

use crate::distribution::events::LiveUpdateEvent;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, Error)]
#[error("event bus closed")]
pub struct BusClosed;

/// Publishing half. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: mpsc::Sender<LiveUpdateEvent>,
}

/// Consuming half, owned by the dispatcher.
pub type EventReceiver = mpsc::Receiver<LiveUpdateEvent>;

impl EventBus {
    pub fn channel(capacity: usize) -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    pub async fn publish(&self, event: LiveUpdateEvent) -> Result<(), BusClosed> {
        let kind = event.kind.as_str();
        let game_id = event.game_id.clone();
        self.tx.send(event).await.map_err(|_| BusClosed)?;
        metrics::record_event_published(kind);
        tracing::debug!(kind, game_id = %game_id, "Event published");
        Ok(())
    }
}
