//! Broadcast dispatcher: the single consumer of the event bus.
//!
//! Each event is serialized once and queued to every matching connection.
//! Connections that are gone or not keeping up are handed back to the
//! [`ConnectionManager`] for removal, so a dead subscriber never delays the
//! others. The registry is only read here.

use std::sync::Arc;

use crate::distribution::bus::EventReceiver;
use crate::distribution::events::LiveUpdateEvent;
use crate::distribution::registry::SubscriptionRegistry;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::net::connection::ConnectionManager;
use crate::observability::metrics;

pub struct BroadcastDispatcher {
    registry: Arc<SubscriptionRegistry>,
    connections: Arc<ConnectionManager>,
}

impl BroadcastDispatcher {
    pub fn new(registry: Arc<SubscriptionRegistry>, connections: Arc<ConnectionManager>) -> Self {
        Self { registry, connections }
    }

    pub async fn run(self, mut events: EventReceiver, mut shutdown: ShutdownSignal) {
        tracing::info!("Broadcast dispatcher starting");
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        self.dispatch(&event);
                    }
                    None => {
                        tracing::info!("Event bus closed, dispatcher exiting");
                        break;
                    }
                },
                _ = shutdown.recv() => {
                    tracing::info!("Dispatcher received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Deliver one event. Returns the number of connections it was queued to.
    pub fn dispatch(&self, event: &LiveUpdateEvent) -> usize {
        let targets = self.registry.matching(event);
        if targets.is_empty() {
            return 0;
        }

        let text = event.to_message().to_string();
        let mut delivered = 0;
        for id in targets {
            if self.connections.send(id, text.clone()) {
                delivered += 1;
                continue;
            }
            tracing::debug!(connection_id = %id, game_id = %event.game_id, "Dropping unreachable subscriber");
            self.connections.prune(id);
        }

        metrics::record_event_delivered(event.kind.as_str(), delivered);
        tracing::debug!(kind = event.kind.as_str(), game_id = %event.game_id, delivered, "Event dispatched");
        delivered
    }
}
