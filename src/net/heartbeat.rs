//! Periodic liveness probing.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant};

use crate::lifecycle::shutdown::ShutdownSignal;
use crate::net::connection::ConnectionManager;

pub struct HeartbeatMonitor {
    connections: Arc<ConnectionManager>,
    interval: Duration,
}

impl HeartbeatMonitor {
    pub fn new(connections: Arc<ConnectionManager>, interval: Duration) -> Self {
        Self { connections, interval }
    }

    pub async fn run(self, mut shutdown: ShutdownSignal) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Heartbeat monitor starting");

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let terminated = self.connections.heartbeat_tick();
                    if terminated > 0 {
                        tracing::info!(terminated, remaining = self.connections.count(), "Heartbeat sweep");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Heartbeat monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
