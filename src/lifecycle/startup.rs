//! Startup orchestration.
//!
//! # Responsibilities
//! - Build every subsystem from a validated config
//! - Restore the cache, run the initial sync, start the cadences
//! - Run the listener until shutdown, then stop and persist in order
//!
//! # Design Decisions
//! - Fail fast: a component that cannot be built aborts startup
//! - A failed initial sync is logged, not fatal; cadences retry it
//! - The listener starts last, after the dispatcher and heartbeat are running

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::net::TcpListener;

use crate::cache::{load_from_file, save_to_file, CacheLayer};
use crate::config::RelayConfig;
use crate::distribution::{BroadcastDispatcher, EventBus, EventReceiver, MessageHandler, SubscriptionRegistry};
use crate::http::{AppState, HttpServer};
use crate::lifecycle::shutdown::Shutdown;
use crate::net::{ConnectionManager, HeartbeatMonitor};
use crate::sync::{cadences, Cadence, InMemoryRepository, Repository, Scheduler, SyncContext, SyncWorker};
use crate::upstream::{HttpTransport, SyncCoordinator, Transport, UpstreamError};

/// Workers run once, in this order, before the cadences start.
const INITIAL_SYNC_ORDER: [&str; 5] = ["teams", "scores", "standings", "rosters", "live"];

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build upstream transport: {0}")]
    Transport(#[from] UpstreamError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Every long-lived component of the relay, wired together.
pub struct RelayRuntime {
    config: RelayConfig,
    context: Arc<SyncContext>,
    repository: Arc<InMemoryRepository>,
    connections: Arc<ConnectionManager>,
    scheduler: Arc<Scheduler>,
    events: EventReceiver,
}

impl RelayRuntime {
    /// Build with the real HTTP transport.
    pub fn build(config: RelayConfig) -> Result<Self, StartupError> {
        let transport = Arc::new(HttpTransport::new(&config.timeouts)?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: RelayConfig, transport: Arc<dyn Transport>) -> Self {
        let coordinator = Arc::new(SyncCoordinator::from_config(&config, transport));
        let repository = Arc::new(InMemoryRepository::new());
        let (bus, events) = EventBus::channel(config.distribution.event_bus_capacity);

        let context = Arc::new(SyncContext::new(
            coordinator,
            CacheLayer::new(),
            repository.clone(),
            bus,
        ));

        let registry = Arc::new(SubscriptionRegistry::new());
        let connections = Arc::new(ConnectionManager::new(
            registry,
            config.listener.max_connections,
        ));
        let scheduler = Arc::new(Scheduler::new(context.clone()));

        Self {
            config,
            context,
            repository,
            connections,
            scheduler,
            events,
        }
    }

    pub fn context(&self) -> &Arc<SyncContext> {
        &self.context
    }

    pub fn repository(&self) -> &Arc<InMemoryRepository> {
        &self.repository
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    fn app_state(&self) -> AppState {
        let repository: Arc<dyn Repository> = self.repository.clone();
        AppState {
            connections: self.connections.clone(),
            handler: Arc::new(MessageHandler::new(
                self.connections.registry().clone(),
                repository,
            )),
            coordinator: self.context.coordinator.clone(),
            cache: self.context.cache.clone(),
            scheduler: self.scheduler.clone(),
            admin: self.config.admin.clone(),
            started_at: Instant::now(),
        }
    }

    /// Run until `shutdown` is triggered (or the listener fails).
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), StartupError> {
        let persistence = self.config.cache.persistence_path.as_ref().map(PathBuf::from);
        if let Some(path) = &persistence {
            if let Err(e) = load_from_file(&self.context.cache, path) {
                tracing::warn!(path = %path.display(), error = %e, "Could not restore cache, starting empty");
            }
        }

        let state = self.app_state();
        let server = HttpServer::new(&self.config, state);
        let Self {
            config,
            context,
            connections,
            scheduler,
            events,
            ..
        } = self;

        let dispatcher = BroadcastDispatcher::new(connections.registry().clone(), connections.clone());
        let dispatcher_task = tokio::spawn(dispatcher.run(events, shutdown.subscribe()));

        let heartbeat = HeartbeatMonitor::new(
            connections.clone(),
            Duration::from_secs(config.distribution.heartbeat_secs),
        );
        let heartbeat_task = tokio::spawn(heartbeat.run(shutdown.subscribe()));

        let cadences = cadences(&config.sync);
        if config.sync.initial_sync {
            initial_sync(&context, &cadences).await;
        }
        if config.sync.enabled && !shutdown.is_triggered() {
            for cadence in &cadences {
                scheduler.start_cadence(cadence);
            }
        }

        let served = server.run(listener, shutdown.subscribe()).await;

        tracing::info!("Shutting down");
        shutdown.trigger();
        scheduler.stop_all();
        let closed = connections.close_all();
        tracing::info!(closed, "Closed subscriber connections");
        let _ = dispatcher_task.await;
        let _ = heartbeat_task.await;

        if let Some(path) = &persistence {
            if let Err(e) = save_to_file(&context.cache, path) {
                tracing::error!(path = %path.display(), error = %e, "Failed to persist cache");
            }
        }

        served?;
        tracing::info!("Shutdown complete");
        Ok(())
    }
}

/// Run every worker once, reusing unexpired cache entries. Failures are
/// logged per worker.
async fn initial_sync(ctx: &SyncContext, cadences: &[Cadence]) {
    tracing::info!("Initial sync starting");
    let ctx = &ctx.warm_start();
    for name in INITIAL_SYNC_ORDER {
        let Some(cadence) = cadences.iter().find(|c| c.name == name) else {
            continue;
        };
        match cadence.worker.run(ctx).await {
            Ok(report) => tracing::info!(
                cadence = name,
                fresh = report.fresh,
                stale = report.stale,
                failed = report.failed,
                "Initial sync step complete"
            ),
            Err(e) => tracing::warn!(cadence = name, error = %e, "Initial sync step failed"),
        }
    }
    tracing::info!("Initial sync finished");
}
