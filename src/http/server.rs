//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the Axum router: subscriber socket, event stream, health probe, admin API
//! - Wire up middleware (tracing, admin timeout and auth)
//! - Serve plain TCP or TLS until shutdown is signalled, closing subscriber
//!   connections first so long-lived responses let the drain finish

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin;
use crate::cache::CacheLayer;
use crate::config::{AdminConfig, RelayConfig, TlsConfig};
use crate::distribution::MessageHandler;
use crate::http::sse::sse_handler;
use crate::http::websocket::ws_handler;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::net::tls::load_tls_config;
use crate::net::ConnectionManager;
use crate::sync::Scheduler;
use crate::upstream::SyncCoordinator;

/// How long in-flight TLS requests get once shutdown starts.
const TLS_DRAIN: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub connections: Arc<ConnectionManager>,
    pub handler: Arc<MessageHandler>,
    pub coordinator: Arc<SyncCoordinator>,
    pub cache: CacheLayer,
    pub scheduler: Arc<Scheduler>,
    pub admin: AdminConfig,
    pub started_at: Instant,
}

/// HTTP server for subscribers and operators.
pub struct HttpServer {
    router: Router,
    tls: Option<TlsConfig>,
    connections: Arc<ConnectionManager>,
}

impl HttpServer {
    pub fn new(config: &RelayConfig, state: AppState) -> Self {
        Self {
            connections: state.connections.clone(),
            router: Self::build_router(config, state),
            tls: config.listener.tls.clone(),
        }
    }

    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/ws", get(ws_handler))
            .route("/events", get(sse_handler))
            .route("/health", get(health_handler));

        if config.admin.enabled {
            let admin_routes = admin::setup_admin_router(state.clone()).layer(TimeoutLayer::new(
                Duration::from_secs(config.timeouts.request_secs),
            ));
            router = router.merge(admin_routes);
        }

        router.with_state(state).layer(TraceLayer::new_for_http())
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: ShutdownSignal) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        let connections = self.connections;
        let drained = async move {
            shutdown.recv().await;
            let closed = connections.close_all();
            tracing::info!(closed, "Closed subscriber connections");
        };

        match self.tls {
            Some(tls) => {
                let tls_config =
                    load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?;
                let handle = axum_server::Handle::new();
                let signal_handle = handle.clone();
                tokio::spawn(async move {
                    drained.await;
                    signal_handle.graceful_shutdown(Some(TLS_DRAIN));
                });

                tracing::info!(address = %addr, "HTTPS server starting");
                axum_server::from_tcp_rustls(listener.into_std()?, tls_config)
                    .handle(handle)
                    .serve(self.router.into_make_service())
                    .await?;
            }
            None => {
                tracing::info!(address = %addr, "HTTP server starting");
                axum::serve(listener, self.router)
                    .with_graceful_shutdown(drained)
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub clients: usize,
    pub uptime: u64,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        clients: state.connections.count(),
        uptime: state.started_at.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Request, StatusCode,
    };
    use futures_util::StreamExt;
    use tower::ServiceExt;

    use crate::distribution::{EventBus, SubscriptionRegistry};
    use crate::sync::{InMemoryRepository, SyncContext};
    use crate::upstream::HttpTransport;

    fn state(config: &RelayConfig) -> AppState {
        let transport = Arc::new(HttpTransport::new(&config.timeouts).unwrap());
        let coordinator = Arc::new(SyncCoordinator::from_config(config, transport));
        let repository = Arc::new(InMemoryRepository::new());
        let (bus, _rx) = EventBus::channel(4);
        let cache = CacheLayer::new();
        let context = Arc::new(SyncContext::new(
            coordinator.clone(),
            cache.clone(),
            repository.clone(),
            bus,
        ));
        let registry = Arc::new(SubscriptionRegistry::new());
        AppState {
            connections: Arc::new(ConnectionManager::new(registry.clone(), 10)),
            handler: Arc::new(MessageHandler::new(registry, repository)),
            coordinator,
            cache,
            scheduler: Arc::new(Scheduler::new(context)),
            admin: config.admin.clone(),
            started_at: Instant::now(),
        }
    }

    fn config_with_admin() -> RelayConfig {
        let mut config = RelayConfig::default();
        config.admin.enabled = true;
        config.admin.api_key = "secret".into();
        config
    }

    #[tokio::test]
    async fn test_health_reports_clients() {
        let config = RelayConfig::default();
        let app = HttpServer::build_router(&config, state(&config));

        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body: serde_json::Value =
            serde_json::from_slice(&to_bytes(res.into_body(), 1024).await.unwrap()).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["clients"], 0);
    }

    #[tokio::test]
    async fn test_admin_disabled_by_default() {
        let config = RelayConfig::default();
        let app = HttpServer::build_router(&config, state(&config));
        let res = app
            .oneshot(Request::get("/admin/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_requires_bearer_token() {
        let config = config_with_admin();
        let app = HttpServer::build_router(&config, state(&config));

        let res = app
            .clone()
            .oneshot(
                Request::get("/admin/cache")
                    .header(AUTHORIZATION, "Bearer wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app
            .oneshot(
                Request::get("/admin/cadences")
                    .header(AUTHORIZATION, "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_event_stream_registers_and_greets() {
        let config = RelayConfig::default();
        let state = state(&config);
        let connections = state.connections.clone();
        let app = HttpServer::build_router(&config, state);

        let res = app
            .oneshot(Request::get("/events?gameId=42").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[CONTENT_TYPE], "text/event-stream");
        assert_eq!(connections.count(), 1);
        assert_eq!(connections.registry().subscription_count(), 1);

        let mut body = res.into_body().into_data_stream();
        let mut frames = Vec::new();
        for _ in 0..2 {
            let chunk = body.next().await.unwrap().unwrap();
            let text = String::from_utf8(chunk.to_vec()).unwrap();
            let data = text.trim().strip_prefix("data: ").unwrap().to_string();
            frames.push(serde_json::from_str::<serde_json::Value>(&data).unwrap());
        }
        assert_eq!(frames[0]["type"], "connected");
        assert_eq!(frames[1]["type"], "subscribed");
        assert_eq!(frames[1]["gameId"], "42");

        drop(body);
        assert_eq!(connections.count(), 0);
        assert_eq!(connections.registry().connection_count(), 0);
    }
}
