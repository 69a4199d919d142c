//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use sync_relay::config::{RelayConfig, SourceConfig};
use sync_relay::lifecycle::{RelayRuntime, Shutdown};
use sync_relay::sync::records::Game;
use sync_relay::sync::{InMemoryRepository, SyncContext};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A raw-TCP HTTP upstream whose answers are chosen per request path.
pub struct MockUpstream {
    pub addr: SocketAddr,
    hits: Arc<AtomicU32>,
}

impl MockUpstream {
    /// `respond` gets the request target (path and query) and the zero-based
    /// request number, and returns status and body.
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(&str, u32) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicU32::new(0));
        let respond = Arc::new(respond);

        let counter = hits.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let respond = respond.clone();
                let counter = counter.clone();
                tokio::spawn(async move {
                    let Some(target) = read_request_target(&mut socket).await else {
                        return;
                    };
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    let (status, body) = respond(&target, n);
                    let response = format!(
                        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        reason(status),
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { addr, hits }
    }

    /// Always answer with the same status and body.
    pub async fn fixed(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::start(move |_, _| (status, body.clone())).await
    }

    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

async fn read_request_target(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let head = String::from_utf8_lossy(&buf);
    head.lines().next()?.split_whitespace().nth(1).map(str::to_string)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// A config with both sources pointed at `upstream`, fast retries, and no
/// background syncing.
pub fn relay_config(upstream: &MockUpstream) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.sources = ["mlb", "espn"]
        .into_iter()
        .map(|name| SourceConfig {
            name: name.into(),
            base_url: upstream.base_url(),
            max_calls: 100,
            window_secs: 60,
            headers: Default::default(),
        })
        .collect();
    config.retries.base_delay_ms = 10;
    config.retries.max_delay_ms = 50;
    config.timeouts.request_secs = 2;
    config.sync.initial_sync = false;
    config.sync.enabled = false;
    config.sync.espn_leagues.clear();
    config
}

/// A relay running on an ephemeral port.
pub struct RunningRelay {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub repository: Arc<InMemoryRepository>,
    pub context: Arc<SyncContext>,
    pub task: JoinHandle<()>,
}

impl RunningRelay {
    pub async fn start(config: RelayConfig) -> Self {
        let runtime = RelayRuntime::build(config).unwrap();
        let repository = runtime.repository().clone();
        let context = runtime.context().clone();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();

        let run_shutdown = shutdown.clone();
        let task = tokio::spawn(async move {
            runtime.run(listener, run_shutdown).await.unwrap();
        });

        Self {
            addr,
            shutdown,
            repository,
            context,
            task,
        }
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn connect(&self) -> WsClient {
        let (ws, _) = connect_async(format!("ws://{}/ws", self.addr)).await.unwrap();
        ws
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(10), self.task)
            .await
            .expect("relay did not stop")
            .unwrap();
    }
}

pub async fn send_json(ws: &mut WsClient, value: Value) {
    ws.send(Message::Text(value.to_string().into())).await.unwrap();
}

/// Next text frame as JSON, failing after two seconds.
pub async fn next_json(ws: &mut WsClient) -> Value {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return serde_json::from_str(text.as_str()).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("socket ended: {other:?}"),
            }
        }
    })
    .await
    .expect("no message within timeout")
}

/// True if no text frame arrives within `wait`.
pub async fn stays_quiet(ws: &mut WsClient, wait: Duration) -> bool {
    tokio::time::timeout(wait, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(_))) => return,
                Some(Ok(_)) => continue,
                _ => std::future::pending::<()>().await,
            }
        }
    })
    .await
    .is_err()
}

pub fn game(id: &str, sport: &str, home: &str, away: &str, live: bool) -> Game {
    Game {
        id: id.to_string(),
        source: "mlb".to_string(),
        sport: sport.to_string(),
        home_team_id: format!("{id}-h"),
        home_team: home.to_string(),
        away_team_id: format!("{id}-a"),
        away_team: away.to_string(),
        game_date: "2024-07-04T23:05:00Z".to_string(),
        status: if live { "Live" } else { "Preview" }.to_string(),
        live,
        home_score: Some(0),
        away_score: Some(0),
        period: None,
        time_remaining: None,
        inning_state: None,
        last_play: None,
    }
}

/// An MLB schedule payload with one game.
pub fn mlb_schedule(game_pk: u64, status: &str, home: u32, away: u32) -> String {
    serde_json::json!({
        "dates": [{
            "games": [{
                "gamePk": game_pk,
                "gameDate": "2024-07-04T23:05:00Z",
                "status": {"abstractGameState": status},
                "teams": {
                    "home": {"team": {"id": 138, "name": "St. Louis Cardinals"}, "score": home},
                    "away": {"team": {"id": 112, "name": "Chicago Cubs"}, "score": away}
                }
            }]
        }]
    })
    .to_string()
}

pub fn mlb_teams() -> String {
    serde_json::json!({
        "teams": [{
            "id": 138,
            "name": "St. Louis Cardinals",
            "league": {"name": "National League"},
            "division": {"name": "National League Central"},
            "venue": {"name": "Busch Stadium"}
        }]
    })
    .to_string()
}
