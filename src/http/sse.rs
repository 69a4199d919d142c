//! Server-Sent Events stream for clients without WebSocket support.
//!
//! `GET /events?gameId=..&team=..&sport=..` registers a one-way connection,
//! installs the filters named in the query (none means every game) and then
//! streams the same frames a socket subscriber would get. A `:heartbeat`
//! comment keeps idle streams open through proxies.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures_util::stream;
use serde::Deserialize;

use crate::distribution::{ClientMessage, FilterFields, ServerMessage};
use crate::http::server::AppState;
use crate::net::{ConnectionId, ConnectionManager, Outbound, Session};

const KEEP_ALIVE: Duration = Duration::from_secs(30);

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsQuery {
    pub game_id: Option<String>,
    pub team: Option<String>,
    pub sport: Option<String>,
}

impl From<EventsQuery> for FilterFields {
    fn from(query: EventsQuery) -> Self {
        let keep = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        FilterFields {
            game_id: keep(query.game_id),
            team: keep(query.team),
            sport: keep(query.sport),
        }
    }
}

/// Deregisters the stream once axum drops it (client gone or shutdown).
struct StreamGuard {
    id: ConnectionId,
    connections: Arc<ConnectionManager>,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.connections.deregister(self.id);
    }
}

pub async fn sse_handler(State(state): State<AppState>, Query(query): Query<EventsQuery>) -> Response {
    let Session { id, outbound, .. } = match state.connections.register_stream() {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(error = %e, "Rejecting event stream");
            return (StatusCode::SERVICE_UNAVAILABLE, Json(ServerMessage::error(e.to_string())))
                .into_response();
        }
    };

    state.connections.send(id, ServerMessage::connected(id).to_text());
    let replies = state
        .handler
        .handle(id, ClientMessage::Subscribe(query.into()))
        .await;
    for reply in replies {
        state.connections.send(id, reply.to_text());
    }

    let guard = StreamGuard {
        id,
        connections: state.connections.clone(),
    };
    let frames = stream::unfold((outbound, guard), |(mut outbound, guard)| async move {
        loop {
            match outbound.recv().await {
                Some(Outbound::Text(text)) => {
                    let event = Event::default().data(text);
                    return Some((Ok::<Event, Infallible>(event), (outbound, guard)));
                }
                Some(Outbound::Ping) => continue,
                Some(Outbound::Close) | None => return None,
            }
        }
    });

    Sse::new(frames)
        .keep_alive(KeepAlive::new().interval(KEEP_ALIVE).text("heartbeat"))
        .into_response()
}
