//! Per-connection request handling for the subscriber protocol.
//!
//! # Responsibilities
//! - Turn one inbound text frame into zero or more replies
//! - Maintain the connection's filters in the [`SubscriptionRegistry`]
//! - Answer read-only queries from the record store
//!
//! Nothing here touches the socket. A malformed frame produces exactly one
//! `error` reply and leaves the connection and its filters untouched.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::distribution::protocol::{
    parse_client_message, timestamp, ClientMessage, FilterFields, ProtocolError, ServerMessage,
    UNSUBSCRIBE_ALL,
};
use crate::distribution::registry::{FilterKey, SubscriptionRegistry};
use crate::net::connection::ConnectionId;
use crate::observability::metrics;
use crate::sync::records::Game;
use crate::sync::repository::{Repository, StoreError};

pub struct MessageHandler {
    registry: Arc<SubscriptionRegistry>,
    repository: Arc<dyn Repository>,
}

impl MessageHandler {
    pub fn new(registry: Arc<SubscriptionRegistry>, repository: Arc<dyn Repository>) -> Self {
        Self { registry, repository }
    }

    /// Handle one text frame from `id`.
    pub async fn handle_text(&self, id: ConnectionId, text: &str) -> Vec<ServerMessage> {
        match parse_client_message(text) {
            Ok(message) => self.handle(id, message).await,
            Err(e) => vec![self.protocol_error(id, e)],
        }
    }

    /// Report a protocol violation to the offending connection only.
    pub fn protocol_error(&self, id: ConnectionId, error: ProtocolError) -> ServerMessage {
        metrics::record_protocol_error();
        tracing::debug!(connection_id = %id, error = %error, "Protocol error");
        ServerMessage::error(error.to_string())
    }

    pub async fn handle(&self, id: ConnectionId, message: ClientMessage) -> Vec<ServerMessage> {
        let result = match message {
            ClientMessage::Subscribe(fields) => self.subscribe(id, fields).await,
            ClientMessage::Unsubscribe(fields) => Ok(self.unsubscribe(id, fields)),
            ClientMessage::GetLiveGames => self.live_games().await.map(|m| vec![m]),
            ClientMessage::GetGameDetails { game_id } => {
                self.game_details(&game_id).await.map(|m| vec![m])
            }
            ClientMessage::Ping => Ok(vec![ServerMessage::Pong]),
        };

        result.unwrap_or_else(|e| {
            tracing::warn!(connection_id = %id, error = %e, "Record store query failed");
            vec![ServerMessage::error("Internal error")]
        })
    }

    async fn subscribe(
        &self,
        id: ConnectionId,
        fields: FilterFields,
    ) -> Result<Vec<ServerMessage>, StoreError> {
        if fields.is_empty() {
            self.registry.add(id, FilterKey::All);
            return Ok(vec![ServerMessage::Subscribed {
                game_id: None,
                team: None,
                sport: None,
                games: None,
                message: "Subscribed to all games".into(),
            }]);
        }

        let mut replies = Vec::new();

        if let Some(game_id) = fields.game_id {
            self.registry.add(id, FilterKey::game(game_id.clone()));
            let known = self.repository.game(&game_id).await?;
            replies.push(ServerMessage::Subscribed {
                game_id: Some(game_id.clone()),
                team: None,
                sport: None,
                games: None,
                message: format!("Subscribed to game {game_id}"),
            });
            if let Some(game) = known {
                replies.push(self.details_for(game).await?);
            }
        }

        if let Some(team) = fields.team {
            let games = self.repository.games_for_team(&team).await?;
            let count = self.expand(id, FilterKey::team(&team), &games);
            replies.push(ServerMessage::Subscribed {
                game_id: None,
                team: Some(team.clone()),
                sport: None,
                games: Some(count),
                message: format!("Subscribed to {count} {team} games"),
            });
        }

        if let Some(sport) = fields.sport {
            let games = self.repository.games_for_sport(&sport).await?;
            let count = self.expand(id, FilterKey::sport(&sport), &games);
            replies.push(ServerMessage::Subscribed {
                game_id: None,
                team: None,
                sport: Some(sport.clone()),
                games: Some(count),
                message: format!("Subscribed to {count} {sport} games"),
            });
        }

        Ok(replies)
    }

    /// Install the membership filter plus one game filter per currently known game.
    fn expand(&self, id: ConnectionId, membership: FilterKey, games: &[Game]) -> usize {
        self.registry
            .add_expanded(id, membership, games.iter().map(|g| g.id.clone()));
        games.len()
    }

    fn unsubscribe(&self, id: ConnectionId, fields: FilterFields) -> Vec<ServerMessage> {
        if fields.game_id.as_deref() == Some(UNSUBSCRIBE_ALL) {
            let removed = self.registry.clear(id);
            tracing::debug!(connection_id = %id, removed, "Cleared subscriptions");
            return vec![ServerMessage::Unsubscribed {
                game_id: Some(UNSUBSCRIBE_ALL.into()),
                team: None,
                sport: None,
                message: "Unsubscribed from all games".into(),
            }];
        }

        let mut replies = Vec::new();
        if let Some(game_id) = fields.game_id {
            self.registry.remove(id, &FilterKey::game(game_id.clone()));
            replies.push(ServerMessage::Unsubscribed {
                message: format!("Unsubscribed from game {game_id}"),
                game_id: Some(game_id),
                team: None,
                sport: None,
            });
        }
        if let Some(team) = fields.team {
            self.registry.remove(id, &FilterKey::team(&team));
            replies.push(ServerMessage::Unsubscribed {
                message: format!("Unsubscribed from {team}"),
                game_id: None,
                team: Some(team),
                sport: None,
            });
        }
        if let Some(sport) = fields.sport {
            self.registry.remove(id, &FilterKey::sport(&sport));
            replies.push(ServerMessage::Unsubscribed {
                message: format!("Unsubscribed from {sport}"),
                game_id: None,
                team: None,
                sport: Some(sport),
            });
        }
        replies
    }

    async fn live_games(&self) -> Result<ServerMessage, StoreError> {
        let mut games = self.repository.live_games().await?;
        games.sort_by(|a, b| a.game_date.cmp(&b.game_date).then_with(|| a.id.cmp(&b.id)));
        Ok(ServerMessage::LiveGames {
            games,
            timestamp: timestamp(),
        })
    }

    async fn game_details(&self, game_id: &str) -> Result<ServerMessage, StoreError> {
        match self.repository.game(game_id).await? {
            Some(game) => self.details_for(game).await,
            None => Ok(ServerMessage::error(format!("Game {game_id} not found"))),
        }
    }

    async fn details_for(&self, game: Game) -> Result<ServerMessage, StoreError> {
        let player_stats = self.repository.player_stats(&game.id).await?;
        let events: Vec<Value> = game
            .last_play
            .iter()
            .map(|play| json!({"type": "play", "description": play}))
            .collect();
        Ok(ServerMessage::GameDetails {
            game,
            events,
            player_stats,
            timestamp: timestamp(),
        })
    }
}
