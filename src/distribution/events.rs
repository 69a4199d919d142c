//! Change events flowing from sync workers to subscribers.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// What changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ScoreUpdate,
    LiveGameUpdate,
    GameStateChange,
}

impl EventKind {
    /// Wire name, also used as the outgoing message `type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ScoreUpdate => "scoreUpdate",
            EventKind::LiveGameUpdate => "liveGameUpdate",
            EventKind::GameStateChange => "gameStateChange",
        }
    }
}

/// One change to one game. Consumed once by the dispatcher, never persisted.
#[derive(Debug, Clone)]
pub struct LiveUpdateEvent {
    pub kind: EventKind,
    pub game_id: String,
    /// Sport label of the game, matched against sport filters.
    pub sport: Option<String>,
    /// Home and away team names, matched against team filters.
    pub teams: Vec<String>,
    pub payload: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl LiveUpdateEvent {
    pub fn new(kind: EventKind, game_id: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            kind,
            game_id: game_id.into(),
            sport: None,
            teams: Vec::new(),
            payload,
            timestamp: Utc::now(),
        }
    }

    pub fn with_sport(mut self, sport: impl Into<String>) -> Self {
        self.sport = Some(sport.into());
        self
    }

    pub fn with_teams<I, S>(mut self, teams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.teams = teams.into_iter().map(Into::into).collect();
        self
    }

    /// `{"type": kind, "gameId": id, ...payload, "timestamp": rfc3339}`
    pub fn to_message(&self) -> Value {
        let mut message = Map::with_capacity(self.payload.len() + 3);
        message.insert("type".into(), Value::from(self.kind.as_str()));
        message.insert("gameId".into(), Value::from(self.game_id.clone()));
        for (k, v) in &self.payload {
            if k != "type" && k != "gameId" {
                message.insert(k.clone(), v.clone());
            }
        }
        message.insert(
            "timestamp".into(),
            Value::from(self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        Value::Object(message)
    }
}
