//! Subscriber wire protocol.
//!
//! Client messages are JSON objects discriminated by `"type"`. Parsing goes
//! through `serde_json::Value` first so a bad message can be classified
//! (unparsable, no type, unknown type, bad fields) and answered with a single
//! `error` message instead of closing the socket.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::sync::records::{Game, PlayerStat};

/// Wildcard accepted by `unsubscribe`.
pub const UNSUBSCRIBE_ALL: &str = "*";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterFields {
    pub game_id: Option<String>,
    pub team: Option<String>,
    pub sport: Option<String>,
}

impl FilterFields {
    pub fn is_empty(&self) -> bool {
        self.game_id.is_none() && self.team.is_none() && self.sport.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Subscribe(FilterFields),
    Unsubscribe(FilterFields),
    GetLiveGames,
    GetGameDetails { game_id: String },
    Ping,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Invalid message format")]
    InvalidJson,

    #[error("Invalid message format")]
    MissingType,

    #[error("Unknown message type: {0}")]
    UnknownType(String),

    #[error("Invalid {kind} message: {reason}")]
    InvalidFields { kind: &'static str, reason: String },

    #[error("Binary messages are not supported")]
    BinaryFrame,
}

/// Accepts strings and numbers (game ids arrive both ways); blank means absent.
fn id_field(obj: &Map<String, Value>, name: &str, kind: &'static str) -> Result<Option<String>, ProtocolError> {
    match obj.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(ProtocolError::InvalidFields {
            kind,
            reason: format!("'{name}' must be a string"),
        }),
    }
}

fn filter_fields(obj: &Map<String, Value>, kind: &'static str) -> Result<FilterFields, ProtocolError> {
    Ok(FilterFields {
        game_id: id_field(obj, "gameId", kind)?,
        team: id_field(obj, "team", kind)?,
        sport: id_field(obj, "sport", kind)?,
    })
}

pub fn parse_client_message(text: &str) -> Result<ClientMessage, ProtocolError> {
    let value: Value = serde_json::from_str(text).map_err(|_| ProtocolError::InvalidJson)?;
    let obj = value.as_object().ok_or(ProtocolError::InvalidJson)?;
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingType)?;

    match kind {
        "subscribe" => Ok(ClientMessage::Subscribe(filter_fields(obj, "subscribe")?)),
        "unsubscribe" => {
            let fields = filter_fields(obj, "unsubscribe")?;
            if fields.is_empty() {
                return Err(ProtocolError::InvalidFields {
                    kind: "unsubscribe",
                    reason: "gameId, team or sport is required".into(),
                });
            }
            Ok(ClientMessage::Unsubscribe(fields))
        }
        "getLiveGames" => Ok(ClientMessage::GetLiveGames),
        "getGameDetails" => {
            let game_id = id_field(obj, "gameId", "getGameDetails")?.ok_or_else(|| ProtocolError::InvalidFields {
                kind: "getGameDetails",
                reason: "gameId is required".into(),
            })?;
            Ok(ClientMessage::GetGameDetails { game_id })
        }
        "ping" => Ok(ClientMessage::Ping),
        other => Err(ProtocolError::UnknownType(other.to_string())),
    }
}

/// RFC 3339 with millisecond precision, UTC.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Server → client messages (event messages are built by `LiveUpdateEvent`).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    Connection { client_id: String, timestamp: String },

    /// First frame on an event stream.
    #[serde(rename_all = "camelCase")]
    Connected { client_id: String, timestamp: String },

    #[serde(rename_all = "camelCase")]
    Subscribed {
        #[serde(skip_serializing_if = "Option::is_none")]
        game_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        team: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        sport: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        games: Option<usize>,
        message: String,
    },

    #[serde(rename_all = "camelCase")]
    Unsubscribed {
        #[serde(skip_serializing_if = "Option::is_none")]
        game_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        team: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        sport: Option<String>,
        message: String,
    },

    LiveGames { games: Vec<Game>, timestamp: String },

    #[serde(rename_all = "camelCase")]
    GameDetails {
        game: Game,
        events: Vec<Value>,
        player_stats: Vec<PlayerStat>,
        timestamp: String,
    },

    Error { message: String },

    Pong,
}

impl ServerMessage {
    pub fn connection(client_id: impl ToString) -> Self {
        ServerMessage::Connection {
            client_id: client_id.to_string(),
            timestamp: timestamp(),
        }
    }

    pub fn connected(client_id: impl ToString) -> Self {
        ServerMessage::Connected {
            client_id: client_id.to_string(),
            timestamp: timestamp(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    pub fn to_text(&self) -> String {
        match serde_json::to_string(self) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize server message");
                r#"{"type":"error","message":"Internal error"}"#.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_subscribe_variants() {
        assert_eq!(
            parse_client_message(r#"{"type":"subscribe","gameId":"12345"}"#).unwrap(),
            ClientMessage::Subscribe(FilterFields {
                game_id: Some("12345".into()),
                ..Default::default()
            })
        );
        assert_eq!(
            parse_client_message(r#"{"type":"subscribe","gameId":12345}"#).unwrap(),
            ClientMessage::Subscribe(FilterFields {
                game_id: Some("12345".into()),
                ..Default::default()
            })
        );
        assert_eq!(
            parse_client_message(r#"{"type":"subscribe"}"#).unwrap(),
            ClientMessage::Subscribe(FilterFields::default())
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_client_message("not json"), Err(ProtocolError::InvalidJson));
        assert_eq!(parse_client_message("[1,2]"), Err(ProtocolError::InvalidJson));
        assert_eq!(parse_client_message(r#"{"gameId":"1"}"#), Err(ProtocolError::MissingType));
        assert_eq!(
            parse_client_message(r#"{"type":"dance"}"#).unwrap_err().to_string(),
            "Unknown message type: dance"
        );
        assert!(matches!(
            parse_client_message(r#"{"type":"unsubscribe"}"#),
            Err(ProtocolError::InvalidFields { kind: "unsubscribe", .. })
        ));
        assert!(matches!(
            parse_client_message(r#"{"type":"subscribe","team":["a"]}"#),
            Err(ProtocolError::InvalidFields { .. })
        ));
        assert!(parse_client_message(r#"{"type":"getGameDetails"}"#).is_err());
    }

    #[test]
    fn test_server_message_shapes() {
        let msg: Value = serde_json::from_str(&ServerMessage::connection("abc").to_text()).unwrap();
        assert_eq!(msg["type"], "connection");
        assert_eq!(msg["clientId"], "abc");
        assert!(msg["timestamp"].is_string());

        let msg = serde_json::to_value(ServerMessage::connected("abc")).unwrap();
        assert_eq!(msg["type"], "connected");

        let msg = serde_json::to_value(ServerMessage::Subscribed {
            game_id: Some("1".into()),
            team: None,
            sport: None,
            games: None,
            message: "Subscribed to game 1".into(),
        })
        .unwrap();
        assert_eq!(
            msg,
            json!({"type": "subscribed", "gameId": "1", "message": "Subscribed to game 1"})
        );

        assert_eq!(serde_json::to_value(ServerMessage::Pong).unwrap(), json!({"type": "pong"}));
    }
}
