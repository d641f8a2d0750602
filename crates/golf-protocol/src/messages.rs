//! Message types for the golf protocol.
//!
//! Both directions are closed tagged unions, serialized with a `"type"` tag so
//! the same structure travels as JSON text or as MessagePack.

use serde::{Deserialize, Serialize};

/// Identifier of a game owned by the game service.
pub type GameId = i64;

/// Error codes carried by [`OutboundResponse::Error`].
pub mod error_codes {
    /// The inbound payload could not be decoded.
    pub const MALFORMED_MESSAGE: u16 = 1001;
    /// The game service rejected the requested action.
    pub const GAME_ACTION_FAILED: u16 = 2001;
}

/// Opaque game state produced by the game service.
///
/// The server forwards snapshots to clients without looking inside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameSnapshot(pub serde_json::Value);

impl GameSnapshot {
    /// Wrap a raw JSON value.
    #[must_use]
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Borrow the underlying value.
    #[must_use]
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Opaque user state produced by the user service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserSnapshot(pub serde_json::Value);

impl UserSnapshot {
    /// Wrap a raw JSON value.
    #[must_use]
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Borrow the underlying value.
    #[must_use]
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// A message sent by a client.
///
/// Well-formed messages with an unrecognised tag decode to
/// [`InboundMessage::Unknown`] so newer clients do not break older servers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    /// Create a new game owned by the sending session.
    #[serde(rename = "createGame")]
    CreateGame,

    /// Start an existing game.
    #[serde(rename = "startGame")]
    StartGame {
        /// Game to start.
        #[serde(rename = "gameId")]
        game_id: GameId,
    },

    /// Any message type this server does not know about.
    #[serde(other)]
    Unknown,
}

impl InboundMessage {
    /// Short name used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            InboundMessage::CreateGame => "createGame",
            InboundMessage::StartGame { .. } => "startGame",
            InboundMessage::Unknown => "unknown",
        }
    }
}

/// A response pushed to one or more clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundResponse {
    /// Current state of a game.
    #[serde(rename = "game")]
    Game {
        /// Snapshot supplied by the game service.
        game: GameSnapshot,
    },

    /// Identity assigned to the receiving session.
    #[serde(rename = "user")]
    User {
        /// Snapshot supplied by the user service.
        user: UserSnapshot,
    },

    /// A request from the receiving session failed.
    #[serde(rename = "error")]
    Error {
        /// Error code, see [`error_codes`].
        code: u16,
        /// Human-readable error message.
        message: String,
    },
}

impl OutboundResponse {
    /// Create a game response.
    #[must_use]
    pub fn game(game: GameSnapshot) -> Self {
        OutboundResponse::Game { game }
    }

    /// Create a user response.
    #[must_use]
    pub fn user(user: UserSnapshot) -> Self {
        OutboundResponse::User { user }
    }

    /// Create an error response.
    #[must_use]
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        OutboundResponse::Error {
            code,
            message: message.into(),
        }
    }

    /// Short name used in logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundResponse::Game { .. } => "game",
            OutboundResponse::User { .. } => "user",
            OutboundResponse::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inbound_tags() {
        let create: InboundMessage = serde_json::from_str(r#"{"type":"createGame"}"#).unwrap();
        assert_eq!(create, InboundMessage::CreateGame);

        let start: InboundMessage =
            serde_json::from_str(r#"{"type":"startGame","gameId":7}"#).unwrap();
        assert_eq!(start, InboundMessage::StartGame { game_id: 7 });
        assert_eq!(start.kind(), "startGame");
    }

    #[test]
    fn test_unknown_tag_is_not_an_error() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"type":"discardCard","cardIndex":3}"#).unwrap();
        assert_eq!(msg, InboundMessage::Unknown);
    }

    #[test]
    fn test_start_game_requires_game_id() {
        assert!(serde_json::from_str::<InboundMessage>(r#"{"type":"startGame"}"#).is_err());
        assert!(serde_json::from_str::<InboundMessage>(r#"{"gameId":1}"#).is_err());
    }

    #[test]
    fn test_outbound_shape() {
        let response = OutboundResponse::game(GameSnapshot::new(json!({"id": 42})));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({"type": "game", "game": {"id": 42}}));

        let error = OutboundResponse::error(error_codes::GAME_ACTION_FAILED, "no such game");
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["code"], 2001);
    }
}
