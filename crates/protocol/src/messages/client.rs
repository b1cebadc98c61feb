//! Client -> server messages.

use serde::{Deserialize, Serialize};

use crate::{Direction, ProtocolError};

/// Messages sent from a client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join the game with a display name and optional color.
    ///
    /// The color is carried as a raw string so the server can fall back
    /// to a random color when it is not a valid `#RRGGBB` value.
    Join {
        name: String,
        #[serde(default)]
        color: Option<String>,
    },

    /// Move one step in the given direction.
    Move { direction: Direction },

    /// Send a chat message to everyone.
    Chat { message: String },

    /// Request the server statistics surface.
    Stats,

    /// Liveness probe.
    Ping,
}

impl ClientMessage {
    /// Decode a JSON text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        if text.trim().is_empty() {
            return Err(ProtocolError::EmptyMessage);
        }
        Ok(serde_json::from_str(text)?)
    }

    /// Encode as a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_join() {
        let msg = ClientMessage::parse(r##"{"type":"join","name":"alice","color":"#FF0000"}"##)
            .unwrap();
        match msg {
            ClientMessage::Join { name, color } => {
                assert_eq!(name, "alice");
                assert_eq!(color.as_deref(), Some("#FF0000"));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn parse_move() {
        let msg = ClientMessage::parse(r#"{"type":"move","direction":"left"}"#).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::Move { direction: Direction::Left }
        ));
    }

    #[test]
    fn malformed_direction_is_an_error_not_a_panic() {
        let err = ClientMessage::parse(r#"{"type":"move","direction":"sideways"}"#);
        assert!(matches!(err, Err(ProtocolError::InvalidMessage(_))));
    }

    #[test]
    fn empty_frame_rejected() {
        assert!(matches!(
            ClientMessage::parse("  "),
            Err(ProtocolError::EmptyMessage)
        ));
    }
}
