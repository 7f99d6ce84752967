//! Commands a presentation layer sends to a lobby

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ProtocolError;
use crate::ids::{LobbyId, MoveId, ParticipantId};

/// Direction for swapping a move with its neighbour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

/// Lobby operations, issued on behalf of one participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum LobbyCommand {
    /// Take a free seat
    Join,

    /// Vacate the seat (aborts a running battle)
    Leave,

    /// Signal (un)ready, optionally submitting a new move order
    SetReady {
        ready: bool,
        #[serde(default)]
        loadout: Option<Vec<MoveId>>,
    },

    /// Swap the move at `index` with its neighbour
    Reorder { index: usize, direction: Direction },

    /// Replace the move at `index` with a random catalog move (once per ready cycle)
    Refresh { index: usize },
}

/// A command addressed to a lobby
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub lobby_id: LobbyId,
    pub participant_id: ParticipantId,
    #[serde(flatten)]
    pub command: LobbyCommand,
}

impl CommandEnvelope {
    pub fn new(lobby_id: LobbyId, participant_id: ParticipantId, command: LobbyCommand) -> Self {
        Self {
            lobby_id,
            participant_id,
            command,
        }
    }

    /// Serialize to the JSON form accepted by [`parse_command`]
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to encode lobby command")
    }
}

/// Parse a JSON command envelope
pub fn parse_command(text: &str) -> Result<CommandEnvelope> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ProtocolError::EmptyMessage.into());
    }

    let envelope: CommandEnvelope = serde_json::from_str(text)
        .map_err(|e| ProtocolError::InvalidFormat(e.to_string()))?;

    if envelope.lobby_id.as_str().is_empty() {
        return Err(ProtocolError::MissingField("lobby_id".to_string()).into());
    }
    if envelope.participant_id.as_str().is_empty() {
        return Err(ProtocolError::MissingField("participant_id".to_string()).into());
    }

    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_join() {
        let envelope =
            parse_command(r#"{"lobby_id":"room-1","participant_id":"uid-1","command":"join"}"#)
                .unwrap();

        assert_eq!(envelope.lobby_id, LobbyId::from("room-1"));
        assert_eq!(envelope.command, LobbyCommand::Join);
    }

    #[test]
    fn test_parse_set_ready_without_loadout() {
        let envelope = parse_command(
            r#"{"lobby_id":"room-1","participant_id":"uid-1","command":"set_ready","ready":true}"#,
        )
        .unwrap();

        assert_eq!(
            envelope.command,
            LobbyCommand::SetReady {
                ready: true,
                loadout: None
            }
        );
    }

    #[test]
    fn test_reorder_survives_encoding() {
        let envelope = CommandEnvelope::new(
            LobbyId::from("room-1"),
            ParticipantId::from("uid-2"),
            LobbyCommand::Reorder {
                index: 3,
                direction: Direction::Up,
            },
        );
        let text = envelope.to_json().unwrap();
        assert!(text.contains("\"direction\":\"up\""));
        assert_eq!(parse_command(&text).unwrap(), envelope);
    }

    #[test]
    fn test_parse_empty() {
        let err = parse_command("   ").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProtocolError>(),
            Some(ProtocolError::EmptyMessage)
        ));
    }

    #[test]
    fn test_parse_missing_participant() {
        let err = parse_command(r#"{"lobby_id":"room-1","participant_id":"","command":"leave"}"#)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProtocolError>(),
            Some(ProtocolError::MissingField(_))
        ));
    }

    #[test]
    fn test_parse_unknown_command() {
        let result =
            parse_command(r#"{"lobby_id":"room-1","participant_id":"uid-1","command":"dance"}"#);
        assert!(result.is_err());
    }
}
