use thiserror::Error;

pub mod command;
pub mod ids;
pub mod seat;

pub use command::{CommandEnvelope, Direction, LobbyCommand, parse_command};
pub use ids::{LobbyId, MoveId, ParticipantId};
pub use seat::{SEAT_CAPACITY, SeatRecord, SeatSnapshot};

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid message format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Empty message")]
    EmptyMessage,
}
