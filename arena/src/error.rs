use quizpet_battle::LoadoutError;
use quizpet_protocol::{LobbyId, ParticipantId};

/// Failure of the lobby store or profile store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached; retrying may succeed
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Conditional seat write rejected because both seats are taken
    #[error("Lobby {0} has no free seat")]
    CapacityExceeded(LobbyId),
}

impl StoreError {
    /// Whether a retry could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Errors surfaced by lobby operations
///
/// Every rejected command leaves the lobby state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    #[error("Both seats are occupied")]
    SeatsFull,

    #[error("Participant {0} does not hold a seat in this lobby")]
    NotASeatHolder(ParticipantId),

    #[error("Refresh already used this ready cycle")]
    RefreshAlreadyUsed,

    /// Loadout edits are only accepted while unready
    #[error("Loadout is locked while ready")]
    LoadoutLocked,

    #[error("Move index {index} out of range for loadout of {len}")]
    InvalidIndex { index: usize, len: usize },

    #[error("Channel unavailable: {0}")]
    ChannelUnavailable(String),

    #[error("No participant is signed in")]
    NotSignedIn,

    #[error("Lobby {0} is closed")]
    LobbyClosed(LobbyId),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

impl From<StoreError> for ArenaError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(reason) => ArenaError::ChannelUnavailable(reason),
            StoreError::CapacityExceeded(_) => ArenaError::SeatsFull,
        }
    }
}

impl From<LoadoutError> for ArenaError {
    fn from(err: LoadoutError) -> Self {
        match err {
            LoadoutError::OutOfBounds { index, len } => ArenaError::InvalidIndex { index, len },
            LoadoutError::RefreshAlreadyUsed => ArenaError::RefreshAlreadyUsed,
            LoadoutError::EmptyCatalog => ArenaError::InvalidCommand(err.to_string()),
        }
    }
}
