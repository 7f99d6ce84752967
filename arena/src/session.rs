use quizpet_battle::MoveId;
use quizpet_protocol::{Direction, ParticipantId};

use crate::error::ArenaError;
use crate::identity::Identity;
use crate::lobby::LobbyHandle;

/// One signed-in participant's view of a lobby
///
/// Dropping the session leaves the seat, the same as navigating away.
pub struct Session {
    handle: LobbyHandle,
    participant: ParticipantId,
}

impl Session {
    pub(crate) fn new(handle: LobbyHandle, identity: &dyn Identity) -> Result<Self, ArenaError> {
        let participant = identity
            .current_participant()
            .ok_or(ArenaError::NotSignedIn)?;
        Ok(Self {
            handle,
            participant,
        })
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub fn handle(&self) -> &LobbyHandle {
        &self.handle
    }

    pub async fn join(&self) -> Result<bool, ArenaError> {
        self.handle.join(&self.participant).await
    }

    pub async fn leave(&self) -> Result<bool, ArenaError> {
        self.handle.leave(&self.participant).await
    }

    pub async fn set_ready(
        &self,
        ready: bool,
        loadout: Option<Vec<MoveId>>,
    ) -> Result<(), ArenaError> {
        self.handle.set_ready(&self.participant, ready, loadout).await
    }

    pub async fn reorder(&self, index: usize, direction: Direction) -> Result<Vec<MoveId>, ArenaError> {
        self.handle.reorder(&self.participant, index, direction).await
    }

    pub async fn refresh(&self, index: usize) -> Result<MoveId, ArenaError> {
        self.handle.refresh(&self.participant, index).await
    }

    pub async fn loadout(&self) -> Result<Vec<MoveId>, ArenaError> {
        self.handle.loadout(&self.participant).await
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        tracing::debug!(lobby = %self.handle.id(), participant = %self.participant, "Session dropped");
        self.handle.leave_detached(&self.participant);
    }
}
