use quizpet_battle::{BattleState, MoveId};
use quizpet_protocol::{Direction, LobbyCommand, LobbyId, ParticipantId, SeatSnapshot};
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use super::{CommandAck, LobbyEvent, LobbyView, Request};
use crate::error::ArenaError;
use crate::observer::EventPump;

/// Cloneable handle to one lobby task
///
/// Commands are answered by the lobby task in arrival order. State is read
/// from the watch channels the task publishes to, so reads never wait on
/// the task.
#[derive(Clone)]
pub struct LobbyHandle {
    id: LobbyId,
    tx: mpsc::UnboundedSender<Request>,
    view: watch::Receiver<LobbyView>,
    seats: watch::Receiver<SeatSnapshot>,
    battle: watch::Receiver<Option<BattleState>>,
    events: broadcast::Sender<LobbyEvent>,
}

impl LobbyHandle {
    pub(crate) fn new(
        id: LobbyId,
        tx: mpsc::UnboundedSender<Request>,
        view: watch::Receiver<LobbyView>,
        seats: watch::Receiver<SeatSnapshot>,
        battle: watch::Receiver<Option<BattleState>>,
        events: broadcast::Sender<LobbyEvent>,
    ) -> Self {
        Self {
            id,
            tx,
            view,
            seats,
            battle,
            events,
        }
    }

    pub fn id(&self) -> &LobbyId {
        &self.id
    }

    /// Check if the lobby task has stopped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, request: Request) -> Result<(), ArenaError> {
        self.tx
            .send(request)
            .map_err(|_| ArenaError::LobbyClosed(self.id.clone()))
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, ArenaError>>) -> Request,
    ) -> Result<T, ArenaError> {
        let (reply, rx) = oneshot::channel();
        self.send(build(reply))?;
        rx.await
            .map_err(|_| ArenaError::LobbyClosed(self.id.clone()))?
    }

    /// Run any lobby command on behalf of `participant`
    pub async fn dispatch(
        &self,
        participant: &ParticipantId,
        command: LobbyCommand,
    ) -> Result<CommandAck, ArenaError> {
        self.request(|reply| Request::Command {
            participant: participant.clone(),
            command,
            reply,
        })
        .await
    }

    /// Take a free seat
    ///
    /// Returns `Ok(false)` when the participant was already seated. Fails
    /// with [`ArenaError::SeatsFull`] when both seats are taken.
    pub async fn join(&self, participant: &ParticipantId) -> Result<bool, ArenaError> {
        let ack = self.dispatch(participant, LobbyCommand::Join).await?;
        Ok(ack == CommandAck::Joined)
    }

    /// Give up a seat, aborting any battle in progress
    ///
    /// Returns `Ok(false)` when the participant held no seat.
    pub async fn leave(&self, participant: &ParticipantId) -> Result<bool, ArenaError> {
        let ack = self.dispatch(participant, LobbyCommand::Leave).await?;
        Ok(ack == CommandAck::Left)
    }

    /// Fire-and-forget leave used when a session goes away
    pub(crate) fn leave_detached(&self, participant: &ParticipantId) {
        let (reply, _) = oneshot::channel();
        let _ = self.send(Request::Command {
            participant: participant.clone(),
            command: LobbyCommand::Leave,
            reply,
        });
    }

    /// Set the ready flag, submitting `loadout` or the current draft
    pub async fn set_ready(
        &self,
        participant: &ParticipantId,
        ready: bool,
        loadout: Option<Vec<MoveId>>,
    ) -> Result<(), ArenaError> {
        self.dispatch(participant, LobbyCommand::SetReady { ready, loadout })
            .await
            .map(|_| ())
    }

    /// Swap a move with its neighbour; returns the new order
    pub async fn reorder(
        &self,
        participant: &ParticipantId,
        index: usize,
        direction: Direction,
    ) -> Result<Vec<MoveId>, ArenaError> {
        match self
            .dispatch(participant, LobbyCommand::Reorder { index, direction })
            .await?
        {
            CommandAck::Reordered { moves, .. } => Ok(moves),
            other => Err(unexpected(other)),
        }
    }

    /// Replace one move with a random catalog move, once per ready cycle
    pub async fn refresh(
        &self,
        participant: &ParticipantId,
        index: usize,
    ) -> Result<MoveId, ArenaError> {
        match self
            .dispatch(participant, LobbyCommand::Refresh { index })
            .await?
        {
            CommandAck::Refreshed { move_id, .. } => Ok(move_id),
            other => Err(unexpected(other)),
        }
    }

    /// The participant's current draft loadout
    pub async fn loadout(&self, participant: &ParticipantId) -> Result<Vec<MoveId>, ArenaError> {
        self.request(|reply| Request::Loadout {
            participant: participant.clone(),
            reply,
        })
        .await
    }

    pub fn observe(&self) -> watch::Receiver<LobbyView> {
        self.view.clone()
    }

    pub fn observe_seats(&self) -> watch::Receiver<SeatSnapshot> {
        self.seats.clone()
    }

    pub fn observe_battle(&self) -> watch::Receiver<Option<BattleState>> {
        self.battle.clone()
    }

    /// Event feed starting from now
    pub fn subscribe(&self) -> EventPump {
        EventPump::new(self.events.subscribe())
    }

    /// Stop the lobby task. Seats stay in the store.
    pub fn shutdown(&self) -> Result<(), ArenaError> {
        self.send(Request::Shutdown)
    }
}

fn unexpected(ack: CommandAck) -> ArenaError {
    ArenaError::InvalidCommand(format!("unexpected reply {:?}", ack))
}
