//! One authoritative task per lobby
//!
//! ```text
//!  LobbyHandle ──request──▶ ┌────────────┐ ──upsert/remove──▶ LobbyStore
//!  (clones, Session)        │ LobbyActor │ ◀──watch_seats────
//!        ▲                  │  seats     │
//!        │ watch / broadcast│  drafts    │ ◀──tick interval
//!        └──────────────────│  battle    │ ◀──idle deadline
//!                           └────────────┘
//! ```
//!
//! The actor is the only writer of seat and battle state for its lobby,
//! so the capacity check on join and the both-ready detection never race.

pub(crate) mod actor;
mod handle;

use quizpet_battle::{BattleState, MoveId, Outcome, TickReport};
use quizpet_protocol::{LobbyCommand, LobbyId, ParticipantId, SeatSnapshot};
use serde::Serialize;
use tokio::sync::oneshot;

use crate::error::ArenaError;

pub(crate) use actor::LobbyActor;
pub use handle::LobbyHandle;

/// Everything an observer needs to render a lobby
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LobbyView {
    pub lobby_id: LobbyId,
    pub seats: SeatSnapshot,
    /// Present from battle start until a seat leaves or unreadies
    pub battle: Option<BattleState>,
}

/// Something that happened in a lobby
#[derive(Debug, Clone, PartialEq)]
pub enum LobbyEvent {
    SeatsChanged(SeatSnapshot),
    BattleStarted(BattleState),
    Tick(TickReport),
    RoundStarted(u32),
    BattleFinished(Outcome),
    /// A seat left or unreadied before the battle finished
    BattleAborted,
    /// Seat removed after staying unready too long
    SeatEvicted(ParticipantId),
    Closed,
}

/// Successful result of a [`LobbyCommand`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAck {
    Joined,
    /// The participant already held a seat; nothing changed
    AlreadySeated,
    Left,
    NotSeated,
    ReadySet { ready: bool },
    Reordered { moves: Vec<MoveId>, moved: bool },
    Refreshed { index: usize, move_id: MoveId },
}

type Reply<T> = oneshot::Sender<Result<T, ArenaError>>;

pub(crate) enum Request {
    Command {
        participant: ParticipantId,
        command: LobbyCommand,
        reply: Reply<CommandAck>,
    },
    Loadout {
        participant: ParticipantId,
        reply: Reply<Vec<MoveId>>,
    },
    Shutdown,
}
