use anyhow::Result;
use async_trait::async_trait;
use quizpet_battle::{BattleState, Outcome, TickReport};
use quizpet_protocol::{ParticipantId, SeatSnapshot};
use tokio::sync::broadcast;

use crate::lobby::LobbyEvent;

/// Trait for reacting to lobby events.
///
/// All methods have default no-op implementations, so you only need to
/// implement the events you care about.
///
/// # Example
///
/// ```ignore
/// struct Scoreboard;
///
/// #[async_trait]
/// impl Observer for Scoreboard {
///     async fn on_finished(&mut self, outcome: Outcome) {
///         println!("{:?}", outcome);
///     }
/// }
/// ```
#[async_trait]
pub trait Observer: Send {
    /// Called when seat membership or a ready flag changes.
    async fn on_seats(&mut self, seats: &SeatSnapshot) {
        let _ = seats;
    }

    /// Called once per battle, after round 1 has been set up.
    async fn on_battle_started(&mut self, battle: &BattleState) {
        let _ = battle;
    }

    async fn on_tick(&mut self, report: &TickReport) {
        let _ = report;
    }

    async fn on_round_started(&mut self, round: u32) {
        let _ = round;
    }

    async fn on_finished(&mut self, outcome: Outcome) {
        let _ = outcome;
    }

    /// Called when a battle is torn down before it finished.
    async fn on_aborted(&mut self) {}

    async fn on_evicted(&mut self, participant: &ParticipantId) {
        let _ = participant;
    }

    /// Called once when the lobby task stops.
    async fn on_closed(&mut self) {}
}

/// Receives lobby events and dispatches them to an observer.
pub struct EventPump {
    events: broadcast::Receiver<LobbyEvent>,
}

impl EventPump {
    pub(crate) fn new(events: broadcast::Receiver<LobbyEvent>) -> Self {
        Self { events }
    }

    /// Run the event loop until the lobby closes.
    ///
    /// A slow observer that falls behind skips the missed events and keeps
    /// going; the watch channels on [`LobbyHandle`](crate::LobbyHandle)
    /// always hold the latest state.
    pub async fn run<O: Observer>(&mut self, observer: &mut O) -> Result<()> {
        loop {
            match self.events.recv().await {
                Ok(LobbyEvent::Closed) | Err(broadcast::error::RecvError::Closed) => {
                    observer.on_closed().await;
                    return Ok(());
                }
                Ok(event) => dispatch(observer, event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Observer lagged behind lobby events");
                }
            }
        }
    }

    /// Next event, or `None` once the lobby is gone
    pub async fn next_event(&mut self) -> Option<LobbyEvent> {
        loop {
            match self.events.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Dispatch a single event to the appropriate observer method
async fn dispatch<O: Observer>(observer: &mut O, event: LobbyEvent) {
    match event {
        LobbyEvent::SeatsChanged(seats) => observer.on_seats(&seats).await,
        LobbyEvent::BattleStarted(battle) => observer.on_battle_started(&battle).await,
        LobbyEvent::Tick(report) => observer.on_tick(&report).await,
        LobbyEvent::RoundStarted(round) => observer.on_round_started(round).await,
        LobbyEvent::BattleFinished(outcome) => observer.on_finished(outcome).await,
        LobbyEvent::BattleAborted => observer.on_aborted().await,
        LobbyEvent::SeatEvicted(participant) => observer.on_evicted(&participant).await,
        LobbyEvent::Closed => observer.on_closed().await,
    }
}
