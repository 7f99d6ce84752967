use std::collections::HashMap;
use std::sync::Arc;

use quizpet_battle::{
    BattleState, LoadoutBuilder, LoadoutDraft, MoveCatalog, MoveId, Progress, Side,
    resolve_affinity,
};
use quizpet_protocol::{Direction, LobbyCommand, LobbyId, ParticipantId, SeatRecord, SeatSnapshot};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::{CommandAck, LobbyEvent, LobbyView, Request};
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::retry::with_retry;
use crate::store::{LobbyStore, ProfileStore};

/// Senders an actor publishes through; the handle keeps the receivers
pub(crate) struct Outputs {
    pub view: watch::Sender<LobbyView>,
    pub seats: watch::Sender<SeatSnapshot>,
    pub battle: watch::Sender<Option<BattleState>>,
    pub events: broadcast::Sender<LobbyEvent>,
}

/// Sole owner of one lobby's seats, drafts and battle
pub(crate) struct LobbyActor {
    id: LobbyId,
    catalog: Arc<MoveCatalog>,
    lobby_store: Arc<dyn LobbyStore>,
    profile_store: Arc<dyn ProfileStore>,
    config: Arc<ArenaConfig>,

    requests: mpsc::UnboundedReceiver<Request>,
    seat_feed: watch::Receiver<SeatSnapshot>,
    outputs: Outputs,

    seats: SeatSnapshot,
    /// Pre-ready loadout edits, one per seated participant
    drafts: HashMap<ParticipantId, LoadoutDraft>,
    /// When each unready seat last became unready
    idle_since: HashMap<ParticipantId, Instant>,
    battle: Option<BattleState>,
    ticker: Interval,
    rng: StdRng,
}

impl LobbyActor {
    pub(crate) fn new(
        id: LobbyId,
        catalog: Arc<MoveCatalog>,
        lobby_store: Arc<dyn LobbyStore>,
        profile_store: Arc<dyn ProfileStore>,
        config: Arc<ArenaConfig>,
        requests: mpsc::UnboundedReceiver<Request>,
        outputs: Outputs,
    ) -> Self {
        let seat_feed = lobby_store.watch_seats(&id);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut ticker = tokio::time::interval(config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            id,
            catalog,
            lobby_store,
            profile_store,
            config,
            requests,
            seat_feed,
            outputs,
            seats: SeatSnapshot::new(),
            drafts: HashMap::new(),
            idle_since: HashMap::new(),
            battle: None,
            ticker,
            rng,
        }
    }

    /// Process requests, store notifications, ticks and idle deadlines
    /// until shut down or every handle is gone
    pub(crate) async fn run(mut self) {
        let id = self.id.clone();
        let initial = with_retry(&self.config.retry, "read_seats", || {
            self.lobby_store.read_seats(&id)
        })
        .await;
        match initial {
            Ok(snapshot) => self.reconcile(snapshot),
            Err(e) => tracing::warn!(lobby = %self.id, error = %e, "Could not read seats"),
        }
        self.seat_feed.borrow_and_update();
        self.publish();

        tracing::info!(lobby = %self.id, "Lobby opened");
        let mut feed_open = true;

        loop {
            let ticking = self.battle.as_ref().is_some_and(BattleState::needs_tick);
            let idle_deadline = self.next_idle_deadline();

            tokio::select! {
                request = self.requests.recv() => match request {
                    Some(Request::Shutdown) | None => break,
                    Some(request) => self.handle_request(request).await,
                },
                changed = self.seat_feed.changed(), if feed_open => match changed {
                    Ok(()) => {
                        let snapshot = self.seat_feed.borrow_and_update().clone();
                        self.reconcile(snapshot);
                    }
                    Err(_) => {
                        tracing::warn!(lobby = %self.id, "Seat feed closed");
                        feed_open = false;
                    }
                },
                _ = self.ticker.tick(), if ticking => self.on_tick(),
                _ = sleep_until(idle_deadline) => self.evict_idle().await,
            }
        }

        tracing::info!(lobby = %self.id, "Lobby closed");
        self.emit(LobbyEvent::Closed);
    }

    async fn handle_request(&mut self, request: Request) {
        match request {
            Request::Command {
                participant,
                command,
                reply,
            } => {
                let result = self.execute(participant, command).await;
                let _ = reply.send(result);
            }
            Request::Loadout { participant, reply } => {
                let _ = reply.send(self.draft_mut(&participant).map(|d| d.moves().to_vec()));
            }
            Request::Shutdown => {}
        }
    }

    async fn execute(
        &mut self,
        participant: ParticipantId,
        command: LobbyCommand,
    ) -> Result<CommandAck, ArenaError> {
        match command {
            LobbyCommand::Join => self.join(participant).await,
            LobbyCommand::Leave => self.leave(&participant).await,
            LobbyCommand::SetReady { ready, loadout } => {
                self.set_ready(participant, ready, loadout).await
            }
            LobbyCommand::Reorder { index, direction } => {
                self.reorder(&participant, index, direction)
            }
            LobbyCommand::Refresh { index } => self.refresh(&participant, index),
        }
    }

    // === Seat commands ===

    async fn join(&mut self, participant: ParticipantId) -> Result<CommandAck, ArenaError> {
        if self.seats.contains(&participant) {
            return Ok(CommandAck::AlreadySeated);
        }
        if self.seats.is_full() {
            return Err(ArenaError::SeatsFull);
        }

        let (moves, generated) = self.prepare_loadout(&participant).await?;
        let record = SeatRecord {
            participant_id: participant.clone(),
            ready: false,
            loadout: moves.clone(),
        };
        self.write_seat(record).await?;
        if generated {
            self.save_generated(&participant, &moves).await;
        }

        self.drafts.insert(participant.clone(), LoadoutDraft::new(moves));
        self.idle_since.insert(participant.clone(), Instant::now());
        tracing::info!(lobby = %self.id, participant = %participant, "Participant joined");

        if self.seats.is_full() {
            self.rearm_refresh();
        }
        self.seats_changed();
        Ok(CommandAck::Joined)
    }

    async fn leave(&mut self, participant: &ParticipantId) -> Result<CommandAck, ArenaError> {
        // The match ends with the departure even if the store is unreachable
        if self.seats.contains(participant) {
            self.clear_battle();
        }

        let lobby = self.id.clone();
        let removed = with_retry(&self.config.retry, "remove_seat", || {
            self.lobby_store.remove_seat(&lobby, participant)
        })
        .await;
        if let Err(e) = removed {
            self.hold_departed(participant);
            return Err(e.into());
        }

        self.drafts.remove(participant);
        self.idle_since.remove(participant);
        if self.seats.remove(participant).is_none() {
            return Ok(CommandAck::NotSeated);
        }

        tracing::info!(lobby = %self.id, participant = %participant, "Participant left");
        self.clear_battle();
        self.seats_changed();
        Ok(CommandAck::Left)
    }

    /// Keep a seat whose removal failed unready, so no battle starts with it
    /// and idle eviction retries the removal
    fn hold_departed(&mut self, participant: &ParticipantId) {
        let Some(seat) = self.seats.get_mut(participant) else {
            return;
        };
        tracing::warn!(
            lobby = %self.id,
            participant = %participant,
            "Seat removal failed; holding seat unready"
        );
        if seat.ready {
            seat.ready = false;
            self.idle_since.insert(participant.clone(), Instant::now());
            self.seats_changed();
        }
    }

    async fn set_ready(
        &mut self,
        participant: ParticipantId,
        ready: bool,
        loadout: Option<Vec<MoveId>>,
    ) -> Result<CommandAck, ArenaError> {
        let moves = match loadout {
            Some(moves) => moves,
            None => self.draft_mut(&participant)?.moves().to_vec(),
        };
        match self.seats.get(&participant) {
            None => return Err(ArenaError::NotASeatHolder(participant)),
            Some(seat) if seat.ready && ready && seat.loadout != moves => {
                return Err(ArenaError::LoadoutLocked);
            }
            Some(_) => {}
        }
        let record = SeatRecord {
            participant_id: participant.clone(),
            ready,
            loadout: moves.clone(),
        };
        self.write_seat(record).await?;

        let draft = self.draft_mut(&participant)?;
        draft.replace(moves);
        if !ready {
            draft.rearm_refresh();
        }

        if ready {
            self.idle_since.remove(&participant);
        } else {
            self.idle_since.insert(participant.clone(), Instant::now());
            self.clear_battle();
        }

        tracing::info!(lobby = %self.id, participant = %participant, ready, "Ready flag set");
        self.seats_changed();
        Ok(CommandAck::ReadySet { ready })
    }

    // === Loadout editing ===

    fn reorder(
        &mut self,
        participant: &ParticipantId,
        index: usize,
        direction: Direction,
    ) -> Result<CommandAck, ArenaError> {
        self.ensure_unlocked(participant)?;
        let draft = self.draft_mut(participant)?;
        let moved = draft.reorder(index, direction)?;
        Ok(CommandAck::Reordered {
            moves: draft.moves().to_vec(),
            moved,
        })
    }

    fn refresh(&mut self, participant: &ParticipantId, index: usize) -> Result<CommandAck, ArenaError> {
        self.ensure_unlocked(participant)?;
        let draft = draft_entry(&self.seats, &mut self.drafts, participant)?;
        let move_id = draft.refresh(index, &self.catalog, &mut self.rng)?;

        tracing::debug!(
            lobby = %self.id,
            participant = %participant,
            index,
            move_id = %move_id,
            "Move refreshed"
        );
        Ok(CommandAck::Refreshed { index, move_id })
    }

    fn ensure_unlocked(&self, participant: &ParticipantId) -> Result<(), ArenaError> {
        match self.seats.get(participant) {
            None => Err(ArenaError::NotASeatHolder(participant.clone())),
            Some(seat) if seat.ready => Err(ArenaError::LoadoutLocked),
            Some(_) => Ok(()),
        }
    }

    fn draft_mut(&mut self, participant: &ParticipantId) -> Result<&mut LoadoutDraft, ArenaError> {
        draft_entry(&self.seats, &mut self.drafts, participant)
    }

    fn rearm_refresh(&mut self) {
        for draft in self.drafts.values_mut() {
            draft.rearm_refresh();
        }
    }

    /// Saved moveset, or a freshly generated one (flagged `true`)
    async fn prepare_loadout(
        &mut self,
        participant: &ParticipantId,
    ) -> Result<(Vec<MoveId>, bool), ArenaError> {
        let store = Arc::clone(&self.profile_store);
        let profile =
            with_retry(&self.config.retry, "profile", || store.profile(participant)).await?;
        if !profile.moves.is_empty() {
            return Ok((profile.moves, false));
        }

        let affinity = resolve_affinity(profile.affinity, profile.choice);
        let moves = LoadoutBuilder::new(&self.catalog).build(affinity, &mut self.rng);
        tracing::info!(
            lobby = %self.id,
            participant = %participant,
            affinity = ?affinity,
            "Generated loadout"
        );
        Ok((moves, true))
    }

    /// Persist a generated loadout once its seat is taken
    ///
    /// The seat already carries the moves, so a failure here is logged
    /// and the next join generates again.
    async fn save_generated(&self, participant: &ParticipantId, moves: &[MoveId]) {
        let store = Arc::clone(&self.profile_store);
        let saved = with_retry(&self.config.retry, "set_loadout", || {
            store.set_loadout(participant, moves.to_vec())
        })
        .await;
        if let Err(e) = saved {
            tracing::warn!(
                lobby = %self.id,
                participant = %participant,
                error = %e,
                "Could not save generated loadout"
            );
        }
    }

    /// Persist a seat, then mirror it locally
    async fn write_seat(&mut self, record: SeatRecord) -> Result<(), ArenaError> {
        let lobby = self.id.clone();
        with_retry(&self.config.retry, "upsert_seat", || {
            self.lobby_store.upsert_seat(&lobby, record.clone())
        })
        .await?;

        if !self.seats.upsert(record) {
            return Err(ArenaError::SeatsFull);
        }
        Ok(())
    }

    // === Store notifications ===

    /// Adopt a seat snapshot observed on the store
    fn reconcile(&mut self, snapshot: SeatSnapshot) {
        if snapshot == self.seats {
            return;
        }
        tracing::debug!(lobby = %self.id, seats = snapshot.len(), "Seats changed on store");

        let was_full = self.seats.is_full();
        self.seats = snapshot;

        let seats = &self.seats;
        self.drafts.retain(|pid, _| seats.contains(pid));
        self.idle_since
            .retain(|pid, _| seats.get(pid).is_some_and(|s| !s.ready));
        let now = Instant::now();
        for seat in self.seats.seats.iter().filter(|s| !s.ready) {
            self.idle_since.entry(seat.participant_id.clone()).or_insert(now);
        }

        if !self.seats.both_ready() {
            self.clear_battle();
        }
        if self.seats.is_full() && !was_full {
            self.rearm_refresh();
        }
        self.seats_changed();
    }

    /// Publish seat changes and start a battle on the both-ready transition
    fn seats_changed(&mut self) {
        self.emit(LobbyEvent::SeatsChanged(self.seats.clone()));
        self.maybe_start_battle();
        self.publish();
    }

    // === Battle ===

    /// Start a battle once per both-ready transition
    fn maybe_start_battle(&mut self) {
        if self.battle.is_some() || !self.seats.both_ready() {
            return;
        }

        let loadout = |index: usize| {
            self.seats
                .seats
                .get(index)
                .map(|s| s.loadout.clone())
                .unwrap_or_default()
        };
        let mut battle = BattleState::capture(
            loadout(Side::First.index()),
            loadout(Side::Second.index()),
            &self.catalog,
            self.config.rules.clone(),
        );
        if !battle.start() {
            return;
        }

        tracing::info!(lobby = %self.id, "Battle started");
        self.ticker.reset();
        self.emit(LobbyEvent::BattleStarted(battle.clone()));
        if let Some(outcome) = battle.outcome {
            tracing::info!(lobby = %self.id, outcome = ?outcome, "Battle finished");
            self.emit(LobbyEvent::BattleFinished(outcome));
        }
        self.battle = Some(battle);
    }

    /// Drop the battle; an unfinished one counts as aborted
    fn clear_battle(&mut self) {
        let Some(battle) = self.battle.take() else {
            return;
        };
        if !battle.is_finished() {
            tracing::info!(lobby = %self.id, round = battle.round, "Battle aborted");
            self.emit(LobbyEvent::BattleAborted);
        }
        self.publish();
    }

    fn on_tick(&mut self) {
        let Some(battle) = self.battle.as_mut() else {
            return;
        };
        let Some(report) = battle.tick(&self.catalog) else {
            return;
        };

        tracing::debug!(
            lobby = %self.id,
            round = report.round,
            lines = report.lines.len(),
            "Tick"
        );
        let progress = report.progress;
        self.emit(LobbyEvent::Tick(report));

        match progress {
            Progress::Continue => {}
            Progress::NextRound(round) => {
                tracing::debug!(lobby = %self.id, round, "Round advanced");
                self.rearm_refresh();
                self.emit(LobbyEvent::RoundStarted(round));
            }
            Progress::Finished(outcome) => {
                tracing::info!(lobby = %self.id, outcome = ?outcome, "Battle finished");
                self.emit(LobbyEvent::BattleFinished(outcome));
            }
        }
        self.publish();
    }

    // === Idle abandonment ===

    fn next_idle_deadline(&self) -> Option<Instant> {
        let timeout = self.config.idle_timeout()?;
        self.idle_since.values().min().map(|since| *since + timeout)
    }

    async fn evict_idle(&mut self) {
        let Some(timeout) = self.config.idle_timeout() else {
            return;
        };
        let now = Instant::now();
        let expired: Vec<ParticipantId> = self
            .idle_since
            .iter()
            .filter(|(_, since)| **since + timeout <= now)
            .map(|(pid, _)| pid.clone())
            .collect();

        for participant in expired {
            tracing::warn!(
                lobby = %self.id,
                participant = %participant,
                "Evicting idle participant"
            );
            match self.leave(&participant).await {
                Ok(_) => self.emit(LobbyEvent::SeatEvicted(participant)),
                Err(e) => {
                    tracing::warn!(
                        lobby = %self.id,
                        participant = %participant,
                        error = %e,
                        "Eviction failed"
                    );
                    self.idle_since.insert(participant, Instant::now());
                }
            }
        }
    }

    // === Outputs ===

    fn emit(&self, event: LobbyEvent) {
        // No subscribers is fine
        let _ = self.outputs.events.send(event);
    }

    fn publish(&self) {
        let seats = &self.seats;
        let battle = &self.battle;

        self.outputs.seats.send_if_modified(|current| {
            if current == seats {
                return false;
            }
            *current = seats.clone();
            true
        });
        self.outputs.battle.send_if_modified(|current| {
            if current == battle {
                return false;
            }
            *current = battle.clone();
            true
        });
        self.outputs.view.send_if_modified(|view| {
            if &view.seats == seats && &view.battle == battle {
                return false;
            }
            view.seats = seats.clone();
            view.battle = battle.clone();
            true
        });
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// A participant's draft, created from their seat on first use
fn draft_entry<'a>(
    seats: &SeatSnapshot,
    drafts: &'a mut HashMap<ParticipantId, LoadoutDraft>,
    participant: &ParticipantId,
) -> Result<&'a mut LoadoutDraft, ArenaError> {
    let seat = seats
        .get(participant)
        .ok_or_else(|| ArenaError::NotASeatHolder(participant.clone()))?;
    Ok(drafts
        .entry(participant.clone())
        .or_insert_with(|| LoadoutDraft::new(seat.loadout.clone())))
}
