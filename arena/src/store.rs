//! Synchronized state channel: the stores a lobby reads, writes and watches
//!
//! A lobby never owns persistence. It writes seat changes through a
//! [`LobbyStore`], learns about changes made elsewhere through
//! [`LobbyStore::watch_seats`], and reads pet data from a [`ProfileStore`].
//! The in-memory implementations back the tests and the local demo.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use quizpet_battle::Affinity;
use quizpet_protocol::{LobbyId, MoveId, ParticipantId, SeatRecord, SeatSnapshot};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::StoreError;

/// Seat documents of every lobby
#[async_trait]
pub trait LobbyStore: Send + Sync {
    /// Insert or replace a participant's seat
    ///
    /// A new seat must only be created while the lobby has capacity;
    /// otherwise fail with [`StoreError::CapacityExceeded`].
    async fn upsert_seat(&self, lobby: &LobbyId, record: SeatRecord) -> Result<(), StoreError>;

    /// Remove a participant's seat; `Ok(false)` when there was none
    async fn remove_seat(
        &self,
        lobby: &LobbyId,
        participant: &ParticipantId,
    ) -> Result<bool, StoreError>;

    async fn read_seats(&self, lobby: &LobbyId) -> Result<SeatSnapshot, StoreError>;

    /// Push feed of seat snapshots for one lobby
    fn watch_seats(&self, lobby: &LobbyId) -> watch::Receiver<SeatSnapshot>;
}

/// A participant's pet as far as battles care
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetProfile {
    /// Which starter pet was picked
    #[serde(default)]
    pub choice: Option<u32>,

    /// Stored type affinity, if any
    #[serde(default)]
    pub affinity: Option<Affinity>,

    /// Saved moveset
    #[serde(default)]
    pub moves: Vec<MoveId>,
}

/// Per-participant pet data
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Profile of a participant; unknown participants get an empty profile
    async fn profile(&self, participant: &ParticipantId) -> Result<PetProfile, StoreError>;

    async fn get_loadout(&self, participant: &ParticipantId) -> Result<Vec<MoveId>, StoreError> {
        Ok(self.profile(participant).await?.moves)
    }

    async fn set_loadout(
        &self,
        participant: &ParticipantId,
        moves: Vec<MoveId>,
    ) -> Result<(), StoreError>;
}

// === Failure injection ===

/// Shared outage switch for the in-memory stores
#[derive(Debug, Default)]
struct Outage {
    offline: AtomicBool,
    fail_next: AtomicU32,
}

impl Outage {
    fn check(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store offline".into()));
        }
        let pending = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if pending.is_ok() {
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        Ok(())
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("store lock poisoned".into())
}

// === In-memory lobby store ===

/// Lobby store kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryLobbyStore {
    lobbies: Mutex<HashMap<LobbyId, watch::Sender<SeatSnapshot>>>,
    outage: Outage,
}

impl InMemoryLobbyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail until switched back
    pub fn set_offline(&self, offline: bool) {
        self.outage.offline.store(offline, Ordering::SeqCst);
    }

    /// Fail the next `count` read or write operations
    pub fn fail_next(&self, count: u32) {
        self.outage.fail_next.store(count, Ordering::SeqCst);
    }

    fn with_channel<T>(
        &self,
        lobby: &LobbyId,
        f: impl FnOnce(&watch::Sender<SeatSnapshot>) -> T,
    ) -> Result<T, StoreError> {
        let mut lobbies = self.lobbies.lock().map_err(|_| poisoned())?;
        let sender = lobbies
            .entry(lobby.clone())
            .or_insert_with(|| watch::channel(SeatSnapshot::new()).0);
        Ok(f(sender))
    }
}

#[async_trait]
impl LobbyStore for InMemoryLobbyStore {
    async fn upsert_seat(&self, lobby: &LobbyId, record: SeatRecord) -> Result<(), StoreError> {
        self.outage.check()?;
        let accepted = self.with_channel(lobby, |sender| {
            let mut accepted = true;
            sender.send_if_modified(|snapshot| {
                if snapshot.get(&record.participant_id) == Some(&record) {
                    return false;
                }
                accepted = snapshot.upsert(record.clone());
                accepted
            });
            accepted
        })?;

        if accepted {
            Ok(())
        } else {
            Err(StoreError::CapacityExceeded(lobby.clone()))
        }
    }

    async fn remove_seat(
        &self,
        lobby: &LobbyId,
        participant: &ParticipantId,
    ) -> Result<bool, StoreError> {
        self.outage.check()?;
        self.with_channel(lobby, |sender| {
            let mut removed = false;
            sender.send_if_modified(|snapshot| {
                removed = snapshot.remove(participant).is_some();
                removed
            });
            removed
        })
    }

    async fn read_seats(&self, lobby: &LobbyId) -> Result<SeatSnapshot, StoreError> {
        self.outage.check()?;
        self.with_channel(lobby, |sender| sender.borrow().clone())
    }

    fn watch_seats(&self, lobby: &LobbyId) -> watch::Receiver<SeatSnapshot> {
        match self.with_channel(lobby, |sender| sender.subscribe()) {
            Ok(rx) => rx,
            // A closed feed: the lobby keeps its own view
            Err(_) => watch::channel(SeatSnapshot::new()).1,
        }
    }
}

// === In-memory profile store ===

/// Profile store kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: Mutex<HashMap<ParticipantId, PetProfile>>,
    outage: Outage,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a profile, replacing any existing one
    pub fn insert(&self, participant: ParticipantId, profile: PetProfile) {
        if let Ok(mut profiles) = self.profiles.lock() {
            profiles.insert(participant, profile);
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.outage.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn profile(&self, participant: &ParticipantId) -> Result<PetProfile, StoreError> {
        self.outage.check()?;
        let profiles = self.profiles.lock().map_err(|_| poisoned())?;
        Ok(profiles.get(participant).cloned().unwrap_or_default())
    }

    async fn set_loadout(
        &self,
        participant: &ParticipantId,
        moves: Vec<MoveId>,
    ) -> Result<(), StoreError> {
        self.outage.check()?;
        let mut profiles = self.profiles.lock().map_err(|_| poisoned())?;
        profiles.entry(participant.clone()).or_default().moves = moves;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lobby() -> LobbyId {
        LobbyId::from("den")
    }

    fn seat(id: &str, ready: bool) -> SeatRecord {
        SeatRecord {
            ready,
            ..SeatRecord::new(ParticipantId::from(id))
        }
    }

    #[tokio::test]
    async fn test_upsert_enforces_capacity() {
        let store = InMemoryLobbyStore::new();
        store.upsert_seat(&lobby(), seat("ada", false)).await.unwrap();
        store.upsert_seat(&lobby(), seat("bo", false)).await.unwrap();

        let err = store.upsert_seat(&lobby(), seat("cy", false)).await;
        assert_eq!(err, Err(StoreError::CapacityExceeded(lobby())));

        // Existing seats can still be updated
        store.upsert_seat(&lobby(), seat("bo", true)).await.unwrap();
        let seats = store.read_seats(&lobby()).await.unwrap();
        assert_eq!(seats.len(), 2);
        assert!(seats.get(&ParticipantId::from("bo")).unwrap().ready);
    }

    #[tokio::test]
    async fn test_watch_sees_changes() {
        let store = InMemoryLobbyStore::new();
        let mut feed = store.watch_seats(&lobby());

        store.upsert_seat(&lobby(), seat("ada", false)).await.unwrap();
        feed.changed().await.unwrap();
        assert_eq!(feed.borrow_and_update().len(), 1);

        assert!(store.remove_seat(&lobby(), &ParticipantId::from("ada")).await.unwrap());
        feed.changed().await.unwrap();
        assert!(feed.borrow_and_update().is_empty());

        assert!(!store.remove_seat(&lobby(), &ParticipantId::from("ada")).await.unwrap());
    }

    #[tokio::test]
    async fn test_identical_upsert_does_not_notify() {
        let store = InMemoryLobbyStore::new();
        store.upsert_seat(&lobby(), seat("ada", false)).await.unwrap();
        let feed = store.watch_seats(&lobby());

        store.upsert_seat(&lobby(), seat("ada", false)).await.unwrap();
        assert!(!feed.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_outage_switches() {
        let store = InMemoryLobbyStore::new();
        store.set_offline(true);
        assert!(store.read_seats(&lobby()).await.is_err());
        store.set_offline(false);

        store.fail_next(1);
        assert!(store.read_seats(&lobby()).await.is_err());
        assert!(store.read_seats(&lobby()).await.is_ok());
    }

    #[tokio::test]
    async fn test_profile_store_defaults_and_saves() {
        let store = InMemoryProfileStore::new();
        let ada = ParticipantId::from("ada");

        assert_eq!(store.get_loadout(&ada).await.unwrap(), Vec::<MoveId>::new());

        store.insert(
            ada.clone(),
            PetProfile {
                choice: Some(2),
                ..PetProfile::default()
            },
        );
        store
            .set_loadout(&ada, vec![MoveId::from("warp-feint")])
            .await
            .unwrap();

        let profile = store.profile(&ada).await.unwrap();
        assert_eq!(profile.choice, Some(2));
        assert_eq!(profile.moves, vec![MoveId::from("warp-feint")]);
    }
}
