//! Two-seat battle lobbies for quizpet.
//!
//! Each lobby runs as one tokio task that owns its seats and its battle.
//! Participants talk to it through a [`LobbyHandle`] (or a [`Session`]
//! bound to an [`Identity`]); everyone else observes it through watch
//! channels or an [`EventPump`].
//!
//! # Example Usage
//!
//! ```ignore
//! let arena = Arena::new(
//!     Arc::new(MoveCatalog::standard()),
//!     Arc::new(InMemoryLobbyStore::new()),
//!     Arc::new(InMemoryProfileStore::new()),
//!     ArenaConfig::default(),
//! )?;
//!
//! let lobby = arena.lobby(&LobbyId::from("study-hall"))?;
//! lobby.join(&ParticipantId::from("ada")).await?;
//! lobby.set_ready(&ParticipantId::from("ada"), true, None).await?;
//! ```

pub mod config;
mod error;
mod identity;
mod lobby;
mod observer;
mod retry;
mod session;
pub mod store;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use quizpet_battle::MoveCatalog;
use quizpet_protocol::{CommandEnvelope, LobbyId, SeatSnapshot, parse_command};
use tokio::sync::{broadcast, mpsc, watch};

pub use config::{ArenaConfig, RetryPolicy};
pub use error::{ArenaError, StoreError};
pub use identity::{Identity, StaticIdentity};
pub use lobby::{CommandAck, LobbyEvent, LobbyHandle, LobbyView};
pub use observer::{EventPump, Observer};
pub use session::Session;
pub use store::{InMemoryLobbyStore, InMemoryProfileStore, LobbyStore, PetProfile, ProfileStore};

use lobby::LobbyActor;
use lobby::actor::Outputs;

/// Events buffered per subscriber before it starts lagging
const EVENT_CAPACITY: usize = 256;

/// Registry of running lobbies sharing one catalog, stores and config
pub struct Arena {
    catalog: Arc<MoveCatalog>,
    lobby_store: Arc<dyn LobbyStore>,
    profile_store: Arc<dyn ProfileStore>,
    config: Arc<ArenaConfig>,
    lobbies: Mutex<HashMap<LobbyId, LobbyHandle>>,
}

impl Arena {
    pub fn new(
        catalog: Arc<MoveCatalog>,
        lobby_store: Arc<dyn LobbyStore>,
        profile_store: Arc<dyn ProfileStore>,
        config: ArenaConfig,
    ) -> Result<Self> {
        config.validate().context("Invalid arena config")?;
        Ok(Self {
            catalog,
            lobby_store,
            profile_store,
            config: Arc::new(config),
            lobbies: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn catalog(&self) -> &MoveCatalog {
        &self.catalog
    }

    /// Handle to a lobby, starting its task on first use
    ///
    /// A lobby that was shut down is started again. Must be called from
    /// within a tokio runtime.
    pub fn lobby(&self, id: &LobbyId) -> Result<LobbyHandle, ArenaError> {
        let mut lobbies = self
            .lobbies
            .lock()
            .map_err(|_| ArenaError::LobbyClosed(id.clone()))?;

        if let Some(handle) = lobbies.get(id)
            && !handle.is_closed()
        {
            return Ok(handle.clone());
        }

        let handle = self.spawn_lobby(id.clone());
        lobbies.insert(id.clone(), handle.clone());
        Ok(handle)
    }

    /// A session for whoever `identity` says is signed in
    pub fn session(&self, id: &LobbyId, identity: &dyn Identity) -> Result<Session, ArenaError> {
        Session::new(self.lobby(id)?, identity)
    }

    /// Route a decoded command to its lobby
    pub async fn dispatch(&self, envelope: CommandEnvelope) -> Result<CommandAck, ArenaError> {
        let handle = self.lobby(&envelope.lobby_id)?;
        handle
            .dispatch(&envelope.participant_id, envelope.command)
            .await
    }

    /// Decode a JSON command and route it to its lobby
    pub async fn handle_message(&self, text: &str) -> Result<CommandAck> {
        let envelope = parse_command(text).context("Failed to decode lobby command")?;
        Ok(self.dispatch(envelope).await?)
    }

    /// Stop every running lobby task
    pub fn shutdown(&self) {
        if let Ok(mut lobbies) = self.lobbies.lock() {
            for (_, handle) in lobbies.drain() {
                let _ = handle.shutdown();
            }
        }
    }

    fn spawn_lobby(&self, id: LobbyId) -> LobbyHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(LobbyView {
            lobby_id: id.clone(),
            seats: SeatSnapshot::new(),
            battle: None,
        });
        let (seats_tx, seats_rx) = watch::channel(SeatSnapshot::new());
        let (battle_tx, battle_rx) = watch::channel(None);
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let actor = LobbyActor::new(
            id.clone(),
            Arc::clone(&self.catalog),
            Arc::clone(&self.lobby_store),
            Arc::clone(&self.profile_store),
            Arc::clone(&self.config),
            rx,
            Outputs {
                view: view_tx,
                seats: seats_tx,
                battle: battle_tx,
                events: events_tx.clone(),
            },
        );
        tokio::spawn(actor.run());
        tracing::debug!(lobby = %id, "Spawned lobby task");

        LobbyHandle::new(id, tx, view_rx, seats_rx, battle_rx, events_tx)
    }
}
