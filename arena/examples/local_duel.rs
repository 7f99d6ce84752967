//! Local Duel Example
//!
//! Two participants share one in-memory lobby. Each gets a generated
//! loadout, nudges it, readies up, and the lobby plays the battle out
//! while an observer prints the log.
//!
//! Run with `RUST_LOG=quizpet_arena=debug` to see the lobby's own logging.
//! An optional argument names a JSON config file.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use quizpet_arena::{
    Arena, ArenaConfig, InMemoryLobbyStore, InMemoryProfileStore, Observer, PetProfile,
    StaticIdentity,
};
use quizpet_battle::{BattleRules, BattleState, MoveCatalog, Outcome, TickReport};
use quizpet_protocol::{Direction, LobbyId, ParticipantId};
use tracing::Level;
use tracing_subscriber::EnvFilter;

struct Commentator;

#[async_trait]
impl Observer for Commentator {
    async fn on_battle_started(&mut self, battle: &BattleState) {
        for line in battle.log.iter() {
            println!("{}", line);
        }
    }

    async fn on_tick(&mut self, report: &TickReport) {
        for line in &report.lines {
            println!("{}", line);
        }
    }

    async fn on_finished(&mut self, outcome: Outcome) {
        match outcome.winner() {
            Some(side) => println!("{} wins!", side.label()),
            None => println!("Draw!"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ArenaConfig::from_path(path)?,
        None => ArenaConfig {
            tick_interval_ms: 200,
            rules: BattleRules {
                max_rounds: Some(10),
                ..BattleRules::default()
            },
            ..ArenaConfig::default()
        },
    };

    let profiles = Arc::new(InMemoryProfileStore::new());
    profiles.insert(
        ParticipantId::from("ada"),
        PetProfile {
            choice: Some(1),
            ..PetProfile::default()
        },
    );
    profiles.insert(
        ParticipantId::from("bo"),
        PetProfile {
            choice: Some(2),
            ..PetProfile::default()
        },
    );

    let arena = Arena::new(
        Arc::new(MoveCatalog::standard()),
        Arc::new(InMemoryLobbyStore::new()),
        profiles,
        config,
    )?;
    let lobby_id = LobbyId::from("study-hall");

    let ada = arena.session(&lobby_id, &StaticIdentity::signed_in("ada"))?;
    let bo = arena.session(&lobby_id, &StaticIdentity::signed_in("bo"))?;

    let mut pump = ada.handle().subscribe();
    let commentary = tokio::spawn(async move { pump.run(&mut Commentator).await });

    ada.join().await?;
    bo.join().await?;

    println!("ada brings {:?}", ada.loadout().await?);
    println!("bo brings {:?}", bo.loadout().await?);

    ada.reorder(4, Direction::Up).await?;
    let swapped_in = bo.refresh(0).await?;
    println!("bo refreshed slot 0 into {}", swapped_in);

    ada.set_ready(true, None).await?;
    bo.set_ready(true, None).await?;

    let mut battle = ada.handle().observe_battle();
    battle
        .wait_for(|b| b.as_ref().is_some_and(|b| b.is_finished()))
        .await?;

    arena.shutdown();
    commentary.await??;
    Ok(())
}
