//! Move catalog, loadouts and the battle engine for quizpet.
//!
//! This crate holds every game rule and nothing async. The lobby layer in
//! `quizpet-arena` owns the tasks and timers and calls into it.
//!
//! # Overview
//!
//! ```text
//! quizpet-protocol (ids, seats, commands)
//!        │
//!        ▼
//! quizpet-battle (catalog + loadouts + engine) ← THIS CRATE
//!        │
//!        └─> quizpet-arena (lobbies, sessions, ticking)
//! ```
//!
//! # Main Types
//!
//! - [`MoveCatalog`] - Immutable table of move definitions
//! - [`LoadoutBuilder`] - Generates an affinity-biased loadout
//! - [`LoadoutDraft`] - Pre-battle editing (reorder, one refresh per cycle)
//! - [`BattleState`] - One match; advanced with [`BattleState::tick`]
//!
//! # Example Usage
//!
//! ```
//! use quizpet_battle::{BattleRules, BattleState, MoveCatalog, MoveId, Progress};
//!
//! let catalog = MoveCatalog::standard();
//! let mut battle = BattleState::new(
//!     vec![MoveId::from("plasma-bite")],
//!     vec![MoveId::from("nebula-pulse")],
//!     BattleRules {
//!         max_rounds: Some(3),
//!         ..BattleRules::default()
//!     },
//! );
//! battle.start();
//!
//! while let Some(report) = battle.tick(&catalog) {
//!     if let Progress::Finished(outcome) = report.progress {
//!         println!("{:?}", outcome);
//!     }
//! }
//! ```

pub mod catalog;
pub mod engine;
pub mod loadout;
pub mod types;

// Re-export main types at crate root for convenience
pub use catalog::MoveCatalog;
pub use engine::{BattleLog, BattleRules, BattleState, Phase, Progress, TickReport};
pub use loadout::{LoadoutBuilder, LoadoutDraft, LoadoutError, pet_affinity, resolve_affinity};
pub use types::{Affinity, DamageTag, MoveDefinition, Outcome, Side, SideState, StatKind};

// Re-export commonly used protocol types
pub use quizpet_protocol::{Direction, MoveId, ParticipantId};
