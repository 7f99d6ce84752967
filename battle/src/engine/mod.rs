//! Round-based two-player battle engine
//!
//! A [`BattleState`] is created from two frozen loadouts, started once, and
//! then advanced one [`tick`](BattleState::tick) at a time by whoever owns
//! the match. Each tick pops one move per side and resolves both against
//! the same pre-tick snapshot.

mod resolve;
mod rules;
mod state;

pub use resolve::{Progress, TickReport};
pub use rules::BattleRules;
pub use state::{BattleLog, BattleState, Phase};
