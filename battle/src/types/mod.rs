//! Domain types for moves, sides and outcomes

mod moves;
mod side;

pub use moves::{Affinity, DamageTag, MoveDefinition, StatKind};
pub use side::{Outcome, Side, SideState};
