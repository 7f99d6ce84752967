//! Loadouts: the ordered move list a participant brings into a match

mod builder;
mod draft;

pub use builder::{
    GENERATED_LOADOUT_SIZE, LoadoutBuilder, OFF_TAG_MOVES, PRIMARY_MOVES, pet_affinity,
    resolve_affinity,
};
pub use draft::{LoadoutDraft, LoadoutError};
