//! Generates a starting loadout for a pet that has never saved one

use quizpet_protocol::MoveId;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::catalog::MoveCatalog;
use crate::types::{Affinity, MoveDefinition};

/// Moves drawn from the pet's own affinity
pub const PRIMARY_MOVES: usize = 4;

/// Moves drawn from a different tag
pub const OFF_TAG_MOVES: usize = 1;

/// Length of a generated loadout
pub const GENERATED_LOADOUT_SIZE: usize = PRIMARY_MOVES + OFF_TAG_MOVES;

/// Affinity implied by the pet the participant picked
pub fn pet_affinity(pet_choice: u32) -> Affinity {
    match pet_choice {
        1 => Affinity::Elemental,
        2 => Affinity::Physical,
        _ => Affinity::Any,
    }
}

/// Resolve a pet's affinity: a stored non-`Any` value wins, then the pet
/// table, otherwise `Any`
pub fn resolve_affinity(stored: Option<Affinity>, pet_choice: Option<u32>) -> Affinity {
    match stored {
        Some(affinity) if affinity != Affinity::Any => affinity,
        _ => pet_choice.map(pet_affinity).unwrap_or(Affinity::Any),
    }
}

/// Builds five-move loadouts: four on-affinity moves plus one off-tag move
#[derive(Debug, Clone, Copy)]
pub struct LoadoutBuilder<'a> {
    catalog: &'a MoveCatalog,
}

impl<'a> LoadoutBuilder<'a> {
    pub fn new(catalog: &'a MoveCatalog) -> Self {
        Self { catalog }
    }

    /// Build a loadout for `affinity`
    ///
    /// With `Any` both pools are the whole catalog. When no move of
    /// another tag exists, the off-tag slot draws from the whole catalog.
    /// Pools smaller than the requested count are cycled after a shuffle,
    /// so repeats only appear once every pool entry has been used.
    pub fn build<R: Rng + ?Sized>(&self, affinity: Affinity, rng: &mut R) -> Vec<MoveId> {
        let primary_pool = self.catalog.sample(affinity, self.catalog.len(), rng);

        let mut off_pool = match affinity.tag() {
            Some(tag) => self.catalog.excluding_tag(tag),
            None => self.catalog.filter(Affinity::Any),
        };
        if off_pool.is_empty() {
            off_pool = self.catalog.filter(Affinity::Any);
        }

        off_pool.shuffle(rng);

        let mut moves = cycled(&primary_pool, PRIMARY_MOVES);
        moves.extend(cycled(&off_pool, OFF_TAG_MOVES));

        tracing::debug!(
            affinity = ?affinity,
            moves = moves.len(),
            "Generated loadout"
        );
        moves
    }
}

/// First `count` ids of an already shuffled pool, wrapping around when short
fn cycled(pool: &[&MoveDefinition], count: usize) -> Vec<MoveId> {
    if pool.is_empty() {
        return Vec::new();
    }
    (0..count).map(|i| pool[i % pool.len()].id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DamageTag, StatKind};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn tag_of(catalog: &MoveCatalog, id: &MoveId) -> DamageTag {
        catalog.lookup(id).unwrap().tag
    }

    #[test]
    fn test_resolve_affinity() {
        assert_eq!(
            resolve_affinity(Some(Affinity::Magic), Some(1)),
            Affinity::Magic
        );
        assert_eq!(
            resolve_affinity(Some(Affinity::Any), Some(1)),
            Affinity::Elemental
        );
        assert_eq!(resolve_affinity(None, Some(2)), Affinity::Physical);
        assert_eq!(resolve_affinity(None, Some(9)), Affinity::Any);
        assert_eq!(resolve_affinity(None, None), Affinity::Any);
    }

    #[test]
    fn test_build_physical() {
        let catalog = MoveCatalog::standard();
        let mut rng = StdRng::seed_from_u64(11);
        let moves = LoadoutBuilder::new(&catalog).build(Affinity::Physical, &mut rng);

        assert_eq!(moves.len(), GENERATED_LOADOUT_SIZE);
        for id in &moves[..PRIMARY_MOVES] {
            assert_eq!(tag_of(&catalog, id), DamageTag::Physical);
        }
        assert_ne!(tag_of(&catalog, &moves[4]), DamageTag::Physical);
    }

    #[test]
    fn test_build_cycles_small_pool_without_early_repeats() {
        // Three physical moves fill four slots: the first three are distinct
        let catalog = MoveCatalog::standard();
        let mut rng = StdRng::seed_from_u64(5);
        let moves = LoadoutBuilder::new(&catalog).build(Affinity::Physical, &mut rng);

        assert_ne!(moves[0], moves[1]);
        assert_ne!(moves[1], moves[2]);
        assert_ne!(moves[0], moves[2]);
        assert_eq!(moves[3], moves[0]);
    }

    #[test]
    fn test_build_any_uses_whole_catalog() {
        let catalog = MoveCatalog::standard();
        let mut rng = StdRng::seed_from_u64(99);
        let moves = LoadoutBuilder::new(&catalog).build(Affinity::Any, &mut rng);

        assert_eq!(moves.len(), GENERATED_LOADOUT_SIZE);
        assert!(moves.iter().all(|id| catalog.contains(id)));
    }

    #[test]
    fn test_build_single_tag_catalog_falls_back() {
        let only_magic: Vec<MoveDefinition> = MoveCatalog::standard()
            .all()
            .iter()
            .filter(|m| m.tag == DamageTag::Magic)
            .cloned()
            .collect();
        let catalog = MoveCatalog::new(only_magic);
        let mut rng = StdRng::seed_from_u64(1);

        let moves = LoadoutBuilder::new(&catalog).build(Affinity::Magic, &mut rng);
        assert_eq!(moves.len(), GENERATED_LOADOUT_SIZE);
        assert!(moves.iter().all(|id| tag_of(&catalog, id) == DamageTag::Magic));
    }

    #[test]
    fn test_build_no_primary_moves() {
        let catalog = MoveCatalog::new(vec![MoveDefinition {
            id: MoveId::from("spark"),
            name: "Spark".into(),
            description: String::new(),
            damage: 5,
            stat_raised: StatKind::None,
            stat_increase: 0,
            energy_cost: 1,
            tag: DamageTag::Elemental,
            effect_timing: 0,
        }]);
        let mut rng = StdRng::seed_from_u64(1);

        let moves = LoadoutBuilder::new(&catalog).build(Affinity::Physical, &mut rng);
        assert_eq!(moves, vec![MoveId::from("spark")]);
    }

    #[test]
    fn test_build_empty_catalog() {
        let catalog = MoveCatalog::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(LoadoutBuilder::new(&catalog).build(Affinity::Any, &mut rng).is_empty());
    }
}
