//! The move catalog: an immutable table of every move a pet can know
//!
//! The catalog is built once at process start and shared read-only by
//! every lobby (usually behind an `Arc`). Nothing in it is mutated after
//! construction.

use std::collections::HashMap;

use quizpet_protocol::MoveId;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::types::{Affinity, DamageTag, MoveDefinition, StatKind};

/// Read-only lookup from move id to definition
#[derive(Debug, Clone, Default)]
pub struct MoveCatalog {
    /// Definitions in catalog order
    moves: Vec<MoveDefinition>,

    /// Index into `moves` by id
    by_id: HashMap<MoveId, usize>,
}

impl MoveCatalog {
    /// Build a catalog; later duplicates of an id are ignored
    pub fn new(definitions: impl IntoIterator<Item = MoveDefinition>) -> Self {
        let mut moves = Vec::new();
        let mut by_id = HashMap::new();

        for def in definitions {
            if by_id.contains_key(&def.id) {
                continue;
            }
            by_id.insert(def.id.clone(), moves.len());
            moves.push(def);
        }

        Self { moves, by_id }
    }

    /// The built-in ten-move catalog
    pub fn standard() -> Self {
        Self::new(STANDARD_MOVES.iter().map(|row| row.to_definition()))
    }

    pub fn lookup(&self, id: &MoveId) -> Option<&MoveDefinition> {
        self.by_id.get(id).map(|&idx| &self.moves[idx])
    }

    pub fn contains(&self, id: &MoveId) -> bool {
        self.by_id.contains_key(id)
    }

    /// All definitions in catalog order
    pub fn all(&self) -> &[MoveDefinition] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Keep only the ids this catalog defines, in their original order
    pub fn known(&self, ids: impl IntoIterator<Item = MoveId>) -> Vec<MoveId> {
        ids.into_iter().filter(|id| self.contains(id)).collect()
    }

    /// Moves admitted by an affinity (`Any` returns everything)
    pub fn filter(&self, affinity: Affinity) -> Vec<&MoveDefinition> {
        self.moves.iter().filter(|m| affinity.admits(m.tag)).collect()
    }

    /// Moves whose tag is anything other than `tag`
    pub fn excluding_tag(&self, tag: DamageTag) -> Vec<&MoveDefinition> {
        self.moves.iter().filter(|m| m.tag != tag).collect()
    }

    /// Up to `count` distinct random moves admitted by `affinity`
    pub fn sample<R: Rng + ?Sized>(
        &self,
        affinity: Affinity,
        count: usize,
        rng: &mut R,
    ) -> Vec<&MoveDefinition> {
        let mut pool = self.filter(affinity);
        pool.shuffle(rng);
        pool.truncate(count);
        pool
    }

    /// A uniformly random move id, avoiding `current` when the catalog
    /// has more than one entry
    pub fn random_id_other_than<R: Rng + ?Sized>(
        &self,
        current: &MoveId,
        rng: &mut R,
    ) -> Option<MoveId> {
        if self.moves.len() <= 1 {
            return self.moves.first().map(|m| m.id.clone());
        }

        let candidates: Vec<&MoveDefinition> =
            self.moves.iter().filter(|m| &m.id != current).collect();
        candidates.choose(rng).map(|m| m.id.clone())
    }
}

/// Compact row form of a catalog entry
struct MoveRow {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    damage: i32,
    stat_raised: &'static str,
    stat_increase: i32,
    energy_cost: i32,
    tag: DamageTag,
    effect_timing: i32,
}

impl MoveRow {
    fn to_definition(&self) -> MoveDefinition {
        MoveDefinition {
            id: MoveId::from(self.id),
            name: self.name.to_string(),
            description: self.description.to_string(),
            damage: self.damage,
            stat_raised: StatKind::parse(self.stat_raised),
            stat_increase: self.stat_increase,
            energy_cost: self.energy_cost,
            tag: self.tag,
            effect_timing: self.effect_timing,
        }
    }
}

#[rustfmt::skip]
const STANDARD_MOVES: [MoveRow; 10] = [
    MoveRow { id: "plasma-bite", name: "Plasma Bite", description: "Superheated fangs leave a charged burn and boost bite strength.", damage: 18, stat_raised: "attack", stat_increase: 2, energy_cost: 6, tag: DamageTag::Physical, effect_timing: 1 },
    MoveRow { id: "nebula-pulse", name: "Nebula Pulse", description: "Ripples of cosmic dust erode foes while priming magic control.", damage: 15, stat_raised: "magic", stat_increase: 3, energy_cost: 7, tag: DamageTag::Magic, effect_timing: 2 },
    MoveRow { id: "gravity-slam", name: "Gravity Slam", description: "Compress the target under sudden gravity, raising own defense.", damage: 22, stat_raised: "defense", stat_increase: 4, energy_cost: 8, tag: DamageTag::Physical, effect_timing: 3 },
    MoveRow { id: "ion-siphon", name: "Ion Siphon", description: "Drain ionized energy to damage and slightly refill stamina.", damage: 14, stat_raised: "energy", stat_increase: 2, energy_cost: 4, tag: DamageTag::Elemental, effect_timing: 2 },
    MoveRow { id: "warp-feint", name: "Warp Feint", description: "Short warps make strikes unpredictable, boosting evasion.", damage: 12, stat_raised: "speed", stat_increase: 3, energy_cost: 3, tag: DamageTag::Physical, effect_timing: 1 },
    MoveRow { id: "comet-lance", name: "Comet Lance", description: "Piercing comet tip hits hard and leaves a shimmering trail.", damage: 28, stat_raised: "attack", stat_increase: 1, energy_cost: 10, tag: DamageTag::Elemental, effect_timing: 3 },
    MoveRow { id: "aurora-shell", name: "Aurora Shell", description: "Wraps the pet in aurora light, reducing damage next turn.", damage: 8, stat_raised: "defense", stat_increase: 5, energy_cost: 5, tag: DamageTag::Magic, effect_timing: 0 },
    MoveRow { id: "quasar-burst", name: "Quasar Burst", description: "High-cost star core blast that amplifies spell potency after use.", damage: 34, stat_raised: "magic", stat_increase: 4, energy_cost: 12, tag: DamageTag::Elemental, effect_timing: 4 },
    MoveRow { id: "stellar-mend", name: "Stellar Mend", description: "Pulls radiant dust into wounds for a mid-battle heal.", damage: 0, stat_raised: "health", stat_increase: 24, energy_cost: 6, tag: DamageTag::Magic, effect_timing: 2 },
    MoveRow { id: "luminous-bloom", name: "Luminous Bloom", description: "Photosynthetic flare chips foes while rejuvenating the caster.", damage: 10, stat_raised: "health", stat_increase: 14, energy_cost: 5, tag: DamageTag::Elemental, effect_timing: 2 },
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_standard_catalog() {
        let catalog = MoveCatalog::standard();
        assert_eq!(catalog.len(), 10);

        let bite = catalog.lookup(&MoveId::from("plasma-bite")).unwrap();
        assert_eq!(bite.damage, 18);
        assert_eq!(bite.stat_raised, StatKind::Attack);
        assert_eq!(bite.tag, DamageTag::Physical);

        let mend = catalog.lookup(&MoveId::from("stellar-mend")).unwrap();
        assert_eq!(mend.damage, 0);
        assert_eq!(mend.stat_raised, StatKind::Health);
        assert_eq!(mend.stat_increase, 24);
    }

    #[test]
    fn test_lookup_unknown() {
        let catalog = MoveCatalog::standard();
        assert!(catalog.lookup(&MoveId::from("hyper-beam")).is_none());
    }

    #[test]
    fn test_known_drops_unlisted_ids() {
        let catalog = MoveCatalog::standard();
        let ids = ["bogus", "plasma-bite", "", "nebula-pulse", "plasma-bite"]
            .map(MoveId::from);

        assert_eq!(
            catalog.known(ids),
            vec![
                MoveId::from("plasma-bite"),
                MoveId::from("nebula-pulse"),
                MoveId::from("plasma-bite"),
            ]
        );
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let mut defs: Vec<MoveDefinition> = MoveCatalog::standard().all().to_vec();
        let mut dup = defs[0].clone();
        dup.damage = 999;
        defs.push(dup);

        let catalog = MoveCatalog::new(defs);
        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog.lookup(&MoveId::from("plasma-bite")).unwrap().damage, 18);
    }

    #[test]
    fn test_filter_by_affinity() {
        let catalog = MoveCatalog::standard();
        assert_eq!(catalog.filter(Affinity::Any).len(), 10);
        assert_eq!(catalog.filter(Affinity::Physical).len(), 3);
        assert_eq!(catalog.filter(Affinity::Magic).len(), 3);
        assert_eq!(catalog.filter(Affinity::Elemental).len(), 4);
        assert_eq!(catalog.excluding_tag(DamageTag::Elemental).len(), 6);
    }

    #[test]
    fn test_sample_is_distinct_and_bounded() {
        let catalog = MoveCatalog::standard();
        let mut rng = StdRng::seed_from_u64(7);

        let picks = catalog.sample(Affinity::Magic, 10, &mut rng);
        assert_eq!(picks.len(), 3);
        assert!(picks.iter().all(|m| m.tag == DamageTag::Magic));

        let mut ids: Vec<&str> = picks.iter().map(|m| m.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_random_id_avoids_current() {
        let catalog = MoveCatalog::standard();
        let mut rng = StdRng::seed_from_u64(42);
        let current = MoveId::from("plasma-bite");

        for _ in 0..50 {
            let next = catalog.random_id_other_than(&current, &mut rng).unwrap();
            assert_ne!(next, current);
            assert!(catalog.contains(&next));
        }
    }

    #[test]
    fn test_random_id_single_entry_catalog() {
        let only = MoveCatalog::standard().all()[0].clone();
        let catalog = MoveCatalog::new(vec![only.clone()]);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(catalog.random_id_other_than(&only.id, &mut rng), Some(only.id));
        assert_eq!(MoveCatalog::default().random_id_other_than(&MoveId::from("x"), &mut rng), None);
    }
}
