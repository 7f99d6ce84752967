//! Move definitions and the tags that classify them

use quizpet_protocol::MoveId;

/// Damage family of a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DamageTag {
    Physical,
    Magic,
    Elemental,
}

impl DamageTag {
    pub const ALL: [DamageTag; 3] = [DamageTag::Physical, DamageTag::Magic, DamageTag::Elemental];

    /// Parse from catalog string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "physical" => Some(DamageTag::Physical),
            "magic" => Some(DamageTag::Magic),
            "elemental" => Some(DamageTag::Elemental),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DamageTag::Physical => "physical",
            DamageTag::Magic => "magic",
            DamageTag::Elemental => "elemental",
        }
    }
}

impl std::fmt::Display for DamageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stat a move raises on its user
///
/// Only `Health` and `Defense` have an effect in battle; every other kind
/// is carried for display and resolves as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StatKind {
    None,
    Health,
    Defense,
    Attack,
    Speed,
    Magic,
    Energy,
    Other,
}

impl StatKind {
    /// Parse from catalog string; unrecognised kinds become `Other`
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "" | "none" => StatKind::None,
            "health" => StatKind::Health,
            "defense" | "defence" => StatKind::Defense,
            "attack" => StatKind::Attack,
            "speed" => StatKind::Speed,
            "magic" => StatKind::Magic,
            "energy" => StatKind::Energy,
            _ => StatKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatKind::None => "none",
            StatKind::Health => "health",
            StatKind::Defense => "defense",
            StatKind::Attack => "attack",
            StatKind::Speed => "speed",
            StatKind::Magic => "magic",
            StatKind::Energy => "energy",
            StatKind::Other => "other",
        }
    }
}

/// A pet's type affinity, used to pick moves for a generated loadout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Affinity {
    /// No preference: tag filtering disabled
    #[default]
    Any,
    Physical,
    Magic,
    Elemental,
}

impl Affinity {
    /// Parse from stored profile string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "any" => Some(Affinity::Any),
            "physical" => Some(Affinity::Physical),
            "magic" => Some(Affinity::Magic),
            "elemental" => Some(Affinity::Elemental),
            _ => None,
        }
    }

    /// Damage tag this affinity filters on (`None` for `Any`)
    pub fn tag(&self) -> Option<DamageTag> {
        match self {
            Affinity::Any => None,
            Affinity::Physical => Some(DamageTag::Physical),
            Affinity::Magic => Some(DamageTag::Magic),
            Affinity::Elemental => Some(DamageTag::Elemental),
        }
    }

    /// Whether a move with `tag` passes this affinity's filter
    pub fn admits(&self, tag: DamageTag) -> bool {
        self.tag().is_none_or(|t| t == tag)
    }
}

impl From<DamageTag> for Affinity {
    fn from(tag: DamageTag) -> Self {
        match tag {
            DamageTag::Physical => Affinity::Physical,
            DamageTag::Magic => Affinity::Magic,
            DamageTag::Elemental => Affinity::Elemental,
        }
    }
}

/// Immutable catalog entry for one move
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveDefinition {
    pub id: MoveId,
    pub name: String,
    pub description: String,

    /// Damage dealt to the opponent; negative values heal the user
    pub damage: i32,

    pub stat_raised: StatKind,
    pub stat_increase: i32,
    pub energy_cost: i32,
    pub tag: DamageTag,
    pub effect_timing: i32,
}

impl MoveDefinition {
    /// Display name, falling back to the id
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }

    /// Self heal from negative damage
    pub fn heal_from_damage(&self) -> i32 {
        if self.damage < 0 {
            -self.damage
        } else {
            0
        }
    }

    /// Self heal from a health raise
    pub fn heal_from_stat(&self) -> i32 {
        if self.stat_raised == StatKind::Health && self.stat_increase > 0 {
            self.stat_increase
        } else {
            0
        }
    }

    /// Defense pool this move adds to its user
    pub fn defense_gain(&self) -> i32 {
        if self.stat_raised == StatKind::Defense && self.stat_increase > 0 {
            self.stat_increase
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_kind_parse() {
        assert_eq!(StatKind::parse("Health"), StatKind::Health);
        assert_eq!(StatKind::parse("defense"), StatKind::Defense);
        assert_eq!(StatKind::parse(""), StatKind::None);
        assert_eq!(StatKind::parse("charisma"), StatKind::Other);
    }

    #[test]
    fn test_affinity_admits() {
        assert!(Affinity::Any.admits(DamageTag::Magic));
        assert!(Affinity::Magic.admits(DamageTag::Magic));
        assert!(!Affinity::Magic.admits(DamageTag::Physical));
    }

    #[test]
    fn test_damage_tag_round_trip_through_str() {
        for tag in DamageTag::ALL {
            assert_eq!(DamageTag::parse(tag.as_str()), Some(tag));
        }
        assert_eq!(DamageTag::parse("psychic"), None);
    }

    #[test]
    fn test_heal_and_defense_gain() {
        let mend = MoveDefinition {
            id: MoveId::from("stellar-mend"),
            name: "Stellar Mend".into(),
            description: String::new(),
            damage: 0,
            stat_raised: StatKind::Health,
            stat_increase: 24,
            energy_cost: 6,
            tag: DamageTag::Magic,
            effect_timing: 2,
        };
        assert_eq!(mend.heal_from_stat(), 24);
        assert_eq!(mend.heal_from_damage(), 0);
        assert_eq!(mend.defense_gain(), 0);

        let drain = MoveDefinition {
            damage: -10,
            stat_raised: StatKind::Defense,
            stat_increase: 3,
            ..mend
        };
        assert_eq!(drain.heal_from_damage(), 10);
        assert_eq!(drain.heal_from_stat(), 0);
        assert_eq!(drain.defense_gain(), 3);
    }
}
