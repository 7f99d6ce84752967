//! Tunable battle constants

/// Constants a match is played under
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleRules {
    /// Starting and maximum health of each side
    pub max_health: i32,

    /// Fraction of `max_health` restored to both sides between rounds
    pub round_heal_fraction: f64,

    /// Battle log entries kept (oldest evicted first)
    pub log_limit: usize,

    /// Round after which the match is decided by health (`None` = unbounded)
    pub max_rounds: Option<u32>,
}

impl BattleRules {
    /// Health restored between rounds, rounded to the nearest point
    pub fn round_heal(&self) -> i32 {
        (f64::from(self.max_health) * self.round_heal_fraction).round() as i32
    }
}

impl Default for BattleRules {
    fn default() -> Self {
        Self {
            max_health: 120,
            round_heal_fraction: 0.25,
            log_limit: 8,
            max_rounds: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_heal() {
        assert_eq!(BattleRules::default().round_heal(), 30);

        let rules = BattleRules {
            max_health: 50,
            ..BattleRules::default()
        };
        assert_eq!(rules.round_heal(), 13);
    }
}
