//! Per-side battle state

use std::collections::VecDeque;

use quizpet_protocol::MoveId;

/// One of the two combatants. `First` is seat 0 ("Player 1").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::First, Side::Second];

    /// Array index for this side
    pub fn index(&self) -> usize {
        match self {
            Side::First => 0,
            Side::Second => 1,
        }
    }

    /// Side for a seat index (0 or 1)
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Side::First),
            1 => Some(Side::Second),
            _ => None,
        }
    }

    pub fn opponent(&self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    /// Label used in the battle log
    pub fn label(&self) -> &'static str {
        match self {
            Side::First => "Player 1",
            Side::Second => "Player 2",
        }
    }
}

/// How a finished match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Outcome {
    Winner(Side),
    Draw,
}

impl Outcome {
    /// Decide by remaining health: strictly more wins, equal is a draw
    pub fn by_health(first: i32, second: i32) -> Self {
        match first.cmp(&second) {
            std::cmp::Ordering::Greater => Outcome::Winner(Side::First),
            std::cmp::Ordering::Less => Outcome::Winner(Side::Second),
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    pub fn winner(&self) -> Option<Side> {
        match self {
            Outcome::Winner(side) => Some(*side),
            Outcome::Draw => None,
        }
    }
}

/// One combatant's state during a match
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SideState {
    /// Current health, always within `0..=max_health`
    pub health: i32,

    /// Mitigation pool; each absorbed hit consumes one unit
    pub defense: i32,

    /// Moves left this round, drained front to back
    pub queue: VecDeque<MoveId>,

    /// Move order frozen at battle start, used to refill every round
    pub loadout: Vec<MoveId>,
}

impl SideState {
    /// A side at full health with its loadout frozen but not yet queued
    pub fn new(loadout: Vec<MoveId>, max_health: i32) -> Self {
        Self {
            health: max_health,
            defense: 0,
            queue: VecDeque::new(),
            loadout,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Refill the queue from the frozen loadout and drop the defense pool
    pub fn refill(&mut self) {
        self.queue = self.loadout.iter().cloned().collect();
        self.defense = 0;
    }

    /// Heal up to `max_health`, returning the amount actually restored
    pub fn heal(&mut self, amount: i32, max_health: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let next = (self.health + amount).min(max_health);
        let healed = (next - self.health).max(0);
        self.health = self.health.max(next);
        healed
    }

    /// Remove health, flooring at zero
    pub fn take_damage(&mut self, amount: i32) {
        if amount > 0 {
            self.health = (self.health - amount).max(0);
        }
    }

    /// Consume one unit of the defense pool, if any
    pub fn consume_defense_unit(&mut self) {
        if self.defense > 0 {
            self.defense -= 1;
        }
    }

    /// Grow the defense pool (additive, unbounded)
    pub fn raise_defense(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        self.defense += amount;
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent() {
        assert_eq!(Side::First.opponent(), Side::Second);
        assert_eq!(Side::Second.opponent(), Side::First);
        assert_eq!(Side::from_index(1), Some(Side::Second));
        assert_eq!(Side::from_index(2), None);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut side = SideState::new(Vec::new(), 120);
        side.health = 110;

        assert_eq!(side.heal(24, 120), 10);
        assert_eq!(side.health, 120);
        assert_eq!(side.heal(5, 120), 0);
    }

    #[test]
    fn test_damage_floors_at_zero() {
        let mut side = SideState::new(Vec::new(), 120);
        side.take_damage(200);
        assert_eq!(side.health, 0);
        assert!(!side.is_alive());
    }

    #[test]
    fn test_refill_resets_defense() {
        let mut side = SideState::new(vec![MoveId::from("a"), MoveId::from("b")], 120);
        side.defense = 7;
        side.refill();

        assert_eq!(side.queue.len(), 2);
        assert_eq!(side.defense, 0);
    }

    #[test]
    fn test_outcome_by_health() {
        assert_eq!(Outcome::by_health(50, 40), Outcome::Winner(Side::First));
        assert_eq!(Outcome::by_health(10, 40), Outcome::Winner(Side::Second));
        assert_eq!(Outcome::by_health(40, 40), Outcome::Draw);
    }
}
