//! BattleState - one match between two sides

use std::collections::VecDeque;

use quizpet_protocol::MoveId;

use super::rules::BattleRules;
use crate::catalog::MoveCatalog;
use crate::types::{Outcome, Side, SideState};

/// Lifecycle of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Phase {
    /// Loadouts captured, round 1 not yet set up
    Idle,
    /// Queues are being drained
    RoundActive,
    /// Outcome decided; no further mutation
    Finished,
}

/// Bounded battle log, oldest entries evicted first
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleLog {
    entries: VecDeque<String>,
    limit: usize,
}

impl BattleLog {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.entries.push_back(line.into());
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }

    pub fn extend<I: IntoIterator<Item = String>>(&mut self, lines: I) {
        for line in lines {
            self.push(line);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Most recent entry
    pub fn last(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }
}

/// A match between two sides
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleState {
    /// Current round (1-based once started)
    pub round: u32,

    /// Side states, indexed by [`Side::index`]
    pub sides: [SideState; 2],

    pub log: BattleLog,

    /// Set exactly once, when the match finishes
    pub outcome: Option<Outcome>,

    pub(crate) phase: Phase,
    pub(crate) rules: BattleRules,
}

impl BattleState {
    /// Capture both loadouts; the match stays `Idle` until [`start`](Self::start)
    pub fn new(first: Vec<MoveId>, second: Vec<MoveId>, rules: BattleRules) -> Self {
        Self {
            round: 1,
            sides: [
                SideState::new(first, rules.max_health),
                SideState::new(second, rules.max_health),
            ],
            log: BattleLog::new(rules.log_limit),
            outcome: None,
            phase: Phase::Idle,
            rules,
        }
    }

    /// Like [`new`](Self::new), but ids missing from `catalog` are dropped
    /// from both loadouts first
    ///
    /// A loadout made only of unknown ids counts as empty, so
    /// [`start`](Self::start) settles the match at once.
    pub fn capture(
        first: Vec<MoveId>,
        second: Vec<MoveId>,
        catalog: &MoveCatalog,
        rules: BattleRules,
    ) -> Self {
        Self::new(catalog.known(first), catalog.known(second), rules)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn rules(&self) -> &BattleRules {
        &self.rules
    }

    pub fn side(&self, side: Side) -> &SideState {
        &self.sides[side.index()]
    }

    pub(crate) fn side_mut(&mut self, side: Side) -> &mut SideState {
        &mut self.sides[side.index()]
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Whether the owner should keep its tick timer running
    pub fn needs_tick(&self) -> bool {
        self.phase == Phase::RoundActive
    }

    /// Set up round 1
    ///
    /// Only the first call on an `Idle` battle does anything; later calls
    /// return false so a repeated ready notification cannot re-apply the
    /// setup. A side without moves loses immediately (both empty is a draw).
    pub fn start(&mut self) -> bool {
        if self.phase != Phase::Idle {
            return false;
        }

        self.round = 1;
        for side in &mut self.sides {
            side.health = self.rules.max_health;
            side.refill();
        }

        let first_empty = self.sides[0].loadout.is_empty();
        let second_empty = self.sides[1].loadout.is_empty();

        if !(first_empty && second_empty) {
            self.log.push("Round 1 begins!");
        }

        match (first_empty, second_empty) {
            (true, true) => self.finish(Outcome::Draw),
            (true, false) => self.finish(Outcome::Winner(Side::Second)),
            (false, true) => self.finish(Outcome::Winner(Side::First)),
            (false, false) => self.phase = Phase::RoundActive,
        }
        true
    }

    pub(crate) fn finish(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
        self.phase = Phase::Finished;
        tracing::debug!(round = self.round, outcome = ?outcome, "Battle finished");
    }
}
