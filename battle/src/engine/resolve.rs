//! Tick resolution and round progression

use quizpet_protocol::MoveId;

use super::state::{BattleState, Phase};
use crate::catalog::MoveCatalog;
use crate::types::{MoveDefinition, Outcome, Side};

/// Where the match stands after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Moves remain in the current round
    Continue,
    /// Queues drained; the given round has begun
    NextRound(u32),
    /// The match is over
    Finished(Outcome),
}

/// Result of one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Round the tick was resolved in
    pub round: u32,
    /// Log lines written by this tick (before log eviction)
    pub lines: Vec<String>,
    pub progress: Progress,
}

/// What one side's move did this tick
#[derive(Debug, Default, Clone, Copy)]
struct Effect {
    dealt: Option<i32>,
    blocked: i32,
    healed: [i32; 2],
    defense_gained: i32,
}

impl BattleState {
    /// Resolve one tick
    ///
    /// Pops the front move of each queue and applies both against the
    /// pre-tick state: damage first (mitigated by the opponent's pre-tick
    /// defense pool, which loses one unit per hit), then each side's own
    /// heals and defense gains. Unknown move ids are skipped silently.
    /// Returns `None` unless a round is active.
    pub fn tick(&mut self, catalog: &MoveCatalog) -> Option<TickReport> {
        if self.phase != Phase::RoundActive {
            return None;
        }

        let round = self.round;
        let popped: [Option<MoveId>; 2] = [
            self.sides[0].queue.pop_front(),
            self.sides[1].queue.pop_front(),
        ];
        let moves: [Option<&MoveDefinition>; 2] = [
            lookup(catalog, popped[0].as_ref()),
            lookup(catalog, popped[1].as_ref()),
        ];
        let pre_defense = [self.sides[0].defense, self.sides[1].defense];
        let mut effects = [Effect::default(); 2];

        // Damage, against the opponent's pre-tick pool
        for side in Side::BOTH {
            let Some(def) = moves[side.index()] else {
                continue;
            };
            if def.damage <= 0 {
                continue;
            }
            let target = side.opponent();
            let pool = pre_defense[target.index()];
            let dealt = (def.damage - pool).max(0);

            let opponent = self.side_mut(target);
            opponent.take_damage(dealt);
            if pool > 0 {
                opponent.consume_defense_unit();
            }

            let effect = &mut effects[side.index()];
            effect.dealt = Some(dealt);
            effect.blocked = def.damage - dealt;
        }

        // Self effects
        let max_health = self.rules.max_health;
        for side in Side::BOTH {
            let Some(def) = moves[side.index()] else {
                continue;
            };
            let actor = self.side_mut(side);
            let effect = &mut effects[side.index()];
            effect.healed[0] = actor.heal(def.heal_from_damage(), max_health);
            effect.healed[1] = actor.heal(def.heal_from_stat(), max_health);
            effect.defense_gained = actor.raise_defense(def.defense_gain());
        }

        let mut lines: Vec<String> = Side::BOTH
            .iter()
            .filter_map(|side| {
                moves[side.index()].map(|def| describe(*side, def, &effects[side.index()]))
            })
            .collect();
        self.log.extend(lines.iter().cloned());

        let (progress, round_lines) = self.check_round_end();
        lines.extend(round_lines);

        tracing::trace!(round, progress = ?progress, "Tick resolved");

        Some(TickReport {
            round,
            lines,
            progress,
        })
    }

    /// Decide whether the match ends, a new round starts, or play continues
    fn check_round_end(&mut self) -> (Progress, Vec<String>) {
        let first_alive = self.sides[0].is_alive();
        let second_alive = self.sides[1].is_alive();

        let outcome = match (first_alive, second_alive) {
            (false, false) => Some(Outcome::Draw),
            (false, true) => Some(Outcome::Winner(Side::Second)),
            (true, false) => Some(Outcome::Winner(Side::First)),
            (true, true) => None,
        };
        if let Some(outcome) = outcome {
            self.finish(outcome);
            return (Progress::Finished(outcome), Vec::new());
        }

        if self.sides.iter().any(|s| !s.queue.is_empty()) {
            return (Progress::Continue, Vec::new());
        }

        let rounds_left = self.rules.max_rounds.is_none_or(|max| self.round < max);
        let loadouts_left = self.sides.iter().all(|s| !s.loadout.is_empty());

        if rounds_left && loadouts_left {
            let lines = self.advance_round();
            return (Progress::NextRound(self.round), lines);
        }

        let outcome = Outcome::by_health(self.sides[0].health, self.sides[1].health);
        self.finish(outcome);
        (Progress::Finished(outcome), Vec::new())
    }

    /// Heal both sides, clear defense and refill both queues
    fn advance_round(&mut self) -> Vec<String> {
        self.round += 1;
        let heal = self.rules.round_heal();
        let max_health = self.rules.max_health;

        let mut lines = vec![format!("Round {} begins!", self.round)];
        for side in Side::BOTH {
            let state = self.side_mut(side);
            let healed = state.heal(heal, max_health);
            state.refill();
            if healed > 0 {
                lines.push(format!("{} recovers +{} HP", side.label(), healed));
            }
        }

        self.log.extend(lines.iter().cloned());
        tracing::debug!(round = self.round, "Round started");
        lines
    }
}

fn lookup<'c>(catalog: &'c MoveCatalog, id: Option<&MoveId>) -> Option<&'c MoveDefinition> {
    let id = id?;
    let def = catalog.lookup(id);
    if def.is_none() {
        tracing::debug!(move_id = %id, "Skipping unknown move");
    }
    def
}

fn describe(side: Side, def: &MoveDefinition, effect: &Effect) -> String {
    let mut segments = Vec::new();

    if let Some(dealt) = effect.dealt {
        segments.push(format!("-{} HP", dealt));
        if effect.blocked > 0 {
            segments.push(format!("{} blocked", effect.blocked));
        }
    }
    for healed in effect.healed {
        if healed > 0 {
            segments.push(format!("+{} HP", healed));
        }
    }
    if effect.defense_gained > 0 {
        segments.push(format!("DEF +{}", effect.defense_gained));
    }

    if segments.is_empty() {
        format!("{} used {}", side.label(), def.display_name())
    } else {
        format!(
            "{} used {} ({})",
            side.label(),
            def.display_name(),
            segments.join(", ")
        )
    }
}
