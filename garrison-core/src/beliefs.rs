//! What one side has learned about the enemy army
//!
//! Built only from public information: move reports (which squares moved,
//! how far, and the ranks exposed in combat) plus redacted snapshots.

use crate::board::Position;
use crate::game::{MoveReport, Side};
use crate::ranks::{CombatOutcome, Rank, ALL_RANKS};
use crate::ruleset::RuleSet;
use crate::snapshot::BoardSnapshot;
use rustc_hash::FxHashMap;

/// Last known facts about one enemy unit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Belief {
    pub rank: Option<Rank>,
    /// Has moved at least once, so it is neither Flag nor Bomb
    pub moved: bool,
}

#[derive(Clone, Debug)]
pub struct Beliefs {
    side: Side,
    enemy: FxHashMap<Position, Belief>,
}

impl Beliefs {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            enemy: FxHashMap::default(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Belief about the enemy unit on `pos` (default when nothing is known)
    pub fn get(&self, pos: Position) -> Belief {
        self.enemy.get(&pos).copied().unwrap_or_default()
    }

    /// Forget everything (new game)
    pub fn clear(&mut self) {
        self.enemy.clear();
    }

    /// Fold one public move report into the beliefs
    pub fn observe(&mut self, report: &MoveReport) {
        let (from, to) = (report.mv.from, report.mv.to);
        let enemy_moved = report.side != self.side;

        match report.combat {
            None => {
                if enemy_moved {
                    let mut belief = self.enemy.remove(&from).unwrap_or_default();
                    belief.moved = true;
                    if from.distance_to(to) > 1 {
                        belief.rank = Some(Rank::Scout);
                    }
                    self.enemy.insert(to, belief);
                }
            }
            Some(combat) if enemy_moved => {
                self.enemy.remove(&from);
                if combat.outcome == CombatOutcome::AttackerWins {
                    self.enemy.insert(
                        to,
                        Belief {
                            rank: Some(combat.attacker),
                            moved: true,
                        },
                    );
                }
            }
            Some(combat) => match combat.outcome {
                CombatOutcome::DefenderWins => {
                    let belief = self.enemy.entry(to).or_default();
                    belief.rank = Some(combat.defender);
                }
                CombatOutcome::AttackerWins | CombatOutcome::MutualDestruction => {
                    self.enemy.remove(&to);
                }
            },
        }
    }

    /// Rank known for the enemy on `pos`: snapshot first, then memory
    pub fn known_rank(&self, view: &BoardSnapshot, pos: Position) -> Option<Rank> {
        view.occupant(pos)
            .filter(|o| o.owner != self.side)
            .and_then(|o| o.rank)
            .or(self.get(pos).rank)
    }

    /// Enemy ranks still unaccounted for: quota minus casualties minus
    /// identified units, in rank order
    pub fn unseen_pool(&self, rules: &RuleSet, view: &BoardSnapshot) -> Vec<(Rank, u32)> {
        let enemy = self.side.opponent();
        let mut counts = [0i32; ALL_RANKS.len()];

        for &rank in &ALL_RANKS {
            counts[rank as usize] = rules.quota(rank) as i32;
        }
        for &rank in view.casualties(enemy) {
            counts[rank as usize] -= 1;
        }
        for (pos, occupant) in view.occupants() {
            if occupant.owner != enemy {
                continue;
            }
            if let Some(rank) = self.known_rank(view, pos) {
                counts[rank as usize] -= 1;
            }
        }

        ALL_RANKS
            .iter()
            .filter_map(|&rank| {
                let n = counts[rank as usize];
                (n > 0).then_some((rank, n as u32))
            })
            .collect()
    }

    /// Candidate ranks for the enemy on `pos`, weighted by count
    pub fn candidates(&self, view: &BoardSnapshot, pool: &[(Rank, u32)], pos: Position) -> Vec<(Rank, u32)> {
        if let Some(rank) = self.known_rank(view, pos) {
            return vec![(rank, 1)];
        }
        let moved = self.get(pos).moved;
        pool.iter()
            .copied()
            .filter(|&(rank, _)| !moved || rank.is_movable())
            .collect()
    }
}
