//! Position evaluation

use crate::board::Position;
use crate::game::{Game, Side};
use crate::movegen::mobility;
use crate::ranks::{Rank, ALL_RANKS};
use crate::ruleset::RuleSet;
use serde::{Deserialize, Serialize};

/// Heuristic weights for position evaluation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Heuristics {
    /// Value of each rank, indexed by `Rank as usize`
    pub rank_values: [f32; 12],
    /// Bonus per row a movable unit has advanced from its back row
    pub advance_weight: f32,
    /// Weight for mobility (legal move count)
    pub mobility_weight: f32,
}

impl Default for Heuristics {
    fn default() -> Self {
        let mut values = [0.0f32; 12];
        values[Rank::Flag as usize] = 0.0; // Loss of the flag is terminal
        values[Rank::Spy as usize] = 3.0;
        values[Rank::Scout as usize] = 1.5;
        values[Rank::Miner as usize] = 2.5;
        values[Rank::Sergeant as usize] = 1.0;
        values[Rank::Lieutenant as usize] = 1.5;
        values[Rank::Captain as usize] = 2.0;
        values[Rank::Major as usize] = 3.0;
        values[Rank::Colonel as usize] = 4.5;
        values[Rank::General as usize] = 6.5;
        values[Rank::Marshal as usize] = 9.0;
        values[Rank::Bomb as usize] = 1.5;

        Self {
            rank_values: values,
            advance_weight: 0.05,
            mobility_weight: 0.01,
        }
    }
}

impl Heuristics {
    pub fn value(&self, rank: Rank) -> f32 {
        self.rank_values[rank as usize]
    }

    /// Mean value over a rank distribution given as (rank, weight) pairs
    pub fn expected_value(&self, pool: &[(Rank, u32)]) -> f32 {
        let total: u32 = pool.iter().map(|&(_, n)| n).sum();
        if total == 0 {
            return 0.0;
        }
        pool.iter()
            .map(|&(rank, n)| self.value(rank) * n as f32)
            .sum::<f32>()
            / total as f32
    }

    /// Whole-army material at full strength
    pub fn army_value(&self, rules: &RuleSet) -> f32 {
        ALL_RANKS
            .iter()
            .map(|&rank| self.value(rank) * rules.quota(rank) as f32)
            .sum()
    }
}

/// Win value (effectively infinite)
pub const WIN_VALUE: f32 = 100000.0;

/// Rows `pos` lies in front of `side`'s back row
pub fn advancement(rules: &RuleSet, side: Side, pos: Position) -> u8 {
    rules.back_row(side).abs_diff(pos.row)
}

/// Evaluate from `side`'s perspective
pub fn evaluate(game: &Game, side: Side, heuristics: &Heuristics) -> f32 {
    if let Some(winner) = game.winner() {
        return if winner == side { WIN_VALUE } else { -WIN_VALUE };
    }

    let rules = game.rules();
    let mut score = 0.0f32;

    for (pos, unit) in game.board().units() {
        let mut value = heuristics.value(unit.rank);
        if unit.rank.is_movable() {
            value += heuristics.advance_weight * advancement(rules, unit.owner, pos) as f32;
        }

        if unit.owner == side {
            score += value;
        } else {
            score -= value;
        }
    }

    if heuristics.mobility_weight.abs() > 0.001 {
        let mine = mobility(game.board(), side) as f32;
        let theirs = mobility(game.board(), side.opponent()) as f32;
        score += heuristics.mobility_weight * (mine - theirs);
    }

    score
}

/// Evaluate with depth bonus for preferring faster wins
pub fn evaluate_with_depth(game: &Game, side: Side, heuristics: &Heuristics, depth: i32) -> f32 {
    match game.winner() {
        Some(winner) if winner == side => WIN_VALUE + depth as f32,
        Some(_) => -WIN_VALUE - depth as f32,
        None => evaluate(game, side, heuristics),
    }
}
