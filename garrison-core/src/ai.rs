//! Computer opponents
//!
//! Two strategies share the `Strategy` seam:
//! - `SearchAi` searches cloned games with alpha-beta and reads true ranks
//!   (the weak, full-information opponent)
//! - `FairAi` works from its side's redacted snapshot plus `Beliefs`
//!
//! Both only ever return moves produced by the legal move generator and break
//! ties in generator order, so a fixed seed replays the same game.

use crate::beliefs::Beliefs;
use crate::board::Position;
use crate::error::GameError;
use crate::eval::{advancement, evaluate, evaluate_with_depth, Heuristics, WIN_VALUE};
use crate::game::{Game, Move, MoveReport, Side};
use crate::ranks::{beats, CombatOutcome, Rank};
use crate::snapshot::{BoardSnapshot, Viewer};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

// ============================================================================
// STRATEGY
// ============================================================================

/// Picks moves for one side of a game
pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// Move for the side to move, or `None` when it cannot or should not act
    fn choose_move(&mut self, game: &Game) -> Option<Move>;

    /// Public report of every applied move, in order
    fn observe(&mut self, _report: &MoveReport) {}
}

/// Which strategy to build
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AiKind {
    Search { depth: u32 },
    Fair,
}

impl Default for AiKind {
    fn default() -> Self {
        AiKind::Search { depth: 2 }
    }
}

impl AiKind {
    pub fn build(self, side: Side, heuristics: Heuristics, seed: u64) -> Box<dyn Strategy> {
        match self {
            AiKind::Search { depth } => Box::new(SearchAi::with_seed(depth, heuristics, seed)),
            AiKind::Fair => Box::new(FairAi::new(side, heuristics)),
        }
    }
}

impl FromStr for AiKind {
    type Err = String;

    /// `fair`, `search` or `search:<depth>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            None if s == "fair" => Ok(AiKind::Fair),
            None if s == "search" => Ok(AiKind::default()),
            Some(("search", depth)) => depth
                .parse()
                .map(|depth| AiKind::Search { depth })
                .map_err(|_| format!("bad search depth: {depth}")),
            _ => Err(format!("unknown AI kind: {s} (expected fair, search or search:<depth>)")),
        }
    }
}

impl std::fmt::Display for AiKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AiKind::Search { depth } => write!(f, "search:{depth}"),
            AiKind::Fair => write!(f, "fair"),
        }
    }
}

/// Let `players` (indexed by side) play a started game until it ends or
/// `max_plies` moves have been made. Returns the number of moves applied.
pub fn play_out(
    game: &mut Game,
    players: &mut [Box<dyn Strategy>; 2],
    max_plies: usize,
) -> Result<usize, GameError> {
    let mut plies = 0;
    while plies < max_plies {
        let Some(side) = game.to_move() else { break };
        let Some(mv) = players[side as usize].choose_move(game) else {
            tracing::warn!("{} ({}) has no move", side, players[side as usize].name());
            break;
        };
        let report = game.submit_move(side, mv)?;
        for player in players.iter_mut() {
            player.observe(&report);
        }
        plies += 1;
    }
    Ok(plies)
}

/// Value of one exchange for the attacker, ranks known
fn exchange_value(heuristics: &Heuristics, attacker: Rank, defender: Rank) -> f32 {
    match beats(attacker, defender) {
        CombatOutcome::AttackerWins if defender == Rank::Flag => WIN_VALUE,
        CombatOutcome::AttackerWins => heuristics.value(defender),
        CombatOutcome::DefenderWins => -heuristics.value(attacker),
        CombatOutcome::MutualDestruction => heuristics.value(defender) - heuristics.value(attacker),
    }
}

/// Keep the first of equally scored moves
fn pick_best(scored: impl IntoIterator<Item = (Move, f32)>) -> Option<Move> {
    let mut best: Option<(Move, f32)> = None;
    for (mv, score) in scored {
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((mv, score));
        }
    }
    best.map(|(mv, _)| mv)
}

// ============================================================================
// SEARCH AI
// ============================================================================

/// Alpha-beta search over true game states
pub struct SearchAi {
    pub depth: u32,
    /// Inner nodes search only this many best-ordered moves
    pub max_moves: usize,
    pub heuristics: Heuristics,
    /// Leaf noise amplitude; zero keeps the search fully deterministic
    pub noise: f32,
    rng: ChaCha8Rng,
}

impl SearchAi {
    pub fn new(depth: u32, heuristics: Heuristics) -> Self {
        Self::with_seed(depth, heuristics, 42)
    }

    pub fn with_seed(depth: u32, heuristics: Heuristics, seed: u64) -> Self {
        Self {
            depth: depth.max(1),
            max_moves: 24,
            heuristics,
            noise: 0.0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn with_noise(mut self, noise: f32) -> Self {
        self.noise = noise;
        self
    }

    /// Best move for the side to move.
    ///
    /// Root moves are searched in generator order; a later move must score
    /// strictly higher to replace the current best.
    pub fn best_move(&mut self, game: &Game) -> Option<Move> {
        let side = game.to_move()?;
        let moves = game.legal_moves();
        if moves.len() <= 1 {
            return moves.first().copied();
        }

        let depth = self.depth as i32;
        let mut best_score = f32::NEG_INFINITY;
        let mut scored = Vec::with_capacity(moves.len());

        for mv in moves {
            let mut child = game.clone();
            if child.submit_move(side, mv).is_err() {
                continue;
            }
            let score = -self.negamax(&child, side.opponent(), depth - 1, f32::NEG_INFINITY, -best_score);
            best_score = best_score.max(score);
            scored.push((mv, score));
        }

        pick_best(scored)
    }

    /// Score from `side`'s point of view; `side` is to move unless the game
    /// just ended
    fn negamax(&mut self, game: &Game, side: Side, depth: i32, mut alpha: f32, beta: f32) -> f32 {
        if game.is_game_over() {
            return evaluate_with_depth(game, side, &self.heuristics, depth);
        }

        if depth <= 0 {
            return self.leaf(game, side);
        }

        let mut moves = order_moves(game, side, game.legal_moves(), &self.heuristics);
        if moves.is_empty() {
            return self.leaf(game, side);
        }
        moves.truncate(self.max_moves);

        let mut best = f32::NEG_INFINITY;
        for mv in moves {
            let mut child = game.clone();
            if child.submit_move(side, mv).is_err() {
                continue;
            }
            let score = -self.negamax(&child, side.opponent(), depth - 1, -beta, -alpha);

            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }

        best
    }

    fn leaf(&mut self, game: &Game, side: Side) -> f32 {
        let base = evaluate(game, side, &self.heuristics);
        if self.noise > 0.0 {
            base + (self.rng.gen::<f32>() - 0.5) * self.noise
        } else {
            base
        }
    }
}

impl Strategy for SearchAi {
    fn name(&self) -> &str {
        "search"
    }

    fn choose_move(&mut self, game: &Game) -> Option<Move> {
        self.best_move(game)
    }
}

/// Score a move for ordering (higher = search first)
fn move_score(game: &Game, side: Side, mv: Move, heuristics: &Heuristics) -> f32 {
    let board = game.board();
    let Some(attacker) = board.unit_at(mv.from) else {
        return f32::NEG_INFINITY;
    };

    let mut score = 0.0;
    if let Some(victim) = board.unit_at(mv.to) {
        if victim.owner != side {
            score += 1000.0 + exchange_value(heuristics, attacker.rank, victim.rank);
        }
    }

    let rules = game.rules();
    score += advancement(rules, side, mv.to) as f32 - advancement(rules, side, mv.from) as f32;
    score
}

/// Captures first; stable, so equal scores keep generator order
fn order_moves(game: &Game, side: Side, moves: Vec<Move>, heuristics: &Heuristics) -> Vec<Move> {
    let mut scored: Vec<(f32, Move)> = moves
        .into_iter()
        .map(|mv| (move_score(game, side, mv, heuristics), mv))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.into_iter().map(|(_, mv)| mv).collect()
}

// ============================================================================
// FAIR AI
// ============================================================================

/// One-ply expected-value player that never sees hidden ranks
pub struct FairAi {
    side: Side,
    pub heuristics: Heuristics,
    beliefs: Beliefs,
}

impl FairAi {
    pub fn new(side: Side, heuristics: Heuristics) -> Self {
        Self {
            side,
            heuristics,
            beliefs: Beliefs::new(side),
        }
    }

    pub fn beliefs(&self) -> &Beliefs {
        &self.beliefs
    }

    /// Expected gain of `mv` given what this side can see
    fn score_move(&self, game: &Game, view: &BoardSnapshot, pool: &[(Rank, u32)], mv: Move) -> f32 {
        let Some(attacker) = view.occupant(mv.from).and_then(|o| o.rank) else {
            return f32::NEG_INFINITY;
        };

        let rules = game.rules();
        let h = &self.heuristics;
        let gain = advancement(rules, self.side, mv.to) as f32 - advancement(rules, self.side, mv.from) as f32;
        let positional = h.advance_weight * gain;

        if view.occupant(mv.to).is_none() {
            return positional + self.exposure(view, mv.to, attacker);
        }

        let candidates = self.beliefs.candidates(view, pool, mv.to);
        let total: u32 = candidates.iter().map(|&(_, n)| n).sum();
        if total == 0 {
            return positional;
        }

        let expected = candidates
            .iter()
            .map(|&(defender, n)| exchange_value(h, attacker, defender) * n as f32)
            .sum::<f32>()
            / total as f32;

        positional + expected
    }

    /// Penalty for stepping next to a known enemy that wins against `rank`
    fn exposure(&self, view: &BoardSnapshot, to: Position, rank: Rank) -> f32 {
        let mut worst = 0.0f32;
        for dir in crate::board::DIRECTIONS {
            let Some(pos) = to.step(dir) else { continue };
            let Some(occupant) = view.occupant(pos) else { continue };
            if occupant.owner == self.side {
                continue;
            }
            if let Some(enemy) = self.beliefs.known_rank(view, pos) {
                if enemy.is_movable() && beats(enemy, rank) == CombatOutcome::AttackerWins {
                    worst = worst.min(-self.heuristics.value(rank));
                }
            }
        }
        worst
    }
}

impl Strategy for FairAi {
    fn name(&self) -> &str {
        "fair"
    }

    fn choose_move(&mut self, game: &Game) -> Option<Move> {
        if game.to_move()? != self.side {
            return None;
        }

        let view = game.snapshot(Viewer::Side(self.side));
        let pool = self.beliefs.unseen_pool(game.rules(), &view);

        let scored: Vec<(Move, f32)> = game
            .legal_moves()
            .into_iter()
            .map(|mv| (mv, self.score_move(game, &view, &pool, mv)))
            .collect();

        pick_best(scored)
    }

    fn observe(&mut self, report: &MoveReport) {
        self.beliefs.observe(report);
    }
}
