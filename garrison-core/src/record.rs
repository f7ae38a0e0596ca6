//! Game records and deterministic replay
//!
//! A record carries everything needed to rebuild a game move by move: the
//! rule set, both deployments, the move list and an optional surrender.
//! Remote peers exchange the same `Move` values, so replaying a record on
//! either machine yields identical boards and casualties.

use crate::deploy::Placement;
use crate::error::GameError;
use crate::game::{Game, Move, Outcome, Player, Role, Side};
use crate::ruleset::{RuleSet, RuleSetError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("invalid rule set: {0}")]
    Rules(#[from] RuleSetError),

    #[error("{side} deployment rejected: {source}")]
    Deployment { side: Side, source: GameError },

    #[error("could not start: {0}")]
    Start(GameError),

    #[error("move {index} rejected: {source}")]
    Move { index: usize, source: GameError },

    #[error("surrender rejected: {0}")]
    Surrender(GameError),

    #[error("replay ended with {found:?}, record says {expected:?}")]
    OutcomeMismatch {
        expected: Option<Outcome>,
        found: Option<Outcome>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub rules: RuleSet,
    pub bottom_name: String,
    pub top_name: String,
    pub bottom: Vec<Placement>,
    pub top: Vec<Placement>,
    pub moves: Vec<Move>,
    pub surrendered: Option<Side>,
    /// Outcome when the record was written; checked on replay when present
    pub outcome: Option<Outcome>,
}

impl GameRecord {
    /// Capture a game whose deployments are committed
    pub fn from_game(game: &Game) -> Option<Self> {
        let bottom = game.army(Side::Bottom)?.placements().to_vec();
        let top = game.army(Side::Top)?.placements().to_vec();
        let outcome = game.outcome();
        let surrendered = outcome
            .filter(|o| o.reason == crate::game::EndReason::Surrender)
            .map(|o| o.winner.opponent());

        Some(Self {
            rules: game.rules().clone(),
            bottom_name: game.player(Side::Bottom).name.clone(),
            top_name: game.player(Side::Top).name.clone(),
            bottom,
            top,
            moves: game.history().to_vec(),
            surrendered,
            outcome,
        })
    }

    /// Rebuild the game by validating every step again
    pub fn replay(&self) -> Result<Game, ReplayError> {
        let mut game = Game::new(
            self.rules.clone(),
            Player::new(Side::Bottom, self.bottom_name.clone(), Role::Remote),
            Player::new(Side::Top, self.top_name.clone(), Role::Remote),
        )?;

        for (side, placements) in [(Side::Bottom, &self.bottom), (Side::Top, &self.top)] {
            game.submit_deployment(side, placements)
                .map_err(|source| ReplayError::Deployment { side, source })?;
        }
        game.start().map_err(ReplayError::Start)?;

        for (index, &mv) in self.moves.iter().enumerate() {
            let side = game.to_move().ok_or(ReplayError::Move {
                index,
                source: GameError::GameAlreadyOver,
            })?;
            game.submit_move(side, mv)
                .map_err(|source| ReplayError::Move { index, source })?;
        }

        if let Some(side) = self.surrendered {
            game.surrender(side).map_err(ReplayError::Surrender)?;
        }

        if self.outcome.is_some() && self.outcome != game.outcome() {
            return Err(ReplayError::OutcomeMismatch {
                expected: self.outcome,
                found: game.outcome(),
            });
        }

        Ok(game)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::standard_deployment;

    fn started() -> Game {
        let rules = RuleSet::duel();
        let mut game = Game::new(
            rules.clone(),
            Player::new(Side::Bottom, "South", Role::Human),
            Player::new(Side::Top, "North", Role::Remote),
        )
        .unwrap();
        game.submit_deployment(Side::Bottom, &standard_deployment(&rules, Side::Bottom))
            .unwrap();
        game.submit_deployment(Side::Top, &standard_deployment(&rules, Side::Top))
            .unwrap();
        game.start().unwrap();
        game
    }

    #[test]
    fn test_record_requires_deployments() {
        let game = Game::new(
            RuleSet::duel(),
            Player::new(Side::Bottom, "a", Role::Human),
            Player::new(Side::Top, "b", Role::Human),
        )
        .unwrap();
        assert!(GameRecord::from_game(&game).is_none());
    }

    #[test]
    fn test_replay_matches_original() {
        let mut game = started();
        for _ in 0..6 {
            let side = game.to_move().unwrap();
            let mv = game.legal_moves()[0];
            game.submit_move(side, mv).unwrap();
        }
        game.surrender(Side::Top).unwrap();

        let record = GameRecord::from_game(&game).unwrap();
        assert_eq!(record.surrendered, Some(Side::Top));

        let json = serde_json::to_string(&record).unwrap();
        let parsed: GameRecord = serde_json::from_str(&json).unwrap();
        let replayed = parsed.replay().unwrap();

        assert_eq!(replayed.outcome(), game.outcome());
        assert_eq!(replayed.casualties(), game.casualties());
        assert_eq!(
            replayed.snapshot(crate::snapshot::Viewer::Omniscient).squares,
            game.snapshot(crate::snapshot::Viewer::Omniscient).squares
        );
    }

    #[test]
    fn test_replay_reports_bad_move() {
        let game = started();
        let mut record = GameRecord::from_game(&game).unwrap();
        record.moves.push(Move::new(
            crate::board::Position::new(7, 0),
            crate::board::Position::new(6, 0),
        ));
        assert!(matches!(record.replay(), Err(ReplayError::Move { index: 0, .. })));
    }
}
