//! Engine error types

use crate::board::Position;
use crate::game::Side;
use crate::ranks::Rank;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a move was rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IllegalMoveReason {
    EmptySquare,
    NotOwner,
    Immobile,
    Unreachable,
}

impl std::fmt::Display for IllegalMoveReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            IllegalMoveReason::EmptySquare => "no unit on the origin square",
            IllegalMoveReason::NotOwner => "unit belongs to the opponent",
            IllegalMoveReason::Immobile => "unit cannot move",
            IllegalMoveReason::Unreachable => "destination is not reachable",
        };
        f.write_str(text)
    }
}

/// Recoverable rule violations reported to the caller.
///
/// A rejected operation never leaves the game partially mutated.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("square {0} is already occupied")]
    OccupiedSquare(Position),

    #[error("square {0} is off the board")]
    OffBoard(Position),

    #[error("square {0} is impassable")]
    ImpassableSquare(Position),

    #[error("{side} may not deploy on {position}")]
    InvalidTerritory { side: Side, position: Position },

    #[error("expected {expected} {rank} units, found {found}")]
    QuotaMismatch { rank: Rank, expected: u8, found: usize },

    #[error("square {0} appears more than once in the deployment")]
    DuplicatePosition(Position),

    #[error("illegal move {from} -> {to}: {reason}")]
    IllegalMove {
        from: Position,
        to: Position,
        reason: IllegalMoveReason,
    },

    #[error("it is {expected}'s turn, not {got}'s")]
    NotYourTurn { expected: Side, got: Side },

    #[error("the game is already over")]
    GameAlreadyOver,

    #[error("the game has not started")]
    GameNotStarted,

    #[error("{0} has already deployed")]
    AlreadyDeployed(Side),

    #[error("{0} has not deployed yet")]
    DeploymentIncomplete(Side),
}
