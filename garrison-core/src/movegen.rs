//! Legal move generation
//!
//! Scan order is fixed so that callers (AI tie-breaking, replay, UI
//! highlighting) see the same sequence everywhere: origins row-major,
//! then directions N, E, S, W, then nearest square first.

use crate::board::{Board, Position, Unit, DIRECTIONS};
use crate::error::IllegalMoveReason;
use crate::game::{Move, Side};
use crate::ranks::Mobility;

/// Squares the unit on `from` may move to this turn.
///
/// Empty for an empty square or an immobile unit. Friendly units block;
/// an enemy square is included (it means combat) but nothing beyond it.
pub fn legal_destinations(board: &Board, from: Position) -> Vec<Position> {
    let mut destinations = Vec::new();
    if let Some(unit) = board.unit_at(from) {
        push_destinations(board, from, unit, &mut destinations);
    }
    destinations
}

fn push_destinations(board: &Board, from: Position, unit: &Unit, out: &mut Vec<Position>) {
    let max_steps = match unit.rank.mobility() {
        Mobility::Immobile => return,
        Mobility::Step => 1,
        Mobility::Slide => usize::MAX,
    };

    for dir in DIRECTIONS {
        let mut current = from;
        for _ in 0..max_steps {
            let next = match board.neighbor(current, dir) {
                Some(p) if !board.is_lake(p) => p,
                _ => break,
            };

            match board.unit_at(next) {
                Some(occupant) => {
                    if occupant.owner != unit.owner {
                        out.push(next);
                    }
                    break;
                }
                None => out.push(next),
            }
            current = next;
        }
    }
}

/// Explain why `mv` is not legal for `side`, or accept it
pub fn check_move(board: &Board, side: Side, mv: Move) -> Result<(), IllegalMoveReason> {
    let unit = board.unit_at(mv.from).ok_or(IllegalMoveReason::EmptySquare)?;
    if unit.owner != side {
        return Err(IllegalMoveReason::NotOwner);
    }
    if !unit.rank.is_movable() {
        return Err(IllegalMoveReason::Immobile);
    }
    if !legal_destinations(board, mv.from).contains(&mv.to) {
        return Err(IllegalMoveReason::Unreachable);
    }
    Ok(())
}

pub fn is_legal(board: &Board, side: Side, mv: Move) -> bool {
    check_move(board, side, mv).is_ok()
}

/// Every legal move for `side` in scan order
pub fn legal_moves(board: &Board, side: Side) -> Vec<Move> {
    let mut moves = Vec::new();
    let mut destinations = Vec::new();

    for (from, unit) in board.units_of(side) {
        destinations.clear();
        push_destinations(board, from, unit, &mut destinations);
        moves.extend(destinations.iter().map(|&to| Move::new(from, to)));
    }

    moves
}

pub fn has_legal_move(board: &Board, side: Side) -> bool {
    let mut destinations = Vec::new();
    board.units_of(side).any(|(from, unit)| {
        destinations.clear();
        push_destinations(board, from, unit, &mut destinations);
        !destinations.is_empty()
    })
}

/// Number of legal moves for `side` (mobility heuristic)
pub fn mobility(board: &Board, side: Side) -> usize {
    legal_moves(board, side).len()
}
