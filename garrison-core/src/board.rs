//! Board geometry and occupancy

use crate::error::GameError;
use crate::game::Side;
use crate::ranks::Rank;
use crate::ruleset::RuleSet;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Grid coordinate; row 0 is the top edge
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// Neighbor one square in `dir`, if it does not underflow
    pub fn step(self, dir: Direction) -> Option<Position> {
        let (dr, dc) = dir.delta();
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        Some(Position::new(row, col))
    }

    /// Orthogonal distance between two squares
    pub fn distance_to(self, other: Position) -> u8 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Orthogonal directions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

/// Scan order used by move generation and tie-breaking
pub const DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

impl Direction {
    /// (row delta, column delta)
    pub const fn delta(self) -> (i8, i8) {
        match self {
            Direction::North => (-1, 0),
            Direction::East => (0, 1),
            Direction::South => (1, 0),
            Direction::West => (0, -1),
        }
    }
}

/// Stable identity of a unit for the length of a game
pub type UnitId = u16;

/// A rank bound to its owner
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub rank: Rank,
    pub owner: Side,
    /// Set once the unit has fought; its rank is then public
    pub revealed: bool,
}

impl Unit {
    pub fn new(id: UnitId, rank: Rank, owner: Side) -> Self {
        Self {
            id,
            rank,
            owner,
            revealed: false,
        }
    }
}

/// Authoritative grid (clone to branch)
#[derive(Clone, Debug)]
pub struct Board {
    rows: u8,
    cols: u8,
    /// Row-major squares
    squares: Vec<Option<Unit>>,
    lakes: FxHashSet<Position>,
}

impl Board {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    pub fn new(rows: u8, cols: u8, lakes: &[Position]) -> Self {
        Self {
            rows,
            cols,
            squares: vec![None; rows as usize * cols as usize],
            lakes: lakes.iter().copied().collect(),
        }
    }

    /// Empty board with the rule set's dimensions and lakes
    pub fn for_rules(rules: &RuleSet) -> Self {
        Self::new(rules.rows, rules.cols, &rules.lakes)
    }

    // ========================================================================
    // GEOMETRY
    // ========================================================================

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    pub fn is_lake(&self, pos: Position) -> bool {
        self.lakes.contains(&pos)
    }

    /// On the board and not a lake
    pub fn is_passable(&self, pos: Position) -> bool {
        self.contains(pos) && !self.is_lake(pos)
    }

    /// Neighbor in `dir` that lies on the board
    pub fn neighbor(&self, pos: Position, dir: Direction) -> Option<Position> {
        pos.step(dir).filter(|&p| self.contains(p))
    }

    /// All positions in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let cols = self.cols;
        (0..self.rows).flat_map(move |row| (0..cols).map(move |col| Position::new(row, col)))
    }

    fn index(&self, pos: Position) -> Option<usize> {
        self.contains(pos)
            .then(|| pos.row as usize * self.cols as usize + pos.col as usize)
    }

    // ========================================================================
    // OCCUPANCY
    // ========================================================================

    pub fn unit_at(&self, pos: Position) -> Option<&Unit> {
        self.index(pos).and_then(|i| self.squares[i].as_ref())
    }

    pub fn unit_at_mut(&mut self, pos: Position) -> Option<&mut Unit> {
        let i = self.index(pos)?;
        self.squares[i].as_mut()
    }

    /// Put a unit on an empty, passable square
    pub fn place(&mut self, unit: Unit, pos: Position) -> Result<(), GameError> {
        let i = self.index(pos).ok_or(GameError::OffBoard(pos))?;
        if self.is_lake(pos) {
            return Err(GameError::ImpassableSquare(pos));
        }
        if self.squares[i].is_some() {
            return Err(GameError::OccupiedSquare(pos));
        }
        self.squares[i] = Some(unit);
        Ok(())
    }

    pub fn remove(&mut self, pos: Position) -> Option<Unit> {
        let i = self.index(pos)?;
        self.squares[i].take()
    }

    /// Move whatever stands on `from` to `to`, replacing any occupant.
    /// No rules are checked here.
    pub fn relocate(&mut self, from: Position, to: Position) {
        if let (Some(_), Some(j)) = (self.index(from), self.index(to)) {
            let unit = self.remove(from);
            self.squares[j] = unit;
        }
    }

    /// Occupied squares in row-major order
    pub fn units(&self) -> impl Iterator<Item = (Position, &Unit)> + '_ {
        self.positions()
            .zip(self.squares.iter())
            .filter_map(|(pos, square)| square.as_ref().map(|unit| (pos, unit)))
    }

    /// Units of one side in row-major order
    pub fn units_of(&self, side: Side) -> impl Iterator<Item = (Position, &Unit)> + '_ {
        self.units().filter(move |(_, unit)| unit.owner == side)
    }

    pub fn count(&self, side: Side, rank: Rank) -> usize {
        self.units_of(side).filter(|(_, unit)| unit.rank == rank).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Board {
        Board::new(4, 3, &[Position::new(1, 1)])
    }

    #[test]
    fn test_geometry() {
        let b = board();
        assert!(b.contains(Position::new(3, 2)));
        assert!(!b.contains(Position::new(4, 0)));
        assert!(!b.is_passable(Position::new(1, 1)));
        assert_eq!(b.neighbor(Position::new(0, 0), Direction::North), None);
        assert_eq!(b.neighbor(Position::new(0, 0), Direction::East), Some(Position::new(0, 1)));
        assert_eq!(b.positions().count(), 12);
        assert_eq!(b.positions().nth(4), Some(Position::new(1, 1)));
    }

    #[test]
    fn test_place_rejects_occupied_lake_and_off_board() {
        let mut b = board();
        let flag = Unit::new(0, Rank::Flag, Side::Bottom);
        assert!(b.place(flag, Position::new(0, 0)).is_ok());
        assert_eq!(
            b.place(flag, Position::new(0, 0)),
            Err(GameError::OccupiedSquare(Position::new(0, 0)))
        );
        assert_eq!(
            b.place(flag, Position::new(1, 1)),
            Err(GameError::ImpassableSquare(Position::new(1, 1)))
        );
        assert_eq!(
            b.place(flag, Position::new(9, 9)),
            Err(GameError::OffBoard(Position::new(9, 9)))
        );
    }

    #[test]
    fn test_relocate_and_remove() {
        let mut b = board();
        let scout = Unit::new(3, Rank::Scout, Side::Top);
        b.place(scout, Position::new(0, 2)).unwrap();
        b.relocate(Position::new(0, 2), Position::new(3, 2));
        assert!(b.unit_at(Position::new(0, 2)).is_none());
        assert_eq!(b.unit_at(Position::new(3, 2)).map(|u| u.id), Some(3));
        assert_eq!(b.count(Side::Top, Rank::Scout), 1);
        assert_eq!(b.remove(Position::new(3, 2)).map(|u| u.rank), Some(Rank::Scout));
        assert_eq!(b.units().count(), 0);
    }

    #[test]
    fn test_units_are_row_major() {
        let mut b = board();
        b.place(Unit::new(0, Rank::Spy, Side::Top), Position::new(2, 0)).unwrap();
        b.place(Unit::new(1, Rank::Spy, Side::Top), Position::new(0, 2)).unwrap();
        let order: Vec<_> = b.units().map(|(p, _)| p).collect();
        assert_eq!(order, vec![Position::new(0, 2), Position::new(2, 0)]);
    }
}
