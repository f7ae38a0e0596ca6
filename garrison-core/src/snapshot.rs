//! Read-only projections of a game for one viewer
//!
//! The game stores ground truth. Every snapshot handed out is built here and
//! redacts enemy ranks until the unit has fought or the game is over.

use crate::board::{Position, Unit, UnitId};
use crate::game::{Game, Phase, Side};
use crate::ranks::Rank;
use serde::{Deserialize, Serialize};

/// Who a snapshot is built for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Viewer {
    /// A player: sees own ranks plus revealed enemy ranks
    Side(Side),
    /// Sees only revealed ranks
    Spectator,
    /// Sees everything (AI-vs-AI displays, debugging)
    Omniscient,
}

impl Viewer {
    pub fn can_see(self, unit: &Unit, game_over: bool) -> bool {
        if game_over || unit.revealed {
            return true;
        }
        match self {
            Viewer::Side(side) => unit.owner == side,
            Viewer::Spectator => false,
            Viewer::Omniscient => true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupantView {
    pub id: UnitId,
    pub owner: Side,
    /// `None` when hidden from the viewer
    pub rank: Option<Rank>,
    pub revealed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquareView {
    pub position: Position,
    pub is_lake: bool,
    pub occupant: Option<OccupantView>,
    pub is_last_move_origin: bool,
    pub is_last_action_target: bool,
}

/// Everything a presentation layer needs to draw one frame
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub viewer: Viewer,
    pub rows: u8,
    pub cols: u8,
    /// Row-major
    pub squares: Vec<SquareView>,
    pub phase: Phase,
    pub to_move: Option<Side>,
    pub is_game_over: bool,
    pub status: String,
    pub bottom_casualties: Vec<Rank>,
    pub top_casualties: Vec<Rank>,
}

impl BoardSnapshot {
    pub fn square(&self, pos: Position) -> Option<&SquareView> {
        if pos.row >= self.rows || pos.col >= self.cols {
            return None;
        }
        self.squares
            .get(pos.row as usize * self.cols as usize + pos.col as usize)
    }

    pub fn occupant(&self, pos: Position) -> Option<&OccupantView> {
        self.square(pos).and_then(|sq| sq.occupant.as_ref())
    }

    pub fn casualties(&self, side: Side) -> &[Rank] {
        match side {
            Side::Bottom => &self.bottom_casualties,
            Side::Top => &self.top_casualties,
        }
    }

    /// Casualties laid out for a graveyard grid `width` squares wide
    pub fn casualty_rows(&self, side: Side, width: usize) -> Vec<Vec<Rank>> {
        self.casualties(side)
            .chunks(width.max(1))
            .map(<[Rank]>::to_vec)
            .collect()
    }

    /// Occupied squares in row-major order
    pub fn occupants(&self) -> impl Iterator<Item = (Position, &OccupantView)> + '_ {
        self.squares
            .iter()
            .filter_map(|sq| sq.occupant.as_ref().map(|o| (sq.position, o)))
    }
}

impl Game {
    /// Project the board for `viewer`
    pub fn snapshot(&self, viewer: Viewer) -> BoardSnapshot {
        let board = self.board();
        let game_over = self.is_game_over();
        let last = self.last_move();

        let squares = board
            .positions()
            .map(|position| SquareView {
                position,
                is_lake: board.is_lake(position),
                occupant: board.unit_at(position).map(|unit| OccupantView {
                    id: unit.id,
                    owner: unit.owner,
                    rank: viewer.can_see(unit, game_over).then_some(unit.rank),
                    revealed: unit.revealed,
                }),
                is_last_move_origin: last.is_some_and(|mv| mv.from == position),
                is_last_action_target: last.is_some_and(|mv| mv.to == position),
            })
            .collect();

        BoardSnapshot {
            viewer,
            rows: board.rows(),
            cols: board.cols(),
            squares,
            phase: self.phase(),
            to_move: self.to_move(),
            is_game_over: game_over,
            status: self.status_text().to_string(),
            bottom_casualties: self.casualties().of(Side::Bottom).to_vec(),
            top_casualties: self.casualties().of(Side::Top).to_vec(),
        }
    }
}
