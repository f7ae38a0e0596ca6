//! Game state machine: deployment, turns, termination

use crate::board::{Board, Position, Unit, UnitId};
use crate::combat::{resolve, Casualties, Combat};
use crate::deploy::{validate_deployment, Army, Placement};
use crate::error::GameError;
use crate::movegen::{check_move, has_legal_move, legal_destinations, legal_moves};
use crate::ruleset::{RuleSet, RuleSetError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Which end of the board a player starts from
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    Bottom = 0,
    Top = 1,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::Bottom => Side::Top,
            Side::Top => Side::Bottom,
        }
    }

    /// Row direction this side advances in
    pub fn forward(self) -> i8 {
        match self {
            Side::Bottom => -1,
            Side::Top => 1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Bottom => f.write_str("bottom"),
            Side::Top => f.write_str("top"),
        }
    }
}

/// Who is driving a side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Human,
    Ai,
    Remote,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub side: Side,
    pub name: String,
    pub role: Role,
}

impl Player {
    pub fn new(side: Side, name: impl Into<String>, role: Role) -> Self {
        Self {
            side,
            name: name.into(),
            role,
        }
    }
}

/// One unit moving from one square to another; also the remote wire record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Position,
    pub to: Position,
}

impl Move {
    pub const fn new(from: Position, to: Position) -> Self {
        Self { from, to }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    FlagCaptured,
    NoLegalMoves,
    Surrender,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub winner: Side,
    pub reason: EndReason,
}

/// Lifecycle of a game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Deploying { bottom_ready: bool, top_ready: bool },
    InProgress { to_move: Side },
    GameOver(Outcome),
}

/// Public account of an applied move, safe to show both players
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReport {
    pub side: Side,
    pub mv: Move,
    pub combat: Option<Combat>,
    /// Set when this move ended the game
    pub outcome: Option<Outcome>,
}

// ============================================================================
// GAME STATE
// ============================================================================

/// Authoritative game (clone to branch)
#[derive(Clone, Debug)]
pub struct Game {
    rules: Arc<RuleSet>,
    players: Arc<[Player; 2]>,
    board: Board,
    casualties: Casualties,
    phase: Phase,
    armies: [Option<Army>; 2],
    next_unit_id: UnitId,
    last_move: Option<Move>,
    history: Vec<Move>,
    status: String,
}

impl Game {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// New game waiting for both deployments
    pub fn new(rules: RuleSet, mut bottom: Player, mut top: Player) -> Result<Self, RuleSetError> {
        rules.validate()?;
        bottom.side = Side::Bottom;
        top.side = Side::Top;

        let mut game = Self {
            board: Board::for_rules(&rules),
            rules: Arc::new(rules),
            players: Arc::new([bottom, top]),
            casualties: Casualties::default(),
            phase: Phase::Deploying {
                bottom_ready: false,
                top_ready: false,
            },
            armies: [None, None],
            next_unit_id: 0,
            last_move: None,
            history: Vec::new(),
            status: String::new(),
        };
        game.refresh_status();
        Ok(game)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn player(&self, side: Side) -> &Player {
        &self.players[side as usize]
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn casualties(&self) -> &Casualties {
        &self.casualties
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Side to move, while the game is in progress
    pub fn to_move(&self) -> Option<Side> {
        match self.phase {
            Phase::InProgress { to_move } => Some(to_move),
            _ => None,
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver(_))
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::GameOver(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn winner(&self) -> Option<Side> {
        self.outcome().map(|o| o.winner)
    }

    pub fn status_text(&self) -> &str {
        &self.status
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    /// Moves applied so far, in order
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Committed deployment of a side
    pub fn army(&self, side: Side) -> Option<&Army> {
        self.armies[side as usize].as_ref()
    }

    /// Legal moves of the side to move (empty outside play)
    pub fn legal_moves(&self) -> Vec<Move> {
        match self.to_move() {
            Some(side) => legal_moves(&self.board, side),
            None => Vec::new(),
        }
    }

    /// Destinations for `side`'s own unit on `pos`.
    ///
    /// Empty outside play and for any square `side` does not own, so the
    /// reach of a hidden enemy unit never leaks its rank.
    pub fn legal_destinations(&self, side: Side, pos: Position) -> Vec<Position> {
        if self.to_move().is_none() {
            return Vec::new();
        }
        match self.board.unit_at(pos) {
            Some(unit) if unit.owner == side => legal_destinations(&self.board, pos),
            _ => Vec::new(),
        }
    }

    // ========================================================================
    // DEPLOYMENT
    // ========================================================================

    /// Validate and commit one side's deployment
    pub fn submit_deployment(&mut self, side: Side, placements: &[Placement]) -> Result<(), GameError> {
        let ready = match self.phase {
            Phase::Deploying {
                bottom_ready,
                top_ready,
            } => match side {
                Side::Bottom => bottom_ready,
                Side::Top => top_ready,
            },
            Phase::InProgress { .. } => return Err(GameError::AlreadyDeployed(side)),
            Phase::GameOver(_) => return Err(GameError::GameAlreadyOver),
        };
        if ready {
            return Err(GameError::AlreadyDeployed(side));
        }

        let army = validate_deployment(&self.rules, side, placements)?;

        // Validation guarantees each square is empty, in territory and off the lakes.
        for &(pos, rank) in army.placements() {
            let unit = Unit::new(self.next_unit_id, rank, side);
            self.next_unit_id += 1;
            self.board.place(unit, pos)?;
        }

        if let Phase::Deploying {
            bottom_ready,
            top_ready,
        } = &mut self.phase
        {
            match side {
                Side::Bottom => *bottom_ready = true,
                Side::Top => *top_ready = true,
            }
        }
        tracing::debug!("{} deployed {} units", side, army.len());
        self.armies[side as usize] = Some(army);
        self.refresh_status();
        Ok(())
    }

    /// Leave deployment once both armies are committed
    pub fn start(&mut self) -> Result<(), GameError> {
        match self.phase {
            Phase::Deploying {
                bottom_ready: false,
                ..
            } => return Err(GameError::DeploymentIncomplete(Side::Bottom)),
            Phase::Deploying { top_ready: false, .. } => {
                return Err(GameError::DeploymentIncomplete(Side::Top))
            }
            Phase::Deploying { .. } => {}
            Phase::InProgress { .. } => return Ok(()),
            Phase::GameOver(_) => return Err(GameError::GameAlreadyOver),
        }

        let first = self.rules.first_to_move;
        tracing::info!("game started, {} moves first", first);
        self.phase = Phase::InProgress { to_move: first };
        if !has_legal_move(&self.board, first) {
            self.finish(Outcome {
                winner: first.opponent(),
                reason: EndReason::NoLegalMoves,
            });
        }
        self.refresh_status();
        Ok(())
    }

    // ========================================================================
    // PLAY
    // ========================================================================

    /// Validate and apply one move for `side`
    pub fn submit_move(&mut self, side: Side, mv: Move) -> Result<MoveReport, GameError> {
        let to_move = match self.phase {
            Phase::Deploying { .. } => return Err(GameError::GameNotStarted),
            Phase::GameOver(_) => return Err(GameError::GameAlreadyOver),
            Phase::InProgress { to_move } => to_move,
        };
        if side != to_move {
            return Err(GameError::NotYourTurn {
                expected: to_move,
                got: side,
            });
        }
        check_move(&self.board, side, mv).map_err(|reason| GameError::IllegalMove {
            from: mv.from,
            to: mv.to,
            reason,
        })?;

        let resolution = resolve(&mut self.board, &mut self.casualties, mv);
        self.last_move = Some(mv);
        self.history.push(mv);

        let next = side.opponent();
        let outcome = if resolution.flag_captured {
            Some(Outcome {
                winner: side,
                reason: EndReason::FlagCaptured,
            })
        } else if !has_legal_move(&self.board, next) {
            Some(Outcome {
                winner: side,
                reason: EndReason::NoLegalMoves,
            })
        } else {
            None
        };

        match outcome {
            Some(outcome) => self.finish(outcome),
            None => self.phase = Phase::InProgress { to_move: next },
        }
        self.refresh_status();

        Ok(MoveReport {
            side,
            mv,
            combat: resolution.combat,
            outcome,
        })
    }

    /// Concede: the opponent wins immediately
    pub fn surrender(&mut self, side: Side) -> Result<Outcome, GameError> {
        if self.is_game_over() {
            return Err(GameError::GameAlreadyOver);
        }
        let outcome = Outcome {
            winner: side.opponent(),
            reason: EndReason::Surrender,
        };
        self.finish(outcome);
        self.refresh_status();
        Ok(outcome)
    }

    fn finish(&mut self, outcome: Outcome) {
        tracing::info!(
            "game over after {} moves: {} wins ({:?})",
            self.history.len(),
            outcome.winner,
            outcome.reason
        );
        self.phase = Phase::GameOver(outcome);
    }

    // ========================================================================
    // STATUS
    // ========================================================================

    fn refresh_status(&mut self) {
        self.status = match self.phase {
            Phase::Deploying {
                bottom_ready,
                top_ready,
            } => match (bottom_ready, top_ready) {
                (false, false) => "Waiting for deployments".to_string(),
                (true, false) => format!("Waiting for {} to deploy", self.player(Side::Top).name),
                (false, true) => format!("Waiting for {} to deploy", self.player(Side::Bottom).name),
                (true, true) => "Ready to start".to_string(),
            },
            Phase::InProgress { to_move } => format!("{} to move", self.player(to_move).name),
            Phase::GameOver(outcome) => {
                let winner = &self.player(outcome.winner).name;
                let loser = &self.player(outcome.winner.opponent()).name;
                match outcome.reason {
                    EndReason::FlagCaptured => format!("{winner} wins: flag captured"),
                    EndReason::NoLegalMoves => format!("{winner} wins: {loser} cannot move"),
                    EndReason::Surrender => format!("{winner} wins: {loser} surrendered"),
                }
            }
        };
    }
}

// ============================================================================
// TESTS
// ============================================================================
