//! GARRISON Core - Rules engine and AI
//!
//! This crate provides the core game logic for GARRISON:
//! - Rank catalog and combat table
//! - Board geometry (rectangular grid with lakes)
//! - Deployment validation and standard/random layouts
//! - Move generation, turn state machine and hidden-information snapshots
//! - Game records with deterministic replay
//! - Search and hidden-information AI players

pub mod ranks;
pub mod board;
pub mod ruleset;
pub mod deploy;
pub mod movegen;
pub mod combat;
pub mod game;
pub mod snapshot;
pub mod record;
pub mod error;
pub mod eval;
pub mod beliefs;
pub mod ai;

// Re-exports for convenient access
pub use ranks::{beats, rank_from_code, CombatOutcome, Mobility, Rank, ALL_RANKS};
pub use board::{Board, Direction, Position, Unit, UnitId, DIRECTIONS};
pub use ruleset::{RowRange, RuleSet, RuleSetError};
pub use deploy::{random_deployment, standard_deployment, validate_deployment, Army, Placement};
pub use combat::{Casualties, Combat};
pub use game::{EndReason, Game, Move, MoveReport, Outcome, Phase, Player, Role, Side};
pub use snapshot::{BoardSnapshot, OccupantView, SquareView, Viewer};
pub use record::{GameRecord, ReplayError};
pub use error::{GameError, IllegalMoveReason};
pub use eval::{evaluate, Heuristics, WIN_VALUE};
pub use beliefs::{Belief, Beliefs};
pub use ai::{play_out, AiKind, FairAi, SearchAi, Strategy};
