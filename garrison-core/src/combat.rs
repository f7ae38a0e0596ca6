//! Combat resolution and casualty bookkeeping

use crate::board::Board;
use crate::game::{Move, Side};
use crate::ranks::{beats, CombatOutcome, Rank};
use serde::{Deserialize, Serialize};

/// Ranks removed from the board, per owner, in removal order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Casualties {
    bottom: Vec<Rank>,
    top: Vec<Rank>,
}

impl Casualties {
    pub fn of(&self, side: Side) -> &[Rank] {
        match side {
            Side::Bottom => &self.bottom,
            Side::Top => &self.top,
        }
    }

    pub fn record(&mut self, side: Side, rank: Rank) {
        match side {
            Side::Bottom => self.bottom.push(rank),
            Side::Top => self.top.push(rank),
        }
    }

    /// How many of `side`'s units of `rank` have fallen
    pub fn count(&self, side: Side, rank: Rank) -> usize {
        self.of(side).iter().filter(|&&r| r == rank).count()
    }
}

/// A fight that happened: both ranks become public
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combat {
    pub attacker: Rank,
    pub defender: Rank,
    pub outcome: CombatOutcome,
}

/// What applying a move did to the board
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    /// `None` for a plain relocation
    pub combat: Option<Combat>,
    pub flag_captured: bool,
}

/// Apply an already-validated move.
///
/// An empty destination is a plain relocation. An enemy destination is
/// fought out with `beats`; losers are removed and appended to their
/// owner's casualties (attacker first) and survivors become revealed.
pub fn resolve(board: &mut Board, casualties: &mut Casualties, mv: Move) -> Resolution {
    let Some(attacker) = board.unit_at(mv.from).copied() else {
        return Resolution::default();
    };

    let Some(defender) = board.unit_at(mv.to).copied() else {
        board.relocate(mv.from, mv.to);
        return Resolution::default();
    };

    debug_assert_ne!(attacker.owner, defender.owner, "friendly fire at {}", mv.to);

    let outcome = beats(attacker.rank, defender.rank);
    match outcome {
        CombatOutcome::AttackerWins => {
            board.remove(mv.to);
            casualties.record(defender.owner, defender.rank);
            board.relocate(mv.from, mv.to);
        }
        CombatOutcome::DefenderWins => {
            board.remove(mv.from);
            casualties.record(attacker.owner, attacker.rank);
        }
        CombatOutcome::MutualDestruction => {
            board.remove(mv.from);
            board.remove(mv.to);
            casualties.record(attacker.owner, attacker.rank);
            casualties.record(defender.owner, defender.rank);
        }
    }

    if let Some(survivor) = board.unit_at_mut(mv.to) {
        survivor.revealed = true;
    }

    tracing::debug!(
        "{} {} attacks {} {} at {}: {:?}",
        attacker.owner,
        attacker.rank,
        defender.owner,
        defender.rank,
        mv.to,
        outcome
    );

    Resolution {
        combat: Some(Combat {
            attacker: attacker.rank,
            defender: defender.rank,
            outcome,
        }),
        flag_captured: defender.rank == Rank::Flag && outcome == CombatOutcome::AttackerWins,
    }
}
