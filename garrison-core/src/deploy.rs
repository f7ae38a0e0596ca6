//! Deployment validation and generators

use crate::board::Position;
use crate::error::GameError;
use crate::game::Side;
use crate::ranks::{Rank, ALL_RANKS};
use crate::ruleset::RuleSet;
use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// One unit of a proposed deployment
pub type Placement = (Position, Rank);

/// Back-to-front fill order for the standard deployment
const STANDARD_ORDER: [Rank; 12] = [
    Rank::Flag,
    Rank::Bomb,
    Rank::Miner,
    Rank::Spy,
    Rank::Sergeant,
    Rank::Lieutenant,
    Rank::Captain,
    Rank::Major,
    Rank::Colonel,
    Rank::General,
    Rank::Marshal,
    Rank::Scout,
];

/// A validated deployment, ready to be placed on the board
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Army {
    side: Side,
    /// Sorted row-major
    placements: Vec<Placement>,
}

impl Army {
    pub fn side(&self) -> Side {
        self.side
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

/// Check a proposed deployment against territory, uniqueness and quotas.
///
/// Reports the first violation found; the input is never partially accepted.
pub fn validate_deployment(
    rules: &RuleSet,
    side: Side,
    placements: &[Placement],
) -> Result<Army, GameError> {
    let territory = rules.territory(side);
    let mut seen = FxHashSet::default();

    for &(position, _) in placements {
        if !seen.insert(position) {
            return Err(GameError::DuplicatePosition(position));
        }

        let on_board = position.row < rules.rows && position.col < rules.cols;
        if !on_board || !territory.contains(position.row) || rules.is_lake(position) {
            return Err(GameError::InvalidTerritory { side, position });
        }
    }

    for rank in ALL_RANKS {
        let expected = rules.quota(rank);
        let found = placements.iter().filter(|(_, r)| *r == rank).count();
        if found != expected as usize {
            return Err(GameError::QuotaMismatch {
                rank,
                expected,
                found,
            });
        }
    }

    let mut placements = placements.to_vec();
    placements.sort_by_key(|&(position, _)| position);

    Ok(Army { side, placements })
}

/// Every rank of the army, repeated by quota, in standard fill order
fn army_ranks(rules: &RuleSet) -> Vec<Rank> {
    STANDARD_ORDER
        .iter()
        .flat_map(|&rank| std::iter::repeat(rank).take(rules.quota(rank) as usize))
        .collect()
}

/// Territory squares from the back row toward the front
fn back_to_front(rules: &RuleSet, side: Side) -> Vec<Position> {
    let range = rules.territory(side);
    let rows: Vec<u8> = match side {
        Side::Top => (range.first..=range.last).collect(),
        Side::Bottom => (range.first..=range.last).rev().collect(),
    };

    rows.into_iter()
        .flat_map(|row| (0..rules.cols).map(move |col| Position::new(row, col)))
        .filter(|&pos| !rules.is_lake(pos))
        .collect()
}

/// Deterministic deployment: flag and bombs at the back, scouts in front
pub fn standard_deployment(rules: &RuleSet, side: Side) -> Vec<Placement> {
    back_to_front(rules, side)
        .into_iter()
        .zip(army_ranks(rules))
        .collect()
}

/// Shuffled deployment over the whole territory
pub fn random_deployment<R: Rng>(rules: &RuleSet, side: Side, rng: &mut R) -> Vec<Placement> {
    let mut squares = rules.territory_squares(side);
    squares.shuffle(rng);
    squares.into_iter().zip(army_ranks(rules)).collect()
}
