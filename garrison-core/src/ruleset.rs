//! RuleSet - board dimensions, lakes, army quotas and territories

use crate::board::Position;
use crate::game::Side;
use crate::ranks::Rank;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Inclusive range of board rows
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRange {
    pub first: u8,
    pub last: u8,
}

impl RowRange {
    pub const fn new(first: u8, last: u8) -> Self {
        Self { first, last }
    }

    pub fn contains(&self, row: u8) -> bool {
        self.first <= row && row <= self.last
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        (self.last - self.first) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        self.first > self.last
    }

    fn overlaps(&self, other: &RowRange) -> bool {
        self.first <= other.last && other.first <= self.last
    }
}

/// Configuration problems found by `RuleSet::validate`
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RuleSetError {
    #[error("board must have at least one row and one column")]
    EmptyBoard,

    #[error("lake {0} lies off the board")]
    LakeOffBoard(Position),

    #[error("{0} territory lies outside the board")]
    TerritoryOffBoard(Side),

    #[error("territories overlap")]
    TerritoriesOverlap,

    #[error("lake {0} lies inside a territory")]
    LakeInTerritory(Position),

    #[error("army must contain a flag")]
    NoFlag,

    #[error("{side} army has {units} units but only {squares} squares of territory")]
    ArmyTooLarge {
        side: Side,
        units: usize,
        squares: usize,
    },
}

/// Rule variant shared by both players
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub name: String,
    pub rows: u8,
    pub cols: u8,
    /// Impassable squares
    pub lakes: Vec<Position>,
    /// Units of each rank per army; ranks absent from the map have quota 0
    pub quotas: BTreeMap<Rank, u8>,
    pub top_territory: RowRange,
    pub bottom_territory: RowRange,
    pub first_to_move: Side,
}

impl RuleSet {
    /// Quota for one rank
    pub fn quota(&self, rank: Rank) -> u8 {
        self.quotas.get(&rank).copied().unwrap_or(0)
    }

    /// Units per army
    pub fn army_size(&self) -> usize {
        self.quotas.values().map(|&n| n as usize).sum()
    }

    pub fn territory(&self, side: Side) -> RowRange {
        match side {
            Side::Top => self.top_territory,
            Side::Bottom => self.bottom_territory,
        }
    }

    /// Row furthest from the enemy
    pub fn back_row(&self, side: Side) -> u8 {
        match side {
            Side::Top => self.top_territory.first,
            Side::Bottom => self.bottom_territory.last,
        }
    }

    pub fn is_lake(&self, pos: Position) -> bool {
        self.lakes.contains(&pos)
    }

    /// Deployable squares of a side in row-major order
    pub fn territory_squares(&self, side: Side) -> Vec<Position> {
        let range = self.territory(side);
        (range.first..=range.last)
            .flat_map(|row| (0..self.cols).map(move |col| Position::new(row, col)))
            .filter(|&pos| !self.is_lake(pos))
            .collect()
    }

    /// Check the configuration is playable
    pub fn validate(&self) -> Result<(), RuleSetError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(RuleSetError::EmptyBoard);
        }

        if let Some(&lake) = self
            .lakes
            .iter()
            .find(|p| p.row >= self.rows || p.col >= self.cols)
        {
            return Err(RuleSetError::LakeOffBoard(lake));
        }

        for side in [Side::Bottom, Side::Top] {
            let range = self.territory(side);
            if range.is_empty() || range.last >= self.rows {
                return Err(RuleSetError::TerritoryOffBoard(side));
            }
        }

        if self.top_territory.overlaps(&self.bottom_territory) {
            return Err(RuleSetError::TerritoriesOverlap);
        }

        if let Some(&lake) = self.lakes.iter().find(|p| {
            self.top_territory.contains(p.row) || self.bottom_territory.contains(p.row)
        }) {
            return Err(RuleSetError::LakeInTerritory(lake));
        }

        if self.quota(Rank::Flag) == 0 {
            return Err(RuleSetError::NoFlag);
        }

        let units = self.army_size();
        for side in [Side::Bottom, Side::Top] {
            let squares = self.territory_squares(side).len();
            if units > squares {
                return Err(RuleSetError::ArmyTooLarge { side, units, squares });
            }
        }

        Ok(())
    }

    // ========================================================================
    // PRESETS
    // ========================================================================

    /// 10x10 board, two lake blocks, 40 units per side
    pub fn classic() -> Self {
        let quotas = [
            (Rank::Flag, 1),
            (Rank::Spy, 1),
            (Rank::Scout, 8),
            (Rank::Miner, 5),
            (Rank::Sergeant, 4),
            (Rank::Lieutenant, 4),
            (Rank::Captain, 4),
            (Rank::Major, 3),
            (Rank::Colonel, 2),
            (Rank::General, 1),
            (Rank::Marshal, 1),
            (Rank::Bomb, 6),
        ];

        Self {
            name: "classic".to_string(),
            rows: 10,
            cols: 10,
            lakes: lake_blocks(&[4, 5], &[2, 3, 6, 7]),
            quotas: quotas.into_iter().collect(),
            top_territory: RowRange::new(0, 3),
            bottom_territory: RowRange::new(6, 9),
            first_to_move: Side::Bottom,
        }
    }

    /// 8x8 quick game, 10 units per side
    pub fn duel() -> Self {
        let quotas = [
            (Rank::Flag, 1),
            (Rank::Spy, 1),
            (Rank::Scout, 2),
            (Rank::Miner, 2),
            (Rank::General, 1),
            (Rank::Marshal, 1),
            (Rank::Bomb, 2),
        ];

        Self {
            name: "duel".to_string(),
            rows: 8,
            cols: 8,
            lakes: lake_blocks(&[3, 4], &[2, 5]),
            quotas: quotas.into_iter().collect(),
            top_territory: RowRange::new(0, 2),
            bottom_territory: RowRange::new(5, 7),
            first_to_move: Side::Bottom,
        }
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "classic" => Some(Self::classic()),
            "duel" => Some(Self::duel()),
            _ => None,
        }
    }

    // ========================================================================
    // FILES
    // ========================================================================

    /// Load from a JSON file and validate
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let rules: RuleSet = serde_json::from_str(&content)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::classic()
    }
}

fn lake_blocks(rows: &[u8], cols: &[u8]) -> Vec<Position> {
    rows.iter()
        .flat_map(|&row| cols.iter().map(move |&col| Position::new(row, col)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for rules in [RuleSet::classic(), RuleSet::duel()] {
            assert_eq!(rules.validate(), Ok(()), "{}", rules.name);
        }
        assert_eq!(RuleSet::classic().army_size(), 40);
        assert_eq!(RuleSet::duel().army_size(), 10);
        assert_eq!(RuleSet::classic().lakes.len(), 8);
    }

    #[test]
    fn test_territory_squares() {
        let rules = RuleSet::classic();
        let squares = rules.territory_squares(Side::Top);
        assert_eq!(squares.len(), 40);
        assert_eq!(squares[0], Position::new(0, 0));
        assert_eq!(rules.back_row(Side::Bottom), 9);
        assert_eq!(rules.back_row(Side::Top), 0);
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let mut rules = RuleSet::duel();
        rules.quotas.insert(Rank::Flag, 0);
        assert_eq!(rules.validate(), Err(RuleSetError::NoFlag));

        let mut rules = RuleSet::duel();
        rules.top_territory = RowRange::new(0, 5);
        assert_eq!(rules.validate(), Err(RuleSetError::TerritoriesOverlap));

        let mut rules = RuleSet::duel();
        rules.lakes.push(Position::new(0, 0));
        assert_eq!(
            rules.validate(),
            Err(RuleSetError::LakeInTerritory(Position::new(0, 0)))
        );

        let mut rules = RuleSet::duel();
        rules.quotas.insert(Rank::Scout, 30);
        assert!(matches!(rules.validate(), Err(RuleSetError::ArmyTooLarge { .. })));
    }

    #[test]
    fn test_json_round_trip_keeps_quotas() {
        let rules = RuleSet::duel();
        let json = serde_json::to_string(&rules).unwrap();
        assert!(json.contains("\"Marshal\":1"));
        let back: RuleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rules);
    }

    #[test]
    fn test_row_range_len() {
        assert_eq!(RowRange::new(6, 9).len(), 4);
        assert_eq!(RowRange::new(3, 3).len(), 1);
        assert!(RowRange::new(5, 2).is_empty());
        assert_eq!(RowRange::new(5, 2).len(), 0);
    }

    #[test]
    fn test_preset_lookup() {
        assert_eq!(RuleSet::preset("duel").map(|r| r.rows), Some(8));
        assert!(RuleSet::preset("nope").is_none());
    }
}
