//! Rank catalog: unit identities, strengths and capture rules

use serde::{Deserialize, Serialize};

/// Unit rank, declared weakest-first so the derived `Ord` follows strength
/// for the fighting ranks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    Flag,
    Spy,
    Scout,
    Miner,
    Sergeant,
    Lieutenant,
    Captain,
    Major,
    Colonel,
    General,
    Marshal,
    Bomb,
}

/// How a rank moves
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mobility {
    Immobile, // Flag, Bomb
    Step,     // One orthogonal square
    Slide,    // Any distance orthogonally, blocked by units and lakes
}

/// Result of one unit attacking another
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatOutcome {
    AttackerWins,
    DefenderWins,
    MutualDestruction,
}

/// Static rank attributes
#[derive(Clone, Debug)]
pub struct RankType {
    pub rank: Rank,
    pub code: &'static str,
    pub name: &'static str,
    pub strength: u8,
    pub mobility: Mobility,
    pub special_attacker: bool,
    pub defuses_bombs: bool,
    pub icon: &'static str,
}

impl RankType {
    const fn new(
        rank: Rank,
        code: &'static str,
        name: &'static str,
        strength: u8,
        mobility: Mobility,
        icon: &'static str,
    ) -> Self {
        Self {
            rank,
            code,
            name,
            strength,
            mobility,
            special_attacker: false,
            defuses_bombs: false,
            icon,
        }
    }

    const fn special_attacker(mut self) -> Self {
        self.special_attacker = true;
        self
    }

    const fn defuses_bombs(mut self) -> Self {
        self.defuses_bombs = true;
        self
    }
}

/// All ranks, indexed by `Rank as usize`
pub static RANK_TYPES: [RankType; 12] = [
    RankType::new(Rank::Flag, "F", "Flag", 0, Mobility::Immobile, "flag"),
    RankType::new(Rank::Spy, "S", "Spy", 1, Mobility::Step, "spy").special_attacker(),
    RankType::new(Rank::Scout, "2", "Scout", 2, Mobility::Slide, "scout"),
    RankType::new(Rank::Miner, "3", "Miner", 3, Mobility::Step, "miner").defuses_bombs(),
    RankType::new(Rank::Sergeant, "4", "Sergeant", 4, Mobility::Step, "sergeant"),
    RankType::new(Rank::Lieutenant, "5", "Lieutenant", 5, Mobility::Step, "lieutenant"),
    RankType::new(Rank::Captain, "6", "Captain", 6, Mobility::Step, "captain"),
    RankType::new(Rank::Major, "7", "Major", 7, Mobility::Step, "major"),
    RankType::new(Rank::Colonel, "8", "Colonel", 8, Mobility::Step, "colonel"),
    RankType::new(Rank::General, "9", "General", 9, Mobility::Step, "general"),
    RankType::new(Rank::Marshal, "10", "Marshal", 10, Mobility::Step, "marshal"),
    // Bombs only ever defend; the strength is never compared.
    RankType::new(Rank::Bomb, "B", "Bomb", 11, Mobility::Immobile, "bomb"),
];

/// Every rank in catalog order
pub const ALL_RANKS: [Rank; 12] = [
    Rank::Flag,
    Rank::Spy,
    Rank::Scout,
    Rank::Miner,
    Rank::Sergeant,
    Rank::Lieutenant,
    Rank::Captain,
    Rank::Major,
    Rank::Colonel,
    Rank::General,
    Rank::Marshal,
    Rank::Bomb,
];

/// The single highest fighting rank, the special attacker's target
pub const HIGHEST_RANK: Rank = Rank::Marshal;

impl Rank {
    pub fn info(self) -> &'static RankType {
        &RANK_TYPES[self as usize]
    }

    pub fn strength(self) -> u8 {
        self.info().strength
    }

    pub fn mobility(self) -> Mobility {
        self.info().mobility
    }

    pub fn is_movable(self) -> bool {
        self.mobility() != Mobility::Immobile
    }

    pub fn is_special_attacker(self) -> bool {
        self.info().special_attacker
    }

    pub fn defuses_bombs(self) -> bool {
        self.info().defuses_bombs
    }

    pub fn code(self) -> &'static str {
        self.info().code
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Icon identifier used by presentation layers
    pub fn icon_name(self) -> &'static str {
        self.info().icon
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Look up a rank by its short code ("F", "B", "S", "2".."10")
pub fn rank_from_code(code: &str) -> Option<Rank> {
    RANK_TYPES.iter().find(|rt| rt.code == code).map(|rt| rt.rank)
}

/// Outcome of `attacker` moving onto `defender`.
///
/// Overrides apply in order: any attack on the flag succeeds, bombs stop
/// everything except the bomb-defusing rank, and the special attacker takes
/// the highest rank when it is the one attacking. Otherwise the stronger
/// unit survives and equal strengths trade.
pub fn beats(attacker: Rank, defender: Rank) -> CombatOutcome {
    if defender == Rank::Flag {
        return CombatOutcome::AttackerWins;
    }

    if defender == Rank::Bomb {
        return if attacker.defuses_bombs() {
            CombatOutcome::AttackerWins
        } else {
            CombatOutcome::DefenderWins
        };
    }

    if attacker.is_special_attacker() && defender == HIGHEST_RANK {
        return CombatOutcome::AttackerWins;
    }

    match attacker.strength().cmp(&defender.strength()) {
        std::cmp::Ordering::Greater => CombatOutcome::AttackerWins,
        std::cmp::Ordering::Less => CombatOutcome::DefenderWins,
        std::cmp::Ordering::Equal => CombatOutcome::MutualDestruction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_override(a: Rank, b: Rank) -> bool {
        matches!(a, Rank::Flag | Rank::Bomb)
            || matches!(b, Rank::Flag | Rank::Bomb)
            || (a.is_special_attacker() && b == HIGHEST_RANK)
            || (b.is_special_attacker() && a == HIGHEST_RANK)
    }

    #[test]
    fn test_table_is_indexed_by_rank() {
        for (i, rank) in ALL_RANKS.iter().enumerate() {
            assert_eq!(RANK_TYPES[i].rank, *rank);
            assert_eq!(*rank as usize, i);
        }
    }

    #[test]
    fn test_code_lookup() {
        assert_eq!(rank_from_code("F"), Some(Rank::Flag));
        assert_eq!(rank_from_code("10"), Some(Rank::Marshal));
        assert_eq!(rank_from_code("B"), Some(Rank::Bomb));
        assert_eq!(rank_from_code("XX"), None);
    }

    #[test]
    fn test_immobile_ranks() {
        for rank in ALL_RANKS {
            let immobile = matches!(rank, Rank::Flag | Rank::Bomb);
            assert_eq!(rank.is_movable(), !immobile, "{rank}");
        }
        assert_eq!(Rank::Scout.mobility(), Mobility::Slide);
    }

    #[test]
    fn test_beats_is_consistent_outside_overrides() {
        for a in ALL_RANKS {
            for b in ALL_RANKS {
                if is_override(a, b) {
                    continue;
                }
                let forward = beats(a, b);
                let backward = beats(b, a);
                match forward {
                    CombatOutcome::MutualDestruction => {
                        assert_eq!(backward, CombatOutcome::MutualDestruction, "{a} vs {b}")
                    }
                    CombatOutcome::AttackerWins => {
                        assert_eq!(backward, CombatOutcome::DefenderWins, "{a} vs {b}")
                    }
                    CombatOutcome::DefenderWins => {
                        assert_eq!(backward, CombatOutcome::AttackerWins, "{a} vs {b}")
                    }
                }
            }
        }
    }

    #[test]
    fn test_lower_rank_loses() {
        assert_eq!(beats(Rank::Miner, Rank::Lieutenant), CombatOutcome::DefenderWins);
        assert_eq!(beats(Rank::Captain, Rank::Captain), CombatOutcome::MutualDestruction);
    }

    #[test]
    fn test_spy_takes_marshal_only_when_attacking() {
        assert_eq!(beats(Rank::Spy, Rank::Marshal), CombatOutcome::AttackerWins);
        assert_eq!(beats(Rank::Marshal, Rank::Spy), CombatOutcome::AttackerWins);
        assert_eq!(beats(Rank::Spy, Rank::General), CombatOutcome::DefenderWins);
    }

    #[test]
    fn test_bombs() {
        assert_eq!(beats(Rank::Captain, Rank::Bomb), CombatOutcome::DefenderWins);
        assert_eq!(beats(Rank::Marshal, Rank::Bomb), CombatOutcome::DefenderWins);
        assert_eq!(beats(Rank::Miner, Rank::Bomb), CombatOutcome::AttackerWins);
    }

    #[test]
    fn test_flag_always_falls() {
        for rank in ALL_RANKS {
            assert_eq!(beats(rank, Rank::Flag), CombatOutcome::AttackerWins, "{rank}");
        }
    }
}
