//! Plain-text board rendering
//!
//! Bottom units are marked `^`, top units `v`; ranks the viewer cannot see
//! show as `?`. Lakes are `~~`.

use std::fmt::Write;

use garrison_core::{BoardSnapshot, CombatOutcome, MoveReport, Side};

const CELL: usize = 4;

pub fn render(snapshot: &BoardSnapshot) -> String {
    let mut out = String::new();

    out.push_str("   ");
    for col in 0..snapshot.cols {
        let _ = write!(out, "{col:>width$}", width = CELL);
    }
    out.push('\n');

    for row in 0..snapshot.rows {
        let _ = write!(out, "{row:>3}");
        let start = row as usize * snapshot.cols as usize;
        for square in &snapshot.squares[start..start + snapshot.cols as usize] {
            let cell = match (&square.occupant, square.is_lake) {
                (_, true) => "~~".to_string(),
                (None, false) => ".".to_string(),
                (Some(unit), false) => {
                    let code = unit.rank.map_or("?", |r| r.code());
                    let mark = match unit.owner {
                        Side::Bottom => '^',
                        Side::Top => 'v',
                    };
                    format!("{code}{mark}")
                }
            };
            let cell = if square.is_last_action_target {
                format!("*{cell}")
            } else {
                cell
            };
            let _ = write!(out, "{cell:>width$}", width = CELL);
        }
        out.push('\n');
    }

    for side in [Side::Bottom, Side::Top] {
        let fallen: Vec<&str> = snapshot.casualties(side).iter().map(|r| r.code()).collect();
        let _ = writeln!(out, "{side} casualties: [{}]", fallen.join(" "));
    }
    let _ = writeln!(out, "{}", snapshot.status);
    out
}

/// One line describing an applied move
pub fn describe(ply: usize, report: &MoveReport) -> String {
    let mut line = format!("{ply:>4}. {} {} -> {}", report.side, report.mv.from, report.mv.to);
    if let Some(combat) = report.combat {
        let result = match combat.outcome {
            CombatOutcome::AttackerWins => "attacker wins",
            CombatOutcome::DefenderWins => "defender wins",
            CombatOutcome::MutualDestruction => "both fall",
        };
        let _ = write!(line, "  {} attacks {}: {}", combat.attacker, combat.defender, result);
    }
    line
}
