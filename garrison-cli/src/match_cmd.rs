//! Match command - play many seeded games between two AIs
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: play_match(), report_results()
//! - Level 3: play_single_game(), compute_match_statistics()
//! - Level 4: formatting utilities

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use garrison_core::{
    play_out, AiKind, EndReason, GameRecord, Heuristics, RuleSet, SearchAi, Side, Strategy,
};

use crate::common::{ai_player, create_rng, started_game, DeployMode, RulesArgs};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct MatchArgs {
    #[command(flatten)]
    pub rules: RulesArgs,

    /// First AI (fair, search, search:<depth>); plays bottom in odd games
    #[arg(long, default_value = "search")]
    pub first: AiKind,

    /// Second AI
    #[arg(long, default_value = "fair")]
    pub second: AiKind,

    /// Number of games to play (sides alternate)
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Moves per game before it is scored undecided
    #[arg(long, default_value = "1000")]
    pub max_plies: usize,

    #[arg(long, value_enum, default_value = "random")]
    pub deploy: DeployMode,

    /// Leaf noise for search AIs, for variety between games
    #[arg(long, default_value = "0.0")]
    pub noise: f32,

    /// Worker threads (defaults to all cores)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Directory to save every game record into
    #[arg(long, value_name = "DIR")]
    pub save_dir: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Result of a single game
#[derive(Clone, Debug)]
struct MatchGame {
    game_number: usize,
    /// Side the first AI played
    first_side: Side,
    winner: Option<Side>,
    reason: Option<EndReason>,
    plies: usize,
    record: Option<GameRecord>,
}

impl MatchGame {
    fn first_won(&self) -> bool {
        self.winner == Some(self.first_side)
    }

    fn second_won(&self) -> bool {
        self.winner == Some(self.first_side.opponent())
    }
}

/// Aggregated match results
#[derive(Clone, Debug)]
struct MatchResults {
    games: Vec<MatchGame>,
    first_wins: usize,
    second_wins: usize,
    undecided: usize,
    bottom_wins: usize,
    avg_plies: f32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run match command
///
/// This function reads like a table of contents:
/// 1. Load the rule set
/// 2. Play the match (games in parallel)
/// 3. Report results
pub fn run(args: MatchArgs, seed: Option<u64>) -> Result<()> {
    let rules = args.rules.load()?;

    tracing::info!(
        "Starting match on {}: {} vs {} ({} games)",
        rules.name,
        args.first,
        args.second,
        args.games
    );

    let results = play_match(&rules, &args, seed)?;

    if let Some(dir) = &args.save_dir {
        save_records(&results, dir)?;
    }
    report_results(&results, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Play all games of the match on the rayon pool
fn play_match(rules: &RuleSet, args: &MatchArgs, seed: Option<u64>) -> Result<MatchResults> {
    let base_seed: u64 = create_rng(seed).gen();

    let play_all = || {
        (0..args.games)
            .into_par_iter()
            .map(|i| play_single_game(rules, args, i + 1, base_seed.wrapping_add(i as u64)))
            .collect::<Result<Vec<_>>>()
    };

    let games = match args.threads {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("Failed to build thread pool")?
            .install(play_all)?,
        None => play_all()?,
    };

    for game in &games {
        tracing::info!(
            "Game {}: {:?} by {:?} ({} moves)",
            game.game_number,
            game.winner,
            game.reason,
            game.plies
        );
    }

    Ok(compute_match_statistics(games))
}

fn report_results(results: &MatchResults, args: &MatchArgs) {
    if args.json {
        print_json_results(results, args);
    } else {
        print_text_results(results, args);
    }
}

fn save_records(results: &MatchResults, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    for game in &results.games {
        if let Some(record) = &game.record {
            let path = dir.join(format!("game_{:04}.json", game.game_number));
            record
                .save(&path)
                .with_context(|| format!("Failed to save {}", path.display()))?;
        }
    }
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Play one game; the first AI takes bottom in odd-numbered games
fn play_single_game(rules: &RuleSet, args: &MatchArgs, game_number: usize, seed: u64) -> Result<MatchGame> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let first_side = if game_number % 2 == 1 { Side::Bottom } else { Side::Top };

    let kind_for = |side: Side| if side == first_side { args.first } else { args.second };
    let players = [Side::Bottom, Side::Top].map(|side| ai_player(side, &kind_for(side).to_string()));
    let mut game = started_game(rules, players, args.deploy, &mut rng)?;

    let mut strategies: [Box<dyn Strategy>; 2] =
        [Side::Bottom, Side::Top].map(|side| build(kind_for(side), side, args.noise, seed));
    let plies = play_out(&mut game, &mut strategies, args.max_plies)
        .with_context(|| format!("Game {game_number} hit an illegal AI move"))?;

    let outcome = game.outcome();
    Ok(MatchGame {
        game_number,
        first_side,
        winner: outcome.map(|o| o.winner),
        reason: outcome.map(|o| o.reason),
        plies,
        record: args.save_dir.as_ref().and_then(|_| GameRecord::from_game(&game)),
    })
}

fn build(kind: AiKind, side: Side, noise: f32, seed: u64) -> Box<dyn Strategy> {
    match kind {
        AiKind::Search { depth } if noise > 0.0 => Box::new(
            SearchAi::with_seed(depth, Heuristics::default(), seed ^ side as u64).with_noise(noise),
        ),
        _ => kind.build(side, Heuristics::default(), seed ^ side as u64),
    }
}

/// Compute aggregate statistics from finished games
fn compute_match_statistics(games: Vec<MatchGame>) -> MatchResults {
    let first_wins = games.iter().filter(|g| g.first_won()).count();
    let second_wins = games.iter().filter(|g| g.second_won()).count();
    let undecided = games.iter().filter(|g| g.winner.is_none()).count();
    let bottom_wins = games.iter().filter(|g| g.winner == Some(Side::Bottom)).count();

    let total_plies: usize = games.iter().map(|g| g.plies).sum();
    let avg_plies = if games.is_empty() {
        0.0
    } else {
        total_plies as f32 / games.len() as f32
    };

    MatchResults {
        games,
        first_wins,
        second_wins,
        undecided,
        bottom_wins,
        avg_plies,
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn percent(count: usize, total: usize) -> f32 {
    if total > 0 {
        count as f32 / total as f32 * 100.0
    } else {
        0.0
    }
}

/// Print results as JSON
fn print_json_results(results: &MatchResults, args: &MatchArgs) {
    #[derive(serde::Serialize)]
    struct JsonGame {
        game_number: usize,
        first_side: Side,
        winner: Option<Side>,
        reason: Option<EndReason>,
        plies: usize,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        first: String,
        second: String,
        total_games: usize,
        first_wins: usize,
        second_wins: usize,
        undecided: usize,
        bottom_wins: usize,
        avg_plies: f32,
        games: Vec<JsonGame>,
    }

    let output = JsonOutput {
        first: args.first.to_string(),
        second: args.second.to_string(),
        total_games: results.games.len(),
        first_wins: results.first_wins,
        second_wins: results.second_wins,
        undecided: results.undecided,
        bottom_wins: results.bottom_wins,
        avg_plies: results.avg_plies,
        games: results
            .games
            .iter()
            .map(|g| JsonGame {
                game_number: g.game_number,
                first_side: g.first_side,
                winner: g.winner,
                reason: g.reason,
                plies: g.plies,
            })
            .collect(),
    };

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

/// Print results as text
fn print_text_results(results: &MatchResults, args: &MatchArgs) {
    let total = results.games.len();

    println!("\n=== Match Results ===");
    println!("Total games: {}", total);
    println!(
        "{:<12} {} ({:.1}%)",
        format!("{}:", args.first),
        results.first_wins,
        percent(results.first_wins, total)
    );
    println!(
        "{:<12} {} ({:.1}%)",
        format!("{}:", args.second),
        results.second_wins,
        percent(results.second_wins, total)
    );
    println!(
        "Undecided:   {} ({:.1}%)",
        results.undecided,
        percent(results.undecided, total)
    );
    println!("Bottom wins: {}", results.bottom_wins);
    println!("Avg moves:   {:.1}", results.avg_plies);

    println!("\nGame details:");
    for game in &results.games {
        let result = match (game.winner, game.reason) {
            (Some(winner), Some(reason)) => format!("{winner} wins ({reason:?})"),
            _ => "undecided".to_string(),
        };
        println!(
            "  Game {}: first AI as {}, {} in {} moves",
            game.game_number, game.first_side, result, game.plies
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn game(game_number: usize, first_side: Side, winner: Option<Side>, plies: usize) -> MatchGame {
        MatchGame {
            game_number,
            first_side,
            winner,
            reason: winner.map(|_| EndReason::FlagCaptured),
            plies,
            record: None,
        }
    }

    #[test]
    fn test_compute_match_statistics_empty() {
        let results = compute_match_statistics(vec![]);
        assert_eq!(results.first_wins, 0);
        assert_eq!(results.second_wins, 0);
        assert_eq!(results.undecided, 0);
        assert_eq!(results.avg_plies, 0.0);
    }

    #[test]
    fn test_compute_match_statistics() {
        let games = vec![
            game(1, Side::Bottom, Some(Side::Bottom), 10),
            game(2, Side::Top, Some(Side::Bottom), 20),
            game(3, Side::Bottom, None, 30),
        ];

        let results = compute_match_statistics(games);
        assert_eq!(results.first_wins, 1);
        assert_eq!(results.second_wins, 1);
        assert_eq!(results.undecided, 1);
        assert_eq!(results.bottom_wins, 2);
        assert_eq!(results.avg_plies, 20.0);
    }

    #[test]
    fn test_single_game_is_reproducible() {
        let args = MatchArgs {
            rules: RulesArgs {
                preset: "duel".to_string(),
                rules: None,
            },
            first: AiKind::Search { depth: 1 },
            second: AiKind::Fair,
            games: 1,
            max_plies: 80,
            deploy: DeployMode::Random,
            noise: 0.0,
            threads: None,
            save_dir: Some(PathBuf::from("unused")),
            json: false,
        };
        let rules = RuleSet::duel();
        let a = play_single_game(&rules, &args, 1, 99).unwrap();
        let b = play_single_game(&rules, &args, 1, 99).unwrap();
        assert_eq!(a.plies, b.plies);
        assert_eq!(a.winner, b.winner);
        assert_eq!(a.record, b.record);
        assert_eq!(a.record.unwrap().replay().unwrap().history().len(), a.plies);
    }
}
