//! Play command - one game through a live session
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: open_session(), follow_game(), report_game()
//! - Level 3: human_turn(), print_reports()
//! - Level 4: board_view(), parse_command()

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use rand::Rng;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast;

use garrison_core::{
    AiKind, BoardSnapshot, Game, GameRecord, Heuristics, Move, MoveReport, Player, Position, Role,
    Side, Strategy, Viewer,
};
use garrison_session::{spawn_game, GameHandle, SessionError, SideView};

use crate::common::{create_rng, deployment, DeployMode, RulesArgs, SideArg};
use crate::render::{describe, render};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct PlayArgs {
    #[command(flatten)]
    pub rules: RulesArgs,

    /// Bottom AI (fair, search, search:<depth>)
    #[arg(long, default_value = "search")]
    pub bottom: AiKind,

    /// Top AI (fair, search, search:<depth>)
    #[arg(long, default_value = "fair")]
    pub top: AiKind,

    /// Play this side yourself, entering moves as `row col row col`
    #[arg(long, value_enum)]
    pub human: Option<SideArg>,

    #[arg(long, value_enum, default_value = "random")]
    pub deploy: DeployMode,

    /// Stop after this many moves if nobody has won
    #[arg(long, default_value = "1000")]
    pub max_plies: usize,

    /// Print the board after every move
    #[arg(long)]
    pub show: bool,

    /// Save the game record as JSON
    #[arg(long, value_name = "FILE")]
    pub save: Option<PathBuf>,
}

/// A line of human input
#[derive(Debug, PartialEq, Eq)]
enum HumanCommand {
    Move(Move),
    Surrender,
    Board,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run play command
///
/// 1. Open a session with both deployments committed
/// 2. Follow the game until it ends or hits the move limit
/// 3. Report the result and optionally save the record
pub fn run(args: PlayArgs, seed: Option<u64>) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async {
        let human = args.human.map(Side::from);
        let handle = open_session(&args, human, seed).await?;
        let mut reports = handle.reports();
        handle.start().await?;

        follow_game(&handle, &mut reports, &args, human).await?;
        report_game(&handle, &args, human)
    })
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

async fn open_session(args: &PlayArgs, human: Option<Side>, seed: Option<u64>) -> Result<GameHandle> {
    let rules = args.rules.load()?;
    let mut rng = create_rng(seed);
    let ai_seed: u64 = rng.gen();

    let kinds = [args.bottom, args.top];
    let mut players = Vec::with_capacity(2);
    let mut strategies: Vec<(Side, Box<dyn Strategy>)> = Vec::new();
    for side in [Side::Bottom, Side::Top] {
        if human == Some(side) {
            players.push(Player::new(side, "You", Role::Human));
        } else {
            let kind = kinds[side as usize];
            players.push(Player::new(side, format!("{side} ({kind})"), Role::Ai));
            strategies.push((side, kind.build(side, Heuristics::default(), ai_seed ^ side as u64)));
        }
    }
    let top = players.pop().context("missing top player")?;
    let bottom = players.pop().context("missing bottom player")?;

    tracing::info!("Starting {} game: {} vs {}", rules.name, bottom.name, top.name);

    let game = Game::new(rules.clone(), bottom, top)?;
    let handle = spawn_game(game, strategies);
    handle.limit_moves(args.max_plies).await?;
    for side in [Side::Bottom, Side::Top] {
        handle
            .deploy(side, deployment(&rules, side, args.deploy, &mut rng))
            .await?;
    }
    Ok(handle)
}

async fn follow_game(
    handle: &GameHandle,
    reports: &mut broadcast::Receiver<MoveReport>,
    args: &PlayArgs,
    human: Option<Side>,
) -> Result<()> {
    let seat = human.map(|side| handle.for_side(side));
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut ply = 0;

    if args.show || human.is_some() {
        print!("{}", render(&board_view(handle, seat.as_ref())));
    }

    loop {
        ply = print_reports(handle, reports, args, seat.as_ref(), ply)?;
        let game = handle.current();
        if game.is_game_over() || ply >= args.max_plies {
            return Ok(());
        }

        if let Some(seat) = seat.as_ref().filter(|seat| seat.is_my_turn()) {
            human_turn(seat, &mut input).await?;
            continue;
        }

        match reports.recv().await {
            Ok(report) => {
                ply += 1;
                print_report(handle, &report, args, seat.as_ref(), ply);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("skipped {} move reports", n);
            }
            Err(broadcast::error::RecvError::Closed) => bail!("session closed unexpectedly"),
        }
    }
}

/// The session stops applying moves at the limit, so the final state is the
/// one the reports above led to.
fn report_game(handle: &GameHandle, args: &PlayArgs, human: Option<Side>) -> Result<()> {
    let seat = human.map(|side| handle.for_side(side));
    let game = handle.current();
    println!();
    print!("{}", render(&board_view(handle, seat.as_ref())));
    match game.outcome() {
        Some(_) => println!("Finished after {} moves", game.history().len()),
        None => println!("Undecided after {} moves", game.history().len()),
    }

    if let Some(path) = &args.save {
        let record = GameRecord::from_game(&game).context("game has no deployments to record")?;
        record
            .save(path)
            .with_context(|| format!("Failed to save game record: {}", path.display()))?;
        println!("Saved game record to {}", path.display());
    }
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

async fn human_turn(seat: &SideView, input: &mut Lines<BufReader<Stdin>>) -> Result<()> {
    loop {
        println!("Your move (row col row col, 'board' or 'surrender'):");
        let Some(line) = input.next_line().await? else {
            println!("End of input, surrendering");
            seat.surrender().await?;
            return Ok(());
        };

        match parse_command(&line) {
            Some(HumanCommand::Move(mv)) => match seat.submit_move(mv).await {
                Ok(_) => return Ok(()),
                Err(SessionError::Game(e)) => println!("Rejected: {e}"),
                Err(e) => return Err(e.into()),
            },
            Some(HumanCommand::Surrender) => {
                seat.surrender().await?;
                return Ok(());
            }
            Some(HumanCommand::Board) => print!("{}", render(&seat.snapshot())),
            None => println!("Could not read '{}'", line.trim()),
        }
    }
}

/// Print every report that has already arrived
fn print_reports(
    handle: &GameHandle,
    reports: &mut broadcast::Receiver<MoveReport>,
    args: &PlayArgs,
    seat: Option<&SideView>,
    mut ply: usize,
) -> Result<usize> {
    loop {
        match reports.try_recv() {
            Ok(report) => {
                ply += 1;
                print_report(handle, &report, args, seat, ply);
            }
            Err(broadcast::error::TryRecvError::Empty) => return Ok(ply),
            Err(broadcast::error::TryRecvError::Lagged(n)) => {
                tracing::warn!("skipped {} move reports", n);
            }
            Err(broadcast::error::TryRecvError::Closed) => bail!("session closed unexpectedly"),
        }
    }
}

fn print_report(handle: &GameHandle, report: &MoveReport, args: &PlayArgs, seat: Option<&SideView>, ply: usize) {
    println!("{}", describe(ply, report));
    if args.show {
        print!("{}", render(&board_view(handle, seat)));
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// A human only ever sees their own side's view; AI-only games show everything
fn board_view(handle: &GameHandle, seat: Option<&SideView>) -> BoardSnapshot {
    match seat {
        Some(seat) => seat.snapshot(),
        None => handle.current().snapshot(Viewer::Omniscient),
    }
}

/// Parse `r c r c` (any separators), `board` or `surrender`
fn parse_command(line: &str) -> Option<HumanCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "surrender" | "resign" => return Some(HumanCommand::Surrender),
        "board" => return Some(HumanCommand::Board),
        _ => {}
    }

    let numbers: Vec<u8> = line
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;

    match numbers[..] {
        [fr, fc, tr, tc] => Some(HumanCommand::Move(Move::new(
            Position::new(fr, fc),
            Position::new(tr, tc),
        ))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move() {
        let expected = Some(HumanCommand::Move(Move::new(Position::new(6, 0), Position::new(5, 0))));
        assert_eq!(parse_command("6 0 5 0"), expected);
        assert_eq!(parse_command("(6, 0) -> (5, 0)"), expected);
        assert_eq!(parse_command(" Surrender "), Some(HumanCommand::Surrender));
        assert_eq!(parse_command("board"), Some(HumanCommand::Board));
        assert_eq!(parse_command("6 0 5"), None);
        assert_eq!(parse_command("999 0 5 0"), None);
    }
}
